/*
 * Copyright (c) 2024. Govcraft
 *
 * Licensed under either of
 *   * Apache License, Version 2.0 (the "License");
 *     you may not use this file except in compliance with the License.
 *     You may obtain a copy of the License at http://www.apache.org/licenses/LICENSE-2.0
 *   * MIT license: http://opensource.org/licenses/MIT
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the applicable License for the specific language governing permissions and
 * limitations under that License.
 */

//! Timer utility for actors.
//!
//! Each scheduled wake-up runs on a short-lived thread that sleeps and
//! then posts a [`Timeout`] to the subscriber. Posts to an actor that
//! terminated in the meantime are dropped by the normal `post` gate.

use std::thread;
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use tracing::warn;

use crate::common::ActorHandle;
use crate::message::Timeout;

const MILLIS_PER_DAY: u64 = 24 * 60 * 60 * 1000;

/// Schedules [`Timeout`] deliveries.
///
/// ```rust,ignore
/// Timer::wake_in(&handle, 5, 0, 0);      // Timeout { data: 0 } in 5 seconds
/// Timer::wake_at(&handle, 1000, 7);      // at the next whole second
/// ```
pub struct Timer;

impl Timer {
    /// Posts `Timeout { data }` to `subscriber` after the given delay.
    pub fn wake_in(subscriber: &ActorHandle, seconds: u64, millis: u64, data: i64) {
        Self::schedule(subscriber, Duration::from_millis(seconds * 1000 + millis), data);
    }

    /// Posts `Timeout { data }` at the next wall-clock multiple of
    /// `interval_ms` since midnight (UTC).
    pub fn wake_at(subscriber: &ActorHandle, interval_ms: u64, data: i64) {
        if interval_ms == 0 {
            warn!("wake_at with zero interval; ignoring");
            return;
        }
        let since_midnight = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|elapsed| elapsed.as_millis() as u64 % MILLIS_PER_DAY)
            .unwrap_or(0);
        let rounded_down = since_midnight - since_midnight % interval_ms;
        let next_deadline = rounded_down + interval_ms;
        Self::schedule(
            subscriber,
            Duration::from_millis(next_deadline - since_midnight),
            data,
        );
    }

    fn schedule(subscriber: &ActorHandle, delay: Duration, data: i64) {
        let subscriber = subscriber.clone();
        let spawned = thread::Builder::new()
            .name("axon-timer".to_string())
            .spawn(move || {
                thread::sleep(delay);
                subscriber.post(Timeout { data }, None);
            });
        if let Err(error) = spawned {
            warn!(%error, "could not spawn timer thread");
        }
    }
}
