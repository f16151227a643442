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

use std::collections::BTreeSet;

/// Worker thread configuration consumed once by
/// [`ActorRuntime::init`](crate::common::ActorRuntime::init).
#[derive(Debug, Clone, Default)]
pub struct SpawnConfig {
    /// CPU cores to pin the worker to. Empty means no pinning.
    pub affinity: BTreeSet<usize>,
    /// Real-time priority. Zero leaves the default scheduling class in
    /// place; values above zero require `CAP_SYS_NICE`.
    pub priority: i32,
    /// Scheduling class applied when `priority` is above zero.
    pub scheduling: SchedulingClass,
}

impl SpawnConfig {
    /// Pin the worker to the given cores, default scheduling.
    pub fn pinned(cores: impl IntoIterator<Item = usize>) -> Self {
        Self {
            affinity: cores.into_iter().collect(),
            ..Self::default()
        }
    }

    /// Pin the worker and give it a real-time priority.
    pub fn realtime(
        cores: impl IntoIterator<Item = usize>,
        priority: i32,
        scheduling: SchedulingClass,
    ) -> Self {
        Self {
            affinity: cores.into_iter().collect(),
            priority,
            scheduling,
        }
    }
}

/// Scheduling class for a worker thread.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SchedulingClass {
    /// The OS default (`SCHED_OTHER`).
    #[default]
    Default,
    /// First-in-first-out real-time scheduling (`SCHED_FIFO`).
    Fifo,
    /// Round-robin real-time scheduling (`SCHED_RR`).
    RoundRobin,
}
