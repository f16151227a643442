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

//! Built-in messages used to manage actor lifecycles.
//!
//! These are distinct from application messages and are handled either by
//! the runtime itself or by handlers an actor chooses to register (an
//! actor that wants to react to [`Start`] registers a handler for it like
//! for any other kind).

use serde::{Deserialize, Serialize};

use crate::actor_message;
use crate::message::kinds;

/// Delivered synchronously to every managed actor by
/// [`ActorRuntime::init`](crate::common::ActorRuntime::init) before worker
/// threads exist, so synchronous preconditions can be established ahead of
/// the first queued message.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Start;

actor_message!(Start, kinds::START);

/// Instructs an actor to stop its message loop.
///
/// Receiving `Shutdown` is the only cancellation mechanism in the
/// runtime: the worker dispatches it (to a registered handler or the
/// unhandled hook) and then exits its loop. Posting further `Shutdown`
/// messages to a terminated actor has no additional effect.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Shutdown;

actor_message!(Shutdown, kinds::SHUTDOWN);

/// Self-scheduling continuation.
///
/// Cooperative loops such as the remote receiver post `Continue` to
/// themselves after each poll cycle, which keeps the actor responsive to
/// `Shutdown` without ever blocking on external input.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Continue;

actor_message!(Continue, kinds::CONTINUE);

/// Posted by the [`Timer`](crate::timer::Timer) utility when a scheduled
/// delay elapses. The `data` field round-trips whatever the scheduler
/// passed to `wake_in`/`wake_at`.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Timeout {
    /// Opaque correlation value supplied at scheduling time.
    pub data: i64,
}

actor_message!(Timeout, kinds::TIMEOUT);

/// Sent back over the wire when a remote envelope cannot be delivered.
///
/// The remote receiver emits `Reject` for an unknown target actor, an
/// unregistered wire type, or a body that fails to deserialize, provided
/// the offending envelope carried a return address.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reject {
    /// The `message_type` of the envelope that was refused.
    pub message_type: String,
    /// Human-readable description of the failure.
    pub reason: String,
    /// Name of the actor the envelope was addressed to.
    pub rejected_by: String,
}

actor_message!(Reject, kinds::REJECT);
