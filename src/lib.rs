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

//! Axon: a low-latency, thread-pinned actor runtime.
//!
//! Every top-level actor runs a serial message loop on its own OS thread,
//! optionally pinned to CPUs and scheduled with real-time priority. The
//! inbox is a blocking ring-plus-overflow FIFO, so producers never block
//! and per-sender FIFO order is preserved. Dispatch is by message type,
//! with a kind-id cache that turns steady-state handler lookup into an
//! array read.
//!
//! Two delivery verbs cover the common patterns:
//!
//! * [`post`](common::ActorHandle::post): asynchronous, fire-and-forget.
//! * [`call`](common::ActorHandle::call): synchronous request/response on
//!   the caller's thread, local only.
//!
//! Actors can federate across processes through the [`remote`] bridge: a
//! JSON envelope over a push/pull socket pair, with transparent reply
//! routing via [`ActorRef`](common::ActorRef).
//!
//! ```rust,ignore
//! use axon::prelude::*;
//!
//! #[derive(Debug, Default)]
//! struct CounterState { ticks: u64 }
//!
//! #[derive(Debug, Default)]
//! struct Tick;
//! actor_message!(Tick, 100);
//!
//! let mut runtime = ActorRuntime::launch();
//! let mut counter = runtime.new_actor::<CounterState>("counter");
//! counter.mutate_on::<Tick>(|actor, _context| {
//!     actor.model.ticks += 1;
//! });
//! let handle = runtime.manage(counter, SpawnConfig::default());
//!
//! runtime.init();
//! handle.post(Tick, None);
//! runtime.shutdown();
//! ```

pub mod actor;
pub mod common;
pub mod mailbox;
pub mod message;
pub mod remote;
pub mod timer;
pub mod traits;

pub use traits::{downcast_message, into_message, ActorMessage};

/// Prelude module for convenient imports.
pub mod prelude {
    pub use crate::actor::{
        Group, Idle, ManagedActor, Running, SchedulingClass, SpawnConfig, HANDLER_CACHE_SIZE,
    };
    pub use crate::actor_message;
    pub use crate::common::{ActorHandle, ActorRef, ActorRuntime};
    pub use crate::mailbox::Mailbox;
    pub use crate::message::{
        kinds, Continue, Envelope, MessageContext, Reject, Shutdown, Start, Timeout,
    };
    pub use crate::remote::{
        register_wire_message, wire_registry, ReceiverRegistry, RemoteError, RemoteReceiver,
        RemoteSender, RemoteSenderHandle, WireEnvelope, WireTypeRegistry,
    };
    pub use crate::timer::Timer;
    pub use crate::traits::{downcast_message, into_message, ActorMessage};
}
