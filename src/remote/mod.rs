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

//! Federation across processes: JSON envelopes over a push/pull socket
//! pair.
//!
//! Each process runs a [`RemoteSender`] (outbound) and, if it accepts
//! messages, a [`RemoteReceiver`] (inbound), both ordinary actors
//! managed by the runtime. Message types that cross the wire register
//! their codec once with [`register_wire_message`]. Local and remote
//! actors are then addressed uniformly through
//! [`ActorRef`](crate::common::ActorRef).

pub use registry::{register_wire_message, wire_registry, WireTypeRegistry};
pub use receiver::{ReceiverRegistry, RemoteReceiver, RemoteReceiverState};
pub use sender::{RemoteActorRef, RemoteSender, RemoteSenderHandle, RemoteSenderState};
pub use types::RemoteError;
pub use wire::{bind_addr, connect_addr, WireEnvelope};

mod registry;
mod receiver;
mod sender;
mod types;
pub(crate) mod wire;
