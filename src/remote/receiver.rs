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

//! The inbound half of the remote bridge.
//!
//! `RemoteReceiver` is an actor that owns a bound pull socket. On Start
//! it posts itself a [`Continue`]; each Continue performs one poll cycle
//! (accept pending connections, pull at most one complete frame) and
//! re-posts Continue, a cooperative self-scheduled loop that stays
//! responsive to Shutdown without blocking on the network. When a cycle
//! finds nothing, it sleeps briefly so the loop idles cold.
//!
//! Decoded envelopes are routed by the receiver registry (name → handle).
//! Undeliverable envelopes produce a [`Reject`] back to the sender when
//! the envelope carried a return address; envelopes that fail JSON
//! parsing are dropped, since no return address can be known.

use std::io::{self, Read};
use std::net::{TcpListener, TcpStream};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use dashmap::DashMap;
use tracing::{debug, trace, warn};

use super::registry::wire_registry;
use super::sender::RemoteSenderHandle;
use super::types::RemoteError;
use super::wire::{self, WireEnvelope};
use crate::actor::{Idle, ManagedActor};
use crate::common::ActorHandle;
use crate::message::{Continue, Reject, Start};

/// How long an idle poll cycle sleeps before rescheduling itself.
const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// Name → handle map of local actors reachable from the wire.
///
/// Cloneable; registration can happen before or after the receiver actor
/// is managed, from any thread.
#[derive(Clone, Default)]
pub struct ReceiverRegistry {
    actors: Arc<DashMap<String, ActorHandle>>,
}

impl ReceiverRegistry {
    /// Exposes a local actor to remote processes under `name`.
    pub fn register(&self, name: &str, handle: &ActorHandle) {
        self.actors.insert(name.to_string(), handle.clone());
    }

    /// Removes an actor from the wire-visible map.
    pub fn unregister(&self, name: &str) {
        self.actors.remove(name);
    }

    fn get(&self, name: &str) -> Option<ActorHandle> {
        self.actors.get(name).map(|entry| entry.value().clone())
    }

    /// Number of exposed actors.
    pub fn len(&self) -> usize {
        self.actors.len()
    }

    /// `true` when no actors are exposed.
    pub fn is_empty(&self) -> bool {
        self.actors.is_empty()
    }
}

impl std::fmt::Debug for ReceiverRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ReceiverRegistry")
            .field("exposed_actors", &self.actors.len())
            .finish()
    }
}

/// State owned by the receiver actor.
pub struct RemoteReceiverState {
    listener: TcpListener,
    connections: Vec<PullConnection>,
    next_poll: usize,
    sender: RemoteSenderHandle,
    registry: ReceiverRegistry,
}

struct PullConnection {
    stream: TcpStream,
    buffer: Vec<u8>,
    open: bool,
}

/// A bound, not-yet-managed remote receiver.
///
/// ```rust,ignore
/// let (sender_actor, sender) = RemoteSender::create("tcp://localhost:5001");
/// let receiver = RemoteReceiver::bind("tcp://0.0.0.0:5001", sender.clone())?;
/// receiver.register_actor("pong", &pong_handle);
///
/// runtime.manage(sender_actor, SpawnConfig::default());
/// runtime.manage(receiver.into_actor(), SpawnConfig::default());
/// ```
pub struct RemoteReceiver {
    actor: ManagedActor<Idle, RemoteReceiverState>,
    registry: ReceiverRegistry,
    local_endpoint: String,
}

impl RemoteReceiver {
    /// Binds the pull socket and builds the receiver actor.
    ///
    /// A leading `*:` in the endpoint binds all interfaces; port `0`
    /// binds an ephemeral port, observable through
    /// [`local_endpoint`](Self::local_endpoint). The sender handle is
    /// used for emitting [`Reject`]s.
    pub fn bind(endpoint: &str, sender: RemoteSenderHandle) -> Result<Self, RemoteError> {
        super::registry::register_wire_message::<Reject>("Reject");

        let address = wire::bind_addr(endpoint);
        let listener = TcpListener::bind(&address)?;
        listener.set_nonblocking(true)?;
        let local_endpoint = format!("tcp://{}", listener.local_addr()?);
        debug!(%local_endpoint, "remote receiver bound");

        let registry = ReceiverRegistry::default();
        let mut actor = ManagedActor::with_model(
            "remote_receiver",
            RemoteReceiverState {
                listener,
                connections: Vec::new(),
                next_poll: 0,
                sender,
                registry: registry.clone(),
            },
        );

        actor.mutate_on::<Start>(|actor, _context| {
            trace!("remote receiver polling");
            let handle = actor.handle.clone();
            handle.post(Continue, None);
        });

        actor.mutate_on::<Continue>(|actor, _context| {
            poll_once(&mut actor.model);
            let handle = actor.handle.clone();
            handle.post(Continue, None);
        });

        Ok(Self {
            actor,
            registry,
            local_endpoint,
        })
    }

    /// The bound endpoint with its resolved port.
    pub fn local_endpoint(&self) -> &str {
        &self.local_endpoint
    }

    /// A clone of the receiver's registry, for registrations after the
    /// actor has been handed to the runtime.
    pub fn registry(&self) -> ReceiverRegistry {
        self.registry.clone()
    }

    /// Exposes a local actor to remote processes.
    pub fn register_actor(&self, name: &str, handle: &ActorHandle) {
        self.registry.register(name, handle);
    }

    /// Removes a previously exposed actor.
    pub fn unregister_actor(&self, name: &str) {
        self.registry.unregister(name);
    }

    /// Consumes the wrapper, yielding the actor for
    /// [`manage`](crate::common::ActorRuntime::manage).
    pub fn into_actor(self) -> ManagedActor<Idle, RemoteReceiverState> {
        self.actor
    }
}

/// One poll cycle: accept, then pull at most one complete frame.
fn poll_once(state: &mut RemoteReceiverState) {
    accept_pending(state);
    let handled = pull_one_frame(state);
    if !handled {
        thread::sleep(POLL_INTERVAL);
    }
}

fn accept_pending(state: &mut RemoteReceiverState) {
    loop {
        match state.listener.accept() {
            Ok((stream, peer)) => {
                if let Err(error) = stream.set_nonblocking(true) {
                    warn!(%peer, %error, "could not configure pull connection");
                    continue;
                }
                debug!(%peer, "pull connection accepted");
                state.connections.push(PullConnection {
                    stream,
                    buffer: Vec::new(),
                    open: true,
                });
            }
            Err(error) if error.kind() == io::ErrorKind::WouldBlock => break,
            Err(error) => {
                warn!(%error, "accept failed");
                break;
            }
        }
    }
}

/// Scans connections round-robin and handles the first complete frame.
fn pull_one_frame(state: &mut RemoteReceiverState) -> bool {
    let count = state.connections.len();
    let mut handled = false;
    for step in 0..count {
        let index = (state.next_poll + step) % count;
        fill_buffer(&mut state.connections[index]);
        match wire::take_frame(&mut state.connections[index].buffer) {
            Ok(Some(payload)) => {
                state.next_poll = (index + 1) % count;
                handle_payload(state, &payload);
                handled = true;
                break;
            }
            Ok(None) => {}
            Err(error) => {
                warn!(%error, "bad frame; dropping connection");
                state.connections[index].open = false;
                state.connections[index].buffer.clear();
            }
        }
    }
    // A closed connection stays until its buffered frames are drained.
    state
        .connections
        .retain(|connection| connection.open || has_complete_frame(&connection.buffer));
    handled
}

fn has_complete_frame(buffer: &[u8]) -> bool {
    if buffer.len() < wire::FRAME_HEADER_SIZE {
        return false;
    }
    let length = u32::from_be_bytes([buffer[0], buffer[1], buffer[2], buffer[3]]) as usize;
    buffer.len() >= wire::FRAME_HEADER_SIZE + length
}

fn fill_buffer(connection: &mut PullConnection) {
    let mut chunk = [0u8; 4096];
    loop {
        match connection.stream.read(&mut chunk) {
            Ok(0) => {
                connection.open = false;
                break;
            }
            Ok(n) => connection.buffer.extend_from_slice(&chunk[..n]),
            Err(error) if error.kind() == io::ErrorKind::WouldBlock => break,
            Err(error) if error.kind() == io::ErrorKind::Interrupted => continue,
            Err(error) => {
                debug!(%error, "pull connection read failed");
                connection.open = false;
                break;
            }
        }
    }
}

fn handle_payload(state: &RemoteReceiverState, payload: &[u8]) {
    // A parse failure means the sender is unknown, so no Reject is possible.
    let envelope: WireEnvelope = match serde_json::from_slice(payload) {
        Ok(envelope) => envelope,
        Err(error) => {
            debug!(%error, "dropping undecodable envelope");
            return;
        }
    };
    route_envelope(state, envelope);
}

fn route_envelope(state: &RemoteReceiverState, envelope: WireEnvelope) {
    let reply_path = match (&envelope.sender_actor, &envelope.sender_endpoint) {
        (Some(actor), Some(endpoint)) => Some((actor.clone(), endpoint.clone())),
        _ => None,
    };

    let Some(target) = state.registry.get(&envelope.receiver) else {
        debug!(receiver = %envelope.receiver, "envelope for unknown receiver");
        send_reject(
            state,
            reply_path.as_ref(),
            &envelope.message_type,
            format!("Actor '{}' not found", envelope.receiver),
            &envelope.receiver,
        );
        return;
    };

    let message = match wire_registry().deserialize(&envelope.message_type, &envelope.message) {
        Ok(message) => message,
        Err(RemoteError::UnknownMessageType(type_name)) => {
            send_reject(
                state,
                reply_path.as_ref(),
                &envelope.message_type,
                format!("Unknown message type: {type_name}"),
                &envelope.receiver,
            );
            return;
        }
        Err(error) => {
            send_reject(
                state,
                reply_path.as_ref(),
                &envelope.message_type,
                format!("Failed to deserialize {}: {error}", envelope.message_type),
                &envelope.receiver,
            );
            return;
        }
    };

    // Install a remote reference as the sender so the target's reply
    // travels back to the originating process.
    let sender = reply_path.map(|(actor, endpoint)| state.sender.remote_ref(&actor, &endpoint));
    trace!(receiver = %envelope.receiver, message_type = %envelope.message_type, "delivering remote message");
    target.post_boxed(message, sender);
}

fn send_reject(
    state: &RemoteReceiverState,
    reply_path: Option<&(String, String)>,
    message_type: &str,
    reason: String,
    rejected_by: &str,
) {
    let Some((actor, endpoint)) = reply_path else {
        return;
    };
    debug!(%actor, %endpoint, %reason, "rejecting envelope");
    let reject = Reject {
        message_type: message_type.to_string(),
        reason,
        rejected_by: rejected_by.to_string(),
    };
    if let Err(error) = state.sender.send_to(endpoint, actor, reject, None) {
        warn!(%error, "failed to send Reject");
    }
}
