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

//! The outbound half of the remote bridge.
//!
//! `RemoteSender` is itself an actor, so callers never block on the
//! network: `send_to` serializes the message on the caller's thread
//! (localizing the per-message CPU cost), then posts an internal dispatch
//! record to the sender's own mailbox. The actual socket write happens
//! later on the sender's worker thread, which owns one cached push
//! connection per endpoint; no socket is ever shared across threads.

use std::collections::HashMap;
use std::net::TcpStream;
use std::sync::Arc;

use tracing::{debug, error, instrument, trace, warn};

use super::registry::wire_registry;
use super::types::RemoteError;
use super::wire::{self, WireEnvelope};
use crate::actor::{Idle, ManagedActor};
use crate::actor_message;
use crate::common::{ActorHandle, ActorRef};
use crate::message::{kinds, Reject, Start};
use crate::traits::ActorMessage;

/// Internal record carried from `send_to` to the sender's worker. Never
/// serialized; its body is already JSON.
#[derive(Debug)]
struct RemoteDispatch {
    endpoint: String,
    receiver: String,
    sender_actor: Option<String>,
    sender_endpoint: Option<String>,
    message_type: String,
    body: serde_json::Value,
}

actor_message!(RemoteDispatch, kinds::REMOTE_DISPATCH);

/// State owned by the remote sender actor: the push connection cache.
pub struct RemoteSenderState {
    local_endpoint: String,
    connections: HashMap<String, TcpStream>,
}

/// Builder for the remote sender actor.
///
/// ```rust,ignore
/// let (sender_actor, sender) = RemoteSender::create("tcp://localhost:5002");
/// runtime.manage(sender_actor, SpawnConfig::default());
///
/// // After init(), sends are asynchronous:
/// sender.send_to("tcp://localhost:5001", "pong", Ping { count: 1 }, Some(&ping_handle))?;
/// ```
pub struct RemoteSender;

impl RemoteSender {
    /// Creates the sender actor and a cheap handle for issuing sends.
    ///
    /// `local_endpoint` is this process's inbound endpoint, stamped into
    /// outgoing envelopes as the reply path. The actor must be managed by
    /// a runtime before anything is sent through it.
    pub fn create(
        local_endpoint: impl Into<String>,
    ) -> (ManagedActor<Idle, RemoteSenderState>, RemoteSenderHandle) {
        super::registry::register_wire_message::<Reject>("Reject");

        let local_endpoint = local_endpoint.into();
        let mut actor = ManagedActor::with_model(
            "remote_sender",
            RemoteSenderState {
                local_endpoint: local_endpoint.clone(),
                connections: HashMap::new(),
            },
        );

        actor.mutate_on::<Start>(|actor, _context| {
            trace!(endpoint = %actor.model.local_endpoint, "remote sender ready");
        });

        actor.mutate_on::<RemoteDispatch>(|actor, context| {
            deliver(&mut actor.model, context.message());
        });

        actor.after_stop(|actor| {
            debug!(
                connections = actor.model.connections.len(),
                "remote sender closing push connections"
            );
            actor.model.connections.clear();
        });

        let handle = RemoteSenderHandle {
            handle: actor.handle().clone(),
            local_endpoint: Arc::new(local_endpoint),
        };
        (actor, handle)
    }
}

/// Runs on the sender's worker: build the envelope and write it to the
/// cached connection for the target endpoint.
fn deliver(state: &mut RemoteSenderState, request: &RemoteDispatch) {
    let envelope = WireEnvelope {
        sender_actor: request.sender_actor.clone(),
        sender_endpoint: request.sender_endpoint.clone(),
        receiver: request.receiver.clone(),
        message_type: request.message_type.clone(),
        message: request.body.clone(),
    };
    let payload = match serde_json::to_vec(&envelope) {
        Ok(payload) => payload,
        Err(error) => {
            error!(%error, "envelope serialization failed");
            return;
        }
    };
    if let Err(error) = write_to_endpoint(state, &request.endpoint, &payload) {
        warn!(endpoint = %request.endpoint, %error, "remote write failed; dropping connection");
        state.connections.remove(&request.endpoint);
    }
}

fn write_to_endpoint(
    state: &mut RemoteSenderState,
    endpoint: &str,
    payload: &[u8],
) -> Result<(), RemoteError> {
    use std::collections::hash_map::Entry;

    let stream = match state.connections.entry(endpoint.to_string()) {
        Entry::Occupied(entry) => entry.into_mut(),
        Entry::Vacant(entry) => {
            let address = wire::connect_addr(endpoint);
            debug!(%address, "connecting push socket");
            let stream = TcpStream::connect(&address)?;
            let _ = stream.set_nodelay(true);
            entry.insert(stream)
        }
    };
    wire::write_frame(stream, payload)
}

/// Cheap, cloneable handle to a [`RemoteSender`] actor.
#[derive(Clone)]
pub struct RemoteSenderHandle {
    handle: ActorHandle,
    local_endpoint: Arc<String>,
}

impl RemoteSenderHandle {
    /// Sends a message to a named actor in another process.
    ///
    /// The message is serialized here, on the calling thread, and then
    /// destroyed; the network write happens asynchronously on the
    /// sender's own thread. `sender` establishes the reply path: its name
    /// and this process's inbound endpoint travel in the envelope.
    ///
    /// # Errors
    ///
    /// [`RemoteError::UnregisteredKind`] when the message's kind was
    /// never registered with the wire registry, and
    /// [`RemoteError::SerializationError`] when serialization fails. In
    /// both cases the message is destroyed and no envelope is emitted.
    #[instrument(skip(self, message), fields(kind = message.kind_id()))]
    pub fn send_to(
        &self,
        endpoint: &str,
        actor_name: &str,
        message: impl ActorMessage,
        sender: Option<&ActorHandle>,
    ) -> Result<(), RemoteError> {
        self.send_boxed_to(endpoint, actor_name, Box::new(message), sender)
    }

    pub(crate) fn send_boxed_to(
        &self,
        endpoint: &str,
        actor_name: &str,
        message: Box<dyn ActorMessage>,
        sender: Option<&ActorHandle>,
    ) -> Result<(), RemoteError> {
        let (message_type, body) = wire_registry().serialize(message.as_ref())?;
        drop(message);

        let dispatch = RemoteDispatch {
            endpoint: endpoint.to_string(),
            receiver: actor_name.to_string(),
            sender_actor: sender.map(|handle| handle.name().to_string()),
            sender_endpoint: sender.map(|_| self.local_endpoint.as_ref().clone()),
            message_type,
            body,
        };
        self.handle.post(dispatch, None);
        Ok(())
    }

    /// Creates an [`ActorRef`] for a remote actor, usable wherever a
    /// local reference is.
    pub fn remote_ref(&self, name: &str, endpoint: &str) -> ActorRef {
        ActorRef::Remote(RemoteActorRef {
            name: name.to_string(),
            endpoint: endpoint.to_string(),
            sender: self.clone(),
        })
    }

    /// This process's inbound endpoint, as stamped into envelopes.
    pub fn local_endpoint(&self) -> &str {
        &self.local_endpoint
    }
}

impl std::fmt::Debug for RemoteSenderHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteSenderHandle")
            .field("local_endpoint", &self.local_endpoint)
            .finish()
    }
}

/// Reference to an actor in another process; the remote variant of
/// [`ActorRef`].
///
/// This is also what the remote receiver installs as the sender of
/// messages delivered from the wire, so `reply` from a local handler
/// forwards back to the originating process through the sender actor.
#[derive(Clone)]
pub struct RemoteActorRef {
    name: String,
    endpoint: String,
    sender: RemoteSenderHandle,
}

impl RemoteActorRef {
    /// The remote actor's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The remote process's inbound endpoint.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Fire-and-forget delivery through the remote sender. Failures
    /// (unregistered kind, serialization) are logged, matching `post`'s
    /// non-blocking, non-failing contract.
    pub(crate) fn post_boxed(&self, message: Box<dyn ActorMessage>, sender: Option<ActorRef>) {
        let sender_handle = match &sender {
            Some(ActorRef::Local(handle)) => Some(handle),
            _ => None,
        };
        if let Err(error) =
            self.sender
                .send_boxed_to(&self.endpoint, &self.name, message, sender_handle)
        {
            warn!(actor = %self.name, endpoint = %self.endpoint, %error, "remote post failed");
        }
    }
}
