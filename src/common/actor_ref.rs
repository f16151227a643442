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

use crate::common::ActorHandle;
use crate::remote::RemoteActorRef;
use crate::traits::ActorMessage;

/// A polymorphic, send-only reference to an actor: either a handle to a
/// local actor or a (name, endpoint, sender) triple for an actor in
/// another process.
///
/// `post` has identical syntax for both variants; the remote variant
/// serializes the message and routes it through its
/// [`RemoteSenderHandle`](crate::remote::RemoteSenderHandle). This is
/// also the type installed as the *sender* of messages that arrived over
/// the wire, so a handler's `reply` transparently travels back to the
/// originating process.
#[derive(Clone)]
pub enum ActorRef {
    /// An actor in this process.
    Local(ActorHandle),
    /// An actor reachable through a remote sender.
    Remote(RemoteActorRef),
}

impl ActorRef {
    /// Wraps a local handle.
    pub fn local(handle: &ActorHandle) -> Self {
        ActorRef::Local(handle.clone())
    }

    /// Delivers a message asynchronously, locally or across processes.
    pub fn post(&self, message: impl ActorMessage, sender: Option<ActorRef>) {
        self.post_boxed(Box::new(message), sender);
    }

    /// Boxed form of [`post`](Self::post).
    pub fn post_boxed(&self, message: Box<dyn ActorMessage>, sender: Option<ActorRef>) {
        match self {
            ActorRef::Local(handle) => handle.post_boxed(message, sender),
            ActorRef::Remote(remote) => remote.post_boxed(message, sender),
        }
    }

    /// Synchronous delivery with a reply. Local references only; calling
    /// a remote reference is a programming error and panics.
    pub fn call(
        &self,
        message: impl ActorMessage,
        sender: Option<&ActorHandle>,
    ) -> Option<Box<dyn ActorMessage>> {
        match self {
            ActorRef::Local(handle) => handle.call(message, sender),
            ActorRef::Remote(remote) => panic!(
                "call is local-only; '{}' is a remote reference",
                remote.name()
            ),
        }
    }

    /// `true` for the local variant.
    pub fn is_local(&self) -> bool {
        matches!(self, ActorRef::Local(_))
    }

    /// `true` for the remote variant.
    pub fn is_remote(&self) -> bool {
        matches!(self, ActorRef::Remote(_))
    }

    /// The referenced actor's name, for either variant.
    pub fn name(&self) -> &str {
        match self {
            ActorRef::Local(handle) => handle.name(),
            ActorRef::Remote(remote) => remote.name(),
        }
    }
}

impl From<&ActorHandle> for ActorRef {
    fn from(handle: &ActorHandle) -> Self {
        ActorRef::Local(handle.clone())
    }
}

impl std::fmt::Debug for ActorRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ActorRef::Local(handle) => f.debug_tuple("Local").field(&handle.name()).finish(),
            ActorRef::Remote(remote) => f
                .debug_struct("Remote")
                .field("name", &remote.name())
                .field("endpoint", &remote.endpoint())
                .finish(),
        }
    }
}
