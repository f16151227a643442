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
use std::sync::{Arc, OnceLock};

use tracing::trace;

use crate::actor::managed_actor::AnyActorCell;
use crate::common::ActorRef;
use crate::mailbox::Mailbox;
use crate::message::{Envelope, Shutdown};
use crate::traits::ActorMessage;

/// A cloneable reference to one actor.
///
/// Handles are created together with the actor builder, before the actor
/// is registered anywhere, so they can be captured by other actors'
/// handlers. They become usable once the actor is registered with an
/// [`ActorRuntime`](crate::common::ActorRuntime) or added to a
/// [`Group`](crate::actor::Group); using an unregistered handle is a
/// programming error and panics.
#[derive(Clone)]
pub struct ActorHandle {
    inner: Arc<HandleInner>,
}

struct HandleInner {
    name: String,
    wiring: OnceLock<Wiring>,
}

#[derive(Clone)]
pub(crate) struct Wiring {
    pub(crate) mailbox: Arc<Mailbox<Envelope>>,
    pub(crate) cell: Arc<dyn AnyActorCell>,
}

impl ActorHandle {
    /// Creates a handle not yet bound to a runnable actor.
    pub(crate) fn detached(name: &str) -> Self {
        Self {
            inner: Arc::new(HandleInner {
                name: name.to_string(),
                wiring: OnceLock::new(),
            }),
        }
    }

    /// Binds the handle to its inbox and runnable cell. For group members
    /// the mailbox is the group's, never a per-member one.
    pub(crate) fn wire(&self, mailbox: Arc<Mailbox<Envelope>>, cell: Arc<dyn AnyActorCell>) {
        if self.inner.wiring.set(Wiring { mailbox, cell }).is_err() {
            panic!("actor '{}' is already registered", self.inner.name);
        }
    }

    fn wiring(&self) -> &Wiring {
        match self.inner.wiring.get() {
            Some(wiring) => wiring,
            None => panic!(
                "actor '{}' has not been registered with a runtime or group",
                self.inner.name
            ),
        }
    }

    /// The actor's name.
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Delivers a message asynchronously. Never blocks.
    ///
    /// The message is consumed into the receiver's mailbox; once the
    /// actor is terminated the message is silently dropped instead.
    pub fn post(&self, message: impl ActorMessage, sender: Option<ActorRef>) {
        self.post_boxed(Box::new(message), sender);
    }

    /// Boxed form of [`post`](Self::post), used when the message was
    /// produced type-erased (e.g. by the wire deserializer).
    pub fn post_boxed(&self, message: Box<dyn ActorMessage>, sender: Option<ActorRef>) {
        let wiring = self.wiring();
        if wiring.cell.is_terminated() {
            trace!(
                actor = %self.inner.name,
                kind = message.kind_id(),
                "post to terminated actor; dropping"
            );
            return;
        }
        wiring
            .mailbox
            .push(Envelope::posted(message, sender, Arc::clone(&wiring.cell)));
    }

    /// Delivers a message synchronously on the calling thread and returns
    /// the receiver's reply, if its handler produced one.
    ///
    /// The handler runs under the receiver's dispatch lock, so the call
    /// serializes with the receiver's normal message processing. Calling
    /// a terminated actor returns `None` immediately. An actor calling
    /// itself is a programming error and panics.
    pub fn call(
        &self,
        message: impl ActorMessage,
        sender: Option<&ActorHandle>,
    ) -> Option<Box<dyn ActorMessage>> {
        if let Some(sender) = sender {
            assert!(
                !self.same_actor(sender),
                "actor '{}' cannot call itself",
                self.inner.name
            );
        }
        let wiring = self.wiring();
        wiring
            .cell
            .call_boxed(Box::new(message), sender.map(ActorRef::local))
    }

    /// Requests graceful termination by posting a [`Shutdown`] to this
    /// actor's own mailbox.
    pub fn terminate(&self) {
        self.post(Shutdown, None);
    }

    /// `true` once the actor has terminated (or was marked terminated by
    /// the runtime during shutdown).
    pub fn is_terminated(&self) -> bool {
        self.wiring().cell.is_terminated()
    }

    /// Number of messages waiting in this actor's inbox.
    pub fn queue_len(&self) -> usize {
        self.wiring().mailbox.len()
    }

    /// Observes the message at the front of the inbox without dequeuing.
    pub fn peek<R>(&self, observe: impl FnOnce(Option<&dyn ActorMessage>) -> R) -> R {
        self.wiring()
            .mailbox
            .peek(|front| observe(front.map(|envelope| envelope.message())))
    }

    pub(crate) fn same_actor(&self, other: &ActorHandle) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl std::fmt::Debug for ActorHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ActorHandle")
            .field("name", &self.inner.name)
            .field("wired", &self.inner.wiring.get().is_some())
            .finish()
    }
}

impl PartialEq for ActorHandle {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for ActorHandle {}
