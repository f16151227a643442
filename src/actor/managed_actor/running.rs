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

use std::sync::atomic::Ordering;
use std::sync::Arc;

use tracing::{debug, trace, warn};

use crate::actor::managed_actor::{
    ActorCell, AnyActorCell, ManagedActor, HANDLER_CACHE_SIZE,
};
use crate::common::{os, ActorRef};
use crate::mailbox::Mailbox;
use crate::message::{kinds, Envelope};
use crate::traits::ActorMessage;

/// Type-state marker for a [`ManagedActor`] whose worker loop is live.
///
/// This is the state handlers see: `actor.model` is the user state,
/// [`reply`](ManagedActor::reply) answers the message currently being
/// processed, and [`stop`](ManagedActor::stop) requests termination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Running;

impl<State: Send + 'static> ManagedActor<Running, State> {
    /// Replies to the message currently being processed.
    ///
    /// For a message delivered by [`call`](crate::common::ActorHandle::call)
    /// the reply is handed back to the caller as the return value of the
    /// call. For a posted message the reply is posted to the remembered
    /// sender. That sender may be a remote reference, in which case the
    /// reply travels back through the remote sender transparently.
    pub fn reply(&mut self, message: impl ActorMessage) {
        if self.in_call {
            self.pending_reply = Some(Box::new(message));
            return;
        }
        match self.reply_target.clone() {
            Some(target) => {
                target.post_boxed(Box::new(message), Some(ActorRef::local(&self.handle)));
            }
            None => warn!(actor = %self.name, "reply with no return address; dropping"),
        }
    }

    /// Requests termination of this actor.
    ///
    /// The flag is monotone: once set, `post` to this actor becomes a
    /// no-op and the worker loop exits after the current message.
    pub fn stop(&mut self) {
        self.terminated.store(true, Ordering::Release);
    }

    /// Number of messages this actor has processed.
    pub fn message_count(&self) -> u64 {
        self.message_count
    }

    /// Looks up and invokes the handler for one message.
    ///
    /// Two-tier lookup: the kind-id cache first (populated on the first
    /// map hit for kinds below [`HANDLER_CACHE_SIZE`]), then the type map.
    /// A miss sets the known-absent flag so the map is consulted at most
    /// once per (actor, kind), and routes the message to the unhandled
    /// fallback.
    pub(crate) fn dispatch(&mut self, envelope: &Envelope) {
        self.message_count += 1;

        let kind = envelope.message().kind_id() as usize;
        if kind < HANDLER_CACHE_SIZE {
            if let Some(handler) = self.handler_cache[kind].clone() {
                handler(self, envelope);
                return;
            }
            if self.known_absent[kind] {
                let fallback = self.unhandled.clone();
                fallback(self, envelope);
                return;
            }
        }

        let type_id = envelope.message().as_any().type_id();
        if let Some(handler) = self.handlers.get(&type_id).cloned() {
            handler(self, envelope);
            if kind < HANDLER_CACHE_SIZE {
                self.handler_cache[kind] = Some(handler);
            }
        } else {
            if kind < HANDLER_CACHE_SIZE {
                self.known_absent[kind] = true;
            }
            trace!(actor = %self.name, kind, "no handler for message kind");
            let fallback = self.unhandled.clone();
            fallback(self, envelope);
        }
    }
}

impl<State: Send + 'static> AnyActorCell for ActorCell<State> {
    fn name(&self) -> &str {
        &self.name
    }

    fn mailbox(&self) -> &Arc<Mailbox<Envelope>> {
        &self.mailbox
    }

    fn dispatch_envelope(&self, envelope: Envelope) {
        let mut actor = self.actor.lock();
        actor.reply_target = envelope.sender().cloned();
        actor.in_call = false;
        actor.dispatch(&envelope);
        // The envelope (and the message it owns) is destroyed here.
    }

    fn call_boxed(
        &self,
        message: Box<dyn ActorMessage>,
        sender: Option<ActorRef>,
    ) -> Option<Box<dyn ActorMessage>> {
        let mut actor = self.actor.lock();
        actor.pending_reply = None;
        actor.reply_target = sender.clone();
        actor.in_call = true;
        if self.terminated.load(Ordering::Acquire) {
            actor.in_call = false;
            return None;
        }
        let envelope = Envelope::synchronous(message, sender);
        actor.dispatch(&envelope);
        actor.in_call = false;
        actor.pending_reply.take()
    }

    fn invoke_before_start(&self) {
        let mut actor = self.actor.lock();
        let hook = actor.before_start.clone();
        hook(&mut actor);
    }

    fn invoke_after_stop(&self) {
        let mut actor = self.actor.lock();
        let hook = actor.after_stop.clone();
        hook(&mut actor);
    }

    fn is_terminated(&self) -> bool {
        self.terminated.load(Ordering::Acquire)
    }

    fn mark_terminated(&self) {
        self.terminated.store(true, Ordering::Release);
    }

    fn message_count(&self) -> u64 {
        self.actor.lock().message_count
    }

    fn thread_id(&self) -> Option<i32> {
        self.actor.lock().thread_id
    }

    fn run(self: Arc<Self>) {
        {
            let mut actor = self.actor.lock();
            actor.thread_id = os::current_thread_id();
            debug!(actor = %self.name, tid = ?actor.thread_id, "worker started");
            let hook = actor.before_start.clone();
            hook(&mut actor);
        }

        loop {
            let (mut envelope, last) = self.mailbox.pop();
            if self.terminated.load(Ordering::Acquire) {
                trace!(actor = %self.name, "terminated while waiting; exiting loop");
                break;
            }
            envelope.set_last(last);
            let shutdown = envelope.message().kind_id() == kinds::SHUTDOWN;

            // Group members share this mailbox; route each envelope to the
            // cell it was addressed to. For a plain actor that is self.
            let destination: Arc<dyn AnyActorCell> = match envelope.destination() {
                Some(cell) => cell,
                None => self.clone(),
            };
            destination.dispatch_envelope(envelope);

            if shutdown || self.terminated.load(Ordering::Acquire) {
                break;
            }
        }

        self.terminated.store(true, Ordering::Release);
        {
            let mut actor = self.actor.lock();
            let hook = actor.after_stop.clone();
            hook(&mut actor);
        }
        debug!(actor = %self.name, "worker stopped");
    }
}
