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

use std::sync::Arc;

use crate::actor::managed_actor::AnyActorCell;
use crate::common::ActorRef;
use crate::traits::ActorMessage;

/// The unit that travels through mailboxes: an exclusively owned message
/// plus its delivery bookkeeping.
///
/// Ownership enforces the single-flight invariant: `post` consumes the
/// message into the envelope, so a message that is already in flight
/// cannot be posted again. The receiving actor destroys the envelope
/// (and the message) after its handler returns.
pub struct Envelope {
    message: Box<dyn ActorMessage>,
    sender: Option<ActorRef>,
    synchronous: bool,
    last: bool,
    /// The cell the message was addressed to. `None` only for the
    /// transient envelope built during a synchronous call, which never
    /// enters a mailbox. Group members share the group's mailbox, so the
    /// group worker uses this to route each envelope.
    destination: Option<Arc<dyn AnyActorCell>>,
}

impl Envelope {
    /// Builds an envelope for asynchronous delivery to `destination`.
    pub(crate) fn posted(
        message: Box<dyn ActorMessage>,
        sender: Option<ActorRef>,
        destination: Arc<dyn AnyActorCell>,
    ) -> Self {
        Self {
            message,
            sender,
            synchronous: false,
            last: false,
            destination: Some(destination),
        }
    }

    /// Builds the transient envelope used by a synchronous call.
    pub(crate) fn synchronous(message: Box<dyn ActorMessage>, sender: Option<ActorRef>) -> Self {
        Self {
            message,
            sender,
            synchronous: true,
            last: true,
            destination: None,
        }
    }

    /// The message being delivered.
    pub fn message(&self) -> &dyn ActorMessage {
        &*self.message
    }

    /// The sender's reference, when one was supplied at post time.
    pub fn sender(&self) -> Option<&ActorRef> {
        self.sender.as_ref()
    }

    /// `true` when the message was delivered by a synchronous call.
    pub fn is_synchronous(&self) -> bool {
        self.synchronous
    }

    /// `true` when this message left its mailbox empty at pop time.
    pub fn is_last(&self) -> bool {
        self.last
    }

    pub(crate) fn set_last(&mut self, last: bool) {
        self.last = last;
    }

    pub(crate) fn destination(&self) -> Option<Arc<dyn AnyActorCell>> {
        self.destination.clone()
    }
}

impl std::fmt::Debug for Envelope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Envelope")
            .field("message", &self.message)
            .field("kind", &self.message.kind_id())
            .field("synchronous", &self.synchronous)
            .field("last", &self.last)
            .finish()
    }
}
