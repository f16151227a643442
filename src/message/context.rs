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

use crate::common::ActorRef;

/// The typed view of an incoming message handed to a handler registered
/// via [`mutate_on`](crate::actor::ManagedActor::mutate_on).
///
/// The context borrows from the envelope for the duration of the handler;
/// the message itself is destroyed when the handler returns.
pub struct MessageContext<'a, M> {
    message: &'a M,
    sender: Option<&'a ActorRef>,
    synchronous: bool,
    last: bool,
}

impl<'a, M> MessageContext<'a, M> {
    pub(crate) fn new(
        message: &'a M,
        sender: Option<&'a ActorRef>,
        synchronous: bool,
        last: bool,
    ) -> Self {
        Self {
            message,
            sender,
            synchronous,
            last,
        }
    }

    /// The message being processed.
    pub fn message(&self) -> &M {
        self.message
    }

    /// A reference to the sender, when the message carried one.
    ///
    /// For messages that arrived over the wire this is a remote reference;
    /// posting to it routes back through the remote sender.
    pub fn sender(&self) -> Option<&ActorRef> {
        self.sender
    }

    /// `true` when this message was delivered by a synchronous call.
    pub fn is_synchronous(&self) -> bool {
        self.synchronous
    }

    /// `true` when the mailbox was left empty by this message's pop.
    pub fn is_last(&self) -> bool {
        self.last
    }
}
