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

use std::any::TypeId;
use std::sync::Arc;

use tracing::{error, trace};

use crate::actor::managed_actor::{HandlerFn, LifecycleHook, ManagedActor, Running};
use crate::message::{Envelope, MessageContext};
use crate::traits::ActorMessage;

/// Type-state marker for a [`ManagedActor`] that is still being
/// configured. Handler registration is only possible in this state;
/// registering the actor with a runtime or group freezes the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Idle;

impl<State: Send + 'static> ManagedActor<Idle, State> {
    /// Registers a handler for messages of type `M`.
    ///
    /// The handler runs under the actor's dispatch lock (on the worker
    /// thread for posted messages, on the caller's thread for
    /// [`call`](crate::common::ActorHandle::call)ed ones) and may mutate
    /// `actor.model` freely. Registering a second handler for the same
    /// type replaces the first.
    ///
    /// ```rust,ignore
    /// builder.mutate_on::<Ping>(|actor, context| {
    ///     actor.model.pings += 1;
    ///     actor.reply(Pong { count: context.message().count });
    /// });
    /// ```
    pub fn mutate_on<M>(
        &mut self,
        message_handler: impl Fn(&mut ManagedActor<Running, State>, &MessageContext<'_, M>)
            + Send
            + Sync
            + 'static,
    ) -> &mut Self
    where
        M: ActorMessage,
    {
        let type_id = TypeId::of::<M>();
        trace!(type_name = std::any::type_name::<M>(), "adding message handler");
        let handler: HandlerFn<State> =
            Arc::new(move |actor: &mut ManagedActor<Running, State>, envelope: &Envelope| {
                if let Some(message) = envelope.message().as_any().downcast_ref::<M>() {
                    let context = MessageContext::new(
                        message,
                        envelope.sender(),
                        envelope.is_synchronous(),
                        envelope.is_last(),
                    );
                    message_handler(actor, &context);
                } else {
                    error!(
                        type_name = std::any::type_name::<M>(),
                        "message failed to downcast; should never get here"
                    );
                }
            });
        self.handlers.insert(type_id, handler);
        self
    }

    /// Sets the hook that runs on the worker thread before the first
    /// message is dequeued.
    pub fn before_start(
        &mut self,
        hook: impl Fn(&mut ManagedActor<Running, State>) + Send + Sync + 'static,
    ) -> &mut Self {
        self.before_start = Arc::new(hook) as LifecycleHook<State>;
        self
    }

    /// Sets the hook that runs after the actor's message loop exits.
    pub fn after_stop(
        &mut self,
        hook: impl Fn(&mut ManagedActor<Running, State>) + Send + Sync + 'static,
    ) -> &mut Self {
        self.after_stop = Arc::new(hook) as LifecycleHook<State>;
        self
    }

    /// Sets the fallback invoked for messages with no registered handler.
    ///
    /// The default fallback drops the message after logging at trace
    /// level; the message is destroyed either way.
    pub fn on_unhandled(
        &mut self,
        handler: impl Fn(&mut ManagedActor<Running, State>, &Envelope) + Send + Sync + 'static,
    ) -> &mut Self {
        self.unhandled = Arc::new(handler) as HandlerFn<State>;
        self
    }
}
