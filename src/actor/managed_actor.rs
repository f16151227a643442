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

//! The managed actor: a type-state wrapper around user state.
//!
//! A `ManagedActor<Idle, State>` is a builder: handlers and lifecycle
//! hooks are registered on it before it is handed to an
//! [`ActorRuntime`](crate::common::ActorRuntime) or a
//! [`Group`](crate::actor::Group). Registration converts it into a
//! `ManagedActor<Running, State>` living behind the actor's *dispatch
//! lock*, which both the worker thread and synchronous
//! [`call`](crate::common::ActorHandle::call)ers acquire before invoking
//! handlers. The handler table is frozen at that conversion and never
//! mutated again.

use std::any::TypeId;
use std::collections::HashMap;
use std::marker::PhantomData;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::trace;

use crate::common::{ActorHandle, ActorRef};
use crate::mailbox::{Mailbox, RING_CAPACITY};
use crate::message::Envelope;
use crate::traits::ActorMessage;

pub use idle::Idle;
pub use running::Running;

pub(crate) mod idle;
pub(crate) mod running;

/// Number of slots in the per-actor kind-id handler cache.
///
/// Message kinds in `0..HANDLER_CACHE_SIZE` are dispatched through an
/// array read after their first delivery; kinds outside the range fall
/// back to the type map on every delivery.
pub const HANDLER_CACHE_SIZE: usize = 512;

/// A handler bound to one actor, invoked under the dispatch lock.
pub(crate) type HandlerFn<State> =
    Arc<dyn Fn(&mut ManagedActor<Running, State>, &Envelope) + Send + Sync>;

/// A lifecycle hook (`before_start` / `after_stop`).
pub(crate) type LifecycleHook<State> =
    Arc<dyn Fn(&mut ManagedActor<Running, State>) + Send + Sync>;

/// An actor paired with its state machine marker (`Idle` or `Running`)
/// and its user-defined `State` model.
pub struct ManagedActor<ActorStatus, State> {
    /// The actor's user-defined state, freely mutable from handlers.
    pub model: State,
    pub(crate) name: String,
    pub(crate) handle: ActorHandle,
    pub(crate) mailbox: Arc<Mailbox<Envelope>>,
    pub(crate) terminated: Arc<AtomicBool>,
    pub(crate) handlers: HashMap<TypeId, HandlerFn<State>>,
    pub(crate) unhandled: HandlerFn<State>,
    pub(crate) before_start: LifecycleHook<State>,
    pub(crate) after_stop: LifecycleHook<State>,
    pub(crate) handler_cache: Vec<Option<HandlerFn<State>>>,
    pub(crate) known_absent: Vec<bool>,
    pub(crate) reply_target: Option<ActorRef>,
    pub(crate) pending_reply: Option<Box<dyn ActorMessage>>,
    pub(crate) in_call: bool,
    pub(crate) message_count: u64,
    pub(crate) thread_id: Option<i32>,
    pub(crate) _status: PhantomData<ActorStatus>,
}

impl<ActorStatus, State> ManagedActor<ActorStatus, State> {
    /// The actor's name, unique within its runtime.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The handle other actors use to reach this one.
    pub fn handle(&self) -> &ActorHandle {
        &self.handle
    }
}

/// The runnable form of an actor: the running state behind its dispatch
/// lock, plus the pieces shared with handles and the runtime.
pub(crate) struct ActorCell<State> {
    pub(crate) name: String,
    pub(crate) mailbox: Arc<Mailbox<Envelope>>,
    pub(crate) terminated: Arc<AtomicBool>,
    pub(crate) actor: Mutex<ManagedActor<Running, State>>,
}

/// Type-erased view of an [`ActorCell`], shared by handles, envelopes,
/// groups, and the runtime.
pub(crate) trait AnyActorCell: Send + Sync {
    fn name(&self) -> &str;

    fn mailbox(&self) -> &Arc<Mailbox<Envelope>>;

    /// Dispatches one queued envelope under the dispatch lock, consuming
    /// (and thereby destroying) the message.
    fn dispatch_envelope(&self, envelope: Envelope);

    /// Synchronous delivery: runs the matching handler on the calling
    /// thread under the dispatch lock and returns the handler's reply.
    fn call_boxed(
        &self,
        message: Box<dyn ActorMessage>,
        sender: Option<ActorRef>,
    ) -> Option<Box<dyn ActorMessage>>;

    /// Runs the `before_start` hook (used for group members, which never
    /// get a worker thread of their own).
    fn invoke_before_start(&self);

    /// Runs the `after_stop` hook.
    fn invoke_after_stop(&self);

    fn is_terminated(&self) -> bool;

    fn mark_terminated(&self);

    fn message_count(&self) -> u64;

    fn thread_id(&self) -> Option<i32>;

    /// The worker loop. Consumes the thread it runs on until shutdown.
    fn run(self: Arc<Self>);
}

impl<State: Send + 'static> ManagedActor<Idle, State> {
    pub(crate) fn with_model(name: impl Into<String>, model: State) -> Self {
        let name = name.into();
        let mailbox = Arc::new(Mailbox::new(RING_CAPACITY));
        let unhandled: HandlerFn<State> = Arc::new(|actor, envelope| {
            trace!(
                actor = %actor.name,
                kind = envelope.message().kind_id(),
                "no handler registered; dropping message"
            );
        });
        let noop_hook: LifecycleHook<State> = Arc::new(|_actor| {});
        Self {
            model,
            handle: ActorHandle::detached(&name),
            name,
            mailbox,
            terminated: Arc::new(AtomicBool::new(false)),
            handlers: HashMap::new(),
            unhandled,
            before_start: noop_hook.clone(),
            after_stop: noop_hook,
            handler_cache: Vec::new(),
            known_absent: Vec::new(),
            reply_target: None,
            pending_reply: None,
            in_call: false,
            message_count: 0,
            thread_id: None,
            _status: PhantomData,
        }
    }

    /// Converts this builder into a runnable cell whose inbox is
    /// `mailbox`, wiring the actor's handle in the process. Top-level
    /// actors keep their own mailbox; group members receive the group's.
    pub(crate) fn into_cell_with_mailbox(
        self,
        mailbox: Arc<Mailbox<Envelope>>,
    ) -> Arc<ActorCell<State>> {
        let handle = self.handle.clone();
        let terminated = Arc::clone(&self.terminated);
        let name = self.name.clone();
        let running: ManagedActor<Running, State> = self.into();
        let cell = Arc::new(ActorCell {
            name,
            mailbox: Arc::clone(&mailbox),
            terminated,
            actor: Mutex::new(running),
        });
        handle.wire(mailbox, cell.clone());
        cell
    }

    pub(crate) fn into_cell(self) -> Arc<ActorCell<State>> {
        let mailbox = Arc::clone(&self.mailbox);
        self.into_cell_with_mailbox(mailbox)
    }
}

impl<State: Send + 'static> ManagedActor<Idle, State>
where
    State: Default,
{
    pub(crate) fn new(name: impl Into<String>) -> Self {
        Self::with_model(name, State::default())
    }
}

impl<State: Send + 'static> From<ManagedActor<Idle, State>> for ManagedActor<Running, State> {
    fn from(value: ManagedActor<Idle, State>) -> Self {
        ManagedActor::<Running, State> {
            model: value.model,
            name: value.name,
            handle: value.handle,
            mailbox: value.mailbox,
            terminated: value.terminated,
            handlers: value.handlers,
            unhandled: value.unhandled,
            before_start: value.before_start,
            after_stop: value.after_stop,
            handler_cache: vec![None; HANDLER_CACHE_SIZE],
            known_absent: vec![false; HANDLER_CACHE_SIZE],
            reply_target: None,
            pending_reply: None,
            in_call: false,
            message_count: 0,
            thread_id: None,
            _status: PhantomData,
        }
    }
}

impl<State> std::fmt::Debug for ManagedActor<Running, State> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ManagedActor")
            .field("name", &self.name)
            .field("message_count", &self.message_count)
            .field("terminated", &self.terminated.load(Ordering::Acquire))
            .finish()
    }
}
