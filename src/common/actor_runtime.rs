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

//! The runtime environment that manages actor lifecycles.
//!
//! The runtime registers actors, launches one worker thread per top-level
//! registration (groups count as one), applies CPU affinity and
//! scheduling configuration, and drives the start/shutdown protocol. It
//! has a mailbox of its own: posting [`Shutdown`] to
//! [`handle()`](ActorRuntime::handle) is how any actor asks the whole
//! system to stop.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

use tracing::{debug, error, instrument, trace, warn};

use crate::actor::managed_actor::AnyActorCell;
use crate::actor::{Group, Idle, ManagedActor, SpawnConfig};
use crate::common::{os, ActorHandle, ActorRef};
use crate::mailbox::{Mailbox, RING_CAPACITY};
use crate::message::{kinds, Envelope, Shutdown, Start};
use crate::traits::ActorMessage;

/// Lifecycle manager for a set of actors.
///
/// ```rust,ignore
/// let mut runtime = ActorRuntime::launch();
/// let mut counter = runtime.new_actor::<CounterState>("counter");
/// counter.mutate_on::<Tick>(|actor, _| actor.model.ticks += 1);
/// let handle = runtime.manage(counter, SpawnConfig::default());
///
/// runtime.init();
/// handle.post(Tick, None);
/// runtime.shutdown();
/// ```
pub struct ActorRuntime {
    handle: ActorHandle,
    mailbox: Arc<Mailbox<Envelope>>,
    control: Arc<ControlCell>,
    managed: Vec<Managed>,
    registered_names: BTreeSet<String>,
    workers: Vec<thread::JoinHandle<()>>,
    initialized: bool,
}

struct Managed {
    cell: Arc<dyn AnyActorCell>,
    config: SpawnConfig,
}

impl ActorRuntime {
    /// Creates an empty runtime.
    pub fn launch() -> Self {
        let mailbox = Arc::new(Mailbox::new(RING_CAPACITY));
        let control = Arc::new(ControlCell {
            name: "runtime".to_string(),
            mailbox: Arc::clone(&mailbox),
            terminated: AtomicBool::new(false),
        });
        let handle = ActorHandle::detached("runtime");
        handle.wire(Arc::clone(&mailbox), control.clone());
        Self {
            handle,
            mailbox,
            control,
            managed: Vec::new(),
            registered_names: BTreeSet::new(),
            workers: Vec::new(),
            initialized: false,
        }
    }

    /// Creates an actor builder with `State::default()` as its model.
    pub fn new_actor<State: Default + Send + 'static>(
        &mut self,
        name: &str,
    ) -> ManagedActor<Idle, State> {
        ManagedActor::new(name)
    }

    /// Creates an actor builder with an explicit model value.
    pub fn new_actor_with<State: Send + 'static>(
        &mut self,
        name: &str,
        model: State,
    ) -> ManagedActor<Idle, State> {
        ManagedActor::with_model(name, model)
    }

    /// Creates an empty group.
    pub fn new_group(&mut self, name: &str) -> Group {
        Group::new(name)
    }

    /// The runtime's own handle. Posting [`Shutdown`] here initiates
    /// system-wide termination (observed by [`end`](Self::end)).
    pub fn handle(&self) -> &ActorHandle {
        &self.handle
    }

    /// Registers an actor and stores its worker configuration.
    ///
    /// Panics on a duplicate name (including names inside managed
    /// groups), on affinity core ids outside the machine's range, and
    /// when called after [`init`](Self::init); these are programming
    /// errors.
    pub fn manage<State: Send + 'static>(
        &mut self,
        actor: ManagedActor<Idle, State>,
        config: SpawnConfig,
    ) -> ActorHandle {
        assert!(!self.initialized, "manage must happen before init");
        Self::check_affinity(actor.name(), &config);
        self.claim_name(actor.name());
        let handle = actor.handle().clone();
        let cell = actor.into_cell();
        debug!(actor = cell.name(), "managed");
        self.managed.push(Managed { cell, config });
        handle
    }

    /// Registers a group as a single top-level actor.
    ///
    /// Member names count against the runtime's name space, so a member
    /// cannot also be managed on its own.
    pub fn manage_group(&mut self, group: Group, config: SpawnConfig) -> ActorHandle {
        assert!(!self.initialized, "manage must happen before init");
        assert!(
            !group.member_names().is_empty(),
            "add actors to group '{}' before managing it",
            group.name()
        );
        Self::check_affinity(group.name(), &config);
        self.claim_name(group.name());
        let member_names: Vec<String> = group.member_names().to_vec();
        for member in &member_names {
            self.claim_name(member);
        }
        let handle = group.actor.handle().clone();
        let cell = group.actor.into_cell();
        debug!(group = cell.name(), members = member_names.len(), "managed");
        self.managed.push(Managed { cell, config });
        handle
    }

    fn claim_name(&mut self, name: &str) {
        assert!(
            self.registered_names.insert(name.to_string()),
            "actor name '{name}' is already managed"
        );
    }

    fn check_affinity(name: &str, config: &SpawnConfig) {
        let cores = os::available_cores();
        for &core in &config.affinity {
            assert!(
                core < cores,
                "core id {core} out of range for actor '{name}' ({cores} cores online)"
            );
        }
    }

    /// Starts every managed actor.
    ///
    /// Start is delivered via `call` on this thread *before* any worker
    /// exists, so synchronous preconditions hold before the first queued
    /// message is dequeued. Messages posted by Start handlers simply wait
    /// in mailboxes until the workers spin up. Affinity and scheduling
    /// failures are logged and ignored.
    #[instrument(skip(self))]
    pub fn init(&mut self) {
        assert!(!self.initialized, "init called twice");
        self.initialized = true;

        for managed in &self.managed {
            debug!(actor = managed.cell.name(), "delivering Start");
            managed.cell.call_boxed(Box::new(Start), None);
        }

        for managed in &self.managed {
            let cell = Arc::clone(&managed.cell);
            let name = cell.name().to_string();
            let worker = thread::Builder::new()
                .name(name.clone())
                .spawn(move || cell.run())
                .expect("failed to spawn worker thread");

            if !managed.config.affinity.is_empty() {
                debug!(actor = %name, cores = ?managed.config.affinity, "pinning worker");
                if let Err(error) = os::set_thread_affinity(&worker, &managed.config.affinity) {
                    warn!(actor = %name, %error, "could not set affinity");
                }
            }
            if managed.config.priority > 0 {
                debug!(
                    actor = %name,
                    priority = managed.config.priority,
                    class = ?managed.config.scheduling,
                    "applying scheduling parameters"
                );
                if let Err(error) = os::set_thread_scheduling(
                    &worker,
                    managed.config.scheduling,
                    managed.config.priority,
                ) {
                    warn!(actor = %name, %error, "could not set scheduling priority");
                }
            }
            self.workers.push(worker);
        }

        self.handle.post(Start, None);
    }

    /// Blocks until the runtime receives [`Shutdown`], then terminates
    /// every managed actor and joins all workers.
    #[instrument(skip(self))]
    pub fn end(&mut self) {
        if self.initialized {
            loop {
                let (envelope, _) = self.mailbox.pop();
                match envelope.message().kind_id() {
                    kinds::SHUTDOWN => break,
                    kinds::START => trace!("runtime started"),
                    kind => trace!(kind, "ignoring message to runtime"),
                }
            }
            debug!("runtime shutting down {} actors", self.managed.len());
            for managed in &self.managed {
                Self::fast_terminate(&managed.cell);
            }
        }
        self.control.terminated.store(true, Ordering::Release);
        for worker in self.workers.drain(..) {
            let name = worker.thread().name().unwrap_or("worker").to_string();
            if worker.join().is_err() {
                error!(worker = %name, "worker thread panicked");
            }
        }
    }

    /// Posts [`Shutdown`] to the runtime itself and then runs
    /// [`end`](Self::end). Convenience for main threads that want to stop
    /// the system without involving an actor.
    pub fn shutdown(&mut self) {
        self.handle.post(Shutdown, None);
        self.end();
    }

    /// Terminates one actor: deliver Shutdown synchronously (unless the
    /// actor already stopped), mark it terminated, then push a wake
    /// envelope straight into its mailbox so a worker blocked in `pop`
    /// observes the flag and exits. Repeated shutdowns are no-ops.
    fn fast_terminate(cell: &Arc<dyn AnyActorCell>) {
        if !cell.is_terminated() {
            cell.call_boxed(Box::new(Shutdown), None);
        }
        cell.mark_terminated();
        cell.mailbox()
            .push(Envelope::posted(Box::new(Shutdown), None, Arc::clone(cell)));
    }

    /// Pending message count per top-level actor.
    pub fn queue_lengths(&self) -> BTreeMap<String, usize> {
        self.managed
            .iter()
            .map(|managed| (managed.cell.name().to_string(), managed.cell.mailbox().len()))
            .collect()
    }

    /// Thread id and processed message count per top-level actor.
    pub fn message_counts(&self) -> BTreeMap<String, (Option<i32>, u64)> {
        self.managed
            .iter()
            .map(|managed| {
                (
                    managed.cell.name().to_string(),
                    (managed.cell.thread_id(), managed.cell.message_count()),
                )
            })
            .collect()
    }

    /// All registered names, including actors inside groups.
    pub fn managed_names(&self) -> Vec<String> {
        self.registered_names.iter().cloned().collect()
    }
}

/// The runtime's inert cell: it backs the runtime's handle so actors can
/// post to the orchestrator, but its envelopes are drained by
/// [`ActorRuntime::end`] rather than a worker loop.
struct ControlCell {
    name: String,
    mailbox: Arc<Mailbox<Envelope>>,
    terminated: AtomicBool,
}

impl AnyActorCell for ControlCell {
    fn name(&self) -> &str {
        &self.name
    }

    fn mailbox(&self) -> &Arc<Mailbox<Envelope>> {
        &self.mailbox
    }

    fn dispatch_envelope(&self, envelope: Envelope) {
        trace!(kind = envelope.message().kind_id(), "runtime control envelope ignored");
    }

    fn call_boxed(
        &self,
        message: Box<dyn ActorMessage>,
        _sender: Option<ActorRef>,
    ) -> Option<Box<dyn ActorMessage>> {
        warn!(kind = message.kind_id(), "call to the runtime is not supported");
        None
    }

    fn invoke_before_start(&self) {}

    fn invoke_after_stop(&self) {}

    fn is_terminated(&self) -> bool {
        self.terminated.load(Ordering::Acquire)
    }

    fn mark_terminated(&self) {
        self.terminated.store(true, Ordering::Release);
    }

    fn message_count(&self) -> u64 {
        0
    }

    fn thread_id(&self) -> Option<i32> {
        None
    }

    fn run(self: Arc<Self>) {
        error!("the runtime control cell is never spawned");
    }
}
