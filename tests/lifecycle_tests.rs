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

#![allow(dead_code)]

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{mpsc, Arc, Mutex};
use std::thread::ThreadId;
use std::time::Duration;

use axon::prelude::*;

use crate::setup::{initialize_tracing, Tag};

mod setup;

const RECV_TIMEOUT: Duration = Duration::from_secs(5);

/// Registering two actors under one name is a programming error.
#[test]
#[should_panic(expected = "already managed")]
fn test_duplicate_name_panics() {
    initialize_tracing();
    let mut runtime = ActorRuntime::launch();
    let first = runtime.new_actor::<()>("dup");
    runtime.manage(first, SpawnConfig::default());
    let second = runtime.new_actor::<()>("dup");
    runtime.manage(second, SpawnConfig::default());
}

/// A group member's name occupies the runtime's name space too.
#[test]
#[should_panic(expected = "already managed")]
fn test_group_member_name_collision_panics() {
    initialize_tracing();
    let mut runtime = ActorRuntime::launch();

    let mut group = runtime.new_group("workers");
    group.add(runtime.new_actor::<()>("member_a"));
    runtime.manage_group(group, SpawnConfig::default());

    let impostor = runtime.new_actor::<()>("member_a");
    runtime.manage(impostor, SpawnConfig::default());
}

/// Registration is only allowed before the workers exist.
#[test]
#[should_panic(expected = "before init")]
fn test_manage_after_init_panics() {
    initialize_tracing();
    let mut runtime = ActorRuntime::launch();
    let actor = runtime.new_actor::<()>("early");
    runtime.manage(actor, SpawnConfig::default());
    runtime.init();
    let late = runtime.new_actor::<()>("late");
    runtime.manage(late, SpawnConfig::default());
}

/// Affinity core ids are validated against the machine at registration.
#[test]
#[should_panic(expected = "out of range")]
fn test_affinity_out_of_range_panics() {
    initialize_tracing();
    let mut runtime = ActorRuntime::launch();
    let actor = runtime.new_actor::<()>("pinned");
    runtime.manage(actor, SpawnConfig::pinned([100_000]));
}

/// An empty affinity set means no pinning is attempted; the actor runs
/// normally.
#[test]
fn test_empty_affinity_runs_unpinned() {
    initialize_tracing();
    let (done, done_rx) = mpsc::channel();

    let mut runtime = ActorRuntime::launch();
    let mut actor = runtime.new_actor_with::<WitnessState>(
        "unpinned",
        WitnessState {
            events: Arc::new(Mutex::new(Vec::new())),
            done: Some(done),
        },
    );
    actor.mutate_on::<Tag>(|actor, _context| {
        if let Some(done) = &actor.model.done {
            let _ = done.send(());
        }
    });
    let handle = runtime.manage(actor, SpawnConfig::default());

    runtime.init();
    handle.post(Tag { value: 0 }, None);
    done_rx.recv_timeout(RECV_TIMEOUT).expect("actor did not run");
    runtime.shutdown();
}

struct WitnessState {
    events: Arc<Mutex<Vec<String>>>,
    done: Option<mpsc::Sender<()>>,
}

struct MemberState {
    name: &'static str,
    events: Arc<Mutex<Vec<String>>>,
    handler_thread: Arc<Mutex<Option<ThreadId>>>,
    done: Option<mpsc::Sender<()>>,
}

fn group_member(
    runtime: &mut ActorRuntime,
    name: &'static str,
    events: &Arc<Mutex<Vec<String>>>,
    done: Option<mpsc::Sender<()>>,
) -> (ManagedActor<Idle, MemberState>, Arc<Mutex<Option<ThreadId>>>) {
    let handler_thread = Arc::new(Mutex::new(None));
    let mut actor = runtime.new_actor_with::<MemberState>(
        name,
        MemberState {
            name,
            events: Arc::clone(events),
            handler_thread: Arc::clone(&handler_thread),
            done,
        },
    );
    actor.before_start(|actor| {
        actor
            .model
            .events
            .lock()
            .unwrap()
            .push(format!("{}:before_start", actor.model.name));
    });
    actor.mutate_on::<Start>(|actor, _context| {
        actor
            .model
            .events
            .lock()
            .unwrap()
            .push(format!("{}:start", actor.model.name));
    });
    actor.mutate_on::<Tag>(|actor, _context| {
        *actor.model.handler_thread.lock().unwrap() = Some(std::thread::current().id());
        actor
            .model
            .events
            .lock()
            .unwrap()
            .push(format!("{}:tag", actor.model.name));
        if let Some(done) = &actor.model.done {
            let _ = done.send(());
        }
    });
    actor.mutate_on::<Shutdown>(|actor, _context| {
        actor
            .model
            .events
            .lock()
            .unwrap()
            .push(format!("{}:shutdown", actor.model.name));
    });
    actor.after_stop(|actor| {
        actor
            .model
            .events
            .lock()
            .unwrap()
            .push(format!("{}:after_stop", actor.model.name));
    });
    (actor, handler_thread)
}

/// Group members process messages serially on the group's single worker
/// thread, and the shutdown broadcast calls each member's Shutdown
/// handler before its after_stop hook.
#[test]
fn test_group_shares_one_thread_and_orders_shutdown() {
    initialize_tracing();
    let events = Arc::new(Mutex::new(Vec::new()));
    let (done_a, done_a_rx) = mpsc::channel();
    let (done_b, done_b_rx) = mpsc::channel();

    let mut runtime = ActorRuntime::launch();
    let (member_a, thread_a) = group_member(&mut runtime, "alpha", &events, Some(done_a));
    let (member_b, thread_b) = group_member(&mut runtime, "beta", &events, Some(done_b));

    let mut group = runtime.new_group("pair");
    let handle_a = group.add(member_a);
    let handle_b = group.add(member_b);
    runtime.manage_group(group, SpawnConfig::default());

    runtime.init();
    handle_a.post(Tag { value: 1 }, None);
    handle_b.post(Tag { value: 2 }, None);
    done_a_rx.recv_timeout(RECV_TIMEOUT).expect("alpha timed out");
    done_b_rx.recv_timeout(RECV_TIMEOUT).expect("beta timed out");

    // Both member handlers ran on the same (group) thread.
    let thread_a = (*thread_a.lock().unwrap()).expect("alpha never ran");
    let thread_b = (*thread_b.lock().unwrap()).expect("beta never ran");
    assert_eq!(thread_a, thread_b);

    runtime.shutdown();

    let events = events.lock().unwrap();
    // Start broadcast reached both members, in insertion order, with the
    // before_start hook ahead of the Start handler.
    let alpha_start = events.iter().position(|e| e == "alpha:start").unwrap();
    let alpha_before = events.iter().position(|e| e == "alpha:before_start").unwrap();
    assert!(alpha_before < alpha_start);
    assert!(events.contains(&"beta:start".to_string()));

    // Shutdown handler precedes after_stop for each member.
    let alpha_shutdown = events.iter().position(|e| e == "alpha:shutdown").unwrap();
    let alpha_stop = events.iter().position(|e| e == "alpha:after_stop").unwrap();
    assert!(alpha_shutdown < alpha_stop);
    let beta_shutdown = events.iter().position(|e| e == "beta:shutdown").unwrap();
    let beta_stop = events.iter().position(|e| e == "beta:after_stop").unwrap();
    assert!(beta_shutdown < beta_stop);
}

#[derive(Default)]
struct CountingState {
    seen: Arc<AtomicUsize>,
}

/// The runtime's monitoring surface reports per-actor queue lengths and
/// message counts.
#[test]
fn test_runtime_monitoring_maps() {
    initialize_tracing();
    let seen = Arc::new(AtomicUsize::new(0));
    let mut runtime = ActorRuntime::launch();
    let mut actor = runtime.new_actor_with::<CountingState>(
        "counter",
        CountingState {
            seen: Arc::clone(&seen),
        },
    );
    actor.mutate_on::<Tag>(|actor, _context| {
        actor.model.seen.fetch_add(1, Ordering::SeqCst);
    });
    let handle = runtime.manage(actor, SpawnConfig::default());

    // Before init the worker is absent, so posted messages pile up.
    handle.post(Tag { value: 1 }, None);
    handle.post(Tag { value: 2 }, None);
    let lengths = runtime.queue_lengths();
    assert_eq!(lengths.get("counter"), Some(&2));

    runtime.init();
    runtime.shutdown();

    let counts = runtime.message_counts();
    let (_tid, processed) = counts.get("counter").expect("counter missing");
    // Start (via call) + two Tags + the Shutdown from fast termination.
    assert!(*processed >= 3);
    assert_eq!(seen.load(Ordering::SeqCst), 2);
}

/// Names of group members appear in the runtime's expanded name list.
#[test]
fn test_managed_names_include_group_members() {
    initialize_tracing();
    let mut runtime = ActorRuntime::launch();
    let mut group = runtime.new_group("bundle");
    group.add(runtime.new_actor::<()>("inner_a"));
    group.add(runtime.new_actor::<()>("inner_b"));
    runtime.manage_group(group, SpawnConfig::default());
    let solo = runtime.new_actor::<()>("solo");
    runtime.manage(solo, SpawnConfig::default());

    let names = runtime.managed_names();
    for expected in ["bundle", "inner_a", "inner_b", "solo"] {
        assert!(names.iter().any(|n| n == expected), "missing {expected}");
    }

    runtime.init();
    runtime.shutdown();
}
