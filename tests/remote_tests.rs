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

//! Federation tests: two runtimes in one process, bridged over loopback
//! TCP, standing in for the two processes of a deployed system.

#![allow(dead_code)]

use std::io::Write;
use std::net::{TcpListener, TcpStream};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{mpsc, Arc};
use std::time::Duration;

use axon::prelude::*;

use crate::setup::{initialize_tracing, Ping, Pong};

mod setup;

const RECV_TIMEOUT: Duration = Duration::from_secs(10);

fn register_wire_types() {
    // Registration is overwrite-idempotent, so every test may call this.
    register_wire_message::<Ping>("Ping");
    register_wire_message::<Pong>("Pong");
}

/// Reserves an ephemeral port for a test endpoint.
fn pick_port() -> u16 {
    let probe = TcpListener::bind("127.0.0.1:0").expect("no ephemeral port");
    probe.local_addr().expect("no local addr").port()
}

/// One side of the bridge: a runtime with its sender and receiver
/// actors managed, ready for application actors.
struct Side {
    runtime: ActorRuntime,
    sender: RemoteSenderHandle,
    registry: ReceiverRegistry,
    endpoint: String,
}

fn bridge_side(port: u16) -> Side {
    let endpoint = format!("tcp://127.0.0.1:{port}");
    let mut runtime = ActorRuntime::launch();
    let (sender_actor, sender) = RemoteSender::create(endpoint.clone());
    let receiver =
        RemoteReceiver::bind(&format!("tcp://0.0.0.0:{port}"), sender.clone()).expect("bind failed");
    let registry = receiver.registry();
    runtime.manage(sender_actor, SpawnConfig::default());
    runtime.manage(receiver.into_actor(), SpawnConfig::default());
    Side {
        runtime,
        sender,
        registry,
        endpoint,
    }
}

#[derive(Default)]
struct RemotePongState {
    pings_seen: Arc<AtomicUsize>,
}

struct RemotePingState {
    pong: ActorRef,
    runtime: ActorHandle,
    pongs_seen: Arc<AtomicUsize>,
    max_count: i64,
}

/// Remote ping-pong: five envelopes each way, then the ping side
/// terminates; both runtimes shut down cleanly.
#[test]
fn test_remote_ping_pong() -> anyhow::Result<()> {
    initialize_tracing();
    register_wire_types();
    let pings_seen = Arc::new(AtomicUsize::new(0));
    let pongs_seen = Arc::new(AtomicUsize::new(0));

    // "Process 1" hosts pong; "process 2" hosts ping.
    let mut pong_side = bridge_side(pick_port());
    let mut ping_side = bridge_side(pick_port());

    let mut pong = pong_side.runtime.new_actor_with::<RemotePongState>(
        "pong",
        RemotePongState {
            pings_seen: Arc::clone(&pings_seen),
        },
    );
    pong.mutate_on::<Ping>(|actor, context| {
        actor.model.pings_seen.fetch_add(1, Ordering::SeqCst);
        // The sender is a remote reference; reply travels back over the
        // wire transparently.
        assert!(context.sender().is_some_and(ActorRef::is_remote));
        actor.reply(Pong {
            count: context.message().count,
        });
    });
    let pong_handle = pong_side.runtime.manage(pong, SpawnConfig::default());
    pong_side.registry.register("pong", &pong_handle);

    let pong_ref = ping_side.sender.remote_ref("pong", &pong_side.endpoint);
    let mut ping = ping_side.runtime.new_actor_with::<RemotePingState>(
        "ping",
        RemotePingState {
            pong: pong_ref,
            runtime: ping_side.runtime.handle().clone(),
            pongs_seen: Arc::clone(&pongs_seen),
            max_count: 5,
        },
    );
    ping.mutate_on::<Start>(|actor, _context| {
        let me = ActorRef::local(actor.handle());
        actor.model.pong.post(Ping { count: 1 }, Some(me));
    });
    ping.mutate_on::<Pong>(|actor, context| {
        actor.model.pongs_seen.fetch_add(1, Ordering::SeqCst);
        let count = context.message().count;
        if count >= actor.model.max_count {
            actor.model.runtime.terminate();
        } else {
            let me = ActorRef::local(actor.handle());
            actor.model.pong.post(Ping { count: count + 1 }, Some(me));
        }
    });
    let ping_handle = ping_side.runtime.manage(ping, SpawnConfig::default());
    ping_side.registry.register("ping", &ping_handle);

    pong_side.runtime.init();
    ping_side.runtime.init();

    // The ping side terminates itself after the fifth pong.
    ping_side.runtime.end();
    pong_side.runtime.shutdown();

    assert_eq!(pings_seen.load(Ordering::SeqCst), 5);
    assert_eq!(pongs_seen.load(Ordering::SeqCst), 5);
    Ok(())
}

struct RejectObserver {
    observed: mpsc::Sender<Reject>,
}

fn reject_observer(
    side: &mut Side,
    name: &'static str,
) -> (ActorHandle, mpsc::Receiver<Reject>) {
    let (observed, observed_rx) = mpsc::channel();
    let mut actor = side
        .runtime
        .new_actor_with::<RejectObserver>(name, RejectObserver { observed });
    actor.mutate_on::<Reject>(|actor, context| {
        let _ = actor.model.observed.send(context.message().clone());
    });
    let handle = side.runtime.manage(actor, SpawnConfig::default());
    side.registry.register(name, &handle);
    (handle, observed_rx)
}

/// Sending to an actor name the remote process does not know yields a
/// Reject with the pinned reason string.
#[test]
fn test_unknown_receiver_is_rejected() -> anyhow::Result<()> {
    initialize_tracing();
    register_wire_types();

    let mut pong_side = bridge_side(pick_port());
    let mut ping_side = bridge_side(pick_port());
    let (ping_handle, reject_rx) = reject_observer(&mut ping_side, "ping");

    pong_side.runtime.init();
    ping_side.runtime.init();

    let absent = ping_side.sender.remote_ref("absent", &pong_side.endpoint);
    absent.post(Ping { count: 1 }, Some(ActorRef::local(&ping_handle)));

    let reject = reject_rx.recv_timeout(RECV_TIMEOUT)?;
    assert_eq!(reject.message_type, "Ping");
    assert_eq!(reject.reason, "Actor 'absent' not found");
    assert_eq!(reject.rejected_by, "absent");

    ping_side.runtime.shutdown();
    pong_side.runtime.shutdown();
    Ok(())
}

/// Writes one raw envelope frame to an endpoint, standing in for a
/// foreign process whose types we do not share.
fn write_raw(endpoint: &str, payload: &[u8]) {
    let address = endpoint.strip_prefix("tcp://").unwrap_or(endpoint);
    let mut stream = TcpStream::connect(address).expect("connect failed");
    let length = payload.len() as u32;
    stream.write_all(&length.to_be_bytes()).expect("write failed");
    stream.write_all(payload).expect("write failed");
    stream.flush().expect("flush failed");
    // Give the receiver a moment to drain before the socket drops.
    std::thread::sleep(Duration::from_millis(100));
}

/// An envelope naming an unregistered wire type yields a Reject with the
/// pinned reason string.
#[test]
fn test_unknown_message_type_is_rejected() -> anyhow::Result<()> {
    initialize_tracing();
    register_wire_types();

    let mut pong_side = bridge_side(pick_port());
    let mut ping_side = bridge_side(pick_port());
    let (_ping_handle, reject_rx) = reject_observer(&mut ping_side, "ping");

    // Expose a pong actor so only the message type is unknown.
    let pong = pong_side.runtime.new_actor::<()>("pong");
    let pong_handle = pong_side.runtime.manage(pong, SpawnConfig::default());
    pong_side.registry.register("pong", &pong_handle);

    pong_side.runtime.init();
    ping_side.runtime.init();

    let envelope = serde_json::json!({
        "sender_actor": "ping",
        "sender_endpoint": ping_side.endpoint,
        "receiver": "pong",
        "message_type": "Nope",
        "message": {},
    });
    write_raw(&pong_side.endpoint, envelope.to_string().as_bytes());

    let reject = reject_rx.recv_timeout(RECV_TIMEOUT)?;
    assert_eq!(reject.message_type, "Nope");
    assert_eq!(reject.reason, "Unknown message type: Nope");
    assert_eq!(reject.rejected_by, "pong");

    ping_side.runtime.shutdown();
    pong_side.runtime.shutdown();
    Ok(())
}

#[derive(Default)]
struct CountingPong {
    pings_seen: Arc<AtomicUsize>,
    done: Option<mpsc::Sender<()>>,
}

/// An undecodable frame is dropped (no return address is knowable), and
/// the receiver keeps serving subsequent traffic. Unknown envelope keys
/// are ignored.
#[test]
fn test_parse_failure_drops_and_receiver_survives() -> anyhow::Result<()> {
    initialize_tracing();
    register_wire_types();
    let pings_seen = Arc::new(AtomicUsize::new(0));
    let (done, done_rx) = mpsc::channel();

    let mut pong_side = bridge_side(pick_port());

    let mut pong = pong_side.runtime.new_actor_with::<CountingPong>(
        "pong",
        CountingPong {
            pings_seen: Arc::clone(&pings_seen),
            done: Some(done),
        },
    );
    pong.mutate_on::<Ping>(|actor, context| {
        actor.model.pings_seen.fetch_add(1, Ordering::SeqCst);
        assert_eq!(context.message().count, 42);
        // No sender fields in the envelope: no reply path was installed.
        assert!(context.sender().is_none());
        if let Some(done) = &actor.model.done {
            let _ = done.send(());
        }
    });
    let pong_handle = pong_side.runtime.manage(pong, SpawnConfig::default());
    pong_side.registry.register("pong", &pong_handle);

    pong_side.runtime.init();

    write_raw(&pong_side.endpoint, b"this is not json");
    let envelope = serde_json::json!({
        "sender_actor": null,
        "sender_endpoint": null,
        "receiver": "pong",
        "message_type": "Ping",
        "message": { "count": 42 },
        "x_trace_id": "ignored-by-receivers",
    });
    write_raw(&pong_side.endpoint, envelope.to_string().as_bytes());

    done_rx.recv_timeout(RECV_TIMEOUT)?;
    pong_side.runtime.shutdown();

    assert_eq!(pings_seen.load(Ordering::SeqCst), 1);
    Ok(())
}

/// Binding a wildcard endpoint with port zero resolves to a concrete
/// port, observable through the receiver's local endpoint.
#[test]
fn test_wildcard_bind_resolves_port() -> anyhow::Result<()> {
    initialize_tracing();
    let (_sender_actor, sender) = RemoteSender::create("tcp://localhost:0");
    let receiver = RemoteReceiver::bind("tcp://*:0", sender)?;

    let endpoint = receiver.local_endpoint();
    assert!(endpoint.starts_with("tcp://0.0.0.0:"));
    assert!(!endpoint.ends_with(":0"));
    Ok(())
}

/// Sending a kind that was never wire-registered fails locally; no
/// envelope is emitted.
#[test]
fn test_unregistered_kind_fails_at_send() {
    initialize_tracing();
    register_wire_types();

    let mut side = bridge_side(pick_port());
    side.runtime.init();

    #[derive(Debug, Default)]
    struct Unregistered;
    actor_message!(Unregistered, 499);

    let result = side
        .sender
        .send_to(&side.endpoint, "anyone", Unregistered, None);
    assert!(matches!(result, Err(RemoteError::UnregisteredKind(499))));

    side.runtime.shutdown();
}
