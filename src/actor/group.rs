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

//! Groups: several lightweight actors sharing one thread.
//!
//! A group is itself an actor whose mailbox aggregates the messages of
//! all its members. Posting to a member routes to the group's mailbox;
//! the group's worker pops each envelope and dispatches it to the member
//! cell it was addressed to, serially. Start and Shutdown sent to the
//! group are broadcast to every member via `call`, so member
//! initialization and teardown are serialized on the group's thread.

use std::sync::Arc;

use tracing::trace;

use crate::actor::managed_actor::{AnyActorCell, ManagedActor};
use crate::actor::Idle;
use crate::common::{ActorHandle, ActorRef};
use crate::message::{Shutdown, Start};

/// Ordered members of a group. This is the group actor's model; the
/// broadcast handlers iterate it.
#[derive(Default)]
pub struct GroupState {
    pub(crate) members: Vec<Arc<dyn AnyActorCell>>,
}

/// A batch of actors that run serially on a single worker thread.
///
/// ```rust,ignore
/// let mut group = runtime.new_group("pipeline");
/// let parser_handle = group.add(parser);
/// let writer_handle = group.add(writer);
/// runtime.manage_group(group, SpawnConfig::default());
/// ```
///
/// A group is always a top-level registration; its members must not be
/// separately managed.
pub struct Group {
    pub(crate) actor: ManagedActor<Idle, GroupState>,
    member_names: Vec<String>,
}

impl Group {
    pub(crate) fn new(name: &str) -> Self {
        let mut actor = ManagedActor::<Idle, GroupState>::new(name);

        actor.mutate_on::<Start>(|group, _context| {
            let sender = ActorRef::local(&group.handle);
            for member in &group.model.members {
                trace!(member = member.name(), "starting group member");
                member.invoke_before_start();
                member.call_boxed(Box::new(Start), Some(sender.clone()));
            }
        });

        // Members are called with Shutdown first, then their after_stop
        // hook runs, both on the group's thread.
        actor.mutate_on::<Shutdown>(|group, _context| {
            let sender = ActorRef::local(&group.handle);
            for member in &group.model.members {
                trace!(member = member.name(), "stopping group member");
                member.call_boxed(Box::new(Shutdown), Some(sender.clone()));
                member.invoke_after_stop();
                member.mark_terminated();
            }
        });

        Self {
            actor,
            member_names: Vec::new(),
        }
    }

    /// The group's name.
    pub fn name(&self) -> &str {
        self.actor.name()
    }

    /// The group's own handle (Start/Shutdown sent here are broadcast).
    pub fn handle(&self) -> &ActorHandle {
        self.actor.handle()
    }

    /// Adds a member. The member's handle stays valid, but every post to
    /// it now lands on the group's mailbox.
    pub fn add<State: Send + 'static>(&mut self, member: ManagedActor<Idle, State>) -> ActorHandle {
        let handle = member.handle().clone();
        let mailbox = Arc::clone(&self.actor.mailbox);
        let cell = member.into_cell_with_mailbox(mailbox);
        self.member_names.push(cell.name().to_string());
        self.actor.model.members.push(cell);
        handle
    }

    /// Names of the members added so far.
    pub fn member_names(&self) -> &[String] {
        &self.member_names
    }
}
