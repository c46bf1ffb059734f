//! # Toggle Groups — Reference-Counted Visibility
//!
//! A toggle group is a set of nodes the user shows and hides together (a side
//! panel, a drive cage). Several requesters may want the same node hidden at
//! once, so visibility is not a flag but a **counter** per node:
//!
//! ```text
//!   counters: HashMap<NodeId, ToggleCounter>
//!                              holders: [Group(Toggle#3), Constraint(node 17)]
//!                              rest:    position when first counted
//! ```
//!
//! A node is visible iff nobody holds it. The hide transition runs when the
//! first holder arrives; the reveal runs when the last one leaves. Counters
//! are keyed by node, not by group, so two groups sharing a node compose.
//!
//! ## Hiding a group
//!
//! 1. Detach every mount point below the members (stopping at attached parts
//!    and at mount locations).
//! 2. Hold every node named by the members' constraints, after the detaches.
//! 3. Hold every member under the group itself, after step 2.
//! 4. Release the constraint holds from step 2, after step 3.
//!
//! Showing runs steps 2 to 4 with releases of the group's own holds in step 3.
//! Constrained nodes are therefore hidden only while the group moves.
//!
//! The entries in `counters` are dropped when their nodes are disposed.

use std::collections::HashSet;

use super::{Action, Affinity, Assembly, ModelId, Tasks, ToggleId};
use crate::math::Vec3;
use crate::scene::{NodeId, SceneGraph};
use crate::task::TaskId;

/// Who asks for a node to stay hidden.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Requester {
    Group(ToggleId),
    /// A member node whose constraints name the held node.
    Constraint(NodeId),
}

/// Shared hide state of one node.
#[derive(Debug, Clone)]
pub(crate) struct ToggleCounter {
    holders: Vec<Requester>,
    /// Local position the node returns to when revealed.
    rest: Vec3,
}

impl ToggleCounter {
    fn new(rest: Vec3) -> Self {
        Self {
            holders: Vec::new(),
            rest,
        }
    }
}

/// A named set of nodes that show and hide together.
#[derive(Debug)]
pub struct ToggleGroup {
    name: String,
    owner: ModelId,
    members: Vec<NodeId>,
    pub(super) enabled: bool,
}

impl ToggleGroup {
    pub(super) fn new(name: String, owner: ModelId, members: Vec<NodeId>) -> Self {
        Self {
            name,
            owner,
            members,
            enabled: true,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn owner(&self) -> ModelId {
        self.owner
    }

    pub fn members(&self) -> &[NodeId] {
        &self.members
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }
}

impl<S: SceneGraph> Assembly<S> {
    pub(super) fn set_toggle_enabled(&mut self, tasks: &mut Tasks, toggle: ToggleId, enabled: bool) -> Vec<TaskId> {
        let Some(group) = self.toggles.get_mut(toggle.index()) else {
            return Vec::new();
        };
        if group.enabled == enabled {
            return Vec::new();
        }
        group.enabled = enabled;
        let members = group.members.clone();
        let requester = Requester::Group(toggle);

        let detaches = if enabled {
            Vec::new()
        } else {
            self.detach_below(tasks, &members)
        };
        let constraint_holds = self.hold_constraints(tasks, &members, &detaches);

        let mut own = Vec::new();
        for &member in &members {
            let task = if enabled {
                self.release(tasks, member, requester, &constraint_holds)
            } else {
                self.hold(tasks, member, requester, &constraint_holds)
            };
            own.extend(task);
        }
        let constraint_releases = self.release_constraints(tasks, &members, &own);

        log::debug!(
            "{} {toggle}: {} detaches, {} own tasks, {} constraint tasks",
            if enabled { "Showing" } else { "Hiding" },
            detaches.len(),
            own.len(),
            constraint_holds.len() + constraint_releases.len()
        );

        let mut produced = detaches;
        produced.extend(constraint_holds);
        produced.extend(own);
        produced.extend(constraint_releases);
        produced
    }

    /// Whether anyone currently holds `node` hidden.
    pub(super) fn is_held(&self, node: NodeId) -> bool {
        self.counters
            .get(&node)
            .is_some_and(|counter| !counter.holders.is_empty())
    }

    /// Recursively detach every mount point reachable from `members`.
    fn detach_below(&mut self, tasks: &mut Tasks, members: &[NodeId]) -> Vec<TaskId> {
        let mut detaches = Vec::new();
        let mut visited = HashSet::new();
        let mut stack = members.to_vec();
        while let Some(node) = stack.pop() {
            if !visited.insert(node) {
                continue;
            }
            if let Some(info) = self.info(node) {
                if info.root.is_some() {
                    continue;
                }
                if let Some(mount) = info.mount {
                    detaches.extend(self.detach(tasks, mount, true, false).map(|(_, task)| task));
                    continue;
                }
            }
            stack.extend(self.scene.children(node));
        }
        detaches
    }

    fn constraints_of(&self, member: NodeId) -> Vec<NodeId> {
        self.info(member)
            .map(|info| info.constraints.clone())
            .unwrap_or_default()
    }

    fn hold_constraints(&mut self, tasks: &mut Tasks, members: &[NodeId], after: &[TaskId]) -> Vec<TaskId> {
        let mut produced = Vec::new();
        for &member in members {
            for node in self.constraints_of(member) {
                produced.extend(self.hold(tasks, node, Requester::Constraint(member), after));
            }
        }
        produced
    }

    fn release_constraints(&mut self, tasks: &mut Tasks, members: &[NodeId], after: &[TaskId]) -> Vec<TaskId> {
        let mut produced = Vec::new();
        for &member in members {
            for node in self.constraints_of(member) {
                produced.extend(self.release(tasks, node, Requester::Constraint(member), after));
            }
        }
        produced
    }

    /// Add `requester` to the holders of `node`. Schedules the hide when it is
    /// the first holder.
    fn hold(&mut self, tasks: &mut Tasks, node: NodeId, requester: Requester, after: &[TaskId]) -> Option<TaskId> {
        let position = self.scene.position(node);
        let counter = self
            .counters
            .entry(node)
            .or_insert_with(|| ToggleCounter::new(position));
        if counter.holders.contains(&requester) {
            return None;
        }
        let first = counter.holders.is_empty();
        counter.holders.push(requester);
        if !first {
            return None;
        }
        let rest = counter.rest;
        Some(self.schedule_visibility(tasks, node, rest, false, after))
    }

    /// Remove `requester` from the holders of `node`. Schedules the reveal
    /// when it was the last holder.
    fn release(&mut self, tasks: &mut Tasks, node: NodeId, requester: Requester, after: &[TaskId]) -> Option<TaskId> {
        let counter = self.counters.get_mut(&node)?;
        let index = counter.holders.iter().position(|&h| h == requester)?;
        counter.holders.remove(index);
        if !counter.holders.is_empty() {
            return None;
        }
        let rest = counter.rest;
        Some(self.schedule_visibility(tasks, node, rest, true, after))
    }

    fn schedule_visibility(&mut self, tasks: &mut Tasks, node: NodeId, rest: Vec3, reveal: bool, after: &[TaskId]) -> TaskId {
        let target = Affinity::Node(node);
        let mut run_after = after.to_vec();
        run_after.extend(tasks.collect_tasks_with_target(&target));

        let lift = self.lift_under(self.scene.parent(node));
        let lifted = rest + self.scene.rotation(node) * Vec3::new(0.0, lift, 0.0);
        let transition = if reveal {
            self.settings
                .transition(lifted, rest)
                .on_start(Action::Show(node))
        } else {
            self.settings
                .transition(rest, lifted)
                .on_end(Action::Hide(node))
        };
        tasks.schedule_transition(target, &run_after, transition)
    }
}
