//! # Task Executor
//!
//! The executor owns every live task and splits them into two queues:
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │ TaskExecutor<T, A>                                       │
//! │                                                          │
//! │  slots:   Vec<Option<Entry>>   ← live registry           │
//! │  pending: Vec<TaskId>          ← waiting on run-after    │
//! │  running: Vec<TaskId>          ← ready transitions       │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! `T` is the affinity target (what a task operates on) and `A` the action
//! type. The executor never interprets either one; it hands actions and
//! placements to a [`TaskHost`], which owns the actual state.
//!
//! ## Per-frame protocol
//!
//! 1. Advance every running transition by `dt`; drop the ones that finish.
//! 2. Promote ready pending tasks: instant ones run on the spot, transitions
//!    move to running and get their first `dt`.
//! 3. While step 2 (or this step) ran an instant task, sweep pending again
//!    for newly ready instant tasks. Transitions promoted here wait for the
//!    next frame.
//!
//! A chain of instant tasks therefore resolves within a single frame.
//!
//! ## Re-entrancy
//!
//! Actions run with `&mut TaskExecutor`, so they can schedule or force-finish
//! further work. Every queue is walked over a snapshot of ids, and each id is
//! looked up again before use, so tasks added or finished mid-walk are safe.

use std::collections::HashSet;

use super::transition::{Step, Transition};
use super::TaskId;
use crate::math::Vec3;
use crate::scene::node::SlotAllocator;

/// Receives the work tasks produce.
pub trait TaskHost<T, A> {
    /// Run an action. May schedule further tasks.
    fn perform(&mut self, tasks: &mut TaskExecutor<T, A>, action: A);

    /// Move a transition's target to `position`.
    fn place(&mut self, target: &T, position: Vec3);
}

#[derive(Debug)]
enum Body<A> {
    /// Removed from the registry before its action runs.
    Instant(A),
    Transition(Transition<A>),
}

impl<A> Body<A> {
    fn is_finished(&self) -> bool {
        match self {
            Self::Instant(_) => false,
            Self::Transition(transition) => transition.is_finished(),
        }
    }
}

#[derive(Debug)]
struct Entry<T, A> {
    id: TaskId,
    target: T,
    run_after: Vec<TaskId>,
    body: Body<A>,
}

/// Registry and scheduler for tasks targeting `T` and carrying actions `A`.
#[derive(Debug)]
pub struct TaskExecutor<T, A> {
    allocator: SlotAllocator,
    slots: Vec<Option<Entry<T, A>>>,
    pending: Vec<TaskId>,
    running: Vec<TaskId>,
}

impl<T, A> Default for TaskExecutor<T, A> {
    fn default() -> Self {
        Self {
            allocator: SlotAllocator::new(),
            slots: Vec::new(),
            pending: Vec::new(),
            running: Vec::new(),
        }
    }
}

impl<T: Clone + PartialEq, A> TaskExecutor<T, A> {
    pub fn new() -> Self {
        Self::default()
    }

    // ── Scheduling ───────────────────────────────────────────────────────

    /// Schedule an instant task.
    ///
    /// If every dependency has already finished the action runs right now and
    /// the returned handle is already finished.
    pub fn schedule_instant<H>(&mut self, target: T, run_after: &[TaskId], action: A, host: &mut H) -> TaskId
    where
        H: TaskHost<T, A> + ?Sized,
    {
        let run_after = self.unfinished(run_after);
        if run_after.is_empty() {
            let (index, generation) = self.allocator.allocate();
            self.allocator.release(index, generation);
            host.perform(self, action);
            return TaskId { index, generation };
        }
        let id = self.insert(target, run_after, Body::Instant(action));
        self.pending.push(id);
        id
    }

    /// Schedule a transition. It starts moving on the next update at the
    /// earliest.
    pub fn schedule_transition(&mut self, target: T, run_after: &[TaskId], transition: Transition<A>) -> TaskId {
        let run_after = self.unfinished(run_after);
        let ready = run_after.is_empty();
        let id = self.insert(target, run_after, Body::Transition(transition));
        if ready {
            self.running.push(id);
        } else {
            self.pending.push(id);
        }
        id
    }

    // ── Frame update ─────────────────────────────────────────────────────

    /// Run one frame of the protocol described in the module docs.
    pub fn update<H>(&mut self, dt: f32, host: &mut H)
    where
        H: TaskHost<T, A> + ?Sized,
    {
        // Step 1: advance running transitions.
        let running = std::mem::take(&mut self.running);
        let mut still_running = Vec::with_capacity(running.len());
        for id in running {
            if self.advance(id, dt, host) {
                self.remove(id);
            } else {
                still_running.push(id);
            }
        }
        still_running.append(&mut self.running);
        self.running = still_running;

        // Step 2: promote ready pending tasks with a first tick.
        let mut fired = self.promote(Some(dt), host);

        // Step 3: drain instant chains.
        while fired {
            fired = self.promote(None, host);
        }
    }

    /// One pass over pending. `tick` is the delta promoted transitions
    /// receive, `None` to promote them without ticking. Returns whether an
    /// instant task ran.
    fn promote<H>(&mut self, tick: Option<f32>, host: &mut H) -> bool
    where
        H: TaskHost<T, A> + ?Sized,
    {
        let mut fired = false;
        let pending = std::mem::take(&mut self.pending);
        let mut still_pending = Vec::with_capacity(pending.len());
        for id in pending {
            if !self.is_live(id) {
                continue;
            }
            if !self.is_ready(id) {
                still_pending.push(id);
                continue;
            }
            if self.is_instant(id) {
                self.run_instant(id, host);
                fired = true;
                continue;
            }
            match tick {
                Some(dt) => {
                    if self.advance(id, dt, host) {
                        self.remove(id);
                    } else {
                        self.running.push(id);
                    }
                }
                None => self.running.push(id),
            }
        }
        still_pending.append(&mut self.pending);
        self.pending = still_pending;
        fired
    }

    /// Take and perform an instant task's action. The task is removed before
    /// the action runs, so the action already sees it finished.
    fn run_instant<H>(&mut self, id: TaskId, host: &mut H)
    where
        H: TaskHost<T, A> + ?Sized,
    {
        let Some(entry) = self.remove(id) else { return };
        if let Body::Instant(action) = entry.body {
            host.perform(self, action);
        }
    }

    /// Advance a transition by `dt`. Returns `true` once it is finished.
    fn advance<H>(&mut self, id: TaskId, dt: f32, host: &mut H) -> bool
    where
        H: TaskHost<T, A> + ?Sized,
    {
        let Some(entry) = self.entry_mut(id) else {
            return true;
        };
        let transition = match &mut entry.body {
            Body::Transition(transition) => transition,
            body => return body.is_finished(),
        };
        if transition.is_finished() {
            return true;
        }
        let Step { start, position, end } = transition.step(dt);
        let finished = transition.is_finished();
        let target = entry.target.clone();

        if let Some(action) = start {
            host.perform(self, action);
        }
        host.place(&target, position);
        if let Some(action) = end {
            host.perform(self, action);
        }
        finished
    }

    // ── Force-finish ─────────────────────────────────────────────────────

    /// Collapse `ids` and everything they depend on to their end state.
    ///
    /// Dependencies are walked depth-first and their run-after lists cleared,
    /// then every task is finished deepest dependency first. Bodies never run
    /// twice: finished transitions and spent instant tasks are skipped.
    /// Finished tasks leave the queues on the next update.
    pub fn force_finish<H>(&mut self, ids: &[TaskId], host: &mut H)
    where
        H: TaskHost<T, A> + ?Sized,
    {
        let mut visited = HashSet::new();
        let mut order = Vec::new();
        let mut stack: Vec<(TaskId, bool)> = ids.iter().rev().map(|&id| (id, false)).collect();

        while let Some((id, expanded)) = stack.pop() {
            if expanded {
                order.push(id);
                continue;
            }
            if !visited.insert(id) {
                continue;
            }
            let Some(entry) = self.entry_mut(id) else { continue };
            let run_after = std::mem::take(&mut entry.run_after);
            stack.push((id, true));
            stack.extend(run_after.into_iter().rev().map(|dep| (dep, false)));
        }

        for id in order {
            self.finish_now(id, host);
        }
    }

    fn finish_now<H>(&mut self, id: TaskId, host: &mut H)
    where
        H: TaskHost<T, A> + ?Sized,
    {
        if self.is_instant(id) {
            self.run_instant(id, host);
            return;
        }
        let Some(Entry {
            body: Body::Transition(transition),
            ..
        }) = self.entry_mut(id)
        else {
            return;
        };
        if transition.is_finished() {
            return;
        }
        transition.rewind();
        let overshoot = transition.overshoot();
        self.advance(id, overshoot, host);
    }

    // ── Queries ──────────────────────────────────────────────────────────

    /// A handle counts as finished once its task completed or left the
    /// registry. Unknown handles are finished too.
    pub fn is_finished(&self, id: TaskId) -> bool {
        self.entry(id).is_none_or(|entry| entry.body.is_finished())
    }

    /// Whether every run-after dependency has finished. Finished entries are
    /// pruned from the list as a side effect.
    pub fn is_ready(&mut self, id: TaskId) -> bool {
        let Some(entry) = self.entry_mut(id) else {
            return true;
        };
        let run_after = std::mem::take(&mut entry.run_after);
        let remaining: Vec<TaskId> = run_after
            .into_iter()
            .filter(|&dep| !self.is_finished(dep))
            .collect();
        let ready = remaining.is_empty();
        if let Some(entry) = self.entry_mut(id) {
            entry.run_after = remaining;
        }
        ready
    }

    /// Live, unfinished tasks whose target equals `target`.
    pub fn collect_tasks_with_target(&self, target: &T) -> Vec<TaskId> {
        self.collect_tasks_with_targets(std::slice::from_ref(target))
    }

    /// Live, unfinished tasks whose target is any of `targets`.
    pub fn collect_tasks_with_targets(&self, targets: &[T]) -> Vec<TaskId> {
        self.slots
            .iter()
            .flatten()
            .filter(|entry| !entry.body.is_finished() && targets.contains(&entry.target))
            .map(|entry| entry.id)
            .collect()
    }

    /// The target of a live task.
    pub fn target(&self, id: TaskId) -> Option<&T> {
        self.entry(id).map(|entry| &entry.target)
    }

    /// Remaining dependencies of a live task.
    pub fn run_after(&self, id: TaskId) -> Option<&[TaskId]> {
        self.entry(id).map(|entry| entry.run_after.as_slice())
    }

    /// Number of tasks in the registry.
    pub fn len(&self) -> usize {
        self.allocator.alive_count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn pending_count(&self) -> usize {
        self.pending.iter().filter(|&&id| self.is_live(id)).count()
    }

    pub fn running_count(&self) -> usize {
        self.running.iter().filter(|&&id| self.is_live(id)).count()
    }

    /// Counts of the executor's queues.
    #[cfg(feature = "diagnostics")]
    pub fn snapshot(&self) -> ExecutorSnapshot {
        ExecutorSnapshot {
            live: self.len(),
            pending: self.pending_count(),
            running: self.running_count(),
        }
    }

    // ── Internal storage ─────────────────────────────────────────────────

    fn unfinished(&self, run_after: &[TaskId]) -> Vec<TaskId> {
        let mut out: Vec<TaskId> = Vec::with_capacity(run_after.len());
        for &dep in run_after {
            if !out.contains(&dep) && !self.is_finished(dep) {
                out.push(dep);
            }
        }
        out
    }

    fn insert(&mut self, target: T, run_after: Vec<TaskId>, body: Body<A>) -> TaskId {
        let (index, generation) = self.allocator.allocate();
        let id = TaskId { index, generation };
        let slot = index as usize;
        if slot >= self.slots.len() {
            self.slots.resize_with(slot + 1, || None);
        }
        self.slots[slot] = Some(Entry {
            id,
            target,
            run_after,
            body,
        });
        id
    }

    fn remove(&mut self, id: TaskId) -> Option<Entry<T, A>> {
        if !self.allocator.release(id.index, id.generation) {
            return None;
        }
        self.slots.get_mut(id.index as usize)?.take()
    }

    fn is_live(&self, id: TaskId) -> bool {
        self.allocator.is_alive(id.index, id.generation)
    }

    fn is_instant(&self, id: TaskId) -> bool {
        matches!(self.entry(id), Some(Entry { body: Body::Instant(_), .. }))
    }

    fn entry(&self, id: TaskId) -> Option<&Entry<T, A>> {
        if !self.is_live(id) {
            return None;
        }
        self.slots.get(id.index as usize)?.as_ref()
    }

    fn entry_mut(&mut self, id: TaskId) -> Option<&mut Entry<T, A>> {
        if !self.is_live(id) {
            return None;
        }
        self.slots.get_mut(id.index as usize)?.as_mut()
    }
}

/// Serializable executor counts.
#[cfg(feature = "diagnostics")]
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct ExecutorSnapshot {
    pub live: usize,
    pub pending: usize,
    pub running: usize,
}
