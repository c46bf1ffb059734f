//! # Tasks — Frame-Driven, Dependency-Ordered Work
//!
//! Every visible change the runtime makes (a part dropping into a slot, a
//! panel lifting off, a drive cage disappearing) is a **task**. Tasks are
//! scheduled immediately by the API call that needs them and completed later,
//! one frame at a time, by [`TaskExecutor::update`].
//!
//! ## Task kinds
//!
//! | Kind        | Body                                   | Finished when                   |
//! |-------------|----------------------------------------|---------------------------------|
//! | Instant     | one action, run once                   | right after the action runs     |
//! | Transition  | eased move + start / end actions       | elapsed > duration + settle     |
//!
//! ## Dependencies
//!
//! A task may name other tasks it must **run after**. It stays pending until
//! every one of them reports finished. Nothing is notified when a dependency
//! finishes; readiness is re-checked lazily on each update.
//!
//! ```text
//!   detach fan ──► detach board ──► hide panel ──► finalize
//!   (transition)   (transition)     (transition)   (instant)
//! ```
//!
//! ## Handles
//!
//! Tasks are addressed by generational [`TaskId`]s. A handle whose slot has
//! been recycled, or that was never registered, reports finished. That is
//! what lets an instant task that ran on the spot hand back a handle callers
//! can still put in a dependency list.
//!
//! ## Module Overview
//!
//! - [`executor`] — [`TaskExecutor`], the registry and per-frame protocol
//! - [`transition`] — [`Transition`], the timed interpolation body

pub mod executor;
pub mod transition;

use std::fmt;

pub use executor::{TaskExecutor, TaskHost};
pub use transition::{Transition, DEFAULT_SETTLE_DELAY};

/// A handle to a task registered with a [`TaskExecutor`].
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TaskId {
    pub(crate) index: u32,
    pub(crate) generation: u32,
}

impl fmt::Debug for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Task({}v{})", self.index, self.generation)
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}v{}", self.index, self.generation)
    }
}
