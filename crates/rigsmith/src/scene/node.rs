//! # Node Handles — Generational Indices for Scene Nodes
//!
//! A [`NodeId`] is just a number pair. The scene graph maps it to whatever it
//! stores for that node (transform, parent, children, visibility). Every side
//! table in the runtime (toggle counters, node tags, task affinity) keys on the
//! same handle, so they never hold a node alive.
//!
//! ## Why generations
//!
//! Node slots are recycled once a part is disposed. Without a generation
//! counter, a toggle counter or a pending task that still remembers the old
//! handle would silently start pointing at an unrelated node:
//!
//! ```text
//! NodeId { index: 7, generation: 0 }  ← fan blade of a disposed fan
//! NodeId { index: 7, generation: 1 }  ← drive cage loaded afterwards
//! ```
//!
//! The stale handle still says `generation: 0`, so lookups fail safely.

use std::fmt;

/// A lightweight handle to a node in a [`SceneGraph`](super::SceneGraph).
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId {
    pub(crate) index: u32,
    pub(crate) generation: u32,
}

impl NodeId {
    /// Build a handle from raw parts. Scene providers outside this crate use
    /// this to hand out their own handles.
    pub fn from_raw(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }

    /// Returns the raw index.
    pub fn index(self) -> u32 {
        self.index
    }

    /// Returns the generation.
    pub fn generation(self) -> u32 {
        self.generation
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Node({}v{})", self.index, self.generation)
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}v{}", self.index, self.generation)
    }
}

/// Manages slot allocation and recycling.
///
/// ```text
/// generations: [0, 1, 0, 2, 0]   ← one generation per slot ever allocated
/// free_list:   [1, 3]             ← slots available for reuse
/// ```
///
/// Shared by the scene (node handles) and the task executor (task handles),
/// which is why it hands out raw `(index, generation)` pairs.
#[derive(Debug, Default)]
pub(crate) struct SlotAllocator {
    generations: Vec<u32>,
    free_list: Vec<u32>,
}

impl SlotAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a slot. Reuses a freed slot if one is available.
    pub fn allocate(&mut self) -> (u32, u32) {
        if let Some(index) = self.free_list.pop() {
            // Generation was already bumped on release.
            (index, self.generations[index as usize])
        } else {
            let index = self.generations.len() as u32;
            self.generations.push(0);
            (index, 0)
        }
    }

    /// Release a slot. Returns `false` if the handle was already stale.
    pub fn release(&mut self, index: u32, generation: u32) -> bool {
        if self.is_alive(index, generation) {
            self.generations[index as usize] += 1;
            self.free_list.push(index);
            true
        } else {
            false
        }
    }

    pub fn is_alive(&self, index: u32, generation: u32) -> bool {
        self.generations
            .get(index as usize)
            .is_some_and(|&g| g == generation)
    }

    /// Number of currently allocated slots.
    pub fn alive_count(&self) -> usize {
        self.generations.len() - self.free_list.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn allocate_sequential() {
        let mut alloc = SlotAllocator::new();
        assert_eq!(alloc.allocate(), (0, 0));
        assert_eq!(alloc.allocate(), (1, 0));
    }

    #[test]
    fn recycle_bumps_generation() {
        let mut alloc = SlotAllocator::new();
        let (index, generation) = alloc.allocate();
        assert!(alloc.release(index, generation));
        assert_eq!(alloc.allocate(), (0, 1));
        assert!(!alloc.is_alive(index, generation));
    }

    #[test]
    fn double_release_returns_false() {
        let mut alloc = SlotAllocator::new();
        let (index, generation) = alloc.allocate();
        assert!(alloc.release(index, generation));
        assert!(!alloc.release(index, generation));
        assert_eq!(alloc.alive_count(), 0);
    }
}
