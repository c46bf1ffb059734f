//! # Scene Graph — The Capability Surface the Runtime Consumes
//!
//! The runtime never renders anything itself. It needs a small set of scene
//! operations: make and clone nodes, move them between parents, toggle their
//! visibility, read and write local transforms, query world scale, dispose
//! subtrees, and compute a bounding box for camera framing. [`SceneGraph`] is
//! exactly that set, so any renderer that can express it can host the runtime.
//!
//! ## Module Overview
//!
//! - [`node`] — Generational [`NodeId`] handles
//! - [`memory`] — [`Scene`], an in-memory implementation used by tests, demos,
//!   and headless tooling
//!
//! ## Visibility
//!
//! `is_enabled(node, true)` answers "is this node actually visible", which
//! means the node and every ancestor are enabled. `is_enabled(node, false)`
//! only reads the node's own flag.

pub(crate) mod memory;
pub mod node;

use std::collections::HashSet;

pub use memory::Scene;
pub use node::NodeId;

use crate::math::{Aabb, Quat, Vec3};

/// Everything the runtime needs from a scene provider.
pub trait SceneGraph {
    /// Create an empty, enabled node at the origin with no parent.
    fn create_node(&mut self, name: &str) -> NodeId;

    /// Shallow-clone `node` (name, local transform, enabled flag, bounds) and
    /// parent the copy under `parent`. Children are not cloned.
    fn clone_node(&mut self, node: NodeId, parent: Option<NodeId>) -> Option<NodeId>;

    fn is_alive(&self, node: NodeId) -> bool;

    fn name(&self, node: NodeId) -> Option<&str>;

    fn parent(&self, node: NodeId) -> Option<NodeId>;

    /// Direct children, in insertion order.
    fn children(&self, node: NodeId) -> Vec<NodeId>;

    /// Reparent `node`, keeping its local transform.
    fn set_parent(&mut self, node: NodeId, parent: Option<NodeId>);

    fn set_enabled(&mut self, node: NodeId, enabled: bool);

    /// With `recursive`, every ancestor must be enabled too.
    fn is_enabled(&self, node: NodeId, recursive: bool) -> bool;

    fn position(&self, node: NodeId) -> Vec3;

    fn set_position(&mut self, node: NodeId, position: Vec3);

    fn rotation(&self, node: NodeId) -> Quat;

    fn set_rotation(&mut self, node: NodeId, rotation: Quat);

    fn scale(&self, node: NodeId) -> Vec3;

    fn set_scale(&mut self, node: NodeId, scale: Vec3);

    /// Accumulated scale of the node in world space.
    fn world_scale(&self, node: NodeId) -> Vec3;

    /// Attach a local-space bounding box (the node's geometry).
    fn set_local_bounds(&mut self, node: NodeId, bounds: Aabb);

    /// Dispose the node and its subtree. `release_shared` also frees
    /// resources that clones may share (meshes, materials).
    fn dispose(&mut self, node: NodeId, release_shared: bool);

    /// World-space box around the geometry of `nodes`. `None` when none of
    /// them carries bounds.
    fn world_bounds(&self, nodes: &[NodeId]) -> Option<Aabb>;

    /// Depth-first walk of the subtree below `node`, `node` included.
    fn descendants(&self, node: NodeId) -> Vec<NodeId> {
        let mut visited = HashSet::new();
        let mut out = Vec::new();
        let mut stack = vec![node];
        while let Some(current) = stack.pop() {
            if !visited.insert(current) {
                continue;
            }
            out.push(current);
            let children = self.children(current);
            stack.extend(children.into_iter().rev());
        }
        out
    }
}
