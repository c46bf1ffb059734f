//! # In-Memory Scene
//!
//! A plain node store implementing [`SceneGraph`]. Each node keeps its local
//! [`Transform`], an enabled flag, optional local bounds, and explicit parent /
//! children links. World transforms are composed on demand by walking up the
//! parent chain: `world = parent_world * local`.
//!
//! ```text
//! ┌───────────────────────────────────────────────┐
//! │ Scene                                         │
//! │                                               │
//! │  allocator: SlotAllocator (index, generation) │
//! │  nodes: Vec<Option<NodeData>>                 │
//! │    name, transform, enabled, bounds           │
//! │    parent: Option<NodeId>                     │
//! │    children: Vec<NodeId>                      │
//! └───────────────────────────────────────────────┘
//! ```
//!
//! ## Comparison
//!
//! - **Babylon / three.js**: nodes are objects with parent pointers and cached
//!   world matrices that are dirtied on change.
//! - **This scene**: no caching. Part trees are shallow, and the runtime only
//!   queries world scale and bounds a handful of times per operation.

use super::node::{NodeId, SlotAllocator};
use super::SceneGraph;
use crate::math::{Aabb, Mat4, Quat, Transform, Vec3};

#[derive(Debug, Clone)]
struct NodeData {
    name: String,
    transform: Transform,
    enabled: bool,
    bounds: Option<Aabb>,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl NodeData {
    fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            transform: Transform::IDENTITY,
            enabled: true,
            bounds: None,
            parent: None,
            children: Vec::new(),
        }
    }
}

/// An in-memory scene graph.
#[derive(Debug, Default)]
pub struct Scene {
    allocator: SlotAllocator,
    nodes: Vec<Option<NodeData>>,
    /// Number of shared resources released by `dispose(_, true)`.
    released_shared: usize,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a node with a transform under an optional parent.
    pub fn spawn(&mut self, name: &str, transform: Transform, parent: Option<NodeId>) -> NodeId {
        let node = self.create_node(name);
        if let Some(data) = self.get_mut(node) {
            data.transform = transform;
        }
        if parent.is_some() {
            self.set_parent(node, parent);
        }
        node
    }

    /// Number of alive nodes.
    pub fn node_count(&self) -> usize {
        self.allocator.alive_count()
    }

    /// How many disposals also released shared resources.
    pub fn released_shared_count(&self) -> usize {
        self.released_shared
    }

    /// Local transform of a node.
    pub fn transform(&self, node: NodeId) -> Option<Transform> {
        self.get(node).map(|data| data.transform)
    }

    /// World matrix, composed from the root down.
    pub fn world_matrix(&self, node: NodeId) -> Mat4 {
        let mut chain = Vec::new();
        let mut current = Some(node);
        // A corrupted parent chain must not spin forever.
        while let Some(id) = current {
            if chain.len() > self.nodes.len() {
                log::warn!("Parent chain of {node} does not terminate");
                break;
            }
            let Some(data) = self.get(id) else { break };
            chain.push(data.transform.matrix());
            current = data.parent;
        }
        chain
            .into_iter()
            .rev()
            .fold(Mat4::IDENTITY, |world, local| world * local)
    }

    fn get(&self, node: NodeId) -> Option<&NodeData> {
        if !self.allocator.is_alive(node.index, node.generation) {
            return None;
        }
        self.nodes.get(node.index as usize)?.as_ref()
    }

    fn get_mut(&mut self, node: NodeId) -> Option<&mut NodeData> {
        if !self.allocator.is_alive(node.index, node.generation) {
            return None;
        }
        self.nodes.get_mut(node.index as usize)?.as_mut()
    }

    fn unlink(&mut self, node: NodeId) {
        let parent = self.get(node).and_then(|data| data.parent);
        if let Some(parent) = parent {
            if let Some(data) = self.get_mut(parent) {
                data.children.retain(|&child| child != node);
            }
        }
        if let Some(data) = self.get_mut(node) {
            data.parent = None;
        }
    }
}

impl SceneGraph for Scene {
    fn create_node(&mut self, name: &str) -> NodeId {
        let (index, generation) = self.allocator.allocate();
        let slot = index as usize;
        if slot >= self.nodes.len() {
            self.nodes.resize_with(slot + 1, || None);
        }
        self.nodes[slot] = Some(NodeData::new(name));
        NodeId { index, generation }
    }

    fn clone_node(&mut self, node: NodeId, parent: Option<NodeId>) -> Option<NodeId> {
        let source = self.get(node)?.clone();
        let copy = self.create_node(&source.name);
        if let Some(data) = self.get_mut(copy) {
            data.transform = source.transform;
            data.enabled = source.enabled;
            data.bounds = source.bounds;
        }
        if parent.is_some() {
            self.set_parent(copy, parent);
        }
        Some(copy)
    }

    fn is_alive(&self, node: NodeId) -> bool {
        self.get(node).is_some()
    }

    fn name(&self, node: NodeId) -> Option<&str> {
        self.get(node).map(|data| data.name.as_str())
    }

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.get(node).and_then(|data| data.parent)
    }

    fn children(&self, node: NodeId) -> Vec<NodeId> {
        self.get(node)
            .map(|data| data.children.clone())
            .unwrap_or_default()
    }

    fn set_parent(&mut self, node: NodeId, parent: Option<NodeId>) {
        if !self.is_alive(node) {
            return;
        }
        self.unlink(node);
        let Some(parent) = parent else { return };
        if let Some(data) = self.get_mut(parent) {
            data.children.push(node);
        } else {
            return;
        }
        if let Some(data) = self.get_mut(node) {
            data.parent = Some(parent);
        }
    }

    fn set_enabled(&mut self, node: NodeId, enabled: bool) {
        if let Some(data) = self.get_mut(node) {
            data.enabled = enabled;
        }
    }

    fn is_enabled(&self, node: NodeId, recursive: bool) -> bool {
        let Some(data) = self.get(node) else {
            return false;
        };
        if !recursive || !data.enabled {
            return data.enabled;
        }
        let mut current = data.parent;
        let mut depth = 0;
        while let Some(id) = current {
            let Some(ancestor) = self.get(id) else { break };
            if !ancestor.enabled {
                return false;
            }
            depth += 1;
            if depth > self.nodes.len() {
                break;
            }
            current = ancestor.parent;
        }
        true
    }

    fn position(&self, node: NodeId) -> Vec3 {
        self.get(node)
            .map(|data| data.transform.translation)
            .unwrap_or(Vec3::ZERO)
    }

    fn set_position(&mut self, node: NodeId, position: Vec3) {
        if let Some(data) = self.get_mut(node) {
            data.transform.translation = position;
        }
    }

    fn rotation(&self, node: NodeId) -> Quat {
        self.get(node)
            .map(|data| data.transform.rotation)
            .unwrap_or(Quat::IDENTITY)
    }

    fn set_rotation(&mut self, node: NodeId, rotation: Quat) {
        if let Some(data) = self.get_mut(node) {
            data.transform.rotation = rotation;
        }
    }

    fn scale(&self, node: NodeId) -> Vec3 {
        self.get(node)
            .map(|data| data.transform.scale)
            .unwrap_or(Vec3::ONE)
    }

    fn set_scale(&mut self, node: NodeId, scale: Vec3) {
        if let Some(data) = self.get_mut(node) {
            data.transform.scale = scale;
        }
    }

    fn world_scale(&self, node: NodeId) -> Vec3 {
        if !self.is_alive(node) {
            return Vec3::ONE;
        }
        let (scale, _, _) = self.world_matrix(node).to_scale_rotation_translation();
        scale
    }

    fn set_local_bounds(&mut self, node: NodeId, bounds: Aabb) {
        if let Some(data) = self.get_mut(node) {
            data.bounds = Some(bounds);
        }
    }

    fn dispose(&mut self, node: NodeId, release_shared: bool) {
        if !self.is_alive(node) {
            return;
        }
        let subtree = self.descendants(node);
        self.unlink(node);
        for id in subtree {
            if let Some(slot) = self.nodes.get_mut(id.index as usize) {
                *slot = None;
            }
            self.allocator.release(id.index, id.generation);
        }
        if release_shared {
            self.released_shared += 1;
        }
    }

    fn world_bounds(&self, nodes: &[NodeId]) -> Option<Aabb> {
        nodes
            .iter()
            .filter_map(|&node| {
                let bounds = self.get(node)?.bounds?;
                Some(bounds.transformed(&self.world_matrix(node)))
            })
            .reduce(|acc, next| acc.union(&next))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn child_world_scale_inherits_parent() {
        let mut scene = Scene::new();
        let root = scene.spawn("root", Transform::default().with_scale(2.0), None);
        let child = scene.spawn("child", Transform::default().with_scale(0.5), Some(root));
        let grandchild = scene.spawn("grandchild", Transform::default().with_scale(4.0), Some(child));

        assert!((scene.world_scale(child).x - 1.0).abs() < 0.001);
        assert!((scene.world_scale(grandchild).x - 4.0).abs() < 0.001);
    }

    #[test]
    fn recursive_enabled_checks_ancestors() {
        let mut scene = Scene::new();
        let root = scene.create_node("root");
        let child = scene.spawn("child", Transform::default(), Some(root));

        scene.set_enabled(root, false);
        assert!(scene.is_enabled(child, false));
        assert!(!scene.is_enabled(child, true));

        scene.set_enabled(root, true);
        assert!(scene.is_enabled(child, true));
    }

    #[test]
    fn reparent_moves_child_between_lists() {
        let mut scene = Scene::new();
        let a = scene.create_node("a");
        let b = scene.create_node("b");
        let child = scene.spawn("child", Transform::from_xyz(1.0, 0.0, 0.0), Some(a));

        scene.set_parent(child, Some(b));

        assert!(scene.children(a).is_empty());
        assert_eq!(scene.children(b), vec![child]);
        assert_eq!(scene.parent(child), Some(b));
        assert_eq!(scene.position(child), Vec3::new(1.0, 0.0, 0.0));
    }

    #[test]
    fn dispose_removes_subtree_and_detaches_from_parent() {
        let mut scene = Scene::new();
        let root = scene.create_node("root");
        let child = scene.spawn("child", Transform::default(), Some(root));
        let grandchild = scene.spawn("grandchild", Transform::default(), Some(child));

        scene.dispose(child, false);

        assert!(scene.is_alive(root));
        assert!(!scene.is_alive(child));
        assert!(!scene.is_alive(grandchild));
        assert!(scene.children(root).is_empty());
        assert_eq!(scene.node_count(), 1);
        assert_eq!(scene.released_shared_count(), 0);
    }

    #[test]
    fn stale_handle_after_recycle() {
        let mut scene = Scene::new();
        let old = scene.create_node("old");
        scene.dispose(old, true);
        let new = scene.create_node("new");

        assert_eq!(new.index(), old.index());
        assert!(!scene.is_alive(old));
        assert_eq!(scene.name(new), Some("new"));
        assert_eq!(scene.name(old), None);
    }

    #[test]
    fn clone_node_copies_state_but_not_children() {
        let mut scene = Scene::new();
        let root = scene.spawn("root", Transform::from_xyz(0.0, 2.0, 0.0), None);
        scene.spawn("child", Transform::default(), Some(root));
        scene.set_enabled(root, false);

        let copy = scene.clone_node(root, None).unwrap();

        assert_eq!(scene.name(copy), Some("root"));
        assert_eq!(scene.position(copy), Vec3::new(0.0, 2.0, 0.0));
        assert!(!scene.is_enabled(copy, false));
        assert!(scene.children(copy).is_empty());
    }

    #[test]
    fn world_bounds_unions_transformed_boxes() {
        let mut scene = Scene::new();
        let root = scene.spawn("root", Transform::from_xyz(10.0, 0.0, 0.0), None);
        let a = scene.spawn("a", Transform::default(), Some(root));
        let b = scene.spawn("b", Transform::from_xyz(0.0, 5.0, 0.0), Some(root));
        scene.set_local_bounds(a, Aabb::from_half_extents(Vec3::ONE));
        scene.set_local_bounds(b, Aabb::from_half_extents(Vec3::ONE));

        let bounds = scene.world_bounds(&[root, a, b]).unwrap();
        assert!((bounds.min.x - 9.0).abs() < 0.001);
        assert!((bounds.max.y - 6.0).abs() < 0.001);
        assert!(scene.world_bounds(&[root]).is_none());
    }

    #[test]
    fn descendants_are_depth_first_in_child_order() {
        let mut scene = Scene::new();
        let root = scene.create_node("root");
        let a = scene.spawn("a", Transform::default(), Some(root));
        let a1 = scene.spawn("a1", Transform::default(), Some(a));
        let b = scene.spawn("b", Transform::default(), Some(root));

        assert_eq!(scene.descendants(root), vec![root, a, a1, b]);
    }
}
