//! # glTF — Node Hierarchies from Part Assets
//!
//! Part assets are exported as glTF 2.0. The runtime never draws anything, so
//! only the scene hierarchy is read: node names (which carry the tags), local
//! transforms, and the bounding box of each node's mesh for camera framing.
//!
//! ## What We Extract
//!
//! - **Names**: `node.name()`, empty when absent
//! - **Transforms**: `transform().decomposed()` → translation, rotation, scale
//! - **Bounds**: union of the `POSITION` min/max of every mesh primitive
//!
//! ## What We Skip
//!
//! - Buffers, images, materials (no GPU upload happens here)
//! - Skins, morph targets, authored animations
//!
//! Sources are paths relative to the loader's base directory. `.gltf` and
//! `.glb` are both accepted.

use std::path::PathBuf;

use super::{AssetLoader, LoadError};
use crate::math::{Aabb, Quat, Vec3};
use crate::scene::{NodeId, SceneGraph};

/// Loads node trees from glTF / GLB files.
#[derive(Debug, Clone)]
pub struct GltfLoader {
    base: PathBuf,
}

impl GltfLoader {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }
}

impl<S: SceneGraph> AssetLoader<S> for GltfLoader {
    fn load(&mut self, source: &str, scene: &mut S) -> Result<Vec<NodeId>, LoadError> {
        let path = self.base.join(source);
        let gltf = ::gltf::Gltf::open(&path).map_err(LoadError::Gltf)?;
        let document = &gltf.document;

        let Some(gltf_scene) = document.default_scene().or_else(|| document.scenes().next()) else {
            return Err(LoadError::Empty(source.to_string()));
        };

        let mut top_level = Vec::new();
        let mut stack: Vec<(::gltf::Node<'_>, Option<NodeId>)> =
            gltf_scene.nodes().map(|node| (node, None)).collect();
        stack.reverse();

        while let Some((gltf_node, parent)) = stack.pop() {
            let node = scene.create_node(gltf_node.name().unwrap_or(""));
            let (translation, rotation, scale) = gltf_node.transform().decomposed();
            scene.set_position(node, Vec3::from_array(translation));
            scene.set_rotation(node, Quat::from_array(rotation));
            scene.set_scale(node, Vec3::from_array(scale));
            if let Some(bounds) = mesh_bounds(&gltf_node) {
                scene.set_local_bounds(node, bounds);
            }
            match parent {
                Some(parent) => scene.set_parent(node, Some(parent)),
                None => top_level.push(node),
            }

            let children: Vec<_> = gltf_node.children().collect();
            stack.extend(children.into_iter().rev().map(|child| (child, Some(node))));
        }
        Ok(top_level)
    }
}

fn mesh_bounds(node: &::gltf::Node<'_>) -> Option<Aabb> {
    let mesh = node.mesh()?;
    mesh.primitives()
        .map(|primitive| {
            let bounds = primitive.bounding_box();
            Aabb::new(Vec3::from_array(bounds.min), Vec3::from_array(bounds.max))
        })
        .reduce(|acc, next| acc.union(&next))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::Scene;

    #[test]
    fn missing_file_is_a_gltf_error() {
        let mut scene = Scene::new();
        let mut loader = GltfLoader::new(std::env::temp_dir().join("rigsmith-no-such-dir"));
        assert!(matches!(loader.load("case.glb", &mut scene), Err(LoadError::Gltf(_))));
        assert_eq!(scene.node_count(), 0);
    }
}
