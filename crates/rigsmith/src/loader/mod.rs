//! # Loading — From Asset Files to Component Models
//!
//! Loading a part happens in two halves:
//!
//! ```text
//! source ──► AssetLoader::load ──► top-level nodes ──► prepare ──► Prepared
//!            (JSON / glTF)         (plain node tree)   (decode, pick root)
//! ```
//!
//! An [`AssetLoader`] only knows file formats. It spawns the asset's node tree
//! into the scene and returns the top-level nodes. [`prepare`] then decodes
//! every node name, picks the component root, and throws away whatever is not
//! part of the component. The runtime turns the result into a model.
//!
//! ## Root selection
//!
//! - The first node tagged `rc"..."` is the root.
//! - Further `rc` nodes are reported and disposed.
//! - A root nested inside another node is lifted to the top level with its
//!   position zeroed.
//! - Every other top-level node is disposed.
//! - No root at all means the asset is not a component model.
//!
//! The root always starts hidden; it becomes visible when it is attached or
//! made the base model.
//!
//! ## Module Overview
//!
//! - [`json`] — [`JsonLoader`], node trees described as JSON
//! - `gltf` — `GltfLoader`, node hierarchies of glTF files (feature `gltf`)

#[cfg(feature = "gltf")]
pub mod gltf;
pub mod json;

use std::fmt;

#[cfg(feature = "gltf")]
pub use self::gltf::GltfLoader;
pub use json::JsonLoader;

use crate::compat::Compatibility;
use crate::decode::{Decoded, Decoder};
use crate::math::Vec3;
use crate::scene::{NodeId, SceneGraph};

/// Errors that can occur while loading an asset.
#[derive(Debug)]
pub enum LoadError {
    /// Reading the asset failed.
    Io(std::io::Error),
    /// The asset is not valid JSON for a node tree.
    Parse(serde_json::Error),
    /// The glTF importer rejected the file.
    #[cfg(feature = "gltf")]
    Gltf(::gltf::Error),
    /// The asset contains no nodes.
    Empty(String),
    /// No node of the asset is tagged as a component root.
    NoRoot(String),
    /// The loader does not know the source.
    UnknownSource(String),
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadError::Io(e) => write!(f, "asset read failed: {e}"),
            LoadError::Parse(e) => write!(f, "asset parse failed: {e}"),
            #[cfg(feature = "gltf")]
            LoadError::Gltf(e) => write!(f, "glTF import failed: {e}"),
            LoadError::Empty(source) => write!(f, "{source} contains no nodes"),
            LoadError::NoRoot(source) => write!(f, "{source} is not a component model"),
            LoadError::UnknownSource(source) => write!(f, "unknown asset source {source}"),
        }
    }
}

impl std::error::Error for LoadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LoadError::Io(e) => Some(e),
            LoadError::Parse(e) => Some(e),
            #[cfg(feature = "gltf")]
            LoadError::Gltf(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for LoadError {
    fn from(e: std::io::Error) -> Self {
        LoadError::Io(e)
    }
}

impl From<serde_json::Error> for LoadError {
    fn from(e: serde_json::Error) -> Self {
        LoadError::Parse(e)
    }
}

/// Spawns an asset's node tree into a scene.
pub trait AssetLoader<S: SceneGraph> {
    /// Load `source` and return the top-level nodes it created.
    fn load(&mut self, source: &str, scene: &mut S) -> Result<Vec<NodeId>, LoadError>;
}

/// A decoded asset whose root has been chosen.
#[derive(Debug)]
pub struct Prepared {
    pub root: NodeId,
    /// Record name of the root.
    pub name: String,
    pub compat: Compatibility,
    pub decoded: Decoded,
}

/// Decode the nodes below `top_level` and pick the component root.
///
/// On error every node of the asset has been disposed.
pub fn prepare<S: SceneGraph>(scene: &mut S, source: &str, top_level: Vec<NodeId>) -> Result<Prepared, LoadError> {
    if top_level.is_empty() {
        return Err(LoadError::Empty(source.to_string()));
    }

    let nodes: Vec<NodeId> = top_level.iter().flat_map(|&node| scene.descendants(node)).collect();
    let mut decoder = Decoder::new();
    for &node in &nodes {
        if let Some(name) = scene.name(node).map(str::to_string) {
            decoder.add_node(node, &name);
        }
    }
    let mut decoded = decoder.resolve();

    let mut root: Option<(NodeId, String, Compatibility)> = None;
    // Tags are in traversal order, so the first root found is the first in
    // the tree.
    for &(node, index) in &decoded.tags {
        if !scene.is_alive(node) {
            continue;
        }
        let Some(record) = decoded.records.get(index) else { continue };
        let Some(compat) = record.root.clone() else { continue };
        if root.is_some() {
            log::warn!("Multiple root nodes found in {source}, using the first one");
            scene.dispose(node, false);
            continue;
        }
        root = Some((node, record.name.clone(), compat));
    }

    let Some((root, name, compat)) = root else {
        for node in top_level {
            scene.dispose(node, false);
        }
        return Err(LoadError::NoRoot(source.to_string()));
    };

    if scene.parent(root).is_some() {
        scene.set_parent(root, None);
        scene.set_position(root, Vec3::ZERO);
    }
    for node in top_level {
        if node != root {
            scene.dispose(node, false);
        }
    }
    scene.set_enabled(root, false);

    prune_dead(&mut decoded, scene);
    Ok(Prepared {
        root,
        name,
        compat,
        decoded,
    })
}

/// Drop references to nodes that root selection disposed.
fn prune_dead<S: SceneGraph>(decoded: &mut Decoded, scene: &S) {
    decoded.tags.retain(|&(node, _)| scene.is_alive(node));
    for record in &mut decoded.records {
        record.members.retain(|&node| scene.is_alive(node));
        record.locations.retain(|(node, _)| scene.is_alive(*node));
        record.constraints.retain(|&node| scene.is_alive(node));
        if record
            .animation
            .as_ref()
            .is_some_and(|(node, _)| !scene.is_alive(*node))
        {
            record.animation = None;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::Transform;
    use crate::scene::Scene;

    #[test]
    fn picks_first_root_and_drops_the_rest() {
        let mut scene = Scene::new();
        let light = scene.create_node("Light");
        let wrapper = scene.create_node("__root__");
        let root = scene.spawn("rc\"fan,120\":fan", Transform::from_xyz(0.0, 3.0, 0.0), Some(wrapper));
        let blade = scene.spawn("anim\"rotate\":blade", Transform::default(), Some(root));
        let extra = scene.spawn("rc\"fan,140\":other_fan", Transform::default(), Some(wrapper));

        let prepared = prepare(&mut scene, "fan.json", vec![light, wrapper]).unwrap();

        assert_eq!(prepared.root, root);
        assert_eq!(prepared.name, "fan");
        assert_eq!(prepared.compat, Compatibility::Fan(Some(120)));
        assert_eq!(scene.parent(root), None);
        assert_eq!(scene.position(root), Vec3::ZERO);
        assert!(!scene.is_enabled(root, false));
        assert!(scene.is_alive(blade));
        assert!(!scene.is_alive(extra));
        assert!(!scene.is_alive(light));
        assert!(!scene.is_alive(wrapper));
        assert!(prepared.decoded.tags.iter().all(|&(node, _)| scene.is_alive(node)));
    }

    #[test]
    fn asset_without_root_is_rejected() {
        let mut scene = Scene::new();
        let plain = scene.create_node("Cube");

        let result = prepare(&mut scene, "cube.json", vec![plain]);

        assert!(matches!(result, Err(LoadError::NoRoot(_))));
        assert_eq!(scene.node_count(), 0);
    }

    #[test]
    fn empty_asset_is_rejected() {
        let mut scene = Scene::new();
        assert!(matches!(prepare(&mut scene, "x", Vec::new()), Err(LoadError::Empty(_))));
    }
}
