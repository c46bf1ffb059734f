//! JSON node-tree assets.
//!
//! ```json
//! {
//!   "nodes": [
//!     {
//!       "name": "rc\"fan,120\":fan",
//!       "translation": [0.0, 0.0, 0.0],
//!       "children": [
//!         { "name": "anim\"rotate\":rotor", "bounds": { "min": [-0.06, -0.06, -0.01], "max": [0.06, 0.06, 0.01] } }
//!       ]
//!     }
//!   ]
//! }
//! ```
//!
//! `rotation` is a quaternion `[x, y, z, w]`; `scale` defaults to `[1, 1, 1]`.

use std::collections::HashMap;
use std::path::PathBuf;

use serde::Deserialize;

use super::{AssetLoader, LoadError};
use crate::math::{Aabb, Quat, Vec3};
use crate::scene::{NodeId, SceneGraph};

#[derive(Debug, Deserialize)]
struct AssetDocument {
    nodes: Vec<NodeDescription>,
}

#[derive(Debug, Deserialize)]
struct NodeDescription {
    name: String,
    #[serde(default)]
    translation: Vec3,
    #[serde(default)]
    rotation: Quat,
    #[serde(default = "unit_scale")]
    scale: Vec3,
    #[serde(default)]
    bounds: Option<BoundsDescription>,
    #[serde(default)]
    children: Vec<NodeDescription>,
}

#[derive(Debug, Deserialize)]
struct BoundsDescription {
    min: Vec3,
    max: Vec3,
}

fn unit_scale() -> Vec3 {
    Vec3::ONE
}

/// Loads node trees from JSON, either registered in memory or read from a
/// base directory.
#[derive(Debug, Default)]
pub struct JsonLoader {
    base: Option<PathBuf>,
    documents: HashMap<String, String>,
}

impl JsonLoader {
    /// A loader with no documents and no directory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Read sources as paths relative to `base`.
    pub fn from_dir(base: impl Into<PathBuf>) -> Self {
        Self {
            base: Some(base.into()),
            documents: HashMap::new(),
        }
    }

    /// Register an in-memory document under `source` (builder pattern).
    pub fn with_document(mut self, source: impl Into<String>, json: impl Into<String>) -> Self {
        self.insert(source, json);
        self
    }

    pub fn insert(&mut self, source: impl Into<String>, json: impl Into<String>) {
        self.documents.insert(source.into(), json.into());
    }

    fn read(&self, source: &str) -> Result<String, LoadError> {
        if let Some(json) = self.documents.get(source) {
            return Ok(json.clone());
        }
        match &self.base {
            Some(base) => Ok(std::fs::read_to_string(base.join(source))?),
            None => Err(LoadError::UnknownSource(source.to_string())),
        }
    }
}

impl<S: SceneGraph> AssetLoader<S> for JsonLoader {
    fn load(&mut self, source: &str, scene: &mut S) -> Result<Vec<NodeId>, LoadError> {
        let document: AssetDocument = serde_json::from_str(&self.read(source)?)?;

        let mut top_level = Vec::with_capacity(document.nodes.len());
        let mut stack: Vec<(NodeDescription, Option<NodeId>)> =
            document.nodes.into_iter().rev().map(|node| (node, None)).collect();

        while let Some((description, parent)) = stack.pop() {
            let node = scene.create_node(&description.name);
            scene.set_position(node, description.translation);
            scene.set_rotation(node, description.rotation);
            scene.set_scale(node, description.scale);
            if let Some(bounds) = description.bounds {
                scene.set_local_bounds(node, Aabb::new(bounds.min, bounds.max));
            }
            match parent {
                Some(parent) => scene.set_parent(node, Some(parent)),
                None => top_level.push(node),
            }
            stack.extend(
                description
                    .children
                    .into_iter()
                    .rev()
                    .map(|child| (child, Some(node))),
            );
        }
        Ok(top_level)
    }
}
