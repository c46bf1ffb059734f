//! Common imports: `use rigsmith::prelude::*;`

pub use crate::animation::{EaseFunction, SpinAnimation};
pub use crate::compat::{Category, Compatibility};
#[cfg(feature = "gltf")]
pub use crate::loader::GltfLoader;
pub use crate::loader::{AssetLoader, JsonLoader, LoadError};
pub use crate::math::{Aabb, Quat, Transform, Vec3};
pub use crate::runtime::{Model, ModelId, MountId, MountPoint, Runtime, ToggleGroup, ToggleId};
pub use crate::scene::{NodeId, Scene, SceneGraph};
pub use crate::settings::Settings;
pub use crate::task::TaskId;
