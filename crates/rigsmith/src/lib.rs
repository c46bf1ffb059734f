//! # Rigsmith — PC Part Assembly Runtime
//!
//! Loads PC parts (cases, motherboards, CPUs, fans, coolers, ...) as node
//! trees, checks which part fits where, and plays out attach, detach and
//! show/hide operations as small animated tasks on a frame-driven scheduler.
//!
//! Start with `use rigsmith::prelude::*` and build a [`Runtime`](runtime::Runtime).
//!
//! ```text
//!   loader ──► decode ──► runtime ──► task executor ──► scene graph
//!   (JSON/glTF) (tags)    (models,     (pending/running)  (your renderer,
//!                          mounts,                         or the in-memory
//!                          toggles)                        Scene)
//! ```

pub mod animation;
pub mod compat;
pub mod decode;
pub mod loader;
pub mod math;
pub mod prelude;
pub mod runtime;
pub mod scene;
pub mod settings;
pub mod task;
