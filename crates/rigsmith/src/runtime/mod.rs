//! # Runtime — Assembling a PC Out of Parts
//!
//! The [`Runtime`] owns the scene, the task executor, and every loaded part
//! (a **model**). The host calls it from its frame loop and from its UI:
//!
//! ```text
//!          UI / host                             frame loop
//!   add_model  attach  detach                 runtime.update(dt)
//!   set_toggle_enabled  dispose                        │
//!          │                                           ▼
//!          ▼                              ┌────────────────────────┐
//!   ┌──────────────┐   schedules tasks    │ TaskExecutor           │
//!   │ Assembly     │ ───────────────────► │  pending / running     │
//!   │  models      │ ◄─────────────────── │  perform(Action)       │
//!   │  mounts      │   actions, placement │  place(node, position) │
//!   │  toggles     │                      └────────────────────────┘
//!   │  counters    │
//!   │  scene       │
//!   └──────────────┘
//! ```
//!
//! API calls never block. They update bookkeeping at once (who is attached
//! where, which toggle is on) and schedule the visible part of the change as
//! tasks that play out over the following frames. Every call returns the
//! tasks it produced, so the host can chain further work or force-finish them.
//!
//! ## Ownership
//!
//! The executor and the assembled state are separate fields. Task actions are
//! plain [`Action`] values; the executor hands them back to the [`Assembly`],
//! which implements [`TaskHost`] and so can schedule further tasks while it
//! performs one.
//!
//! ## Module Overview
//!
//! - [`model`] — [`Model`], instancing, disposal
//! - [`mount`] — [`MountPoint`], attach / detach
//! - [`toggle`] — [`ToggleGroup`], reference-counted visibility

pub mod model;
pub mod mount;
pub mod toggle;

use std::collections::HashMap;
use std::fmt;

pub use model::Model;
pub use mount::{Location, MountPoint};
pub use toggle::{Requester, ToggleGroup};

use crate::compat::Compatibility;
use crate::loader::{prepare, AssetLoader};
use crate::math::{Aabb, Quat, Vec3};
use crate::scene::{NodeId, Scene, SceneGraph};
use crate::settings::Settings;
use crate::task::{TaskExecutor, TaskHost, TaskId};
use model::NodeInfo;
use toggle::ToggleCounter;

macro_rules! id_type {
    ($(#[$meta:meta])* $name:ident, $label:literal) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub struct $name(pub(crate) u32);

        impl $name {
            pub fn index(self) -> usize {
                self.0 as usize
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($label, "({})"), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($label, "#{}"), self.0)
            }
        }
    };
}

id_type!(
    /// A loaded or instanced part. Ids are never reused.
    ModelId,
    "Model"
);
id_type!(
    /// A mount point on some model.
    MountId,
    "Mount"
);
id_type!(
    /// A toggle group on some model.
    ToggleId,
    "Toggle"
);

/// What a task operates on. Tasks on the same target serialize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Affinity {
    Node(NodeId),
    Model(ModelId),
}

/// The deferred effects tasks carry.
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    /// Parent a model's root under a mount location and show it.
    Place {
        mount: MountId,
        location: usize,
        model: ModelId,
    },
    /// Unparent a detached model's root, reset it, and hide it.
    Release { model: ModelId },
    Show(NodeId),
    Hide(NodeId),
    /// Tear a disposed model down.
    Finalize(ModelId),
}

/// The executor type the runtime schedules on.
pub type Tasks = TaskExecutor<Affinity, Action>;

type BaseListener = Box<dyn FnMut(Option<ModelId>)>;

/// All assembled state: scene, models, mount points, toggle groups, and the
/// shared visibility counters.
pub struct Assembly<S> {
    scene: S,
    settings: Settings,
    models: Vec<Model>,
    mounts: Vec<MountPoint>,
    toggles: Vec<ToggleGroup>,
    /// Record metadata keyed by an ever-growing index; entries go away when
    /// no annotated node refers to them.
    infos: HashMap<usize, NodeInfo>,
    next_info: usize,
    /// Annotated node → key into `infos`.
    tags: HashMap<NodeId, usize>,
    counters: HashMap<NodeId, ToggleCounter>,
    /// Source → prototype model.
    prototypes: HashMap<String, ModelId>,
    live: Vec<ModelId>,
    base: Option<ModelId>,
    base_listeners: Vec<BaseListener>,
    animation_time: f32,
    playing: bool,
}

impl<S: SceneGraph> Assembly<S> {
    fn new(scene: S, settings: Settings) -> Self {
        Self {
            scene,
            settings,
            models: Vec::new(),
            mounts: Vec::new(),
            toggles: Vec::new(),
            infos: HashMap::new(),
            next_info: 0,
            tags: HashMap::new(),
            counters: HashMap::new(),
            prototypes: HashMap::new(),
            live: Vec::new(),
            base: None,
            base_listeners: Vec::new(),
            animation_time: 0.0,
            playing: false,
        }
    }

    fn model(&self, id: ModelId) -> Option<&Model> {
        self.models.get(id.index())
    }

    fn model_mut(&mut self, id: ModelId) -> Option<&mut Model> {
        self.models.get_mut(id.index())
    }

    fn info(&self, node: NodeId) -> Option<&NodeInfo> {
        self.tags.get(&node).and_then(|index| self.infos.get(index))
    }

    /// World-space lift offset for a node whose parent is `parent`.
    fn lift_under(&self, parent: Option<NodeId>) -> f32 {
        let scale = parent.map_or(1.0, |parent| self.scene.world_scale(parent).x);
        if scale.abs() <= f32::EPSILON {
            self.settings.lift
        } else {
            self.settings.lift / scale
        }
    }

    fn set_base_model(&mut self, model: Option<ModelId>) {
        if let Some(previous) = self.base.and_then(|id| self.model(id)).map(Model::root) {
            self.scene.set_enabled(previous, false);
        }
        self.base = model.filter(|&id| self.model(id).is_some_and(|m| !m.is_disposed()));
        if let Some(root) = self.base.and_then(|id| self.model(id)).map(Model::root) {
            self.scene.set_enabled(root, true);
        }
        self.notify_base_changed();
    }

    fn notify_base_changed(&mut self) {
        let base = self.base;
        for listener in &mut self.base_listeners {
            listener(base);
        }
    }

    fn animate(&mut self, dt: f32) {
        if !self.playing {
            return;
        }
        self.animation_time += dt;
        let time = self.animation_time;
        let Self {
            models, live, scene, ..
        } = self;
        for id in live.iter() {
            let Some(model) = models.get_mut(id.index()) else { continue };
            for spin in model.animations_mut() {
                spin.animate(time, scene);
            }
        }
    }
}

impl<S: SceneGraph> TaskHost<Affinity, Action> for Assembly<S> {
    fn perform(&mut self, tasks: &mut Tasks, action: Action) {
        match action {
            Action::Place {
                mount,
                location,
                model,
            } => self.place_at_location(tasks, mount, location, model),
            Action::Release { model } => {
                let Some(root) = self.model(model).map(Model::root) else {
                    return;
                };
                self.scene.set_parent(root, None);
                self.scene.set_position(root, Vec3::ZERO);
                self.scene.set_rotation(root, Quat::IDENTITY);
                self.scene.set_enabled(root, false);
            }
            Action::Show(node) => self.scene.set_enabled(node, true),
            Action::Hide(node) => self.scene.set_enabled(node, false),
            Action::Finalize(model) => self.finalize(model),
        }
    }

    fn place(&mut self, target: &Affinity, position: Vec3) {
        if let Affinity::Node(node) = target {
            self.scene.set_position(*node, position);
        }
    }
}

/// The public face of the assembly runtime.
///
/// # Example
///
/// ```
/// use rigsmith::prelude::*;
///
/// let mut loader = JsonLoader::new()
///     .with_document("fan", r#"{ "nodes": [ { "name": "rc\"fan,120\":fan" } ] }"#)
///     .with_document(
///         "case",
///         r#"{ "nodes": [ { "name": "rc\"case\":case", "children": [
///             { "name": "mount_point,c\"fan,120\":fan_mp" } ] } ] }"#,
///     );
///
/// let mut runtime = Runtime::new(Scene::new());
/// let case = runtime.add_model(&mut loader, "case").unwrap();
/// let fan = runtime.add_model(&mut loader, "fan").unwrap();
/// runtime.set_base_model(Some(case));
///
/// let slot = runtime.model(case).unwrap().mounts()[0];
/// runtime.attach(slot, fan, true).unwrap();
/// assert_eq!(runtime.mount(slot).unwrap().occupant(), Some(fan));
/// ```
pub struct Runtime<S: SceneGraph = Scene> {
    tasks: Tasks,
    assembly: Assembly<S>,
}

impl<S: SceneGraph> Runtime<S> {
    pub fn new(scene: S) -> Self {
        Self::with_settings(scene, Settings::default())
    }

    pub fn with_settings(scene: S, settings: Settings) -> Self {
        Self {
            tasks: Tasks::new(),
            assembly: Assembly::new(scene, settings),
        }
    }

    pub fn scene(&self) -> &S {
        &self.assembly.scene
    }

    pub fn scene_mut(&mut self) -> &mut S {
        &mut self.assembly.scene
    }

    pub fn settings(&self) -> &Settings {
        &self.assembly.settings
    }

    pub fn tasks(&self) -> &Tasks {
        &self.tasks
    }

    // ── Models ───────────────────────────────────────────────────────────

    /// Load a part. The first load of a source becomes its prototype; later
    /// loads of the same source are instances of it.
    ///
    /// Load failures are logged and yield `None`.
    pub fn add_model<L>(&mut self, loader: &mut L, source: &str) -> Option<ModelId>
    where
        L: AssetLoader<S> + ?Sized,
    {
        if let Some(&prototype) = self.assembly.prototypes.get(source) {
            let name = self.assembly.model(prototype)?.name().to_string();
            return self.create_instance(prototype, &name);
        }

        let scene = &mut self.assembly.scene;
        let prepared = loader
            .load(source, scene)
            .and_then(|nodes| prepare(scene, source, nodes));
        match prepared {
            Ok(prepared) => Some(self.assembly.register(source, prepared)),
            Err(e) => {
                log::error!("Failed to load model {source}: {e}");
                None
            }
        }
    }

    /// Clone a model's static shape into a new, independent model.
    pub fn create_instance(&mut self, model: ModelId, name: &str) -> Option<ModelId> {
        self.assembly.create_instance(model, name)
    }

    /// Live models, in load order. A model leaves this list as soon as its
    /// disposal starts.
    pub fn models(&self) -> &[ModelId] {
        &self.assembly.live
    }

    pub fn model(&self, id: ModelId) -> Option<&Model> {
        self.assembly.model(id)
    }

    pub fn mount(&self, id: MountId) -> Option<&MountPoint> {
        self.assembly.mounts.get(id.index())
    }

    pub fn toggle(&self, id: ToggleId) -> Option<&ToggleGroup> {
        self.assembly.toggles.get(id.index())
    }

    /// The compatibility a model's root declares.
    pub fn compatibility(&self, model: ModelId) -> Option<&Compatibility> {
        self.assembly.root_compat(model)
    }

    // ── Attachment ───────────────────────────────────────────────────────

    /// Attach `model` at the first available compatible location of `mount`.
    pub fn attach(&mut self, mount: MountId, model: ModelId, skip_animation: bool) -> Option<TaskId> {
        self.assembly
            .attach(&mut self.tasks, mount, model, skip_animation)
    }

    /// Attach `model` to the first free mount point of `host` that can take it.
    pub fn attach_anywhere(&mut self, host: ModelId, model: ModelId, skip_animation: bool) -> Option<(MountId, TaskId)> {
        self.assembly
            .attach_anywhere(&mut self.tasks, host, model, skip_animation)
    }

    /// Detach whatever occupies `mount`. With `recursive`, everything attached
    /// to the occupant leaves first.
    pub fn detach(&mut self, mount: MountId, recursive: bool, skip_animation: bool) -> Option<(ModelId, TaskId)> {
        self.assembly
            .detach(&mut self.tasks, mount, recursive, skip_animation)
    }

    pub fn check_point_availability(&self, mount: MountId, index: usize) -> bool {
        self.assembly.check_point_availability(mount, index)
    }

    /// Whether `mount` could take a part with compatibility `part` right now.
    pub fn offers(&self, mount: MountId, part: &Compatibility) -> bool {
        self.assembly.offers(mount, part)
    }

    // ── Visibility ───────────────────────────────────────────────────────

    /// Show or hide a toggle group. Returns every task the change produced.
    pub fn set_toggle_enabled(&mut self, toggle: ToggleId, enabled: bool) -> Vec<TaskId> {
        self.assembly
            .set_toggle_enabled(&mut self.tasks, toggle, enabled)
    }

    /// Whether some toggle group or constraint currently keeps `node` hidden.
    pub fn is_held(&self, node: NodeId) -> bool {
        self.assembly.is_held(node)
    }

    // ── Disposal ─────────────────────────────────────────────────────────

    /// Dispose a model. A second call is a no-op returning `None`.
    pub fn dispose(&mut self, model: ModelId, skip_animation: bool) -> Option<TaskId> {
        self.assembly
            .dispose(&mut self.tasks, model, skip_animation)
    }

    /// Called once when disposal of `model` starts.
    pub fn on_dispose_early(&mut self, model: ModelId, listener: impl FnOnce(ModelId) + 'static) {
        if let Some(model) = self.assembly.model_mut(model) {
            model.early_listeners.push(Box::new(listener));
        }
    }

    /// Called once when `model` is torn down.
    pub fn on_dispose(&mut self, model: ModelId, listener: impl FnOnce(ModelId) + 'static) {
        if let Some(model) = self.assembly.model_mut(model) {
            model.dispose_listeners.push(Box::new(listener));
        }
    }

    /// Dispose every live model that is neither attached nor the base model.
    pub fn dispose_unbounded_models(&mut self) {
        let candidates = self.assembly.live.clone();
        for id in candidates {
            let Some(model) = self.assembly.model(id) else { continue };
            if model.mounted_at().is_some() || self.assembly.base == Some(id) {
                continue;
            }
            self.dispose(id, true);
        }
    }

    // ── Frame ────────────────────────────────────────────────────────────

    /// Advance procedural animations (while playing), then the tasks.
    pub fn update(&mut self, dt: f32) {
        self.assembly.animate(dt);
        self.tasks.update(dt, &mut self.assembly);
    }

    /// Collapse tasks and their dependencies to their end state.
    pub fn force_finish(&mut self, tasks: &[TaskId]) {
        self.tasks.force_finish(tasks, &mut self.assembly);
    }

    pub fn play_animation(&mut self) {
        self.assembly.playing = true;
    }

    pub fn stop_animation(&mut self) {
        self.assembly.playing = false;
    }

    pub fn is_animation_playing(&self) -> bool {
        self.assembly.playing
    }

    // ── Base model ───────────────────────────────────────────────────────

    /// Make `model` the base of the build. The previous base is hidden; a
    /// disposed model clears the base.
    pub fn set_base_model(&mut self, model: Option<ModelId>) {
        self.assembly.set_base_model(model);
    }

    pub fn base_model(&self) -> Option<ModelId> {
        self.assembly.base
    }

    /// World bounds of the base model's nodes, for camera framing.
    pub fn base_model_bounds(&self) -> Option<Aabb> {
        let root = self.assembly.model(self.assembly.base?)?.root();
        let scene = &self.assembly.scene;
        scene.world_bounds(&scene.descendants(root))
    }

    pub fn on_base_model_changed(&mut self, listener: impl FnMut(Option<ModelId>) + 'static) {
        self.assembly.base_listeners.push(Box::new(listener));
    }

    /// Counts and attachment state for external tooling.
    #[cfg(feature = "diagnostics")]
    pub fn snapshot(&self) -> RuntimeSnapshot {
        let models = self
            .assembly
            .live
            .iter()
            .filter_map(|&id| self.assembly.model(id))
            .map(|model| ModelSnapshot {
                id: model.id().0,
                name: model.name().to_string(),
                source: model.source().to_string(),
                category: model.category().to_string(),
                mounted_at: model
                    .mounted_at()
                    .and_then(|mount| self.mount(mount))
                    .map(|mount| mount.name().to_string()),
                instance_of: model.prototype().map(|id| id.0),
            })
            .collect();
        RuntimeSnapshot {
            tasks: self.tasks.snapshot(),
            base_model: self.assembly.base.map(|id| id.0),
            models,
        }
    }
}

/// Serializable runtime summary.
#[cfg(feature = "diagnostics")]
#[derive(Debug, Clone, serde::Serialize)]
pub struct RuntimeSnapshot {
    pub tasks: crate::task::executor::ExecutorSnapshot,
    pub base_model: Option<u32>,
    pub models: Vec<ModelSnapshot>,
}

#[cfg(feature = "diagnostics")]
#[derive(Debug, Clone, serde::Serialize)]
pub struct ModelSnapshot {
    pub id: u32,
    pub name: String,
    pub source: String,
    pub category: String,
    pub mounted_at: Option<String>,
    pub instance_of: Option<u32>,
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::loader::JsonLoader;

    const CASE: &str = r#"{ "nodes": [ { "name": "rc\"case\":case",
        "bounds": { "min": [-1.0, -2.0, -0.5], "max": [1.0, 2.0, 0.5] },
        "children": [
            { "name": "mount_point,c\"fan,120\":fan_mp", "translation": [0.0, 1.5, 0.0] },
            { "name": "mount_point,c\"fan,120\":fan_mp.001", "translation": [0.0, -1.5, 0.0] },
            { "name": "mount_point,c\"cooler,LGA1700\":socket_a" },
            { "name": "mount_point,c\"cooler,AM5\":socket_b" },
            { "name": "mount_point,c\"cooler,LGA1200\":socket_c" }
        ] } ] }"#;

    const FAN: &str = r#"{ "nodes": [ { "name": "rc\"fan,120\":fan", "children": [
        { "name": "anim\"rotate\":rotor" }
    ] } ] }"#;

    const COOLER: &str = r#"{ "nodes": [ { "name": "rc\"cooler,LGA1700,AM5\":cooler" } ] }"#;

    fn loader() -> JsonLoader {
        JsonLoader::new()
            .with_document("case", CASE)
            .with_document("fan", FAN)
            .with_document("cooler", COOLER)
    }

    fn mount_named(runtime: &Runtime, model: ModelId, name: &str) -> MountId {
        *runtime
            .model(model)
            .unwrap()
            .mounts()
            .iter()
            .find(|&&id| runtime.mount(id).unwrap().name() == name)
            .unwrap()
    }

    #[test]
    fn unknown_source_yields_no_model() {
        let mut runtime = Runtime::new(Scene::new());
        assert!(runtime.add_model(&mut loader(), "missing").is_none());
        assert!(runtime.models().is_empty());
    }

    #[test]
    fn locations_of_one_mount_point_merge() {
        let mut runtime = Runtime::new(Scene::new());
        let case = runtime.add_model(&mut loader(), "case").unwrap();
        let fans = mount_named(&runtime, case, "fan_mp");
        assert_eq!(runtime.mount(fans).unwrap().locations().len(), 2);
        assert_eq!(runtime.model(case).unwrap().mounts().len(), 4);
    }

    #[test]
    fn cooler_fits_any_socket_it_lists() {
        let mut loader = loader();
        let mut runtime = Runtime::new(Scene::new());
        let case = runtime.add_model(&mut loader, "case").unwrap();
        runtime.set_base_model(Some(case));
        let cooler = runtime.add_model(&mut loader, "cooler").unwrap();
        assert_eq!(runtime.compatibility(cooler).unwrap().category(), crate::compat::Category::Cooler);

        let intel = mount_named(&runtime, case, "socket_a");
        let amd = mount_named(&runtime, case, "socket_b");
        let old_intel = mount_named(&runtime, case, "socket_c");

        assert!(runtime.attach(intel, cooler, true).is_some());
        assert!(runtime.attach(amd, cooler, true).is_some());
        assert!(runtime.attach(old_intel, cooler, true).is_none());
        assert_eq!(runtime.model(cooler).unwrap().mounted_at(), Some(amd));
    }

    #[test]
    fn second_location_takes_the_next_part() {
        let mut loader = loader();
        let mut runtime = Runtime::new(Scene::new());
        let case = runtime.add_model(&mut loader, "case").unwrap();
        runtime.set_base_model(Some(case));
        let fans = mount_named(&runtime, case, "fan_mp");
        let fan = runtime.add_model(&mut loader, "fan").unwrap();

        runtime.attach(fans, fan, true).unwrap();
        assert_eq!(runtime.mount(fans).unwrap().occupied_location(), Some(0));

        // Hiding the first location pushes the next attach to the second one.
        let first = runtime.mount(fans).unwrap().locations()[0].node;
        runtime.scene_mut().set_enabled(first, false);
        runtime.attach(fans, fan, true).unwrap();
        assert_eq!(runtime.mount(fans).unwrap().occupied_location(), Some(1));
    }

    #[test]
    fn force_finish_matches_natural_completion() {
        fn build() -> (Runtime, ModelId, TaskId) {
            let mut loader = loader();
            let mut runtime = Runtime::new(Scene::new());
            let case = runtime.add_model(&mut loader, "case").unwrap();
            runtime.set_base_model(Some(case));
            let fan = runtime.add_model(&mut loader, "fan").unwrap();
            let first = mount_named(&runtime, case, "fan_mp");
            runtime.attach(first, fan, false).unwrap();
            // Detach from `first` and re-attach: a chain of three tasks on one node.
            let task = runtime.detach(first, false, false).unwrap().1;
            let last = runtime.attach(first, fan, false).unwrap();
            assert!(runtime.tasks().run_after(last).unwrap().contains(&task));
            (runtime, fan, last)
        }

        let (mut forced, fan, last) = build();
        forced.force_finish(&[last]);
        assert!(forced.tasks().is_finished(last));

        let (mut natural, _, last) = build();
        for _ in 0..60 {
            natural.update(0.1);
        }
        assert!(natural.tasks().is_finished(last));

        let root = forced.model(fan).unwrap().root();
        assert_eq!(forced.scene().parent(root), natural.scene().parent(root));
        assert_eq!(forced.scene().position(root), natural.scene().position(root));
        assert_eq!(
            forced.scene().is_enabled(root, true),
            natural.scene().is_enabled(root, true)
        );
        assert!(forced.scene().is_enabled(root, true));
    }

    #[test]
    fn base_model_is_shown_framed_and_announced() {
        let mut loader = loader();
        let mut runtime = Runtime::new(Scene::new());
        let seen = Rc::new(RefCell::new(Vec::new()));
        let log = Rc::clone(&seen);
        runtime.on_base_model_changed(move |base| log.borrow_mut().push(base));

        let case = runtime.add_model(&mut loader, "case").unwrap();
        let fan = runtime.add_model(&mut loader, "fan").unwrap();
        assert!(runtime.base_model_bounds().is_none());

        runtime.set_base_model(Some(case));
        let case_root = runtime.model(case).unwrap().root();
        assert!(runtime.scene().is_enabled(case_root, false));
        let bounds = runtime.base_model_bounds().unwrap();
        assert_eq!(bounds.min, Vec3::new(-1.0, -2.0, -0.5));

        runtime.set_base_model(Some(fan));
        assert!(!runtime.scene().is_enabled(case_root, false));

        runtime.dispose(fan, true);
        assert_eq!(runtime.base_model(), None);
        assert_eq!(*seen.borrow(), vec![Some(case), Some(fan), None]);
    }

    #[test]
    fn unbounded_models_are_swept() {
        let mut loader = loader();
        let mut runtime = Runtime::new(Scene::new());
        let case = runtime.add_model(&mut loader, "case").unwrap();
        runtime.set_base_model(Some(case));
        let attached = runtime.add_model(&mut loader, "fan").unwrap();
        let loose = runtime.add_model(&mut loader, "fan").unwrap();
        runtime.attach_anywhere(case, attached, true).unwrap();

        runtime.dispose_unbounded_models();

        assert_eq!(runtime.models(), &[case, attached]);
        assert!(runtime.model(loose).unwrap().is_disposed());
    }

    #[test]
    fn spins_only_while_playing() {
        let mut loader = loader();
        let mut runtime = Runtime::new(Scene::new());
        let fan = runtime.add_model(&mut loader, "fan").unwrap();
        let rotor = runtime.model(fan).unwrap().animations()[0].target();

        runtime.update(0.5);
        assert_eq!(runtime.scene().rotation(rotor), Quat::IDENTITY);

        runtime.play_animation();
        assert!(runtime.is_animation_playing());
        runtime.update(0.5);
        assert!(runtime.scene().rotation(rotor).angle_between(Quat::IDENTITY) > 0.1);

        runtime.stop_animation();
        let frozen = runtime.scene().rotation(rotor);
        runtime.update(0.5);
        assert_eq!(runtime.scene().rotation(rotor), frozen);
    }

    #[cfg(feature = "diagnostics")]
    #[test]
    fn snapshot_reports_attachments() {
        let mut loader = loader();
        let mut runtime = Runtime::new(Scene::new());
        let case = runtime.add_model(&mut loader, "case").unwrap();
        runtime.set_base_model(Some(case));
        let fan = runtime.add_model(&mut loader, "fan").unwrap();
        runtime.attach_anywhere(case, fan, false).unwrap();

        let snapshot = runtime.snapshot();
        assert_eq!(snapshot.base_model, Some(case.0));
        assert_eq!(snapshot.models.len(), 2);
        assert_eq!(snapshot.models[1].mounted_at.as_deref(), Some("fan_mp"));
        assert_eq!(snapshot.models[1].category, "fan");
        assert_eq!(snapshot.tasks.live, 1);

        let json = serde_json::to_value(&snapshot).unwrap();
        assert_eq!(json["models"][0]["name"], "case");
    }
}
