//! # Models — Parts, Prototypes, and Instances
//!
//! A [`Model`] is one physical part in the scene: a root node plus the mount
//! points, toggle groups and spin animations declared by its asset.
//!
//! ## Prototypes and instances
//!
//! The first load of a source is its **prototype**. Later uses of the same
//! part are **instances**: independent clones of the prototype's node tree
//! with their own mount points and toggle groups.
//!
//! ```text
//!   prototype (fan.json) ── instances: [fan#2, fan#3]
//!        ▲                        │
//!        └──── prototype ─────────┘
//! ```
//!
//! Cloning walks the prototype's tree with an explicit stack. Parts attached
//! to the prototype are not copied: attachment is a runtime relationship, not
//! part of the static shape.
//!
//! ## Disposal
//!
//! ```text
//!   dispose(model)
//!     ├─ early listeners        (bookkeeping leaves first)
//!     ├─ detach from its mount  (recursive)
//!     ├─ detach + disable own mounts
//!     └─ Finalize task          (runs after every detach above)
//!           ├─ prototype, instances alive → hide, wait for last instance
//!           ├─ prototype, no instances    → dispose listeners, destroy
//!           └─ instance                   → dispose listeners, destroy,
//!                                           release a waiting prototype
//! ```
//!
//! A prototype is torn down at most once, no matter which path reaches it.

use std::collections::{HashMap, HashSet};
use std::fmt;

use super::mount::{Location, MountPoint};
use super::toggle::ToggleGroup;
use super::{Action, Affinity, Assembly, ModelId, MountId, Tasks, ToggleId};
use crate::animation::SpinAnimation;
use crate::compat::{Category, Compatibility};
use crate::loader::Prepared;
use crate::scene::{NodeId, SceneGraph};
use crate::task::TaskId;

pub(crate) type Listener = Box<dyn FnOnce(ModelId)>;

/// Per-record metadata shared by every node tagged with the record.
#[derive(Debug, Clone)]
pub(crate) struct NodeInfo {
    /// Set on component roots.
    pub(super) root: Option<Compatibility>,
    /// Set when the record declares mount locations.
    pub(super) mount: Option<MountId>,
    /// Nodes hidden while a member of this record is hidden.
    pub(super) constraints: Vec<NodeId>,
}

/// One part in the scene.
pub struct Model {
    id: ModelId,
    source: String,
    name: String,
    category: Category,
    root: NodeId,
    pub(super) mounts: Vec<MountId>,
    pub(super) toggles: Vec<ToggleId>,
    animations: Vec<SpinAnimation>,
    pub(super) mounted_at: Option<MountId>,
    prototype: Option<ModelId>,
    /// Outstanding instances; only a prototype has any.
    instances: Vec<ModelId>,
    disposed: bool,
    pending_disposal: bool,
    finalized: bool,
    pub(super) early_listeners: Vec<Listener>,
    pub(super) dispose_listeners: Vec<Listener>,
}

impl Model {
    fn new(id: ModelId, source: &str, name: &str, category: Category, root: NodeId) -> Self {
        Self {
            id,
            source: source.to_string(),
            name: name.to_string(),
            category,
            root,
            mounts: Vec::new(),
            toggles: Vec::new(),
            animations: Vec::new(),
            mounted_at: None,
            prototype: None,
            instances: Vec::new(),
            disposed: false,
            pending_disposal: false,
            finalized: false,
            early_listeners: Vec::new(),
            dispose_listeners: Vec::new(),
        }
    }

    pub fn id(&self) -> ModelId {
        self.id
    }

    /// The source identifier the model was loaded from.
    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn mounts(&self) -> &[MountId] {
        &self.mounts
    }

    pub fn toggles(&self) -> &[ToggleId] {
        &self.toggles
    }

    pub fn animations(&self) -> &[SpinAnimation] {
        &self.animations
    }

    pub(super) fn animations_mut(&mut self) -> &mut [SpinAnimation] {
        &mut self.animations
    }

    /// The mount point this model currently occupies.
    pub fn mounted_at(&self) -> Option<MountId> {
        self.mounted_at
    }

    /// The prototype this model was cloned from.
    pub fn prototype(&self) -> Option<ModelId> {
        self.prototype
    }

    pub fn instances(&self) -> &[ModelId] {
        &self.instances
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// A disposed prototype still waiting for its instances.
    pub fn is_pending_disposal(&self) -> bool {
        self.pending_disposal
    }
}

impl fmt::Debug for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Model")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("category", &self.category)
            .field("root", &self.root)
            .field("mounted_at", &self.mounted_at)
            .field("prototype", &self.prototype)
            .field("disposed", &self.disposed)
            .finish_non_exhaustive()
    }
}

impl<S: SceneGraph> Assembly<S> {
    pub(super) fn root_compat(&self, model: ModelId) -> Option<&Compatibility> {
        self.info(self.model(model)?.root)?.root.as_ref()
    }

    fn next_model_id(&self) -> ModelId {
        ModelId(self.models.len() as u32)
    }

    fn push_mount(&mut self, owner: ModelId, name: String, locations: Vec<Location>) -> MountId {
        let id = MountId(self.mounts.len() as u32);
        for location in &locations {
            let Some(&index) = self.tags.get(&location.node) else { continue };
            if let Some(info) = self.infos.get_mut(&index) {
                info.mount = Some(id);
            }
        }
        self.mounts.push(MountPoint::new(name, owner, locations));
        id
    }

    fn push_toggle(&mut self, owner: ModelId, name: String, members: Vec<NodeId>) -> ToggleId {
        let id = ToggleId(self.toggles.len() as u32);
        self.toggles.push(ToggleGroup::new(name, owner, members));
        id
    }

    // ── Registration ─────────────────────────────────────────────────────

    /// Turn a prepared asset into a prototype model.
    pub(super) fn register(&mut self, source: &str, prepared: Prepared) -> ModelId {
        let Prepared {
            root,
            name,
            compat,
            decoded,
        } = prepared;
        let id = self.next_model_id();
        let mut model = Model::new(id, source, &name, compat.category(), root);

        let first_info = self.next_info;
        self.next_info += decoded.records.len();
        self.infos.extend(decoded.records.iter().enumerate().map(|(index, record)| {
            let info = NodeInfo {
                root: record.root.clone(),
                mount: None,
                constraints: record.constraints.clone(),
            };
            (first_info + index, info)
        }));
        for &(node, index) in &decoded.tags {
            self.tags.insert(node, first_info + index);
        }

        for record in decoded.records {
            if !record.locations.is_empty() {
                let locations = record
                    .locations
                    .into_iter()
                    .map(|(node, compat)| Location { node, compat })
                    .collect();
                model.mounts.push(self.push_mount(id, record.name.clone(), locations));
            }
            if !record.members.is_empty() {
                model.toggles.push(self.push_toggle(id, record.name.clone(), record.members));
            }
            if let Some((node, animation)) = record.animation {
                let initial = self.scene.rotation(node);
                model
                    .animations
                    .push(SpinAnimation::new(node, animation, self.settings.spin_speed, initial));
            }
        }

        log::debug!(
            "Loaded {id} `{name}` from {source}: {} mount points, {} toggle groups",
            model.mounts.len(),
            model.toggles.len()
        );
        self.models.push(model);
        self.prototypes.insert(source.to_string(), id);
        self.live.push(id);
        id
    }

    // ── Instancing ───────────────────────────────────────────────────────

    /// Clone `source`'s static shape into a new model named `name`.
    pub(super) fn create_instance(&mut self, source: ModelId, name: &str) -> Option<ModelId> {
        let original = self.model(source)?;
        if original.disposed {
            log::debug!("Not instancing disposed {source}");
            return None;
        }
        let source_root = original.root;
        let prototype = original.prototype.unwrap_or(source);
        let category = original.category;
        let source_name = original.source.clone();

        let root = self.scene.clone_node(source_root, None)?;
        self.scene.set_enabled(root, false);
        let world_scale = self.scene.world_scale(source_root);
        self.scene.set_scale(root, world_scale);

        let mut node_map = HashMap::from([(source_root, root)]);
        let mut info_map = HashMap::new();
        self.copy_tag(source_root, root, &mut info_map);

        let mut visited = HashSet::from([source_root]);
        let mut stack = vec![(source_root, root)];
        while let Some((original, copy)) = stack.pop() {
            for child in self.scene.children(original) {
                if self.info(child).is_some_and(|info| info.root.is_some()) {
                    continue;
                }
                if !visited.insert(child) {
                    log::warn!("Circular reference at node {child} while cloning {source}, skipping it");
                    continue;
                }
                let Some(cloned) = self.scene.clone_node(child, Some(copy)) else {
                    continue;
                };
                self.copy_tag(child, cloned, &mut info_map);
                node_map.insert(child, cloned);
                stack.push((child, cloned));
            }
        }

        for (&old, &new) in &info_map {
            let constraints = self.infos.get(&old).map_or_else(Vec::new, |info| {
                info.constraints
                    .iter()
                    .filter_map(|node| node_map.get(node).copied())
                    .collect()
            });
            if let Some(info) = self.infos.get_mut(&new) {
                info.constraints = constraints;
                info.mount = None;
            }
        }

        let id = self.next_model_id();
        let mut model = Model::new(id, &source_name, name, category, root);
        model.prototype = Some(prototype);

        let (mount_specs, toggle_specs, animations) = {
            let original = self.model(source)?;
            let mounts: Vec<(String, Vec<Location>)> = original
                .mounts
                .iter()
                .filter_map(|mount| self.mounts.get(mount.index()))
                .map(|mount| {
                    let locations = mount
                        .locations()
                        .iter()
                        .filter_map(|location| {
                            Some(Location {
                                node: *node_map.get(&location.node)?,
                                compat: location.compat.clone(),
                            })
                        })
                        .collect();
                    (mount.name().to_string(), locations)
                })
                .collect();
            let toggles: Vec<(String, Vec<NodeId>)> = original
                .toggles
                .iter()
                .filter_map(|toggle| self.toggles.get(toggle.index()))
                .map(|toggle| {
                    let members = toggle
                        .members()
                        .iter()
                        .filter_map(|member| node_map.get(member).copied())
                        .collect();
                    (toggle.name().to_string(), members)
                })
                .collect();
            let animations: Vec<SpinAnimation> = original
                .animations
                .iter()
                .filter_map(|spin| {
                    let target = *node_map.get(&spin.target())?;
                    Some(spin.rebind(target, self.scene.rotation(target)))
                })
                .collect();
            (mounts, toggles, animations)
        };

        for (mount_name, locations) in mount_specs {
            if !locations.is_empty() {
                model.mounts.push(self.push_mount(id, mount_name, locations));
            }
        }
        for (toggle_name, members) in toggle_specs {
            if !members.is_empty() {
                model.toggles.push(self.push_toggle(id, toggle_name, members));
            }
        }
        model.animations = animations;

        self.models.push(model);
        if let Some(prototype) = self.model_mut(prototype) {
            prototype.instances.push(id);
        }
        self.live.push(id);
        log::debug!("Instanced {id} `{name}` from {prototype}");
        Some(id)
    }

    /// Give `cloned` a copy of `original`'s record. Each record is copied once
    /// per instance; later nodes of the same record share the copy.
    fn copy_tag(&mut self, original: NodeId, cloned: NodeId, info_map: &mut HashMap<usize, usize>) {
        let Some(&old) = self.tags.get(&original) else { return };
        let new = match info_map.get(&old) {
            Some(&new) => new,
            None => {
                let Some(info) = self.infos.get(&old).cloned() else { return };
                let new = self.next_info;
                self.next_info += 1;
                self.infos.insert(new, info);
                info_map.insert(old, new);
                new
            }
        };
        self.tags.insert(cloned, new);
    }

    // ── Disposal ─────────────────────────────────────────────────────────

    pub(super) fn dispose(&mut self, tasks: &mut Tasks, id: ModelId, skip_animation: bool) -> Option<TaskId> {
        let model = self.model_mut(id)?;
        if model.disposed {
            return None;
        }
        model.disposed = true;
        let early = std::mem::take(&mut model.early_listeners);
        let mounted_at = model.mounted_at;
        let own_mounts = model.mounts.clone();

        self.live.retain(|&live| live != id);
        self.prototypes.retain(|_, prototype| *prototype != id);
        if self.base == Some(id) {
            self.base = None;
            self.notify_base_changed();
        }
        for listener in early {
            listener(id);
        }

        let mut dependencies = Vec::new();
        if let Some(mount) = mounted_at {
            if let Some((_, task)) = self.detach(tasks, mount, true, false) {
                dependencies.push(task);
            }
        }
        for mount in own_mounts {
            if let Some((_, task)) = self.detach(tasks, mount, true, false) {
                dependencies.push(task);
            }
            if let Some(mount) = self.mounts.get_mut(mount.index()) {
                mount.disabled = true;
            }
        }

        log::debug!("Disposing {id} after {} detach tasks", dependencies.len());
        let task = tasks.schedule_instant(Affinity::Model(id), &dependencies, Action::Finalize(id), self);
        if skip_animation {
            tasks.force_finish(&[task], self);
        }
        Some(task)
    }

    pub(super) fn finalize(&mut self, id: ModelId) {
        let Some(model) = self.model(id) else { return };
        let (prototype, outstanding, root) = (model.prototype, model.instances.len(), model.root);
        match prototype {
            None if outstanding == 0 => self.tear_down(id, true),
            None => {
                log::debug!("{id} waits for {outstanding} instances before teardown");
                if let Some(model) = self.model_mut(id) {
                    model.pending_disposal = true;
                }
                self.scene.set_enabled(root, false);
            }
            Some(prototype) => {
                if let Some(prototype) = self.model_mut(prototype) {
                    prototype.instances.retain(|&instance| instance != id);
                }
                self.tear_down(id, false);
                let release = self
                    .model(prototype)
                    .is_some_and(|p| p.pending_disposal && p.instances.is_empty());
                if release {
                    self.tear_down(prototype, true);
                }
            }
        }
    }

    /// Notify dispose listeners and destroy the model's nodes. Runs once.
    fn tear_down(&mut self, id: ModelId, release_shared: bool) {
        let Some(model) = self.model_mut(id) else { return };
        if model.finalized {
            return;
        }
        model.finalized = true;
        let root = model.root;
        let listeners = std::mem::take(&mut model.dispose_listeners);
        for listener in listeners {
            listener(id);
        }

        self.scene.dispose(root, release_shared);
        let scene = &self.scene;
        self.counters.retain(|node, _| scene.is_alive(*node));
        self.tags.retain(|node, _| scene.is_alive(*node));
        let referenced: HashSet<usize> = self.tags.values().copied().collect();
        self.infos.retain(|index, _| referenced.contains(index));
        log::debug!("Tore down {id}");
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::rc::Rc;

    use crate::loader::JsonLoader;
    use crate::math::{Aabb, Quat, Vec3};
    use crate::runtime::{ModelId, Runtime};
    use crate::scene::{NodeId, Scene, SceneGraph};

    const FAN: &str = r#"{ "nodes": [
        { "name": "Light" },
        { "name": "rc\"fan,120\":fan", "scale": [2.0, 2.0, 2.0], "children": [
            { "name": "frame", "bounds": { "min": [-0.06, -0.06, -0.01], "max": [0.06, 0.06, 0.01] } },
            { "name": "anim\"rotate\":rotor" }
        ] }
    ] }"#;

    const CASE: &str = r#"{ "nodes": [ { "name": "rc\"case\":case", "children": [
        { "name": "mount_point,c\"fan,120\":fan_mp" },
        { "name": "toggle,d\"fan_mp\":panel" }
    ] } ] }"#;

    fn loader() -> JsonLoader {
        JsonLoader::new()
            .with_document("fan", FAN)
            .with_document("case", CASE)
    }

    fn counter() -> (Rc<Cell<u32>>, impl FnOnce(ModelId) + 'static) {
        let count = Rc::new(Cell::new(0));
        let handle = Rc::clone(&count);
        (count, move |_| handle.set(handle.get() + 1))
    }

    /// A scene whose `children` reports one extra, cyclic edge.
    struct CyclicScene {
        inner: Scene,
        back_edge: Option<(NodeId, NodeId)>,
    }

    impl SceneGraph for CyclicScene {
        fn create_node(&mut self, name: &str) -> NodeId {
            self.inner.create_node(name)
        }
        fn clone_node(&mut self, node: NodeId, parent: Option<NodeId>) -> Option<NodeId> {
            self.inner.clone_node(node, parent)
        }
        fn is_alive(&self, node: NodeId) -> bool {
            self.inner.is_alive(node)
        }
        fn name(&self, node: NodeId) -> Option<&str> {
            self.inner.name(node)
        }
        fn parent(&self, node: NodeId) -> Option<NodeId> {
            self.inner.parent(node)
        }
        fn children(&self, node: NodeId) -> Vec<NodeId> {
            let mut children = self.inner.children(node);
            if let Some((from, to)) = self.back_edge {
                if from == node {
                    children.push(to);
                }
            }
            children
        }
        fn set_parent(&mut self, node: NodeId, parent: Option<NodeId>) {
            self.inner.set_parent(node, parent)
        }
        fn set_enabled(&mut self, node: NodeId, enabled: bool) {
            self.inner.set_enabled(node, enabled)
        }
        fn is_enabled(&self, node: NodeId, recursive: bool) -> bool {
            self.inner.is_enabled(node, recursive)
        }
        fn position(&self, node: NodeId) -> Vec3 {
            self.inner.position(node)
        }
        fn set_position(&mut self, node: NodeId, position: Vec3) {
            self.inner.set_position(node, position)
        }
        fn rotation(&self, node: NodeId) -> Quat {
            self.inner.rotation(node)
        }
        fn set_rotation(&mut self, node: NodeId, rotation: Quat) {
            self.inner.set_rotation(node, rotation)
        }
        fn scale(&self, node: NodeId) -> Vec3 {
            self.inner.scale(node)
        }
        fn set_scale(&mut self, node: NodeId, scale: Vec3) {
            self.inner.set_scale(node, scale)
        }
        fn world_scale(&self, node: NodeId) -> Vec3 {
            self.inner.world_scale(node)
        }
        fn set_local_bounds(&mut self, node: NodeId, bounds: Aabb) {
            self.inner.set_local_bounds(node, bounds)
        }
        fn dispose(&mut self, node: NodeId, release_shared: bool) {
            self.inner.dispose(node, release_shared)
        }
        fn world_bounds(&self, nodes: &[NodeId]) -> Option<Aabb> {
            self.inner.world_bounds(nodes)
        }
    }

    #[test]
    fn register_drops_foreign_nodes_and_reads_records() {
        let mut runtime = Runtime::new(Scene::new());
        let fan = runtime.add_model(&mut loader(), "fan").unwrap();

        let model = runtime.model(fan).unwrap();
        assert_eq!(model.name(), "fan");
        assert_eq!(model.source(), "fan");
        assert_eq!(model.animations().len(), 1);
        assert_eq!(model.animations()[0].name(), "rotor_rotate");
        assert_eq!(runtime.scene().node_count(), 3);
        assert!(!runtime.scene().is_enabled(model.root(), false));
    }

    #[test]
    fn second_load_is_an_instance_of_the_first() {
        let mut loader = loader();
        let mut runtime = Runtime::new(Scene::new());
        let prototype = runtime.add_model(&mut loader, "fan").unwrap();
        let instance = runtime.add_model(&mut loader, "fan").unwrap();

        assert_eq!(runtime.model(instance).unwrap().prototype(), Some(prototype));
        assert_eq!(runtime.model(prototype).unwrap().instances(), &[instance]);
        assert_eq!(runtime.scene().node_count(), 6);

        let proto_root = runtime.model(prototype).unwrap().root();
        let root = runtime.model(instance).unwrap().root();
        assert_ne!(root, proto_root);
        assert_eq!(runtime.scene().scale(root), Vec3::splat(2.0));
        assert!(!runtime.scene().is_enabled(root, false));

        let proto_spin = runtime.model(prototype).unwrap().animations()[0].target();
        let spin = runtime.model(instance).unwrap().animations()[0].target();
        assert_ne!(spin, proto_spin);
        assert_eq!(runtime.scene().parent(spin), Some(root));
    }

    #[test]
    fn instancing_an_instance_points_at_the_prototype() {
        let mut loader = loader();
        let mut runtime = Runtime::new(Scene::new());
        let prototype = runtime.add_model(&mut loader, "fan").unwrap();
        let first = runtime.add_model(&mut loader, "fan").unwrap();

        let second = runtime.create_instance(first, "spare fan").unwrap();

        assert_eq!(runtime.model(second).unwrap().prototype(), Some(prototype));
        assert_eq!(runtime.model(second).unwrap().name(), "spare fan");
        assert_eq!(runtime.model(prototype).unwrap().instances(), &[first, second]);
    }

    #[test]
    fn instances_get_their_own_mounts_and_toggles() {
        let mut loader = loader();
        let mut runtime = Runtime::new(Scene::new());
        let prototype = runtime.add_model(&mut loader, "case").unwrap();
        let instance = runtime.add_model(&mut loader, "case").unwrap();

        let proto_mount = runtime.model(prototype).unwrap().mounts()[0];
        let mount = runtime.model(instance).unwrap().mounts()[0];
        assert_ne!(mount, proto_mount);
        assert_eq!(runtime.mount(mount).unwrap().owner(), instance);
        assert_eq!(runtime.mount(mount).unwrap().name(), "fan_mp");
        assert_ne!(
            runtime.mount(mount).unwrap().locations()[0].node,
            runtime.mount(proto_mount).unwrap().locations()[0].node
        );

        // Hiding the instance's panel must not touch the prototype's nodes.
        let toggle = runtime.model(instance).unwrap().toggles()[0];
        let proto_toggle = runtime.model(prototype).unwrap().toggles()[0];
        let tasks = runtime.set_toggle_enabled(toggle, false);
        runtime.force_finish(&tasks);
        let proto_panel = runtime.toggle(proto_toggle).unwrap().members()[0];
        assert!(runtime.scene().is_enabled(proto_panel, false));
        assert!(runtime.toggle(proto_toggle).unwrap().is_enabled());
    }

    #[test]
    fn attached_parts_are_not_cloned() {
        let mut loader = loader();
        let mut runtime = Runtime::new(Scene::new());
        let case = runtime.add_model(&mut loader, "case").unwrap();
        runtime.set_base_model(Some(case));
        let fan = runtime.add_model(&mut loader, "fan").unwrap();
        runtime.attach_anywhere(case, fan, true).unwrap();
        let before = runtime.scene().node_count();

        let copy = runtime.create_instance(case, "case copy").unwrap();

        assert_eq!(runtime.scene().node_count(), before + 3);
        let copy_mount = runtime.model(copy).unwrap().mounts()[0];
        assert_eq!(runtime.mount(copy_mount).unwrap().occupant(), None);
    }

    #[test]
    fn cloning_survives_a_cyclic_reference() {
        let scene = CyclicScene {
            inner: Scene::new(),
            back_edge: None,
        };
        let mut runtime = Runtime::new(scene);
        let fan = runtime.add_model(&mut loader(), "fan").unwrap();
        let root = runtime.model(fan).unwrap().root();
        let rotor = runtime.model(fan).unwrap().animations()[0].target();
        let frame = runtime
            .scene()
            .inner
            .children(root)
            .into_iter()
            .find(|&child| runtime.scene().name(child) == Some("frame"))
            .unwrap();
        // `frame` is a plain node, so only the visited set stops the walk.
        runtime.scene_mut().back_edge = Some((rotor, frame));
        assert!(runtime.scene().children(rotor).contains(&frame));

        let copy = runtime.create_instance(fan, "fan copy").unwrap();

        // Three new nodes; a second clone of `frame` would make it seven.
        assert_eq!(runtime.scene().inner.node_count(), 6);
        let copy_root = runtime.model(copy).unwrap().root();
        assert_eq!(runtime.scene().inner.children(copy_root).len(), 2);
        let copy_rotor = runtime.model(copy).unwrap().animations()[0].target();
        assert!(runtime.scene().inner.children(copy_rotor).is_empty());
    }

    #[test]
    fn disposing_the_last_instance_finalizes_the_prototype_once() {
        let mut loader = loader();
        let mut runtime = Runtime::new(Scene::new());
        let prototype = runtime.add_model(&mut loader, "fan").unwrap();
        let first = runtime.add_model(&mut loader, "fan").unwrap();
        let second = runtime.add_model(&mut loader, "fan").unwrap();
        let (torn_down, listener) = counter();
        runtime.on_dispose(prototype, listener);

        runtime.dispose(prototype, true).unwrap();
        assert!(runtime.model(prototype).unwrap().is_pending_disposal());
        assert_eq!(torn_down.get(), 0);
        assert_eq!(runtime.scene().node_count(), 9);
        assert!(runtime.dispose(prototype, true).is_none());

        runtime.dispose(first, true).unwrap();
        assert_eq!(torn_down.get(), 0);
        assert_eq!(runtime.scene().node_count(), 6);

        runtime.dispose(second, true).unwrap();
        assert_eq!(torn_down.get(), 1);
        assert_eq!(runtime.scene().node_count(), 0);
        assert_eq!(runtime.scene().released_shared_count(), 1);
        assert!(runtime.models().is_empty());
    }

    #[test]
    fn torn_down_instances_release_their_records() {
        let mut loader = loader();
        let mut runtime = Runtime::new(Scene::new());
        let prototype = runtime.add_model(&mut loader, "case").unwrap();
        let records = runtime.assembly.infos.len();

        let instance = runtime.add_model(&mut loader, "case").unwrap();
        assert_eq!(runtime.assembly.infos.len(), 2 * records);

        runtime.dispose(instance, true).unwrap();
        assert_eq!(runtime.assembly.infos.len(), records);
        let mount = runtime.model(prototype).unwrap().mounts()[0];
        let location = runtime.mount(mount).unwrap().locations()[0].node;
        assert!(runtime.assembly.info(location).is_some_and(|info| info.mount == Some(mount)));
    }

    #[test]
    fn disposed_prototype_leaves_the_cache() {
        let mut loader = loader();
        let mut runtime = Runtime::new(Scene::new());
        let prototype = runtime.add_model(&mut loader, "fan").unwrap();
        runtime.dispose(prototype, true);

        let fresh = runtime.add_model(&mut loader, "fan").unwrap();

        assert_ne!(fresh, prototype);
        assert_eq!(runtime.model(fresh).unwrap().prototype(), None);
        assert!(runtime.create_instance(prototype, "late").is_none());
    }

    #[test]
    fn early_listeners_fire_before_teardown() {
        let mut loader = loader();
        let mut runtime = Runtime::new(Scene::new());
        let case = runtime.add_model(&mut loader, "case").unwrap();
        runtime.set_base_model(Some(case));
        let fan = runtime.add_model(&mut loader, "fan").unwrap();
        let (mount, _) = runtime.attach_anywhere(case, fan, true).unwrap();
        let (early, early_listener) = counter();
        let (late, late_listener) = counter();
        runtime.on_dispose_early(fan, early_listener);
        runtime.on_dispose(fan, late_listener);

        runtime.dispose(fan, false).unwrap();

        assert_eq!((early.get(), late.get()), (1, 0));
        assert!(!runtime.models().contains(&fan));
        assert_eq!(runtime.mount(mount).unwrap().occupant(), None);
        for _ in 0..30 {
            runtime.update(0.1);
        }
        assert_eq!((early.get(), late.get()), (1, 1));
        assert!(runtime.model(fan).unwrap().is_disposed());
    }

    #[test]
    fn disposing_a_host_releases_and_disables_its_mounts() {
        let mut loader = loader();
        let mut runtime = Runtime::new(Scene::new());
        let case = runtime.add_model(&mut loader, "case").unwrap();
        runtime.set_base_model(Some(case));
        let fan = runtime.add_model(&mut loader, "fan").unwrap();
        let (mount, _) = runtime.attach_anywhere(case, fan, true).unwrap();

        runtime.dispose(case, true).unwrap();

        assert_eq!(runtime.base_model(), None);
        assert!(runtime.mount(mount).unwrap().is_disabled());
        assert_eq!(runtime.model(fan).unwrap().mounted_at(), None);
        let fan_root = runtime.model(fan).unwrap().root();
        assert!(runtime.scene().is_alive(fan_root));
        assert_eq!(runtime.scene().parent(fan_root), None);
        assert!(runtime.attach(mount, fan, true).is_none());
    }
}
