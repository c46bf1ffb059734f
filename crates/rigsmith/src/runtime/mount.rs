//! # Mount Points — Where Parts Attach
//!
//! A mount point is a named slot on a model with one or more candidate
//! **locations**. Each location is a node in the host model plus the
//! compatibility a part must satisfy to sit there.
//!
//! ## Attach
//!
//! ```text
//!   attach(mount, part)
//!     1. mount disabled / part disposed      → None
//!     2. first location that is visible and
//!        accepts the part                    → none? None
//!     3. detach the current occupant         (non-recursive)
//!     4. detach the part from its old mount  (non-recursive)
//!     5. record the attachment on both sides
//!     6. transition on the part's root, after every task already on it:
//!          start: parent under the location, reset rotation, show
//!          motion: lift above rest → rest
//! ```
//!
//! The location is checked again once the part has been parented. If a
//! constraint hid it in the meantime the part leaves again at once.
//!
//! ## Detach
//!
//! The occupant is cleared immediately so lookups never see a stale
//! attachment. With `recursive`, everything attached to the occupant leaves
//! first and the occupant's own lift-off waits for those tasks. At the end of
//! the lift-off the part is unparented, reset, and hidden.
//!
//! The lift is [`Settings::lift`](crate::settings::Settings::lift) divided by
//! the location's world scale, so it looks the same at any model scale.

use super::{Action, Affinity, Assembly, ModelId, MountId, Tasks};
use crate::compat::Compatibility;
use crate::math::{Quat, Vec3};
use crate::scene::{NodeId, SceneGraph};
use crate::task::TaskId;

/// One candidate position of a mount point.
#[derive(Debug, Clone, PartialEq)]
pub struct Location {
    pub node: NodeId,
    /// What a part must be to sit here.
    pub compat: Compatibility,
}

/// A named attachment slot on a model.
#[derive(Debug)]
pub struct MountPoint {
    name: String,
    owner: ModelId,
    locations: Vec<Location>,
    /// Occupant and the index of the location it took.
    slot: Option<(ModelId, usize)>,
    pub(super) disabled: bool,
}

impl MountPoint {
    pub(super) fn new(name: String, owner: ModelId, locations: Vec<Location>) -> Self {
        Self {
            name,
            owner,
            locations,
            slot: None,
            disabled: false,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// The model exposing this mount point.
    pub fn owner(&self) -> ModelId {
        self.owner
    }

    pub fn locations(&self) -> &[Location] {
        &self.locations
    }

    pub fn occupant(&self) -> Option<ModelId> {
        self.slot.map(|(model, _)| model)
    }

    /// Index of the location the occupant took.
    pub fn occupied_location(&self) -> Option<usize> {
        self.slot.map(|(_, location)| location)
    }

    /// Disabled mount points refuse every attach. Disposal disables the
    /// mount points of the disposed model.
    pub fn is_disabled(&self) -> bool {
        self.disabled
    }
}

impl<S: SceneGraph> Assembly<S> {
    pub(super) fn check_point_availability(&self, mount: MountId, index: usize) -> bool {
        self.mounts
            .get(mount.index())
            .and_then(|mount| mount.locations.get(index))
            .is_some_and(|location| self.scene.is_enabled(location.node, true))
    }

    /// First visible location of `mount` that accepts `part`.
    fn find_location(&self, mount: MountId, part: &Compatibility) -> Option<usize> {
        let locations = &self.mounts.get(mount.index())?.locations;
        (0..locations.len()).find(|&index| {
            self.check_point_availability(mount, index) && locations[index].compat.is_compatible_with(part)
        })
    }

    pub(super) fn offers(&self, mount: MountId, part: &Compatibility) -> bool {
        self.mounts
            .get(mount.index())
            .is_some_and(|m| !m.disabled && self.find_location(mount, part).is_some())
    }

    /// Whether `model` sits somewhere below `host` in the attachment tree,
    /// or is `host` itself.
    fn carries(&self, model: ModelId, host: ModelId) -> bool {
        let mut current = Some(host);
        while let Some(id) = current {
            if id == model {
                return true;
            }
            current = self
                .model(id)
                .and_then(|m| m.mounted_at)
                .and_then(|mount| self.mounts.get(mount.index()))
                .map(MountPoint::owner);
        }
        false
    }

    pub(super) fn attach(&mut self, tasks: &mut Tasks, mount: MountId, model: ModelId, skip_animation: bool) -> Option<TaskId> {
        let mount_point = self.mounts.get(mount.index())?;
        if mount_point.disabled {
            log::debug!("{mount} is disabled, not attaching {model}");
            return None;
        }
        let owner = mount_point.owner;
        let part = self.model(model)?;
        if part.is_disposed() {
            log::debug!("{model} is disposed, not attaching it to {mount}");
            return None;
        }
        let root = part.root();
        if self.carries(model, owner) {
            log::debug!("{model} carries {owner}, not attaching it to {mount}");
            return None;
        }
        let compat = self.root_compat(model)?.clone();
        let Some(location) = self.find_location(mount, &compat) else {
            log::debug!("No available location of {mount} accepts {compat}");
            return None;
        };

        self.detach(tasks, mount, false, false);
        if let Some(previous) = self.model(model).and_then(|m| m.mounted_at) {
            self.detach(tasks, previous, false, false);
        }
        self.mounts[mount.index()].slot = Some((model, location));
        if let Some(part) = self.model_mut(model) {
            part.mounted_at = Some(mount);
        }

        let location_node = self.mounts[mount.index()].locations[location].node;
        let lift = self.lift_under(Some(location_node));
        let dependencies = tasks.collect_tasks_with_target(&Affinity::Node(root));
        let transition = self
            .settings
            .transition(Vec3::Y * lift, Vec3::ZERO)
            .on_start(Action::Place {
                mount,
                location,
                model,
            });
        let task = tasks.schedule_transition(Affinity::Node(root), &dependencies, transition);
        log::debug!("Attaching {model} at {mount}[{location}] as {task:?}");

        if skip_animation {
            tasks.force_finish(&[task], self);
        }
        Some(task)
    }

    /// Start of an attach transition: move the part's root under its location.
    pub(super) fn place_at_location(&mut self, tasks: &mut Tasks, mount: MountId, location: usize, model: ModelId) {
        let Some(root) = self.model(model).map(|m| m.root()) else {
            return;
        };
        let Some(node) = self
            .mounts
            .get(mount.index())
            .and_then(|m| m.locations.get(location))
            .map(|l| l.node)
        else {
            return;
        };

        self.scene.set_enabled(root, true);
        self.scene.set_parent(root, Some(node));
        self.scene.set_rotation(root, Quat::IDENTITY);

        let still_here = self.mounts[mount.index()].occupant() == Some(model);
        if still_here && !self.check_point_availability(mount, location) {
            log::debug!("{mount}[{location}] was hidden while {model} moved in, detaching");
            self.detach(tasks, mount, true, false);
        }
    }

    pub(super) fn detach(&mut self, tasks: &mut Tasks, mount: MountId, recursive: bool, skip_animation: bool) -> Option<(ModelId, TaskId)> {
        let mount_point = self.mounts.get_mut(mount.index())?;
        let (model, location) = mount_point.slot.take()?;
        let location_node = mount_point.locations.get(location).map(|l| l.node);

        let part = self.model_mut(model)?;
        if part.mounted_at == Some(mount) {
            part.mounted_at = None;
        }
        let root = part.root();
        let child_mounts = part.mounts.clone();

        let mut dependencies = tasks.collect_tasks_with_target(&Affinity::Node(root));
        if recursive {
            for child in child_mounts {
                if let Some((_, task)) = self.detach(tasks, child, true, false) {
                    dependencies.push(task);
                }
            }
        }

        let lift = self.lift_under(location_node);
        let transition = self
            .settings
            .transition(Vec3::ZERO, Vec3::Y * lift)
            .on_end(Action::Release { model });
        let task = tasks.schedule_transition(Affinity::Node(root), &dependencies, transition);
        log::debug!("Detaching {model} from {mount} as {task:?}");

        if skip_animation {
            tasks.force_finish(&[task], self);
        }
        Some((model, task))
    }

    /// Attach `model` to the first free mount point of `host` that offers a
    /// location for it.
    pub(super) fn attach_anywhere(&mut self, tasks: &mut Tasks, host: ModelId, model: ModelId, skip_animation: bool) -> Option<(MountId, TaskId)> {
        let compat = self.root_compat(model)?.clone();
        let mount = self.model(host)?.mounts.iter().copied().find(|&mount| {
            self.mounts
                .get(mount.index())
                .is_some_and(|m| m.slot.is_none())
                && self.offers(mount, &compat)
        })?;
        let task = self.attach(tasks, mount, model, skip_animation)?;
        Some((mount, task))
    }
}
