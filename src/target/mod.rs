//! Motion targets: strategies that actuate a selected body every tick.
//!
//! Both strategies share the same selection flow. Picking an atom lists its
//! force receivers and clears the target. Picking a target resolves it by name
//! and captures its current pose as the origin. All later offsets are applied
//! relative to that origin.

mod force;
mod kinematic;

use bevy::prelude::*;

pub use force::{ForceActuation, ForceMotionTarget, alignment_error, torque_impulse};
pub use kinematic::KinematicMotionTarget;

use crate::backend::MotionPhysicsBackend;
use crate::config::ConfigStore;
use crate::controls::{Chooser, ControlKind, ControlRegistry};
use crate::envelope::PoseOffset;
use crate::scene::{self, NONE};

/// Reference frame captured from the target.
#[derive(Reflect, Debug, Clone, Copy, PartialEq)]
pub struct OriginPose {
    pub position: Vec3,
    pub rotation: Quat,
}

impl Default for OriginPose {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
        }
    }
}

impl OriginPose {
    pub fn new(position: Vec3, rotation: Quat) -> Self {
        Self { position, rotation }
    }

    /// World pose reached by applying `offset` in this frame.
    pub fn compose(&self, offset: &PoseOffset) -> (Vec3, Quat) {
        (
            self.position + self.rotation * offset.translation,
            self.rotation * offset.rotation,
        )
    }
}

/// Current and desired frames of the last actuated tick, for visualization.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DebugFrames {
    pub current: (Vec3, Quat),
    pub desired: (Vec3, Quat),
}

/// Atom and target selection shared by every motion target.
#[derive(Debug, Clone)]
pub struct TargetSelection {
    prefix: &'static str,
    atom_chooser: Chooser,
    target_chooser: Chooser,
    atom: Option<Entity>,
    target: Option<Entity>,
    origin: OriginPose,
}

impl TargetSelection {
    /// `prefix` namespaces the control ids and config keys.
    pub fn new(prefix: &'static str) -> Self {
        Self {
            prefix,
            atom_chooser: Chooser::empty(format!("{prefix}:Atom"), "Select Atom"),
            target_chooser: Chooser::empty(format!("{prefix}:Target"), "Select Target"),
            atom: None,
            target: None,
            origin: OriginPose::default(),
        }
    }

    pub fn atom_key(&self) -> &str {
        &self.atom_chooser.key
    }

    pub fn target_key(&self) -> &str {
        &self.target_chooser.key
    }

    pub fn capture_origin_id(&self) -> String {
        format!("{}:CaptureOrigin", self.prefix)
    }

    pub fn atom_chooser(&self) -> &Chooser {
        &self.atom_chooser
    }

    pub fn target_chooser(&self) -> &Chooser {
        &self.target_chooser
    }

    pub fn atom(&self) -> Option<Entity> {
        self.atom
    }

    pub fn target(&self) -> Option<Entity> {
        self.target
    }

    pub fn origin(&self) -> OriginPose {
        self.origin
    }

    /// Target entity if it is still alive.
    pub fn live_target(&self, world: &World) -> Option<Entity> {
        self.target.filter(|&t| world.get_entity(t).is_ok())
    }

    /// Rebuild the atom choices from the scene.
    pub fn refresh_atoms(&mut self, world: &mut World) {
        let mut choices = vec![NONE.to_owned()];
        choices.extend(scene::atom_names(world));
        if !choices.iter().any(|c| c == self.atom_chooser.value()) {
            self.atom_chooser.set_value(NONE);
        }
        self.atom_chooser.set_choices(choices);
    }

    /// Select the owning atom. Re-lists its force receivers and resets the
    /// target to "None".
    pub fn select_atom<B: MotionPhysicsBackend>(&mut self, world: &mut World, name: &str) {
        self.refresh_atoms(world);
        self.atom = if name == NONE {
            None
        } else {
            scene::find_atom(world, name)
        };
        self.atom_chooser
            .set_value(if self.atom.is_some() { name } else { NONE });
        debug!("{}: atom set to {}", self.prefix, self.atom_chooser.value());

        self.find_targets(world);
        self.select_target::<B>(world, NONE);
    }

    fn find_targets(&mut self, world: &World) {
        let mut choices = vec![NONE.to_owned()];
        if let Some(atom) = self.atom {
            choices.extend(scene::force_receiver_names(world, atom));
        }
        self.target_chooser.set_choices(choices);
    }

    /// Force receiver names of the current atom, re-queried from the scene.
    pub fn enumerate_targets(&mut self, world: &World) -> Vec<String> {
        if self.atom.is_some_and(|a| world.get_entity(a).is_err()) {
            self.atom = None;
            self.atom_chooser.set_value(NONE);
        }
        self.find_targets(world);
        self.target_chooser.choices().to_vec()
    }

    /// Select the target by name (case-insensitive) and capture its origin.
    /// Unknown names and "None" clear the target.
    pub fn select_target<B: MotionPhysicsBackend>(&mut self, world: &World, name: &str) {
        self.target = self
            .atom
            .filter(|_| name != NONE)
            .and_then(|atom| scene::resolve_force_receiver(world, atom, name));
        self.capture_origin::<B>(world);

        let value = self
            .target
            .and_then(|t| world.get::<Name>(t))
            .map_or_else(|| NONE.to_owned(), |n| n.as_str().to_owned());
        debug!("{}: target set to {value}", self.prefix);
        self.target_chooser.set_value(value);
    }

    /// Capture the live pose of the target as the origin. Without a target
    /// the origin falls back to the identity frame.
    pub fn capture_origin<B: MotionPhysicsBackend>(&mut self, world: &World) {
        self.origin = self
            .live_target(world)
            .and_then(|t| B::get_pose(world, t))
            .map(|(position, rotation)| OriginPose::new(position, rotation))
            .unwrap_or_default();
    }

    pub fn create_controls(&self, registry: &mut ControlRegistry) {
        registry.register(self.atom_key(), &self.atom_chooser.label, ControlKind::Chooser);
        registry.register(self.target_key(), &self.target_chooser.label, ControlKind::Chooser);
        registry.register(self.capture_origin_id(), "Capture Origin", ControlKind::Button);
    }

    pub fn destroy_controls(&self, registry: &mut ControlRegistry) {
        registry.destroy(self.atom_key());
        registry.destroy(self.target_key());
        registry.destroy(&self.capture_origin_id());
    }

    pub fn store_config(&self, store: &mut ConfigStore) {
        store.set(self.atom_key(), self.atom_chooser.value());
        store.set(self.target_key(), self.target_chooser.value());
    }

    /// Restore the atom then the target, running the normal selection logic.
    pub fn restore_config<B: MotionPhysicsBackend>(&mut self, world: &mut World, store: &ConfigStore) {
        if let Some(atom) = store.get(self.atom_key()).map(str::to_owned) {
            self.select_atom::<B>(world, &atom);
        }
        if let Some(target) = store.get(self.target_key()).map(str::to_owned) {
            self.select_target::<B>(world, &target);
        }
    }
}

/// Strategy that turns a pose offset into motion of the selected target.
///
/// Everything except [`MotionTarget::apply`] has a default built on the
/// shared [`TargetSelection`].
pub trait MotionTarget {
    /// Chooser label of this strategy.
    fn name(&self) -> &'static str;

    fn selection(&self) -> &TargetSelection;

    fn selection_mut(&mut self) -> &mut TargetSelection;

    /// Actuate the target once. A missing target is a silent no-op.
    fn apply<B: MotionPhysicsBackend>(&mut self, world: &mut World, offset: &PoseOffset);

    /// Frames of the last actuated tick.
    fn debug_frames(&self) -> Option<DebugFrames> {
        None
    }

    fn capture_origin<B: MotionPhysicsBackend>(&mut self, world: &World) {
        self.selection_mut().capture_origin::<B>(world);
    }

    fn enumerate_targets(&mut self, world: &World) -> Vec<String> {
        self.selection_mut().enumerate_targets(world)
    }

    fn select_atom<B: MotionPhysicsBackend>(&mut self, world: &mut World, name: &str) {
        self.selection_mut().select_atom::<B>(world, name);
    }

    fn select_target<B: MotionPhysicsBackend>(&mut self, world: &World, name: &str) {
        self.selection_mut().select_target::<B>(world, name);
    }

    fn create_controls(&self, registry: &mut ControlRegistry) {
        self.selection().create_controls(registry);
    }

    fn destroy_controls(&self, registry: &mut ControlRegistry) {
        self.selection().destroy_controls(registry);
    }

    fn store_config(&self, store: &mut ConfigStore) {
        self.selection().store_config(store);
    }

    fn restore_config<B: MotionPhysicsBackend>(&mut self, world: &mut World, store: &ConfigStore) {
        self.selection_mut().restore_config::<B>(world, store);
    }
}

/// The active motion target strategy.
#[derive(Debug, Clone)]
pub enum MotionTargetKind {
    Kinematic(KinematicMotionTarget),
    Force(ForceMotionTarget),
}

impl MotionTargetKind {
    /// Chooser choices, "None" first.
    pub const CHOICES: [&'static str; 3] = [NONE, KinematicMotionTarget::NAME, ForceMotionTarget::NAME];

    /// Construct the strategy for a chooser value. "None" and unknown names
    /// yield `None`.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            KinematicMotionTarget::NAME => Some(Self::Kinematic(KinematicMotionTarget::new())),
            ForceMotionTarget::NAME => Some(Self::Force(ForceMotionTarget::new())),
            _ => None,
        }
    }
}

impl MotionTarget for MotionTargetKind {
    fn name(&self) -> &'static str {
        match self {
            Self::Kinematic(t) => t.name(),
            Self::Force(t) => t.name(),
        }
    }

    fn selection(&self) -> &TargetSelection {
        match self {
            Self::Kinematic(t) => t.selection(),
            Self::Force(t) => t.selection(),
        }
    }

    fn selection_mut(&mut self) -> &mut TargetSelection {
        match self {
            Self::Kinematic(t) => t.selection_mut(),
            Self::Force(t) => t.selection_mut(),
        }
    }

    fn apply<B: MotionPhysicsBackend>(&mut self, world: &mut World, offset: &PoseOffset) {
        match self {
            Self::Kinematic(t) => t.apply::<B>(world, offset),
            Self::Force(t) => t.apply::<B>(world, offset),
        }
    }

    fn debug_frames(&self) -> Option<DebugFrames> {
        match self {
            Self::Kinematic(t) => t.debug_frames(),
            Self::Force(t) => t.debug_frames(),
        }
    }
}
