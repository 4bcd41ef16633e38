//! Kinematic motion target: places the target directly, without dynamics.

use bevy::prelude::*;

use super::{DebugFrames, MotionTarget, TargetSelection};
use crate::backend::MotionPhysicsBackend;
use crate::envelope::PoseOffset;

/// Moves the target's pose straight to the origin composed with the offset.
#[derive(Debug, Clone)]
pub struct KinematicMotionTarget {
    selection: TargetSelection,
    last_frames: Option<DebugFrames>,
}

impl Default for KinematicMotionTarget {
    fn default() -> Self {
        Self::new()
    }
}

impl KinematicMotionTarget {
    pub const NAME: &'static str = "Physics Link";

    pub fn new() -> Self {
        Self {
            selection: TargetSelection::new("MotionTarget:PhysicsLink"),
            last_frames: None,
        }
    }
}

impl MotionTarget for KinematicMotionTarget {
    fn name(&self) -> &'static str {
        Self::NAME
    }

    fn selection(&self) -> &TargetSelection {
        &self.selection
    }

    fn selection_mut(&mut self) -> &mut TargetSelection {
        &mut self.selection
    }

    fn apply<B: MotionPhysicsBackend>(&mut self, world: &mut World, offset: &PoseOffset) {
        self.last_frames = None;
        let Some(target) = self.selection.live_target(world) else {
            return;
        };
        if !offset.is_finite() {
            return;
        }
        let Some(current) = B::get_pose(world, target) else {
            return;
        };

        let (position, rotation) = self.selection.origin().compose(offset);
        B::set_pose(world, target, position, rotation);

        self.last_frames = Some(DebugFrames {
            current,
            desired: (position, rotation),
        });
    }

    fn debug_frames(&self) -> Option<DebugFrames> {
        self.last_frames
    }
}
