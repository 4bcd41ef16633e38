//! Drive a rigid body or a transform from six-axis motion data.
//!
//! Each fixed tick the active values source fills [`AxisValues`](axis::AxisValues).
//! The pose envelope maps them into a bounded [`PoseOffset`](envelope::PoseOffset).
//! The active motion target then moves its selected body toward that offset,
//! either directly (kinematic) or with impulses (force).
//!
//! ```rust,no_run
//! use bevy::prelude::*;
//! use bus_driver::prelude::*;
//!
//! App::new()
//!     .add_plugins(MinimalPlugins)
//!     .add_plugins(BusDriverPlugin::<TransformBackend>::default())
//!     .add_systems(Startup, |mut commands: MessageWriter<DriverCommand>| {
//!         commands.write(DriverCommand::SelectValuesSource("Udp".into()));
//!         commands.write(DriverCommand::SelectMotionTarget("Force".into()));
//!     })
//!     .run();
//! ```

pub mod axis;
pub mod backend;
pub mod config;
pub mod controller;
pub mod controls;
pub mod envelope;
pub mod scene;
pub mod source;
pub mod target;

use std::marker::PhantomData;
use std::path::PathBuf;

use bevy::prelude::*;

use crate::axis::AxisValues;
use crate::backend::MotionPhysicsBackend;
use crate::config::{ConfigStore, EnvelopeConfig};
use crate::controller::{BusDriver, DriverCommand};
use crate::envelope::PoseOffset;

/// Commonly used types.
pub mod prelude {
    pub use crate::axis::{AxisValues, DeviceAxis};
    pub use crate::backend::{
        BodyProperties, BodyState, ImpulseAccumulator, MotionPhysicsBackend, TransformBackend,
    };
    pub use crate::config::{ConfigStore, EnvelopeConfig, RangeAxis, UpDirection};
    pub use crate::controller::{BusDriver, DriverCommand};
    pub use crate::envelope::PoseOffset;
    pub use crate::scene::{Atom, ForceReceiver};
    pub use crate::target::{MotionTarget, MotionTargetKind, OriginPose};
    pub use crate::{BusDriverPlugin, BusDriverSet};

    #[cfg(feature = "avian3d")]
    pub use crate::backend::Avian3dBackend;
}

/// System sets of the per-tick pipeline, run in order in `FixedUpdate`.
#[derive(SystemSet, Debug, Clone, PartialEq, Eq, Hash)]
pub enum BusDriverSet {
    /// Read the values source.
    Input,
    /// Dispatch queued commands.
    Commands,
    /// Evaluate the pose envelope.
    Envelope,
    /// Actuate the motion target.
    Actuation,
}

/// Commands received since the last dispatch.
#[derive(Resource, Debug, Default)]
struct PendingCommands(Vec<DriverCommand>);

/// Plugin wiring the driver into the app for physics backend `B`.
pub struct BusDriverPlugin<B: MotionPhysicsBackend> {
    /// Directory for `default.json`. The default config is loaded from here
    /// at startup if present.
    pub config_dir: Option<PathBuf>,
    /// Initial envelope.
    pub envelope: EnvelopeConfig,
    _backend: PhantomData<B>,
}

impl<B: MotionPhysicsBackend> Default for BusDriverPlugin<B> {
    fn default() -> Self {
        Self {
            config_dir: None,
            envelope: EnvelopeConfig::default(),
            _backend: PhantomData,
        }
    }
}

impl<B: MotionPhysicsBackend> BusDriverPlugin<B> {
    pub fn with_config_dir(mut self, config_dir: impl Into<PathBuf>) -> Self {
        self.config_dir = Some(config_dir.into());
        self
    }

    pub fn with_envelope(mut self, envelope: EnvelopeConfig) -> Self {
        self.envelope = envelope;
        self
    }
}

impl<B: MotionPhysicsBackend> Plugin for BusDriverPlugin<B> {
    fn build(&self, app: &mut App) {
        app.add_plugins(B::plugin());

        app.register_type::<AxisValues>()
            .register_type::<EnvelopeConfig>()
            .register_type::<PoseOffset>()
            .register_type::<scene::Atom>()
            .register_type::<scene::ForceReceiver>();

        app.add_message::<DriverCommand>()
            .init_resource::<AxisValues>()
            .init_resource::<PoseOffset>()
            .init_resource::<PendingCommands>()
            .insert_resource(self.envelope)
            .insert_resource(BusDriver::new(self.config_dir.clone()));

        app.configure_sets(
            FixedUpdate,
            (
                BusDriverSet::Input,
                BusDriverSet::Commands,
                BusDriverSet::Envelope,
                BusDriverSet::Actuation,
            )
                .chain(),
        );

        app.add_systems(PostStartup, load_default_config::<B>);
        app.add_systems(
            FixedUpdate,
            (
                read_values_source.in_set(BusDriverSet::Input),
                (queue_driver_commands, dispatch_driver_commands::<B>)
                    .chain()
                    .in_set(BusDriverSet::Commands),
                evaluate_envelope.in_set(BusDriverSet::Envelope),
                actuate_motion_target::<B>.in_set(BusDriverSet::Actuation),
            ),
        );

        #[cfg(feature = "debug-draw")]
        app.add_systems(Update, draw_debug_frames);
    }
}

fn load_default_config<B: MotionPhysicsBackend>(world: &mut World) {
    let Some(path) = world
        .get_resource::<BusDriver>()
        .and_then(BusDriver::default_config_path)
        .filter(|path| path.exists())
    else {
        return;
    };
    match ConfigStore::load(&path) {
        Ok(store) => BusDriver::dispatch::<B>(world, DriverCommand::RestoreConfig(store)),
        Err(err) => warn!("bus driver: failed to load {}: {err}", path.display()),
    }
}

fn read_values_source(mut driver: ResMut<BusDriver>, mut values: ResMut<AxisValues>) {
    driver.update_values(&mut values);
}

fn queue_driver_commands(
    mut messages: MessageReader<DriverCommand>,
    mut pending: ResMut<PendingCommands>,
) {
    pending.0.extend(messages.read().cloned());
}

fn dispatch_driver_commands<B: MotionPhysicsBackend>(world: &mut World) {
    let commands = std::mem::take(&mut world.resource_mut::<PendingCommands>().0);
    for command in commands {
        BusDriver::dispatch::<B>(world, command);
    }
}

fn evaluate_envelope(
    values: Res<AxisValues>,
    config: Res<EnvelopeConfig>,
    mut offset: ResMut<PoseOffset>,
) {
    *offset = envelope::evaluate(&values, &config);
}

fn actuate_motion_target<B: MotionPhysicsBackend>(world: &mut World) {
    BusDriver::apply::<B>(world);
}

#[cfg(feature = "debug-draw")]
fn draw_debug_frames(driver: Res<BusDriver>, mut gizmos: Gizmos) {
    let Some(frames) = driver.debug_frames() else {
        return;
    };
    for (position, rotation) in [frames.current, frames.desired] {
        gizmos.axes(
            Transform::from_translation(position).with_rotation(rotation),
            0.1,
        );
    }
}
