//! Top-level controller: owns the active values source and motion target and
//! dispatches [`DriverCommand`]s against them.
//!
//! Every user action arrives as a command, so the selection flow can be
//! driven from any UI layer, from a config file, or from a test with a bare
//! [`World`].

use std::path::{Path, PathBuf};

use bevy::prelude::*;

use crate::axis::AxisValues;
use crate::backend::MotionPhysicsBackend;
use crate::config::{ConfigError, ConfigStore, EnvelopeConfig, RangeAxis, UpDirection};
use crate::controls::{Chooser, ControlKind, ControlRegistry};
use crate::envelope::PoseOffset;
use crate::scene::NONE;
use crate::source::{SourceSettings, ValuesSource, ValuesSourceKind};
use crate::target::{DebugFrames, MotionTarget, MotionTargetKind};

/// A user action against the driver.
#[derive(Message, Debug, Clone, PartialEq)]
pub enum DriverCommand {
    /// Switch the values source ("None" or "Udp").
    SelectValuesSource(String),
    /// Switch the motion target ("None", "Physics Link" or "Force").
    SelectMotionTarget(String),
    /// Select the atom of the active motion target.
    SelectAtom(String),
    /// Select the target body of the active motion target.
    SelectTarget(String),
    /// Re-capture the origin of the active motion target.
    CaptureOrigin,
    /// Re-list atoms and targets of the active motion target.
    RefreshTargets,
    SetUpDirection(UpDirection),
    SetRange(RangeAxis, f32),
    /// Change the UDP port, rebinding the source if it is active.
    SetUdpPort(u16),
    SetDebugDraw(bool),
    /// Apply a settings snapshot, re-running selection logic.
    RestoreConfig(ConfigStore),
    SaveConfig(PathBuf),
    LoadConfig(PathBuf),
    /// Save to `default.json` in the config directory.
    SaveDefaultConfig,
}

/// Owner of the active strategies and their controls.
#[derive(Resource, Debug)]
pub struct BusDriver {
    values_source_chooser: Chooser,
    motion_target_chooser: Chooser,
    values_source: Option<ValuesSourceKind>,
    motion_target: Option<MotionTargetKind>,
    source_settings: SourceSettings,
    controls: ControlRegistry,
    debug_draw: bool,
    report: String,
    config_dir: Option<PathBuf>,
}

impl Default for BusDriver {
    fn default() -> Self {
        Self::new(None)
    }
}

impl BusDriver {
    pub const VALUES_SOURCE_KEY: &'static str = "Plugin:ValuesSource";
    pub const MOTION_TARGET_KEY: &'static str = "Plugin:MotionTarget";
    pub const DEBUG_DRAW_KEY: &'static str = "Plugin:DebugDrawEnable";
    pub const DEFAULT_CONFIG_FILE: &'static str = "default.json";

    pub fn new(config_dir: Option<PathBuf>) -> Self {
        let mut controls = ControlRegistry::default();
        controls.register(Self::DEBUG_DRAW_KEY, "Enable Debug", ControlKind::Toggle);
        controls.register(EnvelopeConfig::UP_DIRECTION_KEY, "Up Direction", ControlKind::Chooser);
        for axis in RangeAxis::ALL {
            controls.register(axis.config_key(), range_label(axis), ControlKind::Slider);
        }
        controls.register(Self::VALUES_SOURCE_KEY, "Select values source", ControlKind::Chooser);
        controls.register("Plugin:ValuesReport", "Values Report", ControlKind::Text);
        controls.register(Self::MOTION_TARGET_KEY, "Select motion target", ControlKind::Chooser);

        Self {
            values_source_chooser: Chooser::new(
                Self::VALUES_SOURCE_KEY,
                "Select values source",
                ValuesSourceKind::CHOICES.map(str::to_owned).to_vec(),
            ),
            motion_target_chooser: Chooser::new(
                Self::MOTION_TARGET_KEY,
                "Select motion target",
                MotionTargetKind::CHOICES.map(str::to_owned).to_vec(),
            ),
            values_source: None,
            motion_target: None,
            source_settings: SourceSettings::default(),
            controls,
            debug_draw: false,
            report: String::new(),
            config_dir,
        }
    }

    pub fn values_source_chooser(&self) -> &Chooser {
        &self.values_source_chooser
    }

    pub fn motion_target_chooser(&self) -> &Chooser {
        &self.motion_target_chooser
    }

    pub fn values_source(&self) -> Option<&ValuesSourceKind> {
        self.values_source.as_ref()
    }

    pub fn motion_target(&self) -> Option<&MotionTargetKind> {
        self.motion_target.as_ref()
    }

    pub fn source_settings(&self) -> SourceSettings {
        self.source_settings
    }

    pub fn controls(&self) -> &ControlRegistry {
        &self.controls
    }

    pub fn debug_draw(&self) -> bool {
        self.debug_draw
    }

    /// Status text of the values source, refreshed every tick.
    pub fn report(&self) -> &str {
        &self.report
    }

    pub fn config_dir(&self) -> Option<&Path> {
        self.config_dir.as_deref()
    }

    /// Frames to visualize, if debug drawing is on and a target moved.
    pub fn debug_frames(&self) -> Option<DebugFrames> {
        self.motion_target
            .as_ref()
            .filter(|_| self.debug_draw)
            .and_then(|target| target.debug_frames())
    }

    /// Dispatch one command. Must run on the simulation thread with
    /// exclusive world access.
    pub fn dispatch<B: MotionPhysicsBackend>(world: &mut World, command: DriverCommand) {
        if !world.contains_resource::<BusDriver>() {
            warn!("bus driver: dropping {command:?}, controller not initialized");
            return;
        }
        world.resource_scope(|world, mut driver: Mut<BusDriver>| {
            driver.handle::<B>(world, command);
        });
    }

    fn handle<B: MotionPhysicsBackend>(&mut self, world: &mut World, command: DriverCommand) {
        match command {
            DriverCommand::SelectValuesSource(name) => self.select_values_source(&name),
            DriverCommand::SelectMotionTarget(name) => self.select_motion_target(world, &name),
            DriverCommand::SelectAtom(name) => {
                if let Some(target) = self.motion_target.as_mut() {
                    target.select_atom::<B>(world, &name);
                }
            }
            DriverCommand::SelectTarget(name) => {
                if let Some(target) = self.motion_target.as_mut() {
                    target.select_target::<B>(world, &name);
                }
            }
            DriverCommand::CaptureOrigin => {
                if let Some(target) = self.motion_target.as_mut() {
                    target.capture_origin::<B>(world);
                }
            }
            DriverCommand::RefreshTargets => {
                if let Some(target) = self.motion_target.as_mut() {
                    target.selection_mut().refresh_atoms(world);
                    target.enumerate_targets(world);
                }
            }
            DriverCommand::SetUpDirection(direction) => {
                world.get_resource_or_init::<EnvelopeConfig>().up_direction = direction;
            }
            DriverCommand::SetRange(axis, value) => {
                world.get_resource_or_init::<EnvelopeConfig>().set_range(axis, value);
            }
            DriverCommand::SetUdpPort(port) => self.set_udp_port(port),
            DriverCommand::SetDebugDraw(enabled) => self.debug_draw = enabled,
            DriverCommand::RestoreConfig(store) => self.restore_config::<B>(world, &store),
            DriverCommand::SaveConfig(path) => {
                if let Err(err) = self.save_config(world, &path) {
                    warn!("bus driver: failed to save {}: {err}", path.display());
                }
            }
            DriverCommand::LoadConfig(path) => {
                if let Err(err) = self.load_config::<B>(world, &path) {
                    warn!("bus driver: failed to load {}: {err}", path.display());
                }
            }
            DriverCommand::SaveDefaultConfig => match self.default_config_path() {
                Some(path) => {
                    if let Err(err) = self.save_config(world, &path) {
                        warn!("bus driver: failed to save {}: {err}", path.display());
                    }
                }
                None => warn!("bus driver: no config directory set, default config not saved"),
            },
        }
    }

    /// Tear down the current values source and construct the selected one.
    fn select_values_source(&mut self, name: &str) {
        if let Some(old) = self.values_source.take() {
            old.destroy_controls(&mut self.controls);
        }

        match ValuesSourceKind::from_name(name, &self.source_settings) {
            Some(source) => {
                source.create_controls(&mut self.controls);
                self.values_source_chooser.set_value(source.name());
                self.values_source = Some(source);
            }
            None => self.values_source_chooser.set_value(NONE),
        }
        info!("bus driver: values source set to {}", self.values_source_chooser.value());
    }

    /// Tear down the current motion target and construct the selected one.
    fn select_motion_target(&mut self, world: &mut World, name: &str) {
        if let Some(old) = self.motion_target.take() {
            old.destroy_controls(&mut self.controls);
        }

        match MotionTargetKind::from_name(name) {
            Some(mut target) => {
                target.create_controls(&mut self.controls);
                target.selection_mut().refresh_atoms(world);
                self.motion_target_chooser.set_value(target.name());
                self.motion_target = Some(target);
            }
            None => self.motion_target_chooser.set_value(NONE),
        }
        info!("bus driver: motion target set to {}", self.motion_target_chooser.value());
    }

    fn set_udp_port(&mut self, port: u16) {
        if port == self.source_settings.udp_port {
            return;
        }
        self.source_settings.udp_port = port;
        if let Some(name) = self.values_source.as_ref().map(ValuesSource::name) {
            self.select_values_source(name);
        }
    }

    /// Read the active values source into `values` and refresh the report.
    pub fn update_values(&mut self, values: &mut AxisValues) -> bool {
        match self.values_source.as_mut() {
            Some(source) => {
                let updated = source.update(values);
                self.report = source.report(values);
                updated
            }
            None => {
                self.report = "No values source".to_owned();
                false
            }
        }
    }

    /// Actuate the active motion target with the current [`PoseOffset`].
    pub fn apply<B: MotionPhysicsBackend>(world: &mut World) {
        let offset = world.get_resource::<PoseOffset>().copied().unwrap_or_default();
        if !world.contains_resource::<BusDriver>() {
            return;
        }
        world.resource_scope(|world, mut driver: Mut<BusDriver>| {
            if let Some(target) = driver.motion_target.as_mut() {
                target.apply::<B>(world, &offset);
            }
        });
    }

    /// Snapshot of every tunable parameter.
    pub fn store_config(&self, envelope: &EnvelopeConfig) -> ConfigStore {
        let mut store = ConfigStore::new();
        store.set(EnvelopeConfig::UP_DIRECTION_KEY, envelope.up_direction);
        for axis in RangeAxis::ALL {
            store.set(axis.config_key(), envelope.range(axis));
        }
        store.set(Self::DEBUG_DRAW_KEY, self.debug_draw);
        self.source_settings.store_config(&mut store);

        store.set(Self::VALUES_SOURCE_KEY, self.values_source_chooser.value());
        if let Some(source) = &self.values_source {
            source.store_config(&mut store);
        }
        store.set(Self::MOTION_TARGET_KEY, self.motion_target_chooser.value());
        if let Some(target) = &self.motion_target {
            target.store_config(&mut store);
        }
        store
    }

    /// Apply a snapshot. Plain values are set first, then the choosers are
    /// replayed in dependency order: values source, motion target, atom,
    /// target. Missing keys leave the current state alone.
    pub fn restore_config<B: MotionPhysicsBackend>(&mut self, world: &mut World, store: &ConfigStore) {
        {
            let mut envelope = world.get_resource_or_init::<EnvelopeConfig>();
            if let Some(direction) = store.get_parsed(EnvelopeConfig::UP_DIRECTION_KEY) {
                envelope.up_direction = direction;
            }
            for axis in RangeAxis::ALL {
                if let Some(value) = store.get_parsed(axis.config_key()) {
                    envelope.set_range(axis, value);
                }
            }
        }
        if let Some(enabled) = store.get_parsed(Self::DEBUG_DRAW_KEY) {
            self.debug_draw = enabled;
        }
        self.source_settings.restore_config(store);

        if let Some(name) = store.get(Self::VALUES_SOURCE_KEY) {
            self.select_values_source(name);
        }
        if let Some(name) = store.get(Self::MOTION_TARGET_KEY) {
            self.select_motion_target(world, name);
        }
        if let Some(target) = self.motion_target.as_mut() {
            target.restore_config::<B>(world, store);
        }
    }

    pub fn save_config(&self, world: &World, path: &Path) -> Result<(), ConfigError> {
        let envelope = world.get_resource::<EnvelopeConfig>().copied().unwrap_or_default();
        self.store_config(&envelope).save(path)?;
        info!("bus driver: saved config to {}", path.display());
        Ok(())
    }

    pub fn load_config<B: MotionPhysicsBackend>(&mut self, world: &mut World, path: &Path) -> Result<(), ConfigError> {
        let store = ConfigStore::load(path)?;
        self.restore_config::<B>(world, &store);
        info!("bus driver: loaded config from {}", path.display());
        Ok(())
    }

    pub fn default_config_path(&self) -> Option<PathBuf> {
        self.config_dir
            .as_ref()
            .map(|dir| dir.join(Self::DEFAULT_CONFIG_FILE))
    }
}

fn range_label(axis: RangeAxis) -> &'static str {
    match axis {
        RangeAxis::Up => "Up Range (+/- m)",
        RangeAxis::Right => "Right Range (+/- m)",
        RangeAxis::Forward => "Forward Range (+/- m)",
        RangeAxis::Yaw => "Yaw Range (+/- deg)",
        RangeAxis::Pitch => "Pitch Range (+/- deg)",
        RangeAxis::Roll => "Roll Range (+/- deg)",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::{BodyProperties, TransformBackend};
    use crate::scene::{Atom, ForceReceiver};

    fn world() -> World {
        let mut world = World::new();
        world.init_resource::<EnvelopeConfig>();
        world.init_resource::<BusDriver>();
        let person = world.spawn((Name::new("Person"), Atom)).id();
        world.spawn((
            Name::new("hip"),
            ForceReceiver,
            BodyProperties::new(2.0),
            Transform::from_xyz(0.0, 1.0, 0.0),
            ChildOf(person),
        ));
        let toy = world.spawn((Name::new("Toy"), Atom)).id();
        world.spawn((
            Name::new("base"),
            ForceReceiver,
            BodyProperties::new(0.5),
            ChildOf(toy),
        ));
        world
    }

    fn dispatch(world: &mut World, command: DriverCommand) {
        BusDriver::dispatch::<TransformBackend>(world, command);
    }

    #[test]
    fn switching_motion_target_swaps_controls() {
        let mut world = world();
        dispatch(&mut world, DriverCommand::SelectMotionTarget("Force".into()));
        {
            let driver = world.resource::<BusDriver>();
            assert_eq!(driver.motion_target_chooser().value(), "Force");
            assert!(driver.controls().contains("MotionTarget:Force:Target"));
        }

        dispatch(&mut world, DriverCommand::SelectMotionTarget("Physics Link".into()));
        let driver = world.resource::<BusDriver>();
        assert!(!driver.controls().contains("MotionTarget:Force:Target"));
        assert!(driver.controls().contains("MotionTarget:PhysicsLink:Target"));
        assert!(matches!(driver.motion_target(), Some(MotionTargetKind::Kinematic(_))));
    }

    #[test]
    fn unknown_motion_target_is_none() {
        let mut world = world();
        dispatch(&mut world, DriverCommand::SelectMotionTarget("Force".into()));
        dispatch(&mut world, DriverCommand::SelectMotionTarget("Rocket".into()));

        let driver = world.resource::<BusDriver>();
        assert_eq!(driver.motion_target_chooser().value(), NONE);
        assert!(driver.motion_target().is_none());
        assert!(!driver.controls().contains("MotionTarget:Force:Atom"));
    }

    #[test]
    fn target_commands_without_motion_target_are_ignored() {
        let mut world = world();
        dispatch(&mut world, DriverCommand::SelectAtom("Person".into()));
        dispatch(&mut world, DriverCommand::SelectTarget("hip".into()));
        dispatch(&mut world, DriverCommand::CaptureOrigin);
        assert!(world.resource::<BusDriver>().motion_target().is_none());
    }

    #[test]
    fn atom_change_resets_target() {
        let mut world = world();
        dispatch(&mut world, DriverCommand::SelectMotionTarget("Force".into()));
        dispatch(&mut world, DriverCommand::SelectAtom("Person".into()));
        dispatch(&mut world, DriverCommand::SelectTarget("hip".into()));
        {
            let selection = world.resource::<BusDriver>().motion_target().unwrap().selection();
            assert!(selection.target().is_some());
            assert_eq!(selection.origin().position, Vec3::Y);
        }

        dispatch(&mut world, DriverCommand::SelectAtom("Toy".into()));

        let selection = world.resource::<BusDriver>().motion_target().unwrap().selection();
        assert_eq!(selection.target_chooser().value(), NONE);
        assert_eq!(selection.target_chooser().choices(), ["None", "base"]);
        assert_eq!(selection.origin(), crate::target::OriginPose::default());
    }

    #[test]
    fn envelope_commands_update_config() {
        let mut world = world();
        dispatch(&mut world, DriverCommand::SetUpDirection(UpDirection::NegativeRight));
        dispatch(&mut world, DriverCommand::SetRange(RangeAxis::Yaw, 45.0));
        dispatch(&mut world, DriverCommand::SetRange(RangeAxis::Up, 10.0));

        let envelope = world.resource::<EnvelopeConfig>();
        assert_eq!(envelope.up_direction, UpDirection::NegativeRight);
        assert_eq!(envelope.yaw_range, 45.0);
        assert_eq!(envelope.up_range, 0.25);
    }

    #[test]
    fn config_round_trip_replays_selection() {
        let mut world = world();
        dispatch(&mut world, DriverCommand::SetUpDirection(UpDirection::PositiveForward));
        dispatch(&mut world, DriverCommand::SetRange(RangeAxis::Roll, 12.0));
        dispatch(&mut world, DriverCommand::SetDebugDraw(true));
        dispatch(&mut world, DriverCommand::SelectMotionTarget("Force".into()));
        dispatch(&mut world, DriverCommand::SelectAtom("Person".into()));
        dispatch(&mut world, DriverCommand::SelectTarget("HIP".into()));

        let envelope = *world.resource::<EnvelopeConfig>();
        let store = world.resource::<BusDriver>().store_config(&envelope);
        assert_eq!(store.get("MotionTarget:Force:Target"), Some("hip"));

        let mut restored = self::world();
        dispatch(&mut restored, DriverCommand::RestoreConfig(store.clone()));

        assert_eq!(*restored.resource::<EnvelopeConfig>(), envelope);
        let driver = restored.resource::<BusDriver>();
        assert!(driver.debug_draw());
        let selection = driver.motion_target().unwrap().selection();
        assert_eq!(selection.atom_chooser().value(), "Person");
        assert_eq!(selection.target_chooser().value(), "hip");
        assert_eq!(selection.origin().position, Vec3::Y);
        assert_eq!(driver.store_config(&envelope), store);
    }

    #[test]
    fn restore_with_none_target_disables_actuation() {
        let mut world = world();
        dispatch(&mut world, DriverCommand::SelectMotionTarget("Force".into()));
        dispatch(&mut world, DriverCommand::SelectAtom("Person".into()));
        dispatch(&mut world, DriverCommand::SelectTarget("hip".into()));

        let mut store = ConfigStore::new();
        store.set(BusDriver::MOTION_TARGET_KEY, NONE);
        dispatch(&mut world, DriverCommand::RestoreConfig(store));

        assert!(world.resource::<BusDriver>().motion_target().is_none());
    }

    #[test]
    fn save_and_load_through_files() {
        let dir = tempfile::tempdir().unwrap();
        let mut world = world();
        world.insert_resource(BusDriver::new(Some(dir.path().to_path_buf())));
        dispatch(&mut world, DriverCommand::SetRange(RangeAxis::Pitch, 60.0));
        dispatch(&mut world, DriverCommand::SaveDefaultConfig);

        let path = dir.path().join(BusDriver::DEFAULT_CONFIG_FILE);
        assert!(path.exists());

        let mut fresh = self::world();
        dispatch(&mut fresh, DriverCommand::LoadConfig(path));
        assert_eq!(fresh.resource::<EnvelopeConfig>().pitch_range, 60.0);
    }

    #[test]
    fn missing_config_file_leaves_state() {
        let dir = tempfile::tempdir().unwrap();
        let mut world = world();
        dispatch(&mut world, DriverCommand::LoadConfig(dir.path().join("nope.json")));
        assert_eq!(*world.resource::<EnvelopeConfig>(), EnvelopeConfig::default());
    }

    #[test]
    fn values_report_without_source() {
        let mut driver = BusDriver::default();
        let mut values = AxisValues::neutral();
        assert!(!driver.update_values(&mut values));
        assert_eq!(driver.report(), "No values source");
    }

    #[test]
    fn udp_port_is_stored() {
        let mut world = world();
        dispatch(&mut world, DriverCommand::SetUdpPort(9123));
        let store = world.resource::<BusDriver>().store_config(&EnvelopeConfig::default());
        assert_eq!(store.get_parsed::<u16>("ValuesSource:Udp:Port"), Some(9123));
    }
}
