//! Values sources: where the six axis values come from each tick.

pub mod tcode;
mod udp;

pub use udp::UdpValuesSource;

use crate::axis::AxisValues;
use crate::config::ConfigStore;
use crate::controls::ControlRegistry;
use crate::scene::NONE;

/// Supplier of axis values. Implementations must never block.
pub trait ValuesSource {
    /// Chooser label of this source.
    fn name(&self) -> &'static str;

    /// Write any new values into `values`. Returns whether anything changed.
    fn update(&mut self, values: &mut AxisValues) -> bool;

    /// Human-readable status for display.
    fn report(&self, values: &AxisValues) -> String;

    fn create_controls(&self, _registry: &mut ControlRegistry) {}

    fn destroy_controls(&self, _registry: &mut ControlRegistry) {}

    fn store_config(&self, _store: &mut ConfigStore) {}
}

/// The active values source.
#[derive(Debug)]
pub enum ValuesSourceKind {
    Udp(UdpValuesSource),
}

impl ValuesSourceKind {
    /// Chooser choices, "None" first.
    pub const CHOICES: [&'static str; 2] = [NONE, UdpValuesSource::NAME];

    /// Construct the source for a chooser value. "None" and unknown names
    /// yield `None`.
    pub fn from_name(name: &str, settings: &SourceSettings) -> Option<Self> {
        match name {
            UdpValuesSource::NAME => Some(Self::Udp(UdpValuesSource::new(settings.udp_port))),
            _ => None,
        }
    }
}

impl ValuesSource for ValuesSourceKind {
    fn name(&self) -> &'static str {
        match self {
            Self::Udp(s) => s.name(),
        }
    }

    fn update(&mut self, values: &mut AxisValues) -> bool {
        match self {
            Self::Udp(s) => s.update(values),
        }
    }

    fn report(&self, values: &AxisValues) -> String {
        match self {
            Self::Udp(s) => s.report(values),
        }
    }

    fn create_controls(&self, registry: &mut ControlRegistry) {
        match self {
            Self::Udp(s) => s.create_controls(registry),
        }
    }

    fn destroy_controls(&self, registry: &mut ControlRegistry) {
        match self {
            Self::Udp(s) => s.destroy_controls(registry),
        }
    }

    fn store_config(&self, store: &mut ConfigStore) {
        match self {
            Self::Udp(s) => s.store_config(store),
        }
    }
}

/// Settings used when constructing a values source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceSettings {
    pub udp_port: u16,
}

impl Default for SourceSettings {
    fn default() -> Self {
        Self {
            udp_port: UdpValuesSource::DEFAULT_PORT,
        }
    }
}

impl SourceSettings {
    pub fn with_udp_port(mut self, udp_port: u16) -> Self {
        self.udp_port = udp_port;
        self
    }

    pub fn store_config(&self, store: &mut ConfigStore) {
        store.set(UdpValuesSource::PORT_KEY, self.udp_port);
    }

    pub fn restore_config(&mut self, store: &ConfigStore) {
        if let Some(port) = store.get_parsed(UdpValuesSource::PORT_KEY) {
            self.udp_port = port;
        }
    }
}
