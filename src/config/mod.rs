//! Tunable parameters and their persistence.

mod envelope;
mod store;

pub use envelope::{EnvelopeConfig, ParseUpDirectionError, RangeAxis, UpDirection};
pub use store::{ConfigError, ConfigStore};
