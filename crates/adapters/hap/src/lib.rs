//! # hknest-adapter-hap
//!
//! HomeKit adapter — the downstream collaborator of the bridge.
//!
//! ## Responsibilities
//! - Build a HAP accessory for every mirrored device
//! - Wire thermostat characteristics to [`ThermostatControl`](hknest_app::control::ThermostatControl)
//! - Push smoke/CO readings from [`AlarmSensors`](hknest_app::control::AlarmSensors)
//! - Run one IP transport per accessory, each with its own port and storage
//!
//! ## Dependency rule
//! Depends on `hknest-app` and `hknest-domain`. Never imported by them.

pub mod alarm;
pub mod config;
pub mod error;
pub mod host;
pub mod pin;

pub use config::HapConfig;
pub use error::HapError;
pub use host::HapHost;
