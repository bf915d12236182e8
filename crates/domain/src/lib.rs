//! # hknest-domain
//!
//! Pure domain model for the hknest bridge between the Nest cloud and
//! HomeKit accessories.
//!
//! ## Responsibilities
//! - Foundational types: typed identifiers, error conventions, timestamps
//! - Define **snapshots** of cloud devices (thermostats, smoke/CO alarms)
//!   exactly as the cloud stream delivers them
//! - Define **accessory values** (heating/cooling modes, sensor states,
//!   battery indicators) and the mappings between both worlds
//! - Contain all invariant enforcement and value translation
//!
//! ## Dependency rule
//! This crate has **no internal dependencies**.
//! It must never import anything from `app`, adapters, or external IO crates.
//! All IO boundaries are expressed as traits in the `app` crate (ports).

pub mod error;
pub mod id;
pub mod time;

pub mod accessory;
pub mod batch;
pub mod smoke_co_alarm;
pub mod thermostat;
