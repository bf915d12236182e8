//! # hknest-adapter-nest
//!
//! Nest cloud adapter — the upstream collaborator of the bridge.
//!
//! ## Responsibilities
//! - Exchange product credentials and a user PIN for a bearer token
//! - Subscribe to the `/devices` event stream and decode it into
//!   [`DeviceBatch`](hknest_domain::batch::DeviceBatch)es
//! - Forward thermostat mutations (target temperature, HVAC mode)
//!
//! [`NestClient`] implements both [`CloudDevices`](hknest_app::ports::CloudDevices)
//! and [`DeviceStream`](hknest_app::ports::DeviceStream).
//!
//! ## Dependency rule
//! Depends on `hknest-app` and `hknest-domain`. Never imported by them.

pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod sse;

pub use auth::{AccessToken, NestCredentials};
pub use client::NestClient;
pub use config::NestConfig;
pub use error::NestError;
