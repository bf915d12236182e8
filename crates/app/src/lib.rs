//! # hknest-app
//!
//! Application layer — use-cases and **port definitions** (traits).
//!
//! ## Responsibilities
//! - Define **port traits** that adapters must implement:
//!   - `CloudDevices` — mutate a cloud device (target temperature, mode)
//!   - `DeviceStream` — subscribe to batches of cloud device snapshots
//!   - `AccessoryHost` — construct a local accessory and hand back its listener
//!   - `SnapshotSink` — process output for every processed snapshot
//! - Provide the use-cases that wire both directions together:
//!   - `DeviceRegistry` — one accessory per cloud device id
//!   - `AccessoryFactory` — get-or-create accessories from snapshots
//!   - `CommandForwarder` — relay local user changes to the cloud
//!   - `Transports` — supervise every accessory listener, stop them on exit
//!   - `StreamDispatcher` — the subscription loop feeding the factory
//!
//! ## Dependency rule
//! Depends on `hknest-domain` only (plus `tokio` for tasks and channels).
//! Never imports adapter crates. Adapters depend on *this* crate, not the reverse.

pub mod accessory;
pub mod control;
pub mod dispatcher;
pub mod factory;
pub mod forwarder;
pub mod ports;
pub mod registry;
pub mod transport;
