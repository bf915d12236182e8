//! Accessory port — construction and transport of local accessories.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use hknest_domain::accessory::AccessoryInfo;
use hknest_domain::error::BridgeError;

use crate::control::{AlarmSensors, ThermostatControl};

/// Long-running future serving one accessory on the local network.
///
/// It only completes when the transport stops; an `Err` means the listener
/// failed and the process must terminate.
pub type Listener = Pin<Box<dyn Future<Output = Result<(), BridgeError>> + Send + 'static>>;

/// Builds accessories in the local pairing library.
///
/// Implementations construct the accessory, attach its services, register
/// the update observers against the given control handle, and prepare its
/// transport. The transport must not run until the returned [`Listener`] is
/// polled; the caller decides where it runs.
pub trait AccessoryHost: Send + Sync {
    /// Build a thermostat accessory presenting and observing `control`.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::Accessory`] when the transport cannot be set up.
    fn start_thermostat(
        &self,
        info: AccessoryInfo,
        control: Arc<ThermostatControl>,
    ) -> impl Future<Output = Result<Listener, BridgeError>> + Send;

    /// Build a smoke/CO alarm accessory presenting `sensors`.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::Accessory`] when the transport cannot be set up.
    fn start_smoke_co_alarm(
        &self,
        info: AccessoryInfo,
        sensors: Arc<AlarmSensors>,
    ) -> impl Future<Output = Result<Listener, BridgeError>> + Send;
}
