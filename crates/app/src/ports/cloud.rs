//! Cloud port — per-device mutation calls.

use std::future::Future;

use hknest_domain::error::BridgeError;
use hknest_domain::id::DeviceId;
use hknest_domain::thermostat::HvacMode;

/// Mutations the bridge forwards to the cloud device service.
pub trait CloudDevices: Send + Sync {
    /// Set a thermostat's target temperature, in °C.
    fn set_target_temperature(
        &self,
        device_id: &DeviceId,
        celsius: f32,
    ) -> impl Future<Output = Result<(), BridgeError>> + Send;

    /// Set a thermostat's operating mode.
    fn set_hvac_mode(
        &self,
        device_id: &DeviceId,
        mode: HvacMode,
    ) -> impl Future<Output = Result<(), BridgeError>> + Send;
}

impl<T: CloudDevices> CloudDevices for std::sync::Arc<T> {
    fn set_target_temperature(
        &self,
        device_id: &DeviceId,
        celsius: f32,
    ) -> impl Future<Output = Result<(), BridgeError>> + Send {
        (**self).set_target_temperature(device_id, celsius)
    }

    fn set_hvac_mode(
        &self,
        device_id: &DeviceId,
        mode: HvacMode,
    ) -> impl Future<Output = Result<(), BridgeError>> + Send {
        (**self).set_hvac_mode(device_id, mode)
    }
}
