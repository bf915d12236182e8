//! Accessory wrappers — what the registries hold for each cloud device.

use std::sync::Arc;

use hknest_domain::accessory::AccessoryInfo;

use crate::control::{AlarmSensors, ThermostatControl};
use crate::transport::TransportHandle;

/// Local accessory mirroring one cloud thermostat.
#[derive(Debug)]
pub struct ThermostatAccessory {
    pub info: AccessoryInfo,
    pub control: Arc<ThermostatControl>,
    pub transport: Arc<TransportHandle>,
}

/// Local accessory mirroring one cloud smoke/CO alarm.
#[derive(Debug)]
pub struct SmokeCoAlarmAccessory {
    pub info: AccessoryInfo,
    pub sensors: Arc<AlarmSensors>,
    pub transport: Arc<TransportHandle>,
}
