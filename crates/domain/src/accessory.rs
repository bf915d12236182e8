//! Accessory metadata and device classes.

use std::fmt;

use crate::id::DeviceId;
use crate::smoke_co_alarm::SmokeCoAlarm;
use crate::thermostat::Thermostat;

/// Manufacturer reported by every bridged accessory.
pub const MANUFACTURER: &str = "Nest";

/// Class of a mirrored cloud device. Each class has its own registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeviceClass {
    Thermostat,
    SmokeCoAlarm,
}

impl DeviceClass {
    /// Model string reported by the accessory.
    #[must_use]
    pub fn model(self) -> &'static str {
        match self {
            Self::Thermostat => "Thermostat",
            Self::SmokeCoAlarm => "Protect",
        }
    }
}

impl fmt::Display for DeviceClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Thermostat => f.write_str("thermostat"),
            Self::SmokeCoAlarm => f.write_str("smoke_co_alarm"),
        }
    }
}

/// Fixed metadata attached to an accessory when it is constructed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessoryInfo {
    pub device_id: DeviceId,
    pub class: DeviceClass,
    pub name: String,
    pub manufacturer: String,
    pub model: String,
    pub serial_number: String,
}

impl AccessoryInfo {
    fn new(device_id: &DeviceId, class: DeviceClass, name: &str) -> Self {
        let name = if name.trim().is_empty() {
            class.model().to_string()
        } else {
            name.to_string()
        };
        Self {
            device_id: device_id.clone(),
            class,
            name,
            manufacturer: MANUFACTURER.to_string(),
            model: class.model().to_string(),
            serial_number: device_id.to_string(),
        }
    }
}

impl From<&Thermostat> for AccessoryInfo {
    fn from(thermostat: &Thermostat) -> Self {
        Self::new(
            &thermostat.device_id,
            DeviceClass::Thermostat,
            thermostat.display_name(),
        )
    }
}

impl From<&SmokeCoAlarm> for AccessoryInfo {
    fn from(alarm: &SmokeCoAlarm) -> Self {
        Self::new(
            &alarm.device_id,
            DeviceClass::SmokeCoAlarm,
            alarm.display_name(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::smoke_co_alarm::{AlarmState, BatteryHealth};

    fn alarm(name: &str) -> SmokeCoAlarm {
        SmokeCoAlarm {
            device_id: DeviceId::new("alarm-1").unwrap(),
            name: name.to_string(),
            name_long: String::new(),
            battery_health: BatteryHealth::Ok,
            co_alarm_state: AlarmState::Ok,
            smoke_alarm_state: AlarmState::Ok,
            ui_color_state: None,
            is_online: true,
            last_connection: None,
        }
    }

    #[test]
    fn should_build_alarm_metadata() {
        let info = AccessoryInfo::from(&alarm("Kitchen"));
        assert_eq!(info.name, "Kitchen");
        assert_eq!(info.manufacturer, "Nest");
        assert_eq!(info.model, "Protect");
        assert_eq!(info.serial_number, "alarm-1");
        assert_eq!(info.class, DeviceClass::SmokeCoAlarm);
    }

    #[test]
    fn should_fall_back_to_model_when_device_unnamed() {
        let info = AccessoryInfo::from(&alarm(""));
        assert_eq!(info.name, "Protect");
    }

    #[test]
    fn should_display_device_class() {
        assert_eq!(DeviceClass::Thermostat.to_string(), "thermostat");
        assert_eq!(DeviceClass::SmokeCoAlarm.to_string(), "smoke_co_alarm");
    }
}
