//! Thermostat snapshots and heating/cooling value mappings.
//!
//! Two mode vocabularies meet here: the cloud's [`HvacMode`] and the local
//! accessory's [`HeatingCoolingMode`]. The translation from local to cloud is
//! lossy on purpose: any local value that is not Off, Heat or Cool is
//! forwarded as [`HvacMode::HeatCool`].

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::id::DeviceId;
use crate::time::Timestamp;

/// Point-in-time record of one cloud thermostat.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Thermostat {
    pub device_id: DeviceId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub name_long: String,
    pub ambient_temperature_c: f32,
    pub target_temperature_c: f32,
    pub hvac_mode: HvacMode,
    #[serde(default)]
    pub hvac_state: Option<HvacState>,
    #[serde(default)]
    pub humidity: Option<u8>,
    #[serde(default)]
    pub can_heat: bool,
    #[serde(default)]
    pub can_cool: bool,
    #[serde(default)]
    pub is_online: bool,
    #[serde(default)]
    pub last_connection: Option<Timestamp>,
}

impl Thermostat {
    /// Name shown on the accessory: the short name, or the long name when
    /// the short one is blank.
    #[must_use]
    pub fn display_name(&self) -> &str {
        if self.name.trim().is_empty() {
            &self.name_long
        } else {
            &self.name
        }
    }
}

/// Cloud operating mode of a thermostat.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum HvacMode {
    Heat,
    Cool,
    HeatCool,
    Eco,
    Off,
}

impl HvacMode {
    /// Translate a raw local target heating/cooling value into the cloud mode.
    ///
    /// Off, Heat and Cool map one-to-one. Every other value, including Auto
    /// and values outside the local enumeration, falls back to
    /// [`HvacMode::HeatCool`] without further validation.
    #[must_use]
    pub fn from_local_raw(raw: u8) -> Self {
        match HeatingCoolingMode::from_raw(raw) {
            Some(HeatingCoolingMode::Heat) => Self::Heat,
            Some(HeatingCoolingMode::Cool) => Self::Cool,
            Some(HeatingCoolingMode::Off) => Self::Off,
            Some(HeatingCoolingMode::Auto) | None => Self::HeatCool,
        }
    }

    /// Wire name used by the cloud API.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Heat => "heat",
            Self::Cool => "cool",
            Self::HeatCool => "heat-cool",
            Self::Eco => "eco",
            Self::Off => "off",
        }
    }
}

impl fmt::Display for HvacMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What the thermostat's HVAC equipment is currently doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HvacState {
    Heating,
    Cooling,
    Off,
}

/// Local accessory target heating/cooling state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum HeatingCoolingMode {
    Off = 0,
    Heat = 1,
    Cool = 2,
    Auto = 3,
}

impl HeatingCoolingMode {
    /// Decode the raw characteristic value.
    #[must_use]
    pub fn from_raw(raw: u8) -> Option<Self> {
        match raw {
            0 => Some(Self::Off),
            1 => Some(Self::Heat),
            2 => Some(Self::Cool),
            3 => Some(Self::Auto),
            _ => None,
        }
    }

    /// Raw characteristic value.
    #[must_use]
    pub fn raw(self) -> u8 {
        self as u8
    }
}

impl From<HvacMode> for HeatingCoolingMode {
    fn from(mode: HvacMode) -> Self {
        match mode {
            HvacMode::Heat => Self::Heat,
            HvacMode::Cool => Self::Cool,
            HvacMode::Off => Self::Off,
            HvacMode::HeatCool | HvacMode::Eco => Self::Auto,
        }
    }
}

/// Bounds and granularity for the local target temperature, in °C.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TemperatureRange {
    pub min: f32,
    pub max: f32,
    pub step: f32,
}

impl Default for TemperatureRange {
    fn default() -> Self {
        Self {
            min: 9.0,
            max: 32.0,
            step: 0.5,
        }
    }
}

impl TemperatureRange {
    /// Clamp `value` into the range and snap it to the nearest step.
    #[must_use]
    pub fn normalize(&self, value: f32) -> f32 {
        let clamped = value.clamp(self.min, self.max);
        if self.step <= 0.0 {
            return clamped;
        }
        let steps = ((clamped - self.min) / self.step).round();
        (self.min + steps * self.step).min(self.max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot_json() -> serde_json::Value {
        serde_json::json!({
            "device_id": "peyiJNo0IldT2YlIVtYaGQ",
            "name": "Hallway",
            "name_long": "Hallway Thermostat",
            "ambient_temperature_c": 21.5,
            "target_temperature_c": 20.0,
            "hvac_mode": "heat-cool",
            "hvac_state": "heating",
            "humidity": 40,
            "can_heat": true,
            "can_cool": false,
            "is_online": true,
            "last_connection": "2016-10-31T23:59:59.000Z",
            "fan_timer_active": false
        })
    }

    #[test]
    fn should_deserialize_cloud_snapshot_ignoring_unknown_fields() {
        let thermostat: Thermostat = serde_json::from_value(snapshot_json()).unwrap();
        assert_eq!(thermostat.device_id.as_str(), "peyiJNo0IldT2YlIVtYaGQ");
        assert!((thermostat.ambient_temperature_c - 21.5).abs() < f32::EPSILON);
        assert_eq!(thermostat.hvac_mode, HvacMode::HeatCool);
        assert_eq!(thermostat.hvac_state, Some(HvacState::Heating));
        assert!(thermostat.last_connection.is_some());
    }

    #[test]
    fn should_reject_snapshot_with_empty_device_id() {
        let mut json = snapshot_json();
        json["device_id"] = serde_json::json!("");
        assert!(serde_json::from_value::<Thermostat>(json).is_err());
    }

    #[test]
    fn should_fall_back_to_long_name_when_name_blank() {
        let mut thermostat: Thermostat = serde_json::from_value(snapshot_json()).unwrap();
        assert_eq!(thermostat.display_name(), "Hallway");
        thermostat.name = String::new();
        assert_eq!(thermostat.display_name(), "Hallway Thermostat");
    }

    #[test]
    fn should_map_heat_cool_and_off_one_to_one() {
        assert_eq!(HvacMode::from_local_raw(1), HvacMode::Heat);
        assert_eq!(HvacMode::from_local_raw(2), HvacMode::Cool);
        assert_eq!(HvacMode::from_local_raw(0), HvacMode::Off);
    }

    /// Auto and out-of-range values are not validated: they are forwarded
    /// as heat-cool.
    #[test]
    fn should_fall_back_to_heat_cool_for_auto_and_unknown_modes() {
        assert_eq!(HvacMode::from_local_raw(3), HvacMode::HeatCool);
        assert_eq!(HvacMode::from_local_raw(7), HvacMode::HeatCool);
        assert_eq!(HvacMode::from_local_raw(u8::MAX), HvacMode::HeatCool);
    }

    #[test]
    fn should_use_cloud_wire_names() {
        assert_eq!(HvacMode::HeatCool.to_string(), "heat-cool");
        assert_eq!(
            serde_json::to_value(HvacMode::HeatCool).unwrap(),
            serde_json::json!("heat-cool")
        );
    }

    #[test]
    fn should_present_eco_and_heat_cool_as_auto() {
        assert_eq!(HeatingCoolingMode::from(HvacMode::Eco), HeatingCoolingMode::Auto);
        assert_eq!(
            HeatingCoolingMode::from(HvacMode::HeatCool),
            HeatingCoolingMode::Auto
        );
        assert_eq!(HeatingCoolingMode::from(HvacMode::Off).raw(), 0);
    }

    #[test]
    fn should_clamp_and_snap_target_temperature() {
        let range = TemperatureRange::default();
        assert!((range.normalize(19.0) - 19.0).abs() < f32::EPSILON);
        assert!((range.normalize(19.3) - 19.5).abs() < f32::EPSILON);
        assert!((range.normalize(2.0) - 9.0).abs() < f32::EPSILON);
        assert!((range.normalize(40.0) - 32.0).abs() < f32::EPSILON);
    }
}
