//! Smoke/CO alarm snapshots and their sensor readings.

use serde::{Deserialize, Serialize};

use crate::id::DeviceId;
use crate::time::Timestamp;

/// Point-in-time record of one cloud smoke/CO alarm.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SmokeCoAlarm {
    pub device_id: DeviceId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub name_long: String,
    #[serde(default)]
    pub battery_health: BatteryHealth,
    pub co_alarm_state: AlarmState,
    pub smoke_alarm_state: AlarmState,
    #[serde(default)]
    pub ui_color_state: Option<String>,
    #[serde(default)]
    pub is_online: bool,
    #[serde(default)]
    pub last_connection: Option<Timestamp>,
}

impl SmokeCoAlarm {
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

    /// Sensor readings this snapshot translates to.
    #[must_use]
    pub fn readings(&self) -> AlarmReadings {
        AlarmReadings {
            smoke: self.smoke_alarm_state.into(),
            carbon_monoxide: self.co_alarm_state.into(),
            battery: self.battery_health.into(),
        }
    }
}

/// Cloud alarm level, reported independently for smoke and CO.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AlarmState {
    Ok,
    Warning,
    Emergency,
}

/// Cloud battery health.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BatteryHealth {
    #[default]
    Ok,
    Replace,
}

/// Local smoke sensor state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[repr(u8)]
pub enum SmokeDetected {
    #[default]
    NotDetected = 0,
    Detected = 1,
}

impl From<AlarmState> for SmokeDetected {
    fn from(state: AlarmState) -> Self {
        match state {
            AlarmState::Ok => Self::NotDetected,
            AlarmState::Warning | AlarmState::Emergency => Self::Detected,
        }
    }
}

/// Local carbon monoxide sensor state.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[repr(u8)]
pub enum CarbonMonoxideLevel {
    #[default]
    Normal = 0,
    Abnormal = 1,
}

impl From<AlarmState> for CarbonMonoxideLevel {
    fn from(state: AlarmState) -> Self {
        match state {
            AlarmState::Ok => Self::Normal,
            AlarmState::Warning | AlarmState::Emergency => Self::Abnormal,
        }
    }
}

/// Local battery indicator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatteryIndicator {
    /// Battery level in percent.
    pub level: u8,
    /// Whether the low-battery flag is raised.
    pub low: bool,
}

impl Default for BatteryIndicator {
    fn default() -> Self {
        BatteryHealth::Ok.into()
    }
}

impl From<BatteryHealth> for BatteryIndicator {
    fn from(health: BatteryHealth) -> Self {
        match health {
            BatteryHealth::Ok => Self {
                level: 100,
                low: false,
            },
            BatteryHealth::Replace => Self {
                level: 10,
                low: true,
            },
        }
    }
}

/// Everything a smoke/CO accessory presents locally.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AlarmReadings {
    pub smoke: SmokeDetected,
    pub carbon_monoxide: CarbonMonoxideLevel,
    pub battery: BatteryIndicator,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alarm(smoke: &str, co: &str, battery: &str) -> SmokeCoAlarm {
        serde_json::from_value(serde_json::json!({
            "device_id": "RTMTKxsQTCxzVcsySOHPxKoF4OyCifrs",
            "name": "Kitchen",
            "name_long": "Kitchen Nest Protect",
            "battery_health": battery,
            "co_alarm_state": co,
            "smoke_alarm_state": smoke,
            "ui_color_state": "green",
            "is_online": true
        }))
        .unwrap()
    }

    #[test]
    fn should_deserialize_cloud_snapshot() {
        let alarm = alarm("ok", "warning", "replace");
        assert_eq!(alarm.smoke_alarm_state, AlarmState::Ok);
        assert_eq!(alarm.co_alarm_state, AlarmState::Warning);
        assert_eq!(alarm.battery_health, BatteryHealth::Replace);
        assert_eq!(alarm.display_name(), "Kitchen");
    }

    #[test]
    fn should_report_nothing_detected_when_both_ok() {
        let readings = alarm("ok", "ok", "ok").readings();
        assert_eq!(readings.smoke, SmokeDetected::NotDetected);
        assert_eq!(readings.carbon_monoxide, CarbonMonoxideLevel::Normal);
        assert_eq!(readings, AlarmReadings::default());
    }

    #[test]
    fn should_detect_smoke_on_warning_and_emergency() {
        assert_eq!(
            alarm("warning", "ok", "ok").readings().smoke,
            SmokeDetected::Detected
        );
        assert_eq!(
            alarm("emergency", "ok", "ok").readings().smoke,
            SmokeDetected::Detected
        );
    }

    #[test]
    fn should_map_smoke_and_co_independently() {
        let readings = alarm("ok", "emergency", "ok").readings();
        assert_eq!(readings.smoke, SmokeDetected::NotDetected);
        assert_eq!(readings.carbon_monoxide, CarbonMonoxideLevel::Abnormal);
    }

    #[test]
    fn should_raise_low_battery_when_replacement_needed() {
        let readings = alarm("ok", "ok", "replace").readings();
        assert!(readings.battery.low);
        assert_eq!(readings.battery.level, 10);
    }
}
