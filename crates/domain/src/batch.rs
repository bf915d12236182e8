//! Device batch — one delivery of the cloud device stream.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::smoke_co_alarm::SmokeCoAlarm;
use crate::thermostat::Thermostat;

/// All devices the cloud reports in one stream delivery, keyed by device id.
///
/// Device classes the bridge does not mirror (cameras, structures, …) are
/// dropped during deserialization.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DeviceBatch {
    #[serde(default)]
    pub thermostats: BTreeMap<String, Thermostat>,
    #[serde(default)]
    pub smoke_co_alarms: BTreeMap<String, SmokeCoAlarm>,
}

impl DeviceBatch {
    /// Whether the batch carries no device of a mirrored class.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.thermostats.is_empty() && self.smoke_co_alarms.is_empty()
    }

    /// Total number of mirrored devices in the batch.
    #[must_use]
    pub fn len(&self) -> usize {
        self.thermostats.len() + self.smoke_co_alarms.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_default_missing_classes_to_empty() {
        let batch: DeviceBatch = serde_json::from_str("{}").unwrap();
        assert!(batch.is_empty());
    }

    #[test]
    fn should_ignore_unmirrored_device_classes() {
        let batch: DeviceBatch = serde_json::from_value(serde_json::json!({
            "cameras": { "cam1": { "device_id": "cam1" } },
            "smoke_co_alarms": {
                "a1": {
                    "device_id": "a1",
                    "name": "Hall",
                    "co_alarm_state": "ok",
                    "smoke_alarm_state": "ok"
                }
            }
        }))
        .unwrap();
        assert_eq!(batch.len(), 1);
        assert!(batch.thermostats.is_empty());
        assert_eq!(batch.smoke_co_alarms["a1"].name, "Hall");
    }
}
