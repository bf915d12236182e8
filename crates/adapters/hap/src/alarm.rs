//! Smoke/CO alarm accessory.
//!
//! The HAP library has no ready-made accessory combining a smoke sensor and
//! a carbon-monoxide sensor, so this one is assembled from services.

use hap::HapType;
use hap::accessory::{AccessoryInformation, HapAccessory};
use hap::service::HapService;
use hap::service::accessory_information::AccessoryInformationService;
use hap::service::battery::BatteryService;
use hap::service::carbon_monoxide_sensor::CarbonMonoxideSensorService;
use hap::service::smoke_sensor::SmokeSensorService;
use hknest_domain::smoke_co_alarm::AlarmReadings;
use serde::ser::{Serialize, SerializeStruct, Serializer};

const INFORMATION_IID: u64 = 1;
const SMOKE_SENSOR_IID: u64 = 20;
const CO_SENSOR_IID: u64 = 40;
const BATTERY_IID: u64 = 60;

/// Accessory exposing a smoke sensor, a carbon-monoxide sensor and the
/// device battery.
///
/// The low-battery status of the device is also reported on both sensors.
#[derive(Debug)]
pub struct SmokeCoAlarmAccessory {
    id: u64,
    pub accessory_information: AccessoryInformationService,
    pub smoke_sensor: SmokeSensorService,
    pub carbon_monoxide_sensor: CarbonMonoxideSensorService,
    pub battery: BatteryService,
}

impl SmokeCoAlarmAccessory {
    /// Assemble the accessory with the given accessory id.
    ///
    /// # Errors
    ///
    /// Propagates the library error for invalid accessory information.
    pub fn new(id: u64, information: AccessoryInformation) -> hap::Result<Self> {
        Ok(Self {
            id,
            accessory_information: information.to_service(INFORMATION_IID, id)?,
            smoke_sensor: SmokeSensorService::new(SMOKE_SENSOR_IID, id),
            carbon_monoxide_sensor: CarbonMonoxideSensorService::new(CO_SENSOR_IID, id),
            battery: BatteryService::new(BATTERY_IID, id),
        })
    }
}

impl HapAccessory for SmokeCoAlarmAccessory {
    fn get_id(&self) -> u64 {
        self.id
    }

    fn set_id(&mut self, id: u64) {
        self.id = id;
    }

    fn get_service(&self, hap_type: HapType) -> Option<&dyn HapService> {
        self.get_services()
            .into_iter()
            .find(|service| service.get_type() == hap_type)
    }

    fn get_mut_service(&mut self, hap_type: HapType) -> Option<&mut dyn HapService> {
        self.get_mut_services()
            .into_iter()
            .find(|service| service.get_type() == hap_type)
    }

    fn get_services(&self) -> Vec<&dyn HapService> {
        vec![
            &self.accessory_information,
            &self.smoke_sensor,
            &self.carbon_monoxide_sensor,
            &self.battery,
        ]
    }

    fn get_mut_services(&mut self) -> Vec<&mut dyn HapService> {
        vec![
            &mut self.accessory_information,
            &mut self.smoke_sensor,
            &mut self.carbon_monoxide_sensor,
            &mut self.battery,
        ]
    }
}

impl Serialize for SmokeCoAlarmAccessory {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("HapAccessory", 2)?;
        state.serialize_field("aid", &self.get_id())?;
        state.serialize_field("services", &self.get_services())?;
        state.end()
    }
}

/// Service of the accessory a reading is written to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SensorService {
    Smoke,
    CarbonMonoxide,
    Battery,
}

impl SensorService {
    /// Instance id of the service within the accessory.
    #[must_use]
    pub fn iid(self) -> u64 {
        match self {
            Self::Smoke => SMOKE_SENSOR_IID,
            Self::CarbonMonoxide => CO_SENSOR_IID,
            Self::Battery => BATTERY_IID,
        }
    }
}

/// One characteristic write derived from alarm readings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SensorWrite {
    pub service: SensorService,
    pub characteristic: HapType,
    pub value: u8,
}

/// Characteristic writes presenting `readings` on the accessory.
#[must_use]
pub fn sensor_writes(readings: &AlarmReadings) -> [SensorWrite; 6] {
    let low_battery = u8::from(readings.battery.low);
    let write = |service, characteristic, value| SensorWrite {
        service,
        characteristic,
        value,
    };
    [
        write(
            SensorService::Smoke,
            HapType::SmokeDetected,
            readings.smoke as u8,
        ),
        write(
            SensorService::CarbonMonoxide,
            HapType::CarbonMonoxideDetected,
            readings.carbon_monoxide as u8,
        ),
        write(SensorService::Smoke, HapType::StatusLowBattery, low_battery),
        write(
            SensorService::CarbonMonoxide,
            HapType::StatusLowBattery,
            low_battery,
        ),
        write(
            SensorService::Battery,
            HapType::BatteryLevel,
            readings.battery.level,
        ),
        write(SensorService::Battery, HapType::StatusLowBattery, low_battery),
    ]
}

/// Service of `accessory` a write targets.
pub fn service_mut(
    accessory: &mut dyn HapAccessory,
    service: SensorService,
) -> Option<&mut dyn HapService> {
    accessory
        .get_mut_services()
        .into_iter()
        .find(|candidate| candidate.get_id() == service.iid())
}

#[cfg(test)]
mod tests {
    use super::*;
    use hknest_domain::smoke_co_alarm::{BatteryIndicator, CarbonMonoxideLevel, SmokeDetected};

    fn accessory() -> SmokeCoAlarmAccessory {
        SmokeCoAlarmAccessory::new(
            1,
            AccessoryInformation {
                name: "Kitchen".into(),
                manufacturer: "Nest".into(),
                model: "Protect".into(),
                serial_number: "a1".into(),
                ..Default::default()
            },
        )
        .unwrap()
    }

    #[test]
    fn should_expose_information_sensors_and_battery() {
        let accessory = accessory();
        assert_eq!(accessory.get_services().len(), 4);
        assert!(accessory.get_service(HapType::SmokeSensor).is_some());
        assert!(accessory.get_service(HapType::CarbonMonoxideSensor).is_some());
        assert!(accessory.get_service(HapType::Lightbulb).is_none());
    }

    #[test]
    fn should_find_every_written_characteristic() {
        let mut accessory = accessory();
        for write in sensor_writes(&AlarmReadings::default()) {
            let service = service_mut(&mut accessory, write.service).unwrap();
            assert!(
                service.get_mut_characteristic(write.characteristic).is_some(),
                "{write:?}"
            );
        }
    }

    #[test]
    fn should_map_readings_to_characteristic_values() {
        let readings = AlarmReadings {
            smoke: SmokeDetected::Detected,
            carbon_monoxide: CarbonMonoxideLevel::Normal,
            battery: BatteryIndicator {
                level: 10,
                low: true,
            },
        };
        let values: Vec<u8> = sensor_writes(&readings).iter().map(|w| w.value).collect();
        assert_eq!(values, vec![1, 0, 1, 1, 10, 1]);
    }

    #[test]
    fn should_present_full_battery_when_healthy() {
        let writes = sensor_writes(&AlarmReadings::default());
        let level = writes
            .iter()
            .find(|w| w.characteristic == HapType::BatteryLevel)
            .unwrap();
        assert_eq!(level.service, SensorService::Battery);
        assert_eq!(level.value, 100);
    }

    #[test]
    fn should_target_distinct_service_instances() {
        let accessory = accessory();
        let ids: Vec<u64> = accessory.get_services().iter().map(|s| s.get_id()).collect();
        for service in [
            SensorService::Smoke,
            SensorService::CarbonMonoxide,
            SensorService::Battery,
        ] {
            assert!(ids.contains(&service.iid()), "{service:?}");
        }
    }
}
