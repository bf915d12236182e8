//! [`AccessoryHost`] backed by one HAP IP server per accessory.
//!
//! Every accessory gets its own pairing identity: a stable device MAC
//! derived from the cloud device id, a dedicated port, and a dedicated
//! pairing store under `{storage_dir}/{device id}`. Pairings therefore
//! survive restarts and never collide between accessories.

use std::collections::BTreeSet;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use hap::accessory::thermostat::ThermostatAccessory;
use hap::accessory::{AccessoryCategory, AccessoryInformation};
use hap::characteristic::{CharacteristicCallbacks, HapCharacteristic};
use hap::server::{IpServer, Server};
use hap::storage::{FileStorage, Storage};
use hap::{Config, MacAddress, pointer};
use hknest_app::control::{AlarmSensors, ThermostatControl};
use hknest_app::ports::{AccessoryHost, Listener};
use hknest_domain::accessory::AccessoryInfo;
use hknest_domain::error::BridgeError;
use hknest_domain::id::DeviceId;
use hknest_domain::smoke_co_alarm::AlarmReadings;
use hknest_domain::thermostat::{HeatingCoolingMode, TemperatureRange};
use tokio::sync::watch;
use uuid::Uuid;

use crate::alarm::{SmokeCoAlarmAccessory, sensor_writes, service_mut};
use crate::config::HapConfig;
use crate::error::HapError;
use crate::pin;

/// Accessory id of the single accessory each server hosts.
const ACCESSORY_ID: u64 = 1;

/// Builds HAP accessories and prepares their IP transports.
pub struct HapHost {
    config: HapConfig,
    /// Ports held by stored pairing identities or handed out this run.
    reserved_ports: Mutex<BTreeSet<u16>>,
}

impl HapHost {
    /// Create a host, validating the pairing PIN up front and reserving the
    /// ports of every pairing identity already stored under `storage_dir`.
    ///
    /// # Errors
    ///
    /// Returns [`HapError::Domain`] or [`HapError::Hap`] for an unusable PIN,
    /// or [`HapError::Io`] when the storage directory cannot be read.
    pub async fn new(config: HapConfig) -> Result<Self, HapError> {
        pin::parse(&config.pin)?;
        let reserved = stored_ports(&config.storage_dir).await?;
        if !reserved.is_empty() {
            tracing::debug!(ports = ?reserved, "reserved ports of stored pairing identities");
        }
        Ok(Self::with_reserved_ports(config, reserved))
    }

    fn with_reserved_ports(config: HapConfig, reserved: BTreeSet<u16>) -> Self {
        Self {
            config,
            reserved_ports: Mutex::new(reserved),
        }
    }

    /// Reserve the lowest free port from `base_port` upwards.
    fn allocate_port(&self) -> Result<u16, HapError> {
        let mut reserved = self
            .reserved_ports
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let base = self.config.base_port;
        let mut port = base;
        while reserved.contains(&port) {
            port = port
                .checked_add(1)
                .ok_or(HapError::PortExhausted { base })?;
        }
        reserved.insert(port);
        Ok(port)
    }

    fn storage_dir(&self, device_id: &DeviceId) -> PathBuf {
        self.config.storage_dir.join(device_id.slug())
    }

    /// Load the stored pairing identity of an accessory, or create and
    /// store a new one on a free port.
    async fn identity(
        &self,
        info: &AccessoryInfo,
        category: AccessoryCategory,
    ) -> Result<(Config, FileStorage), HapError> {
        let dir = self.storage_dir(&info.device_id);
        tokio::fs::create_dir_all(&dir).await?;
        let mut storage = FileStorage::new(&dir).await?;

        let config = if let Ok(mut config) = storage.load_config().await {
            config.redetermine_local_ip();
            tracing::debug!(accessory = %info.name, port = config.port, "reusing pairing identity");
            config
        } else {
            let config = Config {
                pin: pin::parse(&self.config.pin)?,
                name: info.name.clone(),
                device_id: device_mac(&info.device_id),
                category,
                port: self.allocate_port()?,
                ..Default::default()
            };
            tracing::debug!(accessory = %info.name, port = config.port, "created pairing identity");
            config
        };
        storage.save_config(&config).await?;
        Ok((config, storage))
    }

    /// Set up the server for one accessory. Nothing listens until the
    /// returned server's handle is polled.
    async fn server(
        &self,
        info: &AccessoryInfo,
        category: AccessoryCategory,
    ) -> Result<IpServer, HapError> {
        let (config, storage) = self.identity(info, category).await?;
        Ok(IpServer::new(config, storage).await?)
    }
}

/// Ports of the pairing identities stored in the subdirectories of `dir`.
async fn stored_ports(dir: &Path) -> Result<BTreeSet<u16>, HapError> {
    let mut ports = BTreeSet::new();
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => return Ok(ports),
        Err(err) => return Err(err.into()),
    };
    while let Some(entry) = entries.next_entry().await? {
        if !entry.file_type().await?.is_dir() {
            continue;
        }
        let storage = FileStorage::new(&entry.path()).await?;
        if let Ok(config) = storage.load_config().await {
            ports.insert(config.port);
        }
    }
    Ok(ports)
}

/// Stable, locally administered unicast MAC for a device.
#[must_use]
pub fn device_mac(device_id: &DeviceId) -> MacAddress {
    let uuid = Uuid::new_v5(&Uuid::NAMESPACE_OID, device_id.as_str().as_bytes());
    let bytes = uuid.as_bytes();
    MacAddress::from([
        (bytes[0] | 0x02) & 0xfe,
        bytes[1],
        bytes[2],
        bytes[3],
        bytes[4],
        bytes[5],
    ])
}

fn information(info: &AccessoryInfo) -> AccessoryInformation {
    AccessoryInformation {
        name: info.name.clone(),
        manufacturer: info.manufacturer.clone(),
        model: info.model.clone(),
        serial_number: info.serial_number.clone(),
        ..Default::default()
    }
}

/// Current heating/cooling state shown for a target mode. Auto has no
/// current counterpart and shows as off.
fn current_state(mode: HeatingCoolingMode) -> u8 {
    match mode {
        HeatingCoolingMode::Heat | HeatingCoolingMode::Cool => mode.raw(),
        HeatingCoolingMode::Off | HeatingCoolingMode::Auto => HeatingCoolingMode::Off.raw(),
    }
}

/// Limit the selectable target temperature to `range`.
fn bound_target_temperature(
    characteristic: &mut dyn HapCharacteristic,
    range: TemperatureRange,
) -> hap::Result<()> {
    characteristic.set_min_value(Some(serde_json::Value::from(range.min)))?;
    characteristic.set_max_value(Some(serde_json::Value::from(range.max)))?;
    characteristic.set_step_value(Some(serde_json::Value::from(range.step)))?;
    Ok(())
}

fn thermostat_accessory(
    info: &AccessoryInfo,
    control: &Arc<ThermostatControl>,
) -> hap::Result<ThermostatAccessory> {
    let mut accessory = ThermostatAccessory::new(ACCESSORY_ID, information(info))?;
    let service = &mut accessory.thermostat;
    bound_target_temperature(&mut service.target_temperature, control.range())?;

    let c = Arc::clone(control);
    service
        .current_temperature
        .on_read(Some(move || -> hap::Result<Option<f32>> {
            Ok(Some(c.presented().current_temperature))
        }));

    let c = Arc::clone(control);
    service
        .current_heating_cooling_state
        .on_read(Some(move || -> hap::Result<Option<u8>> {
            Ok(Some(current_state(c.presented().mode)))
        }));

    let c = Arc::clone(control);
    service
        .target_temperature
        .on_read(Some(move || -> hap::Result<Option<f32>> {
            Ok(Some(c.presented().target_temperature))
        }));
    let c = Arc::clone(control);
    service
        .target_temperature
        .on_update(Some(move |_old: &f32, new: &f32| -> hap::Result<()> {
            c.remote_target_temperature(*new);
            Ok(())
        }));

    let c = Arc::clone(control);
    service
        .target_heating_cooling_state
        .on_read(Some(move || -> hap::Result<Option<u8>> {
            Ok(Some(c.presented().mode.raw()))
        }));
    let c = Arc::clone(control);
    service
        .target_heating_cooling_state
        .on_update(Some(move |_old: &u8, new: &u8| -> hap::Result<()> {
            c.remote_mode(*new);
            Ok(())
        }));

    Ok(accessory)
}

/// Write `readings` to the accessory's sensors. A characteristic that
/// cannot be written is logged and skipped.
async fn present(shared: &pointer::Accessory, name: &str, readings: &AlarmReadings) {
    let mut accessory = shared.lock().await;
    for write in sensor_writes(readings) {
        let Some(service) = service_mut(&mut **accessory, write.service) else {
            continue;
        };
        let Some(characteristic) = service.get_mut_characteristic(write.characteristic) else {
            continue;
        };
        if let Err(err) = characteristic
            .set_value(serde_json::Value::from(write.value))
            .await
        {
            tracing::warn!(accessory = name, ?write, %err, "failed to present alarm reading");
        }
    }
    tracing::debug!(accessory = name, ?readings, "presented alarm readings");
}

/// Present the current readings, then every change until the sensors go away.
async fn mirror_readings(
    shared: pointer::Accessory,
    name: String,
    mut readings: watch::Receiver<AlarmReadings>,
) {
    let current = *readings.borrow_and_update();
    present(&shared, &name, &current).await;
    while readings.changed().await.is_ok() {
        let current = *readings.borrow_and_update();
        present(&shared, &name, &current).await;
    }
}

impl AccessoryHost for HapHost {
    fn start_thermostat(
        &self,
        info: AccessoryInfo,
        control: Arc<ThermostatControl>,
    ) -> impl Future<Output = Result<Listener, BridgeError>> + Send {
        async move {
            let accessory = thermostat_accessory(&info, &control).map_err(HapError::from)?;
            let server = self.server(&info, AccessoryCategory::Thermostat).await?;
            server
                .add_accessory(accessory)
                .await
                .map_err(HapError::from)?;

            let handle = server.run_handle();
            tracing::info!(accessory = %info.name, "thermostat transport ready");
            let listener: Listener = Box::pin(async move {
                let _server = server;
                handle.await.map_err(|err| HapError::from(err).into_domain())
            });
            Ok(listener)
        }
    }

    fn start_smoke_co_alarm(
        &self,
        info: AccessoryInfo,
        sensors: Arc<AlarmSensors>,
    ) -> impl Future<Output = Result<Listener, BridgeError>> + Send {
        async move {
            let accessory = SmokeCoAlarmAccessory::new(ACCESSORY_ID, information(&info))
                .map_err(HapError::from)?;
            let server = self.server(&info, AccessoryCategory::Sensor).await?;
            let shared = server
                .add_accessory(accessory)
                .await
                .map_err(HapError::from)?;

            let mut handle = Box::pin(server.run_handle());
            let readings = sensors.subscribe();
            let name = info.name.clone();
            tracing::info!(accessory = %info.name, "smoke/CO alarm transport ready");
            let listener: Listener = Box::pin(async move {
                let _server = server;
                tokio::select! {
                    result = &mut handle => {
                        return result.map_err(|err| HapError::from(err).into_domain());
                    }
                    () = mirror_readings(shared, name, readings) => {}
                }
                handle.await.map_err(|err| HapError::from(err).into_domain())
            });
            Ok(listener)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hknest_domain::thermostat::{HvacMode, Thermostat};
    use tokio::sync::mpsc;

    fn host(base_port: u16) -> HapHost {
        HapHost::with_reserved_ports(
            HapConfig {
                base_port,
                ..HapConfig::default()
            },
            BTreeSet::new(),
        )
    }

    fn alarm_info(id: &str) -> AccessoryInfo {
        AccessoryInfo {
            device_id: DeviceId::new(id).unwrap(),
            class: hknest_domain::accessory::DeviceClass::SmokeCoAlarm,
            name: format!("Protect {id}"),
            manufacturer: "Nest".to_string(),
            model: "Protect".to_string(),
            serial_number: id.to_string(),
        }
    }

    #[test]
    fn should_derive_stable_distinct_macs() {
        let a = DeviceId::new("RTMTKxsQTCxzVcsySOHPxKoF4OyCifrs").unwrap();
        let b = DeviceId::new("peyiJNo0IldT2YlIVtYaGQ").unwrap();
        assert_eq!(device_mac(&a), device_mac(&a));
        assert_ne!(device_mac(&a), device_mac(&b));
    }

    #[test]
    fn should_derive_locally_administered_unicast_mac() {
        let mac = device_mac(&DeviceId::new("t1").unwrap());
        let first = mac.as_bytes()[0];
        assert_eq!(first & 0x02, 0x02);
        assert_eq!(first & 0x01, 0x00);
    }

    #[test]
    fn should_allocate_consecutive_ports() {
        let host = host(51826);
        assert_eq!(host.allocate_port().unwrap(), 51826);
        assert_eq!(host.allocate_port().unwrap(), 51827);
    }

    #[test]
    fn should_skip_reserved_ports() {
        let host = HapHost::with_reserved_ports(
            HapConfig::default(),
            BTreeSet::from([51826, 51827, 51830]),
        );
        assert_eq!(host.allocate_port().unwrap(), 51828);
        assert_eq!(host.allocate_port().unwrap(), 51829);
        assert_eq!(host.allocate_port().unwrap(), 51831);
    }

    #[test]
    fn should_fail_when_ports_run_out() {
        let host = host(u16::MAX);
        assert_eq!(host.allocate_port().unwrap(), u16::MAX);
        assert!(matches!(
            host.allocate_port(),
            Err(HapError::PortExhausted { base: u16::MAX })
        ));
    }

    #[test]
    fn should_keep_storage_per_device() {
        let host = host(51826);
        let dir = host.storage_dir(&DeviceId::new("a/b").unwrap());
        assert_eq!(dir, PathBuf::from("data/homekit/a_b"));
    }

    #[tokio::test]
    async fn should_reject_trivial_pin_at_construction() {
        let result = HapHost::new(HapConfig {
            pin: "11111111".to_string(),
            ..HapConfig::default()
        })
        .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn should_start_without_storage_dir() {
        let tmp = tempfile::tempdir().unwrap();
        let host = HapHost::new(HapConfig {
            storage_dir: tmp.path().join("missing"),
            ..HapConfig::default()
        })
        .await
        .unwrap();
        assert_eq!(host.allocate_port().unwrap(), 51826);
    }

    #[tokio::test]
    async fn should_not_reuse_stored_port_for_new_device_after_restart() {
        let tmp = tempfile::tempdir().unwrap();
        let config = || HapConfig {
            storage_dir: tmp.path().to_path_buf(),
            ..HapConfig::default()
        };

        let first_run = HapHost::new(config()).await.unwrap();
        let (a1, _) = first_run
            .identity(&alarm_info("a1"), AccessoryCategory::Sensor)
            .await
            .unwrap();
        drop(first_run);

        let second_run = HapHost::new(config()).await.unwrap();
        let (a2, _) = second_run
            .identity(&alarm_info("a2"), AccessoryCategory::Sensor)
            .await
            .unwrap();
        let (a1_again, _) = second_run
            .identity(&alarm_info("a1"), AccessoryCategory::Sensor)
            .await
            .unwrap();

        assert_ne!(a1.port, a2.port);
        assert_eq!(a1_again.port, a1.port);
    }

    #[test]
    fn should_bound_target_temperature_to_range() {
        let snapshot = Thermostat {
            device_id: DeviceId::new("t1").unwrap(),
            name: "Hallway".to_string(),
            name_long: String::new(),
            ambient_temperature_c: 21.5,
            target_temperature_c: 20.0,
            hvac_mode: HvacMode::Heat,
            hvac_state: None,
            humidity: None,
            can_heat: true,
            can_cool: true,
            is_online: true,
            last_connection: None,
        };
        let (tx, _rx) = mpsc::unbounded_channel();
        let control = Arc::new(ThermostatControl::new(
            &snapshot,
            TemperatureRange::default(),
            tx,
        ));

        let accessory =
            thermostat_accessory(&AccessoryInfo::from(&snapshot), &control).unwrap();
        let target = &accessory.thermostat.target_temperature;
        assert_eq!(target.get_min_value(), Some(serde_json::Value::from(9.0_f32)));
        assert_eq!(target.get_max_value(), Some(serde_json::Value::from(32.0_f32)));
        assert_eq!(target.get_step_value(), Some(serde_json::Value::from(0.5_f32)));
    }

    #[test]
    fn should_show_auto_as_off_current_state() {
        assert_eq!(current_state(HeatingCoolingMode::Auto), 0);
        assert_eq!(current_state(HeatingCoolingMode::Cool), 2);
    }
}
