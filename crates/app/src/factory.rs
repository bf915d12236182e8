//! Accessory factory — turns cloud snapshots into running local accessories.
//!
//! On first sight of a device id the factory builds the accessory through the
//! [`AccessoryHost`], hands its listener to [`Transports`], and registers the
//! wrapper. Later sightings return the registered wrapper; for smoke/CO
//! alarms they also mirror the new alarm levels into the local sensors.

use std::sync::Arc;

use hknest_domain::accessory::AccessoryInfo;
use hknest_domain::error::BridgeError;
use hknest_domain::smoke_co_alarm::{AlarmReadings, SmokeCoAlarm};
use hknest_domain::thermostat::{TemperatureRange, Thermostat};
use tokio::sync::mpsc;

use crate::accessory::{SmokeCoAlarmAccessory, ThermostatAccessory};
use crate::control::{AlarmSensors, ControlCommand, ThermostatControl};
use crate::ports::AccessoryHost;
use crate::registry::Registries;
use crate::transport::Transports;

/// Behaviour switches for the factory.
#[derive(Debug, Clone, Copy)]
pub struct FactoryOptions {
    /// Mirror smoke/CO alarm levels into the local sensors on every snapshot.
    ///
    /// When disabled, alarm accessories keep presenting "nothing detected"
    /// whatever the cloud reports.
    pub mirror_alarm_state: bool,
    /// Range local target temperatures are normalized into.
    pub temperature_range: TemperatureRange,
}

impl Default for FactoryOptions {
    fn default() -> Self {
        Self {
            mirror_alarm_state: true,
            temperature_range: TemperatureRange::default(),
        }
    }
}

/// Get-or-create entry point for accessories of both device classes.
pub struct AccessoryFactory<H> {
    host: H,
    registries: Registries,
    transports: Transports,
    commands: mpsc::UnboundedSender<ControlCommand>,
    options: FactoryOptions,
}

impl<H: AccessoryHost> AccessoryFactory<H> {
    /// Create a factory with empty registries.
    pub fn new(
        host: H,
        transports: Transports,
        commands: mpsc::UnboundedSender<ControlCommand>,
        options: FactoryOptions,
    ) -> Self {
        Self {
            host,
            registries: Registries::default(),
            transports,
            commands,
            options,
        }
    }

    pub fn registries(&self) -> &Registries {
        &self.registries
    }

    pub fn transports(&self) -> &Transports {
        &self.transports
    }

    /// Return the accessory mirroring `snapshot`, creating it on first sight.
    ///
    /// The boolean is `true` when the accessory already existed.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::Accessory`] when the host cannot set up the
    /// accessory's transport. The caller must treat it as fatal.
    #[tracing::instrument(skip_all, fields(device = %snapshot.device_id))]
    pub async fn thermostat(
        &self,
        snapshot: &Thermostat,
    ) -> Result<(Arc<ThermostatAccessory>, bool), BridgeError> {
        let (accessory, existed) = self
            .registries
            .thermostats
            .get_or_create(&snapshot.device_id, || async {
                let info = AccessoryInfo::from(snapshot);
                tracing::info!(name = %info.name, "creating new thermostat accessory");

                let control = Arc::new(ThermostatControl::new(
                    snapshot,
                    self.options.temperature_range,
                    self.commands.clone(),
                ));
                let listener = self
                    .host
                    .start_thermostat(info.clone(), Arc::clone(&control))
                    .await?;
                let transport = self.transports.spawn(info.name.clone(), listener);

                Ok::<_, BridgeError>(ThermostatAccessory {
                    info,
                    control,
                    transport,
                })
            })
            .await?;

        if existed {
            tracing::debug!("reusing thermostat accessory");
        }
        Ok((accessory, existed))
    }

    /// Return the accessory mirroring `snapshot`, creating it on first sight.
    ///
    /// When alarm mirroring is enabled, the snapshot's alarm levels are
    /// presented by the local sensors, both at creation and on every later
    /// sighting.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::Accessory`] when the host cannot set up the
    /// accessory's transport. The caller must treat it as fatal.
    #[tracing::instrument(skip_all, fields(device = %snapshot.device_id))]
    pub async fn smoke_co_alarm(
        &self,
        snapshot: &SmokeCoAlarm,
    ) -> Result<(Arc<SmokeCoAlarmAccessory>, bool), BridgeError> {
        let readings = if self.options.mirror_alarm_state {
            snapshot.readings()
        } else {
            AlarmReadings::default()
        };

        let (accessory, existed) = self
            .registries
            .smoke_co_alarms
            .get_or_create(&snapshot.device_id, || async {
                let info = AccessoryInfo::from(snapshot);
                tracing::info!(name = %info.name, "creating new smoke/CO alarm accessory");

                let sensors = Arc::new(AlarmSensors::new(readings));
                let listener = self
                    .host
                    .start_smoke_co_alarm(info.clone(), Arc::clone(&sensors))
                    .await?;
                let transport = self.transports.spawn(info.name.clone(), listener);

                Ok::<_, BridgeError>(SmokeCoAlarmAccessory {
                    info,
                    sensors,
                    transport,
                })
            })
            .await?;

        if existed {
            tracing::debug!("reusing smoke/CO alarm accessory");
            if self.options.mirror_alarm_state && accessory.sensors.mirror(readings) {
                tracing::info!(
                    smoke = ?readings.smoke,
                    carbon_monoxide = ?readings.carbon_monoxide,
                    "alarm readings changed"
                );
            }
        }
        Ok((accessory, existed))
    }
}
