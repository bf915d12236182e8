//! Presented accessory state shared with transport callbacks.
//!
//! [`ThermostatControl`] holds the values a thermostat accessory presents and
//! turns remote user changes into [`ControlCommand`]s. [`AlarmSensors`] holds
//! the readings a smoke/CO accessory presents; transports subscribe to it and
//! push every change to the local sensors.

use std::sync::{Mutex, PoisonError};

use hknest_domain::id::DeviceId;
use hknest_domain::smoke_co_alarm::AlarmReadings;
use hknest_domain::thermostat::{HeatingCoolingMode, HvacMode, TemperatureRange, Thermostat};
use tokio::sync::{mpsc, watch};

/// A mutation requested by a local user, bound for the cloud.
#[derive(Debug, Clone, PartialEq)]
pub enum ControlCommand {
    SetTargetTemperature { device_id: DeviceId, celsius: f32 },
    SetHvacMode { device_id: DeviceId, mode: HvacMode },
}

impl ControlCommand {
    /// Device the command is addressed to.
    #[must_use]
    pub fn device_id(&self) -> &DeviceId {
        match self {
            Self::SetTargetTemperature { device_id, .. } | Self::SetHvacMode { device_id, .. } => {
                device_id
            }
        }
    }
}

/// Values a thermostat accessory presents locally.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThermostatPresentation {
    pub current_temperature: f32,
    pub target_temperature: f32,
    pub mode: HeatingCoolingMode,
}

/// Mutable presented characteristics of one thermostat accessory.
///
/// Seeded from the snapshot that created the accessory. Later snapshots do
/// not update it; only remote user changes do.
#[derive(Debug)]
pub struct ThermostatControl {
    device_id: DeviceId,
    name: String,
    range: TemperatureRange,
    presented: Mutex<ThermostatPresentation>,
    commands: mpsc::UnboundedSender<ControlCommand>,
}

impl ThermostatControl {
    /// Seed the presented values from `snapshot`.
    #[must_use]
    pub fn new(
        snapshot: &Thermostat,
        range: TemperatureRange,
        commands: mpsc::UnboundedSender<ControlCommand>,
    ) -> Self {
        Self {
            device_id: snapshot.device_id.clone(),
            name: snapshot.display_name().to_string(),
            range,
            presented: Mutex::new(ThermostatPresentation {
                current_temperature: snapshot.ambient_temperature_c,
                target_temperature: range.normalize(snapshot.target_temperature_c),
                mode: snapshot.hvac_mode.into(),
            }),
            commands,
        }
    }

    #[must_use]
    pub fn device_id(&self) -> &DeviceId {
        &self.device_id
    }

    /// Allowed target temperature range.
    #[must_use]
    pub fn range(&self) -> TemperatureRange {
        self.range
    }

    /// Snapshot of the presented values.
    #[must_use]
    pub fn presented(&self) -> ThermostatPresentation {
        *self.lock()
    }

    /// A local user changed the target temperature.
    ///
    /// The value is clamped into [`range`](Self::range) and snapped to its
    /// step before it is presented and forwarded.
    pub fn remote_target_temperature(&self, celsius: f32) {
        let celsius = self.range.normalize(celsius);
        self.lock().target_temperature = celsius;
        tracing::info!(device = %self.name, celsius, "changed target temperature");
        self.send(ControlCommand::SetTargetTemperature {
            device_id: self.device_id.clone(),
            celsius,
        });
    }

    /// A local user changed the target heating/cooling state.
    ///
    /// `raw` is forwarded through [`HvacMode::from_local_raw`], so unknown
    /// values reach the cloud as heat-cool.
    pub fn remote_mode(&self, raw: u8) {
        if let Some(mode) = HeatingCoolingMode::from_raw(raw) {
            self.lock().mode = mode;
        }
        let mode = HvacMode::from_local_raw(raw);
        tracing::info!(device = %self.name, raw, %mode, "changed mode");
        self.send(ControlCommand::SetHvacMode {
            device_id: self.device_id.clone(),
            mode,
        });
    }

    fn send(&self, command: ControlCommand) {
        if self.commands.send(command).is_err() {
            tracing::warn!(device = %self.name, "command forwarder stopped, dropping change");
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ThermostatPresentation> {
        self.presented.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Readings presented by one smoke/CO alarm accessory.
#[derive(Debug)]
pub struct AlarmSensors {
    readings: watch::Sender<AlarmReadings>,
}

impl AlarmSensors {
    #[must_use]
    pub fn new(initial: AlarmReadings) -> Self {
        let (readings, _) = watch::channel(initial);
        Self { readings }
    }

    /// Currently presented readings.
    #[must_use]
    pub fn current(&self) -> AlarmReadings {
        *self.readings.borrow()
    }

    /// Present `readings`, notifying subscribers only when they changed.
    ///
    /// Returns whether the presented readings changed.
    pub fn mirror(&self, readings: AlarmReadings) -> bool {
        self.readings.send_if_modified(|current| {
            if *current == readings {
                return false;
            }
            *current = readings;
            true
        })
    }

    /// Receiver that observes every presented change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<AlarmReadings> {
        self.readings.subscribe()
    }
}
