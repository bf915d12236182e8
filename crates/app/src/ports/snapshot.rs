//! Snapshot sink port — process output for processed snapshots.

use hknest_domain::smoke_co_alarm::SmokeCoAlarm;
use hknest_domain::thermostat::Thermostat;

/// Receives every snapshot the dispatcher processes, before it is mirrored.
pub trait SnapshotSink: Send + Sync {
    /// Called for each smoke/CO alarm snapshot.
    fn smoke_co_alarm(&self, alarm: &SmokeCoAlarm);

    /// Called for each thermostat snapshot. Ignored by default.
    fn thermostat(&self, _thermostat: &Thermostat) {}
}
