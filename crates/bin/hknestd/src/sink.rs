//! Process output for processed snapshots.

use hknest_app::ports::SnapshotSink;
use hknest_domain::smoke_co_alarm::SmokeCoAlarm;

/// Prints every processed smoke/CO alarm snapshot to stdout as labelled JSON.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdoutSnapshotSink;

fn render(alarm: &SmokeCoAlarm) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(alarm)
}

impl SnapshotSink for StdoutSnapshotSink {
    fn smoke_co_alarm(&self, alarm: &SmokeCoAlarm) {
        match render(alarm) {
            Ok(dump) => println!("{dump}"),
            Err(err) => tracing::warn!(device = %alarm.device_id, %err, "failed to render alarm"),
        }
    }
}
