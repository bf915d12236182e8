//! Command forwarder — relays local user changes to the cloud.

use hknest_domain::error::BridgeError;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::control::ControlCommand;
use crate::ports::CloudDevices;

/// Drains [`ControlCommand`]s and applies them through [`CloudDevices`].
///
/// A failed mutation is logged and dropped; it never stops the forwarder.
pub struct CommandForwarder<C> {
    cloud: C,
    commands: mpsc::UnboundedReceiver<ControlCommand>,
}

impl<C: CloudDevices + 'static> CommandForwarder<C> {
    /// Create a forwarder and the sender accessories emit commands on.
    pub fn new(cloud: C) -> (Self, mpsc::UnboundedSender<ControlCommand>) {
        let (tx, commands) = mpsc::unbounded_channel();
        (Self { cloud, commands }, tx)
    }

    /// Apply one command.
    ///
    /// # Errors
    ///
    /// Propagates the cloud error for the mutation.
    #[tracing::instrument(skip(self), fields(device = %command.device_id()))]
    pub async fn forward(&self, command: &ControlCommand) -> Result<(), BridgeError> {
        match command {
            ControlCommand::SetTargetTemperature { device_id, celsius } => {
                self.cloud.set_target_temperature(device_id, *celsius).await
            }
            ControlCommand::SetHvacMode { device_id, mode } => {
                self.cloud.set_hvac_mode(device_id, *mode).await
            }
        }
    }

    /// Forward commands until every sender is dropped.
    pub async fn run(mut self) {
        while let Some(command) = self.commands.recv().await {
            if let Err(err) = self.forward(&command).await {
                tracing::warn!(%err, ?command, "failed to forward change to the cloud");
            }
        }
        tracing::debug!("command forwarder stopped");
    }

    /// Run the forwarder as a background task.
    pub fn start(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }
}
