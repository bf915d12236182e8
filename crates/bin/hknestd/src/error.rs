//! Fatal errors of the bridge process and their exit status.

use std::error::Error as _;
use std::fmt::Write as _;

use hknest_adapter_hap::HapError;
use hknest_adapter_nest::NestError;
use hknest_domain::error::BridgeError;

use crate::config::ConfigError;

/// Every way the process can terminate abnormally.
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("authorization failed")]
    Authorization(#[source] NestError),

    #[error("failed to set up the Nest client")]
    Nest(#[source] NestError),

    #[error("failed to set up HomeKit")]
    Hap(#[from] HapError),

    #[error("device stream failed")]
    Stream(#[source] BridgeError),

    #[error("accessory {accessory:?} stopped")]
    Transport {
        accessory: String,
        #[source]
        source: BridgeError,
    },
}

impl RunError {
    /// One-line report: the error followed by each of its causes.
    #[must_use]
    pub fn report(&self) -> String {
        let mut line = self.to_string();
        let mut source = self.source();
        while let Some(cause) = source {
            let _ = write!(line, ": {cause}");
            source = cause.source();
        }
        line
    }
}

/// Exit status for the outcome of a run.
#[must_use]
pub fn exit_status(outcome: &Result<(), RunError>) -> u8 {
    u8::from(outcome.is_err())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_exit_zero_after_clean_shutdown() {
        assert_eq!(exit_status(&Ok(())), 0);
    }

    #[test]
    fn should_exit_non_zero_on_stream_error() {
        let outcome = Err(RunError::Stream(BridgeError::StreamClosed));
        assert_eq!(exit_status(&outcome), 1);
    }

    #[test]
    fn should_exit_non_zero_on_listener_failure() {
        let outcome = Err(RunError::Transport {
            accessory: "Hallway".to_string(),
            source: BridgeError::Accessory(Box::new(std::io::Error::other("address in use"))),
        });
        assert_eq!(exit_status(&outcome), 1);
    }

    #[test]
    fn should_report_whole_cause_chain_on_one_line() {
        let err = RunError::Transport {
            accessory: "Hallway".to_string(),
            source: BridgeError::Accessory(Box::new(std::io::Error::other("address in use"))),
        };
        assert_eq!(
            err.report(),
            "accessory \"Hallway\" stopped: accessory transport error: address in use"
        );
    }

    #[test]
    fn should_report_config_errors_transparently() {
        let err = RunError::from(ConfigError::Validation("HomeKit PIN must be 8 digits".into()));
        assert_eq!(
            err.report(),
            "invalid configuration: HomeKit PIN must be 8 digits"
        );
    }
}
