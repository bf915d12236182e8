//! Configuration loading — TOML file, then environment, then CLI flags.
//!
//! Looks for `hknest.toml` (or the `--config` path). Every field has a
//! sensible default so the file is optional. Command-line flags (and their
//! `HKNEST_*` environment variables) take precedence over file values.

use std::path::Path;
use std::time::Duration;

use hknest_adapter_hap::HapConfig;
use hknest_adapter_hap::pin::parse_digits;
use hknest_adapter_nest::{NestConfig, NestCredentials};
use secrecy::SecretString;
use serde::{Deserialize, Deserializer};

use crate::cli::Cli;

/// Top-level configuration.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Nest credentials and endpoints.
    pub nest: NestSettings,
    /// HomeKit pairing settings.
    pub homekit: HapConfig,
    /// Logging settings.
    pub logging: LoggingConfig,
    /// Bridge behaviour.
    pub bridge: BridgeConfig,
}

/// Nest credentials. Either a token, or everything needed to obtain one.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct NestSettings {
    pub product_id: Option<String>,
    #[serde(deserialize_with = "secret")]
    pub product_secret: Option<SecretString>,
    pub state: Option<String>,
    pub pin: Option<String>,
    #[serde(deserialize_with = "secret")]
    pub token: Option<SecretString>,
    /// Service endpoints.
    pub api: NestConfig,
}

/// How the bridge gets its bearer token.
#[derive(Debug)]
pub enum NestAuth {
    /// Reuse a token from an earlier authorization.
    Token(SecretString),
    /// Exchange a PIN for a new token.
    Pin(NestCredentials),
}

/// Logging configuration.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Filter directive (`RUST_LOG` syntax) used in verbose mode.
    pub filter: String,
    /// Whether log output is displayed beyond warnings.
    pub verbose: bool,
}

/// Bridge behaviour.
#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Mirror smoke/CO alarm levels into the local sensors.
    pub mirror_alarm_state: bool,
    /// How long to wait for each transport to stop on termination, in seconds.
    pub shutdown_timeout_secs: u64,
}

fn secret<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<SecretString>, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.map(SecretString::from))
}

impl Config {
    /// Load configuration from `path` (if present), then apply environment
    /// and command-line overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML file exists but is malformed, or if the
    /// resulting configuration is invalid.
    pub fn load(path: &Path, cli: &Cli) -> Result<Self, ConfigError> {
        let mut config = Self::from_file(path)?;
        config.apply_env_overrides();
        config.apply_cli(cli);
        config.validate()?;
        Ok(config)
    }

    fn from_file(path: &Path) -> Result<Self, ConfigError> {
        match std::fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(ConfigError::Parse),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(ConfigError::Io(err)),
        }
    }

    /// An explicit log filter from the environment is always honoured.
    fn apply_env_overrides(&mut self) {
        for name in ["HKNEST_LOG", "RUST_LOG"] {
            if let Ok(val) = std::env::var(name) {
                self.logging.filter = val;
                self.logging.verbose = true;
            }
        }
    }

    fn apply_cli(&mut self, cli: &Cli) {
        if let Some(val) = &cli.product_id {
            self.nest.product_id = Some(val.clone());
        }
        if let Some(val) = &cli.product_secret {
            self.nest.product_secret = Some(SecretString::from(val.as_str()));
        }
        if let Some(val) = &cli.state {
            self.nest.state = Some(val.clone());
        }
        if let Some(val) = &cli.nest_pin {
            self.nest.pin = Some(val.clone());
        }
        if let Some(val) = &cli.nest_token {
            self.nest.token = Some(SecretString::from(val.as_str()));
        }
        if let Some(val) = &cli.homekit_pin {
            self.homekit.pin.clone_from(val);
        }
        if cli.verbose {
            self.logging.verbose = true;
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if !self.nest.has_token() && !self.nest.has_pin_credentials() {
            return Err(ConfigError::Validation(
                "a Nest token, or a product id, product secret and Nest PIN, is required"
                    .to_string(),
            ));
        }
        parse_digits(&self.homekit.pin)
            .map_err(|_| ConfigError::Validation("HomeKit PIN must be 8 digits".to_string()))?;
        if self.homekit.base_port == 0 {
            return Err(ConfigError::Validation(
                "HomeKit base port must be non-zero".to_string(),
            ));
        }
        Ok(())
    }

    /// Filter directive to install: the configured one in verbose mode,
    /// warnings only otherwise.
    #[must_use]
    pub fn log_filter(&self) -> &str {
        if self.logging.verbose {
            &self.logging.filter
        } else {
            "warn"
        }
    }
}

impl NestSettings {
    fn has_token(&self) -> bool {
        self.token.is_some()
    }

    fn has_pin_credentials(&self) -> bool {
        self.product_id.is_some() && self.product_secret.is_some() && self.pin.is_some()
    }

    /// Split the settings into the authorization to perform and the endpoints.
    ///
    /// A token wins over PIN credentials.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Validation`] when neither is complete.
    pub fn into_auth(self) -> Result<(NestAuth, NestConfig), ConfigError> {
        if let Some(token) = self.token {
            return Ok((NestAuth::Token(token), self.api));
        }
        match (self.product_id, self.product_secret, self.pin) {
            (Some(product_id), Some(product_secret), Some(pin)) => Ok((
                NestAuth::Pin(NestCredentials {
                    product_id,
                    product_secret,
                    state: self.state.unwrap_or_default(),
                    pin,
                }),
                self.api,
            )),
            _ => Err(ConfigError::Validation(
                "incomplete Nest credentials".to_string(),
            )),
        }
    }
}

impl BridgeConfig {
    #[must_use]
    pub fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_secs)
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: "hknestd=debug,hknest=debug,hap=info".to_string(),
            verbose: false,
        }
    }
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            mirror_alarm_state: true,
            shutdown_timeout_secs: 5,
        }
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML parse failure.
    #[error("failed to parse config file")]
    Parse(#[from] toml::de::Error),
    /// File I/O failure.
    #[error("failed to read config file")]
    Io(#[from] std::io::Error),
    /// Semantic validation failure.
    #[error("invalid configuration: {0}")]
    Validation(String),
}
