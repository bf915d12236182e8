//! HomeKit transport configuration.

use std::path::PathBuf;

use serde::Deserialize;

/// Configuration shared by every accessory transport.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HapConfig {
    /// Pairing PIN, `XXXXXXXX` or `XXX-XX-XXX`.
    pub pin: String,
    /// Directory holding one pairing store per accessory.
    pub storage_dir: PathBuf,
    /// Port of the first accessory; each further accessory takes the next one.
    pub base_port: u16,
}

impl Default for HapConfig {
    fn default() -> Self {
        Self {
            pin: "00102003".to_string(),
            storage_dir: PathBuf::from("data/homekit"),
            base_port: 51826,
        }
    }
}
