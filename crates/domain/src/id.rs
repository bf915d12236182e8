//! Cloud device identifier.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// Identifier the cloud assigns to a device.
///
/// Opaque, stable across snapshots of the same device, and never empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DeviceId(String);

impl DeviceId {
    /// Wrap a raw identifier.
    ///
    /// # Errors
    ///
    /// Returns [`ValidationError::EmptyDeviceId`] when `raw` is empty or only
    /// whitespace.
    pub fn new(raw: impl Into<String>) -> Result<Self, ValidationError> {
        let raw = raw.into();
        if raw.trim().is_empty() {
            return Err(ValidationError::EmptyDeviceId);
        }
        Ok(Self(raw))
    }

    /// Borrow the raw identifier.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Identifier reduced to `[A-Za-z0-9_-]`, safe to use as a directory name.
    #[must_use]
    pub fn slug(&self) -> String {
        self.0
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                    c
                } else {
                    '_'
                }
            })
            .collect()
    }
}

impl fmt::Display for DeviceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for DeviceId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl TryFrom<String> for DeviceId {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<DeviceId> for String {
    fn from(value: DeviceId) -> Self {
        value.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_reject_empty_id() {
        assert_eq!(DeviceId::new(""), Err(ValidationError::EmptyDeviceId));
        assert_eq!(DeviceId::new("   "), Err(ValidationError::EmptyDeviceId));
    }

    #[test]
    fn should_display_raw_id() {
        let id = DeviceId::new("peyiJNo0IldT2YlIVtYaGQ").unwrap();
        assert_eq!(id.to_string(), "peyiJNo0IldT2YlIVtYaGQ");
    }

    #[test]
    fn should_reject_empty_id_when_deserializing() {
        let result = serde_json::from_str::<DeviceId>("\"\"");
        assert!(result.is_err());
    }

    #[test]
    fn should_deserialize_from_plain_string() {
        let id: DeviceId = serde_json::from_str("\"abc\"").unwrap();
        assert_eq!(id.as_str(), "abc");
    }

    #[test]
    fn should_replace_unsafe_characters_in_slug() {
        let id = DeviceId::new("a/b.c-d_e").unwrap();
        assert_eq!(id.slug(), "a_b_c-d_e");
    }
}
