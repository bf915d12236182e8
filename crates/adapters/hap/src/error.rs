//! HomeKit adapter error types.

use hknest_domain::error::{BridgeError, ValidationError};

/// Errors specific to the HomeKit adapter.
#[derive(Debug, thiserror::Error)]
pub enum HapError {
    /// The HAP library rejected an accessory, a PIN, or failed to serve.
    #[error("HAP error")]
    Hap(#[from] hap::Error),

    /// The pairing store could not be prepared.
    #[error("storage error")]
    Io(#[from] std::io::Error),

    /// Every port after the base port is taken.
    #[error("no port left after {base}")]
    PortExhausted { base: u16 },

    /// A domain-level error (invalid PIN format, etc.).
    #[error("domain error")]
    Domain(#[source] ValidationError),
}

impl HapError {
    /// Convert into a [`BridgeError`] for propagation across port boundaries.
    pub fn into_domain(self) -> BridgeError {
        match self {
            Self::Domain(err) => BridgeError::Validation(err),
            other => BridgeError::Accessory(Box::new(other)),
        }
    }
}

impl From<HapError> for BridgeError {
    fn from(err: HapError) -> Self {
        err.into_domain()
    }
}

impl From<ValidationError> for HapError {
    fn from(err: ValidationError) -> Self {
        Self::Domain(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn should_convert_port_exhaustion_to_accessory_error() {
        let err: BridgeError = HapError::PortExhausted { base: 65535 }.into();
        assert!(matches!(err, BridgeError::Accessory(_)));
    }

    #[test]
    fn should_convert_domain_error_back_to_validation() {
        let err: BridgeError = HapError::from(ValidationError::InvalidPin("1".into())).into();
        assert!(matches!(
            err,
            BridgeError::Validation(ValidationError::InvalidPin(_))
        ));
    }

    #[test]
    fn should_display_port_exhaustion() {
        let err = HapError::PortExhausted { base: 65535 };
        assert_eq!(err.to_string(), "no port left after 65535");
    }
}
