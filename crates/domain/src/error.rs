//! Common error types used across the workspace.
//!
//! Each layer defines its own typed errors and converts into [`BridgeError`]
//! when crossing a port boundary.

/// Boxed error source carried across port boundaries.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Top-level error for every operation exposed through a port.
#[derive(Debug, thiserror::Error)]
pub enum BridgeError {
    /// A domain invariant was violated.
    #[error("validation error")]
    Validation(#[from] ValidationError),

    /// The cloud device service failed (authorization or mutation).
    #[error("cloud service error")]
    Cloud(#[source] BoxError),

    /// The local accessory transport failed to start or stopped with an error.
    #[error("accessory transport error")]
    Accessory(#[source] BoxError),

    /// The cloud device stream delivered an error.
    #[error("device stream error")]
    Stream(#[source] BoxError),

    /// The cloud device stream ended without delivering an error.
    #[error("device stream closed")]
    StreamClosed,
}

/// Domain invariant violations.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    /// A device snapshot carried an empty identifier.
    #[error("device id must not be empty")]
    EmptyDeviceId,

    /// A pairing PIN is not made of exactly eight digits.
    #[error("pairing PIN must be 8 digits, got {0:?}")]
    InvalidPin(String),
}
