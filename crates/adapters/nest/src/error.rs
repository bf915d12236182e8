//! Nest adapter error types.

use hknest_domain::error::BridgeError;

/// Errors specific to the Nest cloud adapter.
#[derive(Debug, thiserror::Error)]
pub enum NestError {
    /// HTTP transport failure (connection refused, DNS, TLS, timeout).
    #[error("HTTP transport error")]
    Transport(#[from] reqwest::Error),

    /// A configured endpoint is not a valid URL.
    #[error("invalid URL")]
    InvalidUrl(#[from] url::ParseError),

    /// The service answered with a non-success status.
    #[error("Nest API error (HTTP {status}): {body}")]
    Api { status: u16, body: String },

    /// A redirect response carried no usable `Location` header.
    #[error("redirect without location (HTTP {status})")]
    MissingLocation { status: u16 },

    /// The service kept redirecting.
    #[error("too many redirects")]
    TooManyRedirects,

    /// A response or event payload could not be parsed.
    #[error("failed to parse {what}")]
    Payload {
        what: &'static str,
        #[source]
        source: serde_json::Error,
    },

    /// The stream reported that the token was revoked.
    #[error("authorization revoked")]
    AuthRevoked,

    /// The stream reported an error event.
    #[error("stream error event: {0}")]
    ErrorEvent(String),

    /// The service closed the subscription.
    #[error("stream cancelled by the service")]
    Cancelled,
}

impl NestError {
    /// Whether the error is the stream telling the client to stop.
    #[must_use]
    pub fn is_stream_event(&self) -> bool {
        matches!(self, Self::AuthRevoked | Self::ErrorEvent(_) | Self::Cancelled)
    }

    /// Convert into a [`BridgeError`] for propagation across port boundaries.
    pub fn into_domain(self) -> BridgeError {
        if self.is_stream_event() {
            BridgeError::Stream(Box::new(self))
        } else {
            BridgeError::Cloud(Box::new(self))
        }
    }
}

impl From<NestError> for BridgeError {
    fn from(err: NestError) -> Self {
        err.into_domain()
    }
}
