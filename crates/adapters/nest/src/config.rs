//! Nest cloud endpoints and HTTP settings.

use std::time::Duration;

use serde::Deserialize;

use crate::error::NestError;

/// Configuration for the Nest cloud adapter.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NestConfig {
    /// Page the operator visits to obtain a PIN.
    pub login_url: String,
    /// Token endpoint the PIN is exchanged at.
    pub token_url: String,
    /// Base URL of the device API.
    pub api_url: String,
    /// Connection timeout, in seconds.
    pub connect_timeout_secs: u64,
    /// Timeout for authorization and mutation requests, in seconds.
    /// Does not apply to the device stream.
    pub request_timeout_secs: u64,
}

impl Default for NestConfig {
    fn default() -> Self {
        Self {
            login_url: "https://home.nest.com/login/oauth2".to_string(),
            token_url: "https://api.home.nest.com/oauth2/access_token".to_string(),
            api_url: "https://developer-api.nest.com".to_string(),
            connect_timeout_secs: 10,
            request_timeout_secs: 30,
        }
    }
}

impl NestConfig {
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    /// Build the HTTP client shared by authorization, stream and mutations.
    ///
    /// Redirects are not followed automatically: the device API redirects
    /// to a per-user host and the bearer header must survive the hop.
    ///
    /// # Errors
    ///
    /// Returns [`NestError::Transport`] if the TLS backend cannot be set up.
    pub fn build_client(&self) -> Result<reqwest::Client, NestError> {
        reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(self.connect_timeout_secs))
            .redirect(reqwest::redirect::Policy::none())
            .user_agent(concat!("hknest/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(NestError::from)
    }
}
