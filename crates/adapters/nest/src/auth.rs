//! One-time OAuth PIN authorization.
//!
//! The operator opens [`NestCredentials::authorization_url`], approves the
//! product, and receives a PIN. [`NestCredentials::exchange_pin`] trades that
//! PIN for a bearer token that can be reused on later runs.

use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use url::Url;

use crate::config::NestConfig;
use crate::error::NestError;

/// Product credentials and the operator-supplied PIN.
#[derive(Debug)]
pub struct NestCredentials {
    pub product_id: String,
    pub product_secret: SecretString,
    /// Opaque value echoed back by the login page.
    pub state: String,
    pub pin: String,
}

/// Bearer token obtained from a PIN exchange.
#[derive(Debug)]
pub struct AccessToken {
    pub token: SecretString,
    pub expires_in: Option<Duration>,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    #[serde(default)]
    expires_in: Option<u64>,
}

impl NestCredentials {
    /// Page the operator visits to obtain a PIN for this product.
    ///
    /// # Errors
    ///
    /// Returns [`NestError::InvalidUrl`] if the configured login URL is invalid.
    pub fn authorization_url(&self, config: &NestConfig) -> Result<Url, NestError> {
        let mut url = Url::parse(&config.login_url)?;
        url.query_pairs_mut()
            .append_pair("client_id", &self.product_id)
            .append_pair("state", &self.state);
        Ok(url)
    }

    /// Exchange the PIN for a bearer token.
    ///
    /// # Errors
    ///
    /// Returns [`NestError::Api`] when the service rejects the credentials,
    /// [`NestError::Payload`] when the answer carries no token, or
    /// [`NestError::Transport`] on network failure.
    #[tracing::instrument(skip_all, fields(product_id = %self.product_id))]
    pub async fn exchange_pin(
        &self,
        http: &reqwest::Client,
        config: &NestConfig,
    ) -> Result<AccessToken, NestError> {
        let url = Url::parse(&config.token_url)?;
        let form = [
            ("client_id", self.product_id.as_str()),
            ("client_secret", self.product_secret.expose_secret()),
            ("code", self.pin.as_str()),
            ("grant_type", "authorization_code"),
        ];

        tracing::debug!(%url, "exchanging authorization PIN");
        let resp = http
            .post(url)
            .timeout(config.request_timeout())
            .form(&form)
            .send()
            .await?;

        let status = resp.status();
        let body = resp.text().await?;
        if !status.is_success() {
            return Err(NestError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: TokenResponse =
            serde_json::from_str(&body).map_err(|source| NestError::Payload {
                what: "token response",
                source,
            })?;
        tracing::info!(expires_in = ?parsed.expires_in, "obtained access token");

        Ok(AccessToken {
            token: SecretString::from(parsed.access_token),
            expires_in: parsed.expires_in.map(Duration::from_secs),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn credentials() -> NestCredentials {
        NestCredentials {
            product_id: "product-1".to_string(),
            product_secret: SecretString::from("s3cret"),
            state: "xyz".to_string(),
            pin: "ABCD1234".to_string(),
        }
    }

    #[test]
    fn should_build_authorization_url_with_client_id_and_state() {
        let url = credentials()
            .authorization_url(&NestConfig::default())
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://home.nest.com/login/oauth2?client_id=product-1&state=xyz"
        );
    }

    #[test]
    fn should_not_leak_secret_in_debug_output() {
        let debug = format!("{:?}", credentials());
        assert!(!debug.contains("s3cret"));
    }
}
