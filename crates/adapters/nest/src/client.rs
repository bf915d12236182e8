//! Authenticated client for the Nest device API.

use std::future::Future;
use std::time::Duration;

use hknest_app::ports::{CloudDevices, DeviceStream};
use hknest_domain::batch::DeviceBatch;
use hknest_domain::error::BridgeError;
use hknest_domain::id::DeviceId;
use hknest_domain::thermostat::HvacMode;
use reqwest::header::{ACCEPT, LOCATION};
use secrecy::{ExposeSecret, SecretString};
use serde_json::json;
use tokio::sync::mpsc;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::ReceiverStream;
use url::Url;

use crate::config::NestConfig;
use crate::error::NestError;
use crate::sse::EventDecoder;

const MAX_REDIRECTS: usize = 5;
const STREAM_BUFFER: usize = 16;

/// Batches decoded from one `/devices` subscription.
pub type DeviceBatches = ReceiverStream<Result<DeviceBatch, BridgeError>>;

/// Nest device API client holding the bearer token.
pub struct NestClient {
    http: reqwest::Client,
    api_url: Url,
    token: SecretString,
    request_timeout: Duration,
}

impl NestClient {
    /// Build a client from the adapter configuration.
    ///
    /// # Errors
    ///
    /// Returns [`NestError::InvalidUrl`] for an invalid API URL, or
    /// [`NestError::Transport`] if the HTTP client cannot be built.
    pub fn new(config: &NestConfig, token: SecretString) -> Result<Self, NestError> {
        let http = config.build_client()?;
        let mut client = Self::from_reqwest(&config.api_url, http, token)?;
        client.request_timeout = config.request_timeout();
        Ok(client)
    }

    /// Wrap an existing `reqwest::Client`.
    ///
    /// The client must not follow redirects itself.
    ///
    /// # Errors
    ///
    /// Returns [`NestError::InvalidUrl`] for an invalid API URL.
    pub fn from_reqwest(
        api_url: &str,
        http: reqwest::Client,
        token: SecretString,
    ) -> Result<Self, NestError> {
        let mut api_url = Url::parse(api_url)?;
        if !api_url.path().ends_with('/') {
            let path = format!("{}/", api_url.path());
            api_url.set_path(&path);
        }
        Ok(Self {
            http,
            api_url,
            token,
            request_timeout: NestConfig::default().request_timeout(),
        })
    }

    fn url(&self, path: &str) -> Result<Url, NestError> {
        Ok(self.api_url.join(path)?)
    }

    /// Send the request built by `build`, following redirects by hand so
    /// the bearer header is sent to the redirect target too.
    async fn send<F>(&self, mut url: Url, build: F) -> Result<reqwest::Response, NestError>
    where
        F: Fn(Url) -> reqwest::RequestBuilder,
    {
        for _ in 0..=MAX_REDIRECTS {
            let resp = build(url.clone())
                .bearer_auth(self.token.expose_secret())
                .send()
                .await?;
            let status = resp.status();

            if status.is_redirection() {
                let location = resp
                    .headers()
                    .get(LOCATION)
                    .and_then(|value| value.to_str().ok())
                    .ok_or(NestError::MissingLocation {
                        status: status.as_u16(),
                    })?;
                url = url.join(location)?;
                tracing::debug!(%url, "following redirect");
                continue;
            }

            if status.is_success() {
                return Ok(resp);
            }
            let body = resp.text().await.unwrap_or_default();
            return Err(NestError::Api {
                status: status.as_u16(),
                body,
            });
        }
        Err(NestError::TooManyRedirects)
    }

    async fn put_thermostat(
        &self,
        device_id: &DeviceId,
        body: serde_json::Value,
    ) -> Result<(), NestError> {
        let url = self.url(&format!("devices/thermostats/{device_id}"))?;
        tracing::debug!(%url, %body, "PUT thermostat");
        self.send(url, |url| {
            self.http
                .put(url)
                .timeout(self.request_timeout)
                .json(&body)
        })
        .await?;
        Ok(())
    }

    /// Open the `/devices` event stream.
    ///
    /// Frames are decoded on a background task. The returned stream yields
    /// one batch per `put` frame, at most one error, and ends after it.
    ///
    /// # Errors
    ///
    /// Returns the error of the subscription request itself.
    pub async fn devices(&self) -> Result<DeviceBatches, NestError> {
        let url = self.url("devices")?;
        tracing::debug!(%url, "opening device stream");
        let resp = self
            .send(url, |url| {
                self.http.get(url).header(ACCEPT, "text/event-stream")
            })
            .await?;

        let (tx, rx) = mpsc::channel(STREAM_BUFFER);
        tokio::spawn(read_events(resp, tx));
        Ok(ReceiverStream::new(rx))
    }
}

async fn read_events(
    resp: reqwest::Response,
    tx: mpsc::Sender<Result<DeviceBatch, BridgeError>>,
) {
    let mut decoder = EventDecoder::default();
    let mut chunks = std::pin::pin!(resp.bytes_stream());

    loop {
        let chunk = tokio::select! {
            () = tx.closed() => {
                tracing::debug!("device stream dropped by consumer");
                return;
            }
            chunk = chunks.next() => chunk,
        };
        let chunk = match chunk {
            Some(Ok(chunk)) => chunk,
            Some(Err(err)) => {
                let _ = tx
                    .send(Err(BridgeError::Stream(Box::new(NestError::from(err)))))
                    .await;
                return;
            }
            None => {
                tracing::debug!("device stream ended");
                return;
            }
        };

        for event in decoder.push(&chunk) {
            match event.into_batch() {
                Ok(Some(batch)) => {
                    if tx.send(Ok(batch)).await.is_err() {
                        return;
                    }
                }
                Ok(None) => {}
                Err(err) => {
                    let _ = tx.send(Err(BridgeError::Stream(Box::new(err)))).await;
                    return;
                }
            }
        }
    }
}

impl CloudDevices for NestClient {
    async fn set_target_temperature(
        &self,
        device_id: &DeviceId,
        celsius: f32,
    ) -> Result<(), BridgeError> {
        self.put_thermostat(device_id, json!({ "target_temperature_c": celsius }))
            .await?;
        tracing::info!(%device_id, celsius, "target temperature updated");
        Ok(())
    }

    async fn set_hvac_mode(&self, device_id: &DeviceId, mode: HvacMode) -> Result<(), BridgeError> {
        self.put_thermostat(device_id, json!({ "hvac_mode": mode.as_str() }))
            .await?;
        tracing::info!(%device_id, %mode, "hvac mode updated");
        Ok(())
    }
}

impl DeviceStream for NestClient {
    type Batches = DeviceBatches;

    fn subscribe(&self) -> impl Future<Output = Result<Self::Batches, BridgeError>> + Send {
        async move { self.devices().await.map_err(|err| BridgeError::Stream(Box::new(err))) }
    }
}
