//! Event-stream decoding for the `/devices` subscription.
//!
//! The service speaks `text/event-stream`: `event:` and `data:` lines,
//! frames separated by a blank line. Chunks from the socket can split a
//! frame (or a UTF-8 sequence) anywhere, so [`EventDecoder`] buffers raw
//! bytes and only decodes complete lines.

use hknest_domain::batch::DeviceBatch;
use serde::Deserialize;

use crate::error::NestError;

/// One decoded event-stream frame.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Event {
    pub name: String,
    pub data: String,
}

/// Incremental `text/event-stream` decoder.
#[derive(Debug, Default)]
pub struct EventDecoder {
    buffer: Vec<u8>,
    pending: Event,
}

impl EventDecoder {
    /// Feed one chunk and return the frames it completed.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<Event> {
        self.buffer.extend_from_slice(chunk);
        let mut events = Vec::new();

        while let Some(end) = self.buffer.iter().position(|b| *b == b'\n') {
            let raw: Vec<u8> = self.buffer.drain(..=end).collect();
            let line = String::from_utf8_lossy(&raw);
            let line = line.trim_end_matches(['\n', '\r']);

            if line.is_empty() {
                if !self.pending.name.is_empty() || !self.pending.data.is_empty() {
                    events.push(std::mem::take(&mut self.pending));
                }
                continue;
            }
            if line.starts_with(':') {
                continue;
            }

            let (field, value) = line.split_once(':').unwrap_or((line, ""));
            let value = value.strip_prefix(' ').unwrap_or(value);
            match field {
                "event" => self.pending.name = value.to_string(),
                "data" => {
                    if !self.pending.data.is_empty() {
                        self.pending.data.push('\n');
                    }
                    self.pending.data.push_str(value);
                }
                _ => {}
            }
        }
        events
    }
}

#[derive(Deserialize)]
struct PutPayload {
    #[serde(default)]
    path: String,
    data: serde_json::Value,
}

impl Event {
    /// Interpret the frame for the device subscription.
    ///
    /// Returns the batch carried by a `put` frame, `None` for frames that
    /// carry nothing to mirror.
    ///
    /// # Errors
    ///
    /// `auth_revoked`, `error` and `cancel` frames are terminal and map to
    /// [`NestError::AuthRevoked`], [`NestError::ErrorEvent`] and
    /// [`NestError::Cancelled`]. A `put` frame that does not parse is a
    /// [`NestError::Payload`].
    pub fn into_batch(self) -> Result<Option<DeviceBatch>, NestError> {
        match self.name.as_str() {
            "put" => {
                let payload: PutPayload =
                    serde_json::from_str(&self.data).map_err(|source| NestError::Payload {
                        what: "put event",
                        source,
                    })?;
                tracing::trace!(path = %payload.path, "received device snapshot");
                // subscriptions rooted above /devices nest the classes one level down
                let data = match payload.data {
                    serde_json::Value::Object(mut root) if root.contains_key("devices") => {
                        root.remove("devices").unwrap_or_default()
                    }
                    other => other,
                };
                let batch = serde_json::from_value(data).map_err(|source| NestError::Payload {
                    what: "device batch",
                    source,
                })?;
                Ok(Some(batch))
            }
            "keep-alive" => Ok(None),
            "auth_revoked" => Err(NestError::AuthRevoked),
            "error" => Err(NestError::ErrorEvent(self.data)),
            "cancel" => Err(NestError::Cancelled),
            other => {
                tracing::debug!(event = other, "ignoring stream event");
                Ok(None)
            }
        }
    }
}
