//! Stream port — the cloud device-change subscription.

use std::future::Future;

use hknest_domain::batch::DeviceBatch;
use hknest_domain::error::BridgeError;
use tokio_stream::Stream;

/// Source of device snapshot batches.
///
/// The returned stream blocks indefinitely between deliveries. An `Err` item
/// is terminal: consumers must stop reading after it.
pub trait DeviceStream: Send + Sync {
    /// Stream of batches produced by one subscription.
    type Batches: Stream<Item = Result<DeviceBatch, BridgeError>> + Send + Unpin + 'static;

    /// Open one subscription.
    fn subscribe(&self) -> impl Future<Output = Result<Self::Batches, BridgeError>> + Send;
}
