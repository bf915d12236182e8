//! Transport supervision — runs every accessory listener as a background task.
//!
//! Listeners are fire-and-forget from the factory's point of view, but never
//! unsupervised: a listener that fails is reported on the failure channel,
//! and [`Transports::stop_all`] stops every listener with a bounded wait.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use hknest_domain::error::BridgeError;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::ports::Listener;

/// A listener that stopped with an error.
#[derive(Debug)]
pub struct TransportFailure {
    pub accessory: String,
    pub error: BridgeError,
}

/// Handle on one running accessory listener.
#[derive(Debug)]
pub struct TransportHandle {
    name: String,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl TransportHandle {
    /// Accessory name the listener serves.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the listener task is still running.
    #[must_use]
    pub fn is_running(&self) -> bool {
        self.lock().as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Stop the listener, waiting at most `timeout` for it to wind down.
    ///
    /// Returns `false` if the listener did not finish in time. Stopping an
    /// already stopped listener returns `true`.
    pub async fn stop(&self, timeout: Duration) -> bool {
        let Some(task) = self.lock().take() else {
            return true;
        };
        task.abort();
        tokio::time::timeout(timeout, task).await.is_ok()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Option<JoinHandle<()>>> {
        self.task.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Every listener started during the process lifetime.
#[derive(Clone)]
pub struct Transports {
    handles: Arc<Mutex<Vec<Arc<TransportHandle>>>>,
    failures: mpsc::UnboundedSender<TransportFailure>,
}

impl Transports {
    /// Create an empty set and the receiver its failures are reported on.
    #[must_use]
    pub fn new() -> (Self, mpsc::UnboundedReceiver<TransportFailure>) {
        let (failures, rx) = mpsc::unbounded_channel();
        let transports = Self {
            handles: Arc::new(Mutex::new(Vec::new())),
            failures,
        };
        (transports, rx)
    }

    /// Run `listener` in the background and keep a handle on it.
    pub fn spawn(&self, name: impl Into<String>, listener: Listener) -> Arc<TransportHandle> {
        let name = name.into();
        let failures = self.failures.clone();
        let accessory = name.clone();
        let task = tokio::spawn(async move {
            match listener.await {
                Ok(()) => tracing::info!(%accessory, "accessory transport stopped"),
                Err(error) => {
                    tracing::error!(%accessory, %error, "accessory transport failed");
                    let _ = failures.send(TransportFailure { accessory, error });
                }
            }
        });

        let handle = Arc::new(TransportHandle {
            name,
            task: Mutex::new(Some(task)),
        });
        self.lock().push(Arc::clone(&handle));
        handle
    }

    /// Number of listeners started so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    /// Stop every listener, waiting at most `timeout` for each.
    ///
    /// Returns the number of listeners that did not finish in time.
    pub async fn stop_all(&self, timeout: Duration) -> usize {
        let handles: Vec<_> = self.lock().clone();
        let mut lingering = 0;
        for handle in handles {
            if !handle.stop(timeout).await {
                tracing::warn!(accessory = handle.name(), "transport did not stop in time");
                lingering += 1;
            }
        }
        lingering
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<Arc<TransportHandle>>> {
        self.handles.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
