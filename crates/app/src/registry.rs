//! Device registry — one accessory wrapper per cloud device id.
//!
//! Entries are never evicted or replaced. A single async mutex guards each
//! registry and is held while a missing wrapper is being created, so two
//! concurrent callers for the same id can never both create one.

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use hknest_domain::accessory::DeviceClass;
use hknest_domain::id::DeviceId;
use tokio::sync::Mutex;

use crate::accessory::{SmokeCoAlarmAccessory, ThermostatAccessory};

/// Identifier → wrapper mapping with get-or-create semantics.
pub struct DeviceRegistry<W> {
    entries: Mutex<HashMap<DeviceId, Arc<W>>>,
}

impl<W> Default for DeviceRegistry<W> {
    fn default() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }
}

impl<W> DeviceRegistry<W> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the wrapper registered for `id`, creating it with `create` on
    /// first sight.
    ///
    /// The boolean is `true` when the wrapper already existed, in which case
    /// `create` is not called.
    ///
    /// # Errors
    ///
    /// Propagates the error from `create`; nothing is registered then.
    pub async fn get_or_create<F, Fut, E>(
        &self,
        id: &DeviceId,
        create: F,
    ) -> Result<(Arc<W>, bool), E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<W, E>>,
    {
        let mut entries = self.entries.lock().await;
        if let Some(existing) = entries.get(id) {
            return Ok((Arc::clone(existing), true));
        }
        let wrapper = Arc::new(create().await?);
        entries.insert(id.clone(), Arc::clone(&wrapper));
        Ok((wrapper, false))
    }

    /// Look up the wrapper registered for `id`.
    pub async fn get(&self, id: &DeviceId) -> Option<Arc<W>> {
        self.entries.lock().await.get(id).cloned()
    }

    /// Number of registered wrappers.
    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }
}

/// One registry per mirrored device class.
#[derive(Default)]
pub struct Registries {
    pub thermostats: DeviceRegistry<ThermostatAccessory>,
    pub smoke_co_alarms: DeviceRegistry<SmokeCoAlarmAccessory>,
}

impl Registries {
    /// Number of wrappers registered for `class`.
    pub async fn len(&self, class: DeviceClass) -> usize {
        match class {
            DeviceClass::Thermostat => self.thermostats.len().await,
            DeviceClass::SmokeCoAlarm => self.smoke_co_alarms.len().await,
        }
    }
}
