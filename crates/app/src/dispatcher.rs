//! Stream dispatcher — the subscription loop feeding the accessory factory.
//!
//! The dispatcher owns one subscription. Every delivered batch is handed,
//! device by device, to the [`AccessoryFactory`]. It has two states and no
//! way back: any error item, the stream ending, or the shutdown signal moves
//! it from [`Subscribed`](DispatcherState::Subscribed) to
//! [`Terminated`](DispatcherState::Terminated).

use std::future::Future;
use std::sync::Arc;

use hknest_domain::batch::DeviceBatch;
use hknest_domain::error::BridgeError;
use tokio_stream::{Stream, StreamExt};

use crate::factory::AccessoryFactory;
use crate::ports::{AccessoryHost, DeviceStream, SnapshotSink};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatcherState {
    Subscribed,
    Terminated,
}

/// Drives one device stream into the accessory factory.
pub struct StreamDispatcher<B, H, K> {
    batches: B,
    factory: Arc<AccessoryFactory<H>>,
    sink: K,
    state: DispatcherState,
}

impl<B, H, K> StreamDispatcher<B, H, K>
where
    B: Stream<Item = Result<DeviceBatch, BridgeError>> + Unpin,
    H: AccessoryHost,
    K: SnapshotSink,
{
    /// Wrap an already opened subscription.
    pub fn new(batches: B, factory: Arc<AccessoryFactory<H>>, sink: K) -> Self {
        Self {
            batches,
            factory,
            sink,
            state: DispatcherState::Subscribed,
        }
    }

    /// Open a subscription on `stream` and wrap it.
    ///
    /// # Errors
    ///
    /// Propagates the error of the subscription request.
    pub async fn subscribe<S>(
        stream: &S,
        factory: Arc<AccessoryFactory<H>>,
        sink: K,
    ) -> Result<Self, BridgeError>
    where
        S: DeviceStream<Batches = B>,
    {
        let batches = stream.subscribe().await?;
        tracing::info!("subscribed to device stream");
        Ok(Self::new(batches, factory, sink))
    }

    #[must_use]
    pub fn state(&self) -> DispatcherState {
        self.state
    }

    pub fn factory(&self) -> &AccessoryFactory<H> {
        &self.factory
    }

    /// Mirror every device of `batch`.
    ///
    /// Each snapshot reaches the sink before it reaches the factory.
    ///
    /// # Errors
    ///
    /// Returns the first accessory creation error; remaining devices of the
    /// batch are not processed.
    pub async fn dispatch(&self, batch: &DeviceBatch) -> Result<(), BridgeError> {
        tracing::debug!(devices = batch.len(), "dispatching batch");
        for thermostat in batch.thermostats.values() {
            self.sink.thermostat(thermostat);
            self.factory.thermostat(thermostat).await?;
        }
        for alarm in batch.smoke_co_alarms.values() {
            self.sink.smoke_co_alarm(alarm);
            self.factory.smoke_co_alarm(alarm).await?;
        }
        Ok(())
    }

    /// Consume the stream until it fails, ends, or `shutdown` completes.
    ///
    /// The dispatcher is [`Terminated`](DispatcherState::Terminated) when
    /// this returns, whatever the outcome.
    ///
    /// # Errors
    ///
    /// Returns the stream error, [`BridgeError::StreamClosed`] when the
    /// stream ends, or the accessory creation error. A completed `shutdown`
    /// returns `Ok(())`.
    pub async fn run_until<F>(&mut self, shutdown: F) -> Result<(), BridgeError>
    where
        F: Future<Output = ()>,
    {
        let result = self.consume(shutdown).await;
        self.state = DispatcherState::Terminated;
        match &result {
            Ok(()) => tracing::info!("device stream dispatcher stopped"),
            Err(err) => tracing::error!(%err, "device stream dispatcher terminated"),
        }
        result
    }

    async fn consume<F>(&mut self, shutdown: F) -> Result<(), BridgeError>
    where
        F: Future<Output = ()>,
    {
        if self.state == DispatcherState::Terminated {
            return Err(BridgeError::StreamClosed);
        }
        tokio::pin!(shutdown);
        loop {
            let item = tokio::select! {
                () = &mut shutdown => return Ok(()),
                item = self.batches.next() => item,
            };
            match item {
                Some(Ok(batch)) => self.dispatch(&batch).await?,
                Some(Err(err)) => return Err(err),
                None => return Err(BridgeError::StreamClosed),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::factory::FactoryOptions;
    use crate::factory::tests::{FakeHost, alarm, factory, thermostat};
    use hknest_domain::accessory::DeviceClass;
    use hknest_domain::id::DeviceId;
    use hknest_domain::smoke_co_alarm::{AlarmState, SmokeCoAlarm};
    use std::sync::Mutex;

    #[derive(Clone, Default)]
    struct RecordingSink {
        alarms: Arc<Mutex<Vec<String>>>,
    }

    impl SnapshotSink for RecordingSink {
        fn smoke_co_alarm(&self, alarm: &SmokeCoAlarm) {
            self.alarms
                .lock()
                .unwrap()
                .push(alarm.device_id.to_string());
        }
    }

    type Item = Result<DeviceBatch, BridgeError>;

    fn batch_with_alarm(id: &str) -> DeviceBatch {
        let mut batch = DeviceBatch::default();
        batch.smoke_co_alarms.insert(
            id.to_string(),
            alarm(id, AlarmState::Ok, AlarmState::Ok),
        );
        batch
    }

    fn dispatcher(
        items: Vec<Item>,
        sink: RecordingSink,
    ) -> StreamDispatcher<tokio_stream::Iter<std::vec::IntoIter<Item>>, FakeHost, RecordingSink>
    {
        let (factory, _rx) = factory(FakeHost::default(), FactoryOptions::default());
        StreamDispatcher::new(tokio_stream::iter(items), Arc::new(factory), sink)
    }

    fn stream_error() -> BridgeError {
        BridgeError::Stream(Box::new(std::io::Error::other("auth revoked")))
    }

    #[tokio::test]
    async fn should_stop_processing_after_stream_error() {
        let sink = RecordingSink::default();
        let mut dispatcher = dispatcher(
            vec![
                Ok(batch_with_alarm("a1")),
                Err(stream_error()),
                Ok(batch_with_alarm("a2")),
            ],
            sink.clone(),
        );

        let result = dispatcher.run_until(std::future::pending()).await;

        assert!(matches!(result, Err(BridgeError::Stream(_))));
        assert_eq!(dispatcher.state(), DispatcherState::Terminated);
        assert_eq!(*sink.alarms.lock().unwrap(), vec!["a1".to_string()]);
        let registries = dispatcher.factory().registries();
        assert!(
            registries
                .smoke_co_alarms
                .get(&DeviceId::new("a2").unwrap())
                .await
                .is_none()
        );
    }

    #[tokio::test]
    async fn should_keep_one_accessory_for_repeated_alarm() {
        let mut dispatcher = dispatcher(
            vec![Ok(batch_with_alarm("a1")), Ok(batch_with_alarm("a1"))],
            RecordingSink::default(),
        );

        let result = dispatcher.run_until(std::future::pending()).await;

        assert!(matches!(result, Err(BridgeError::StreamClosed)));
        let registries = dispatcher.factory().registries();
        assert_eq!(registries.len(DeviceClass::SmokeCoAlarm).await, 1);
    }

    #[tokio::test]
    async fn should_dispatch_thermostats_and_alarms() {
        let mut batch = batch_with_alarm("a1");
        batch
            .thermostats
            .insert("t1".to_string(), thermostat("t1", 21.5));
        let dispatcher = dispatcher(vec![], RecordingSink::default());

        dispatcher.dispatch(&batch).await.unwrap();

        let registries = dispatcher.factory().registries();
        assert_eq!(registries.len(DeviceClass::Thermostat).await, 1);
        assert_eq!(registries.len(DeviceClass::SmokeCoAlarm).await, 1);
        let accessory = registries
            .thermostats
            .get(&DeviceId::new("t1").unwrap())
            .await
            .unwrap();
        let presented = accessory.control.presented();
        assert!((presented.current_temperature - 21.5).abs() < f32::EPSILON);
    }

    #[tokio::test]
    async fn should_terminate_cleanly_on_shutdown() {
        let (factory, _rx) = factory(FakeHost::default(), FactoryOptions::default());
        let mut dispatcher = StreamDispatcher::new(
            tokio_stream::pending::<Item>(),
            Arc::new(factory),
            RecordingSink::default(),
        );
        assert_eq!(dispatcher.state(), DispatcherState::Subscribed);

        let result = dispatcher.run_until(async {}).await;

        assert!(result.is_ok());
        assert_eq!(dispatcher.state(), DispatcherState::Terminated);
    }

    #[tokio::test]
    async fn should_not_resume_once_terminated() {
        let mut dispatcher = dispatcher(vec![], RecordingSink::default());
        let _ = dispatcher.run_until(std::future::pending()).await;

        let result = dispatcher.run_until(std::future::pending()).await;
        assert!(matches!(result, Err(BridgeError::StreamClosed)));
    }
}
