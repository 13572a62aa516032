//! Defines the worker implementation for the event sync executor

use std::thread::{self, JoinHandle};

use async_trait::async_trait;
use common::worker::Worker;
use tokio::runtime::Builder as TokioBuilder;

use crate::{
    error::EventSyncError,
    listener::{EventSyncConfig, EventSyncExecutor},
};

/// The name of the thread the executor runs on
const EXECUTOR_THREAD_NAME: &str = "event-sync-executor";

/// The worker that syncs a contract's events in the background
pub struct EventSyncWorker {
    /// The executor, taken when the worker starts
    executor: Option<EventSyncExecutor>,
    /// The handle on the executor's thread
    executor_handle: Option<JoinHandle<EventSyncError>>,
}

#[async_trait]
impl Worker for EventSyncWorker {
    type WorkerConfig = EventSyncConfig;
    type Error = EventSyncError;

    async fn new(config: Self::WorkerConfig) -> Result<Self, Self::Error> {
        let executor = EventSyncExecutor::new(config);
        Ok(Self { executor: Some(executor), executor_handle: None })
    }

    fn name(&self) -> String {
        "event-sync".to_string()
    }

    fn is_recoverable(&self) -> bool {
        false
    }

    fn join(&mut self) -> Vec<JoinHandle<Self::Error>> {
        self.executor_handle.take().into_iter().collect()
    }

    fn start(&mut self) -> Result<(), Self::Error> {
        let executor = self
            .executor
            .take()
            .ok_or_else(|| EventSyncError::Setup("worker already started".to_string()))?;

        // The executor runs ticks one at a time, a single thread suffices
        let runtime = TokioBuilder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|err| EventSyncError::Setup(err.to_string()))?;

        let handle = thread::Builder::new()
            .name(EXECUTOR_THREAD_NAME.to_string())
            .spawn(move || match runtime.block_on(executor.execution_loop()) {
                Err(e) => e,
                Ok(()) => EventSyncError::Cancelled("execution loop exited".to_string()),
            })
            .map_err(|err| EventSyncError::Setup(err.to_string()))?;

        self.executor_handle = Some(handle);
        Ok(())
    }

    fn cleanup(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use std::{sync::Arc, time::Duration};

    use common::{types::new_cancel_channel, worker::Worker};

    use super::EventSyncWorker;
    use crate::{
        error::EventSyncError,
        listener::{EventSyncConfig, new_snapshot_channel},
        mocks::{MockEventSource, MockHeightSource},
        tracker::DEFAULT_FETCH_TIMEOUT_MS,
    };

    /// Tests that the worker runs on its own thread and exits on cancel
    #[tokio::test]
    async fn test_worker_start_and_cancel() {
        let (snapshot_sender, mut snapshots) = new_snapshot_channel();
        let (cancel, cancel_channel) = new_cancel_channel();
        let config = EventSyncConfig {
            contract_address: "0x7de".parse().unwrap(),
            poll_interval: Duration::from_millis(10),
            chunk_size: 10,
            fetch_timeout: Duration::from_millis(DEFAULT_FETCH_TIMEOUT_MS),
            recent_events_limit: 5,
            workshop_end_block: 100,
            event_source: Arc::new(MockEventSource::new()),
            height_source: Arc::new(MockHeightSource::new(20)),
            snapshot_sender,
            cancel_channel,
        };

        let mut worker = EventSyncWorker::new(config).await.unwrap();
        worker.start().unwrap();
        assert!(worker.start().is_err());

        snapshots.wait_for(|s| s.cursor == 20).await.unwrap();
        cancel.send(()).unwrap();

        let mut handles = worker.join();
        assert_eq!(handles.len(), 1);
        let handle = handles.remove(0);
        let err = tokio::task::spawn_blocking(move || handle.join().unwrap()).await.unwrap();
        assert!(matches!(err, EventSyncError::Cancelled(_)));
    }
}
