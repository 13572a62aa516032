//! Defines the polling loop that drives the event sync tracker

use std::{sync::Arc, time::Duration};

use common::{
    chain_source::{BlockHeightSource, ChainEventSource},
    types::{
        CancelChannel,
        chain::{BlockNumber, ContractAddress},
        events::ContractEvent,
    },
};
use tokio::{
    sync::watch,
    time::{MissedTickBehavior, interval},
};
use tracing::{debug, info, warn};

use crate::{
    display::WorkshopStatus,
    error::EventSyncError,
    labels::{
        NUM_EVENTS_SYNCED_METRIC, NUM_HEIGHT_FAILURES_METRIC, NUM_SKIPPED_TICKS_METRIC,
        NUM_SYNC_FAILURES_METRIC, SYNC_CURSOR_METRIC,
    },
    tracker::{EventSyncTracker, TickOutcome},
};

/// The default interval at which the block height is polled
pub const DEFAULT_POLL_INTERVAL_MS: u64 = 1_000; // 1 second

// ------------
// | Snapshot |
// ------------

/// A copy of the tracker's state, published after every tick for display
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SyncSnapshot {
    /// The contract being synced
    pub contract: Option<ContractAddress>,
    /// The latest block height observed
    pub latest_block: Option<BlockNumber>,
    /// The highest block scanned for events
    pub cursor: BlockNumber,
    /// The total number of events synced
    pub total_events: usize,
    /// The most recent events, most recent first
    pub recent_events: Vec<ContractEvent>,
    /// The error of the latest tick, if it failed
    pub last_error: Option<String>,
    /// Whether the workshop is running at the latest block
    pub workshop_status: Option<WorkshopStatus>,
}

/// The sending half of the snapshot channel
pub type SnapshotSender = watch::Sender<SyncSnapshot>;
/// The receiving half of the snapshot channel
pub type SnapshotReceiver = watch::Receiver<SyncSnapshot>;

/// Create a new snapshot channel holding an empty snapshot
pub fn new_snapshot_channel() -> (SnapshotSender, SnapshotReceiver) {
    watch::channel(SyncSnapshot::default())
}

// ----------
// | Config |
// ----------

/// The configuration passed to the event sync worker upon startup
#[derive(Clone)]
pub struct EventSyncConfig {
    /// The contract whose events are synced
    pub contract_address: ContractAddress,
    /// The interval at which the block height is polled
    pub poll_interval: Duration,
    /// The page size for event queries
    pub chunk_size: u64,
    /// The bound on a single block height query, and on a single tick's
    /// event fetch
    pub fetch_timeout: Duration,
    /// The number of recent events published in each snapshot
    pub recent_events_limit: usize,
    /// The block at which the workshop ends
    pub workshop_end_block: BlockNumber,
    /// The source of contract events
    pub event_source: Arc<dyn ChainEventSource>,
    /// The source of the latest block height
    pub height_source: Arc<dyn BlockHeightSource>,
    /// The channel on which snapshots are published
    pub snapshot_sender: SnapshotSender,
    /// The channel on which the coordinator may send a cancel signal
    pub cancel_channel: CancelChannel,
}

// ------------
// | Executor |
// ------------

/// The executor that polls the block height and drives the tracker
pub struct EventSyncExecutor {
    /// The contract whose events are synced
    contract_address: ContractAddress,
    /// The interval at which the block height is polled
    poll_interval: Duration,
    /// The bound on a single block height query
    fetch_timeout: Duration,
    /// The number of recent events published in each snapshot
    recent_events_limit: usize,
    /// The block at which the workshop ends
    workshop_end_block: BlockNumber,
    /// The source of the latest block height
    height_source: Arc<dyn BlockHeightSource>,
    /// The tracker holding the cursor and event log
    tracker: EventSyncTracker<Arc<dyn ChainEventSource>>,
    /// The error from the latest block height query, if it failed
    height_error: Option<String>,
    /// The latest block height observed
    latest_block: Option<BlockNumber>,
    /// The channel on which snapshots are published
    snapshot_sender: SnapshotSender,
    /// The channel on which the coordinator may send a cancel signal
    cancel_channel: CancelChannel,
}

impl EventSyncExecutor {
    /// Create a new executor
    pub fn new(config: EventSyncConfig) -> Self {
        let EventSyncConfig {
            contract_address,
            poll_interval,
            chunk_size,
            fetch_timeout,
            recent_events_limit,
            workshop_end_block,
            event_source,
            height_source,
            snapshot_sender,
            cancel_channel,
        } = config;

        let tracker = EventSyncTracker::new(event_source, chunk_size, fetch_timeout);
        Self {
            contract_address,
            poll_interval,
            fetch_timeout,
            recent_events_limit,
            workshop_end_block,
            height_source,
            tracker,
            height_error: None,
            latest_block: None,
            snapshot_sender,
            cancel_channel,
        }
    }

    /// The main execution loop; polls the block height on an interval and
    /// syncs events on each tick until cancelled
    ///
    /// Ticks run one at a time. A tick that overruns the interval causes the
    /// missed ticks to be dropped rather than queued
    pub async fn execution_loop(mut self) -> Result<(), EventSyncError> {
        info!(
            "starting event sync for contract {} every {:?}",
            self.contract_address, self.poll_interval
        );

        let mut cancel_channel = self.cancel_channel.clone();
        let mut ticker = interval(self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            let cancelled = tokio::select! {
                _ = ticker.tick() => false,
                _ = cancel_channel.changed() => true,
            };
            if cancelled {
                return self.shutdown();
            }

            // A cancel signal drops the in-flight tick, discarding its result
            let cancelled = tokio::select! {
                _ = self.poll_once() => false,
                _ = cancel_channel.changed() => true,
            };
            if cancelled {
                return self.shutdown();
            }
        }
    }

    /// Run a single tick: query the block height, then sync up to it
    async fn poll_once(&mut self) {
        let current_block = match self.fetch_block_height().await {
            Ok(block) => {
                self.height_error = None;
                self.latest_block = Some(block);
                block
            },
            Err(e) => {
                warn!("error fetching block height, skipping tick: {e}");
                metrics::counter!(NUM_HEIGHT_FAILURES_METRIC).increment(1);
                self.height_error = Some(e);
                self.publish_snapshot();
                return;
            },
        };

        let outcome = self.tracker.on_tick(&self.contract_address, current_block).await;
        match outcome {
            TickOutcome::Synced { new_events, .. } => {
                metrics::counter!(NUM_EVENTS_SYNCED_METRIC).increment(new_events as u64);
            },
            TickOutcome::Skipped { .. } => {
                metrics::counter!(NUM_SKIPPED_TICKS_METRIC).increment(1);
            },
            TickOutcome::Failed(_) => {
                metrics::counter!(NUM_SYNC_FAILURES_METRIC).increment(1);
            },
        }
        metrics::gauge!(SYNC_CURSOR_METRIC).set(self.tracker.cursor() as f64);

        self.publish_snapshot();
    }

    /// Fetch the latest block height, bounded by the fetch timeout
    async fn fetch_block_height(&self) -> Result<BlockNumber, String> {
        let query = self.height_source.block_number();
        match tokio::time::timeout(self.fetch_timeout, query).await {
            Ok(res) => res.map_err(|e| e.to_string()),
            Err(_) => Err(format!("block height query timed out after {:?}", self.fetch_timeout)),
        }
    }

    /// Publish a copy of the tracker's state
    fn publish_snapshot(&self) {
        let last_error = self
            .height_error
            .clone()
            .or_else(|| self.tracker.last_error().map(ToString::to_string));

        let snapshot = SyncSnapshot {
            contract: self.tracker.contract().cloned(),
            latest_block: self.latest_block,
            cursor: self.tracker.cursor(),
            total_events: self.tracker.len(),
            recent_events: self.tracker.recent_events(self.recent_events_limit),
            last_error,
            workshop_status: self
                .latest_block
                .map(|block| WorkshopStatus::at(block, self.workshop_end_block)),
        };
        self.snapshot_sender.send_replace(snapshot);
    }

    /// Tear down the tracker and report the cancellation
    fn shutdown(self) -> Result<(), EventSyncError> {
        info!("event sync received cancel signal, shutting down...");
        debug!("final cursor: {}", self.tracker.cursor());
        self.tracker.teardown();

        Err(EventSyncError::Cancelled("received cancel signal".to_string()))
    }
}
