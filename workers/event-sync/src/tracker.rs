//! The incremental event sync tracker
//!
//! The tracker keeps a cursor over the blocks it has scanned for a contract's
//! events. Each tick scans `[cursor + 1, current_block]` and appends whatever
//! the contract emitted in that range to the log. A tick is all-or-nothing:
//! events are buffered until every page of the range has arrived, and only
//! then is the log extended and the cursor advanced. A failed, timed out, or
//! dropped tick leaves the tracker exactly as it was, so the next tick simply
//! re-covers the same (or a longer) range.

use std::{collections::HashSet, time::Duration};

use common::{
    chain_source::ChainEventSource,
    types::{
        chain::{BlockNumber, ContractAddress},
        events::{ContractEvent, EventFilter},
    },
};
use tracing::{debug, error, info, instrument, warn};

use crate::error::SyncError;

/// The number of events requested per page
pub const DEFAULT_CHUNK_SIZE: u64 = 500;
/// The default bound on the fetch of a single tick
pub const DEFAULT_FETCH_TIMEOUT_MS: u64 = 10_000; // 10 seconds

/// The result of a single tick
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TickOutcome {
    /// The block was already scanned; no fetch was issued
    Skipped {
        /// The cursor at the time of the tick
        cursor: BlockNumber,
        /// The block number the tick was delivered with
        current_block: BlockNumber,
    },
    /// The range was scanned and its events appended
    Synced {
        /// The first block of the scanned range
        from_block: BlockNumber,
        /// The last block of the scanned range, now the cursor
        to_block: BlockNumber,
        /// The number of events appended to the log
        new_events: usize,
    },
    /// The fetch failed; the tracker's cursor and log are unchanged
    Failed(SyncError),
}

/// Tracks the events a single contract has emitted, scanning forward from
/// the last block it has seen
pub struct EventSyncTracker<S> {
    /// The source events are queried from
    source: S,
    /// The page size for event queries
    chunk_size: u64,
    /// The bound on the fetch of a single tick, across all of its pages
    fetch_timeout: Duration,
    /// The contract the cursor and log belong to, bound on the first tick
    contract: Option<ContractAddress>,
    /// The highest block already scanned, inclusive
    ///
    /// Zero means no block has been scanned
    cursor: BlockNumber,
    /// Every event fetched so far, oldest first
    log: Vec<ContractEvent>,
    /// The error of the most recent tick, if it failed
    last_error: Option<SyncError>,
}

impl<S: ChainEventSource> EventSyncTracker<S> {
    /// Create a tracker that has scanned nothing yet
    pub fn new(source: S, chunk_size: u64, fetch_timeout: Duration) -> Self {
        Self {
            source,
            chunk_size,
            fetch_timeout,
            contract: None,
            cursor: 0,
            log: Vec::new(),
            last_error: None,
        }
    }

    // -----------
    // | Getters |
    // -----------

    /// The highest block already scanned
    pub fn cursor(&self) -> BlockNumber {
        self.cursor
    }

    /// The contract the tracker is bound to, if it has ticked
    pub fn contract(&self) -> Option<&ContractAddress> {
        self.contract.as_ref()
    }

    /// The number of events in the log
    pub fn len(&self) -> usize {
        self.log.len()
    }

    /// Whether the log is empty
    pub fn is_empty(&self) -> bool {
        self.log.is_empty()
    }

    /// The error of the most recent tick, cleared by the next successful one
    pub fn last_error(&self) -> Option<&SyncError> {
        self.last_error.as_ref()
    }

    /// The last `n` events of the log, most recent first
    pub fn recent_events(&self, n: usize) -> Vec<ContractEvent> {
        self.log.iter().rev().take(n).cloned().collect()
    }

    // ---------
    // | Ticks |
    // ---------

    /// Scan the blocks produced since the last successful tick
    ///
    /// Ticks at or below the cursor are no-ops. The `&mut self` receiver
    /// serializes ticks: a second tick cannot begin while one is in flight
    #[instrument(skip_all, fields(contract = %contract, current_block = current_block))]
    pub async fn on_tick(
        &mut self,
        contract: &ContractAddress,
        current_block: BlockNumber,
    ) -> TickOutcome {
        self.bind_contract(contract);
        if current_block <= self.cursor {
            debug!("block {current_block} already scanned (cursor {}), skipping", self.cursor);
            return TickOutcome::Skipped { cursor: self.cursor, current_block };
        }

        let from_block = self.cursor + 1;
        let filter = EventFilter::new(*contract, from_block, current_block, self.chunk_size);
        match self.fetch_range(&filter).await {
            Ok(events) => {
                let new_events = events.len();
                self.log.extend(events);
                self.cursor = current_block;
                self.last_error = None;

                if new_events > 0 {
                    info!("synced {new_events} events from blocks [{from_block}, {current_block}]");
                } else {
                    debug!("no events in blocks [{from_block}, {current_block}]");
                }

                TickOutcome::Synced { from_block, to_block: current_block, new_events }
            },
            Err(e) => {
                if e.is_transient() {
                    warn!("error syncing blocks [{from_block}, {current_block}], will retry: {e}");
                } else {
                    error!("invalid range [{from_block}, {current_block}]: {e}");
                }

                self.last_error = Some(e.clone());
                TickOutcome::Failed(e)
            },
        }
    }

    /// Tear down the tracker, discarding its cursor and log
    ///
    /// Any tick in flight must already have been dropped, so its result can
    /// never land on the discarded state
    pub fn teardown(self) {
        debug!(
            "tearing down event tracker at cursor {} with {} events",
            self.cursor,
            self.log.len()
        );
    }

    // -----------
    // | Helpers |
    // -----------

    /// Bind the tracker to the given contract
    ///
    /// Switching contracts is equivalent to replacing the tracker with a
    /// fresh one: the cursor and log of the previous contract are discarded
    fn bind_contract(&mut self, contract: &ContractAddress) {
        match &self.contract {
            Some(bound) if bound == contract => {},
            Some(bound) => {
                warn!("contract changed from {bound} to {contract}, resetting event log");
                self.contract = Some(*contract);
                self.cursor = 0;
                self.log.clear();
                self.last_error = None;
            },
            None => self.contract = Some(*contract),
        }
    }

    /// Fetch every event in the filter's range, bounded by the fetch timeout
    async fn fetch_range(&self, filter: &EventFilter) -> Result<Vec<ContractEvent>, SyncError> {
        tokio::time::timeout(self.fetch_timeout, self.fetch_all_pages(filter))
            .await
            .map_err(|_| SyncError::Timeout(self.fetch_timeout))?
    }

    /// Fetch every page of the filter's range, following continuation tokens
    /// until the source reports the last page
    ///
    /// A token handed out twice within one range would never terminate, so
    /// any repeat fails the tick
    async fn fetch_all_pages(&self, filter: &EventFilter) -> Result<Vec<ContractEvent>, SyncError> {
        let mut events = Vec::new();
        let mut seen_tokens = HashSet::new();
        let mut continuation_token: Option<String> = None;
        loop {
            let page = self.source.get_events(filter, continuation_token.take()).await?;
            events.extend(page.events);

            match page.continuation_token {
                None => return Ok(events),
                Some(next) if !seen_tokens.insert(next.clone()) => {
                    return Err(SyncError::Transient(format!(
                        "event source repeated continuation token {next}"
                    )));
                },
                Some(next) => continuation_token = Some(next),
            }
        }
    }
}
