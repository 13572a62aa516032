//! Mock chain sources for testing event sync without a node

use std::{
    collections::{HashMap, VecDeque},
    sync::{
        Arc, Mutex, MutexGuard,
        atomic::{AtomicBool, AtomicU64, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use common::{
    chain_source::{BlockHeightSource, ChainEventSource, ChainQueryError},
    types::{
        chain::{BlockNumber, ContractAddress},
        events::{ContractEvent, EventFilter, EventPage},
    },
};

/// The key emitted with every mock counter event
pub const MOCK_COUNTER_EVENT_KEY: &str =
    "0x2d4c8ea4c8fb9f571d1f6f9b7692fff8e5ceaf73b1df98e7da8c1109b39ae9a";

/// Build a counter event emitted by the given contract carrying a new value
pub fn counter_event(contract: &ContractAddress, block: BlockNumber, value: u64) -> ContractEvent {
    ContractEvent {
        from_address: contract.to_string(),
        keys: vec![MOCK_COUNTER_EVENT_KEY.to_string()],
        data: vec![format!("{value:#x}")],
        block_number: Some(block),
        transaction_hash: None,
    }
}

/// A request received by the mock event source
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MockRequest {
    /// The filter of the request
    pub filter: EventFilter,
    /// The continuation token passed with the request
    pub continuation_token: Option<String>,
}

/// The chain state behind the mock event source
#[derive(Default)]
struct MockChainState {
    /// The events on chain, with the block they were emitted in
    events: Vec<(BlockNumber, ContractEvent)>,
    /// Every request received, in order
    requests: Vec<MockRequest>,
    /// Failures to return, keyed by the index of the request that fails
    failures: HashMap<usize, ChainQueryError>,
    /// A delay applied before every response
    delay: Option<Duration>,
    /// Continuation tokens returned in place of the computed ones, in order
    scripted_tokens: VecDeque<String>,
}

/// An in-memory event source that paginates by `chunk_size`, using the
/// offset of the next page as its continuation token
#[derive(Clone, Default)]
pub struct MockEventSource {
    /// The shared mock state
    state: Arc<Mutex<MockChainState>>,
}

impl MockEventSource {
    /// Constructor
    pub fn new() -> Self {
        Self::default()
    }

    /// Lock the mock state
    fn state(&self) -> MutexGuard<'_, MockChainState> {
        self.state.lock().expect("mock state lock poisoned")
    }

    /// Add an event to the chain
    pub fn add_event(&self, block: BlockNumber, event: ContractEvent) {
        let mut state = self.state();
        state.events.push((block, event));
        state.events.sort_by_key(|(block, _)| *block);
    }

    /// Emit `n` counter events from the contract, spread over the given blocks
    pub fn add_counter_events(
        &self,
        contract: &ContractAddress,
        blocks: impl IntoIterator<Item = BlockNumber>,
    ) {
        for (i, block) in blocks.into_iter().enumerate() {
            self.add_event(block, counter_event(contract, block, i as u64));
        }
    }

    /// Fail the next request with the given error
    pub fn fail_next(&self, err: ChainQueryError) {
        let mut state = self.state();
        let next = state.requests.len();
        state.failures.insert(next, err);
    }

    /// Fail the request `offset` requests from now with the given error
    pub fn fail_after(&self, offset: usize, err: ChainQueryError) {
        let mut state = self.state();
        let index = state.requests.len() + offset;
        state.failures.insert(index, err);
    }

    /// Delay every response by the given duration
    pub fn set_delay(&self, delay: Duration) {
        self.state().delay = Some(delay);
    }

    /// Return the given continuation tokens on the next non-final pages,
    /// in place of the offsets the source would otherwise hand out
    pub fn script_tokens(&self, tokens: impl IntoIterator<Item = String>) {
        self.state().scripted_tokens.extend(tokens);
    }

    /// Every request received so far
    pub fn requests(&self) -> Vec<MockRequest> {
        self.state().requests.clone()
    }

    /// The block ranges of the first page of every query received so far
    pub fn queried_ranges(&self) -> Vec<(BlockNumber, BlockNumber)> {
        self.state()
            .requests
            .iter()
            .filter(|req| req.continuation_token.is_none())
            .map(|req| (req.filter.from_block, req.filter.to_block))
            .collect()
    }

    /// Compute the response to a request, recording it
    fn respond(
        &self,
        filter: &EventFilter,
        continuation_token: Option<String>,
    ) -> (Option<Duration>, Result<EventPage, ChainQueryError>) {
        let mut state = self.state();
        let index = state.requests.len();
        let request =
            MockRequest { filter: filter.clone(), continuation_token: continuation_token.clone() };
        state.requests.push(request);
        let delay = state.delay;

        if let Some(err) = state.failures.remove(&index) {
            return (delay, Err(err));
        }
        if filter.is_empty_range() {
            return (delay, Ok(EventPage::empty()));
        }

        let offset = match continuation_token.map(|token| token.parse::<usize>()).transpose() {
            Ok(offset) => offset.unwrap_or(0),
            Err(e) => return (delay, Err(ChainQueryError::InvalidRequest(e.to_string()))),
        };

        let matching: Vec<ContractEvent> = state
            .events
            .iter()
            .filter(|(block, _)| (filter.from_block..=filter.to_block).contains(block))
            .filter(|(_, event)| {
                event.from_address.parse::<ContractAddress>().as_ref() == Ok(&filter.address)
            })
            .map(|(_, event)| event.clone())
            .collect();

        let chunk_size = filter.chunk_size as usize;
        let end = usize::min(offset + chunk_size, matching.len());
        let events = matching.get(offset..end).map(<[_]>::to_vec).unwrap_or_default();
        let continuation_token = (end < matching.len())
            .then(|| state.scripted_tokens.pop_front().unwrap_or_else(|| end.to_string()));

        (delay, Ok(EventPage { events, continuation_token }))
    }
}

#[async_trait]
impl ChainEventSource for MockEventSource {
    async fn get_events(
        &self,
        filter: &EventFilter,
        continuation_token: Option<String>,
    ) -> Result<EventPage, ChainQueryError> {
        let (delay, res) = self.respond(filter, continuation_token);
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        res
    }
}

/// A block height source whose height is set by the test
#[derive(Clone, Default)]
pub struct MockHeightSource {
    /// The current block height
    height: Arc<AtomicU64>,
    /// Whether queries should fail
    failing: Arc<AtomicBool>,
}

impl MockHeightSource {
    /// Constructor
    pub fn new(height: BlockNumber) -> Self {
        let source = Self::default();
        source.set_height(height);
        source
    }

    /// Set the current block height
    pub fn set_height(&self, height: BlockNumber) {
        self.height.store(height, Ordering::SeqCst);
    }

    /// Set whether queries should fail
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl BlockHeightSource for MockHeightSource {
    async fn block_number(&self) -> Result<BlockNumber, ChainQueryError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(ChainQueryError::network("mock node unreachable"));
        }

        Ok(self.height.load(Ordering::SeqCst))
    }
}
