//! Contract events and the filters used to query them

use serde::{Deserialize, Serialize};

use super::chain::{BlockNumber, ContractAddress};

/// A log entry emitted by a contract
///
/// Events are immutable once fetched; the tracker only ever appends them
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContractEvent {
    /// The address of the emitting contract
    pub from_address: String,
    /// The indexed topic values of the event
    pub keys: Vec<String>,
    /// The non-indexed payload of the event
    pub data: Vec<String>,
    /// The block the event was emitted in, absent for pending blocks
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_number: Option<BlockNumber>,
    /// The hash of the emitting transaction
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transaction_hash: Option<String>,
}

impl ContractEvent {
    /// Construct an event with no block metadata
    pub fn new(from_address: String, keys: Vec<String>, data: Vec<String>) -> Self {
        Self { from_address, keys, data, block_number: None, transaction_hash: None }
    }
}

/// A query for the events of one contract over an inclusive block range
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EventFilter {
    /// The contract whose events are requested
    pub address: ContractAddress,
    /// The first block of the range, inclusive
    pub from_block: BlockNumber,
    /// The last block of the range, inclusive
    pub to_block: BlockNumber,
    /// The maximum number of events to return per page
    pub chunk_size: u64,
}

impl EventFilter {
    /// Constructor
    pub fn new(
        address: ContractAddress,
        from_block: BlockNumber,
        to_block: BlockNumber,
        chunk_size: u64,
    ) -> Self {
        Self { address, from_block, to_block, chunk_size }
    }

    /// Whether the range covers no blocks at all
    pub fn is_empty_range(&self) -> bool {
        self.from_block > self.to_block
    }
}

/// One page of an event query
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EventPage {
    /// The events in this page, in chain order
    pub events: Vec<ContractEvent>,
    /// The token to pass back to fetch the next page, `None` on the last page
    pub continuation_token: Option<String>,
}

impl EventPage {
    /// An empty, final page
    pub fn empty() -> Self {
        Self::default()
    }

    /// Whether there are no pages after this one
    pub fn is_last_page(&self) -> bool {
        self.continuation_token.is_none()
    }
}
