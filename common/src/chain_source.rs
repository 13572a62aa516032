//! The interfaces through which workers read chain state
//!
//! Event sync never talks to a node directly; it is generic over these traits
//! so that the RPC transport can be swapped out, and mocked in tests

use async_trait::async_trait;
use std::sync::Arc;

use crate::types::{
    chain::BlockNumber,
    events::{EventFilter, EventPage},
};

/// The error type returned by chain data sources
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ChainQueryError {
    /// The request never reached the node, or the connection failed
    #[error("network error: {0}")]
    Network(String),
    /// The node answered with an error
    #[error("rpc error: {0}")]
    Rpc(String),
    /// The node's response could not be decoded
    #[error("malformed response: {0}")]
    Malformed(String),
    /// The requested block range is invalid
    #[error("invalid block range [{from}, {to}]")]
    InvalidRange {
        /// The first block of the range
        from: BlockNumber,
        /// The last block of the range
        to: BlockNumber,
    },
    /// The request itself was rejected as malformed by the node
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl ChainQueryError {
    /// Create a new network error
    pub fn network<T: ToString>(e: T) -> Self {
        Self::Network(e.to_string())
    }

    /// Create a new malformed response error
    pub fn malformed<T: ToString>(e: T) -> Self {
        Self::Malformed(e.to_string())
    }

    /// Whether the error indicates a bug in the caller rather than a
    /// transient condition on the network or node
    pub fn is_invariant_violation(&self) -> bool {
        matches!(self, Self::InvalidRange { .. } | Self::InvalidRequest(_))
    }
}

/// A source of contract events over block ranges
#[async_trait]
pub trait ChainEventSource: Send + Sync {
    /// Fetch one page of events matching the filter
    ///
    /// A filter whose `from_block` exceeds its `to_block` must produce an
    /// empty final page, never an error. Passing the `continuation_token` of
    /// a previous page fetches the page after it
    async fn get_events(
        &self,
        filter: &EventFilter,
        continuation_token: Option<String>,
    ) -> Result<EventPage, ChainQueryError>;
}

/// A source of the latest block height
#[async_trait]
pub trait BlockHeightSource: Send + Sync {
    /// Fetch the latest block number
    async fn block_number(&self) -> Result<BlockNumber, ChainQueryError>;
}

#[async_trait]
impl<T: ChainEventSource + ?Sized> ChainEventSource for Arc<T> {
    async fn get_events(
        &self,
        filter: &EventFilter,
        continuation_token: Option<String>,
    ) -> Result<EventPage, ChainQueryError> {
        self.as_ref().get_events(filter, continuation_token).await
    }
}

#[async_trait]
impl<T: BlockHeightSource + ?Sized> BlockHeightSource for Arc<T> {
    async fn block_number(&self) -> Result<BlockNumber, ChainQueryError> {
        self.as_ref().block_number().await
    }
}
