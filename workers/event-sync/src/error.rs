//! Defines error types for the event sync worker

use std::{error::Error, fmt::Display, time::Duration};

use common::chain_source::ChainQueryError;

/// The error produced by a single failed sync tick
///
/// Never fatal: the tracker reports it and leaves its state untouched, and
/// the next tick retries the whole unscanned range
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum SyncError {
    /// A network, node, or decoding failure
    #[error("transient fetch error: {0}")]
    Transient(String),
    /// The fetch did not complete within the configured timeout
    #[error("fetch timed out after {0:?}")]
    Timeout(Duration),
    /// The query service rejected the range or request as invalid
    ///
    /// Indicates an internal invariant violation rather than a network
    /// condition
    #[error("invalid range: {0}")]
    InvalidRange(String),
}

impl SyncError {
    /// Whether the error is expected to resolve on its own
    pub fn is_transient(&self) -> bool {
        !matches!(self, SyncError::InvalidRange(_))
    }
}

impl From<ChainQueryError> for SyncError {
    fn from(e: ChainQueryError) -> Self {
        if e.is_invariant_violation() {
            SyncError::InvalidRange(e.to_string())
        } else {
            SyncError::Transient(e.to_string())
        }
    }
}

/// The error type that the event sync worker emits
#[derive(Clone, Debug)]
pub enum EventSyncError {
    /// The worker was cancelled by the coordinator
    Cancelled(String),
    /// Error setting up the worker
    Setup(String),
}

impl Display for EventSyncError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self:?}")
    }
}
impl Error for EventSyncError {}

#[cfg(test)]
mod test {
    use common::chain_source::ChainQueryError;

    use super::SyncError;

    /// Tests the classification of chain query errors
    #[test]
    fn test_error_classification() {
        let network: SyncError = ChainQueryError::network("connection reset").into();
        assert!(network.is_transient());

        let rpc: SyncError = ChainQueryError::Rpc("Block not found".into()).into();
        assert!(rpc.is_transient());

        let range: SyncError = ChainQueryError::InvalidRange { from: 10, to: 5 }.into();
        assert!(!range.is_transient());

        let request: SyncError = ChainQueryError::InvalidRequest("bad token".into()).into();
        assert!(!request.is_transient());
    }
}
