//! A wrapper around the starknet JSON-RPC provider exposing the chain reads
//! that event sync needs: the latest block number and paginated contract
//! events

#![deny(clippy::missing_docs_in_private_items)]
#![deny(missing_docs)]
#![deny(unsafe_code)]

pub mod client;
pub mod error;
mod helpers;
#[cfg(test)]
mod mock_node;
