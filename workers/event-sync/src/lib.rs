//! Defines and implements the worker that incrementally syncs a contract's
//! emitted events
//!
//! The worker polls the chain's block height on a fixed interval and, on each
//! tick, fetches every event the contract emitted since the last block it
//! scanned. Fetched events are appended to an ordered log from which a
//! bounded, most-recent-first view is published for display.

#![deny(unsafe_code)]
#![deny(missing_docs)]
#![deny(clippy::missing_docs_in_private_items)]
#![deny(clippy::needless_pass_by_value)]
#![deny(clippy::needless_pass_by_ref_mut)]

pub mod display;
pub mod error;
pub mod labels;
pub mod listener;
#[cfg(any(test, feature = "mocks"))]
pub mod mocks;
pub mod tracker;
pub mod worker;
