//! Defines common types that many crates can depend on
pub mod chain;
pub mod events;

use tokio::sync::watch::{
    Receiver as WatchReceiver, Sender as WatchSender, channel as watch_channel,
};

/// A type alias for an empty channel used to signal cancellation to workers
pub type CancelChannel = WatchReceiver<()>;
/// The sending half of a cancel channel, held by the coordinator
pub type CancelSender = WatchSender<()>;

/// Create a new cancel channel
pub fn new_cancel_channel() -> (CancelSender, CancelChannel) {
    watch_channel(())
}
