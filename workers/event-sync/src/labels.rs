//! Metric names emitted by the event sync worker

/// Metric describing the number of events appended to the log
pub const NUM_EVENTS_SYNCED_METRIC: &str = "num_events_synced";
/// Metric describing the number of ticks whose fetch failed
pub const NUM_SYNC_FAILURES_METRIC: &str = "num_sync_failures";
/// Metric describing the number of ticks that did not advance past the cursor
pub const NUM_SKIPPED_TICKS_METRIC: &str = "num_skipped_ticks";
/// Metric describing the number of ticks for which the block height could not
/// be fetched
pub const NUM_HEIGHT_FAILURES_METRIC: &str = "num_block_height_failures";
/// Metric describing the highest block scanned for events
pub const SYNC_CURSOR_METRIC: &str = "sync_cursor_block";
