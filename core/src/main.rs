//! The entrypoint to the event sync node
//!
//! Starts the event sync worker against a Starknet node and logs the synced
//! events as they arrive, until interrupted

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![deny(clippy::missing_docs_in_private_items)]
#![deny(clippy::needless_pass_by_value)]
#![deny(clippy::needless_pass_by_ref_mut)]

use std::sync::Arc;

use common::{
    types::{CancelChannel, new_cancel_channel},
    worker::{Worker, watch_worker},
};
use config::{SyncNodeConfig, parse_command_line_args};
use event_sync::{
    display::{event_rows, render_event_table},
    listener::{EventSyncConfig, SnapshotSender, SyncSnapshot, new_snapshot_channel},
    worker::EventSyncWorker,
};
use eyre::{Error, eyre};
use starknet_client::client::{StarknetClient, StarknetClientConfig};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// The entrypoint to the node's execution
///
/// The coordinator:
///     1. Builds the Starknet client and the channels the worker needs
///     2. Starts the event sync worker and watches its thread
///     3. Logs each snapshot the worker publishes
///     4. Cancels the worker on interrupt and waits for it to exit
#[tokio::main]
async fn main() -> Result<(), Error> {
    let config = parse_command_line_args().map_err(Error::msg)?;
    config.configure_telemetry().map_err(Error::msg)?;
    info!(
        "event sync node running with\n\t contract: {}\n\t poll interval: {:?}",
        config.contract_address, config.poll_interval
    );

    // Build the client and communication primitives
    let client_config = StarknetClientConfig::new(config.rpc_url.clone());
    let client = Arc::new(StarknetClient::new(client_config));
    info!("querying starknet node at {}", client.rpc_url());

    let (cancel_sender, cancel_channel) = new_cancel_channel();
    let (snapshot_sender, mut snapshot_receiver) = new_snapshot_channel();

    // Start the event sync worker
    let mut worker = EventSyncWorker::new(build_worker_config(
        &config,
        client,
        snapshot_sender,
        cancel_channel,
    ))
    .await?;
    worker.start()?;

    let (failure_sender, mut failure_receiver) = mpsc::channel(1 /* buffer size */);
    watch_worker(&mut worker, &failure_sender);

    let mut logged_events = None;
    loop {
        tokio::select! {
            res = snapshot_receiver.changed() => {
                if res.is_err() {
                    break;
                }

                let snapshot = snapshot_receiver.borrow_and_update().clone();
                logged_events = log_snapshot(&snapshot, logged_events);
            },

            _ = tokio::signal::ctrl_c() => {
                info!("received interrupt, cancelling event sync...");
                if cancel_sender.send(()).is_err() {
                    warn!("event sync worker already exited");
                }

                failure_receiver.recv().await;
                info!("event sync stopped");
                return Ok(());
            },

            name = failure_receiver.recv() => {
                let name = name.unwrap_or_default();
                return Err(eyre!("worker {name} exited unexpectedly"));
            },
        }
    }

    Err(eyre!("event sync worker hung up"))
}

/// Build the worker config from the node config
fn build_worker_config(
    config: &SyncNodeConfig,
    client: Arc<StarknetClient>,
    snapshot_sender: SnapshotSender,
    cancel_channel: CancelChannel,
) -> EventSyncConfig {
    EventSyncConfig {
        contract_address: config.contract_address,
        poll_interval: config.poll_interval,
        chunk_size: config.chunk_size,
        fetch_timeout: config.fetch_timeout,
        recent_events_limit: config.recent_events_limit,
        workshop_end_block: config.workshop_end_block,
        event_source: client.clone(),
        height_source: client,
        snapshot_sender,
        cancel_channel,
    }
}

/// Log a snapshot published by the worker
///
/// The event table is only logged when the number of synced events differs
/// from the last logged table. Returns the number of events in the last
/// logged table
fn log_snapshot(snapshot: &SyncSnapshot, logged_events: Option<usize>) -> Option<usize> {
    if let Some(err) = &snapshot.last_error {
        warn!("latest sync failed, cursor held at {}: {err}", snapshot.cursor);
        return logged_events;
    }

    let Some(block) = snapshot.latest_block else { return logged_events };
    let status = snapshot.workshop_status.as_ref().map(ToString::to_string).unwrap_or_default();
    if logged_events == Some(snapshot.total_events) {
        debug!("block {block} ({status}), no new events");
        return logged_events;
    }

    let table = render_event_table(&event_rows(&snapshot.recent_events));
    info!(
        "block {block} ({status}), {} events synced through block {}\n{table}",
        snapshot.total_events, snapshot.cursor
    );
    Some(snapshot.total_events)
}
