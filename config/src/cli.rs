//! The sync node CLI and config definitions

use std::time::Duration;

use clap::Parser;
use common::types::chain::{BlockNumber, ContractAddress};
use serde::{Deserialize, Serialize};
use url::Url;
use util::telemetry::configure_telemetry;

// -------
// | CLI |
// -------

/// Defines the sync node command line interface
#[derive(Debug, Parser, Serialize, Deserialize)]
#[clap(author, about, long_about = None, args_override_self = true)]
#[rustfmt::skip]
pub struct Cli {
    // ---------------
    // | Config File |
    // ---------------
    /// A TOML config file to read options from
    #[clap(long, value_parser)]
    pub config_file: Option<String>,

    // ---------
    // | Chain |
    // ---------
    /// The Starknet JSON-RPC endpoint to query
    #[clap(long, value_parser, env = "RPC_URL")]
    pub rpc_url: String,
    /// The address of the contract whose events are synced
    #[clap(
        long,
        value_parser,
        env = "CONTRACT_ADDRESS",
        default_value = "0x07de06e0b46751e0361993838c4741c162dc5f7ebe50dcaf9863f94bc93573f7"
    )]
    pub contract_address: String,

    // --------
    // | Sync |
    // --------
    /// The interval in milliseconds at which the block height is polled
    #[clap(long, value_parser, default_value = "1000")]
    pub poll_interval_ms: u64,
    /// The maximum number of events requested per page
    #[clap(long, value_parser, default_value = "500")]
    pub chunk_size: u64,
    /// The bound in milliseconds on a single tick's event fetch
    #[clap(long, value_parser, default_value = "10000")]
    pub fetch_timeout_ms: u64,
    /// The number of recent events to display
    #[clap(long = "recent-events", value_parser, default_value = "5")]
    pub recent_events_limit: usize,
    /// The block after which the workshop is considered ended
    #[clap(long, value_parser, default_value = "450000")]
    pub workshop_end_block: BlockNumber,

    // -------------
    // | Telemetry |
    // -------------
    /// Whether to emit JSON formatted logs
    #[clap(long, value_parser)]
    pub json_logs: bool,
    /// Whether or not to enable metrics collection
    #[clap(long, value_parser)]
    pub metrics_enabled: bool,
    /// The StatsD recorder host to send metrics to
    #[clap(long, value_parser, default_value = "127.0.0.1")]
    pub statsd_host: String,
    /// The StatsD recorder port to send metrics to
    #[clap(long, value_parser, default_value = "8125")]
    pub statsd_port: u16,
}

// ----------
// | Config |
// ----------

/// Defines the system config for the sync node
#[derive(Clone, Debug)]
pub struct SyncNodeConfig {
    // ---------
    // | Chain |
    // ---------
    /// The Starknet JSON-RPC endpoint to query
    pub rpc_url: Url,
    /// The address of the contract whose events are synced
    pub contract_address: ContractAddress,

    // --------
    // | Sync |
    // --------
    /// The interval at which the block height is polled
    pub poll_interval: Duration,
    /// The maximum number of events requested per page
    pub chunk_size: u64,
    /// The bound on a single tick's event fetch
    pub fetch_timeout: Duration,
    /// The number of recent events to display
    pub recent_events_limit: usize,
    /// The block after which the workshop is considered ended
    pub workshop_end_block: BlockNumber,

    // -------------
    // | Telemetry |
    // -------------
    /// Whether to emit JSON formatted logs
    pub json_logs: bool,
    /// Whether or not to enable metrics collection
    pub metrics_enabled: bool,
    /// The StatsD recorder host to send metrics to
    pub statsd_host: String,
    /// The StatsD recorder port to send metrics to
    pub statsd_port: u16,
}

impl SyncNodeConfig {
    /// Configure the telemetry layers from the node config
    pub fn configure_telemetry(&self) -> Result<(), String> {
        configure_telemetry(
            self.json_logs,
            self.metrics_enabled,
            &self.statsd_host,
            self.statsd_port,
        )
        .map_err(|e| e.to_string())
    }
}
