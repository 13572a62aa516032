//! Parsing logic for the config

mod config_file;

use std::{env, time::Duration};

use clap::Parser;
use common::types::chain::ContractAddress;
use url::Url;

pub use config_file::parse_config_from_file;

use crate::{Cli, SyncNodeConfig, validation::validate_config};
use config_file::config_file_args;

/// Parses command line args into the node config
///
/// We allow for configurations to come from both a config file and overrides
/// on the command line directly. To support this, we first read configuration
/// options from the config file, prepend them to the cli args string, and parse
/// with `args_override_self` so that cli args (which come after config file
/// args) take precedence.
pub fn parse_command_line_args() -> Result<SyncNodeConfig, String> {
    let command_line_args: Vec<String> =
        env::args_os().map(|val| val.to_string_lossy().into_owned()).collect();
    let full_args = merge_config_file_args(command_line_args)?;

    let cli = Cli::parse_from(full_args);
    parse_config_from_args(cli)
}

/// Place the config file args *before* the command line args so that clap
/// gives precedence to the command line arguments
///
/// The first argument is the executable name, so it stays in front
fn merge_config_file_args(mut command_line_args: Vec<String>) -> Result<Vec<String>, String> {
    let config_file_args = config_file_args(&command_line_args)?;
    if command_line_args.is_empty() {
        return Ok(config_file_args);
    }

    let mut full_args = vec![command_line_args.remove(0)];
    full_args.extend(config_file_args);
    full_args.extend(command_line_args);
    Ok(full_args)
}

/// Parse the config from a set of command line arguments
///
/// Separating out this functionality allows us to easily inject custom args
/// apart from what is specified on the command line
pub fn parse_config_from_args(cli_args: Cli) -> Result<SyncNodeConfig, String> {
    let rpc_url =
        Url::parse(&cli_args.rpc_url).map_err(|e| format!("invalid rpc url: {e}"))?;
    let contract_address: ContractAddress = cli_args.contract_address.parse()?;

    let config = SyncNodeConfig {
        rpc_url,
        contract_address,
        poll_interval: Duration::from_millis(cli_args.poll_interval_ms),
        chunk_size: cli_args.chunk_size,
        fetch_timeout: Duration::from_millis(cli_args.fetch_timeout_ms),
        recent_events_limit: cli_args.recent_events_limit,
        workshop_end_block: cli_args.workshop_end_block,
        json_logs: cli_args.json_logs,
        metrics_enabled: cli_args.metrics_enabled,
        statsd_host: cli_args.statsd_host,
        statsd_port: cli_args.statsd_port,
    };

    validate_config(&config)?;
    Ok(config)
}

#[cfg(test)]
mod test {
    use std::{io::Write, time::Duration};

    use clap::Parser;
    use tempfile::NamedTempFile;

    use super::{merge_config_file_args, parse_config_from_args, parse_config_from_file};
    use crate::{Cli, SyncNodeConfig};

    /// The RPC URL used in tests
    const RPC_URL: &str = "http://localhost:5050/rpc";

    /// Parse a config from the given args, following the executable name
    fn parse_args(args: &[&str]) -> Result<SyncNodeConfig, String> {
        let full_args = std::iter::once("event-sync-node").chain(args.iter().copied());
        let cli = Cli::try_parse_from(full_args).map_err(|e| e.to_string())?;
        parse_config_from_args(cli)
    }

    /// Write a config file with the given contents
    fn write_config_file(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    /// Tests the defaults applied to unset options
    #[test]
    fn test_defaults() {
        let config = parse_args(&["--rpc-url", RPC_URL, "--contract-address", "0x7DE"]).unwrap();

        assert_eq!(config.rpc_url.as_str(), RPC_URL);
        assert_eq!(config.contract_address.to_string(), "0x7de");
        assert_eq!(config.poll_interval, Duration::from_secs(1));
        assert_eq!(config.chunk_size, 500);
        assert_eq!(config.fetch_timeout, Duration::from_secs(10));
        assert_eq!(config.recent_events_limit, 5);
        assert_eq!(config.workshop_end_block, 450_000);
        assert!(!config.json_logs);
        assert!(!config.metrics_enabled);
    }

    /// Tests that invalid options are rejected
    #[test]
    fn test_invalid_options() {
        let base = ["--rpc-url", RPC_URL];
        let invalid: &[&[&str]] = &[
            &["--chunk-size", "0"],
            &["--poll-interval-ms", "0"],
            &["--fetch-timeout-ms", "0"],
            &["--recent-events", "0"],
            &["--contract-address", "0xnothex"],
        ];

        for extra in invalid {
            let args: Vec<&str> = base.iter().chain(extra.iter()).copied().collect();
            assert!(parse_args(&args).is_err(), "expected {extra:?} to be rejected");
        }

        assert!(parse_args(&["--rpc-url", "not a url"]).is_err());
        assert!(parse_args(&["--rpc-url", "ftp://localhost"]).is_err());
    }

    /// Tests parsing a config entirely from a file
    #[test]
    fn test_parse_config_file() {
        let file = write_config_file(&format!(
            "rpc-url = \"{RPC_URL}\"\nchunk-size = 100\njson-logs = true\nmetrics-enabled = false\n"
        ));

        let config = parse_config_from_file(file.path().to_str().unwrap()).unwrap();
        assert_eq!(config.rpc_url.as_str(), RPC_URL);
        assert_eq!(config.chunk_size, 100);
        assert!(config.json_logs);
        assert!(!config.metrics_enabled);
    }

    /// Tests that command line args take precedence over the config file
    #[test]
    fn test_command_line_overrides_file() {
        let file = write_config_file(&format!("rpc-url = \"{RPC_URL}\"\nchunk-size = 100\n"));
        let path = file.path().to_str().unwrap().to_string();

        let command_line = vec![
            "event-sync-node".to_string(),
            "--config-file".to_string(),
            path,
            "--chunk-size".to_string(),
            "250".to_string(),
        ];
        let full_args = merge_config_file_args(command_line).unwrap();
        let cli = Cli::try_parse_from(full_args).unwrap();
        let config = parse_config_from_args(cli).unwrap();

        assert_eq!(config.rpc_url.as_str(), RPC_URL);
        assert_eq!(config.chunk_size, 250);
    }

    /// Tests that a missing config file is reported
    #[test]
    fn test_missing_config_file() {
        let command_line = vec![
            "event-sync-node".to_string(),
            "--config-file".to_string(),
            "/nonexistent/event-sync.toml".to_string(),
        ];
        assert!(merge_config_file_args(command_line).is_err());

        let command_line = vec!["event-sync-node".to_string(), "--config-file".to_string()];
        assert!(merge_config_file_args(command_line).is_err());
    }
}
