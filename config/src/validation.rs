//! Validation of a parsed config

use crate::SyncNodeConfig;

/// The URL schemes a JSON-RPC endpoint may use
const RPC_URL_SCHEMES: &[&str] = &["http", "https"];

/// Validate a parsed config, returning a description of the first invalid
/// option found
pub(crate) fn validate_config(config: &SyncNodeConfig) -> Result<(), String> {
    if !RPC_URL_SCHEMES.contains(&config.rpc_url.scheme()) {
        return Err(format!("unsupported rpc url scheme: {}", config.rpc_url.scheme()));
    }

    if config.poll_interval.is_zero() {
        return Err("poll interval must be non-zero".to_string());
    }

    if config.chunk_size == 0 {
        return Err("chunk size must be non-zero".to_string());
    }

    if config.fetch_timeout.is_zero() {
        return Err("fetch timeout must be non-zero".to_string());
    }

    if config.recent_events_limit == 0 {
        return Err("recent events limit must be non-zero".to_string());
    }

    Ok(())
}
