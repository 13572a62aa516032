//! A client for reading events and block heights from a Starknet node over
//! JSON-RPC

use std::sync::Arc;

use async_trait::async_trait;
use common::{
    chain_source::{BlockHeightSource, ChainEventSource, ChainQueryError},
    types::{
        chain::BlockNumber,
        events::{EventFilter, EventPage},
    },
};
use starknet::providers::{
    Provider,
    jsonrpc::{HttpTransport, JsonRpcClient},
};
use tracing::{debug, instrument};
use url::Url;

use crate::{
    error::StarknetClientError,
    helpers::{to_contract_event, to_core_filter},
};

/// The config type for the client
#[derive(Clone, Debug)]
pub struct StarknetClientConfig {
    /// The HTTP addressable JSON-RPC node to connect to
    pub rpc_url: Url,
}

impl StarknetClientConfig {
    /// Constructor
    pub fn new(rpc_url: Url) -> Self {
        Self { rpc_url }
    }

    /// Build a JSON-RPC client pointed at the configured node
    pub fn new_jsonrpc_client(&self) -> JsonRpcClient<HttpTransport> {
        JsonRpcClient::new(HttpTransport::new(self.rpc_url.clone()))
    }
}

/// A wrapper around the JSON-RPC provider that reads one contract's events
#[derive(Clone)]
pub struct StarknetClient {
    /// The config for the client
    config: StarknetClientConfig,
    /// The JSON-RPC provider requests are sent through
    jsonrpc_client: Arc<JsonRpcClient<HttpTransport>>,
}

impl StarknetClient {
    /// Constructor
    pub fn new(config: StarknetClientConfig) -> Self {
        let jsonrpc_client = Arc::new(config.new_jsonrpc_client());
        Self { config, jsonrpc_client }
    }

    /// The URL of the node this client sends requests to
    pub fn rpc_url(&self) -> &Url {
        &self.config.rpc_url
    }

    // ---------------
    // | Chain State |
    // ---------------

    /// Get the latest block number
    pub async fn get_block_number(&self) -> Result<BlockNumber, StarknetClientError> {
        self.jsonrpc_client.block_number().await.map_err(StarknetClientError::from)
    }

    /// Get one page of events matching the filter
    ///
    /// An empty block range short-circuits to an empty final page without
    /// contacting the node
    #[instrument(skip_all, fields(from = filter.from_block, to = filter.to_block))]
    pub async fn get_events_page(
        &self,
        filter: &EventFilter,
        continuation_token: Option<String>,
    ) -> Result<EventPage, StarknetClientError> {
        if filter.is_empty_range() {
            return Ok(EventPage::empty());
        }

        let page = self
            .jsonrpc_client
            .get_events(to_core_filter(filter), continuation_token, filter.chunk_size)
            .await?;
        debug!("fetched {} events", page.events.len());

        let events = page.events.into_iter().map(to_contract_event).collect();
        Ok(EventPage { events, continuation_token: page.continuation_token })
    }
}

#[async_trait]
impl ChainEventSource for StarknetClient {
    async fn get_events(
        &self,
        filter: &EventFilter,
        continuation_token: Option<String>,
    ) -> Result<EventPage, ChainQueryError> {
        self.get_events_page(filter, continuation_token).await.map_err(ChainQueryError::from)
    }
}

#[async_trait]
impl BlockHeightSource for StarknetClient {
    async fn block_number(&self) -> Result<BlockNumber, ChainQueryError> {
        self.get_block_number().await.map_err(ChainQueryError::from)
    }
}
