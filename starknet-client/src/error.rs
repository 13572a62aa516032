//! Groups error types returned by the client

use common::chain_source::ChainQueryError;
use starknet::{
    core::types::StarknetError,
    providers::{
        ProviderError,
        jsonrpc::{HttpTransportError, JsonRpcClientError},
    },
};

/// The JSON-RPC error code for invalid method parameters
const INVALID_PARAMS_CODE: i64 = -32602;

/// The error type returned by the StarknetClient interface
#[derive(Clone, Debug, thiserror::Error)]
pub enum StarknetClientError {
    /// The request never completed, or the node throttled it
    #[error("network error: {0}")]
    Network(String),
    /// The node answered with an error
    #[error("rpc error: {0}")]
    Rpc(String),
    /// The node rejected the request's parameters
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    /// The node's response could not be decoded
    #[error("malformed response: {0}")]
    Malformed(String),
}

impl From<ProviderError> for StarknetClientError {
    fn from(e: ProviderError) -> Self {
        match e {
            ProviderError::StarknetError(
                err @ (StarknetError::PageSizeTooBig
                | StarknetError::InvalidContinuationToken
                | StarknetError::TooManyKeysInFilter),
            ) => StarknetClientError::InvalidRequest(err.to_string()),
            ProviderError::StarknetError(err) => StarknetClientError::Rpc(err.to_string()),
            ProviderError::ArrayLengthMismatch => {
                StarknetClientError::Malformed(ProviderError::ArrayLengthMismatch.to_string())
            },
            ProviderError::Other(err) => {
                match err.as_any().downcast_ref::<JsonRpcClientError<HttpTransportError>>() {
                    Some(JsonRpcClientError::JsonRpcError(rpc_err))
                        if rpc_err.code == INVALID_PARAMS_CODE =>
                    {
                        StarknetClientError::InvalidRequest(rpc_err.message.clone())
                    },
                    Some(JsonRpcClientError::JsonRpcError(rpc_err)) => {
                        StarknetClientError::Rpc(format!("{}: {}", rpc_err.code, rpc_err.message))
                    },
                    Some(JsonRpcClientError::JsonError(json_err)) => {
                        StarknetClientError::Malformed(json_err.to_string())
                    },
                    _ => StarknetClientError::Network(err.to_string()),
                }
            },
            other => StarknetClientError::Network(other.to_string()),
        }
    }
}

impl From<StarknetClientError> for ChainQueryError {
    fn from(e: StarknetClientError) -> Self {
        match e {
            StarknetClientError::Network(msg) => ChainQueryError::Network(msg),
            StarknetClientError::Rpc(msg) => ChainQueryError::Rpc(msg),
            StarknetClientError::InvalidRequest(msg) => ChainQueryError::InvalidRequest(msg),
            StarknetClientError::Malformed(msg) => ChainQueryError::Malformed(msg),
        }
    }
}

#[cfg(test)]
mod test {
    use starknet::{
        core::types::StarknetError,
        providers::{
            ProviderError,
            jsonrpc::{HttpTransportError, JsonRpcClientError, JsonRpcError},
        },
    };

    use super::StarknetClientError;

    /// Wrap a raw JSON-RPC error the way the provider surfaces unknown codes
    fn raw_rpc_error(code: i64, message: &str) -> ProviderError {
        let body = serde_json::json!({ "code": code, "message": message });
        let rpc_err: JsonRpcError = serde_json::from_value(body).unwrap();
        let err = JsonRpcClientError::<HttpTransportError>::JsonRpcError(rpc_err);
        ProviderError::Other(Box::new(err))
    }

    /// Tests that request bugs are separated from node-side failures
    #[test]
    fn test_provider_error_classification() {
        let page_size = ProviderError::StarknetError(StarknetError::PageSizeTooBig);
        assert!(matches!(page_size.into(), StarknetClientError::InvalidRequest(_)));

        let token = ProviderError::StarknetError(StarknetError::InvalidContinuationToken);
        assert!(matches!(token.into(), StarknetClientError::InvalidRequest(_)));

        let params = raw_rpc_error(-32602, "Invalid params");
        assert!(matches!(params.into(), StarknetClientError::InvalidRequest(_)));

        let block = ProviderError::StarknetError(StarknetError::BlockNotFound);
        assert!(matches!(block.into(), StarknetClientError::Rpc(_)));

        let internal = raw_rpc_error(-32603, "Internal error");
        assert!(matches!(internal.into(), StarknetClientError::Rpc(_)));

        assert!(matches!(
            ProviderError::RateLimited.into(),
            StarknetClientError::Network(_)
        ));
        assert!(matches!(
            ProviderError::ArrayLengthMismatch.into(),
            StarknetClientError::Malformed(_)
        ));
    }
}
