//! Error types for the recall server.

use recall_memory::MemoryError;
use thiserror::Error;

use crate::mcp::protocol::JsonRpcError;

/// Errors that can occur while serving requests.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Invalid params: {0}")]
    InvalidParams(String),

    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Memory store not initialized")]
    NotInitialized,

    #[error(transparent)]
    Memory(#[from] MemoryError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl ServerError {
    pub fn invalid_params(msg: impl Into<String>) -> Self {
        Self::InvalidParams(msg.into())
    }
}

impl From<ServerError> for JsonRpcError {
    fn from(err: ServerError) -> Self {
        match &err {
            ServerError::InvalidParams(_) | ServerError::UnknownTool(_) => {
                JsonRpcError::invalid_params(err.to_string())
            }
            _ => JsonRpcError::internal_error(err.to_string()),
        }
    }
}

/// Result type alias for server operations.
pub type ServerResult<T> = Result<T, ServerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        assert_eq!(
            ServerError::invalid_params("missing 'query'").to_string(),
            "Invalid params: missing 'query'"
        );
        assert_eq!(
            ServerError::UnknownTool("paint".to_string()).to_string(),
            "Unknown tool: paint"
        );
        let err: ServerError = MemoryError::embedding("connection refused").into();
        assert_eq!(err.to_string(), "Embedding unavailable: connection refused");
    }

    #[test]
    fn test_jsonrpc_conversion_invalid_params() {
        let err: JsonRpcError = ServerError::invalid_params("bad").into();
        assert_eq!(err.code, -32602);

        let err: JsonRpcError = ServerError::UnknownTool("x".to_string()).into();
        assert_eq!(err.code, -32602);
    }

    #[test]
    fn test_jsonrpc_conversion_internal() {
        let err: JsonRpcError = ServerError::NotInitialized.into();
        assert_eq!(err.code, -32603);

        let err: JsonRpcError = ServerError::from(MemoryError::DimensionMismatch {
            expected: 3,
            actual: 4,
        })
        .into();
        assert_eq!(err.code, -32603);
        assert!(err.message.contains("Dimension mismatch"));
    }

    #[test]
    fn test_from_io_error() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        assert!(matches!(ServerError::from(io_err), ServerError::Io(_)));
    }
}
