//! Error types for the MCP server.
//!
//! Maps routing, backend and configuration failures to MCP-friendly error responses.

use serde::{Deserialize, Serialize};

/// MCP server errors.
#[derive(Debug, Clone, PartialEq, thiserror::Error, Serialize, Deserialize)]
pub enum McpError {
    /// Failure reported by the Labellerr API or the network layer underneath it.
    #[error("API request failed: {message}")]
    Api {
        /// HTTP status, when the server answered at all
        status: Option<u16>,
        /// Remote-supplied message, or a generic status message
        message: String,
    },

    /// Tool name matches no known category prefix.
    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    /// Tool name matches a category prefix but no operation within it.
    #[error("Unknown {category} tool: {name}")]
    UnknownOperation {
        /// Category label (e.g. "project")
        category: String,
        /// Full tool name as requested
        name: String,
    },

    /// Missing required argument.
    #[error("missing required argument: {0}")]
    MissingArg(String),

    /// Invalid argument value.
    #[error("invalid argument '{name}': {reason}")]
    InvalidArg {
        /// Argument name
        name: String,
        /// Reason why it's invalid
        reason: String,
    },

    /// Credentials were not configured at startup.
    #[error("Labellerr client not initialized. Please check your environment variables.")]
    NotInitialized,

    /// Resource URI is well formed but nothing is cached under it.
    #[error("Resource not found: {0}")]
    ResourceNotFound(String),

    /// Resource URI does not follow the `labellerr://` scheme.
    #[error("Invalid resource URI: {0}")]
    InvalidResourceUri(String),

    /// JSON-RPC protocol error.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(String),
}

impl McpError {
    /// Build a backend error from a remote message.
    pub fn api(status: Option<u16>, message: impl Into<String>) -> Self {
        McpError::Api {
            status,
            message: message.into(),
        }
    }

    /// Whether this error came from the remote API rather than from routing or arguments.
    pub fn is_backend(&self) -> bool {
        matches!(self, McpError::Api { .. } | McpError::Io(_))
    }
}

impl From<reqwest::Error> for McpError {
    fn from(err: reqwest::Error) -> Self {
        McpError::Api {
            status: err.status().map(|s| s.as_u16()),
            message: err.to_string(),
        }
    }
}

impl From<std::io::Error> for McpError {
    fn from(err: std::io::Error) -> Self {
        McpError::Io(err.to_string())
    }
}

impl From<serde_json::Error> for McpError {
    fn from(err: serde_json::Error) -> Self {
        McpError::Protocol(format!("JSON error: {}", err))
    }
}

/// JSON-RPC error codes.
pub mod rpc_codes {
    /// Parse error - Invalid JSON was received.
    pub const PARSE_ERROR: i32 = -32700;
    /// Invalid Request - The JSON sent is not a valid Request object.
    pub const INVALID_REQUEST: i32 = -32600;
    /// Method not found - The method does not exist / is not available.
    pub const METHOD_NOT_FOUND: i32 = -32601;
    /// Invalid params - Invalid method parameter(s).
    pub const INVALID_PARAMS: i32 = -32602;
    /// Internal error - Internal JSON-RPC error.
    pub const INTERNAL_ERROR: i32 = -32603;
}

impl McpError {
    /// Convert to JSON-RPC error code.
    pub fn rpc_code(&self) -> i32 {
        match self {
            McpError::UnknownTool(_) | McpError::UnknownOperation { .. } => {
                rpc_codes::METHOD_NOT_FOUND
            }
            McpError::MissingArg(_) | McpError::InvalidArg { .. } => rpc_codes::INVALID_PARAMS,
            McpError::Protocol(_)
            | McpError::ResourceNotFound(_)
            | McpError::InvalidResourceUri(_) => rpc_codes::INVALID_REQUEST,
            McpError::Api { .. } | McpError::NotInitialized | McpError::Io(_) => {
                rpc_codes::INTERNAL_ERROR
            }
        }
    }
}

/// Result type for MCP operations.
pub type Result<T> = std::result::Result<T, McpError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_routing_errors_map_to_method_not_found() {
        assert_eq!(
            McpError::UnknownTool("bogus".into()).rpc_code(),
            rpc_codes::METHOD_NOT_FOUND
        );
        let err = McpError::UnknownOperation {
            category: "project".into(),
            name: "project_explode".into(),
        };
        assert_eq!(err.rpc_code(), rpc_codes::METHOD_NOT_FOUND);
        assert_eq!(err.to_string(), "Unknown project tool: project_explode");
    }

    #[test]
    fn test_api_error_keeps_remote_message() {
        let err = McpError::api(Some(403), "quota exceeded");
        assert_eq!(err.to_string(), "API request failed: quota exceeded");
        assert_eq!(err.rpc_code(), rpc_codes::INTERNAL_ERROR);
        assert!(err.is_backend());
        assert!(!McpError::MissingArg("x".into()).is_backend());
    }

    #[test]
    fn test_resource_errors_are_invalid_request() {
        assert_eq!(
            McpError::ResourceNotFound("labellerr://project/x".into()).rpc_code(),
            rpc_codes::INVALID_REQUEST
        );
        assert_eq!(
            McpError::InvalidResourceUri("http://x".into()).rpc_code(),
            rpc_codes::INVALID_REQUEST
        );
    }
}
