//! # labellerr-mcp
//!
//! MCP (Model Context Protocol) server for the Labellerr annotation platform.
//!
//! This crate exposes the Labellerr REST API as MCP tools for AI agents, plus a
//! small read-only resource catalog (cached projects, datasets and the
//! operation history). It implements the MCP protocol over stdin/stdout using
//! JSON-RPC 2.0.
//!
//! ## Features
//!
//! - **22 tools** in five categories: `project_`, `dataset_`, `annotation_`, `monitor_`, `query_`
//! - **Session state**: caches projects and datasets seen in responses and logs every call
//! - **Resources**: `labellerr://project/<id>`, `labellerr://dataset/<id>`, `labellerr://history`
//!
//! ## Usage
//!
//! The server is typically run as an executable and configured in AI tools like Claude Desktop:
//!
//! ```json
//! {
//!   "mcpServers": {
//!     "labellerr": {
//!       "command": "/path/to/labellerr-mcp",
//!       "env": {
//!         "LABELLERR_API_KEY": "...",
//!         "LABELLERR_API_SECRET": "...",
//!         "LABELLERR_CLIENT_ID": "..."
//!       }
//!     }
//!   }
//! }
//! ```
//!
//! ## Library Usage
//!
//! For testing or embedding, you can use the library API:
//!
//! ```no_run
//! use labellerr_mcp::{Credentials, LabellerrClient, McpServer, McpSession};
//!
//! # async fn run() -> labellerr_mcp::Result<()> {
//! let client = Credentials::from_env()
//!     .map(|creds| LabellerrClient::connect(labellerr_mcp::DEFAULT_BASE_URL, creds));
//! let mut server = McpServer::new(McpSession::new(client));
//!
//! // Reads from stdin, writes to stdout
//! server.run().await?;
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]

mod client;
mod config;
mod convert;
mod error;
mod folder;
mod history;
mod query;
mod resources;
mod server;
mod session;
mod tools;
mod transport;

pub use client::LabellerrClient;
pub use config::{
    Credentials, API_KEY_ENV, API_SECRET_ENV, BASE_URL_ENV, CLIENT_ID_ENV, DEFAULT_BASE_URL,
};
pub use error::{rpc_codes, McpError, Result};
pub use folder::files_in_folder;
pub use history::{
    OperationLog, OperationRecord, OperationStatus, ACTIVE_OPERATION_WINDOW, DEFAULT_HISTORY_LIMIT,
};
pub use query::completion_percentage;
pub use resources::{list_resources, read_resource, Resource, ResourceContents, ResourceUri};
pub use server::{JsonRpcRequest, JsonRpcResponse, McpServer};
pub use session::{EntityRecord, McpSession, SessionState};
pub use tools::{ToolCategory, ToolDef, ToolRegistry};
pub use transport::{decode_response, ApiRequest, HttpTransport, RequestBody, Transport};
