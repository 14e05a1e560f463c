//! Tool registry and category definitions.
//!
//! Tool names carry their category as a prefix (`project_`, `dataset_`, ...).
//! [`ToolCategory::classify`] turns a name into a category, and each category
//! module matches the full name against its own fixed table.

pub mod annotation;
pub mod dataset;
pub mod monitor;
pub mod project;
pub mod query;

use std::time::Instant;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use tracing::{debug, warn};

use crate::client::LabellerrClient;
use crate::error::{McpError, Result};
use crate::history::OperationRecord;
use crate::session::{McpSession, SessionState};

/// A tool definition for the MCP tools/list response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolDef {
    /// Tool name (e.g., "project_create")
    pub name: String,
    /// Tool description
    pub description: String,
    /// JSON Schema for the input parameters
    #[serde(rename = "inputSchema")]
    pub input_schema: JsonValue,
}

impl ToolDef {
    /// Create a new tool definition.
    pub fn new(name: &str, description: &str, input_schema: JsonValue) -> Self {
        Self {
            name: name.to_string(),
            description: description.to_string(),
            input_schema,
        }
    }
}

/// Tool category, derived from the name prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolCategory {
    /// `project_*`
    Project,
    /// `dataset_*`
    Dataset,
    /// `annotation_*`
    Annotation,
    /// `monitor_*`
    Monitor,
    /// `query_*`
    Query,
}

impl ToolCategory {
    /// Categories in routing order.
    pub const ALL: [ToolCategory; 5] = [
        ToolCategory::Project,
        ToolCategory::Dataset,
        ToolCategory::Annotation,
        ToolCategory::Monitor,
        ToolCategory::Query,
    ];

    /// Name prefix of the category's tools.
    pub fn prefix(self) -> &'static str {
        match self {
            ToolCategory::Project => "project_",
            ToolCategory::Dataset => "dataset_",
            ToolCategory::Annotation => "annotation_",
            ToolCategory::Monitor => "monitor_",
            ToolCategory::Query => "query_",
        }
    }

    /// Label used in "unknown operation" messages.
    pub fn label(self) -> &'static str {
        match self {
            ToolCategory::Project => "project",
            ToolCategory::Dataset => "dataset",
            ToolCategory::Annotation => "annotation",
            ToolCategory::Monitor => "monitoring",
            ToolCategory::Query => "query",
        }
    }

    /// First category whose prefix the name starts with.
    pub fn classify(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| name.starts_with(c.prefix()))
    }

    /// Whether successful calls record their duration.
    ///
    /// Monitor and query tools are read-outs and are logged without timing.
    pub fn tracks_duration(self) -> bool {
        matches!(
            self,
            ToolCategory::Project | ToolCategory::Dataset | ToolCategory::Annotation
        )
    }

    /// Whether successful calls keep their arguments in the log.
    pub fn records_args(self) -> bool {
        self == ToolCategory::Project
    }

    /// Error for a name inside this category that maps to no operation.
    pub fn unknown(self, name: &str) -> McpError {
        McpError::UnknownOperation {
            category: self.label().to_string(),
            name: name.to_string(),
        }
    }
}

/// What a category handler gets to work with.
pub struct ToolContext<'a> {
    /// API client
    pub client: &'a LabellerrClient,
    /// Session caches and log
    pub state: &'a mut SessionState,
}

/// Registry of all available tools.
pub struct ToolRegistry {
    tools: Vec<ToolDef>,
}

impl ToolRegistry {
    /// Create a new registry with all tools registered.
    pub fn new() -> Self {
        let mut tools = Vec::new();

        tools.extend(project::tools());
        tools.extend(dataset::tools());
        tools.extend(annotation::tools());
        tools.extend(monitor::tools());
        tools.extend(query::tools());

        Self { tools }
    }

    /// Get all tool definitions.
    pub fn tools(&self) -> &[ToolDef] {
        &self.tools
    }

    /// Dispatch a tool call to the appropriate handler.
    ///
    /// Fails with [`McpError::NotInitialized`] before routing when the session
    /// has no client; such calls are not logged. Every routed call appends
    /// exactly one record to the operation log, success or failure.
    pub async fn dispatch(
        &self,
        session: &mut McpSession,
        name: &str,
        args: Map<String, JsonValue>,
    ) -> Result<JsonValue> {
        let (client, state) = session.split();
        let client = client.ok_or(McpError::NotInitialized)?;
        let mut ctx = ToolContext { client, state };

        debug!(tool = name, "dispatching tool call");
        let started = Instant::now();
        let outcome = match ToolCategory::classify(name) {
            Some(category) => route(&mut ctx, category, name, &args)
                .await
                .map(|result| (result, category)),
            None => Err(McpError::UnknownTool(name.to_string())),
        };

        match outcome {
            Ok((result, category)) => {
                let mut record = OperationRecord::success(name);
                if category.tracks_duration() {
                    record = record.with_duration(started.elapsed());
                }
                if category.records_args() {
                    record = record.with_args(args);
                }
                ctx.state.append_operation(record);
                Ok(result)
            }
            Err(err) => {
                warn!(tool = name, error = %err, "tool call failed");
                ctx.state
                    .append_operation(OperationRecord::failed(name, err.to_string()));
                Err(err)
            }
        }
    }
}

async fn route(
    ctx: &mut ToolContext<'_>,
    category: ToolCategory,
    name: &str,
    args: &Map<String, JsonValue>,
) -> Result<JsonValue> {
    match category {
        ToolCategory::Project => project::dispatch(ctx, name, args).await,
        ToolCategory::Dataset => dataset::dispatch(ctx, name, args).await,
        ToolCategory::Annotation => annotation::dispatch(ctx, name, args).await,
        ToolCategory::Monitor => monitor::dispatch(ctx, name, args).await,
        ToolCategory::Query => query::dispatch(ctx, name, args).await,
    }
}

impl Default for ToolRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Helper macro for creating JSON Schema for tool input parameters.
#[macro_export]
macro_rules! schema {
    // Object with required and optional properties
    (object {
        required: { $($req_name:literal : $req_type:tt),* $(,)? },
        optional: { $($opt_name:literal : $opt_type:tt),* $(,)? }
    }) => {{
        let mut required = Vec::new();
        $(required.push($req_name);)*

        let mut props = serde_json::Map::new();
        $(props.insert($req_name.to_string(), schema!(@type $req_type));)*
        $(props.insert($opt_name.to_string(), schema!(@type $opt_type));)*

        serde_json::json!({
            "type": "object",
            "properties": props,
            "required": required
        })
    }};

    // Object with only required properties
    (object {
        required: { $($req_name:literal : $req_type:tt),* $(,)? }
    }) => {{
        let mut required = Vec::new();
        $(required.push($req_name);)*

        let mut props = serde_json::Map::new();
        $(props.insert($req_name.to_string(), schema!(@type $req_type));)*

        serde_json::json!({
            "type": "object",
            "properties": props,
            "required": required
        })
    }};

    // Object with only optional properties
    (object {
        optional: { $($opt_name:literal : $opt_type:tt),* $(,)? }
    }) => {{
        let mut props = serde_json::Map::new();
        $(props.insert($opt_name.to_string(), schema!(@type $opt_type));)*

        serde_json::json!({
            "type": "object",
            "properties": props,
            "required": []
        })
    }};

    // Empty object (no parameters)
    (object {}) => {{
        serde_json::json!({
            "type": "object",
            "properties": {},
            "required": []
        })
    }};

    // Type mappings
    (@type string) => { serde_json::json!({"type": "string"}) };
    (@type integer) => { serde_json::json!({"type": "integer"}) };
    (@type boolean) => { serde_json::json!({"type": "boolean"}) };
    (@type object) => { serde_json::json!({"type": "object"}) };
    (@type array_string) => { serde_json::json!({"type": "array", "items": {"type": "string"}}) };
    (@type array_object) => { serde_json::json!({"type": "array", "items": {"type": "object"}}) };
    (@type data_type) => {
        serde_json::json!({"type": "string", "enum": ["image", "video", "audio", "document", "text"]})
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_classify_by_prefix() {
        assert_eq!(ToolCategory::classify("project_create"), Some(ToolCategory::Project));
        assert_eq!(ToolCategory::classify("dataset_list"), Some(ToolCategory::Dataset));
        assert_eq!(
            ToolCategory::classify("annotation_export"),
            Some(ToolCategory::Annotation)
        );
        assert_eq!(ToolCategory::classify("monitor_nope"), Some(ToolCategory::Monitor));
        assert_eq!(ToolCategory::classify("query_x"), Some(ToolCategory::Query));
        assert_eq!(ToolCategory::classify("projects_list"), None);
        assert_eq!(ToolCategory::classify("invalid_tool"), None);
        assert_eq!(ToolCategory::classify(""), None);
    }

    #[test]
    fn test_catalog_is_complete_and_categorized() {
        let registry = ToolRegistry::new();
        let tools = registry.tools();
        assert_eq!(tools.len(), 22);

        let names: HashSet<_> = tools.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names.len(), tools.len(), "tool names must be unique");

        for tool in tools {
            assert!(
                ToolCategory::classify(&tool.name).is_some(),
                "{} has no category",
                tool.name
            );
            assert_eq!(tool.input_schema["type"], "object");
            assert!(tool.input_schema["required"].is_array());
            assert!(!tool.description.is_empty());
        }
    }

    #[test]
    fn test_catalog_order_follows_categories() {
        let registry = ToolRegistry::new();
        let order: Vec<_> = registry
            .tools()
            .iter()
            .filter_map(|t| ToolCategory::classify(&t.name))
            .collect();
        let mut sorted = order.clone();
        sorted.sort_by_key(|c| ToolCategory::ALL.iter().position(|x| x == c));
        assert_eq!(order, sorted);
    }
}
