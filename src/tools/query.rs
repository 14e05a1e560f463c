//! Query tools.
//!
//! Tools: query_project_statistics, query_dataset_info, query_operation_history,
//!        query_search_projects

use serde_json::{json, Map, Value as JsonValue};

use crate::convert::{get_optional_string, get_optional_u64, get_string_arg};
use crate::error::Result;
use crate::history::{OperationStatus, DEFAULT_HISTORY_LIMIT};
use crate::query::{project_statistics, search_projects};
use crate::schema;
use crate::tools::project::cache_project_list;
use crate::tools::{ToolCategory, ToolContext, ToolDef};

/// Get all query tool definitions.
pub fn tools() -> Vec<ToolDef> {
    vec![
        ToolDef::new(
            "query_project_statistics",
            "Get file counts and completion percentage for a project. Missing \
             counts are reported as zero.",
            schema!(object {
                required: { "project_id": string }
            }),
        ),
        ToolDef::new(
            "query_dataset_info",
            "Get detailed information about a dataset.",
            schema!(object {
                required: { "dataset_id": string }
            }),
        ),
        ToolDef::new(
            "query_operation_history",
            "Get the most recent operations performed by this server, newest \
             first, optionally filtered by status.",
            json!({
                "type": "object",
                "properties": {
                    "limit": { "type": "integer", "default": DEFAULT_HISTORY_LIMIT },
                    "status": {
                        "type": "string",
                        "enum": ["success", "failed", "in_progress"]
                    }
                },
                "required": []
            }),
        ),
        ToolDef::new(
            "query_search_projects",
            "Search projects whose name or data type contains the query \
             (case-insensitive). Always fetches a fresh project list.",
            schema!(object {
                required: { "query": string }
            }),
        ),
    ]
}

/// Dispatch a query tool call.
pub async fn dispatch(
    ctx: &mut ToolContext<'_>,
    name: &str,
    args: &Map<String, JsonValue>,
) -> Result<JsonValue> {
    match name {
        "query_project_statistics" => {
            let project_id = get_string_arg(args, "project_id")?;
            let details = ctx.client.get_project_details(&project_id).await?;
            Ok(project_statistics(&project_id, &details["project"]))
        }

        "query_dataset_info" => {
            let dataset_id = get_string_arg(args, "dataset_id")?;
            ctx.client.get_dataset(&dataset_id).await
        }

        "query_operation_history" => {
            let limit = get_optional_u64(args, "limit")
                .map(|l| l as usize)
                .unwrap_or(DEFAULT_HISTORY_LIMIT);
            // An unrecognized status matches no record
            let (total, operations) = match get_optional_string(args, "status") {
                Some(s) => match OperationStatus::parse(&s) {
                    Some(status) => ctx.state.history(limit, Some(status)),
                    None => (0, Vec::new()),
                },
                None => ctx.state.history(limit, None),
            };
            Ok(json!({
                "total": total,
                "operations": operations,
            }))
        }

        "query_search_projects" => {
            let query = get_string_arg(args, "query")?;
            let all = ctx.client.get_all_projects().await?;
            cache_project_list(ctx.state, &all["projects"]);

            let projects = all["projects"].as_array().map(Vec::as_slice).unwrap_or(&[]);
            Ok(json!({ "projects": search_projects(projects, &query) }))
        }

        _ => Err(ToolCategory::Query.unknown(name)),
    }
}
