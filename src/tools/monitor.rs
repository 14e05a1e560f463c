//! Monitoring tools.
//!
//! Tools: monitor_job_status, monitor_project_progress, monitor_active_operations,
//!        monitor_system_health

use serde_json::{json, Map, Value as JsonValue};

use crate::convert::get_string_arg;
use crate::error::Result;
use crate::schema;
use crate::tools::{ToolCategory, ToolContext, ToolDef};

/// Get all monitoring tool definitions.
pub fn tools() -> Vec<ToolDef> {
    vec![
        ToolDef::new(
            "monitor_job_status",
            "Get the status of a background job such as a pre-annotation upload.",
            schema!(object {
                required: { "job_id": string }
            }),
        ),
        ToolDef::new(
            "monitor_project_progress",
            "Get annotation progress of a project: total, annotated, reviewed and \
             accepted files plus a completion percentage.",
            schema!(object {
                required: { "project_id": string }
            }),
        ),
        ToolDef::new(
            "monitor_active_operations",
            "List operations in progress or performed in the last five minutes.",
            schema!(object {}),
        ),
        ToolDef::new(
            "monitor_system_health",
            "Report server health: connection state, cached projects and datasets, \
             and the last operation performed.",
            schema!(object {}),
        ),
    ]
}

/// Dispatch a monitoring tool call.
pub async fn dispatch(
    ctx: &mut ToolContext<'_>,
    name: &str,
    args: &Map<String, JsonValue>,
) -> Result<JsonValue> {
    match name {
        "monitor_job_status" => {
            let job_id = get_string_arg(args, "job_id")?;
            Ok(ctx.client.job_status(&job_id))
        }

        "monitor_project_progress" => {
            let project_id = get_string_arg(args, "project_id")?;
            ctx.client.get_project_progress(&project_id).await
        }

        "monitor_active_operations" => {
            let operations = ctx.state.operations();
            Ok(json!({
                "active_operations": ctx.state.active_operations(),
                "total_operations": operations.len(),
            }))
        }

        "monitor_system_health" => {
            let operations = ctx.state.operations();
            Ok(json!({
                "status": "healthy",
                "connected": true,
                "active_projects": ctx.state.project_count(),
                "active_datasets": ctx.state.dataset_count(),
                "operations_performed": operations.len(),
                "last_operation": operations.last(),
            }))
        }

        _ => Err(ToolCategory::Monitor.unknown(name)),
    }
}
