//! Project management tools.
//!
//! Tools: project_create, project_list, project_get, project_update_rotation

use chrono::Utc;
use serde_json::{json, Map, Value as JsonValue};
use tracing::debug;

use crate::convert::{get_object_arg, get_string_arg, json_id};
use crate::error::Result;
use crate::schema;
use crate::session::{EntityRecord, SessionState};
use crate::tools::{ToolCategory, ToolContext, ToolDef};

/// Get all project tool definitions.
pub fn tools() -> Vec<ToolDef> {
    vec![
        ToolDef::new(
            "project_create",
            "Create a new annotation project. Optionally uploads local files \
             (files_to_upload) or every matching file in a folder (folder_to_upload) \
             and links them to the project. Returns the new project_id.",
            schema!(object {
                required: {
                    "project_name": string,
                    "data_type": data_type,
                    "created_by": string,
                    "annotation_guide": array_object
                },
                optional: {
                    "dataset_id": string,
                    "rotation_config": object,
                    "autolabel": boolean,
                    "files_to_upload": array_string,
                    "folder_to_upload": string
                }
            }),
        ),
        ToolDef::new(
            "project_list",
            "List all projects for the client, with details. Refreshes the cached \
             project resources.",
            schema!(object {}),
        ),
        ToolDef::new(
            "project_get",
            "Get detailed information about a single project.",
            schema!(object {
                required: { "project_id": string }
            }),
        ),
        ToolDef::new(
            "project_update_rotation",
            "Update the annotation/review/client-review rotation configuration \
             of a project.",
            schema!(object {
                required: { "project_id": string, "rotation_config": object }
            }),
        ),
    ]
}

/// Cache every project in a list response under its `project_id`.
///
/// Entries without an id cannot be addressed and are skipped.
pub(crate) fn cache_project_list(state: &mut SessionState, projects: &JsonValue) {
    for project in projects.as_array().into_iter().flatten() {
        match (json_id(project.get("project_id")), project.as_object()) {
            (Some(id), Some(record)) => state.put_project(id, record.clone()),
            _ => debug!("skipping project without project_id"),
        }
    }
}

/// Dispatch a project tool call.
pub async fn dispatch(
    ctx: &mut ToolContext<'_>,
    name: &str,
    args: &Map<String, JsonValue>,
) -> Result<JsonValue> {
    match name {
        "project_create" => {
            let project_name = get_string_arg(args, "project_name")?;
            let data_type = get_string_arg(args, "data_type")?;

            let result = ctx.client.create_project(args).await?;
            match json_id(result.get("project_id")) {
                Some(id) => {
                    let mut record = EntityRecord::new();
                    record.insert("id".to_string(), json!(id));
                    record.insert("name".to_string(), json!(project_name));
                    record.insert("data_type".to_string(), json!(data_type));
                    record.insert("created_at".to_string(), json!(Utc::now()));
                    record.extend(args.clone());
                    ctx.state.put_project(id, record);
                }
                None => debug!("project_create response carried no project_id"),
            }
            Ok(result)
        }

        "project_list" => {
            let result = ctx.client.get_all_projects().await?;
            cache_project_list(ctx.state, &result["projects"]);
            Ok(result)
        }

        "project_get" => {
            let project_id = get_string_arg(args, "project_id")?;
            ctx.client.get_project_details(&project_id).await
        }

        "project_update_rotation" => {
            let project_id = get_string_arg(args, "project_id")?;
            let rotation_config = get_object_arg(args, "rotation_config")?;
            ctx.client
                .update_rotation_config(&project_id, rotation_config)
                .await
        }

        _ => Err(ToolCategory::Project.unknown(name)),
    }
}
