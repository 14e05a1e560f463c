//! Annotation import/export tools.
//!
//! Tools: annotation_upload_preannotations, annotation_upload_preannotations_async,
//!        annotation_export, annotation_check_export_status, annotation_download_export

use serde_json::{json, Map, Value as JsonValue};

use crate::convert::{get_optional_string, get_string_arg, get_string_array_arg};
use crate::error::Result;
use crate::schema;
use crate::tools::{ToolCategory, ToolContext, ToolDef};

fn preannotation_schema() -> JsonValue {
    json!({
        "type": "object",
        "properties": {
            "project_id": { "type": "string" },
            "annotation_format": {
                "type": "string",
                "enum": ["json", "coco_json", "csv", "png"]
            },
            "annotation_file": { "type": "string" }
        },
        "required": ["project_id", "annotation_format", "annotation_file"]
    })
}

/// Get all annotation tool definitions.
pub fn tools() -> Vec<ToolDef> {
    vec![
        ToolDef::new(
            "annotation_upload_preannotations",
            "Upload pre-annotations for a project from a local annotation file and \
             start processing. Returns the processing job_id.",
            preannotation_schema(),
        ),
        ToolDef::new(
            "annotation_upload_preannotations_async",
            "Same as annotation_upload_preannotations but flags the job as \
             asynchronous; poll monitor_job_status for completion.",
            preannotation_schema(),
        ),
        ToolDef::new(
            "annotation_export",
            "Create an export of a project's annotations for the given file \
             statuses. Returns the export_id.",
            json!({
                "type": "object",
                "properties": {
                    "project_id": { "type": "string" },
                    "export_name": { "type": "string" },
                    "export_description": { "type": "string" },
                    "export_format": {
                        "type": "string",
                        "enum": ["json", "coco_json", "csv", "png"]
                    },
                    "statuses": { "type": "array", "items": { "type": "string" } }
                },
                "required": ["project_id", "export_name", "export_format", "statuses"]
            }),
        ),
        ToolDef::new(
            "annotation_check_export_status",
            "Check the status of one or more exports. Returns all exports and the \
             completed subset.",
            schema!(object {
                required: { "project_id": string, "export_ids": array_string }
            }),
        ),
        ToolDef::new(
            "annotation_download_export",
            "Get the download URL of a completed export.",
            schema!(object {
                required: { "project_id": string, "export_id": string }
            }),
        ),
    ]
}

/// Dispatch an annotation tool call.
pub async fn dispatch(
    ctx: &mut ToolContext<'_>,
    name: &str,
    args: &Map<String, JsonValue>,
) -> Result<JsonValue> {
    match name {
        "annotation_upload_preannotations" | "annotation_upload_preannotations_async" => {
            let project_id = get_string_arg(args, "project_id")?;
            let format = get_string_arg(args, "annotation_format")?;
            let file = get_string_arg(args, "annotation_file")?;

            if name.ends_with("_async") {
                ctx.client
                    .upload_preannotations_async(&project_id, &format, &file)
                    .await
            } else {
                ctx.client
                    .upload_preannotations(&project_id, &format, &file)
                    .await
            }
        }

        "annotation_export" => {
            let project_id = get_string_arg(args, "project_id")?;
            let export_name = get_string_arg(args, "export_name")?;
            let export_format = get_string_arg(args, "export_format")?;
            let statuses = get_string_array_arg(args, "statuses")?;
            let description = get_optional_string(args, "export_description");

            ctx.client
                .create_export(&project_id, &export_name, &export_format, statuses, description)
                .await
        }

        "annotation_check_export_status" => {
            let project_id = get_string_arg(args, "project_id")?;
            let export_ids = get_string_array_arg(args, "export_ids")?;
            ctx.client.check_export_status(&project_id, export_ids).await
        }

        "annotation_download_export" => {
            let project_id = get_string_arg(args, "project_id")?;
            let export_id = get_string_arg(args, "export_id")?;
            ctx.client.download_export(&project_id, &export_id).await
        }

        _ => Err(ToolCategory::Annotation.unknown(name)),
    }
}
