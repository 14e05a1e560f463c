//! Dataset management tools.
//!
//! Tools: dataset_create, dataset_upload_files, dataset_upload_folder, dataset_list, dataset_get

use std::path::Path;

use chrono::Utc;
use serde_json::{json, Map, Value as JsonValue};
use tracing::debug;

use crate::convert::{get_optional_string, get_string_arg, get_string_array_arg, json_id};
use crate::error::Result;
use crate::schema;
use crate::session::EntityRecord;
use crate::tools::{ToolCategory, ToolContext, ToolDef};

/// Get all dataset tool definitions.
pub fn tools() -> Vec<ToolDef> {
    vec![
        ToolDef::new(
            "dataset_create",
            "Create a new dataset. Returns the new dataset_id.",
            schema!(object {
                required: { "dataset_name": string, "data_type": data_type },
                optional: { "dataset_description": string, "connection_id": string }
            }),
        ),
        ToolDef::new(
            "dataset_upload_files",
            "Register local files for upload. Returns a connection_id that can be \
             linked to a dataset or project.",
            schema!(object {
                required: { "files": array_string },
                optional: { "data_type": data_type }
            }),
        ),
        ToolDef::new(
            "dataset_upload_folder",
            "Register every file in a local folder whose extension matches the \
             data type. Returns a connection_id.",
            schema!(object {
                required: { "folder_path": string, "data_type": data_type }
            }),
        ),
        ToolDef::new(
            "dataset_list",
            "List linked and unlinked datasets of a data type (default image). \
             Refreshes the cached dataset resources.",
            schema!(object {
                optional: { "data_type": data_type }
            }),
        ),
        ToolDef::new(
            "dataset_get",
            "Get detailed information about a single dataset.",
            schema!(object {
                required: { "dataset_id": string }
            }),
        ),
    ]
}

/// Dispatch a dataset tool call.
pub async fn dispatch(
    ctx: &mut ToolContext<'_>,
    name: &str,
    args: &Map<String, JsonValue>,
) -> Result<JsonValue> {
    match name {
        "dataset_create" => {
            let dataset_name = get_string_arg(args, "dataset_name")?;
            let data_type = get_string_arg(args, "data_type")?;

            let result = ctx.client.create_dataset(args).await?;
            match json_id(result.get("dataset_id")) {
                Some(id) => {
                    let mut record = EntityRecord::new();
                    record.insert("id".to_string(), json!(id));
                    record.insert("name".to_string(), json!(dataset_name));
                    record.insert("data_type".to_string(), json!(data_type));
                    record.insert("created_at".to_string(), json!(Utc::now()));
                    ctx.state.put_dataset(id, record);
                }
                None => debug!("dataset_create response carried no dataset_id"),
            }
            Ok(result)
        }

        "dataset_upload_files" => {
            let files = get_string_array_arg(args, "files")?;
            ctx.client.upload_files(&files).await
        }

        "dataset_upload_folder" => {
            let folder_path = get_string_arg(args, "folder_path")?;
            let data_type = get_string_arg(args, "data_type")?;
            ctx.client
                .upload_folder(Path::new(&folder_path), &data_type)
                .await
        }

        "dataset_list" => {
            let data_type = get_optional_string(args, "data_type");
            let result = ctx.client.get_all_datasets(data_type.as_deref()).await?;

            let listed = result["linked"]
                .as_array()
                .into_iter()
                .chain(result["unlinked"].as_array())
                .flatten();
            for dataset in listed {
                match (json_id(dataset.get("dataset_id")), dataset.as_object()) {
                    (Some(id), Some(record)) => ctx.state.put_dataset(id, record.clone()),
                    _ => debug!("skipping dataset without dataset_id"),
                }
            }
            Ok(result)
        }

        "dataset_get" => {
            let dataset_id = get_string_arg(args, "dataset_id")?;
            ctx.client.get_dataset(&dataset_id).await
        }

        _ => Err(ToolCategory::Dataset.unknown(name)),
    }
}
