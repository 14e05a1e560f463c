//! Labellerr API client.
//!
//! One method per remote operation. Each method issues its request(s) through
//! a [`Transport`] and reshapes the raw response into the payload the tools
//! return. Missing optional response fields become nulls, empty arrays or
//! zero counts; only transport failures are errors.

use std::path::Path;
use std::sync::Arc;

use serde_json::{json, Map, Value as JsonValue};
use uuid::Uuid;

use crate::config::Credentials;
use crate::error::Result;
use crate::folder::files_in_folder;
use crate::query::project_progress;
use crate::transport::{ApiRequest, HttpTransport, Transport};

/// Data type assumed by dataset listing when none is given.
pub const DEFAULT_DATA_TYPE: &str = "image";

/// Client for the Labellerr REST API.
#[derive(Clone)]
pub struct LabellerrClient {
    transport: Arc<dyn Transport>,
    credentials: Credentials,
}

impl std::fmt::Debug for LabellerrClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LabellerrClient")
            .field("client_id", &self.credentials.client_id)
            .finish_non_exhaustive()
    }
}

fn request_uuid() -> String {
    Uuid::new_v4().to_string()
}

/// `body.response`, or the whole body when there is none.
fn response_or_body(body: JsonValue) -> JsonValue {
    match body.get("response") {
        Some(inner) if !inner.is_null() => inner.clone(),
        _ => body,
    }
}

/// `body.response.<key>`, or null.
fn response_field(body: &JsonValue, key: &str) -> JsonValue {
    body.get("response")
        .and_then(|r| r.get(key))
        .cloned()
        .unwrap_or(JsonValue::Null)
}

fn array_or_empty(value: Option<&JsonValue>) -> Vec<JsonValue> {
    value
        .and_then(|v| v.as_array())
        .cloned()
        .unwrap_or_default()
}

fn file_name(path: &str) -> String {
    Path::new(path)
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string())
}

impl LabellerrClient {
    /// Create a client over an arbitrary transport.
    pub fn new(transport: Arc<dyn Transport>, credentials: Credentials) -> Self {
        Self {
            transport,
            credentials,
        }
    }

    /// Create a client talking HTTP to `base_url`.
    pub fn connect(base_url: &str, credentials: Credentials) -> Self {
        let transport = HttpTransport::new(base_url, credentials.clone());
        Self::new(Arc::new(transport), credentials)
    }

    /// Client id sent with every request.
    pub fn client_id(&self) -> &str {
        &self.credentials.client_id
    }

    async fn send(&self, request: ApiRequest) -> Result<JsonValue> {
        self.transport.send(request).await
    }

    // ---------------------------------------------------------------------
    // Projects
    // ---------------------------------------------------------------------

    /// Create a project, uploading local files first when asked to.
    ///
    /// `folder_to_upload` wins over `files_to_upload`; the resulting
    /// connection id is added to the creation payload.
    pub async fn create_project(&self, config: &Map<String, JsonValue>) -> Result<JsonValue> {
        let mut payload = config.clone();
        let files = payload.remove("files_to_upload");
        let folder = payload.remove("folder_to_upload");
        let data_type = payload
            .get("data_type")
            .and_then(|v| v.as_str())
            .unwrap_or(DEFAULT_DATA_TYPE)
            .to_string();

        let upload = if let Some(folder) = folder.as_ref().and_then(|v| v.as_str()) {
            Some(self.upload_folder(Path::new(folder), &data_type).await?)
        } else if let Some(files) = files.as_ref().and_then(|v| v.as_array()) {
            let files: Vec<String> = files
                .iter()
                .filter_map(|f| f.as_str().map(str::to_string))
                .collect();
            Some(self.upload_files(&files).await?)
        } else {
            None
        };
        if let Some(upload) = upload {
            payload.insert("connection_id".to_string(), upload["connection_id"].clone());
        }

        let result = self
            .send(
                ApiRequest::post("/projects/create")
                    .header("client_id", self.client_id())
                    .json(JsonValue::Object(payload)),
            )
            .await?;

        let project_id = match response_field(&result, "project_id") {
            JsonValue::Null => result.get("project_id").cloned().unwrap_or(JsonValue::Null),
            id => id,
        };
        Ok(json!({
            "success": true,
            "project_id": project_id,
            "message": "Project created successfully",
            "details": result,
        }))
    }

    /// List all projects of the client, with details.
    pub async fn get_all_projects(&self) -> Result<JsonValue> {
        let result = self
            .send(
                ApiRequest::get("/project_drafts/projects/detailed_list")
                    .query("client_id", self.client_id())
                    .query("uuid", request_uuid()),
            )
            .await?;

        let projects = array_or_empty(result.get("response"));
        Ok(json!({
            "success": true,
            "total": projects.len(),
            "projects": projects,
        }))
    }

    /// Fetch a single project.
    pub async fn get_project_details(&self, project_id: &str) -> Result<JsonValue> {
        let result = self
            .send(
                ApiRequest::get("/projects").segment(project_id)
                    .query("client_id", self.client_id()),
            )
            .await?;

        Ok(json!({
            "success": true,
            "project": response_or_body(result),
        }))
    }

    /// Replace the rotation configuration of a project.
    pub async fn update_rotation_config(
        &self,
        project_id: &str,
        rotation_config: JsonValue,
    ) -> Result<JsonValue> {
        let result = self
            .send(
                ApiRequest::post("/projects/rotations/add")
                    .query("project_id", project_id)
                    .query("client_id", self.client_id())
                    .query("uuid", request_uuid())
                    .json(rotation_config),
            )
            .await?;

        Ok(json!({
            "success": true,
            "message": "Rotation configuration updated",
            "details": result,
        }))
    }

    // ---------------------------------------------------------------------
    // Datasets
    // ---------------------------------------------------------------------

    /// Create a dataset from the given configuration.
    pub async fn create_dataset(&self, config: &Map<String, JsonValue>) -> Result<JsonValue> {
        let result = self
            .send(
                ApiRequest::post("/datasets/create")
                    .query("client_id", self.client_id())
                    .query("uuid", request_uuid())
                    .json(JsonValue::Object(config.clone())),
            )
            .await?;

        Ok(json!({
            "success": true,
            "dataset_id": response_field(&result, "dataset_id"),
            "message": "Dataset created successfully",
        }))
    }

    /// Register local files with the platform; only their base names are sent.
    pub async fn upload_files(&self, files: &[String]) -> Result<JsonValue> {
        let file_names: Vec<String> = files.iter().map(|f| file_name(f)).collect();
        let result = self
            .send(
                ApiRequest::post("/connectors/connect/local")
                    .query("client_id", self.client_id())
                    .json(json!({ "file_names": file_names })),
            )
            .await?;

        Ok(json!({
            "success": true,
            "connection_id": response_field(&result, "temporary_connection_id"),
            "uploaded_files": file_names,
        }))
    }

    /// Upload every file in `folder` that matches `data_type`.
    pub async fn upload_folder(&self, folder: &Path, data_type: &str) -> Result<JsonValue> {
        let files: Vec<String> = files_in_folder(folder, data_type)
            .into_iter()
            .map(|p| p.to_string_lossy().into_owned())
            .collect();
        self.upload_files(&files).await
    }

    /// List linked and unlinked datasets of a data type (image by default).
    pub async fn get_all_datasets(&self, data_type: Option<&str>) -> Result<JsonValue> {
        let result = self
            .send(
                ApiRequest::get("/datasets/list")
                    .query("client_id", self.client_id())
                    .query("data_type", data_type.unwrap_or(DEFAULT_DATA_TYPE))
                    .query("permission_level", "client")
                    .query("project_id", "")
                    .query("uuid", request_uuid()),
            )
            .await?;

        let response = result.get("response");
        let linked = array_or_empty(response.and_then(|r| r.get("linked")));
        let unlinked = array_or_empty(response.and_then(|r| r.get("unlinked")));
        Ok(json!({
            "success": true,
            "total": linked.len() + unlinked.len(),
            "linked": linked,
            "unlinked": unlinked,
        }))
    }

    /// Fetch a single dataset.
    pub async fn get_dataset(&self, dataset_id: &str) -> Result<JsonValue> {
        let result = self
            .send(
                ApiRequest::get("/datasets").segment(dataset_id)
                    .query("client_id", self.client_id())
                    .query("uuid", request_uuid()),
            )
            .await?;

        Ok(json!({
            "success": true,
            "dataset": response_or_body(result),
        }))
    }

    // ---------------------------------------------------------------------
    // Annotations
    // ---------------------------------------------------------------------

    /// Start pre-annotation processing for an annotation file.
    pub async fn upload_preannotations(
        &self,
        project_id: &str,
        annotation_format: &str,
        annotation_file: &str,
    ) -> Result<JsonValue> {
        let gcs_path = format!(
            "{project_id}/{annotation_format}-{}",
            file_name(annotation_file)
        );

        self.send(
            ApiRequest::get("/connectors/direct-upload-url")
                .query("client_id", self.client_id())
                .query("purpose", "pre-annotations")
                .query("file_name", gcs_path.as_str()),
        )
        .await?;

        let result = self
            .send(
                ApiRequest::post("/actions/upload_answers")
                    .query("project_id", project_id)
                    .query("answer_format", annotation_format)
                    .query("client_id", self.client_id())
                    .query("gcs_path", gcs_path.as_str())
                    .header("email_id", self.credentials.api_key.as_str()),
            )
            .await?;

        Ok(json!({
            "success": true,
            "job_id": response_field(&result, "job_id"),
            "message": "Pre-annotation upload started",
            "status": "processing",
        }))
    }

    /// Like [`upload_preannotations`](Self::upload_preannotations), flagged as asynchronous.
    pub async fn upload_preannotations_async(
        &self,
        project_id: &str,
        annotation_format: &str,
        annotation_file: &str,
    ) -> Result<JsonValue> {
        let mut result = self
            .upload_preannotations(project_id, annotation_format, annotation_file)
            .await?;
        if let Some(obj) = result.as_object_mut() {
            obj.insert("async".to_string(), json!(true));
            obj.insert(
                "message".to_string(),
                json!("Pre-annotation upload started asynchronously"),
            );
        }
        Ok(result)
    }

    /// Start an export of annotations with the given statuses.
    pub async fn create_export(
        &self,
        project_id: &str,
        export_name: &str,
        export_format: &str,
        statuses: Vec<String>,
        export_description: Option<String>,
    ) -> Result<JsonValue> {
        let payload = json!({
            "export_name": export_name,
            "export_description": export_description.unwrap_or_default(),
            "export_format": export_format,
            "statuses": statuses,
            "export_destination": "local",
            "question_ids": ["all"],
        });
        let result = self
            .send(
                ApiRequest::post("/sdk/export/files")
                    .query("project_id", project_id)
                    .query("client_id", self.client_id())
                    .json(payload),
            )
            .await?;

        Ok(json!({
            "success": true,
            "export_id": response_field(&result, "report_id"),
            "message": "Export created successfully",
        }))
    }

    /// Status of the given exports, plus the completed subset.
    pub async fn check_export_status(
        &self,
        project_id: &str,
        export_ids: Vec<String>,
    ) -> Result<JsonValue> {
        let result = self
            .send(
                ApiRequest::post("/exports/status")
                    .query("project_id", project_id)
                    .query("client_id", self.client_id())
                    .query("uuid", request_uuid())
                    .json(json!({ "report_ids": export_ids })),
            )
            .await?;

        let exports = array_or_empty(result.get("status"));
        let completed: Vec<JsonValue> = exports
            .iter()
            .filter(|e| e.get("is_completed").and_then(|c| c.as_bool()).unwrap_or(false))
            .cloned()
            .collect();
        Ok(json!({
            "success": true,
            "exports": exports,
            "completed": completed,
        }))
    }

    /// Download URL of a finished export.
    pub async fn download_export(&self, project_id: &str, export_id: &str) -> Result<JsonValue> {
        let result = self
            .send(
                ApiRequest::get("/exports/download")
                    .query("client_id", self.client_id())
                    .query("project_id", project_id)
                    .query("uuid", request_uuid())
                    .query("report_id", export_id),
            )
            .await?;

        Ok(json!({
            "success": true,
            "download_url": response_field(&result, "download_url"),
            "export_id": export_id,
        }))
    }

    // ---------------------------------------------------------------------
    // Monitoring
    // ---------------------------------------------------------------------

    /// Job status. The platform has no job endpoint, so jobs always report complete.
    pub fn job_status(&self, job_id: &str) -> JsonValue {
        json!({
            "success": true,
            "job_id": job_id,
            "status": "completed",
            "progress": 100,
            "message": "Job completed successfully",
        })
    }

    /// Annotation progress of a project.
    pub async fn get_project_progress(&self, project_id: &str) -> Result<JsonValue> {
        let details = self.get_project_details(project_id).await?;
        Ok(json!({
            "success": true,
            "project_id": project_id,
            "progress": project_progress(&details["project"]),
        }))
    }
}
