//! Read-only resources derived from session state.
//!
//! URIs: `labellerr://project/<id>`, `labellerr://dataset/<id>` and the fixed
//! `labellerr://history`. Nothing here touches the network; only cached
//! entities resolve.

use std::fmt;

use serde::Serialize;

use crate::error::{McpError, Result};
use crate::session::{EntityRecord, SessionState};

/// URI scheme prefix.
pub const SCHEME: &str = "labellerr://";

/// MIME type of every resource body.
pub const MIME_JSON: &str = "application/json";

/// A parsed resource URI.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResourceUri {
    /// `labellerr://project/<id>`
    Project(String),
    /// `labellerr://dataset/<id>`
    Dataset(String),
    /// `labellerr://history`
    History,
}

impl ResourceUri {
    /// Parse a `labellerr://` URI. The id is everything after the kind segment.
    pub fn parse(uri: &str) -> Result<Self> {
        let invalid = || McpError::InvalidResourceUri(uri.to_string());
        let rest = uri.strip_prefix(SCHEME).ok_or_else(invalid)?;
        if rest == "history" {
            return Ok(ResourceUri::History);
        }

        let (kind, id) = rest.split_once('/').ok_or_else(invalid)?;
        if id.is_empty() {
            return Err(invalid());
        }
        match kind {
            "project" => Ok(ResourceUri::Project(id.to_string())),
            "dataset" => Ok(ResourceUri::Dataset(id.to_string())),
            _ => Err(invalid()),
        }
    }
}

impl fmt::Display for ResourceUri {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceUri::Project(id) => write!(f, "{SCHEME}project/{id}"),
            ResourceUri::Dataset(id) => write!(f, "{SCHEME}dataset/{id}"),
            ResourceUri::History => write!(f, "{SCHEME}history"),
        }
    }
}

/// Entry of a `resources/list` response.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Resource {
    /// Resource URI
    pub uri: String,
    /// Display name
    pub name: String,
    /// Always `application/json`
    #[serde(rename = "mimeType")]
    pub mime_type: String,
    /// Short summary
    pub description: String,
}

/// Entry of a `resources/read` response.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResourceContents {
    /// Resource URI
    pub uri: String,
    /// Always `application/json`
    #[serde(rename = "mimeType")]
    pub mime_type: String,
    /// Pretty-printed JSON body
    pub text: String,
}

fn str_field<'a>(record: &'a EntityRecord, keys: &[&str]) -> Option<&'a str> {
    keys.iter()
        .find_map(|k| record.get(*k).and_then(|v| v.as_str()))
}

fn display_name(id: &str, record: &EntityRecord, fallback_key: &str) -> String {
    str_field(record, &["name", fallback_key])
        .unwrap_or(id)
        .to_string()
}

/// Enumerate resources: cached projects, then cached datasets, then history.
pub fn list_resources(state: &SessionState) -> Vec<Resource> {
    let mut resources = Vec::with_capacity(state.project_count() + state.dataset_count() + 1);

    for (id, project) in state.projects() {
        let name = display_name(id, project, "project_name");
        let description = match str_field(project, &["data_type", "dataType"]) {
            Some(data_type) => format!("Project: {name} ({data_type})"),
            None => format!("Project: {name}"),
        };
        resources.push(Resource {
            uri: ResourceUri::Project(id.clone()).to_string(),
            name,
            mime_type: MIME_JSON.to_string(),
            description,
        });
    }

    for (id, dataset) in state.datasets() {
        let name = display_name(id, dataset, "dataset_name");
        resources.push(Resource {
            uri: ResourceUri::Dataset(id.clone()).to_string(),
            description: format!("Dataset: {name}"),
            name,
            mime_type: MIME_JSON.to_string(),
        });
    }

    resources.push(Resource {
        uri: ResourceUri::History.to_string(),
        name: "Operation History".to_string(),
        mime_type: MIME_JSON.to_string(),
        description: "History of all operations performed".to_string(),
    });

    resources
}

/// Render a resource body as pretty-printed JSON.
pub fn read_resource(state: &SessionState, uri: &str) -> Result<ResourceContents> {
    let not_found = || McpError::ResourceNotFound(uri.to_string());
    let body = match ResourceUri::parse(uri)? {
        ResourceUri::History => serde_json::to_string_pretty(state.operations().records())?,
        ResourceUri::Project(id) => {
            let project = state.project(&id).ok_or_else(not_found)?;
            serde_json::to_string_pretty(project)?
        }
        ResourceUri::Dataset(id) => {
            let dataset = state.dataset(&id).ok_or_else(not_found)?;
            serde_json::to_string_pretty(dataset)?
        }
    };

    Ok(ResourceContents {
        uri: uri.to_string(),
        mime_type: MIME_JSON.to_string(),
        text: body,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::history::OperationRecord;
    use serde_json::{json, Value as JsonValue};

    fn record(value: JsonValue) -> EntityRecord {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_parse_uris() {
        assert_eq!(ResourceUri::parse("labellerr://history").unwrap(), ResourceUri::History);
        assert_eq!(
            ResourceUri::parse("labellerr://project/abc").unwrap(),
            ResourceUri::Project("abc".into())
        );
        assert_eq!(
            ResourceUri::parse("labellerr://dataset/a/b").unwrap(),
            ResourceUri::Dataset("a/b".into())
        );
        assert!(ResourceUri::parse("labellerr://project/").is_err());
        assert!(ResourceUri::parse("labellerr://export/1").is_err());
        assert!(ResourceUri::parse("http://project/1").is_err());
        assert!(ResourceUri::parse("labellerr://history/2").is_err());
    }

    #[test]
    fn test_uri_round_trip() {
        for uri in [
            ResourceUri::Project("p-1".into()),
            ResourceUri::Dataset("ds 9/x".into()),
            ResourceUri::History,
        ] {
            assert_eq!(ResourceUri::parse(&uri.to_string()).unwrap(), uri);
        }
    }

    #[test]
    fn test_list_order_projects_datasets_history() {
        let mut state = SessionState::new();
        state.put_dataset("d1", record(json!({"id": "d1", "name": "Frames"})));
        state.put_project(
            "p1",
            record(json!({"id": "p1", "name": "Cats", "data_type": "image"})),
        );

        let resources = list_resources(&state);
        let uris: Vec<_> = resources.iter().map(|r| r.uri.as_str()).collect();
        assert_eq!(
            uris,
            vec!["labellerr://project/p1", "labellerr://dataset/d1", "labellerr://history"]
        );
        assert_eq!(resources[0].description, "Project: Cats (image)");
        assert_eq!(resources[1].description, "Dataset: Frames");
    }

    #[test]
    fn test_list_falls_back_to_remote_names() {
        let mut state = SessionState::new();
        state.put_project("p2", record(json!({"project_id": "p2", "project_name": "Roads"})));
        state.put_dataset("d2", EntityRecord::new());

        let resources = list_resources(&state);
        assert_eq!(resources[0].name, "Roads");
        assert_eq!(resources[0].description, "Project: Roads");
        assert_eq!(resources[1].name, "d2");
    }

    #[test]
    fn test_read_missing_entity_is_not_found() {
        let state = SessionState::new();
        let err = read_resource(&state, "labellerr://dataset/X").unwrap_err();
        assert!(matches!(err, McpError::ResourceNotFound(_)));
    }

    #[test]
    fn test_read_history_serializes_whole_log() {
        let mut state = SessionState::new();
        for i in 0..12 {
            state.append_operation(OperationRecord::success(&format!("tool_{i}")));
        }
        let contents = read_resource(&state, "labellerr://history").unwrap();
        assert_eq!(contents.mime_type, MIME_JSON);
        let body: JsonValue = serde_json::from_str(&contents.text).unwrap();
        assert_eq!(body.as_array().unwrap().len(), 12);
        assert_eq!(body[0]["tool"], "tool_0");
    }
}
