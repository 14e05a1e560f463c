//! MCP session state.
//!
//! Holds the optional API client together with everything the server learns
//! while answering tool calls: projects and datasets it has seen, and the log
//! of every invocation. The caches are advisory. Entries are overwritten
//! wholesale on every sighting and never evicted.

use std::collections::BTreeMap;

use serde_json::{Map, Value as JsonValue};

use crate::client::LabellerrClient;
use crate::history::{OperationLog, OperationRecord, OperationStatus, ACTIVE_OPERATION_WINDOW};

/// Attributes last seen for a project or dataset.
pub type EntityRecord = Map<String, JsonValue>;

/// Caches and operation log, mutated only through the methods below.
#[derive(Debug, Default)]
pub struct SessionState {
    projects: BTreeMap<String, EntityRecord>,
    datasets: BTreeMap<String, EntityRecord>,
    operations: OperationLog,
}

impl SessionState {
    /// Empty caches and log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a cached project. Last write wins, no merging.
    pub fn put_project(&mut self, id: impl Into<String>, record: EntityRecord) {
        self.projects.insert(id.into(), record);
    }

    /// Insert or replace a cached dataset. Last write wins, no merging.
    pub fn put_dataset(&mut self, id: impl Into<String>, record: EntityRecord) {
        self.datasets.insert(id.into(), record);
    }

    /// Cached project by id.
    pub fn project(&self, id: &str) -> Option<&EntityRecord> {
        self.projects.get(id)
    }

    /// Cached dataset by id.
    pub fn dataset(&self, id: &str) -> Option<&EntityRecord> {
        self.datasets.get(id)
    }

    /// Cached projects in id order.
    pub fn projects(&self) -> impl Iterator<Item = (&String, &EntityRecord)> {
        self.projects.iter()
    }

    /// Cached datasets in id order.
    pub fn datasets(&self) -> impl Iterator<Item = (&String, &EntityRecord)> {
        self.datasets.iter()
    }

    /// Number of cached projects.
    pub fn project_count(&self) -> usize {
        self.projects.len()
    }

    /// Number of cached datasets.
    pub fn dataset_count(&self) -> usize {
        self.datasets.len()
    }

    /// Append one record to the operation log.
    pub fn append_operation(&mut self, record: OperationRecord) {
        self.operations.append(record);
    }

    /// The operation log.
    pub fn operations(&self) -> &OperationLog {
        &self.operations
    }

    /// Operations in progress or from the last five minutes.
    pub fn active_operations(&self) -> Vec<OperationRecord> {
        self.operations.active(ACTIVE_OPERATION_WINDOW)
    }

    /// See [`OperationLog::history`].
    pub fn history(
        &self,
        limit: usize,
        status: Option<OperationStatus>,
    ) -> (usize, Vec<OperationRecord>) {
        self.operations.history(limit, status)
    }
}

/// Per-connection session.
///
/// The client is absent when credentials were not configured; the state is
/// still available so introspection keeps working.
#[derive(Debug, Default)]
pub struct McpSession {
    client: Option<LabellerrClient>,
    state: SessionState,
}

impl McpSession {
    /// Create a new session.
    pub fn new(client: Option<LabellerrClient>) -> Self {
        Self {
            client,
            state: SessionState::new(),
        }
    }

    /// Whether a backend client is configured.
    pub fn is_connected(&self) -> bool {
        self.client.is_some()
    }

    /// The API client, if credentials were configured.
    pub fn client(&self) -> Option<&LabellerrClient> {
        self.client.as_ref()
    }

    /// Session state.
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Mutable session state.
    pub fn state_mut(&mut self) -> &mut SessionState {
        &mut self.state
    }

    /// Borrow the client and the mutable state at the same time.
    pub(crate) fn split(&mut self) -> (Option<&LabellerrClient>, &mut SessionState) {
        (self.client.as_ref(), &mut self.state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: JsonValue) -> EntityRecord {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn test_put_project_overwrites_without_merge() {
        let mut state = SessionState::new();
        state.put_project("p1", record(json!({"id": "p1", "name": "Cats", "data_type": "image"})));
        state.put_project("p1", record(json!({"project_id": "p1"})));

        assert_eq!(state.project_count(), 1);
        assert_eq!(state.project("p1"), Some(&record(json!({"project_id": "p1"}))));
    }

    #[test]
    fn test_caches_are_independent() {
        let mut state = SessionState::new();
        state.put_project("x", EntityRecord::new());
        state.put_dataset("y", EntityRecord::new());

        assert!(state.project("y").is_none());
        assert!(state.dataset("x").is_none());
        assert_eq!(state.datasets().map(|(id, _)| id.as_str()).collect::<Vec<_>>(), vec!["y"]);
    }

    #[test]
    fn test_session_without_client() {
        let mut session = McpSession::new(None);
        assert!(!session.is_connected());
        session
            .state_mut()
            .append_operation(OperationRecord::success("monitor_system_health"));
        assert_eq!(session.state().operations().len(), 1);
        assert_eq!(session.state().active_operations().len(), 1);
    }
}
