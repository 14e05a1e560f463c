//! Operation history.
//!
//! One [`OperationRecord`] is appended per tool invocation, in invocation
//! order. The log is never trimmed; readers ask for bounded slices.

use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};

/// Records newer than this (or still in progress) count as active.
pub const ACTIVE_OPERATION_WINDOW: Duration = Duration::from_secs(300);

/// Default page size for [`OperationLog::history`].
pub const DEFAULT_HISTORY_LIMIT: usize = 10;

/// Outcome of a tool invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OperationStatus {
    /// Completed without error
    Success,
    /// Returned an error
    Failed,
    /// Still running
    InProgress,
}

impl OperationStatus {
    /// Parse the wire name used in `query_operation_history`.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "success" => Some(Self::Success),
            "failed" => Some(Self::Failed),
            "in_progress" => Some(Self::InProgress),
            _ => None,
        }
    }
}

/// One entry of the operation log.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OperationRecord {
    /// When the call finished
    pub timestamp: DateTime<Utc>,
    /// Tool name as requested
    pub tool: String,
    /// Wall time, for calls that reach the API
    #[serde(skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
    /// Outcome
    pub status: OperationStatus,
    /// Arguments, for project calls
    #[serde(skip_serializing_if = "Option::is_none")]
    pub args: Option<Map<String, JsonValue>>,
    /// Error message of a failed call
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl OperationRecord {
    /// A successful invocation stamped now.
    pub fn success(tool: &str) -> Self {
        Self {
            timestamp: Utc::now(),
            tool: tool.to_string(),
            duration_ms: None,
            status: OperationStatus::Success,
            args: None,
            error: None,
        }
    }

    /// A failed invocation stamped now.
    pub fn failed(tool: &str, error: impl Into<String>) -> Self {
        Self {
            status: OperationStatus::Failed,
            error: Some(error.into()),
            ..Self::success(tool)
        }
    }

    /// Attach the elapsed time.
    pub fn with_duration(mut self, elapsed: Duration) -> Self {
        self.duration_ms = Some(elapsed.as_millis() as u64);
        self
    }

    /// Attach the call arguments.
    pub fn with_args(mut self, args: Map<String, JsonValue>) -> Self {
        self.args = Some(args);
        self
    }

    /// Override the timestamp.
    pub fn at(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Override the status.
    pub fn with_status(mut self, status: OperationStatus) -> Self {
        self.status = status;
        self
    }
}

/// Append-only operation log.
#[derive(Debug, Default, Clone)]
pub struct OperationLog {
    records: Vec<OperationRecord>,
}

impl OperationLog {
    /// Create an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a record. Never fails.
    pub fn append(&mut self, record: OperationRecord) {
        self.records.push(record);
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether nothing has been logged yet.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// All records, oldest first.
    pub fn records(&self) -> &[OperationRecord] {
        &self.records
    }

    /// Most recent record.
    pub fn last(&self) -> Option<&OperationRecord> {
        self.records.last()
    }

    /// Records still in progress or stamped within `window` of now.
    pub fn active(&self, window: Duration) -> Vec<OperationRecord> {
        self.active_at(Utc::now(), window)
    }

    /// Same as [`active`](Self::active) against an explicit clock.
    pub fn active_at(&self, now: DateTime<Utc>, window: Duration) -> Vec<OperationRecord> {
        let window = chrono::Duration::from_std(window).unwrap_or(chrono::Duration::MAX);
        let cutoff = now.checked_sub_signed(window).unwrap_or(DateTime::<Utc>::MIN_UTC);
        self.records
            .iter()
            .filter(|r| r.status == OperationStatus::InProgress || r.timestamp > cutoff)
            .cloned()
            .collect()
    }

    /// Most recent `limit` records matching `status`, newest first.
    ///
    /// Returns the matching total alongside the page.
    pub fn history(
        &self,
        limit: usize,
        status: Option<OperationStatus>,
    ) -> (usize, Vec<OperationRecord>) {
        let matching: Vec<&OperationRecord> = self
            .records
            .iter()
            .filter(|r| status.map_or(true, |s| r.status == s))
            .collect();
        let total = matching.len();
        let page = matching
            .into_iter()
            .rev()
            .take(limit)
            .cloned()
            .collect();
        (total, page)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn log_of(n: usize) -> OperationLog {
        let mut log = OperationLog::new();
        for i in 0..n {
            let record = if i % 3 == 0 {
                OperationRecord::failed(&format!("tool_{i}"), "boom")
            } else {
                OperationRecord::success(&format!("tool_{i}"))
            };
            log.append(record);
        }
        log
    }

    #[test]
    fn test_history_returns_most_recent_first() {
        let log = log_of(10);
        let (total, page) = log.history(3, None);
        assert_eq!(total, 10);
        let tools: Vec<_> = page.iter().map(|r| r.tool.as_str()).collect();
        assert_eq!(tools, vec!["tool_9", "tool_8", "tool_7"]);
    }

    #[test]
    fn test_history_limit_larger_than_log() {
        let log = log_of(10);
        let (_, page) = log.history(100, None);
        assert_eq!(page.len(), 10);
        assert_eq!(page[0].tool, "tool_9");
        assert_eq!(page[9].tool, "tool_0");
    }

    #[test]
    fn test_history_status_filter() {
        let log = log_of(10);
        let (total, page) = log.history(DEFAULT_HISTORY_LIMIT, Some(OperationStatus::Failed));
        assert_eq!(total, 4);
        assert!(page.iter().all(|r| r.status == OperationStatus::Failed));
        assert_eq!(page[0].tool, "tool_9");
    }

    #[test]
    fn test_active_window() {
        let now = Utc::now();
        let mut log = OperationLog::new();
        log.append(OperationRecord::success("old").at(now - chrono::Duration::minutes(10)));
        log.append(
            OperationRecord::success("old_running")
                .at(now - chrono::Duration::minutes(30))
                .with_status(OperationStatus::InProgress),
        );
        log.append(OperationRecord::success("recent").at(now - chrono::Duration::minutes(1)));

        let active = log.active_at(now, ACTIVE_OPERATION_WINDOW);
        let tools: Vec<_> = active.iter().map(|r| r.tool.as_str()).collect();
        assert_eq!(tools, vec!["old_running", "recent"]);
    }

    #[test]
    fn test_record_serialization_skips_absent_fields() {
        let json = serde_json::to_value(OperationRecord::success("project_list")).unwrap();
        assert_eq!(json["status"], "success");
        assert!(json.get("error").is_none());
        assert!(json.get("duration_ms").is_none());

        let json = serde_json::to_value(
            OperationRecord::failed("x", "nope").with_duration(Duration::from_millis(42)),
        )
        .unwrap();
        assert_eq!(json["status"], "failed");
        assert_eq!(json["error"], "nope");
        assert_eq!(json["duration_ms"], 42);
    }
}
