//! Derived read-only views over project data.
//!
//! Missing numeric fields are treated as zero and missing strings as empty;
//! none of these helpers fail on an incomplete backend payload.

use serde_json::{json, Value as JsonValue};

/// Counts reported by [`project_statistics`], in output order.
pub const STATISTIC_FIELDS: [&str; 5] = [
    "total_files",
    "annotated_files",
    "reviewed_files",
    "accepted_files",
    "completion_percentage",
];

/// Percentage of accepted files, rounded half-up. Zero when `total` is zero or absent.
pub fn completion_percentage(total: Option<u64>, accepted: Option<u64>) -> u64 {
    let total = match total {
        Some(t) if t > 0 => t as u128,
        _ => return 0,
    };
    let accepted = accepted.unwrap_or(0) as u128;
    ((200 * accepted + total) / (2 * total)) as u64
}

/// Read a non-negative count from a JSON object, defaulting to zero.
pub fn count_field(obj: &JsonValue, key: &str) -> u64 {
    match obj.get(key) {
        Some(JsonValue::Number(n)) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| *f >= 0.0).map(|f| f.round() as u64))
            .unwrap_or(0),
        _ => 0,
    }
}

/// Whether a project's name or data type contains `query`, ignoring case.
pub fn project_matches(project: &JsonValue, query: &str) -> bool {
    let needle = query.to_lowercase();
    ["project_name", "data_type"].iter().any(|key| {
        project
            .get(*key)
            .and_then(|v| v.as_str())
            .map(|s| s.to_lowercase().contains(&needle))
            .unwrap_or(false)
    })
}

/// Filter a project list down to the entries matching `query`.
pub fn search_projects(projects: &[JsonValue], query: &str) -> Vec<JsonValue> {
    projects
        .iter()
        .filter(|p| project_matches(p, query))
        .cloned()
        .collect()
}

/// Extract the fixed statistics fields from a project object.
///
/// Present values are copied unchanged; absent or null fields become zero.
pub fn project_statistics(project_id: &str, project: &JsonValue) -> JsonValue {
    let mut out = serde_json::Map::new();
    out.insert("project_id".to_string(), json!(project_id));
    for field in STATISTIC_FIELDS {
        let value = match project.get(field) {
            Some(JsonValue::Null) | None => json!(0),
            Some(value) => value.clone(),
        };
        out.insert(field.to_string(), value);
    }
    JsonValue::Object(out)
}

/// Progress block for `monitor_project_progress`.
pub fn project_progress(project: &JsonValue) -> JsonValue {
    let total = count_field(project, "total_files");
    let accepted = count_field(project, "accepted_files");
    json!({
        "total_files": total,
        "annotated": count_field(project, "annotated_files"),
        "reviewed": count_field(project, "reviewed_files"),
        "accepted": accepted,
        "completion_percentage": completion_percentage(Some(total), Some(accepted)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_completion_percentage() {
        assert_eq!(completion_percentage(Some(0), Some(0)), 0);
        assert_eq!(completion_percentage(None, Some(5)), 0);
        assert_eq!(completion_percentage(Some(4), Some(2)), 50);
        assert_eq!(completion_percentage(Some(3), Some(2)), 67);
        assert_eq!(completion_percentage(Some(8), Some(1)), 13);
        assert_eq!(completion_percentage(Some(10), None), 0);
        assert_eq!(completion_percentage(Some(7), Some(7)), 100);
    }

    #[test]
    fn test_search_matches_name_or_type_case_insensitively() {
        let projects = vec![
            json!({"project_id": "p1", "project_name": "Street Signs", "data_type": "image"}),
            json!({"project_id": "p2", "project_name": "Podcasts", "data_type": "audio"}),
            json!({"project_id": "p3"}),
        ];
        let hits = search_projects(&projects, "SIGN");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0]["project_id"], "p1");

        assert_eq!(search_projects(&projects, "aud")[0]["project_id"], "p2");
        assert!(search_projects(&projects, "video").is_empty());
    }

    #[test]
    fn test_statistics_default_missing_fields() {
        let stats = project_statistics("p1", &json!({"total_files": 12, "accepted_files": 3}));
        assert_eq!(
            stats,
            json!({
                "project_id": "p1",
                "total_files": 12,
                "annotated_files": 0,
                "reviewed_files": 0,
                "accepted_files": 3,
                "completion_percentage": 0
            })
        );
        assert_eq!(project_statistics("p2", &JsonValue::Null)["total_files"], 0);
    }

    #[test]
    fn test_statistics_copy_present_values_unchanged() {
        let stats = project_statistics(
            "p",
            &json!({"completion_percentage": 66.67, "total_files": "12", "reviewed_files": null}),
        );
        assert_eq!(stats["completion_percentage"], json!(66.67));
        assert_eq!(stats["total_files"], json!("12"));
        assert_eq!(stats["reviewed_files"], json!(0));
        assert_eq!(stats["annotated_files"], json!(0));
    }

    #[test]
    fn test_progress_computes_percentage() {
        let progress = project_progress(&json!({"total_files": 3, "accepted_files": 2, "annotated_files": 3}));
        assert_eq!(progress["completion_percentage"], 67);
        assert_eq!(progress["annotated"], 3);
        assert_eq!(progress["reviewed"], 0);
    }
}
