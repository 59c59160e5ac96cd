use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::model::{DashboardPatch, DashboardRecord, Document, Id, Version};

/// Immutable copy of a dashboard's versioned content at one version number.
///
/// Keyed by `(dashboard_id, version, domain_id)`. A version number is never
/// reused for the same dashboard, even after its snapshot is deleted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VersionSnapshot {
    pub dashboard_id: Id,
    pub version: Version,
    #[serde(default)]
    pub layouts: Vec<Value>,
    #[serde(default)]
    pub variables: Document,
    #[serde(default)]
    pub settings: Document,
    #[serde(default)]
    pub variables_schema: Document,
    pub domain_id: Id,
    pub created_at: DateTime<Utc>,
}

impl VersionSnapshot {
    /// Snapshot at `record.version`, preferring the patch's values over the record's
    pub fn capture(record: &DashboardRecord, patch: &DashboardPatch) -> Self {
        Self {
            dashboard_id: record.dashboard_id.clone(),
            version: record.version,
            layouts: patch
                .layouts
                .clone()
                .unwrap_or_else(|| record.layouts.clone()),
            variables: patch
                .variables
                .clone()
                .unwrap_or_else(|| record.variables.clone()),
            settings: patch
                .settings
                .clone()
                .unwrap_or_else(|| record.settings.clone()),
            variables_schema: patch
                .variables_schema
                .clone()
                .unwrap_or_else(|| record.variables_schema.clone()),
            domain_id: record.domain_id.clone(),
            created_at: Utc::now(),
        }
    }
}

/// GetVersion result
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VersionInfo {
    #[serde(flatten)]
    pub snapshot: VersionSnapshot,
    pub latest: bool,
}

impl VersionInfo {
    pub fn new(snapshot: VersionSnapshot, current_version: Version) -> Self {
        let latest = snapshot.version == current_version;
        Self { snapshot, latest }
    }
}

/// ListVersions result
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VersionList {
    pub results: Vec<VersionInfo>,
    pub total_count: usize,
    pub current_version: Version,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{NewDashboard, UserContext};
    use serde_json::json;

    #[test]
    fn test_capture_falls_back_to_record_values() {
        let mut new = NewDashboard::new("Costs", "DASHBOARD");
        new.layouts = Some(vec![json!({"old": true})]);
        let mut variables = Document::new();
        variables.insert("region".into(), json!("eu"));
        new.variables = Some(variables.clone());
        let mut record = DashboardRecord::new(new, &UserContext::new("u1", "d1"));
        record.version = 4;

        let patch = DashboardPatch {
            layouts: Some(vec![json!({"new": true})]),
            ..Default::default()
        };
        let snapshot = VersionSnapshot::capture(&record, &patch);

        assert_eq!(snapshot.version, 4);
        assert_eq!(snapshot.layouts, vec![json!({"new": true})]);
        assert_eq!(snapshot.variables, variables);
        assert_eq!(snapshot.dashboard_id, record.dashboard_id);
        assert_eq!(snapshot.domain_id, "d1");
    }

    #[test]
    fn test_version_info_marks_latest() {
        let record = DashboardRecord::new(
            NewDashboard::new("Costs", "DASHBOARD"),
            &UserContext::new("u1", "d1"),
        );
        let snapshot = VersionSnapshot::capture(&record, &DashboardPatch::default());

        assert!(VersionInfo::new(snapshot.clone(), 1).latest);
        let info = VersionInfo::new(snapshot, 2);
        assert!(!info.latest);

        let value = serde_json::to_value(&info).unwrap();
        assert_eq!(value["latest"], json!(false));
        assert_eq!(value["version"], json!(1));
    }
}
