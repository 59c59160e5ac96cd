use crate::model::{DashboardPatch, DashboardRecord, Document};

/// Whether applying `patch` to `record` changes any version-bearing field.
///
/// Presence alone is not enough: a patch that re-sends the current layouts,
/// variables or schema unchanged does not open a new version.
pub fn has_version_changes(record: &DashboardRecord, patch: &DashboardPatch) -> bool {
    patch.version_fields().into_iter().any(|field| {
        patch.version_field_value(field).as_ref() != Some(&record.version_field_value(field))
    })
}

/// Shallow merge of incoming settings over the existing ones
pub fn merge_settings(existing: &Document, incoming: Document) -> Document {
    if existing.is_empty() {
        return incoming;
    }
    let mut merged = existing.clone();
    for (key, value) in incoming {
        merged.insert(key, value);
    }
    merged
}
