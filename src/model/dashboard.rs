use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::model::{
    generate_dashboard_id, normalize_labels, Condition, Document, Id, Query, ResourceGroup,
    UserContext, Version, VersionField, VersionSnapshot, Viewers, INITIAL_VERSION,
};

/// Mutable current state of a dashboard
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DashboardRecord {
    pub dashboard_id: Id,
    pub name: String,
    pub dashboard_type: String,
    pub version: Version,
    #[serde(default)]
    pub layouts: Vec<Value>,
    #[serde(default)]
    pub variables: Document,
    #[serde(default)]
    pub settings: Document,
    #[serde(default)]
    pub variables_schema: Document,
    #[serde(default)]
    pub labels: Vec<String>,
    #[serde(default)]
    pub tags: Document,
    pub viewers: Viewers,
    pub resource_group: ResourceGroup,
    pub user_id: Option<String>,
    pub project_id: Option<String>,
    pub workspace_id: Option<String>,
    pub domain_id: Id,
    pub created_at: DateTime<Utc>,
}

impl DashboardRecord {
    /// Build a fresh record owned by the caller; nothing is persisted here
    pub fn new(new: NewDashboard, user: &UserContext) -> Self {
        Self {
            dashboard_id: generate_dashboard_id(),
            name: new.name,
            dashboard_type: new.dashboard_type,
            version: INITIAL_VERSION,
            layouts: new.layouts.unwrap_or_default(),
            variables: new.variables.unwrap_or_default(),
            settings: new.settings.unwrap_or_default(),
            variables_schema: new.variables_schema.unwrap_or_default(),
            labels: normalize_labels(new.labels.unwrap_or_default()),
            tags: new.tags.unwrap_or_default(),
            viewers: new.viewers.unwrap_or_default(),
            resource_group: new.resource_group.unwrap_or_default(),
            user_id: Some(user.user_id.clone()),
            project_id: user.project_id.clone(),
            workspace_id: user.workspace_id.clone(),
            domain_id: user.domain_id.clone(),
            created_at: Utc::now(),
        }
    }

    /// Apply every present field of the patch in place
    pub fn apply(&mut self, patch: &DashboardPatch) {
        if let Some(name) = &patch.name {
            self.name = name.clone();
        }
        if let Some(layouts) = &patch.layouts {
            self.layouts = layouts.clone();
        }
        if let Some(variables) = &patch.variables {
            self.variables = variables.clone();
        }
        if let Some(settings) = &patch.settings {
            self.settings = settings.clone();
        }
        if let Some(variables_schema) = &patch.variables_schema {
            self.variables_schema = variables_schema.clone();
        }
        if let Some(labels) = &patch.labels {
            self.labels = normalize_labels(labels.clone());
        }
        if let Some(tags) = &patch.tags {
            self.tags = tags.clone();
        }
    }

    pub fn version_field_value(&self, field: VersionField) -> Value {
        match field {
            VersionField::Layouts => Value::Array(self.layouts.clone()),
            VersionField::Variables => Value::Object(self.variables.clone()),
            VersionField::VariablesSchema => Value::Object(self.variables_schema.clone()),
        }
    }
}

/// Input of CreateDashboard; owner and scope come from the caller context
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewDashboard {
    pub name: String,
    pub dashboard_type: String,
    pub layouts: Option<Vec<Value>>,
    pub variables: Option<Document>,
    pub settings: Option<Document>,
    pub variables_schema: Option<Document>,
    pub labels: Option<Vec<String>>,
    pub tags: Option<Document>,
    pub viewers: Option<Viewers>,
    pub resource_group: Option<ResourceGroup>,
}

impl NewDashboard {
    pub fn new(name: impl Into<String>, dashboard_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            dashboard_type: dashboard_type.into(),
            ..Default::default()
        }
    }

    pub fn has_version_fields(&self) -> bool {
        self.layouts.is_some() || self.variables.is_some() || self.variables_schema.is_some()
    }
}

/// Partial update of a dashboard. Absent fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DashboardPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub layouts: Option<Vec<Value>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variables: Option<Document>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub settings: Option<Document>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub variables_schema: Option<Document>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tags: Option<Document>,
}

impl DashboardPatch {
    /// Patch restoring the version-bearing content of a snapshot
    pub fn from_snapshot(snapshot: &VersionSnapshot) -> Self {
        Self {
            layouts: Some(snapshot.layouts.clone()),
            variables: Some(snapshot.variables.clone()),
            variables_schema: Some(snapshot.variables_schema.clone()),
            ..Default::default()
        }
    }

    pub fn version_field_value(&self, field: VersionField) -> Option<Value> {
        match field {
            VersionField::Layouts => self.layouts.clone().map(Value::Array),
            VersionField::Variables => self.variables.clone().map(Value::Object),
            VersionField::VariablesSchema => self.variables_schema.clone().map(Value::Object),
        }
    }

    /// Version-bearing fields carried by this patch
    pub fn version_fields(&self) -> Vec<VersionField> {
        VersionField::ALL
            .into_iter()
            .filter(|field| match field {
                VersionField::Layouts => self.layouts.is_some(),
                VersionField::Variables => self.variables.is_some(),
                VersionField::VariablesSchema => self.variables_schema.is_some(),
            })
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        *self == DashboardPatch::default()
    }
}

/// Input of ListDashboards: a free query plus equality shortcuts
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ListDashboards {
    #[serde(default)]
    pub query: Query,
    pub dashboard_id: Option<Id>,
    pub name: Option<String>,
    pub viewers: Option<Viewers>,
    pub user_id: Option<String>,
}

impl ListDashboards {
    /// The query with every shortcut folded in as an equality condition
    pub fn into_query(self) -> Query {
        let mut query = self.query;
        if let Some(dashboard_id) = self.dashboard_id {
            query = query.and(Condition::eq("dashboard_id", dashboard_id));
        }
        if let Some(name) = self.name {
            query = query.and(Condition::eq("name", name));
        }
        if let Some(viewers) = self.viewers {
            query = query.and(Condition::eq("viewers", viewers.as_str()));
        }
        if let Some(user_id) = self.user_id {
            query = query.and(Condition::eq("user_id", user_id));
        }
        query
    }
}
