use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use uuid::Uuid;

pub type Id = String;

/// Free-form ordered mapping used for variables, settings, schemas and tags
pub type Document = Map<String, Value>;

/// Version number of a dashboard or snapshot
pub type Version = i64;

/// Version reported by a freshly created dashboard
pub const INITIAL_VERSION: Version = 1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Viewers {
    #[default]
    Public,
    Private,
}

impl Viewers {
    pub fn as_str(&self) -> &'static str {
        match self {
            Viewers::Public => "PUBLIC",
            Viewers::Private => "PRIVATE",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "PUBLIC" => Some(Viewers::Public),
            "PRIVATE" => Some(Viewers::Private),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ResourceGroup {
    #[default]
    Domain,
    Workspace,
    Project,
}

impl ResourceGroup {
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceGroup::Domain => "DOMAIN",
            ResourceGroup::Workspace => "WORKSPACE",
            ResourceGroup::Project => "PROJECT",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "DOMAIN" => Some(ResourceGroup::Domain),
            "WORKSPACE" => Some(ResourceGroup::Workspace),
            "PROJECT" => Some(ResourceGroup::Project),
            _ => None,
        }
    }
}

/// Fields whose change produces a new version snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VersionField {
    Layouts,
    Variables,
    VariablesSchema,
}

impl VersionField {
    pub const ALL: [VersionField; 3] = [
        VersionField::Layouts,
        VersionField::Variables,
        VersionField::VariablesSchema,
    ];
}

pub fn generate_dashboard_id() -> Id {
    format!("dash-{}", Uuid::new_v4().simple())
}

/// De-duplicate labels, keeping the order of first occurrence
pub fn normalize_labels(labels: Vec<String>) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    labels
        .into_iter()
        .filter(|label| seen.insert(label.clone()))
        .collect()
}
