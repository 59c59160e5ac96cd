use serde::{Deserialize, Serialize};

/// Caller identity and scope supplied by the authentication layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserContext {
    pub user_id: String,
    pub domain_id: String,
    pub workspace_id: Option<String>,
    pub project_id: Option<String>,
}

impl UserContext {
    /// Create a domain-scoped UserContext
    pub fn new(user_id: impl Into<String>, domain_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            domain_id: domain_id.into(),
            workspace_id: None,
            project_id: None,
        }
    }

    /// Narrow the context to a workspace and, optionally, a project
    pub fn with_scope(mut self, workspace_id: Option<String>, project_id: Option<String>) -> Self {
        self.workspace_id = workspace_id;
        self.project_id = project_id;
        self
    }
}
