use crate::model::Version;

/// Failure of a dashboard or version operation
#[derive(Debug, thiserror::Error)]
pub enum DashboardError {
    /// The record or snapshot key does not resolve
    #[error("{resource} not found: {key}")]
    NotFound { resource: &'static str, key: String },

    /// The dashboard is private and owned by someone else
    #[error("permission denied for dashboard {dashboard_id}")]
    PermissionDenied { dashboard_id: String },

    /// The current version of a dashboard cannot be deleted on its own
    #[error("version {version} is the latest version of dashboard {dashboard_id}")]
    LatestVersion { dashboard_id: String, version: Version },

    /// Missing or malformed input
    #[error("validation error: {0}")]
    Validation(String),

    /// The document store failed; the caller may retry
    #[error("store unavailable: {0:#}")]
    StoreUnavailable(#[source] anyhow::Error),
}

impl DashboardError {
    pub fn dashboard_not_found(dashboard_id: &str, domain_id: &str) -> Self {
        Self::NotFound {
            resource: "dashboard",
            key: format!("{} (domain {})", dashboard_id, domain_id),
        }
    }

    pub fn version_not_found(dashboard_id: &str, version: Version) -> Self {
        Self::NotFound {
            resource: "dashboard version",
            key: format!("{}@{}", dashboard_id, version),
        }
    }

    /// Stable machine-readable code
    pub fn code(&self) -> &'static str {
        match self {
            DashboardError::NotFound { .. } => "NOT_FOUND",
            DashboardError::PermissionDenied { .. } => "PERMISSION_DENIED",
            DashboardError::LatestVersion { .. } => "LATEST_VERSION",
            DashboardError::Validation(_) => "VALIDATION_ERROR",
            DashboardError::StoreUnavailable(_) => "STORE_UNAVAILABLE",
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, DashboardError::StoreUnavailable(_))
    }
}

impl From<anyhow::Error> for DashboardError {
    fn from(error: anyhow::Error) -> Self {
        DashboardError::StoreUnavailable(error)
    }
}

pub type DashboardResult<T> = Result<T, DashboardError>;

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    #[test]
    fn test_messages_carry_context() {
        let err = DashboardError::LatestVersion {
            dashboard_id: "dash-1".into(),
            version: 3,
        };
        assert_eq!(
            err.to_string(),
            "version 3 is the latest version of dashboard dash-1"
        );
        assert_eq!(err.code(), "LATEST_VERSION");

        let err = DashboardError::version_not_found("dash-1", 2);
        assert_eq!(err.to_string(), "dashboard version not found: dash-1@2");
    }

    #[test]
    fn test_store_errors_are_retryable() {
        let err: DashboardError = anyhow!("connection reset").into();
        assert!(err.is_retryable());
        assert_eq!(err.code(), "STORE_UNAVAILABLE");
        assert!(!DashboardError::Validation("x".into()).is_retryable());
    }
}
