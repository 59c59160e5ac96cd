use crate::error::{DashboardError, DashboardResult};
use crate::model::{DashboardRecord, Viewers};

/// Visibility gate applied before every operation on an existing dashboard.
///
/// A `PRIVATE` dashboard is only reachable by the user who owns it. Anything
/// else is shared within its domain.
pub fn authorize(record: &DashboardRecord, caller_user_id: &str) -> DashboardResult<()> {
    if record.viewers == Viewers::Private && record.user_id.as_deref() != Some(caller_user_id) {
        return Err(DashboardError::PermissionDenied {
            dashboard_id: record.dashboard_id.clone(),
        });
    }
    Ok(())
}
