use std::sync::Arc;

use crate::error::{DashboardError, DashboardResult};
use crate::logic::{
    authorize, has_version_changes, merge_settings, DashboardManager, Transaction, VersionManager,
};
use crate::model::{
    Condition, DashboardPatch, DashboardRecord, ListDashboards, NewDashboard, Query, StatQuery,
    StatResult, UserContext, Version, VersionInfo, VersionList, DASHBOARD_QUERY_KEYS,
    VERSION_QUERY_KEYS,
};
use crate::store::traits::Store;

const DASHBOARD_KEYWORD_FIELDS: &[&str] = &["dashboard_id", "name"];

/// Dashboard operations with version lifecycle rules.
///
/// Every multi-step mutation runs inside a [`Transaction`] so a failure part
/// way through undoes the store calls that already succeeded.
pub struct DashboardService<S> {
    dashboard_mgr: DashboardManager<S>,
    version_mgr: VersionManager<S>,
}

impl<S> Clone for DashboardService<S> {
    fn clone(&self) -> Self {
        Self {
            dashboard_mgr: self.dashboard_mgr.clone(),
            version_mgr: self.version_mgr.clone(),
        }
    }
}

fn require(field: &str, value: &str) -> DashboardResult<()> {
    if value.trim().is_empty() {
        return Err(DashboardError::Validation(format!("'{}' is required", field)));
    }
    Ok(())
}

fn require_version(version: Version) -> DashboardResult<()> {
    if version < 1 {
        return Err(DashboardError::Validation(format!(
            "'version' must be positive, got {}",
            version
        )));
    }
    Ok(())
}

fn require_caller(user: &UserContext) -> DashboardResult<()> {
    require("user_id", &user.user_id)?;
    require("domain_id", &user.domain_id)
}

impl<S: Store + 'static> DashboardService<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self {
            dashboard_mgr: DashboardManager::new(store.clone()),
            version_mgr: VersionManager::new(store),
        }
    }

    /// CreateDashboard. The first snapshot is written right away when the
    /// dashboard starts with any versioned content.
    pub async fn create(
        &self,
        user: &UserContext,
        new: NewDashboard,
    ) -> DashboardResult<DashboardRecord> {
        require_caller(user)?;
        require("name", &new.name)?;
        require("dashboard_type", &new.dashboard_type)?;

        let mut tx = Transaction::new("create");
        let result = self.create_in(&mut tx, user, new).await;
        tx.finish(result).await
    }

    async fn create_in(
        &self,
        tx: &mut Transaction,
        user: &UserContext,
        new: NewDashboard,
    ) -> DashboardResult<DashboardRecord> {
        let with_versions = new.has_version_fields();
        let record = self
            .dashboard_mgr
            .create_dashboard(tx, DashboardRecord::new(new, user))
            .await?;

        if with_versions {
            self.version_mgr
                .create_version_by_record(tx, &record, &DashboardPatch::default())
                .await?;
        }

        Ok(record)
    }

    pub async fn update(
        &self,
        user: &UserContext,
        dashboard_id: &str,
        patch: DashboardPatch,
    ) -> DashboardResult<DashboardRecord> {
        require_caller(user)?;
        require("dashboard_id", dashboard_id)?;

        let mut tx = Transaction::new("update");
        let result = self.update_in(&mut tx, user, dashboard_id, patch).await;
        tx.finish(result).await
    }

    async fn update_in(
        &self,
        tx: &mut Transaction,
        user: &UserContext,
        dashboard_id: &str,
        mut patch: DashboardPatch,
    ) -> DashboardResult<DashboardRecord> {
        let record = self.get_authorized(user, dashboard_id).await?;

        if let Some(settings) = patch.settings.take() {
            patch.settings = Some(merge_settings(&record.settings, settings));
        }

        if has_version_changes(&record, &patch) {
            log::debug!(
                "dashboard {} changes versioned content at version {}",
                record.dashboard_id,
                record.version
            );
            self.commit_new_version(tx, &record, &patch).await
        } else {
            self.dashboard_mgr
                .update_dashboard_by_record(tx, &record, &patch)
                .await
        }
    }

    /// Increase the version, snapshot the patched content at it, then apply the patch
    async fn commit_new_version(
        &self,
        tx: &mut Transaction,
        record: &DashboardRecord,
        patch: &DashboardPatch,
    ) -> DashboardResult<DashboardRecord> {
        let bumped = self.dashboard_mgr.increase_version(tx, record).await?;
        self.version_mgr
            .create_version_by_record(tx, &bumped, patch)
            .await?;
        self.dashboard_mgr
            .update_dashboard_by_record(tx, &bumped, patch)
            .await
    }

    /// DeleteDashboard, removing every snapshot before the record itself
    pub async fn delete(&self, user: &UserContext, dashboard_id: &str) -> DashboardResult<()> {
        require_caller(user)?;
        require("dashboard_id", dashboard_id)?;

        let record = self.get_authorized(user, dashboard_id).await?;
        let removed = self
            .version_mgr
            .delete_versions_by_dashboard(&record.dashboard_id, &record.domain_id)
            .await?;
        log::debug!(
            "deleted {} versions of dashboard {}",
            removed,
            record.dashboard_id
        );
        self.dashboard_mgr.delete_dashboard_by_record(&record).await
    }

    pub async fn get(&self, user: &UserContext, dashboard_id: &str) -> DashboardResult<DashboardRecord> {
        require_caller(user)?;
        require("dashboard_id", dashboard_id)?;
        self.get_authorized(user, dashboard_id).await
    }

    /// ListDashboards, restricted to the caller's domain and to rows the
    /// caller owns or nobody owns
    pub async fn list(
        &self,
        user: &UserContext,
        params: ListDashboards,
    ) -> DashboardResult<(Vec<DashboardRecord>, usize)> {
        require_caller(user)?;

        let mut query = params.into_query();
        query.validate(DASHBOARD_QUERY_KEYS).map_err(DashboardError::Validation)?;
        query.expand_keyword(DASHBOARD_KEYWORD_FIELDS);
        let query = query
            .and(Condition::eq("domain_id", user.domain_id.clone()))
            .and(Condition::owned_by_or_unowned(&user.user_id));

        self.dashboard_mgr.list_dashboards(&query).await
    }

    pub async fn stat(&self, user: &UserContext, mut query: StatQuery) -> DashboardResult<StatResult> {
        require_caller(user)?;
        query.validate(DASHBOARD_QUERY_KEYS).map_err(DashboardError::Validation)?;

        query.expand_keyword(DASHBOARD_KEYWORD_FIELDS);
        query.filter.push(Condition::eq("domain_id", user.domain_id.clone()));
        query.filter.push(Condition::owned_by_or_unowned(&user.user_id));

        self.dashboard_mgr.stat_dashboards(&query).await
    }

    /// DeleteVersion; the dashboard's current version is refused
    pub async fn delete_version(
        &self,
        user: &UserContext,
        dashboard_id: &str,
        version: Version,
    ) -> DashboardResult<()> {
        require_caller(user)?;
        require("dashboard_id", dashboard_id)?;
        require_version(version)?;

        let record = self.get_authorized(user, dashboard_id).await?;
        if record.version == version {
            return Err(DashboardError::LatestVersion {
                dashboard_id: record.dashboard_id,
                version,
            });
        }

        self.version_mgr
            .delete_version(&record.dashboard_id, version, &record.domain_id, record.version)
            .await
    }

    /// RevertVersion: restore a snapshot's content as a new version
    pub async fn revert_version(
        &self,
        user: &UserContext,
        dashboard_id: &str,
        version: Version,
    ) -> DashboardResult<DashboardRecord> {
        require_caller(user)?;
        require("dashboard_id", dashboard_id)?;
        require_version(version)?;

        let mut tx = Transaction::new("revert_version");
        let result = self.revert_version_in(&mut tx, user, dashboard_id, version).await;
        tx.finish(result).await
    }

    async fn revert_version_in(
        &self,
        tx: &mut Transaction,
        user: &UserContext,
        dashboard_id: &str,
        version: Version,
    ) -> DashboardResult<DashboardRecord> {
        let record = self.get_authorized(user, dashboard_id).await?;
        let snapshot = self
            .version_mgr
            .get_version(&record.dashboard_id, version, &record.domain_id)
            .await?;

        let patch = DashboardPatch::from_snapshot(&snapshot);
        self.commit_new_version(tx, &record, &patch).await
    }

    pub async fn get_version(
        &self,
        user: &UserContext,
        dashboard_id: &str,
        version: Version,
    ) -> DashboardResult<VersionInfo> {
        require_caller(user)?;
        require("dashboard_id", dashboard_id)?;
        require_version(version)?;

        let record = self.get_authorized(user, dashboard_id).await?;
        let snapshot = self
            .version_mgr
            .get_version(&record.dashboard_id, version, &record.domain_id)
            .await?;

        Ok(VersionInfo::new(snapshot, record.version))
    }

    /// ListVersions, newest first by default, with the dashboard's current version
    pub async fn list_versions(
        &self,
        user: &UserContext,
        dashboard_id: &str,
        mut query: Query,
    ) -> DashboardResult<VersionList> {
        require_caller(user)?;
        require("dashboard_id", dashboard_id)?;
        query.validate(VERSION_QUERY_KEYS).map_err(DashboardError::Validation)?;

        let record = self.get_authorized(user, dashboard_id).await?;

        // A numeric keyword names a version; anything else searches the id
        match query
            .keyword
            .as_deref()
            .and_then(|keyword| keyword.trim().parse::<Version>().ok())
        {
            Some(number) => {
                query.keyword = None;
                query.keyword_or.push(Condition::eq("version", number));
            }
            None => query.expand_keyword(&["dashboard_id"]),
        }
        let query = query
            .and(Condition::eq("dashboard_id", record.dashboard_id.clone()))
            .and(Condition::eq("domain_id", record.domain_id.clone()));

        let (snapshots, total_count) = self.version_mgr.list_versions(&query).await?;
        Ok(VersionList {
            results: snapshots
                .into_iter()
                .map(|snapshot| VersionInfo::new(snapshot, record.version))
                .collect(),
            total_count,
            current_version: record.version,
        })
    }

    async fn get_authorized(
        &self,
        user: &UserContext,
        dashboard_id: &str,
    ) -> DashboardResult<DashboardRecord> {
        let record = self
            .dashboard_mgr
            .get_dashboard(dashboard_id, &user.domain_id)
            .await?;
        authorize(&record, &user.user_id)?;
        Ok(record)
    }
}
