use crate::model::{
    DashboardPatch, DashboardRecord, Query, StatQuery, StatResult, Version, VersionSnapshot,
};
use anyhow::Result;

/// Persistence of the mutable dashboard records (`dashboards` collection)
#[async_trait::async_trait]
pub trait DashboardStore: Send + Sync {
    /// Insert a new record; fails if the dashboard id already exists
    async fn insert_dashboard(&self, record: DashboardRecord) -> Result<DashboardRecord>;
    async fn get_dashboard(
        &self,
        dashboard_id: &str,
        domain_id: &str,
    ) -> Result<Option<DashboardRecord>>;
    /// Apply the present fields of a patch as one single-document update
    async fn update_dashboard(
        &self,
        dashboard_id: &str,
        domain_id: &str,
        patch: &DashboardPatch,
    ) -> Result<Option<DashboardRecord>>;
    /// Overwrite every stored field with `record`
    async fn replace_dashboard(&self, record: DashboardRecord) -> Result<Option<DashboardRecord>>;
    /// Atomically increment the version counter and return the updated record
    async fn increment_dashboard_version(
        &self,
        dashboard_id: &str,
        domain_id: &str,
    ) -> Result<Option<DashboardRecord>>;
    /// Set the version counter to `restored` only if it still equals `expected`
    async fn reset_dashboard_version(
        &self,
        dashboard_id: &str,
        domain_id: &str,
        expected: Version,
        restored: Version,
    ) -> Result<bool>;
    async fn delete_dashboard(&self, dashboard_id: &str, domain_id: &str) -> Result<bool>;
    /// Filtered, sorted and paged records plus the filtered total
    async fn query_dashboards(&self, query: &Query) -> Result<(Vec<DashboardRecord>, usize)>;
    async fn stat_dashboards(&self, query: &StatQuery) -> Result<StatResult>;
}

/// Persistence of the append-only snapshots (`dashboard_versions` collection)
#[async_trait::async_trait]
pub trait DashboardVersionStore: Send + Sync {
    /// Insert a snapshot; fails if `(dashboard_id, version, domain_id)` exists
    async fn insert_version(&self, snapshot: VersionSnapshot) -> Result<VersionSnapshot>;
    async fn get_version(
        &self,
        dashboard_id: &str,
        version: Version,
        domain_id: &str,
    ) -> Result<Option<VersionSnapshot>>;
    /// Filtered snapshots, newest version first unless the query sorts otherwise
    async fn query_versions(&self, query: &Query) -> Result<(Vec<VersionSnapshot>, usize)>;
    async fn delete_version(
        &self,
        dashboard_id: &str,
        version: Version,
        domain_id: &str,
    ) -> Result<bool>;
    /// Remove every snapshot of a dashboard, returning how many were removed
    async fn delete_versions(&self, dashboard_id: &str, domain_id: &str) -> Result<u64>;
}

pub trait Store: DashboardStore + DashboardVersionStore + Send + Sync {}
