use std::collections::{BTreeMap, HashMap};

use anyhow::{anyhow, Result};
use parking_lot::RwLock;

use crate::logic::QueryEvaluator;
use crate::model::{
    DashboardPatch, DashboardRecord, Query, Sort, StatQuery, StatResult, Version, VersionSnapshot,
    DASHBOARD_QUERY_KEYS, VERSION_QUERY_KEYS,
};
use crate::store::traits::{DashboardStore, DashboardVersionStore, Store};

type DashboardKey = (String, String);
type VersionKey = (String, String, Version);

fn dashboard_key(dashboard_id: &str, domain_id: &str) -> DashboardKey {
    (domain_id.to_string(), dashboard_id.to_string())
}

fn version_key(dashboard_id: &str, version: Version, domain_id: &str) -> VersionKey {
    (domain_id.to_string(), dashboard_id.to_string(), version)
}

/// Process-local document store.
///
/// Every mutation takes the write lock for its whole read-modify-write, which
/// gives the single-document atomicity the service relies on.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    dashboards: RwLock<HashMap<DashboardKey, DashboardRecord>>,
    versions: RwLock<BTreeMap<VersionKey, VersionSnapshot>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dashboard_count(&self) -> usize {
        self.dashboards.read().len()
    }

    pub fn version_count(&self) -> usize {
        self.versions.read().len()
    }
}

#[async_trait::async_trait]
impl DashboardStore for InMemoryStore {
    async fn insert_dashboard(&self, record: DashboardRecord) -> Result<DashboardRecord> {
        let mut dashboards = self.dashboards.write();
        let key = dashboard_key(&record.dashboard_id, &record.domain_id);
        if dashboards.contains_key(&key) {
            return Err(anyhow!("dashboard '{}' already exists", record.dashboard_id));
        }
        dashboards.insert(key, record.clone());
        Ok(record)
    }

    async fn get_dashboard(
        &self,
        dashboard_id: &str,
        domain_id: &str,
    ) -> Result<Option<DashboardRecord>> {
        Ok(self
            .dashboards
            .read()
            .get(&dashboard_key(dashboard_id, domain_id))
            .cloned())
    }

    async fn update_dashboard(
        &self,
        dashboard_id: &str,
        domain_id: &str,
        patch: &DashboardPatch,
    ) -> Result<Option<DashboardRecord>> {
        let mut dashboards = self.dashboards.write();
        Ok(dashboards
            .get_mut(&dashboard_key(dashboard_id, domain_id))
            .map(|record| {
                record.apply(patch);
                record.clone()
            }))
    }

    async fn replace_dashboard(&self, record: DashboardRecord) -> Result<Option<DashboardRecord>> {
        let mut dashboards = self.dashboards.write();
        Ok(dashboards
            .get_mut(&dashboard_key(&record.dashboard_id, &record.domain_id))
            .map(|stored| {
                *stored = record;
                stored.clone()
            }))
    }

    async fn increment_dashboard_version(
        &self,
        dashboard_id: &str,
        domain_id: &str,
    ) -> Result<Option<DashboardRecord>> {
        let mut dashboards = self.dashboards.write();
        Ok(dashboards
            .get_mut(&dashboard_key(dashboard_id, domain_id))
            .map(|record| {
                record.version += 1;
                record.clone()
            }))
    }

    async fn reset_dashboard_version(
        &self,
        dashboard_id: &str,
        domain_id: &str,
        expected: Version,
        restored: Version,
    ) -> Result<bool> {
        let mut dashboards = self.dashboards.write();
        match dashboards.get_mut(&dashboard_key(dashboard_id, domain_id)) {
            Some(record) if record.version == expected => {
                record.version = restored;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn delete_dashboard(&self, dashboard_id: &str, domain_id: &str) -> Result<bool> {
        Ok(self
            .dashboards
            .write()
            .remove(&dashboard_key(dashboard_id, domain_id))
            .is_some())
    }

    async fn query_dashboards(&self, query: &Query) -> Result<(Vec<DashboardRecord>, usize)> {
        let records: Vec<DashboardRecord> = self.dashboards.read().values().cloned().collect();
        let default_sort = Sort {
            key: "created_at".to_string(),
            desc: false,
        };
        QueryEvaluator::new(DASHBOARD_QUERY_KEYS).run(records, query, &default_sort)
    }

    async fn stat_dashboards(&self, query: &StatQuery) -> Result<StatResult> {
        let records: Vec<DashboardRecord> = self.dashboards.read().values().cloned().collect();
        QueryEvaluator::new(DASHBOARD_QUERY_KEYS).stat(&records, query)
    }
}

#[async_trait::async_trait]
impl DashboardVersionStore for InMemoryStore {
    async fn insert_version(&self, snapshot: VersionSnapshot) -> Result<VersionSnapshot> {
        let mut versions = self.versions.write();
        let key = version_key(&snapshot.dashboard_id, snapshot.version, &snapshot.domain_id);
        if versions.contains_key(&key) {
            return Err(anyhow!(
                "version {} of dashboard '{}' already exists",
                snapshot.version,
                snapshot.dashboard_id
            ));
        }
        versions.insert(key, snapshot.clone());
        Ok(snapshot)
    }

    async fn get_version(
        &self,
        dashboard_id: &str,
        version: Version,
        domain_id: &str,
    ) -> Result<Option<VersionSnapshot>> {
        Ok(self
            .versions
            .read()
            .get(&version_key(dashboard_id, version, domain_id))
            .cloned())
    }

    async fn query_versions(&self, query: &Query) -> Result<(Vec<VersionSnapshot>, usize)> {
        let snapshots: Vec<VersionSnapshot> = self.versions.read().values().cloned().collect();
        QueryEvaluator::new(VERSION_QUERY_KEYS).run(snapshots, query, &Sort::desc("version"))
    }

    async fn delete_version(
        &self,
        dashboard_id: &str,
        version: Version,
        domain_id: &str,
    ) -> Result<bool> {
        Ok(self
            .versions
            .write()
            .remove(&version_key(dashboard_id, version, domain_id))
            .is_some())
    }

    async fn delete_versions(&self, dashboard_id: &str, domain_id: &str) -> Result<u64> {
        let mut versions = self.versions.write();
        let before = versions.len();
        versions.retain(|(domain, dashboard, _), _| !(domain == domain_id && dashboard == dashboard_id));
        Ok((before - versions.len()) as u64)
    }
}

impl Store for InMemoryStore {}
