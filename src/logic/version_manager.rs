use std::sync::Arc;

use crate::error::{DashboardError, DashboardResult};
use crate::logic::Transaction;
use crate::model::{DashboardPatch, DashboardRecord, Query, Version, VersionSnapshot};
use crate::store::traits::Store;

/// Snapshot operations on the `dashboard_versions` collection
pub struct VersionManager<S> {
    store: Arc<S>,
}

impl<S> Clone for VersionManager<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
        }
    }
}

impl<S: Store + 'static> VersionManager<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Persist a snapshot of `record` at its current version, taking the
    /// versioned content from `patch` where present
    pub async fn create_version_by_record(
        &self,
        tx: &mut Transaction,
        record: &DashboardRecord,
        patch: &DashboardPatch,
    ) -> DashboardResult<VersionSnapshot> {
        let snapshot = self
            .store
            .insert_version(VersionSnapshot::capture(record, patch))
            .await?;

        let store = self.store.clone();
        let (dashboard_id, version, domain_id) = (
            snapshot.dashboard_id.clone(),
            snapshot.version,
            snapshot.domain_id.clone(),
        );
        tx.add_rollback(
            format!("delete version {} of dashboard {}", version, dashboard_id),
            move || async move {
                store.delete_version(&dashboard_id, version, &domain_id).await?;
                Ok(())
            },
        );

        Ok(snapshot)
    }

    pub async fn get_version(
        &self,
        dashboard_id: &str,
        version: Version,
        domain_id: &str,
    ) -> DashboardResult<VersionSnapshot> {
        self.store
            .get_version(dashboard_id, version, domain_id)
            .await?
            .ok_or_else(|| DashboardError::version_not_found(dashboard_id, version))
    }

    pub async fn list_versions(
        &self,
        query: &Query,
    ) -> DashboardResult<(Vec<VersionSnapshot>, usize)> {
        Ok(self.store.query_versions(query).await?)
    }

    /// Delete one snapshot; the dashboard's current version is never deletable
    pub async fn delete_version(
        &self,
        dashboard_id: &str,
        version: Version,
        domain_id: &str,
        current_version: Version,
    ) -> DashboardResult<()> {
        if version == current_version {
            return Err(DashboardError::LatestVersion {
                dashboard_id: dashboard_id.to_string(),
                version,
            });
        }
        let deleted = self
            .store
            .delete_version(dashboard_id, version, domain_id)
            .await?;
        if !deleted {
            return Err(DashboardError::version_not_found(dashboard_id, version));
        }
        Ok(())
    }

    /// Remove every snapshot of a dashboard
    pub async fn delete_versions_by_dashboard(
        &self,
        dashboard_id: &str,
        domain_id: &str,
    ) -> DashboardResult<u64> {
        Ok(self.store.delete_versions(dashboard_id, domain_id).await?)
    }
}
