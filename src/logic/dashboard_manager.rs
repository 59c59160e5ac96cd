use std::sync::Arc;

use anyhow::anyhow;

use crate::error::{DashboardError, DashboardResult};
use crate::logic::Transaction;
use crate::model::{DashboardPatch, DashboardRecord, Query, StatQuery, StatResult};
use crate::store::traits::Store;

/// Record-level operations on the `dashboards` collection.
///
/// Mutations take the operation's [`Transaction`] and register their undo
/// action once the store call has succeeded.
pub struct DashboardManager<S> {
    store: Arc<S>,
}

impl<S> Clone for DashboardManager<S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
        }
    }
}

impl<S: Store + 'static> DashboardManager<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    pub async fn create_dashboard(
        &self,
        tx: &mut Transaction,
        record: DashboardRecord,
    ) -> DashboardResult<DashboardRecord> {
        let created = self.store.insert_dashboard(record).await?;

        let store = self.store.clone();
        let (dashboard_id, domain_id) = (created.dashboard_id.clone(), created.domain_id.clone());
        tx.add_rollback(
            format!("delete dashboard {} ({})", created.name, created.dashboard_id),
            move || async move {
                store.delete_dashboard(&dashboard_id, &domain_id).await?;
                Ok(())
            },
        );

        Ok(created)
    }

    pub async fn update_dashboard_by_record(
        &self,
        tx: &mut Transaction,
        record: &DashboardRecord,
        patch: &DashboardPatch,
    ) -> DashboardResult<DashboardRecord> {
        let prior = record.clone();
        let updated = self
            .store
            .update_dashboard(&record.dashboard_id, &record.domain_id, patch)
            .await?
            .ok_or_else(|| DashboardError::dashboard_not_found(&record.dashboard_id, &record.domain_id))?;

        let store = self.store.clone();
        tx.add_rollback(
            format!("revert dashboard data {}", prior.dashboard_id),
            move || async move {
                store
                    .replace_dashboard(prior)
                    .await?
                    .ok_or_else(|| anyhow!("dashboard disappeared before it could be restored"))?;
                Ok(())
            },
        );

        Ok(updated)
    }

    /// Bump the version counter by one, atomically in the store
    pub async fn increase_version(
        &self,
        tx: &mut Transaction,
        record: &DashboardRecord,
    ) -> DashboardResult<DashboardRecord> {
        let bumped = self
            .store
            .increment_dashboard_version(&record.dashboard_id, &record.domain_id)
            .await?
            .ok_or_else(|| DashboardError::dashboard_not_found(&record.dashboard_id, &record.domain_id))?;

        let store = self.store.clone();
        let (dashboard_id, domain_id) = (bumped.dashboard_id.clone(), bumped.domain_id.clone());
        let (expected, restored) = (bumped.version, bumped.version - 1);
        tx.add_rollback(
            format!("restore version {} of dashboard {}", restored, dashboard_id),
            move || async move {
                let reset = store
                    .reset_dashboard_version(&dashboard_id, &domain_id, expected, restored)
                    .await?;
                if !reset {
                    log::warn!(
                        "version of dashboard {} moved past {}; leaving it in place",
                        dashboard_id,
                        expected
                    );
                }
                Ok(())
            },
        );

        Ok(bumped)
    }

    pub async fn delete_dashboard_by_record(&self, record: &DashboardRecord) -> DashboardResult<()> {
        let deleted = self
            .store
            .delete_dashboard(&record.dashboard_id, &record.domain_id)
            .await?;
        if !deleted {
            return Err(DashboardError::dashboard_not_found(
                &record.dashboard_id,
                &record.domain_id,
            ));
        }
        Ok(())
    }

    pub async fn get_dashboard(
        &self,
        dashboard_id: &str,
        domain_id: &str,
    ) -> DashboardResult<DashboardRecord> {
        self.store
            .get_dashboard(dashboard_id, domain_id)
            .await?
            .ok_or_else(|| DashboardError::dashboard_not_found(dashboard_id, domain_id))
    }

    pub async fn list_dashboards(
        &self,
        query: &Query,
    ) -> DashboardResult<(Vec<DashboardRecord>, usize)> {
        Ok(self.store.query_dashboards(query).await?)
    }

    pub async fn stat_dashboards(&self, query: &StatQuery) -> DashboardResult<StatResult> {
        Ok(self.store.stat_dashboards(query).await?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{NewDashboard, UserContext};
    use crate::store::{DashboardStore, InMemoryStore};

    fn setup() -> (Arc<InMemoryStore>, DashboardManager<InMemoryStore>) {
        let store = Arc::new(InMemoryStore::new());
        (store.clone(), DashboardManager::new(store))
    }

    fn new_record() -> DashboardRecord {
        DashboardRecord::new(
            NewDashboard::new("Costs", "DASHBOARD"),
            &UserContext::new("u1", "d1"),
        )
    }

    #[tokio::test]
    async fn test_create_rollback_deletes_record() {
        let (store, manager) = setup();
        let mut tx = Transaction::new("create");
        manager.create_dashboard(&mut tx, new_record()).await.unwrap();
        assert_eq!(store.dashboard_count(), 1);

        tx.rollback().await;
        assert_eq!(store.dashboard_count(), 0);
    }

    #[tokio::test]
    async fn test_update_rollback_restores_prior_state() {
        let (store, manager) = setup();
        let created = manager
            .create_dashboard(&mut Transaction::new("create"), new_record())
            .await
            .unwrap();

        let mut tx = Transaction::new("update");
        let patch = DashboardPatch {
            name: Some("Renamed".into()),
            labels: Some(vec!["x".into()]),
            ..Default::default()
        };
        let updated = manager
            .update_dashboard_by_record(&mut tx, &created, &patch)
            .await
            .unwrap();
        assert_eq!(updated.name, "Renamed");

        tx.rollback().await;
        let restored = store
            .get_dashboard(&created.dashboard_id, "d1")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(restored, created);
    }

    #[tokio::test]
    async fn test_increase_version_rollback_is_compare_and_set() {
        let (store, manager) = setup();
        let created = manager
            .create_dashboard(&mut Transaction::new("create"), new_record())
            .await
            .unwrap();

        let mut tx = Transaction::new("update");
        let bumped = manager.increase_version(&mut tx, &created).await.unwrap();
        assert_eq!(bumped.version, created.version + 1);

        // A concurrent writer bumps again; the rollback must not rewind it
        manager
            .increase_version(&mut Transaction::new("other"), &created)
            .await
            .unwrap();
        tx.rollback().await;

        let current = manager.get_dashboard(&created.dashboard_id, "d1").await.unwrap();
        assert_eq!(current.version, created.version + 2);
        assert!(store.dashboard_count() == 1);
    }

    #[tokio::test]
    async fn test_missing_dashboard_is_not_found() {
        let (_, manager) = setup();
        let err = manager.get_dashboard("dash-missing", "d1").await.unwrap_err();
        assert!(matches!(err, DashboardError::NotFound { .. }));

        let err = manager
            .increase_version(&mut Transaction::new("update"), &new_record())
            .await
            .unwrap_err();
        assert!(matches!(err, DashboardError::NotFound { .. }));
    }
}
