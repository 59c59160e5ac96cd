use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{anyhow, Result};
use async_trait::async_trait;
use dashboard_versioning::store::{DashboardStore, DashboardVersionStore, InMemoryStore, Store};
use dashboard_versioning::{
    DashboardError, DashboardPatch, DashboardRecord, DashboardService, NewDashboard, Query,
    StatQuery, StatResult, UserContext, Version, VersionSnapshot,
};
use proptest::prelude::*;
use serde_json::{json, Value};

/// In-memory store that can be told to fail the next call of a given kind
#[derive(Default)]
struct FlakyStore {
    inner: InMemoryStore,
    fail_insert_version: AtomicBool,
    fail_update_dashboard: AtomicBool,
    fail_reset_version: AtomicBool,
}

impl FlakyStore {
    fn trip(flag: &AtomicBool, what: &str) -> Result<()> {
        if flag.swap(false, Ordering::SeqCst) {
            return Err(anyhow!("{} failed", what));
        }
        Ok(())
    }
}

#[async_trait]
impl DashboardStore for FlakyStore {
    async fn insert_dashboard(&self, record: DashboardRecord) -> Result<DashboardRecord> {
        self.inner.insert_dashboard(record).await
    }

    async fn get_dashboard(
        &self,
        dashboard_id: &str,
        domain_id: &str,
    ) -> Result<Option<DashboardRecord>> {
        self.inner.get_dashboard(dashboard_id, domain_id).await
    }

    async fn update_dashboard(
        &self,
        dashboard_id: &str,
        domain_id: &str,
        patch: &DashboardPatch,
    ) -> Result<Option<DashboardRecord>> {
        Self::trip(&self.fail_update_dashboard, "dashboard update")?;
        self.inner.update_dashboard(dashboard_id, domain_id, patch).await
    }

    async fn replace_dashboard(&self, record: DashboardRecord) -> Result<Option<DashboardRecord>> {
        self.inner.replace_dashboard(record).await
    }

    async fn increment_dashboard_version(
        &self,
        dashboard_id: &str,
        domain_id: &str,
    ) -> Result<Option<DashboardRecord>> {
        self.inner
            .increment_dashboard_version(dashboard_id, domain_id)
            .await
    }

    async fn reset_dashboard_version(
        &self,
        dashboard_id: &str,
        domain_id: &str,
        expected: Version,
        restored: Version,
    ) -> Result<bool> {
        Self::trip(&self.fail_reset_version, "version reset")?;
        self.inner
            .reset_dashboard_version(dashboard_id, domain_id, expected, restored)
            .await
    }

    async fn delete_dashboard(&self, dashboard_id: &str, domain_id: &str) -> Result<bool> {
        self.inner.delete_dashboard(dashboard_id, domain_id).await
    }

    async fn query_dashboards(&self, query: &Query) -> Result<(Vec<DashboardRecord>, usize)> {
        self.inner.query_dashboards(query).await
    }

    async fn stat_dashboards(&self, query: &StatQuery) -> Result<StatResult> {
        self.inner.stat_dashboards(query).await
    }
}

#[async_trait]
impl DashboardVersionStore for FlakyStore {
    async fn insert_version(&self, snapshot: VersionSnapshot) -> Result<VersionSnapshot> {
        Self::trip(&self.fail_insert_version, "snapshot write")?;
        self.inner.insert_version(snapshot).await
    }

    async fn get_version(
        &self,
        dashboard_id: &str,
        version: Version,
        domain_id: &str,
    ) -> Result<Option<VersionSnapshot>> {
        self.inner.get_version(dashboard_id, version, domain_id).await
    }

    async fn query_versions(&self, query: &Query) -> Result<(Vec<VersionSnapshot>, usize)> {
        self.inner.query_versions(query).await
    }

    async fn delete_version(
        &self,
        dashboard_id: &str,
        version: Version,
        domain_id: &str,
    ) -> Result<bool> {
        self.inner.delete_version(dashboard_id, version, domain_id).await
    }

    async fn delete_versions(&self, dashboard_id: &str, domain_id: &str) -> Result<u64> {
        self.inner.delete_versions(dashboard_id, domain_id).await
    }
}

impl Store for FlakyStore {}

fn setup() -> (Arc<FlakyStore>, DashboardService<FlakyStore>) {
    let store = Arc::new(FlakyStore::default());
    (store.clone(), DashboardService::new(store))
}

fn user() -> UserContext {
    UserContext::new("u1", "domain-1")
}

fn layouts(widget: &str) -> Vec<Value> {
    vec![json!({ "widget": widget })]
}

fn layout_patch(widget: &str) -> DashboardPatch {
    DashboardPatch {
        layouts: Some(layouts(widget)),
        ..Default::default()
    }
}

async fn create_with_layout(service: &DashboardService<FlakyStore>, widget: &str) -> DashboardRecord {
    let mut new = NewDashboard::new("Costs", "DASHBOARD");
    new.layouts = Some(layouts(widget));
    service.create(&user(), new).await.unwrap()
}

async fn version_numbers(service: &DashboardService<FlakyStore>, dashboard_id: &str) -> Vec<Version> {
    service
        .list_versions(&user(), dashboard_id, Query::default())
        .await
        .unwrap()
        .results
        .iter()
        .map(|info| info.snapshot.version)
        .collect()
}

#[tokio::test]
async fn test_create_without_content_has_no_snapshot() {
    let (store, service) = setup();
    let created = service
        .create(&user(), NewDashboard::new("Empty", "DASHBOARD"))
        .await
        .unwrap();

    assert_eq!(created.version, 1);
    assert!(created.dashboard_id.starts_with("dash-"));
    assert_eq!(store.inner.version_count(), 0);

    // Non-versioned edits never create one either
    let patch = DashboardPatch {
        name: Some("Renamed".into()),
        labels: Some(vec!["finops".into()]),
        ..Default::default()
    };
    let updated = service.update(&user(), &created.dashboard_id, patch).await.unwrap();
    assert_eq!(updated.version, 1);
    assert_eq!(updated.name, "Renamed");
    assert_eq!(store.inner.version_count(), 0);
}

#[tokio::test]
async fn test_versioned_update_snapshots_current_content() {
    let (_, service) = setup();
    let created = create_with_layout(&service, "chart").await;

    let updated = service
        .update(&user(), &created.dashboard_id, layout_patch("table"))
        .await
        .unwrap();
    assert_eq!(updated.version, 2);
    assert_eq!(updated.layouts, layouts("table"));

    let info = service
        .get_version(&user(), &created.dashboard_id, 2)
        .await
        .unwrap();
    assert!(info.latest);
    assert_eq!(info.snapshot.layouts, updated.layouts);
    assert_eq!(info.snapshot.variables, updated.variables);
    assert_eq!(info.snapshot.variables_schema, updated.variables_schema);

    // Re-sending the same layouts is not a change
    let same = service
        .update(&user(), &created.dashboard_id, layout_patch("table"))
        .await
        .unwrap();
    assert_eq!(same.version, 2);
    assert_eq!(version_numbers(&service, &created.dashboard_id).await, vec![2, 1]);
}

#[tokio::test]
async fn test_revert_creates_a_new_version() {
    let (_, service) = setup();
    let created = create_with_layout(&service, "chart").await;
    let id = created.dashboard_id.as_str();
    service.update(&user(), id, layout_patch("table")).await.unwrap();

    let reverted = service.revert_version(&user(), id, 1).await.unwrap();
    assert_eq!(reverted.version, 3);
    assert_eq!(reverted.layouts, layouts("chart"));

    let v3 = service.get_version(&user(), id, 3).await.unwrap();
    assert_eq!(v3.snapshot.layouts, layouts("chart"));
    let v2 = service.get_version(&user(), id, 2).await.unwrap();
    assert_eq!(v2.snapshot.layouts, layouts("table"));
    assert!(!v2.latest);

    let err = service.revert_version(&user(), id, 9).await.unwrap_err();
    assert!(matches!(err, DashboardError::NotFound { .. }));
    assert_eq!(service.get(&user(), id).await.unwrap().version, 3);
}

#[tokio::test]
async fn test_delete_version_guards_the_latest() {
    let (_, service) = setup();
    let created = create_with_layout(&service, "chart").await;
    let id = created.dashboard_id.as_str();
    service.update(&user(), id, layout_patch("table")).await.unwrap();

    let err = service.delete_version(&user(), id, 2).await.unwrap_err();
    assert!(matches!(err, DashboardError::LatestVersion { version: 2, .. }));
    assert_eq!(err.code(), "LATEST_VERSION");

    service.delete_version(&user(), id, 1).await.unwrap();
    let err = service.get_version(&user(), id, 1).await.unwrap_err();
    assert!(matches!(err, DashboardError::NotFound { .. }));
    assert_eq!(version_numbers(&service, id).await, vec![2]);
}

#[tokio::test]
async fn test_delete_dashboard_removes_every_snapshot() {
    let (store, service) = setup();
    let created = create_with_layout(&service, "chart").await;
    let id = created.dashboard_id.as_str();
    service.update(&user(), id, layout_patch("table")).await.unwrap();
    service.update(&user(), id, layout_patch("map")).await.unwrap();
    assert_eq!(store.inner.version_count(), 3);

    service.delete(&user(), id).await.unwrap();
    assert_eq!(store.inner.version_count(), 0);
    assert_eq!(store.inner.dashboard_count(), 0);
    assert!(matches!(
        service.get(&user(), id).await,
        Err(DashboardError::NotFound { .. })
    ));
}

#[tokio::test]
async fn test_failed_snapshot_restores_the_version() {
    let (store, service) = setup();
    let created = create_with_layout(&service, "chart").await;
    let id = created.dashboard_id.as_str();

    store.fail_insert_version.store(true, Ordering::SeqCst);
    let err = service.update(&user(), id, layout_patch("table")).await.unwrap_err();
    assert!(matches!(&err, DashboardError::StoreUnavailable(_)));
    assert!(err.to_string().contains("snapshot write failed"));
    assert!(err.is_retryable());

    let current = service.get(&user(), id).await.unwrap();
    assert_eq!(current.version, 1);
    assert_eq!(current.layouts, layouts("chart"));
    assert_eq!(version_numbers(&service, id).await, vec![1]);
}

#[tokio::test]
async fn test_failed_record_update_removes_the_snapshot() {
    let (store, service) = setup();
    let created = create_with_layout(&service, "chart").await;
    let id = created.dashboard_id.as_str();

    store.fail_update_dashboard.store(true, Ordering::SeqCst);
    let err = service.revert_version(&user(), id, 1).await.unwrap_err();
    assert!(err.to_string().contains("dashboard update failed"));

    let current = service.get(&user(), id).await.unwrap();
    assert_eq!(current.version, 1);
    assert_eq!(version_numbers(&service, id).await, vec![1]);
}

#[tokio::test]
async fn test_failed_create_leaves_nothing_behind() {
    let (store, service) = setup();
    store.fail_insert_version.store(true, Ordering::SeqCst);

    let mut new = NewDashboard::new("Costs", "DASHBOARD");
    new.variables = Some(serde_json::Map::new());
    let err = service.create(&user(), new).await.unwrap_err();

    assert!(matches!(err, DashboardError::StoreUnavailable(_)));
    assert_eq!(store.inner.dashboard_count(), 0);
    assert_eq!(store.inner.version_count(), 0);
}

#[tokio::test]
async fn test_failing_compensation_keeps_the_original_error() {
    let (store, service) = setup();
    let created = create_with_layout(&service, "chart").await;
    let id = created.dashboard_id.as_str();

    store.fail_insert_version.store(true, Ordering::SeqCst);
    store.fail_reset_version.store(true, Ordering::SeqCst);
    let err = service.update(&user(), id, layout_patch("table")).await.unwrap_err();
    assert!(err.to_string().contains("snapshot write failed"));

    // The counter could not be restored: a gap, never a reused number
    let current = service.get(&user(), id).await.unwrap();
    assert_eq!(current.version, 2);
    assert_eq!(current.layouts, layouts("chart"));

    let next = service.update(&user(), id, layout_patch("map")).await.unwrap();
    assert_eq!(next.version, 3);
    assert_eq!(version_numbers(&service, id).await, vec![3, 1]);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_updates_get_distinct_versions() {
    let (_, service) = setup();
    let created = create_with_layout(&service, "initial").await;

    let handles: Vec<_> = (0..10)
        .map(|n| {
            let service = service.clone();
            let id = created.dashboard_id.clone();
            tokio::spawn(async move {
                service
                    .update(&user(), &id, layout_patch(&format!("widget-{}", n)))
                    .await
            })
        })
        .collect();
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let current = service.get(&user(), &created.dashboard_id).await.unwrap();
    assert_eq!(current.version, 11);

    let mut versions = version_numbers(&service, &created.dashboard_id).await;
    versions.sort();
    assert_eq!(versions, (1..=11).collect::<Vec<Version>>());
}

#[derive(Debug, Clone)]
enum Edit {
    Rename(String),
    Layout(u8),
    Settings(u8),
}

fn edit() -> impl Strategy<Value = Edit> {
    prop_oneof![
        "[a-z]{1,6}".prop_map(Edit::Rename),
        (0u8..3).prop_map(Edit::Layout),
        (0u8..3).prop_map(Edit::Settings),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(32))]

    #[test]
    fn version_grows_by_one_exactly_on_content_changes(edits in prop::collection::vec(edit(), 1..12)) {
        let runtime = tokio::runtime::Runtime::new().unwrap();
        runtime.block_on(async {
            let (_, service) = setup();
            let created = create_with_layout(&service, "0").await;
            let id = created.dashboard_id.clone();
            let mut expected = created.version;
            let mut current_layout = "0".to_string();

            for edit in edits {
                let patch = match &edit {
                    Edit::Rename(name) => DashboardPatch {
                        name: Some(name.clone()),
                        ..Default::default()
                    },
                    Edit::Layout(n) => {
                        let widget = n.to_string();
                        if widget != current_layout {
                            expected += 1;
                            current_layout = widget.clone();
                        }
                        layout_patch(&widget)
                    }
                    Edit::Settings(n) => DashboardPatch {
                        settings: Some(
                            json!({ "theme": n }).as_object().cloned().unwrap_or_default(),
                        ),
                        ..Default::default()
                    },
                };
                let updated = service.update(&user(), &id, patch).await.unwrap();
                assert_eq!(updated.version, expected, "after {:?}", edit);
            }

            let versions = version_numbers(&service, &id).await;
            assert_eq!(versions.len() as Version, expected);
            assert_eq!(versions.first().copied(), Some(expected));
        });
    }
}
