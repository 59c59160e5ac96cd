use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::Json,
    Json as RequestJson,
};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::Arc;

use crate::error::DashboardError;
use crate::logic::DashboardService;
use crate::model::{
    DashboardPatch, DashboardRecord, Id, ListDashboards, NewDashboard, Page, Projection,
    Query as DashboardQuery, Sort, StatQuery, StatResult, UserContext, Version, VersionList,
    Viewers, DASHBOARD_FIELDS, VERSION_FIELDS,
};
use crate::store::traits::Store;

pub type AppState<S> = Arc<DashboardService<S>>;

type ApiResult<T> = Result<Json<T>, (StatusCode, Json<ErrorResponse>)>;

/// Simple health check endpoint
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
}

pub async fn health_check() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        timestamp: chrono::Utc::now().to_rfc3339(),
    })
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

impl ErrorResponse {
    pub fn new(message: &str, code: &str) -> Self {
        Self {
            error: message.to_string(),
            code: code.to_string(),
        }
    }
}

pub fn status_for(error: &DashboardError) -> StatusCode {
    match error {
        DashboardError::NotFound { .. } => StatusCode::NOT_FOUND,
        DashboardError::PermissionDenied { .. } => StatusCode::FORBIDDEN,
        DashboardError::LatestVersion { .. } => StatusCode::CONFLICT,
        DashboardError::Validation(_) => StatusCode::BAD_REQUEST,
        DashboardError::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
    }
}

pub fn error_response(error: DashboardError) -> (StatusCode, Json<ErrorResponse>) {
    let status = status_for(&error);
    if status.is_server_error() {
        log::error!("request failed: {}", error);
    }
    (
        status,
        Json(ErrorResponse::new(&error.to_string(), error.code())),
    )
}

fn project<T: Serialize>(item: &T, only: Option<&str>, allowed: &[&str]) -> ApiResult<Value> {
    let value = match only {
        Some(only) => Projection::parse(only, allowed)
            .map_err(|e| error_response(DashboardError::Validation(e)))?
            .apply(item),
        None => serde_json::to_value(item),
    };
    value.map(Json).map_err(|e| {
        error_response(DashboardError::Validation(format!(
            "failed to serialize response: {}",
            e
        )))
    })
}

/// Query string shared by the list endpoints
#[derive(Debug, Default, Deserialize)]
pub struct ListParams {
    pub keyword: Option<String>,
    pub sort: Option<String>,
    pub desc: Option<bool>,
    pub start: Option<usize>,
    pub limit: Option<usize>,
}

impl ListParams {
    fn into_query(self) -> DashboardQuery {
        DashboardQuery {
            keyword: self.keyword.filter(|keyword| !keyword.trim().is_empty()),
            sort: self.sort.map(|key| Sort {
                key,
                desc: self.desc.unwrap_or(false),
            }),
            page: self.limit.map(|limit| Page {
                start: self.start.unwrap_or(1),
                limit,
            }),
            ..Default::default()
        }
    }
}

/// Query string of `GET /dashboards`: equality shortcuts plus the list parameters
#[derive(Debug, Default, Deserialize)]
pub struct DashboardListParams {
    pub dashboard_id: Option<Id>,
    pub name: Option<String>,
    pub viewers: Option<Viewers>,
    pub user_id: Option<String>,
    pub keyword: Option<String>,
    pub sort: Option<String>,
    pub desc: Option<bool>,
    pub start: Option<usize>,
    pub limit: Option<usize>,
}

impl DashboardListParams {
    fn into_list(self) -> ListDashboards {
        let query = ListParams {
            keyword: self.keyword,
            sort: self.sort,
            desc: self.desc,
            start: self.start,
            limit: self.limit,
        }
        .into_query();
        ListDashboards {
            query,
            dashboard_id: self.dashboard_id,
            name: self.name,
            viewers: self.viewers,
            user_id: self.user_id,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct OnlyParams {
    pub only: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct DashboardList {
    pub results: Vec<DashboardRecord>,
    pub total_count: usize,
}

pub async fn create_dashboard<S: Store + 'static>(
    State(service): State<AppState<S>>,
    user: UserContext,
    RequestJson(new_dashboard): RequestJson<NewDashboard>,
) -> Result<(StatusCode, Json<DashboardRecord>), (StatusCode, Json<ErrorResponse>)> {
    let record = service
        .create(&user, new_dashboard)
        .await
        .map_err(error_response)?;
    Ok((StatusCode::CREATED, Json(record)))
}

pub async fn list_dashboards<S: Store + 'static>(
    State(service): State<AppState<S>>,
    user: UserContext,
    Query(params): Query<DashboardListParams>,
) -> ApiResult<DashboardList> {
    search(service, user, params.into_list()).await
}

/// Full query DSL in the request body
pub async fn search_dashboards<S: Store + 'static>(
    State(service): State<AppState<S>>,
    user: UserContext,
    RequestJson(list): RequestJson<ListDashboards>,
) -> ApiResult<DashboardList> {
    search(service, user, list).await
}

async fn search<S: Store + 'static>(
    service: AppState<S>,
    user: UserContext,
    list: ListDashboards,
) -> ApiResult<DashboardList> {
    let (results, total_count) = service.list(&user, list).await.map_err(error_response)?;
    Ok(Json(DashboardList {
        results,
        total_count,
    }))
}

pub async fn stat_dashboards<S: Store + 'static>(
    State(service): State<AppState<S>>,
    user: UserContext,
    RequestJson(query): RequestJson<StatQuery>,
) -> ApiResult<StatResult> {
    service
        .stat(&user, query)
        .await
        .map(Json)
        .map_err(error_response)
}

pub async fn get_dashboard<S: Store + 'static>(
    State(service): State<AppState<S>>,
    user: UserContext,
    Path(dashboard_id): Path<Id>,
    Query(params): Query<OnlyParams>,
) -> ApiResult<Value> {
    let record = service
        .get(&user, &dashboard_id)
        .await
        .map_err(error_response)?;
    project(&record, params.only.as_deref(), DASHBOARD_FIELDS)
}

pub async fn update_dashboard<S: Store + 'static>(
    State(service): State<AppState<S>>,
    user: UserContext,
    Path(dashboard_id): Path<Id>,
    RequestJson(patch): RequestJson<DashboardPatch>,
) -> ApiResult<DashboardRecord> {
    service
        .update(&user, &dashboard_id, patch)
        .await
        .map(Json)
        .map_err(error_response)
}

pub async fn delete_dashboard<S: Store + 'static>(
    State(service): State<AppState<S>>,
    user: UserContext,
    Path(dashboard_id): Path<Id>,
) -> Result<StatusCode, (StatusCode, Json<ErrorResponse>)> {
    service
        .delete(&user, &dashboard_id)
        .await
        .map_err(error_response)?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_versions<S: Store + 'static>(
    State(service): State<AppState<S>>,
    user: UserContext,
    Path(dashboard_id): Path<Id>,
    Query(params): Query<ListParams>,
) -> ApiResult<VersionList> {
    service
        .list_versions(&user, &dashboard_id, params.into_query())
        .await
        .map(Json)
        .map_err(error_response)
}

pub async fn get_version<S: Store + 'static>(
    State(service): State<AppState<S>>,
    user: UserContext,
    Path((dashboard_id, version)): Path<(Id, Version)>,
    Query(params): Query<OnlyParams>,
) -> ApiResult<Value> {
    let info = service
        .get_version(&user, &dashboard_id, version)
        .await
        .map_err(error_response)?;
    project(&info, params.only.as_deref(), VERSION_FIELDS)
}

pub async fn delete_version<S: Store + 'static>(
    State(service): State<AppState<S>>,
    user: UserContext,
    Path((dashboard_id, version)): Path<(Id, Version)>,
) -> Result<StatusCode, (StatusCode, Json<ErrorResponse>)> {
    service
        .delete_version(&user, &dashboard_id, version)
        .await
        .map_err(error_response)?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn revert_version<S: Store + 'static>(
    State(service): State<AppState<S>>,
    user: UserContext,
    Path((dashboard_id, version)): Path<(Id, Version)>,
) -> ApiResult<DashboardRecord> {
    service
        .revert_version(&user, &dashboard_id, version)
        .await
        .map(Json)
        .map_err(error_response)
}
