use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{request::Parts, HeaderMap, StatusCode},
    Json,
};

use crate::api::handlers::ErrorResponse;
use crate::model::UserContext;

pub const USER_ID_HEADER: &str = "x-user-id";
pub const DOMAIN_ID_HEADER: &str = "x-domain-id";
pub const WORKSPACE_ID_HEADER: &str = "x-workspace-id";
pub const PROJECT_ID_HEADER: &str = "x-project-id";

/// Axum extractor for UserContext from request headers
///
/// - X-User-Id: required
/// - X-Domain-Id: required
/// - X-Workspace-Id, X-Project-Id: optional scope
///
/// Requests without a caller identity are rejected with 401.
#[async_trait]
impl<S> FromRequestParts<S> for UserContext
where
    S: Send + Sync,
{
    type Rejection = (StatusCode, Json<ErrorResponse>);

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        user_context_from_headers(&parts.headers).map_err(|missing| {
            (
                StatusCode::UNAUTHORIZED,
                Json(ErrorResponse::new(
                    &format!("missing {} header", missing),
                    "UNAUTHENTICATED",
                )),
            )
        })
    }
}

/// Build the caller context, or name the first required header that is missing
fn user_context_from_headers(headers: &HeaderMap) -> Result<UserContext, &'static str> {
    let user_id = extract_header_value(headers, USER_ID_HEADER).ok_or(USER_ID_HEADER)?;
    let domain_id = extract_header_value(headers, DOMAIN_ID_HEADER).ok_or(DOMAIN_ID_HEADER)?;

    Ok(UserContext::new(user_id, domain_id).with_scope(
        extract_header_value(headers, WORKSPACE_ID_HEADER),
        extract_header_value(headers, PROJECT_ID_HEADER),
    ))
}

/// Extract a non-blank header value as string
fn extract_header_value(headers: &HeaderMap, header_name: &str) -> Option<String> {
    headers
        .get(header_name)
        .and_then(|value| value.to_str().ok())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.to_string())
}
