use axum::{
    body::Bytes,
    extract::{rejection::PathRejection, Path, State},
    http::{HeaderMap, StatusCode},
    Json,
};
use uuid::Uuid;

use crate::auth::authenticate;
use crate::cv::{self, CreateCvRequest};
use crate::errors::{parse_body, AppError};
use crate::models::cv::{CvDocument, CvUpdate};
use crate::state::AppState;

// Path and body are decoded only after the caller is authenticated, and
// their failures render through `AppError` like every other error.
type CvId = Result<Path<Uuid>, PathRejection>;

/// GET /api/v1/cvs
pub async fn handle_list_cvs(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<CvDocument>>, AppError> {
    let caller = authenticate(state.sessions.as_ref(), &headers).await?;
    Ok(Json(cv::list_cvs(state.store.as_ref(), &caller).await?))
}

/// POST /api/v1/cvs
pub async fn handle_create_cv(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<(StatusCode, Json<CvDocument>), AppError> {
    let caller = authenticate(state.sessions.as_ref(), &headers).await?;
    let request: CreateCvRequest = parse_body(&body)?;
    let document = cv::create_cv(state.store.as_ref(), &caller, request).await?;
    Ok((StatusCode::CREATED, Json(document)))
}

/// GET /api/v1/cvs/:id
pub async fn handle_get_cv(
    State(state): State<AppState>,
    id: CvId,
    headers: HeaderMap,
) -> Result<Json<CvDocument>, AppError> {
    let caller = authenticate(state.sessions.as_ref(), &headers).await?;
    let Path(id) = id?;
    Ok(Json(cv::get_cv(state.store.as_ref(), &caller, id).await?))
}

/// PUT /api/v1/cvs/:id
pub async fn handle_update_cv(
    State(state): State<AppState>,
    id: CvId,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<CvDocument>, AppError> {
    let caller = authenticate(state.sessions.as_ref(), &headers).await?;
    let Path(id) = id?;
    let update: CvUpdate = parse_body(&body)?;
    Ok(Json(cv::update_cv(state.store.as_ref(), &caller, id, update).await?))
}

/// DELETE /api/v1/cvs/:id
pub async fn handle_delete_cv(
    State(state): State<AppState>,
    id: CvId,
    headers: HeaderMap,
) -> Result<StatusCode, AppError> {
    let caller = authenticate(state.sessions.as_ref(), &headers).await?;
    let Path(id) = id?;
    cv::delete_cv(state.store.as_ref(), &caller, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
