//! POST /functions/v1/linkedin-auth

use axum::{
    body::Bytes,
    extract::State,
    http::HeaderMap,
    response::{IntoResponse, Response},
    Json,
};
use serde::Deserialize;
use tracing::info;

use crate::auth::{authenticate, RequestMeta};
use crate::errors::{parse_body, AppError, FunctionError};
use crate::linkedin::flow::{exchange_code, get_auth_url, FUNCTION};
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct LinkedInAuthRequest {
    #[serde(default)]
    pub action: Option<String>,
    #[serde(default)]
    pub code: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
}

pub async fn handle_linkedin_auth(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Response, FunctionError> {
    dispatch(&state, &headers, &body)
        .await
        .map_err(FunctionError::on(FUNCTION))
}

async fn dispatch(state: &AppState, headers: &HeaderMap, body: &[u8]) -> Result<Response, AppError> {
    info!(function = FUNCTION, step = "start", "Starting LinkedIn auth flow");
    let caller = authenticate(state.sessions.as_ref(), headers).await?;
    info!(function = FUNCTION, step = "authenticated", user_id = %caller.id, "User authenticated");

    let meta = RequestMeta::from_headers(headers);
    let request: LinkedInAuthRequest = parse_body(body)?;

    match request.action.as_deref() {
        Some("get_auth_url") => {
            let response = get_auth_url(state, &caller, &meta).await?;
            Ok(Json(response).into_response())
        }
        Some("exchange_code") => {
            let code = request
                .code
                .as_deref()
                .filter(|c| !c.trim().is_empty())
                .ok_or_else(|| AppError::Validation("Authorization code required".to_string()))?;
            let response =
                exchange_code(state, &caller, &meta, code, request.state.as_deref()).await?;
            Ok(Json(response).into_response())
        }
        _ => Err(AppError::Validation("Invalid action".to_string())),
    }
}
