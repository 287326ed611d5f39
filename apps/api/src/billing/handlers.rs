use axum::{body::Bytes, extract::State, http::HeaderMap, Json};
use tracing::info;

use crate::auth::{authenticate, RequestMeta};
use crate::billing::checkout::{self, create_checkout, CheckoutRequest, CheckoutResponse};
use crate::billing::subscription::{self, check_subscription, SubscriptionCheck};
use crate::errors::{parse_body, FunctionError};
use crate::state::AppState;

/// POST /functions/v1/create-checkout
pub async fn handle_create_checkout(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<CheckoutResponse>, FunctionError> {
    let on_error = FunctionError::on(checkout::FUNCTION);
    info!(function = checkout::FUNCTION, step = "start", "Starting checkout creation");

    let caller = authenticate(state.sessions.as_ref(), &headers)
        .await
        .map_err(&on_error)?;
    info!(function = checkout::FUNCTION, step = "authenticated", user_id = %caller.id, "User authenticated");

    let meta = RequestMeta::from_headers(&headers);
    let request: CheckoutRequest = parse_body(&body).map_err(&on_error)?;

    let response = create_checkout(&state, &caller, &meta, request)
        .await
        .map_err(&on_error)?;
    Ok(Json(response))
}

/// POST /functions/v1/check-subscription
pub async fn handle_check_subscription(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<SubscriptionCheck>, FunctionError> {
    let on_error = FunctionError::on(subscription::FUNCTION);
    info!(function = subscription::FUNCTION, step = "start", "Starting subscription check");

    let caller = authenticate(state.sessions.as_ref(), &headers)
        .await
        .map_err(&on_error)?;
    info!(function = subscription::FUNCTION, step = "authenticated", user_id = %caller.id, "User authenticated");

    let result = check_subscription(&state, &caller)
        .await
        .map_err(&on_error)?;
    Ok(Json(result))
}
