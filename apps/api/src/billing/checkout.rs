//! Checkout-session issuance: free → pending.
//!
//! There is no lock around "read eligibility → create session → upsert
//! record". Two concurrent requests from the same user can both pass the
//! eligibility check and open two provider sessions, and two concurrent
//! first-time requests can create two provider customers.

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::auth::{record_audit, Caller, RequestMeta};
use crate::billing::prices::resolve_price_id;
use crate::billing::stripe::{CheckoutSessionParams, Customer};
use crate::errors::AppError;
use crate::state::AppState;

pub const FUNCTION: &str = "create-checkout";
const RESOURCE: &str = "stripe_checkout";
/// Plan key used when the request names none.
pub const DEFAULT_PLAN_KEY: &str = "premium_monthly";

#[derive(Debug, Default, Deserialize)]
pub struct CheckoutRequest {
    #[serde(default)]
    pub plan_type: Option<String>,
    #[serde(default)]
    pub success_url: Option<String>,
    #[serde(default)]
    pub cancel_url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CheckoutResponse {
    pub url: String,
}

pub async fn create_checkout(
    state: &AppState,
    caller: &Caller,
    meta: &RequestMeta,
    request: CheckoutRequest,
) -> Result<CheckoutResponse, AppError> {
    let email = caller.email.as_deref().ok_or_else(|| {
        AppError::Authentication("User not authenticated or email not available".to_string())
    })?;
    let plan_key = non_blank(request.plan_type).unwrap_or_else(|| DEFAULT_PLAN_KEY.to_string());

    match state.store.get_subscription(caller.id).await {
        Ok(Some(record)) if !record.allows_checkout() => return Err(AppError::AlreadySubscribed),
        Ok(_) => {}
        Err(e) => {
            warn!(function = FUNCTION, step = "eligibility", error = %e, "Subscription check failed, allowing checkout");
        }
    }

    let customer = find_or_create_customer(state, caller, email).await?;

    let resolution = resolve_price_id(
        state.store.as_ref(),
        &plan_key,
        state.config.stripe.default_price_id.as_deref(),
    )
    .await;
    if resolution.is_degraded() {
        warn!(function = FUNCTION, step = "price", plan_key = %plan_key, "Price table unusable for plan");
    }
    let price_id = resolution.into_value().ok_or_else(|| {
        AppError::configuration(
            format!("No price configured for plan {plan_key}"),
            "Payment service temporarily unavailable",
        )
    })?;

    let origin = meta
        .origin
        .as_deref()
        .unwrap_or(&state.config.app_origin)
        .to_string();
    let success_url = non_blank(request.success_url)
        .unwrap_or_else(|| format!("{origin}/dashboard?checkout=success"));
    let cancel_url = non_blank(request.cancel_url)
        .unwrap_or_else(|| format!("{origin}/pricing?checkout=cancelled"));

    let session = state
        .billing
        .create_checkout_session(&CheckoutSessionParams {
            customer_id: &customer.id,
            price_id: &price_id,
            success_url: &success_url,
            cancel_url: &cancel_url,
            user_id: caller.id,
            plan_key: &plan_key,
        })
        .await?;
    info!(function = FUNCTION, step = "session_created", session_id = %session.id, "Created checkout session");

    let url = session.url.ok_or_else(|| {
        AppError::upstream(
            "stripe",
            format!("checkout session {} has no url", session.id),
            "Payment service temporarily unavailable",
        )
    })?;

    state
        .store
        .upsert_pending_subscription(caller.id, &customer.id)
        .await?;
    record_audit(
        state.store.as_ref(),
        caller,
        "stripe_checkout_created",
        RESOURCE,
        meta,
    )
    .await;
    info!(function = FUNCTION, step = "database_updated", user_id = %caller.id, "Database updated");

    Ok(CheckoutResponse { url })
}

async fn find_or_create_customer(
    state: &AppState,
    caller: &Caller,
    email: &str,
) -> Result<Customer, AppError> {
    if let Some(customer) = state.billing.find_customer_by_email(email).await? {
        info!(function = FUNCTION, step = "customer_found", customer_id = %customer.id, "Found existing customer");
        return Ok(customer);
    }

    let customer = state.billing.create_customer(email, caller.id).await?;
    info!(function = FUNCTION, step = "customer_created", customer_id = %customer.id, "Created new customer");
    Ok(customer)
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}
