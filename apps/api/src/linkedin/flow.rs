//! Profile-linking flow.
//!
//! `get_auth_url` hands out a consent URL whose `state` is signed for the
//! caller; `exchange_code` accepts the provider's code only alongside a state
//! that verifies for the same caller, then imports the sanitized profile.

use serde::Serialize;
use tracing::info;

use crate::auth::oauth_state::StateSigner;
use crate::auth::rate_limit::LINKEDIN_AUTH_POLICY;
use crate::auth::{record_audit, Caller, RequestMeta};
use crate::config::LinkedInConfig;
use crate::errors::AppError;
use crate::linkedin::profile::SanitizedProfile;
use crate::state::AppState;

pub const FUNCTION: &str = "linkedin-auth";
const RESOURCE: &str = "linkedin_auth";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthUrlResponse {
    pub auth_url: String,
}

#[derive(Debug, Serialize)]
pub struct ImportResponse {
    pub success: bool,
    pub profile: SanitizedProfile,
}

fn state_signer(config: &LinkedInConfig) -> Result<StateSigner, AppError> {
    config
        .state_secret
        .as_deref()
        .map(StateSigner::new)
        .ok_or_else(|| {
            AppError::configuration(
                "OAuth state secret not configured",
                "Authentication service temporarily unavailable",
            )
        })
}

fn redirect_uri(origin: &str) -> String {
    format!("{origin}/linkedin-callback")
}

pub async fn get_auth_url(
    state: &AppState,
    caller: &Caller,
    meta: &RequestMeta,
) -> Result<AuthUrlResponse, AppError> {
    let key = format!("linkedin_auth:{}", caller.id);
    if !state.rate_limiter.check(&key, LINKEDIN_AUTH_POLICY).await? {
        return Err(AppError::RateLimited);
    }

    let signer = state_signer(&state.config.linkedin)?;
    let origin = meta.require_origin()?;
    let auth_url = state
        .identity
        .authorization_url(&redirect_uri(origin), &signer.issue(caller.id))?;

    info!(function = FUNCTION, step = "auth_url_generated", user_id = %caller.id, "Generated LinkedIn auth URL");
    record_audit(
        state.store.as_ref(),
        caller,
        "linkedin_auth_url_generated",
        RESOURCE,
        meta,
    )
    .await;

    Ok(AuthUrlResponse { auth_url })
}

pub async fn exchange_code(
    state: &AppState,
    caller: &Caller,
    meta: &RequestMeta,
    code: &str,
    oauth_state: Option<&str>,
) -> Result<ImportResponse, AppError> {
    let signer = state_signer(&state.config.linkedin)?;
    let oauth_state = oauth_state
        .filter(|s| !s.is_empty())
        .ok_or_else(|| AppError::InvalidState("state parameter missing".to_string()))?;
    signer.verify(oauth_state, caller.id)?;

    let origin = meta.require_origin()?;

    info!(function = FUNCTION, step = "exchanging_code", user_id = %caller.id, "Exchanging code for access token");
    let access_token = state
        .identity
        .exchange_code(code, &redirect_uri(origin))
        .await?;

    let raw = state.identity.fetch_profile(&access_token).await?;
    let profile = SanitizedProfile::from(raw);
    info!(function = FUNCTION, step = "profile_fetched", profile_id = %profile.id, "Fetched LinkedIn profile");

    let import_data = serde_json::to_value(&profile)
        .map_err(|e| AppError::Persistence(format!("could not encode profile: {e}")))?;
    state
        .store
        .insert_linkedin_import(caller.id, &import_data)
        .await?;

    record_audit(
        state.store.as_ref(),
        caller,
        "linkedin_profile_imported",
        RESOURCE,
        meta,
    )
    .await;
    info!(function = FUNCTION, step = "import_saved", user_id = %caller.id, "Saved LinkedIn import data");

    Ok(ImportResponse {
        success: true,
        profile,
    })
}
