//! Caller identity and request-level security helpers shared by all functions.

pub mod oauth_state;
pub mod rate_limit;
pub mod session;

use axum::http::{header, HeaderMap};
use serde::Serialize;
use uuid::Uuid;

use crate::errors::AppError;
use crate::models::audit::NewAuditLogEntry;
use crate::store::Store;

pub use session::SessionVerifier;

/// The authenticated user behind a request.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Caller {
    pub id: Uuid,
    pub email: Option<String>,
}

/// Resolves the caller from `Authorization: Bearer <token>`.
pub async fn authenticate(
    sessions: &dyn SessionVerifier,
    headers: &HeaderMap,
) -> Result<Caller, AppError> {
    let value = headers
        .get(header::AUTHORIZATION)
        .ok_or_else(|| AppError::Authentication("No authorization header".to_string()))?
        .to_str()
        .map_err(|_| AppError::Authentication("Invalid authorization header".to_string()))?;

    let token = value.strip_prefix("Bearer ").unwrap_or(value).trim();
    if token.is_empty() {
        return Err(AppError::Authentication(
            "Invalid authorization header".to_string(),
        ));
    }

    sessions.verify(token).await
}

/// Client details recorded in the audit log.
#[derive(Debug, Clone, PartialEq)]
pub struct RequestMeta {
    pub ip_address: String,
    pub user_agent: String,
    pub origin: Option<String>,
}

impl RequestMeta {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let text = |name: &str| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .map(str::trim)
                .filter(|v| !v.is_empty())
                .map(str::to_string)
        };

        let ip_address = text("x-forwarded-for")
            .and_then(|v| v.split(',').next().map(|hop| hop.trim().to_string()))
            .filter(|v| !v.is_empty())
            .or_else(|| text("x-real-ip"))
            .unwrap_or_else(|| "unknown".to_string());

        Self {
            ip_address,
            user_agent: text("user-agent").unwrap_or_else(|| "unknown".to_string()),
            origin: text("origin").map(|o| o.trim_end_matches('/').to_string()),
        }
    }

    pub fn require_origin(&self) -> Result<&str, AppError> {
        self.origin
            .as_deref()
            .ok_or_else(|| AppError::Validation("Origin header required".to_string()))
    }
}

/// Writes an audit entry. Failures are logged and never fail the request.
pub async fn record_audit(
    store: &dyn Store,
    caller: &Caller,
    action: &'static str,
    resource: &'static str,
    meta: &RequestMeta,
) {
    let entry = NewAuditLogEntry {
        user_id: caller.id,
        action,
        resource,
        ip_address: meta.ip_address.clone(),
        user_agent: meta.user_agent.clone(),
    };

    if let Err(e) = store.insert_audit_log(&entry).await {
        tracing::warn!(action, resource, error = %e, "Audit log failed");
    }
}
