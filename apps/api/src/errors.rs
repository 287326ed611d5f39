use axum::{
    extract::rejection::PathRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::de::DeserializeOwned;
use serde_json::json;
use thiserror::Error;

/// Application-level error type.
///
/// Variants whose public text differs from the internal detail carry the
/// public text explicitly; nothing at the response boundary inspects the
/// detail string to decide what the caller sees.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Authentication error: {0}")]
    Authentication(String),

    #[error("Configuration error: {detail}")]
    Configuration {
        detail: String,
        public: &'static str,
    },

    #[error("Rate limit exceeded")]
    RateLimited,

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Upstream error ({provider}): {detail}")]
    Upstream {
        provider: &'static str,
        detail: String,
        public: String,
    },

    #[error("Persistence error: {0}")]
    Persistence(String),

    #[error("User already has an active subscription")]
    AlreadySubscribed,

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),
}

impl AppError {
    pub fn configuration(detail: impl Into<String>, public: &'static str) -> Self {
        AppError::Configuration {
            detail: detail.into(),
            public,
        }
    }

    pub fn upstream(
        provider: &'static str,
        detail: impl Into<String>,
        public: impl Into<String>,
    ) -> Self {
        AppError::Upstream {
            provider,
            detail: detail.into(),
            public: public.into(),
        }
    }

    /// Short label used in structured logs.
    pub fn kind(&self) -> &'static str {
        match self {
            AppError::Authentication(_) => "authentication",
            AppError::Configuration { .. } => "configuration",
            AppError::RateLimited => "rate_limit",
            AppError::InvalidState(_) => "invalid_state",
            AppError::Upstream { .. } => "upstream",
            AppError::Persistence(_) => "persistence",
            AppError::AlreadySubscribed => "already_subscribed",
            AppError::Validation(_) => "validation",
            AppError::NotFound(_) => "not_found",
        }
    }

    /// The message that is safe to hand back to a caller.
    pub fn public_message(&self) -> String {
        match self {
            AppError::Authentication(msg) => msg.clone(),
            AppError::Configuration { public, .. } => (*public).to_string(),
            AppError::RateLimited => "Rate limit exceeded. Please try again later.".to_string(),
            AppError::InvalidState(_) => "Invalid or expired state parameter".to_string(),
            AppError::Upstream { public, .. } => public.clone(),
            AppError::Persistence(_) => "Failed to save data".to_string(),
            AppError::AlreadySubscribed => self.to_string(),
            AppError::Validation(msg) => msg.clone(),
            AppError::NotFound(msg) => msg.clone(),
        }
    }
}

impl From<sqlx::Error> for AppError {
    fn from(e: sqlx::Error) -> Self {
        AppError::Persistence(e.to_string())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::Validation(format!("Invalid path parameter: {}", rejection.body_text()))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = match &self {
            AppError::Authentication(_) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED"),
            AppError::Configuration { .. } => {
                (StatusCode::SERVICE_UNAVAILABLE, "SERVICE_UNAVAILABLE")
            }
            AppError::RateLimited => (StatusCode::TOO_MANY_REQUESTS, "RATE_LIMITED"),
            AppError::InvalidState(_) => (StatusCode::BAD_REQUEST, "INVALID_STATE"),
            AppError::Upstream { .. } => (StatusCode::BAD_GATEWAY, "UPSTREAM_ERROR"),
            AppError::Persistence(_) => (StatusCode::INTERNAL_SERVER_ERROR, "DATABASE_ERROR"),
            AppError::AlreadySubscribed => (StatusCode::CONFLICT, "ALREADY_SUBSCRIBED"),
            AppError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            AppError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND"),
        };

        if status.is_server_error() {
            tracing::error!(kind = self.kind(), "{self}");
        }

        let body = Json(json!({
            "error": {
                "code": code,
                "message": self.public_message()
            }
        }));

        (status, body).into_response()
    }
}

/// Error rendering for the integration functions.
///
/// Every failure is logged against the function that produced it and
/// rendered as `500 {"error": "<public message>"}`.
#[derive(Debug)]
pub struct FunctionError {
    pub function: &'static str,
    pub error: AppError,
}

impl FunctionError {
    pub fn new(function: &'static str, error: AppError) -> Self {
        Self { function, error }
    }

    /// Adapter for `map_err` at the top of a function handler.
    pub fn on(function: &'static str) -> impl Fn(AppError) -> FunctionError {
        move |error| FunctionError::new(function, error)
    }
}

impl IntoResponse for FunctionError {
    fn into_response(self) -> Response {
        tracing::error!(
            function = self.function,
            kind = self.error.kind(),
            step = "ERROR",
            "{}",
            self.error
        );

        let body = Json(json!({ "error": self.error.public_message() }));
        (StatusCode::INTERNAL_SERVER_ERROR, body).into_response()
    }
}

/// Decodes a JSON request body, treating an empty body as `{}`.
pub fn parse_body<T: DeserializeOwned>(bytes: &[u8]) -> Result<T, AppError> {
    let bytes = if bytes.iter().all(u8::is_ascii_whitespace) {
        b"{}".as_slice()
    } else {
        bytes
    };
    serde_json::from_slice(bytes).map_err(|e| AppError::Validation(format!("Invalid request body: {e}")))
}
