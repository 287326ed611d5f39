use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use uuid::Uuid;

use crate::auth::Caller;
use crate::errors::AppError;

/// Resolves a caller's bearer token to a user.
#[async_trait]
pub trait SessionVerifier: Send + Sync {
    async fn verify(&self, token: &str) -> Result<Caller, AppError>;
}

#[derive(Debug, Deserialize)]
struct AuthUserResponse {
    id: Uuid,
    #[serde(default)]
    email: Option<String>,
}

#[derive(Debug, Deserialize)]
struct AuthErrorResponse {
    #[serde(alias = "msg", alias = "error_description")]
    message: String,
}

/// Verifies sessions against the hosted auth backend (`GET /auth/v1/user`).
#[derive(Clone)]
pub struct SupabaseAuth {
    client: Client,
    base_url: String,
    service_key: String,
}

impl SupabaseAuth {
    pub fn new(client: Client, base_url: &str, service_key: String) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            service_key,
        }
    }
}

#[async_trait]
impl SessionVerifier for SupabaseAuth {
    async fn verify(&self, token: &str) -> Result<Caller, AppError> {
        let response = self
            .client
            .get(format!("{}/auth/v1/user", self.base_url))
            .header("apikey", &self.service_key)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| AppError::Authentication(format!("Auth error: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<AuthErrorResponse>(&body)
                .map(|e| e.message)
                .unwrap_or_else(|_| format!("status {status}"));
            return Err(AppError::Authentication(format!("Auth error: {message}")));
        }

        let user: AuthUserResponse = response
            .json()
            .await
            .map_err(|e| AppError::Authentication(format!("Auth error: {e}")))?;

        Ok(Caller {
            id: user.id,
            email: user.email.filter(|e| !e.is_empty()),
        })
    }
}
