use async_trait::async_trait;
use reqwest::{Client, Url};
use serde::Deserialize;
use tracing::warn;

use crate::config::LinkedInConfig;
use crate::errors::AppError;
use crate::linkedin::profile::RawProfile;

const PROVIDER: &str = "linkedin";
const SCOPE: &str = "profile email";
const PROFILE_PROJECTION: &str =
    "(id,firstName,lastName,profilePicture(displayImage~:playableStreams))";
const UNAVAILABLE: &str = "Authentication service temporarily unavailable";

/// The third-party identity provider used for profile import.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Builds the provider's consent URL.
    fn authorization_url(&self, redirect_uri: &str, state: &str) -> Result<String, AppError>;

    /// Trades an authorization code for an access token. Single attempt.
    async fn exchange_code(&self, code: &str, redirect_uri: &str) -> Result<String, AppError>;

    async fn fetch_profile(&self, access_token: &str) -> Result<RawProfile, AppError>;
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Clone)]
pub struct LinkedInClient {
    client: Client,
    config: LinkedInConfig,
}

impl LinkedInClient {
    pub fn new(client: Client, config: LinkedInConfig) -> Self {
        Self { client, config }
    }

    fn client_id(&self) -> Result<&str, AppError> {
        self.config
            .client_id
            .as_deref()
            .ok_or_else(|| AppError::configuration("LinkedIn client ID not configured", UNAVAILABLE))
    }

    fn credentials(&self) -> Result<(&str, &str), AppError> {
        match (&self.config.client_id, &self.config.client_secret) {
            (Some(id), Some(secret)) => Ok((id.as_str(), secret.as_str())),
            _ => Err(AppError::configuration(
                "LinkedIn credentials not configured",
                UNAVAILABLE,
            )),
        }
    }

    fn endpoint(base: &str, path: &str) -> String {
        format!("{}{path}", base.trim_end_matches('/'))
    }
}

#[async_trait]
impl IdentityProvider for LinkedInClient {
    fn authorization_url(&self, redirect_uri: &str, state: &str) -> Result<String, AppError> {
        let client_id = self.client_id()?;
        let url = Url::parse_with_params(
            &Self::endpoint(&self.config.auth_url, "/oauth/v2/authorization"),
            &[
                ("response_type", "code"),
                ("client_id", client_id),
                ("redirect_uri", redirect_uri),
                ("scope", SCOPE),
                ("state", state),
            ],
        )
        .map_err(|e| AppError::configuration(format!("invalid LinkedIn auth URL: {e}"), UNAVAILABLE))?;
        Ok(url.to_string())
    }

    async fn exchange_code(&self, code: &str, redirect_uri: &str) -> Result<String, AppError> {
        let (client_id, client_secret) = self.credentials()?;

        let response = self
            .client
            .post(Self::endpoint(&self.config.auth_url, "/oauth/v2/accessToken"))
            .form(&[
                ("grant_type", "authorization_code"),
                ("code", code),
                ("client_id", client_id),
                ("client_secret", client_secret),
                ("redirect_uri", redirect_uri),
            ])
            .send()
            .await
            .map_err(|e| AppError::upstream(PROVIDER, e.to_string(), "Failed to exchange code for token"))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(AppError::upstream(
                PROVIDER,
                format!("token exchange returned {status}: {body}"),
                "Failed to exchange code for token",
            ));
        }

        let token: TokenResponse = response.json().await.map_err(|e| {
            AppError::upstream(PROVIDER, e.to_string(), "Failed to exchange code for token")
        })?;
        Ok(token.access_token)
    }

    async fn fetch_profile(&self, access_token: &str) -> Result<RawProfile, AppError> {
        let response = self
            .client
            .get(Self::endpoint(&self.config.api_url, "/v2/me"))
            .query(&[("projection", PROFILE_PROJECTION)])
            .bearer_auth(access_token)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| AppError::upstream(PROVIDER, e.to_string(), "Failed to fetch LinkedIn profile"))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), "Profile fetch failed");
            return Err(AppError::upstream(
                PROVIDER,
                format!("profile fetch returned {status}: {body}"),
                "Failed to fetch LinkedIn profile",
            ));
        }

        response.json::<RawProfile>().await.map_err(|e| {
            AppError::upstream(PROVIDER, e.to_string(), "Failed to fetch LinkedIn profile")
        })
    }
}
