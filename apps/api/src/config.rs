use anyhow::{Context, Result};

/// Price used for checkout when the `app_config` price table cannot be read.
pub const DEFAULT_STRIPE_PRICE_ID: &str = "price_1Rp4L5FMe63wZBKKVBgzGNfi";
pub const DEFAULT_APP_ORIGIN: &str = "https://procivi.lovable.app";

/// Application configuration loaded from environment variables.
///
/// Only the persistence backend settings are required at startup. Provider
/// credentials are optional here and reported as configuration errors by the
/// operation that needs them, so one missing secret does not take down the
/// other functions.
#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub redis_url: Option<String>,
    pub supabase_url: String,
    pub supabase_service_role_key: String,
    pub linkedin: LinkedInConfig,
    pub stripe: StripeConfig,
    pub anthropic_api_key: Option<String>,
    pub anthropic_api_url: String,
    pub app_origin: String,
    pub port: u16,
    pub rust_log: String,
}

#[derive(Debug, Clone)]
pub struct LinkedInConfig {
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub state_secret: Option<String>,
    pub auth_url: String,
    pub api_url: String,
}

#[derive(Debug, Clone)]
pub struct StripeConfig {
    pub secret_key: Option<String>,
    /// `None` when the fallback price has been disabled with an empty value.
    pub default_price_id: Option<String>,
    pub api_url: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing

        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Builds the configuration from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let require = |key: &str| {
            lookup(key).with_context(|| format!("Required environment variable '{key}' is not set"))
        };
        let optional = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let or_default = |key: &str, default: &str| optional(key).unwrap_or_else(|| default.to_string());

        let default_price_id = match lookup("STRIPE_DEFAULT_PRICE_ID") {
            Some(v) if v.trim().is_empty() => None,
            Some(v) => Some(v),
            None => Some(DEFAULT_STRIPE_PRICE_ID.to_string()),
        };

        Ok(Config {
            database_url: require("DATABASE_URL")?,
            redis_url: optional("REDIS_URL"),
            supabase_url: require("SUPABASE_URL")?,
            supabase_service_role_key: require("SUPABASE_SERVICE_ROLE_KEY")?,
            linkedin: LinkedInConfig {
                client_id: optional("LINKEDIN_CLIENT_ID"),
                client_secret: optional("LINKEDIN_CLIENT_SECRET"),
                state_secret: optional("OAUTH_STATE_SECRET"),
                auth_url: or_default("LINKEDIN_AUTH_URL", "https://www.linkedin.com"),
                api_url: or_default("LINKEDIN_API_URL", "https://api.linkedin.com"),
            },
            stripe: StripeConfig {
                secret_key: optional("STRIPE_SECRET_KEY"),
                default_price_id,
                api_url: or_default("STRIPE_API_URL", "https://api.stripe.com"),
            },
            anthropic_api_key: optional("ANTHROPIC_API_KEY"),
            anthropic_api_url: or_default(
                "ANTHROPIC_API_URL",
                "https://api.anthropic.com/v1/messages",
            ),
            app_origin: or_default("APP_ORIGIN", DEFAULT_APP_ORIGIN),
            port: optional("PORT")
                .unwrap_or_else(|| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: or_default("RUST_LOG", "info"),
        })
    }
}
