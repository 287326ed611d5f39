mod auth;
mod billing;
mod config;
mod cv;
mod db;
mod errors;
mod generation;
mod linkedin;
mod llm_client;
mod models;
mod routes;
mod state;
mod store;
#[cfg(test)]
mod test_util;

use anyhow::Result;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower_http::trace::TraceLayer;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::auth::rate_limit::{InMemoryRateLimiter, RateLimiter, RedisRateLimiter};
use crate::auth::session::SupabaseAuth;
use crate::billing::StripeClient;
use crate::config::Config;
use crate::db::{create_pool, run_migrations};
use crate::linkedin::LinkedInClient;
use crate::llm_client::LlmClient;
use crate::routes::build_router;
use crate::state::AppState;
use crate::store::PgStore;

const HTTP_TIMEOUT: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!("{}={}", env!("CARGO_PKG_NAME"), &config.rust_log))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Procivi API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL
    let db = create_pool(&config.database_url).await?;
    run_migrations(&db).await?;

    // One HTTP client shared by every provider
    let http = reqwest::Client::builder().timeout(HTTP_TIMEOUT).build()?;

    let rate_limiter: Arc<dyn RateLimiter> = match &config.redis_url {
        Some(url) => {
            info!("Rate limiter backed by Redis");
            Arc::new(RedisRateLimiter::new(redis::Client::open(url.as_str())?))
        }
        None => {
            info!("REDIS_URL not set, rate limiter is per-process");
            Arc::new(InMemoryRateLimiter::default())
        }
    };

    let llm = LlmClient::new(
        http.clone(),
        config.anthropic_api_url.clone(),
        config.anthropic_api_key.clone(),
    );
    info!("LLM client initialized (model: {})", llm_client::MODEL);

    // Build app state
    let state = AppState {
        store: Arc::new(PgStore::new(db)),
        sessions: Arc::new(SupabaseAuth::new(
            http.clone(),
            &config.supabase_url,
            config.supabase_service_role_key.clone(),
        )),
        identity: Arc::new(LinkedInClient::new(http.clone(), config.linkedin.clone())),
        billing: Arc::new(StripeClient::new(http, config.stripe.clone())),
        rate_limiter,
        llm,
        config: config.clone(),
    };

    // Build router
    let app = build_router(state).layer(TraceLayer::new_for_http());

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
