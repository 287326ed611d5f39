use std::sync::Arc;

use crate::auth::rate_limit::RateLimiter;
use crate::auth::SessionVerifier;
use crate::billing::BillingProvider;
use crate::config::Config;
use crate::linkedin::IdentityProvider;
use crate::llm_client::LlmClient;
use crate::store::Store;

/// Shared application state injected into all route handlers via Axum extractors.
#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub store: Arc<dyn Store>,
    pub sessions: Arc<dyn SessionVerifier>,
    /// Profile provider. Default: LinkedInClient.
    pub identity: Arc<dyn IdentityProvider>,
    /// Payment provider. Default: StripeClient.
    pub billing: Arc<dyn BillingProvider>,
    /// Redis-backed when REDIS_URL is set, in-process otherwise.
    pub rate_limiter: Arc<dyn RateLimiter>,
    pub llm: LlmClient,
}
