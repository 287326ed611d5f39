//! In-memory doubles for the persistence and provider seams.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use serde_json::{json, Value};
use sqlx::types::Json;
use uuid::Uuid;
use wiremock::MockServer;

use crate::auth::rate_limit::InMemoryRateLimiter;
use crate::auth::{Caller, SessionVerifier};
use crate::billing::stripe::{CheckoutSession, CheckoutSessionParams, Customer, ProviderSubscription};
use crate::billing::BillingProvider;
use crate::config::{Config, LinkedInConfig, StripeConfig, DEFAULT_APP_ORIGIN, DEFAULT_STRIPE_PRICE_ID};
use crate::errors::AppError;
use crate::linkedin::profile::RawProfile;
use crate::linkedin::IdentityProvider;
use crate::llm_client::LlmClient;
use crate::models::audit::NewAuditLogEntry;
use crate::models::cv::{CvDocument, CvUpdate, NewCvDocument};
use crate::models::generation::{GenerationKind, GenerationRow};
use crate::models::linkedin::LinkedInImportRow;
use crate::models::subscription::{PlanType, Reconciliation, SubscriptionRecord, SubscriptionStatus};
use crate::state::AppState;
use crate::store::Store;

// ────────────────────────────────────────────────────────────────────────────
// Store
// ────────────────────────────────────────────────────────────────────────────

#[derive(Default)]
struct Tables {
    subscriptions: HashMap<Uuid, SubscriptionRecord>,
    app_config: HashMap<String, Value>,
    linkedin_imports: Vec<LinkedInImportRow>,
    audit: Vec<NewAuditLogEntry>,
    cvs: Vec<CvDocument>,
    generations: Vec<GenerationRow>,
}

#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
}

impl MemoryStore {
    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    pub fn set_app_config(&self, key: &str, value: Value) {
        self.lock().app_config.insert(key.to_string(), value);
    }

    pub fn seed_subscription(
        &self,
        user_id: Uuid,
        customer_id: &str,
        status: SubscriptionStatus,
        plan_type: PlanType,
    ) {
        self.lock().subscriptions.insert(
            user_id,
            SubscriptionRecord {
                user_id,
                stripe_customer_id: Some(customer_id.to_string()),
                stripe_subscription_id: None,
                status,
                plan_type,
                current_period_start: None,
                current_period_end: None,
                updated_at: Utc::now(),
            },
        );
    }

    pub fn subscription(&self, user_id: Uuid) -> Option<SubscriptionRecord> {
        self.lock().subscriptions.get(&user_id).cloned()
    }

    pub fn audit_entries(&self) -> Vec<NewAuditLogEntry> {
        self.lock().audit.clone()
    }

    pub fn linkedin_imports(&self) -> Vec<LinkedInImportRow> {
        self.lock().linkedin_imports.clone()
    }

    pub fn generations(&self) -> Vec<GenerationRow> {
        self.lock().generations.clone()
    }

    pub fn cvs_for(&self, user_id: Uuid) -> Vec<CvDocument> {
        self.lock()
            .cvs
            .iter()
            .filter(|cv| cv.user_id == user_id)
            .cloned()
            .collect()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Tables> {
        self.tables.lock().unwrap()
    }

    fn read(&self) -> Result<std::sync::MutexGuard<'_, Tables>, AppError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(AppError::Persistence("read failed".to_string()));
        }
        Ok(self.lock())
    }

    fn write(&self) -> Result<std::sync::MutexGuard<'_, Tables>, AppError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(AppError::Persistence("write failed".to_string()));
        }
        Ok(self.lock())
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn get_subscription(
        &self,
        user_id: Uuid,
    ) -> Result<Option<SubscriptionRecord>, AppError> {
        Ok(self.read()?.subscriptions.get(&user_id).cloned())
    }

    async fn upsert_pending_subscription(
        &self,
        user_id: Uuid,
        customer_id: &str,
    ) -> Result<(), AppError> {
        let mut tables = self.write()?;
        let record = tables
            .subscriptions
            .entry(user_id)
            .or_insert_with(|| SubscriptionRecord {
                user_id,
                stripe_customer_id: None,
                stripe_subscription_id: None,
                status: SubscriptionStatus::Pending,
                plan_type: PlanType::Free,
                current_period_start: None,
                current_period_end: None,
                updated_at: Utc::now(),
            });
        record.stripe_customer_id = Some(customer_id.to_string());
        record.status = SubscriptionStatus::Pending;
        record.plan_type = PlanType::Free;
        record.updated_at = Utc::now();
        Ok(())
    }

    async fn reconcile_subscription(
        &self,
        user_id: Uuid,
        reconciliation: &Reconciliation,
    ) -> Result<(), AppError> {
        let mut tables = self.write()?;
        let Some(record) = tables.subscriptions.get_mut(&user_id) else {
            return Ok(());
        };
        match reconciliation {
            Reconciliation::Active {
                subscription_id,
                current_period_start,
                current_period_end,
            } => {
                record.stripe_subscription_id = Some(subscription_id.clone());
                record.status = SubscriptionStatus::Active;
                record.plan_type = PlanType::Premium;
                record.current_period_start = *current_period_start;
                record.current_period_end = *current_period_end;
            }
            Reconciliation::Inactive => {
                record.status = SubscriptionStatus::Inactive;
                record.plan_type = PlanType::Free;
            }
        }
        record.updated_at = Utc::now();
        Ok(())
    }

    async fn get_app_config(&self, key: &str) -> Result<Option<Value>, AppError> {
        Ok(self.read()?.app_config.get(key).cloned())
    }

    async fn insert_linkedin_import(
        &self,
        user_id: Uuid,
        import_data: &Value,
    ) -> Result<LinkedInImportRow, AppError> {
        let row = LinkedInImportRow {
            id: Uuid::new_v4(),
            user_id,
            import_data: import_data.clone(),
            status: "completed".to_string(),
            created_at: Utc::now(),
        };
        self.write()?.linkedin_imports.push(row.clone());
        Ok(row)
    }

    async fn insert_audit_log(&self, entry: &NewAuditLogEntry) -> Result<(), AppError> {
        self.write()?.audit.push(entry.clone());
        Ok(())
    }

    async fn insert_cv(&self, cv: &NewCvDocument) -> Result<CvDocument, AppError> {
        let now = Utc::now();
        let document = CvDocument {
            id: Uuid::new_v4(),
            user_id: cv.user_id,
            title: cv.title.clone(),
            content: Json(cv.content.clone()),
            template_type: cv.template_type.clone(),
            status: cv.status,
            created_at: now,
            updated_at: now,
        };
        self.write()?.cvs.push(document.clone());
        Ok(document)
    }

    async fn list_cvs(&self, user_id: Uuid) -> Result<Vec<CvDocument>, AppError> {
        // Insertion order is creation order.
        Ok(self
            .read()?
            .cvs
            .iter()
            .rev()
            .filter(|cv| cv.user_id == user_id)
            .cloned()
            .collect())
    }

    async fn get_cv(&self, user_id: Uuid, id: Uuid) -> Result<Option<CvDocument>, AppError> {
        Ok(self
            .read()?
            .cvs
            .iter()
            .find(|cv| cv.id == id && cv.user_id == user_id)
            .cloned())
    }

    async fn update_cv(
        &self,
        user_id: Uuid,
        id: Uuid,
        update: &CvUpdate,
    ) -> Result<Option<CvDocument>, AppError> {
        let mut tables = self.write()?;
        let Some(cv) = tables
            .cvs
            .iter_mut()
            .find(|cv| cv.id == id && cv.user_id == user_id)
        else {
            return Ok(None);
        };
        if let Some(title) = &update.title {
            cv.title = title.clone();
        }
        if let Some(content) = &update.content {
            cv.content = Json(content.clone());
        }
        if let Some(template_type) = &update.template_type {
            cv.template_type = template_type.clone();
        }
        if let Some(status) = update.status {
            cv.status = status;
        }
        cv.updated_at = Utc::now();
        Ok(Some(cv.clone()))
    }

    async fn delete_cv(&self, user_id: Uuid, id: Uuid) -> Result<bool, AppError> {
        let mut tables = self.write()?;
        let before = tables.cvs.len();
        tables.cvs.retain(|cv| !(cv.id == id && cv.user_id == user_id));
        Ok(tables.cvs.len() < before)
    }

    async fn insert_generation(
        &self,
        user_id: Uuid,
        kind: GenerationKind,
        input: &Value,
        content: &str,
    ) -> Result<GenerationRow, AppError> {
        let row = GenerationRow {
            id: Uuid::new_v4(),
            user_id,
            kind,
            input: input.clone(),
            content: content.to_string(),
            created_at: Utc::now(),
        };
        self.write()?.generations.push(row.clone());
        Ok(row)
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Sessions
// ────────────────────────────────────────────────────────────────────────────

#[derive(Default)]
pub struct FakeSessions {
    tokens: Mutex<HashMap<String, Caller>>,
}

impl FakeSessions {
    pub fn register(&self, token: &str, email: Option<&str>) -> Caller {
        let caller = Caller {
            id: Uuid::new_v4(),
            email: email.map(str::to_string),
        };
        self.tokens
            .lock()
            .unwrap()
            .insert(token.to_string(), caller.clone());
        caller
    }
}

#[async_trait]
impl SessionVerifier for FakeSessions {
    async fn verify(&self, token: &str) -> Result<Caller, AppError> {
        self.tokens
            .lock()
            .unwrap()
            .get(token)
            .cloned()
            .ok_or_else(|| AppError::Authentication("Auth error: invalid JWT".to_string()))
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Identity provider
// ────────────────────────────────────────────────────────────────────────────

pub struct FakeIdentity {
    configured: AtomicBool,
    fail_exchange: AtomicBool,
    profile: Mutex<Value>,
    redirects: Mutex<Vec<String>>,
}

impl Default for FakeIdentity {
    fn default() -> Self {
        Self {
            configured: AtomicBool::new(true),
            fail_exchange: AtomicBool::new(false),
            profile: Mutex::new(json!({
                "id": "li-1",
                "firstName": {"localized": {"en_US": "Test"}},
                "lastName": {"localized": {"en_US": "User"}}
            })),
            redirects: Mutex::new(Vec::new()),
        }
    }
}

impl FakeIdentity {
    pub fn set_configured(&self, configured: bool) {
        self.configured.store(configured, Ordering::SeqCst);
    }

    pub fn fail_exchange(&self, fail: bool) {
        self.fail_exchange.store(fail, Ordering::SeqCst);
    }

    pub fn set_profile(&self, profile: Value) {
        *self.profile.lock().unwrap() = profile;
    }

    pub fn exchanged_redirects(&self) -> Vec<String> {
        self.redirects.lock().unwrap().clone()
    }

    fn ensure_configured(&self) -> Result<(), AppError> {
        if self.configured.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(AppError::configuration(
                "LinkedIn client id not configured",
                "Authentication service temporarily unavailable",
            ))
        }
    }
}

#[async_trait]
impl IdentityProvider for FakeIdentity {
    fn authorization_url(&self, redirect_uri: &str, state: &str) -> Result<String, AppError> {
        self.ensure_configured()?;
        let url = reqwest::Url::parse_with_params(
            "https://www.linkedin.com/oauth/v2/authorization",
            &[
                ("response_type", "code"),
                ("client_id", "test-client"),
                ("redirect_uri", redirect_uri),
                ("state", state),
                ("scope", "profile email"),
            ],
        )
        .map_err(|e| AppError::configuration(e.to_string(), "Authentication service temporarily unavailable"))?;
        Ok(url.to_string())
    }

    async fn exchange_code(&self, _code: &str, redirect_uri: &str) -> Result<String, AppError> {
        self.ensure_configured()?;
        if self.fail_exchange.load(Ordering::SeqCst) {
            return Err(AppError::upstream(
                "linkedin",
                "status 400: invalid_grant",
                "Failed to exchange code for token",
            ));
        }
        self.redirects.lock().unwrap().push(redirect_uri.to_string());
        Ok("access-token".to_string())
    }

    async fn fetch_profile(&self, _access_token: &str) -> Result<RawProfile, AppError> {
        let profile = self.profile.lock().unwrap().clone();
        serde_json::from_value(profile).map_err(|e| {
            AppError::upstream("linkedin", e.to_string(), "Failed to fetch LinkedIn profile")
        })
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Billing provider
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct RecordedSession {
    pub customer_id: String,
    pub price_id: String,
    pub success_url: String,
    pub cancel_url: String,
    pub plan_key: String,
}

#[derive(Default)]
pub struct FakeBilling {
    customers: Mutex<HashMap<String, String>>,
    created_customers: AtomicUsize,
    sessions: Mutex<Vec<RecordedSession>>,
    subscriptions: Mutex<HashMap<String, ProviderSubscription>>,
    calls: AtomicUsize,
    failure: Mutex<Option<String>>,
}

impl FakeBilling {
    pub fn add_customer(&self, email: &str, customer_id: &str) {
        self.customers
            .lock()
            .unwrap()
            .insert(email.to_string(), customer_id.to_string());
    }

    pub fn set_active_subscription(
        &self,
        customer_id: &str,
        subscription_id: &str,
        period_start: i64,
        period_end: i64,
    ) {
        self.subscriptions.lock().unwrap().insert(
            customer_id.to_string(),
            ProviderSubscription {
                id: subscription_id.to_string(),
                status: "active".to_string(),
                current_period_start: Some(period_start),
                current_period_end: Some(period_end),
            },
        );
    }

    /// Every later call fails with `message` as the provider's error text.
    pub fn fail_with(&self, message: &str) {
        *self.failure.lock().unwrap() = Some(message.to_string());
    }

    pub fn sessions(&self) -> Vec<RecordedSession> {
        self.sessions.lock().unwrap().clone()
    }

    pub fn created_customers(&self) -> usize {
        self.created_customers.load(Ordering::SeqCst)
    }

    /// Number of provider calls of any kind.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn begin_call(&self) -> Result<(), AppError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.failure.lock().unwrap().as_deref() {
            Some(message) => Err(AppError::upstream("stripe", message, message)),
            None => Ok(()),
        }
    }
}

#[async_trait]
impl BillingProvider for FakeBilling {
    async fn find_customer_by_email(&self, email: &str) -> Result<Option<Customer>, AppError> {
        self.begin_call()?;
        Ok(self
            .customers
            .lock()
            .unwrap()
            .get(email)
            .map(|id| Customer { id: id.clone() }))
    }

    async fn create_customer(&self, email: &str, _user_id: Uuid) -> Result<Customer, AppError> {
        self.begin_call()?;
        let n = self.created_customers.fetch_add(1, Ordering::SeqCst) + 1;
        let id = format!("cus_new_{n}");
        self.add_customer(email, &id);
        Ok(Customer { id })
    }

    async fn create_checkout_session(
        &self,
        params: &CheckoutSessionParams<'_>,
    ) -> Result<CheckoutSession, AppError> {
        self.begin_call()?;
        let mut sessions = self.sessions.lock().unwrap();
        sessions.push(RecordedSession {
            customer_id: params.customer_id.to_string(),
            price_id: params.price_id.to_string(),
            success_url: params.success_url.to_string(),
            cancel_url: params.cancel_url.to_string(),
            plan_key: params.plan_key.to_string(),
        });
        let id = format!("cs_test_{}", sessions.len());
        Ok(CheckoutSession {
            url: Some(format!("https://checkout.example.com/{id}")),
            id,
        })
    }

    async fn active_subscription(
        &self,
        customer_id: &str,
    ) -> Result<Option<ProviderSubscription>, AppError> {
        self.begin_call()?;
        Ok(self.subscriptions.lock().unwrap().get(customer_id).cloned())
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Application state
// ────────────────────────────────────────────────────────────────────────────

pub struct TestHarness {
    pub state: AppState,
    pub store: Arc<MemoryStore>,
    pub sessions: Arc<FakeSessions>,
    pub identity: Arc<FakeIdentity>,
    pub billing: Arc<FakeBilling>,
}

impl TestHarness {
    pub fn caller() -> Caller {
        Caller {
            id: Uuid::new_v4(),
            email: Some("user@example.com".to_string()),
        }
    }
}

pub fn test_config() -> Config {
    Config {
        database_url: "postgres://localhost/procivi_test".to_string(),
        redis_url: None,
        supabase_url: "http://127.0.0.1:9".to_string(),
        supabase_service_role_key: "service-key".to_string(),
        linkedin: LinkedInConfig {
            client_id: Some("test-client".to_string()),
            client_secret: Some("test-secret".to_string()),
            state_secret: Some("test-state-secret".to_string()),
            auth_url: "https://www.linkedin.com".to_string(),
            api_url: "https://api.linkedin.com".to_string(),
        },
        stripe: StripeConfig {
            secret_key: Some("sk_test".to_string()),
            default_price_id: Some(DEFAULT_STRIPE_PRICE_ID.to_string()),
            api_url: "http://127.0.0.1:9".to_string(),
        },
        anthropic_api_key: Some("test-key".to_string()),
        anthropic_api_url: "http://127.0.0.1:9/v1/messages".to_string(),
        app_origin: DEFAULT_APP_ORIGIN.to_string(),
        port: 8080,
        rust_log: "debug".to_string(),
    }
}

pub fn test_state() -> TestHarness {
    build_harness(test_config())
}

/// Like `test_state`, with the LLM client pointed at `server`.
pub fn test_state_with_llm(server: &MockServer) -> TestHarness {
    let mut config = test_config();
    config.anthropic_api_url = format!("{}/v1/messages", server.uri());
    build_harness(config)
}

fn build_harness(config: Config) -> TestHarness {
    let store = Arc::new(MemoryStore::default());
    let sessions = Arc::new(FakeSessions::default());
    let identity = Arc::new(FakeIdentity::default());
    let billing = Arc::new(FakeBilling::default());
    let llm = LlmClient::new(
        Client::new(),
        config.anthropic_api_url.clone(),
        config.anthropic_api_key.clone(),
    );

    let state = AppState {
        config,
        store: store.clone(),
        sessions: sessions.clone(),
        identity: identity.clone(),
        billing: billing.clone(),
        rate_limiter: Arc::new(InMemoryRateLimiter::default()),
        llm,
    };

    TestHarness {
        state,
        store,
        sessions,
        identity,
        billing,
    }
}
