use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::config::StripeConfig;
use crate::errors::AppError;

const PROVIDER: &str = "stripe";
const STRIPE_VERSION: &str = "2023-10-16";
const UNAVAILABLE: &str = "Payment service temporarily unavailable";

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Customer {
    pub id: String,
}

#[derive(Debug, Clone)]
pub struct CheckoutSessionParams<'a> {
    pub customer_id: &'a str,
    pub price_id: &'a str,
    pub success_url: &'a str,
    pub cancel_url: &'a str,
    pub user_id: Uuid,
    pub plan_key: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CheckoutSession {
    pub id: String,
    pub url: Option<String>,
}

/// The provider's view of one subscription.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderSubscription {
    pub id: String,
    pub status: String,
    #[serde(default)]
    pub current_period_start: Option<i64>,
    #[serde(default)]
    pub current_period_end: Option<i64>,
}

impl ProviderSubscription {
    pub fn period_start(&self) -> Option<DateTime<Utc>> {
        self.current_period_start
            .and_then(|s| DateTime::<Utc>::from_timestamp(s, 0))
    }

    pub fn period_end(&self) -> Option<DateTime<Utc>> {
        self.current_period_end
            .and_then(|s| DateTime::<Utc>::from_timestamp(s, 0))
    }
}

/// The payment provider. Every call is a single attempt.
#[async_trait]
pub trait BillingProvider: Send + Sync {
    async fn find_customer_by_email(&self, email: &str) -> Result<Option<Customer>, AppError>;

    async fn create_customer(&self, email: &str, user_id: Uuid) -> Result<Customer, AppError>;

    async fn create_checkout_session(
        &self,
        params: &CheckoutSessionParams<'_>,
    ) -> Result<CheckoutSession, AppError>;

    /// At most one active subscription for the customer.
    async fn active_subscription(
        &self,
        customer_id: &str,
    ) -> Result<Option<ProviderSubscription>, AppError>;
}

#[derive(Debug, Deserialize)]
struct List<T> {
    data: Vec<T>,
}

#[derive(Debug, Deserialize)]
struct StripeErrorEnvelope {
    error: StripeErrorBody,
}

#[derive(Debug, Deserialize)]
struct StripeErrorBody {
    message: String,
}

#[derive(Clone)]
pub struct StripeClient {
    client: Client,
    config: StripeConfig,
}

impl StripeClient {
    pub fn new(client: Client, config: StripeConfig) -> Self {
        Self { client, config }
    }

    fn request(&self, method: reqwest::Method, path: &str) -> Result<RequestBuilder, AppError> {
        let secret = self.config.secret_key.as_deref().ok_or_else(|| {
            AppError::configuration("Stripe secret key not configured", UNAVAILABLE)
        })?;
        let url = format!("{}{path}", self.config.api_url.trim_end_matches('/'));
        Ok(self
            .client
            .request(method, url)
            .bearer_auth(secret)
            .header("Stripe-Version", STRIPE_VERSION))
    }

    async fn send<T: DeserializeOwned>(request: RequestBuilder) -> Result<T, AppError> {
        let response = request
            .send()
            .await
            .map_err(|e| AppError::upstream(PROVIDER, e.to_string(), e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            // Provider messages are returned to the caller as-is.
            let message = serde_json::from_str::<StripeErrorEnvelope>(&body)
                .map(|e| e.error.message)
                .unwrap_or_else(|_| format!("Payment provider returned {status}"));
            return Err(AppError::upstream(
                PROVIDER,
                format!("status {status}: {body}"),
                message,
            ));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| AppError::upstream(PROVIDER, e.to_string(), "Unexpected payment provider response"))
    }
}

#[async_trait]
impl BillingProvider for StripeClient {
    async fn find_customer_by_email(&self, email: &str) -> Result<Option<Customer>, AppError> {
        let request = self
            .request(reqwest::Method::GET, "/v1/customers")?
            .query(&[("email", email), ("limit", "1")]);
        let customers: List<Customer> = Self::send(request).await?;
        Ok(customers.data.into_iter().next())
    }

    async fn create_customer(&self, email: &str, user_id: Uuid) -> Result<Customer, AppError> {
        let user_id = user_id.to_string();
        let request = self
            .request(reqwest::Method::POST, "/v1/customers")?
            .form(&[("email", email), ("metadata[user_id]", user_id.as_str())]);
        Self::send(request).await
    }

    async fn create_checkout_session(
        &self,
        params: &CheckoutSessionParams<'_>,
    ) -> Result<CheckoutSession, AppError> {
        let user_id = params.user_id.to_string();
        let form = [
            ("customer", params.customer_id),
            ("line_items[0][price]", params.price_id),
            ("line_items[0][quantity]", "1"),
            ("mode", "subscription"),
            ("success_url", params.success_url),
            ("cancel_url", params.cancel_url),
            ("allow_promotion_codes", "true"),
            ("billing_address_collection", "required"),
            ("metadata[user_id]", user_id.as_str()),
            ("metadata[plan_type]", params.plan_key),
        ];
        let request = self
            .request(reqwest::Method::POST, "/v1/checkout/sessions")?
            .form(&form);
        Self::send(request).await
    }

    async fn active_subscription(
        &self,
        customer_id: &str,
    ) -> Result<Option<ProviderSubscription>, AppError> {
        let request = self
            .request(reqwest::Method::GET, "/v1/subscriptions")?
            .query(&[("customer", customer_id), ("status", "active"), ("limit", "1")]);
        let subscriptions: List<ProviderSubscription> = Self::send(request).await?;
        Ok(subscriptions.data.into_iter().next())
    }
}
