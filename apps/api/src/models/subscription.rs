use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionStatus {
    Pending,
    Active,
    Inactive,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "text", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum PlanType {
    #[default]
    Free,
    Premium,
}

/// Local mirror of a user's billing state. One row per user.
///
/// The payment provider is authoritative; this row is overwritten on every
/// reconciliation.
#[derive(Debug, Clone, Serialize, FromRow)]
pub struct SubscriptionRecord {
    pub user_id: Uuid,
    pub stripe_customer_id: Option<String>,
    pub stripe_subscription_id: Option<String>,
    pub status: SubscriptionStatus,
    pub plan_type: PlanType,
    pub current_period_start: Option<DateTime<Utc>>,
    pub current_period_end: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

impl SubscriptionRecord {
    /// A user may open a new checkout unless they already hold an active paid plan.
    pub fn allows_checkout(&self) -> bool {
        self.status != SubscriptionStatus::Active || self.plan_type == PlanType::Free
    }
}

/// Provider view written back to the local record during reconciliation.
#[derive(Debug, Clone, PartialEq)]
pub enum Reconciliation {
    Active {
        subscription_id: String,
        current_period_start: Option<DateTime<Utc>>,
        current_period_end: Option<DateTime<Utc>>,
    },
    Inactive,
}
