//! Subscription reconciliation.
//!
//! The local record is a cache of the provider's state: when the caller has
//! a provider customer, the provider's answer always overwrites the record.

use serde::Serialize;
use tracing::info;

use crate::auth::Caller;
use crate::billing::stripe::ProviderSubscription;
use crate::errors::AppError;
use crate::models::subscription::{PlanType, Reconciliation};
use crate::state::AppState;

pub const FUNCTION: &str = "check-subscription";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SubscriptionCheck {
    pub subscribed: bool,
    pub plan_type: PlanType,
    pub subscription: Option<ProviderSubscription>,
}

impl SubscriptionCheck {
    fn free() -> Self {
        Self {
            subscribed: false,
            plan_type: PlanType::Free,
            subscription: None,
        }
    }
}

pub async fn check_subscription(
    state: &AppState,
    caller: &Caller,
) -> Result<SubscriptionCheck, AppError> {
    let customer_id = state
        .store
        .get_subscription(caller.id)
        .await?
        .and_then(|record| record.stripe_customer_id);

    let Some(customer_id) = customer_id else {
        info!(function = FUNCTION, step = "no_customer", user_id = %caller.id, "No Stripe customer found");
        return Ok(SubscriptionCheck::free());
    };

    match state.billing.active_subscription(&customer_id).await? {
        Some(subscription) => {
            let reconciliation = Reconciliation::Active {
                subscription_id: subscription.id.clone(),
                current_period_start: subscription.period_start(),
                current_period_end: subscription.period_end(),
            };
            state
                .store
                .reconcile_subscription(caller.id, &reconciliation)
                .await?;
            info!(function = FUNCTION, step = "active", subscription_id = %subscription.id, "Updated active subscription");

            Ok(SubscriptionCheck {
                subscribed: true,
                plan_type: PlanType::Premium,
                subscription: Some(subscription),
            })
        }
        None => {
            state
                .store
                .reconcile_subscription(caller.id, &Reconciliation::Inactive)
                .await?;
            info!(function = FUNCTION, step = "inactive", user_id = %caller.id, "Updated inactive subscription");
            Ok(SubscriptionCheck::free())
        }
    }
}
