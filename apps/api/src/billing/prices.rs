//! Price lookup for checkout plans.

use serde_json::Value;
use tracing::warn;

use crate::store::Store;

/// `app_config` key holding `{plan_key: price_id}`.
pub const PRICE_TABLE_KEY: &str = "stripe_prices";

/// Outcome of reading a configuration value that has a fallback.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigResolution<T> {
    Found(T),
    UsingDefault(T),
    Missing,
}

impl<T> ConfigResolution<T> {
    pub fn into_value(self) -> Option<T> {
        match self {
            ConfigResolution::Found(v) | ConfigResolution::UsingDefault(v) => Some(v),
            ConfigResolution::Missing => None,
        }
    }

    pub fn is_degraded(&self) -> bool {
        !matches!(self, ConfigResolution::Found(_))
    }
}

/// Looks up the price for `plan_key`, falling back to `default` when the
/// table is unreadable, absent, or has no entry for the plan.
pub async fn resolve_price_id(
    store: &dyn Store,
    plan_key: &str,
    default: Option<&str>,
) -> ConfigResolution<String> {
    let lookup = match store.get_app_config(PRICE_TABLE_KEY).await {
        Ok(Some(table)) => price_from_table(&table, plan_key),
        Ok(None) => Err("price configuration not found".to_string()),
        Err(e) => Err(e.to_string()),
    };

    match (lookup, default) {
        (Ok(price), _) => ConfigResolution::Found(price),
        (Err(reason), Some(default)) => {
            warn!(plan_key, reason = %reason, "Failed to get price from config, using default");
            ConfigResolution::UsingDefault(default.to_string())
        }
        (Err(reason), None) => {
            warn!(plan_key, reason = %reason, "Failed to get price from config, no default");
            ConfigResolution::Missing
        }
    }
}

fn price_from_table(table: &Value, plan_key: &str) -> Result<String, String> {
    table
        .get(plan_key)
        .and_then(Value::as_str)
        .filter(|id| !id.is_empty())
        .map(str::to_string)
        .ok_or_else(|| format!("Price ID not found for plan: {plan_key}"))
}
