// Subscription billing: checkout-session issuance and reconciliation
// against the payment provider.

pub mod checkout;
pub mod handlers;
pub mod prices;
pub mod stripe;
pub mod subscription;

pub use stripe::{BillingProvider, StripeClient};
