//! Subscription and usage domain types.

use chrono::{DateTime, Utc};
use serde::Serialize;

use mealmind_core::{SubscriptionId, SubscriptionStatus, UserId};

/// Payment provider recorded on subscriptions.
pub const PAYPAL_PROVIDER: &str = "paypal";

/// A user's paid subscription record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Subscription {
    pub id: SubscriptionId,
    pub user_id: UserId,
    pub status: SubscriptionStatus,
    pub payment_provider: String,
    pub paypal_subscription_id: Option<String>,
    pub current_period_end: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
}

/// Subscription state and generation usage, as shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UsageSummary {
    pub subscription: Option<Subscription>,
    pub generation_count: u32,
    pub free_generation_limit: u32,
    pub remaining_free_generations: u32,
    /// Whether the next generation would be refused.
    pub paywalled: bool,
}

impl UsageSummary {
    #[must_use]
    pub fn new(subscription: Option<Subscription>, generation_count: u32, limit: u32) -> Self {
        let active = subscription
            .as_ref()
            .is_some_and(|s| s.status.is_active());
        Self {
            subscription,
            generation_count,
            free_generation_limit: limit,
            remaining_free_generations: limit.saturating_sub(generation_count),
            paywalled: !active && generation_count >= limit,
        }
    }
}
