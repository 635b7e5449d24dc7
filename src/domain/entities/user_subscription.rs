use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use uuid::Uuid;

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    AsRefStr,
    Display,
    EnumString,
    sqlx::Type,
)]
#[sqlx(type_name = "subscription_status", rename_all = "lowercase")]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
pub enum SubscriptionStatus {
    Active,
    Expired,
    Cancelled,
    Pending,
}

/// One user's enrollment in a plan for a time window. Rows are never deleted,
/// only moved out of `Active`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserSubscription {
    pub id: Uuid,
    pub user_id: Uuid,
    pub plan_id: Uuid,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub status: SubscriptionStatus,
    pub payment_id: Option<String>,
    pub transaction_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserSubscription {
    /// A fresh ACTIVE enrollment running from `now` until `end_date`.
    pub fn start(
        user_id: Uuid,
        plan_id: Uuid,
        end_date: DateTime<Utc>,
        payment_id: String,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            user_id,
            plan_id,
            start_date: now,
            end_date,
            status: SubscriptionStatus::Active,
            payment_id: Some(payment_id),
            transaction_id: Some(Uuid::new_v4().to_string()),
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        self.status == SubscriptionStatus::Active && now < self.end_date
    }

    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.end_date || self.status == SubscriptionStatus::Expired
    }

    pub fn days_remaining(&self, now: DateTime<Utc>) -> i64 {
        if self.end_date <= now {
            return 0;
        }
        (self.end_date - now).num_days().max(0)
    }

    /// Ends the subscription effective immediately.
    pub fn cancel(&mut self, now: DateTime<Utc>) {
        self.status = SubscriptionStatus::Cancelled;
        self.end_date = now;
        self.updated_at = now;
    }

    /// Replaced by a newer subscription. Unlike `cancel`, the end date stays as
    /// it was so history keeps the original term.
    pub fn supersede(&mut self, now: DateTime<Utc>) {
        self.status = SubscriptionStatus::Cancelled;
        self.updated_at = now;
    }
}
