use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::{app_error::AppResult, domain::entities::user_subscription::UserSubscription};

#[async_trait]
pub trait UserSubscriptionRepo: Send + Sync {
    /// ACTIVE rows of the user with `end_date > as_of`, latest `end_date` first.
    async fn list_active(
        &self,
        user_id: Uuid,
        as_of: DateTime<Utc>,
    ) -> AppResult<Vec<UserSubscription>>;

    /// Most recently created row regardless of status.
    async fn find_latest(&self, user_id: Uuid) -> AppResult<Option<UserSubscription>>;

    /// All rows of the user, newest first.
    async fn list_by_user(&self, user_id: Uuid) -> AppResult<Vec<UserSubscription>>;

    async fn find_by_payment_id(&self, payment_id: &str) -> AppResult<Option<UserSubscription>>;

    /// Insert or update by id.
    async fn save(&self, subscription: &UserSubscription) -> AppResult<UserSubscription>;

    /// Cancels every live ACTIVE row of `replacement.user_id` (status only, the
    /// paid-for end date is kept), expires its lapsed ACTIVE rows and inserts `replacement`, all in one
    /// unit of work. Returns the ids of the cancelled rows.
    async fn supersede_and_insert(
        &self,
        replacement: &UserSubscription,
        now: DateTime<Utc>,
    ) -> AppResult<Vec<Uuid>>;

    /// ACTIVE rows whose `end_date < as_of`.
    async fn list_expired_active(&self, as_of: DateTime<Utc>) -> AppResult<Vec<UserSubscription>>;

    /// Moves one row from ACTIVE to EXPIRED, touching nothing else. Returns false
    /// when the row had already left ACTIVE.
    async fn mark_expired(&self, subscription_id: Uuid) -> AppResult<bool>;
}

/// Persisted history of user subscriptions.
#[derive(Clone)]
pub struct SubscriptionLedger {
    repo: Arc<dyn UserSubscriptionRepo>,
}

impl SubscriptionLedger {
    pub fn new(repo: Arc<dyn UserSubscriptionRepo>) -> Self {
        Self { repo }
    }

    pub async fn find_active(
        &self,
        user_id: Uuid,
        as_of: DateTime<Utc>,
    ) -> AppResult<Option<UserSubscription>> {
        let mut rows = self.repo.list_active(user_id, as_of).await?;
        if rows.len() > 1 {
            // Rows arrive latest end date first; keep that one.
            tracing::warn!(
                user_id = %user_id,
                count = rows.len(),
                chosen = %rows[0].id,
                "Multiple ACTIVE subscriptions for one user"
            );
        }
        Ok(if rows.is_empty() {
            None
        } else {
            Some(rows.swap_remove(0))
        })
    }

    pub async fn find_latest(&self, user_id: Uuid) -> AppResult<Option<UserSubscription>> {
        self.repo.find_latest(user_id).await
    }

    pub async fn history(&self, user_id: Uuid) -> AppResult<Vec<UserSubscription>> {
        self.repo.list_by_user(user_id).await
    }

    pub async fn find_by_payment_id(&self, payment_id: &str) -> AppResult<Option<UserSubscription>> {
        self.repo.find_by_payment_id(payment_id).await
    }

    pub async fn save(&self, subscription: &UserSubscription) -> AppResult<UserSubscription> {
        self.repo.save(subscription).await
    }

    pub async fn supersede_and_insert(
        &self,
        replacement: &UserSubscription,
        now: DateTime<Utc>,
    ) -> AppResult<Vec<Uuid>> {
        self.repo.supersede_and_insert(replacement, now).await
    }

    pub async fn find_expired_active(
        &self,
        as_of: DateTime<Utc>,
    ) -> AppResult<Vec<UserSubscription>> {
        self.repo.list_expired_active(as_of).await
    }

    pub async fn mark_expired(&self, subscription_id: Uuid) -> AppResult<bool> {
        self.repo.mark_expired(subscription_id).await
    }
}
