use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::Row;
use uuid::Uuid;

use crate::{
    adapters::persistence::PostgresPersistence,
    app_error::{AppError, AppResult},
    application::use_cases::subscription_ledger::UserSubscriptionRepo,
    domain::entities::user_subscription::{SubscriptionStatus, UserSubscription},
};

fn row_to_subscription(row: sqlx::postgres::PgRow) -> UserSubscription {
    UserSubscription {
        id: row.get("id"),
        user_id: row.get("user_id"),
        plan_id: row.get("plan_id"),
        start_date: row.get("start_date"),
        end_date: row.get("end_date"),
        status: row.get("status"),
        payment_id: row.get("payment_id"),
        transaction_id: row.get("transaction_id"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

const SELECT_COLS: &str = r#"
    id, user_id, plan_id, start_date, end_date, status,
    payment_id, transaction_id, created_at, updated_at
"#;

const INSERT_SQL: &str = r#"
    INSERT INTO user_subscriptions (
        id, user_id, plan_id, start_date, end_date, status,
        payment_id, transaction_id, created_at, updated_at
    )
    VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
"#;

#[async_trait]
impl UserSubscriptionRepo for PostgresPersistence {
    async fn list_active(
        &self,
        user_id: Uuid,
        as_of: DateTime<Utc>,
    ) -> AppResult<Vec<UserSubscription>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM user_subscriptions WHERE user_id = $1 AND status = $2 AND end_date > $3 ORDER BY end_date DESC, created_at DESC",
            SELECT_COLS
        ))
        .bind(user_id)
        .bind(SubscriptionStatus::Active)
        .bind(as_of)
        .fetch_all(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(rows.into_iter().map(row_to_subscription).collect())
    }

    async fn find_latest(&self, user_id: Uuid) -> AppResult<Option<UserSubscription>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM user_subscriptions WHERE user_id = $1 ORDER BY created_at DESC LIMIT 1",
            SELECT_COLS
        ))
        .bind(user_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(row.map(row_to_subscription))
    }

    async fn list_by_user(&self, user_id: Uuid) -> AppResult<Vec<UserSubscription>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM user_subscriptions WHERE user_id = $1 ORDER BY created_at DESC",
            SELECT_COLS
        ))
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(rows.into_iter().map(row_to_subscription).collect())
    }

    async fn find_by_payment_id(&self, payment_id: &str) -> AppResult<Option<UserSubscription>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM user_subscriptions WHERE payment_id = $1 ORDER BY created_at DESC LIMIT 1",
            SELECT_COLS
        ))
        .bind(payment_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(row.map(row_to_subscription))
    }

    async fn save(&self, subscription: &UserSubscription) -> AppResult<UserSubscription> {
        let row = sqlx::query(&format!(
            r#"
            {}
            ON CONFLICT (id) DO UPDATE SET
                plan_id = EXCLUDED.plan_id,
                start_date = EXCLUDED.start_date,
                end_date = EXCLUDED.end_date,
                status = EXCLUDED.status,
                payment_id = EXCLUDED.payment_id,
                transaction_id = EXCLUDED.transaction_id,
                updated_at = EXCLUDED.updated_at
            RETURNING {}
            "#,
            INSERT_SQL, SELECT_COLS
        ))
        .bind(subscription.id)
        .bind(subscription.user_id)
        .bind(subscription.plan_id)
        .bind(subscription.start_date)
        .bind(subscription.end_date)
        .bind(subscription.status)
        .bind(&subscription.payment_id)
        .bind(&subscription.transaction_id)
        .bind(subscription.created_at)
        .bind(subscription.updated_at)
        .fetch_one(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(row_to_subscription(row))
    }

    async fn supersede_and_insert(
        &self,
        replacement: &UserSubscription,
        now: DateTime<Utc>,
    ) -> AppResult<Vec<Uuid>> {
        let mut tx = self.pool.begin().await.map_err(AppError::from)?;

        // Row locks serialize writers from other processes on the same user.
        let active: Vec<(Uuid, DateTime<Utc>)> = sqlx::query_as(
            "SELECT id, end_date FROM user_subscriptions WHERE user_id = $1 AND status = $2 FOR UPDATE",
        )
        .bind(replacement.user_id)
        .bind(SubscriptionStatus::Active)
        .fetch_all(&mut *tx)
        .await
        .map_err(AppError::from)?;

        let (live, lapsed): (Vec<_>, Vec<_>) =
            active.into_iter().partition(|(_, end_date)| *end_date > now);
        let live: Vec<Uuid> = live.into_iter().map(|(id, _)| id).collect();
        let lapsed: Vec<Uuid> = lapsed.into_iter().map(|(id, _)| id).collect();

        if !lapsed.is_empty() {
            sqlx::query("UPDATE user_subscriptions SET status = $1 WHERE id = ANY($2)")
                .bind(SubscriptionStatus::Expired)
                .bind(&lapsed)
                .execute(&mut *tx)
                .await
                .map_err(AppError::from)?;
        }

        if !live.is_empty() {
            sqlx::query(
                "UPDATE user_subscriptions SET status = $1, updated_at = $2 WHERE id = ANY($3)",
            )
            .bind(SubscriptionStatus::Cancelled)
            .bind(now)
            .bind(&live)
            .execute(&mut *tx)
            .await
            .map_err(AppError::from)?;
        }

        sqlx::query(INSERT_SQL)
            .bind(replacement.id)
            .bind(replacement.user_id)
            .bind(replacement.plan_id)
            .bind(replacement.start_date)
            .bind(replacement.end_date)
            .bind(replacement.status)
            .bind(&replacement.payment_id)
            .bind(&replacement.transaction_id)
            .bind(replacement.created_at)
            .bind(replacement.updated_at)
            .execute(&mut *tx)
            .await
            .map_err(AppError::from)?;

        tx.commit().await.map_err(AppError::from)?;
        Ok(live)
    }

    async fn list_expired_active(&self, as_of: DateTime<Utc>) -> AppResult<Vec<UserSubscription>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM user_subscriptions WHERE status = $1 AND end_date < $2 ORDER BY end_date",
            SELECT_COLS
        ))
        .bind(SubscriptionStatus::Active)
        .bind(as_of)
        .fetch_all(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(rows.into_iter().map(row_to_subscription).collect())
    }

    async fn mark_expired(&self, subscription_id: Uuid) -> AppResult<bool> {
        let result = sqlx::query("UPDATE user_subscriptions SET status = $1 WHERE id = $2 AND status = $3")
            .bind(SubscriptionStatus::Expired)
            .bind(subscription_id)
            .bind(SubscriptionStatus::Active)
            .execute(&self.pool)
            .await
            .map_err(AppError::from)?;
        Ok(result.rows_affected() == 1)
    }
}
