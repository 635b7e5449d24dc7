use async_trait::async_trait;
use chrono::Utc;
use sqlx::Row;
use uuid::Uuid;

use crate::{
    adapters::persistence::{PostgresPersistence, decode_plan_features},
    app_error::{AppError, AppResult},
    application::use_cases::plan_catalog::SubscriptionPlanRepo,
    domain::entities::subscription_plan::{NewSubscriptionPlan, SubscriptionPlan},
};

fn row_to_plan(row: sqlx::postgres::PgRow) -> SubscriptionPlan {
    let id: Uuid = row.get("id");
    let features = decode_plan_features(row.get("features"), id);

    SubscriptionPlan {
        id,
        name: row.get("name"),
        display_name: row.get("display_name"),
        price_cents: row.get("price_cents"),
        duration_days: row.get("duration_days"),
        description: row.get("description"),
        features,
        max_trips: row.get("max_trips"),
        max_clubs: row.get("max_clubs"),
        has_analytics: row.get("has_analytics"),
        has_priority_support: row.get("has_priority_support"),
        has_advanced_filters: row.get("has_advanced_filters"),
        is_active: row.get("is_active"),
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    }
}

const SELECT_COLS: &str = r#"
    id, name, display_name, price_cents, duration_days, description, features,
    max_trips, max_clubs, has_analytics, has_priority_support, has_advanced_filters,
    is_active, created_at, updated_at
"#;

#[async_trait]
impl SubscriptionPlanRepo for PostgresPersistence {
    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<SubscriptionPlan>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM subscription_plans WHERE id = $1",
            SELECT_COLS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(row.map(row_to_plan))
    }

    async fn get_by_name(&self, name: &str) -> AppResult<Option<SubscriptionPlan>> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM subscription_plans WHERE name = $1",
            SELECT_COLS
        ))
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(row.map(row_to_plan))
    }

    async fn list_active(&self) -> AppResult<Vec<SubscriptionPlan>> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM subscription_plans WHERE is_active = true ORDER BY price_cents, name",
            SELECT_COLS
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(rows.into_iter().map(row_to_plan).collect())
    }

    async fn create(&self, input: &NewSubscriptionPlan) -> AppResult<SubscriptionPlan> {
        let id = Uuid::new_v4();
        let now = Utc::now();
        let features_json =
            serde_json::to_value(&input.features).unwrap_or(serde_json::json!([]));

        let row = sqlx::query(&format!(
            r#"
            INSERT INTO subscription_plans (
                id, name, display_name, price_cents, duration_days, description, features,
                max_trips, max_clubs, has_analytics, has_priority_support, has_advanced_filters,
                is_active, created_at, updated_at
            )
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $14)
            RETURNING {}
            "#,
            SELECT_COLS
        ))
        .bind(id)
        .bind(&input.name)
        .bind(&input.display_name)
        .bind(input.price_cents)
        .bind(input.duration_days)
        .bind(&input.description)
        .bind(features_json)
        .bind(input.max_trips)
        .bind(input.max_clubs)
        .bind(input.has_analytics)
        .bind(input.has_priority_support)
        .bind(input.has_advanced_filters)
        .bind(input.is_active)
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(AppError::from)?;
        Ok(row_to_plan(row))
    }

    async fn count(&self) -> AppResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM subscription_plans")
            .fetch_one(&self.pool)
            .await
            .map_err(AppError::from)?;
        Ok(count)
    }
}
