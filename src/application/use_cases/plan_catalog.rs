use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

use crate::{
    app_error::{AppError, AppResult},
    domain::entities::subscription_plan::{
        FREE_PLAN_NAME, NewSubscriptionPlan, SubscriptionPlan, default_plans,
    },
};

// ============================================================================
// Views
// ============================================================================

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PlanView {
    pub id: Uuid,
    pub name: String,
    pub display_name: String,
    pub price: f64,
    pub price_cents: i64,
    pub duration_days: i32,
    pub description: Option<String>,
    pub features: Vec<String>,
    pub max_trips: i32,
    pub max_clubs: i32,
    pub has_analytics: bool,
    pub has_priority_support: bool,
    pub has_advanced_filters: bool,
    pub is_active: bool,
    pub is_popular: bool,
    pub badge: Option<String>,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<&SubscriptionPlan> for PlanView {
    fn from(plan: &SubscriptionPlan) -> Self {
        let presentation = plan.presentation();
        Self {
            id: plan.id,
            name: plan.name.clone(),
            display_name: plan.display_name.clone(),
            price: plan.price_major(),
            price_cents: plan.price_cents,
            duration_days: plan.duration_days,
            description: plan.description.clone(),
            features: plan.features.clone(),
            max_trips: plan.max_trips,
            max_clubs: plan.max_clubs,
            has_analytics: plan.has_analytics,
            has_priority_support: plan.has_priority_support,
            has_advanced_filters: plan.has_advanced_filters,
            is_active: plan.is_active,
            is_popular: presentation.is_popular,
            badge: presentation.badge.map(str::to_string),
            created_at: plan.created_at,
            updated_at: plan.updated_at,
        }
    }
}

// ============================================================================
// Repository Trait
// ============================================================================

#[async_trait]
pub trait SubscriptionPlanRepo: Send + Sync {
    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<SubscriptionPlan>>;
    async fn get_by_name(&self, name: &str) -> AppResult<Option<SubscriptionPlan>>;
    /// Active plans, cheapest first.
    async fn list_active(&self) -> AppResult<Vec<SubscriptionPlan>>;
    async fn create(&self, input: &NewSubscriptionPlan) -> AppResult<SubscriptionPlan>;
    async fn count(&self) -> AppResult<i64>;
}

// ============================================================================
// Use Cases
// ============================================================================

/// Read-mostly catalog of plans. Safe to share without locking.
#[derive(Clone)]
pub struct PlanCatalog {
    repo: Arc<dyn SubscriptionPlanRepo>,
}

impl PlanCatalog {
    pub fn new(repo: Arc<dyn SubscriptionPlanRepo>) -> Self {
        Self { repo }
    }

    pub async fn list_active(&self) -> AppResult<Vec<SubscriptionPlan>> {
        self.repo.list_active().await
    }

    pub async fn get_by_id(&self, plan_id: Uuid) -> AppResult<SubscriptionPlan> {
        self.repo
            .get_by_id(plan_id)
            .await?
            .ok_or(AppError::PlanNotFound(plan_id))
    }

    pub async fn get_by_name(&self, name: &str) -> AppResult<SubscriptionPlan> {
        self.repo.get_by_name(name).await?.ok_or(AppError::NotFound)
    }

    /// The implicit fallback plan. Its absence is a data integrity failure, not a
    /// per-request error.
    pub async fn free_plan(&self) -> AppResult<SubscriptionPlan> {
        match self.repo.get_by_name(FREE_PLAN_NAME).await? {
            Some(plan) => Ok(plan),
            None => {
                tracing::error!(
                    plan = FREE_PLAN_NAME,
                    "Free plan missing from catalog; entitlement checks cannot be served"
                );
                Err(AppError::Configuration(format!(
                    "No plan named {} exists in the catalog",
                    FREE_PLAN_NAME
                )))
            }
        }
    }

    /// Inserts the default catalog into an empty store. Returns how many plans
    /// were created.
    pub async fn seed_defaults(&self) -> AppResult<usize> {
        if self.repo.count().await? > 0 {
            return Ok(0);
        }

        let plans = default_plans();
        for plan in &plans {
            plan.validate().map_err(AppError::Configuration)?;
            self.repo.create(plan).await?;
        }

        tracing::info!(count = plans.len(), "Default subscription plans initialized");
        Ok(plans.len())
    }

    /// Startup check; fails fast when the Free plan is missing.
    pub async fn ensure_ready(&self) -> AppResult<()> {
        let free = self.free_plan().await?;
        tracing::info!(plan_id = %free.id, "Plan catalog ready");
        Ok(())
    }
}
