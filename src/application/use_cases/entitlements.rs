use std::{collections::HashMap, sync::Arc, time::Duration};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::Mutex;
use tracing::instrument;
use uuid::Uuid;

use crate::{
    app_error::{AppError, AppResult, LimitedResource},
    application::{
        ports::payment_gateway::{PaymentGatewayPort, PaymentReference},
        use_cases::{
            plan_catalog::{PlanCatalog, PlanView},
            subscription_ledger::SubscriptionLedger,
        },
        user_locks::UserLocks,
    },
    domain::entities::{
        feature::Feature,
        payment_method::PaymentMethod,
        subscription_plan::SubscriptionPlan,
        user_subscription::{SubscriptionStatus, UserSubscription},
    },
};

/// Days reported for the implicit Free plan, which never expires.
pub const FREE_PLAN_DAYS_REMAINING: i64 = 999;

// ============================================================================
// Inputs and Views
// ============================================================================

#[derive(Debug, Clone)]
pub struct SubscribeInput {
    pub plan_id: Uuid,
    pub payment_method: PaymentMethod,
    pub payment_token: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubscriptionView {
    /// `None` for the synthesized Free plan view.
    pub id: Option<Uuid>,
    pub user_id: Uuid,
    pub plan: PlanView,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub status: SubscriptionStatus,
    pub payment_id: Option<String>,
    pub transaction_id: Option<String>,
    pub is_active: bool,
    pub days_remaining: i64,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl SubscriptionView {
    pub fn from_subscription(
        subscription: &UserSubscription,
        plan: &SubscriptionPlan,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Some(subscription.id),
            user_id: subscription.user_id,
            plan: PlanView::from(plan),
            start_date: Some(subscription.start_date),
            end_date: Some(subscription.end_date),
            status: subscription.status,
            payment_id: subscription.payment_id.clone(),
            transaction_id: subscription.transaction_id.clone(),
            is_active: subscription.is_active(now),
            days_remaining: subscription.days_remaining(now),
            created_at: Some(subscription.created_at),
            updated_at: Some(subscription.updated_at),
        }
    }

    /// Coverage every user has without a paid subscription. Nothing is persisted.
    pub fn free_fallback(user_id: Uuid, free_plan: &SubscriptionPlan) -> Self {
        Self {
            id: None,
            user_id,
            plan: PlanView::from(free_plan),
            start_date: None,
            end_date: None,
            status: SubscriptionStatus::Active,
            payment_id: None,
            transaction_id: None,
            is_active: true,
            days_remaining: FREE_PLAN_DAYS_REMAINING,
            created_at: None,
            updated_at: None,
        }
    }
}

/// Outcome of an advisory count check against a plan limit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LimitCheck {
    pub resource: LimitedResource,
    pub allowed: bool,
    pub current_count: i32,
    pub max_allowed: i32,
}

// ============================================================================
// Use Cases
// ============================================================================

#[derive(Clone)]
pub struct EntitlementUseCases {
    catalog: PlanCatalog,
    ledger: SubscriptionLedger,
    gateway: Arc<dyn PaymentGatewayPort>,
    locks: Arc<UserLocks>,
    sweep_guard: Arc<Mutex<()>>,
    payment_timeout: Duration,
}

impl EntitlementUseCases {
    pub fn new(
        catalog: PlanCatalog,
        ledger: SubscriptionLedger,
        gateway: Arc<dyn PaymentGatewayPort>,
        payment_timeout: Duration,
    ) -> Self {
        Self {
            catalog,
            ledger,
            gateway,
            locks: Arc::new(UserLocks::new()),
            sweep_guard: Arc::new(Mutex::new(())),
            payment_timeout,
        }
    }

    pub fn catalog(&self) -> &PlanCatalog {
        &self.catalog
    }

    /// The user's live subscription and its plan, or `None` plus the Free plan.
    async fn current_plan(
        &self,
        user_id: Uuid,
        now: DateTime<Utc>,
    ) -> AppResult<(Option<UserSubscription>, SubscriptionPlan)> {
        match self.ledger.find_active(user_id, now).await? {
            Some(subscription) => {
                let plan = self.catalog.get_by_id(subscription.plan_id).await?;
                Ok((Some(subscription), plan))
            }
            None => Ok((None, self.catalog.free_plan().await?)),
        }
    }

    #[instrument(skip(self))]
    pub async fn get_current_subscription(&self, user_id: Uuid) -> AppResult<SubscriptionView> {
        let now = Utc::now();
        let view = match self.current_plan(user_id, now).await? {
            (Some(subscription), plan) => {
                SubscriptionView::from_subscription(&subscription, &plan, now)
            }
            (None, free) => SubscriptionView::free_fallback(user_id, &free),
        };
        Ok(view)
    }

    /// Charges for `plan_id` and makes it the user's only ACTIVE subscription.
    ///
    /// Runs inside the user's critical section. The ledger is written only after
    /// a successful charge, so a decline or timeout leaves it untouched. If the
    /// write fails after charging, the charge is refunded.
    #[instrument(skip(self, input), fields(plan_id = %input.plan_id, method = %input.payment_method))]
    pub async fn subscribe(
        &self,
        user_id: Uuid,
        input: &SubscribeInput,
    ) -> AppResult<SubscriptionView> {
        let plan = self.catalog.get_by_id(input.plan_id).await?;
        if !plan.is_active {
            return Err(AppError::InvalidInput(format!(
                "Plan {} is not available for new subscriptions",
                plan.name
            )));
        }
        if plan.term_end(Utc::now()).is_none() {
            return Err(AppError::InvalidInput(format!(
                "Plan {} has an invalid duration",
                plan.name
            )));
        }

        let _guard = self.locks.acquire(user_id).await;

        let payment = self
            .charge(user_id, &plan, input.payment_method, &input.payment_token)
            .await?;

        let now = Utc::now();
        let Some(end_date) = plan.term_end(now) else {
            let err = AppError::Internal(format!("Plan {} term end overflowed", plan.name));
            self.compensate(user_id, &payment, plan.price_cents, &err).await;
            return Err(err);
        };
        let subscription = UserSubscription::start(
            user_id,
            plan.id,
            end_date,
            payment.as_str().to_string(),
            now,
        );

        let superseded = match self.ledger.supersede_and_insert(&subscription, now).await {
            Ok(ids) => ids,
            Err(e) => {
                self.compensate(user_id, &payment, plan.price_cents, &e).await;
                return Err(e);
            }
        };

        for previous in &superseded {
            tracing::info!(
                user_id = %user_id,
                subscription_id = %previous,
                "Subscription superseded (ACTIVE -> CANCELLED)"
            );
        }
        tracing::info!(
            user_id = %user_id,
            subscription_id = %subscription.id,
            plan = %plan.name,
            payment_id = %payment,
            "Subscription activated"
        );

        Ok(SubscriptionView::from_subscription(&subscription, &plan, now))
    }

    async fn charge(
        &self,
        user_id: Uuid,
        plan: &SubscriptionPlan,
        method: PaymentMethod,
        token: &str,
    ) -> AppResult<PaymentReference> {
        let attempt = self.gateway.charge(plan.price_cents, method, token);
        match tokio::time::timeout(self.payment_timeout, attempt).await {
            Ok(Ok(reference)) => Ok(reference),
            Ok(Err(e)) => {
                tracing::warn!(user_id = %user_id, plan = %plan.name, error = %e, "Payment failed");
                Err(match e {
                    AppError::PaymentFailed(_) => e,
                    other => AppError::PaymentFailed(other.to_string()),
                })
            }
            Err(_) => {
                tracing::warn!(
                    user_id = %user_id,
                    plan = %plan.name,
                    timeout_ms = self.payment_timeout.as_millis() as u64,
                    "Payment gateway timed out"
                );
                Err(AppError::PaymentFailed("Payment gateway timed out".into()))
            }
        }
    }

    async fn compensate(
        &self,
        user_id: Uuid,
        payment: &PaymentReference,
        amount_cents: i64,
        cause: &AppError,
    ) {
        tracing::warn!(
            user_id = %user_id,
            payment_id = %payment,
            error = %cause,
            "Subscription not persisted after charge; refunding"
        );
        match self.gateway.refund(payment, amount_cents).await {
            Ok(refund) => {
                tracing::info!(payment_id = %payment, refund_id = %refund, "Payment refunded")
            }
            Err(e) => tracing::error!(
                user_id = %user_id,
                payment_id = %payment,
                error = %e,
                "Compensating refund failed; manual reconciliation required"
            ),
        }
    }

    /// Ends the user's ACTIVE subscription now. Returns false when there was
    /// nothing to cancel.
    #[instrument(skip(self))]
    pub async fn cancel_subscription(&self, user_id: Uuid) -> AppResult<bool> {
        let _guard = self.locks.acquire(user_id).await;

        let now = Utc::now();
        let Some(mut subscription) = self.ledger.find_active(user_id, now).await? else {
            return Ok(false);
        };

        subscription.cancel(now);
        self.ledger.save(&subscription).await?;

        tracing::info!(
            user_id = %user_id,
            subscription_id = %subscription.id,
            "Subscription cancelled (ACTIVE -> CANCELLED)"
        );
        Ok(true)
    }

    /// Names outside the gated set are basic features and granted on any plan.
    /// The plan is resolved first so a broken catalog still surfaces.
    pub async fn has_feature_access(&self, user_id: Uuid, feature_name: &str) -> AppResult<bool> {
        let (_, plan) = self.current_plan(user_id, Utc::now()).await?;
        Ok(Feature::parse(feature_name).is_none_or(|feature| plan.has_feature(feature)))
    }

    /// Advisory check against the plan limit. `current_count` is supplied by the
    /// caller and nothing is reserved.
    pub async fn check_limit(
        &self,
        user_id: Uuid,
        resource: LimitedResource,
        current_count: i32,
    ) -> AppResult<LimitCheck> {
        let (_, plan) = self.current_plan(user_id, Utc::now()).await?;
        let max_allowed = match resource {
            LimitedResource::Trips => plan.max_trips,
            LimitedResource::Clubs => plan.max_clubs,
        };
        Ok(LimitCheck {
            resource,
            allowed: current_count < max_allowed,
            current_count,
            max_allowed,
        })
    }

    pub async fn can_create_trip(&self, user_id: Uuid, current_count: i32) -> AppResult<bool> {
        Ok(self
            .check_limit(user_id, LimitedResource::Trips, current_count)
            .await?
            .allowed)
    }

    pub async fn can_join_club(&self, user_id: Uuid, current_count: i32) -> AppResult<bool> {
        Ok(self
            .check_limit(user_id, LimitedResource::Clubs, current_count)
            .await?
            .allowed)
    }

    /// Moves lapsed ACTIVE subscriptions to EXPIRED. Returns `None` when another
    /// sweep is already running.
    pub async fn sweep_expired(&self, as_of: DateTime<Utc>) -> AppResult<Option<usize>> {
        let Ok(_running) = self.sweep_guard.try_lock() else {
            tracing::debug!("Expiry sweep already in progress, skipping");
            return Ok(None);
        };

        let candidates = self.ledger.find_expired_active(as_of).await?;
        let mut expired = 0;
        for subscription in &candidates {
            if self.ledger.mark_expired(subscription.id).await? {
                expired += 1;
                tracing::info!(
                    user_id = %subscription.user_id,
                    subscription_id = %subscription.id,
                    "Subscription expired (ACTIVE -> EXPIRED)"
                );
            }
        }

        let tracked_users = self.locks.prune();
        tracing::debug!(expired, tracked_users, "Expiry sweep pass done");
        Ok(Some(expired))
    }

    /// All of the user's subscriptions, newest first.
    pub async fn history(&self, user_id: Uuid) -> AppResult<Vec<SubscriptionView>> {
        let now = Utc::now();
        let rows = self.ledger.history(user_id).await?;

        let mut plans: HashMap<Uuid, SubscriptionPlan> = HashMap::new();
        let mut views = Vec::with_capacity(rows.len());
        for row in &rows {
            if !plans.contains_key(&row.plan_id) {
                let plan = self.catalog.get_by_id(row.plan_id).await?;
                plans.insert(row.plan_id, plan);
            }
            if let Some(plan) = plans.get(&row.plan_id) {
                views.push(SubscriptionView::from_subscription(row, plan, now));
            }
        }
        Ok(views)
    }
}
