//! In-memory mock implementations for the subscription repositories and the
//! payment gateway.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use uuid::Uuid;

use crate::{
    app_error::{AppError, AppResult},
    application::{
        ports::payment_gateway::{PaymentGatewayPort, PaymentReference, RefundReference},
        use_cases::{plan_catalog::SubscriptionPlanRepo, subscription_ledger::UserSubscriptionRepo},
    },
    domain::entities::{
        payment_method::PaymentMethod,
        subscription_plan::{NewSubscriptionPlan, SubscriptionPlan},
        user_subscription::{SubscriptionStatus, UserSubscription},
    },
};

// ============================================================================
// InMemorySubscriptionPlanRepo
// ============================================================================

#[derive(Default)]
pub struct InMemorySubscriptionPlanRepo {
    pub plans: Mutex<HashMap<Uuid, SubscriptionPlan>>,
}

impl InMemorySubscriptionPlanRepo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_plans(plans: Vec<SubscriptionPlan>) -> Self {
        let map = plans.into_iter().map(|p| (p.id, p)).collect();
        Self {
            plans: Mutex::new(map),
        }
    }
}

#[async_trait]
impl SubscriptionPlanRepo for InMemorySubscriptionPlanRepo {
    async fn get_by_id(&self, id: Uuid) -> AppResult<Option<SubscriptionPlan>> {
        Ok(self.plans.lock().unwrap().get(&id).cloned())
    }

    async fn get_by_name(&self, name: &str) -> AppResult<Option<SubscriptionPlan>> {
        Ok(self
            .plans
            .lock()
            .unwrap()
            .values()
            .find(|p| p.name == name)
            .cloned())
    }

    async fn list_active(&self) -> AppResult<Vec<SubscriptionPlan>> {
        let mut plans: Vec<SubscriptionPlan> = self
            .plans
            .lock()
            .unwrap()
            .values()
            .filter(|p| p.is_active)
            .cloned()
            .collect();
        plans.sort_by_key(|p| p.price_cents);
        Ok(plans)
    }

    async fn create(&self, input: &NewSubscriptionPlan) -> AppResult<SubscriptionPlan> {
        let mut plans = self.plans.lock().unwrap();
        if plans.values().any(|p| p.name == input.name) {
            return Err(AppError::InvalidInput(format!(
                "Plan {} already exists",
                input.name
            )));
        }

        let now = Utc::now();
        let plan = SubscriptionPlan {
            id: Uuid::new_v4(),
            name: input.name.clone(),
            display_name: input.display_name.clone(),
            price_cents: input.price_cents,
            duration_days: input.duration_days,
            description: input.description.clone(),
            features: input.features.clone(),
            max_trips: input.max_trips,
            max_clubs: input.max_clubs,
            has_analytics: input.has_analytics,
            has_priority_support: input.has_priority_support,
            has_advanced_filters: input.has_advanced_filters,
            is_active: input.is_active,
            created_at: Some(now),
            updated_at: Some(now),
        };
        plans.insert(plan.id, plan.clone());
        Ok(plan)
    }

    async fn count(&self) -> AppResult<i64> {
        Ok(self.plans.lock().unwrap().len() as i64)
    }
}

// ============================================================================
// InMemoryUserSubscriptionRepo
// ============================================================================

#[derive(Default)]
pub struct InMemoryUserSubscriptionRepo {
    pub subscriptions: Mutex<HashMap<Uuid, UserSubscription>>,
    fail_writes: AtomicBool,
}

impl InMemoryUserSubscriptionRepo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_subscriptions(subscriptions: Vec<UserSubscription>) -> Self {
        let map = subscriptions.into_iter().map(|s| (s.id, s)).collect();
        Self {
            subscriptions: Mutex::new(map),
            fail_writes: AtomicBool::new(false),
        }
    }

    /// Seed a row directly, bypassing every invariant.
    pub fn insert(&self, subscription: UserSubscription) {
        self.subscriptions
            .lock()
            .unwrap()
            .insert(subscription.id, subscription);
    }

    pub fn get(&self, id: Uuid) -> Option<UserSubscription> {
        self.subscriptions.lock().unwrap().get(&id).cloned()
    }

    /// Every row, ordered by id.
    pub fn all(&self) -> Vec<UserSubscription> {
        let mut rows: Vec<UserSubscription> =
            self.subscriptions.lock().unwrap().values().cloned().collect();
        rows.sort_by_key(|s| s.id);
        rows
    }

    pub fn live_active_count(&self, user_id: Uuid, now: DateTime<Utc>) -> usize {
        self.subscriptions
            .lock()
            .unwrap()
            .values()
            .filter(|s| s.user_id == user_id && s.is_active(now))
            .count()
    }

    /// Make every subsequent write fail with a database error.
    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn check_writable(&self) -> AppResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(AppError::Database("simulated write failure".into()));
        }
        Ok(())
    }
}

#[async_trait]
impl UserSubscriptionRepo for InMemoryUserSubscriptionRepo {
    async fn list_active(
        &self,
        user_id: Uuid,
        as_of: DateTime<Utc>,
    ) -> AppResult<Vec<UserSubscription>> {
        let mut rows: Vec<UserSubscription> = self
            .subscriptions
            .lock()
            .unwrap()
            .values()
            .filter(|s| {
                s.user_id == user_id
                    && s.status == SubscriptionStatus::Active
                    && s.end_date > as_of
            })
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.end_date.cmp(&a.end_date));
        Ok(rows)
    }

    async fn find_latest(&self, user_id: Uuid) -> AppResult<Option<UserSubscription>> {
        Ok(self.list_by_user(user_id).await?.into_iter().next())
    }

    async fn list_by_user(&self, user_id: Uuid) -> AppResult<Vec<UserSubscription>> {
        let mut rows: Vec<UserSubscription> = self
            .subscriptions
            .lock()
            .unwrap()
            .values()
            .filter(|s| s.user_id == user_id)
            .cloned()
            .collect();
        rows.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(rows)
    }

    async fn find_by_payment_id(&self, payment_id: &str) -> AppResult<Option<UserSubscription>> {
        Ok(self
            .subscriptions
            .lock()
            .unwrap()
            .values()
            .find(|s| s.payment_id.as_deref() == Some(payment_id))
            .cloned())
    }

    async fn save(&self, subscription: &UserSubscription) -> AppResult<UserSubscription> {
        self.check_writable()?;
        self.insert(subscription.clone());
        Ok(subscription.clone())
    }

    async fn supersede_and_insert(
        &self,
        replacement: &UserSubscription,
        now: DateTime<Utc>,
    ) -> AppResult<Vec<Uuid>> {
        self.check_writable()?;
        let mut subscriptions = self.subscriptions.lock().unwrap();

        let mut superseded = Vec::new();
        for existing in subscriptions.values_mut() {
            if existing.user_id != replacement.user_id
                || existing.status != SubscriptionStatus::Active
            {
                continue;
            }
            if existing.end_date > now {
                existing.supersede(now);
                superseded.push(existing.id);
            } else {
                existing.status = SubscriptionStatus::Expired;
            }
        }
        subscriptions.insert(replacement.id, replacement.clone());
        Ok(superseded)
    }

    async fn list_expired_active(&self, as_of: DateTime<Utc>) -> AppResult<Vec<UserSubscription>> {
        Ok(self
            .subscriptions
            .lock()
            .unwrap()
            .values()
            .filter(|s| s.status == SubscriptionStatus::Active && s.end_date < as_of)
            .cloned()
            .collect())
    }

    async fn mark_expired(&self, subscription_id: Uuid) -> AppResult<bool> {
        self.check_writable()?;
        let mut subscriptions = self.subscriptions.lock().unwrap();
        match subscriptions.get_mut(&subscription_id) {
            Some(s) if s.status == SubscriptionStatus::Active => {
                s.status = SubscriptionStatus::Expired;
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

// ============================================================================
// ScriptedPaymentGateway
// ============================================================================

/// Gateway double that records every call. Approves non-blank tokens unless
/// built with `declining()`.
#[derive(Default)]
pub struct ScriptedPaymentGateway {
    decline: bool,
    latency: Duration,
    charges: Mutex<Vec<(PaymentReference, i64)>>,
    refunds: Mutex<Vec<i64>>,
}

impl ScriptedPaymentGateway {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn declining() -> Self {
        Self {
            decline: true,
            ..Self::default()
        }
    }

    pub fn with_latency(latency: Duration) -> Self {
        Self {
            latency,
            ..Self::default()
        }
    }

    pub fn charged_amounts(&self) -> Vec<i64> {
        self.charges.lock().unwrap().iter().map(|(_, a)| *a).collect()
    }

    pub fn refunded_amounts(&self) -> Vec<i64> {
        self.refunds.lock().unwrap().clone()
    }
}

#[async_trait]
impl PaymentGatewayPort for ScriptedPaymentGateway {
    async fn charge(
        &self,
        amount_cents: i64,
        method: PaymentMethod,
        token: &str,
    ) -> AppResult<PaymentReference> {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
        if token.trim().is_empty() {
            return Err(AppError::PaymentFailed("Invalid payment token".into()));
        }
        if self.decline {
            return Err(AppError::PaymentFailed("Card declined".into()));
        }

        let mut charges = self.charges.lock().unwrap();
        let reference = PaymentReference::new(format!(
            "{}{:012}",
            method.reference_prefix(),
            charges.len() + 1
        ));
        charges.push((reference.clone(), amount_cents));
        Ok(reference)
    }

    async fn refund(
        &self,
        payment: &PaymentReference,
        amount_cents: i64,
    ) -> AppResult<RefundReference> {
        let known = self
            .charges
            .lock()
            .unwrap()
            .iter()
            .any(|(r, _)| r == payment);
        if !known {
            return Err(AppError::PaymentFailed("Unknown payment reference".into()));
        }
        let mut refunds = self.refunds.lock().unwrap();
        refunds.push(amount_cents);
        Ok(RefundReference::new(format!("REF_{:08}", refunds.len())))
    }

    async fn verify(&self, payment: &PaymentReference) -> AppResult<bool> {
        Ok(self
            .charges
            .lock()
            .unwrap()
            .iter()
            .any(|(r, _)| r == payment))
    }
}
