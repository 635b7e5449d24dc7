//! Test data factories for creating valid test fixtures.
//!
//! Each factory function creates a complete, valid object with sensible defaults.
//! Use the closure parameter to override specific fields as needed.

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;

use crate::domain::entities::{
    subscription_plan::{SubscriptionPlan, default_plans},
    user_subscription::{SubscriptionStatus, UserSubscription},
};

/// Create a test subscription plan with sensible defaults.
pub fn create_test_plan(overrides: impl FnOnce(&mut SubscriptionPlan)) -> SubscriptionPlan {
    let mut plan = SubscriptionPlan {
        id: Uuid::new_v4(),
        name: "BASIC".to_string(),
        display_name: "Basic Plan".to_string(),
        price_cents: 499,
        duration_days: 30,
        description: Some("A basic subscription plan".to_string()),
        features: vec!["Feature 1".to_string(), "Feature 2".to_string()],
        max_trips: 10,
        max_clubs: 5,
        has_analytics: false,
        has_priority_support: false,
        has_advanced_filters: false,
        is_active: true,
        created_at: Some(test_datetime()),
        updated_at: Some(test_datetime()),
    };
    overrides(&mut plan);
    plan
}

/// Create an ACTIVE subscription running 30 days from now.
pub fn create_test_subscription(
    overrides: impl FnOnce(&mut UserSubscription),
) -> UserSubscription {
    let now = test_datetime();
    let mut subscription = UserSubscription {
        id: Uuid::new_v4(),
        user_id: Uuid::new_v4(),
        plan_id: Uuid::new_v4(),
        start_date: now,
        end_date: now + Duration::days(30),
        status: SubscriptionStatus::Active,
        payment_id: Some(format!("PAY_{}", &Uuid::new_v4().simple().to_string()[..12])),
        transaction_id: Some(Uuid::new_v4().to_string()),
        created_at: now,
        updated_at: now,
    };
    overrides(&mut subscription);
    subscription
}

/// The default catalog plus one retired plan named "LEGACY".
pub fn create_test_catalog() -> Vec<SubscriptionPlan> {
    let mut plans: Vec<SubscriptionPlan> = default_plans()
        .into_iter()
        .map(|p| SubscriptionPlan {
            id: Uuid::new_v4(),
            name: p.name,
            display_name: p.display_name,
            price_cents: p.price_cents,
            duration_days: p.duration_days,
            description: p.description,
            features: p.features,
            max_trips: p.max_trips,
            max_clubs: p.max_clubs,
            has_analytics: p.has_analytics,
            has_priority_support: p.has_priority_support,
            has_advanced_filters: p.has_advanced_filters,
            is_active: p.is_active,
            created_at: Some(test_datetime()),
            updated_at: Some(test_datetime()),
        })
        .collect();
    plans.push(create_test_plan(|p| {
        p.name = "LEGACY".to_string();
        p.display_name = "Legacy Plan".to_string();
        p.is_active = false;
    }));
    plans
}

/// Current time truncated to whole microseconds, matching Postgres precision.
pub fn test_datetime() -> DateTime<Utc> {
    let now = Utc::now();
    now - Duration::nanoseconds(i64::from(now.timestamp_subsec_nanos() % 1_000))
}
