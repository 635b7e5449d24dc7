use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::feature::Feature;

/// Name of the implicit fallback plan every user is on without a paid subscription.
pub const FREE_PLAN_NAME: &str = "FREE";
pub const PREMIUM_PLAN_NAME: &str = "PREMIUM";
pub const ENTERPRISE_PLAN_NAME: &str = "ENTERPRISE";
/// Longest term a plan may sell.
pub const MAX_PLAN_DURATION_DAYS: i32 = 3_650;

/// A named subscription tier with pricing and entitlement limits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubscriptionPlan {
    pub id: Uuid,
    /// Unique short name ("FREE", "PREMIUM", ...).
    pub name: String,
    pub display_name: String,
    /// Price in minor currency units.
    pub price_cents: i64,
    pub duration_days: i32,
    pub description: Option<String>,
    pub features: Vec<String>,
    pub max_trips: i32,
    pub max_clubs: i32,
    pub has_analytics: bool,
    pub has_priority_support: bool,
    pub has_advanced_filters: bool,
    /// Inactive plans stay valid for existing subscribers but cannot be newly bought.
    pub is_active: bool,
    pub created_at: Option<DateTime<Utc>>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl SubscriptionPlan {
    pub fn is_free(&self) -> bool {
        self.name == FREE_PLAN_NAME
    }

    pub fn price_major(&self) -> f64 {
        self.price_cents as f64 / 100.0
    }

    pub fn has_feature(&self, feature: Feature) -> bool {
        match feature {
            Feature::Analytics => self.has_analytics,
            Feature::PrioritySupport => self.has_priority_support,
            Feature::AdvancedFilters => self.has_advanced_filters,
        }
    }

    /// End of a term bought at `from`, or `None` when the stored duration is
    /// outside `1..=MAX_PLAN_DURATION_DAYS`.
    pub fn term_end(&self, from: DateTime<Utc>) -> Option<DateTime<Utc>> {
        if !(1..=MAX_PLAN_DURATION_DAYS).contains(&self.duration_days) {
            return None;
        }
        from.checked_add_signed(Duration::days(i64::from(self.duration_days)))
    }

    /// Presentation hints derived from the plan name at read time.
    pub fn presentation(&self) -> PlanPresentation {
        match self.name.as_str() {
            PREMIUM_PLAN_NAME => PlanPresentation {
                is_popular: true,
                badge: Some("Most Popular"),
            },
            ENTERPRISE_PLAN_NAME => PlanPresentation {
                is_popular: false,
                badge: Some("Best Value"),
            },
            _ => PlanPresentation::default(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PlanPresentation {
    pub is_popular: bool,
    pub badge: Option<&'static str>,
}

/// Input for inserting a plan into the catalog.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct NewSubscriptionPlan {
    pub name: String,
    pub display_name: String,
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
}

impl NewSubscriptionPlan {
    pub fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("Plan name is required".into());
        }
        if self.price_cents < 0 {
            return Err(format!("Plan {} has a negative price", self.name));
        }
        if !(1..=MAX_PLAN_DURATION_DAYS).contains(&self.duration_days) {
            return Err(format!(
                "Plan {} must last between 1 and {} days",
                self.name, MAX_PLAN_DURATION_DAYS
            ));
        }
        if self.max_trips < 0 || self.max_clubs < 0 {
            return Err(format!("Plan {} has a negative limit", self.name));
        }
        Ok(())
    }
}

/// The catalog seeded into an empty database.
pub fn default_plans() -> Vec<NewSubscriptionPlan> {
    vec![
        NewSubscriptionPlan {
            name: FREE_PLAN_NAME.to_string(),
            display_name: "Free Plan".to_string(),
            price_cents: 0,
            duration_days: 365,
            description: Some("Perfect for getting started with basic ride planning".to_string()),
            features: vec![
                "Create up to 5 trips".to_string(),
                "Join up to 2 clubs".to_string(),
                "Basic trip planning".to_string(),
            ],
            max_trips: 5,
            max_clubs: 2,
            has_analytics: false,
            has_priority_support: false,
            has_advanced_filters: false,
            is_active: true,
        },
        NewSubscriptionPlan {
            name: PREMIUM_PLAN_NAME.to_string(),
            display_name: "Premium Plan".to_string(),
            price_cents: 999,
            duration_days: 30,
            description: Some("Ideal for regular riders with enhanced features".to_string()),
            features: vec![
                "Create up to 25 trips".to_string(),
                "Join up to 10 clubs".to_string(),
                "Trip analytics".to_string(),
                "Priority support".to_string(),
                "Advanced filters".to_string(),
            ],
            max_trips: 25,
            max_clubs: 10,
            has_analytics: true,
            has_priority_support: true,
            has_advanced_filters: true,
            is_active: true,
        },
        NewSubscriptionPlan {
            name: ENTERPRISE_PLAN_NAME.to_string(),
            display_name: "Enterprise Plan".to_string(),
            price_cents: 1999,
            duration_days: 30,
            description: Some("Complete solution for riding clubs and organizations".to_string()),
            features: vec![
                "Create up to 100 trips".to_string(),
                "Join up to 50 clubs".to_string(),
                "Trip analytics".to_string(),
                "Priority support".to_string(),
                "Advanced filters".to_string(),
            ],
            max_trips: 100,
            max_clubs: 50,
            has_analytics: true,
            has_priority_support: true,
            has_advanced_filters: true,
            is_active: true,
        },
    ]
}
