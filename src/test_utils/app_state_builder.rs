//! Builders wiring the entitlement use cases and `AppState` onto in-memory mocks.

use std::{net::SocketAddr, sync::Arc, time::Duration};

use axum::http::HeaderValue;
use secrecy::SecretString;
use uuid::Uuid;

use crate::{
    adapters::http::app_state::AppState,
    application::{
        jwt,
        use_cases::{
            entitlements::EntitlementUseCases, plan_catalog::PlanCatalog,
            subscription_ledger::SubscriptionLedger,
        },
    },
    domain::entities::subscription_plan::SubscriptionPlan,
    infra::config::AppConfig,
    test_utils::{
        InMemorySubscriptionPlanRepo, InMemoryUserSubscriptionRepo, ScriptedPaymentGateway,
        create_test_catalog,
    },
};

const TEST_PAYMENT_TIMEOUT: Duration = Duration::from_secs(2);
const TEST_JWT_SECRET: &str = "test_jwt_secret";

/// Entitlement use cases plus handles on the mocks behind them.
pub struct TestEntitlements {
    pub use_cases: EntitlementUseCases,
    pub subscriptions: Arc<InMemoryUserSubscriptionRepo>,
    pub gateway: Arc<ScriptedPaymentGateway>,
    pub plans: Vec<SubscriptionPlan>,
}

impl TestEntitlements {
    pub fn build() -> Self {
        Self::assemble(create_test_catalog(), ScriptedPaymentGateway::new())
    }

    pub fn build_with_plans(plans: Vec<SubscriptionPlan>) -> Self {
        Self::assemble(plans, ScriptedPaymentGateway::new())
    }

    pub fn build_with_gateway(gateway: ScriptedPaymentGateway) -> Self {
        Self::assemble(create_test_catalog(), gateway)
    }

    fn assemble(plans: Vec<SubscriptionPlan>, gateway: ScriptedPaymentGateway) -> Self {
        let plan_repo = Arc::new(InMemorySubscriptionPlanRepo::with_plans(plans.clone()));
        let subscriptions = Arc::new(InMemoryUserSubscriptionRepo::new());
        let gateway = Arc::new(gateway);

        let use_cases = EntitlementUseCases::new(
            PlanCatalog::new(plan_repo),
            SubscriptionLedger::new(subscriptions.clone()),
            gateway.clone(),
            TEST_PAYMENT_TIMEOUT,
        );

        Self {
            use_cases,
            subscriptions,
            gateway,
            plans,
        }
    }

    /// Catalog plan by name. Panics when the fixture has no such plan.
    pub fn plan(&self, name: &str) -> SubscriptionPlan {
        self.plans
            .iter()
            .find(|p| p.name == name)
            .cloned()
            .unwrap_or_else(|| panic!("no test plan named {name}"))
    }
}

/// `AppState` for HTTP tests along with the mocks it was built on.
pub struct TestEnv {
    pub app_state: AppState,
    pub subscriptions: Arc<InMemoryUserSubscriptionRepo>,
    pub gateway: Arc<ScriptedPaymentGateway>,
    plans: Vec<SubscriptionPlan>,
}

impl TestEnv {
    pub fn plan(&self, name: &str) -> SubscriptionPlan {
        self.plans
            .iter()
            .find(|p| p.name == name)
            .cloned()
            .unwrap_or_else(|| panic!("no test plan named {name}"))
    }

    /// Access token for `user_id` signed with the test secret.
    pub fn token_for(&self, user_id: Uuid) -> String {
        jwt::issue(
            user_id,
            &self.app_state.config.jwt_secret,
            time::Duration::hours(1),
        )
        .unwrap()
    }
}

pub struct TestAppStateBuilder {
    plans: Vec<SubscriptionPlan>,
    gateway: ScriptedPaymentGateway,
}

impl Default for TestAppStateBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl TestAppStateBuilder {
    /// Builder over the default catalog and an approving gateway.
    pub fn new() -> Self {
        Self {
            plans: create_test_catalog(),
            gateway: ScriptedPaymentGateway::new(),
        }
    }

    pub fn with_plans(mut self, plans: Vec<SubscriptionPlan>) -> Self {
        self.plans = plans;
        self
    }

    pub fn with_gateway(mut self, gateway: ScriptedPaymentGateway) -> Self {
        self.gateway = gateway;
        self
    }

    pub fn build(self) -> TestEnv {
        let TestEntitlements {
            use_cases,
            subscriptions,
            gateway,
            plans,
        } = TestEntitlements::assemble(self.plans, self.gateway);

        // Create minimal config for testing
        let config = Arc::new(AppConfig {
            jwt_secret: SecretString::new(TEST_JWT_SECRET.into()),
            database_url: String::new(),
            db_max_connections: 1,
            bind_addr: "127.0.0.1:3001".parse::<SocketAddr>().unwrap(),
            cors_origin: HeaderValue::from_static("http://localhost:5173"),
            payment_timeout: TEST_PAYMENT_TIMEOUT,
            mock_payment_latency: Duration::ZERO,
            expiry_sweep_interval: Duration::from_secs(3_600),
            seed_default_plans: false,
            log_file: String::new(),
        });

        TestEnv {
            app_state: AppState {
                config,
                entitlement_use_cases: Arc::new(use_cases),
            },
            subscriptions,
            gateway,
            plans,
        }
    }
}
