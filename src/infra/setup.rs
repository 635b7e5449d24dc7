use crate::{
    adapters::http::app_state::AppState,
    infra::{
        config::AppConfig, error::InfraError, mock_payment_gateway::MockPaymentGateway,
        postgres_persistence,
    },
    use_cases::{
        entitlements::EntitlementUseCases,
        plan_catalog::{PlanCatalog, SubscriptionPlanRepo},
        subscription_ledger::{SubscriptionLedger, UserSubscriptionRepo},
    },
};
use std::fs::File;
use std::sync::Arc;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

pub async fn init_app_state(config: AppConfig) -> anyhow::Result<AppState> {
    let postgres_arc =
        Arc::new(postgres_persistence(&config.database_url, config.db_max_connections).await?);

    let catalog = PlanCatalog::new(postgres_arc.clone() as Arc<dyn SubscriptionPlanRepo>);
    if config.seed_default_plans {
        catalog.seed_defaults().await.map_err(InfraError::Catalog)?;
    }
    // Every entitlement check depends on the Free plan; refuse to start without it.
    catalog.ensure_ready().await.map_err(InfraError::Catalog)?;

    let ledger = SubscriptionLedger::new(postgres_arc.clone() as Arc<dyn UserSubscriptionRepo>);
    let gateway = Arc::new(MockPaymentGateway::new(config.mock_payment_latency));

    let entitlement_use_cases =
        EntitlementUseCases::new(catalog, ledger, gateway, config.payment_timeout);

    Ok(AppState {
        config: Arc::new(config),
        entitlement_use_cases: Arc::new(entitlement_use_cases),
    })
}

pub fn init_tracing(log_file: &str) -> Result<(), InfraError> {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "ridecircle_subscriptions=debug,tower_http=debug".into());

    // Console (pretty logs)
    let console_layer = fmt::layer()
        .with_target(false)
        .with_level(true)
        .pretty();

    // File (structured JSON logs)
    let file = File::create(log_file).map_err(InfraError::LogFile)?;
    let json_layer = fmt::layer()
        .json()
        .with_writer(file)
        .with_current_span(true)
        .with_span_list(true);

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(json_layer)
        .try_init()
        .ok();

    Ok(())
}
