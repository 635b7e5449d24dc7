use dotenvy::dotenv;
use tracing::info;

use ridecircle_subscriptions::infra::{
    app::create_app,
    config::AppConfig,
    expiry_sweeper::run_expiry_sweep_loop,
    setup::{init_app_state, init_tracing},
};
use std::net::SocketAddr;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let config = AppConfig::from_env();
    init_tracing(&config.log_file)?;

    let app_state = init_app_state(config).await?;

    // Read config before moving app_state
    let bind_addr = app_state.config.bind_addr;
    let sweep_every = app_state.config.expiry_sweep_interval;

    tokio::spawn(run_expiry_sweep_loop(
        (*app_state.entitlement_use_cases).clone(),
        sweep_every,
    ));

    let app = create_app(app_state);

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;

    info!("Subscription service listening at {}", &listener.local_addr()?);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}
