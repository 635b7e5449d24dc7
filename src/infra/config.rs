use std::{net::SocketAddr, time::Duration};

use axum::http::HeaderValue;
use env_helpers::{get_env, get_env_default};
use secrecy::SecretString;

pub struct AppConfig {
    pub jwt_secret: SecretString,
    pub database_url: String,
    pub db_max_connections: u32,
    pub bind_addr: SocketAddr,
    pub cors_origin: HeaderValue,
    /// Upper bound on a single gateway charge.
    pub payment_timeout: Duration,
    /// Artificial delay of the mock gateway, zero to disable.
    pub mock_payment_latency: Duration,
    pub expiry_sweep_interval: Duration,
    /// Insert the default plans when the catalog is empty.
    pub seed_default_plans: bool,
    pub log_file: String,
}

impl AppConfig {
    pub fn from_env() -> Self {
        let jwt_secret: SecretString = SecretString::new(get_env::<String>("JWT_SECRET").into());
        let database_url: String = get_env("DATABASE_URL");
        let db_max_connections: u32 = get_env_default("DB_MAX_CONNECTIONS", 5);

        let bind_addr: SocketAddr =
            get_env_default("BIND_ADDR", SocketAddr::from(([127, 0, 0, 1], 3001)));
        let cors_origin: HeaderValue =
            get_env_default("CORS_ORIGIN", String::from("http://localhost:5173"))
                .parse()
                .unwrap_or_else(|_| HeaderValue::from_static("http://localhost:5173"));

        let payment_timeout_ms: u64 = get_env_default("PAYMENT_TIMEOUT_MS", 10_000);
        let mock_payment_latency_ms: u64 = get_env_default("MOCK_PAYMENT_LATENCY_MS", 0);
        let expiry_sweep_interval_secs: u64 = get_env_default("EXPIRY_SWEEP_INTERVAL_SECS", 3_600);
        let seed_default_plans: bool = get_env_default("SEED_DEFAULT_PLANS", true);
        let log_file: String = get_env_default("LOG_FILE", "app.log".to_string());

        Self {
            jwt_secret,
            database_url,
            db_max_connections,
            bind_addr,
            cors_origin,
            payment_timeout: Duration::from_millis(payment_timeout_ms),
            mock_payment_latency: Duration::from_millis(mock_payment_latency_ms),
            expiry_sweep_interval: Duration::from_secs(expiry_sweep_interval_secs.max(1)),
            seed_default_plans,
            log_file,
        }
    }
}
