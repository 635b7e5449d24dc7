use std::time::Duration;

use chrono::Utc;
use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, error, info};

use crate::use_cases::entitlements::EntitlementUseCases;

pub async fn run_expiry_sweep_loop(entitlements: EntitlementUseCases, every: Duration) {
    let mut ticker = interval(every);
    // A slow sweep must not trigger a burst of catch-up runs.
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    info!(
        "Subscription expiry sweep started (every {}s)",
        every.as_secs()
    );

    loop {
        ticker.tick().await;

        match entitlements.sweep_expired(Utc::now()).await {
            Ok(Some(0)) => debug!("Expiry sweep found nothing to expire"),
            Ok(Some(expired)) => info!(expired, "Expiry sweep finished"),
            Ok(None) => debug!("Previous expiry sweep still running"),
            Err(e) => error!(error = %e, "Expiry sweep failed"),
        }
    }
}
