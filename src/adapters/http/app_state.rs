use std::sync::Arc;

use crate::{infra::config::AppConfig, use_cases::entitlements::EntitlementUseCases};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub entitlement_use_cases: Arc<EntitlementUseCases>,
}
