pub mod feature;
pub mod payment_method;
pub mod payment_scenario;
pub mod subscription_plan;
pub mod user_subscription;
