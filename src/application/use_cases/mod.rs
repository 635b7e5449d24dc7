pub mod entitlements;
pub mod plan_catalog;
pub mod resource_guard;
pub mod subscription_ledger;
