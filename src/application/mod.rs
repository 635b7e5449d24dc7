pub mod app_error;
pub mod jwt;
pub mod ports;
pub mod use_cases;
pub mod user_locks;
