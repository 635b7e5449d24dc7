use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};

/// Payment method requested by the client. Unknown methods are charged through
/// the generic path.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    AsRefStr,
    Display,
    EnumString,
)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
pub enum PaymentMethod {
    #[default]
    Mock,
    Razorpay,
    Stripe,
}

impl PaymentMethod {
    pub fn from_str_lossy(s: &str) -> Self {
        s.trim().parse().unwrap_or_default()
    }

    /// Prefix of the payment references issued for this method.
    pub fn reference_prefix(&self) -> &'static str {
        match self {
            PaymentMethod::Razorpay => "RZP_",
            PaymentMethod::Stripe => "STR_",
            PaymentMethod::Mock => "PAY_",
        }
    }
}
