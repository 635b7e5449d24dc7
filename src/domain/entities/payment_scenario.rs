use strum::{Display, EnumString};

/// Outcome simulated by the stub payment gateway for a given payment token.
/// Mirrors a subset of the well-known gateway test cards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum PaymentScenario {
    /// Charge succeeds (test card 4242424242424242)
    #[default]
    Approve,
    /// Card is declined (test card 4000000000000002)
    Decline,
    /// Insufficient funds (test card 4000000000009995)
    InsufficientFunds,
    /// Card is expired (test card 4000000000000069)
    ExpiredCard,
    /// Processing error (test card 4000000000000119)
    ProcessingError,
}

impl PaymentScenario {
    /// Detect the scenario from a payment token. Tokens may carry a test card
    /// number or a scenario name; anything else is approved.
    pub fn from_token(token: &str) -> Self {
        let token = token.trim().replace([' ', '-'], "");

        match token.as_str() {
            "4242424242424242" => PaymentScenario::Approve,
            "4000000000000002" => PaymentScenario::Decline,
            "4000000000009995" => PaymentScenario::InsufficientFunds,
            "4000000000000069" => PaymentScenario::ExpiredCard,
            "4000000000000119" => PaymentScenario::ProcessingError,
            s if s.starts_with("4000") => PaymentScenario::Decline,
            s => s.parse().unwrap_or_default(),
        }
    }

    /// Decline message shown to the user for failed scenarios.
    pub fn error_message(&self) -> Option<&'static str> {
        match self {
            PaymentScenario::Approve => None,
            PaymentScenario::Decline => Some("Your card was declined."),
            PaymentScenario::InsufficientFunds => Some("Your card has insufficient funds."),
            PaymentScenario::ExpiredCard => Some("Your card has expired."),
            PaymentScenario::ProcessingError => {
                Some("An error occurred while processing your card.")
            }
        }
    }
}
