use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{app_error::AppResult, domain::entities::payment_method::PaymentMethod};

/// Opaque reference for a successful charge.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PaymentReference(pub String);

impl PaymentReference {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for PaymentReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque reference for a refund.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RefundReference(pub String);

impl RefundReference {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for RefundReference {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Payment gateway port.
///
/// Calls may be slow (network round trips in a real gateway). Implementations
/// never retry; callers decide the retry and timeout policy. Failures are
/// reported as `AppError::PaymentFailed`.
#[async_trait]
pub trait PaymentGatewayPort: Send + Sync {
    /// Charge `amount_cents` using the given method and client token.
    async fn charge(
        &self,
        amount_cents: i64,
        method: PaymentMethod,
        token: &str,
    ) -> AppResult<PaymentReference>;

    /// Refund (part of) an earlier charge.
    async fn refund(
        &self,
        payment: &PaymentReference,
        amount_cents: i64,
    ) -> AppResult<RefundReference>;

    /// Whether the gateway recognises the reference as one of its charges.
    async fn verify(&self, payment: &PaymentReference) -> AppResult<bool>;
}
