use std::time::Duration;

use async_trait::async_trait;
use uuid::Uuid;

use crate::{
    app_error::{AppError, AppResult},
    application::ports::payment_gateway::{PaymentGatewayPort, PaymentReference, RefundReference},
    domain::entities::{payment_method::PaymentMethod, payment_scenario::PaymentScenario},
};

const REFUND_PREFIX: &str = "REF_";

/// Mock payment gateway for local development and testing.
///
/// Simulates charges locally without any external calls. The payment token
/// selects the outcome (see `PaymentScenario`); references carry the prefix of
/// the requested method so they can be verified later.
#[derive(Clone, Default)]
pub struct MockPaymentGateway {
    latency: Duration,
}

impl MockPaymentGateway {
    pub fn new(latency: Duration) -> Self {
        Self { latency }
    }

    /// Upper-case hex suffix of `len` characters.
    fn random_suffix(len: usize) -> String {
        let hex = Uuid::new_v4().simple().to_string().to_uppercase();
        hex[..len].to_string()
    }

    fn generate_payment_reference(method: PaymentMethod) -> PaymentReference {
        PaymentReference::new(format!(
            "{}{}",
            method.reference_prefix(),
            Self::random_suffix(12)
        ))
    }

    fn is_known_reference(reference: &PaymentReference) -> bool {
        [PaymentMethod::Razorpay, PaymentMethod::Stripe, PaymentMethod::Mock]
            .iter()
            .any(|m| reference.as_str().starts_with(m.reference_prefix()))
    }

    async fn simulate_latency(&self) {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
    }
}

#[async_trait]
impl PaymentGatewayPort for MockPaymentGateway {
    async fn charge(
        &self,
        amount_cents: i64,
        method: PaymentMethod,
        token: &str,
    ) -> AppResult<PaymentReference> {
        if token.trim().is_empty() {
            return Err(AppError::PaymentFailed("Invalid payment token".into()));
        }
        if amount_cents < 0 {
            return Err(AppError::PaymentFailed("Invalid amount".into()));
        }

        self.simulate_latency().await;

        let scenario = PaymentScenario::from_token(token);
        if let Some(message) = scenario.error_message() {
            tracing::debug!(method = %method, scenario = %scenario, "Mock: charge declined");
            return Err(AppError::PaymentFailed(message.to_string()));
        }

        let reference = Self::generate_payment_reference(method);
        tracing::debug!(
            method = %method,
            amount_cents,
            payment_id = %reference,
            "Mock: charge approved"
        );
        Ok(reference)
    }

    async fn refund(
        &self,
        payment: &PaymentReference,
        amount_cents: i64,
    ) -> AppResult<RefundReference> {
        if !Self::is_known_reference(payment) {
            return Err(AppError::PaymentFailed("Invalid payment reference".into()));
        }

        self.simulate_latency().await;

        let refund = RefundReference::new(format!("{}{}", REFUND_PREFIX, Self::random_suffix(8)));
        tracing::debug!(
            payment_id = %payment,
            refund_id = %refund,
            amount_cents,
            "Mock: refund issued"
        );
        Ok(refund)
    }

    async fn verify(&self, payment: &PaymentReference) -> AppResult<bool> {
        Ok(Self::is_known_reference(payment))
    }
}
