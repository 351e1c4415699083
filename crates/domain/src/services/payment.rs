//! Payment provider abstraction.
//!
//! Only a mock provider exists; it hands out `pi_mock_*` / `cus_mock_*`
//! identifiers so the registration flow can be exercised end to end.

use rand::distributions::Alphanumeric;
use rand::Rng;
use serde::Serialize;
use thiserror::Error;

/// Payment provider errors.
#[derive(Debug, Error)]
pub enum PaymentError {
    #[error("Payment provider error: {0}")]
    Provider(String),

    #[error("Invalid payment amount: {0}")]
    InvalidAmount(f64),
}

/// Payment intent created for one registration.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub struct PaymentIntent {
    pub payment_intent_id: String,
    pub customer_id: String,
    pub client_secret: String,
    pub amount: f64,
    pub currency: String,
}

/// Payment provider used by the registration payment endpoints.
#[async_trait::async_trait]
pub trait PaymentService: Send + Sync {
    /// Opens a payment intent for `amount` in `currency`.
    async fn create_intent(
        &self,
        confirmation_number: &str,
        email: &str,
        amount: f64,
        currency: &str,
    ) -> Result<PaymentIntent, PaymentError>;

    /// Refunds a completed payment intent.
    async fn refund(&self, payment_intent_id: &str, amount: f64) -> Result<(), PaymentError>;
}

/// Mock payment service for development and testing.
///
/// Never contacts a provider.
#[derive(Debug, Clone, Default)]
pub struct MockPaymentService {
    /// Whether to simulate provider failures.
    pub simulate_failure: bool,
}

impl MockPaymentService {
    pub fn new() -> Self {
        Self {
            simulate_failure: false,
        }
    }

    /// Create a mock service that rejects every call.
    pub fn failing() -> Self {
        Self {
            simulate_failure: true,
        }
    }

    fn mock_id(prefix: &str) -> String {
        let suffix: String = rand::thread_rng()
            .sample_iter(&Alphanumeric)
            .take(24)
            .map(char::from)
            .collect();
        format!("{}_{}", prefix, suffix)
    }
}

#[async_trait::async_trait]
impl PaymentService for MockPaymentService {
    async fn create_intent(
        &self,
        confirmation_number: &str,
        email: &str,
        amount: f64,
        currency: &str,
    ) -> Result<PaymentIntent, PaymentError> {
        if !amount.is_finite() || amount < 0.0 {
            return Err(PaymentError::InvalidAmount(amount));
        }

        if self.simulate_failure {
            tracing::warn!(
                confirmation_number = %confirmation_number,
                "Mock payment service simulating failure"
            );
            return Err(PaymentError::Provider("Simulated failure".to_string()));
        }

        let payment_intent_id = Self::mock_id("pi_mock");
        let intent = PaymentIntent {
            client_secret: format!("{}_secret_{}", payment_intent_id, Self::mock_id("cs")),
            payment_intent_id,
            customer_id: Self::mock_id("cus_mock"),
            amount,
            currency: currency.to_string(),
        };

        tracing::info!(
            confirmation_number = %confirmation_number,
            email = %email,
            amount = %amount,
            currency = %currency,
            payment_intent_id = %intent.payment_intent_id,
            "Mock: Created payment intent"
        );

        Ok(intent)
    }

    async fn refund(&self, payment_intent_id: &str, amount: f64) -> Result<(), PaymentError> {
        if self.simulate_failure {
            tracing::warn!(
                payment_intent_id = %payment_intent_id,
                "Mock payment service simulating refund failure"
            );
            return Err(PaymentError::Provider("Simulated failure".to_string()));
        }

        tracing::info!(
            payment_intent_id = %payment_intent_id,
            amount = %amount,
            "Mock: Refunded payment"
        );
        Ok(())
    }
}
