//! Hosted-checkout payment provider seam.
//!
//! Services talk to [`PaymentGateway`]; [`StripeGateway`] is the production
//! implementation and tests substitute an in-memory one.

use crate::errors::ServiceError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;
use uuid::Uuid;

mod stripe;

pub use stripe::StripeGateway;

/// One purchasable line sent to the provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutLine {
    pub product_id: Uuid,
    pub name: String,
    pub images: Vec<String>,
    /// Discounted unit price in minor units
    pub unit_amount: i64,
    pub quantity: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutSessionRequest {
    pub customer_email: Option<String>,
    pub currency: String,
    pub lines: Vec<CheckoutLine>,
    pub metadata: BTreeMap<String, String>,
    pub success_url: String,
    pub cancel_url: String,
}

/// Session handle returned to the client for redirect
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutSession {
    pub session_id: String,
    pub url: Option<String>,
}

/// A line the provider reports as paid for a completed session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaidLine {
    /// Catalog product id echoed back through line metadata
    pub product_id: Option<Uuid>,
    pub name: String,
    pub images: Vec<String>,
    pub quantity: i32,
    /// Amount charged for the whole line, minor units
    pub amount_total: i64,
}

#[derive(Debug, Error)]
pub enum PaymentGatewayError {
    #[error("payment provider is not configured")]
    NotConfigured,

    #[error("payment provider request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("payment provider returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("unexpected payment provider response: {0}")]
    Decode(String),
}

impl From<PaymentGatewayError> for ServiceError {
    fn from(err: PaymentGatewayError) -> Self {
        match err {
            PaymentGatewayError::NotConfigured => {
                ServiceError::InvalidOperation("Online payment is not available".to_string())
            }
            other => ServiceError::ExternalServiceError(other.to_string()),
        }
    }
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Open a hosted checkout session
    async fn create_checkout_session(
        &self,
        request: CheckoutSessionRequest,
    ) -> Result<CheckoutSession, PaymentGatewayError>;

    /// Line items the provider charged for a session
    async fn list_paid_lines(&self, session_id: &str) -> Result<Vec<PaidLine>, PaymentGatewayError>;
}

/// Stand-in used when no provider key is configured
#[derive(Debug, Default, Clone)]
pub struct DisabledGateway;

#[async_trait]
impl PaymentGateway for DisabledGateway {
    async fn create_checkout_session(
        &self,
        _request: CheckoutSessionRequest,
    ) -> Result<CheckoutSession, PaymentGatewayError> {
        Err(PaymentGatewayError::NotConfigured)
    }

    async fn list_paid_lines(&self, _session_id: &str) -> Result<Vec<PaidLine>, PaymentGatewayError> {
        Err(PaymentGatewayError::NotConfigured)
    }
}
