use crate::{
    errors::ServiceError,
    services::payments::{WebhookEvent, WebhookOutcome},
    ApiResponse, AppState,
};
use axum::{extract::State, http::HeaderMap, response::Json};
use bytes::Bytes;
use hmac::{Hmac, Mac};
use serde::Serialize;
use sha2::Sha256;
use tracing::{info, warn};
use utoipa::ToSchema;

type HmacSha256 = Hmac<Sha256>;

pub const SIGNATURE_HEADER: &str = "Stripe-Signature";
const DEFAULT_TOLERANCE_SECS: u64 = 300;

/// Acknowledgement returned to the provider
#[derive(Debug, Serialize, ToSchema)]
pub struct WebhookAck {
    pub received: bool,
    /// `processed`, `duplicate` or `ignored`
    pub outcome: String,
    /// Order numbers created by this delivery
    pub orders: Vec<String>,
}

impl From<WebhookOutcome> for WebhookAck {
    fn from(outcome: WebhookOutcome) -> Self {
        let (outcome, orders) = match outcome {
            WebhookOutcome::Processed { orders } => (
                "processed",
                orders.into_iter().map(|o| o.order_id).collect(),
            ),
            WebhookOutcome::Duplicate => ("duplicate", Vec::new()),
            WebhookOutcome::Ignored { .. } => ("ignored", Vec::new()),
        };
        Self {
            received: true,
            outcome: outcome.to_string(),
            orders,
        }
    }
}

// POST /api/order/webhook
#[utoipa::path(
    post,
    path = "/api/order/webhook",
    request_body = String,
    responses(
        (status = 200, description = "Webhook accepted", body = WebhookAck),
        (status = 401, description = "Invalid signature", body = crate::errors::ErrorResponse),
        (status = 400, description = "Invalid payload", body = crate::errors::ErrorResponse)
    ),
    tag = "Payments"
)]
pub async fn payment_webhook(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<ApiResponse<WebhookAck>>, ServiceError> {
    if let Some(secret) = state.config.payment_webhook_secret.as_deref() {
        let tolerance = state
            .config
            .payment_webhook_tolerance_secs
            .unwrap_or(DEFAULT_TOLERANCE_SECS);
        let header = headers
            .get(SIGNATURE_HEADER)
            .and_then(|h| h.to_str().ok())
            .unwrap_or_default();
        if !verify_signature(header, &body, secret, tolerance, chrono::Utc::now().timestamp()) {
            warn!("Payment webhook signature verification failed");
            return Err(ServiceError::Unauthorized(
                "invalid webhook signature".to_string(),
            ));
        }
    }

    let event: WebhookEvent = serde_json::from_slice(&body)
        .map_err(|e| ServiceError::InvalidInput(format!("invalid webhook payload: {}", e)))?;
    info!(event_id = %event.id, event_type = %event.event_type, "payment webhook received");

    let outcome = state.services.payments.handle_webhook(event).await?;
    Ok(Json(ApiResponse::success(WebhookAck::from(outcome))))
}

/// Checks a `t=…,v1=…` signature header against HMAC-SHA256 of `"{t}.{body}"`.
///
/// Any `v1` entry may match, which allows secret rotation on the provider side.
pub fn verify_signature(
    header: &str,
    payload: &[u8],
    secret: &str,
    tolerance_secs: u64,
    now: i64,
) -> bool {
    let mut timestamp = None;
    let mut candidates = Vec::new();
    for part in header.split(',') {
        match part.trim().split_once('=') {
            Some(("t", value)) => timestamp = Some(value),
            Some(("v1", value)) => candidates.push(value),
            _ => {}
        }
    }

    let Some(timestamp) = timestamp else {
        return false;
    };
    let Ok(issued) = timestamp.parse::<i64>() else {
        return false;
    };
    if (now - issued).unsigned_abs() > tolerance_secs {
        return false;
    }

    let expected = sign(secret, timestamp, payload);
    match expected {
        Some(expected) => candidates.iter().any(|sig| constant_time_eq(&expected, sig)),
        None => false,
    }
}

/// Hex HMAC-SHA256 of `"{timestamp}.{payload}"`
pub fn sign(secret: &str, timestamp: &str, payload: &[u8]) -> Option<String> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).ok()?;
    mac.update(timestamp.as_bytes());
    mac.update(b".");
    mac.update(payload);
    Some(hex::encode(mac.finalize().into_bytes()))
}

fn constant_time_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut res = 0u8;
    for (x, y) in a.as_bytes().iter().zip(b.as_bytes()) {
        res |= x ^ y;
    }
    res == 0
}
