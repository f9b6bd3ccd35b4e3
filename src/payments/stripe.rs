use super::{
    CheckoutSession, CheckoutSessionRequest, PaidLine, PaymentGateway, PaymentGatewayError,
};
use async_trait::async_trait;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

const PRODUCT_ID_METADATA_KEY: &str = "productId";

/// Stripe Checkout over the form-encoded REST API
#[derive(Clone)]
pub struct StripeGateway {
    client: reqwest::Client,
    secret_key: String,
    api_base: String,
}

impl std::fmt::Debug for StripeGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StripeGateway")
            .field("api_base", &self.api_base)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Deserialize)]
struct SessionResponse {
    id: String,
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LineItemList {
    data: Vec<LineItem>,
    #[serde(default)]
    has_more: bool,
}

#[derive(Debug, Deserialize)]
struct LineItem {
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    quantity: Option<i32>,
    amount_total: i64,
    #[serde(default)]
    price: Option<Price>,
}

#[derive(Debug, Deserialize)]
struct Price {
    #[serde(default)]
    product: Option<ExpandedProduct>,
}

/// `price.product` is an object only when expanded
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ExpandedProduct {
    Object {
        #[serde(default)]
        name: Option<String>,
        #[serde(default)]
        images: Vec<String>,
        #[serde(default)]
        metadata: HashMap<String, String>,
    },
    Id(String),
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: Option<String>,
}

impl StripeGateway {
    pub fn new(
        secret_key: impl Into<String>,
        api_base: impl Into<String>,
    ) -> Result<Self, PaymentGatewayError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()?;
        Ok(Self {
            client,
            secret_key: secret_key.into(),
            api_base: api_base.into().trim_end_matches('/').to_string(),
        })
    }

    /// Flatten a session request into Stripe's bracketed form keys
    fn session_form(request: &CheckoutSessionRequest) -> Vec<(String, String)> {
        let mut form = vec![
            ("mode".to_string(), "payment".to_string()),
            ("payment_method_types[0]".to_string(), "card".to_string()),
            ("success_url".to_string(), request.success_url.clone()),
            ("cancel_url".to_string(), request.cancel_url.clone()),
        ];
        if let Some(email) = &request.customer_email {
            form.push(("customer_email".to_string(), email.clone()));
        }
        for (key, value) in &request.metadata {
            form.push((format!("metadata[{key}]"), value.clone()));
        }
        for (i, line) in request.lines.iter().enumerate() {
            let prefix = format!("line_items[{i}]");
            form.push((
                format!("{prefix}[price_data][currency]"),
                request.currency.clone(),
            ));
            form.push((
                format!("{prefix}[price_data][unit_amount]"),
                line.unit_amount.to_string(),
            ));
            form.push((
                format!("{prefix}[price_data][product_data][name]"),
                line.name.clone(),
            ));
            for (j, image) in line.images.iter().enumerate() {
                form.push((
                    format!("{prefix}[price_data][product_data][images][{j}]"),
                    image.clone(),
                ));
            }
            form.push((
                format!("{prefix}[price_data][product_data][metadata][{PRODUCT_ID_METADATA_KEY}]"),
                line.product_id.to_string(),
            ));
            form.push((format!("{prefix}[quantity]"), line.quantity.to_string()));
        }
        form
    }

    async fn error_from(response: reqwest::Response) -> PaymentGatewayError {
        let status = response.status().as_u16();
        let message = match response.json::<ErrorEnvelope>().await {
            Ok(envelope) => envelope
                .error
                .message
                .unwrap_or_else(|| "unknown error".to_string()),
            Err(e) => e.to_string(),
        };
        PaymentGatewayError::Api { status, message }
    }
}

impl From<LineItem> for PaidLine {
    fn from(item: LineItem) -> Self {
        let (name, images, product_id) = match item.price.and_then(|p| p.product) {
            Some(ExpandedProduct::Object {
                name,
                images,
                metadata,
            }) => (
                name,
                images,
                metadata
                    .get(PRODUCT_ID_METADATA_KEY)
                    .and_then(|id| Uuid::parse_str(id).ok()),
            ),
            Some(ExpandedProduct::Id(_)) | None => (None, Vec::new(), None),
        };

        PaidLine {
            product_id,
            name: name.or(item.description).unwrap_or_default(),
            images,
            quantity: item.quantity.unwrap_or(1),
            amount_total: item.amount_total,
        }
    }
}

#[async_trait]
impl PaymentGateway for StripeGateway {
    #[instrument(skip(self, request), fields(lines = request.lines.len()))]
    async fn create_checkout_session(
        &self,
        request: CheckoutSessionRequest,
    ) -> Result<CheckoutSession, PaymentGatewayError> {
        let response = self
            .client
            .post(format!("{}/v1/checkout/sessions", self.api_base))
            .bearer_auth(&self.secret_key)
            .form(&Self::session_form(&request))
            .send()
            .await?;

        if !response.status().is_success() {
            let err = Self::error_from(response).await;
            warn!(error = %err, "checkout session creation rejected");
            return Err(err);
        }

        let session: SessionResponse = response
            .json()
            .await
            .map_err(|e| PaymentGatewayError::Decode(e.to_string()))?;
        debug!(session_id = %session.id, "checkout session created");

        Ok(CheckoutSession {
            session_id: session.id,
            url: session.url,
        })
    }

    #[instrument(skip(self))]
    async fn list_paid_lines(&self, session_id: &str) -> Result<Vec<PaidLine>, PaymentGatewayError> {
        let response = self
            .client
            .get(format!(
                "{}/v1/checkout/sessions/{}/line_items",
                self.api_base, session_id
            ))
            .bearer_auth(&self.secret_key)
            .query(&[("expand[]", "data.price.product"), ("limit", "100")])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(Self::error_from(response).await);
        }

        let list: LineItemList = response
            .json()
            .await
            .map_err(|e| PaymentGatewayError::Decode(e.to_string()))?;
        if list.has_more {
            warn!(session_id, "session has more than 100 line items; extra lines ignored");
        }

        Ok(list.data.into_iter().map(PaidLine::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payments::CheckoutLine;
    use std::collections::BTreeMap;

    #[test]
    fn session_form_uses_bracketed_keys() {
        let product_id = Uuid::new_v4();
        let request = CheckoutSessionRequest {
            customer_email: Some("asha@example.com".into()),
            currency: "inr".into(),
            lines: vec![CheckoutLine {
                product_id,
                name: "Basmati Rice".into(),
                images: vec!["https://img/rice.png".into()],
                unit_amount: 9700,
                quantity: 2,
            }],
            metadata: BTreeMap::from([("userId".to_string(), "u-1".to_string())]),
            success_url: "http://shop/success".into(),
            cancel_url: "http://shop/cancel".into(),
        };
        let form: HashMap<String, String> = StripeGateway::session_form(&request)
            .into_iter()
            .collect();

        assert_eq!(form["mode"], "payment");
        assert_eq!(form["metadata[userId]"], "u-1");
        assert_eq!(form["line_items[0][price_data][unit_amount]"], "9700");
        assert_eq!(form["line_items[0][quantity]"], "2");
        assert_eq!(
            form["line_items[0][price_data][product_data][metadata][productId]"],
            product_id.to_string()
        );
        assert_eq!(
            form["line_items[0][price_data][product_data][images][0]"],
            "https://img/rice.png"
        );
    }

    #[test]
    fn unexpanded_product_still_yields_a_line() {
        let item: LineItem = serde_json::from_value(serde_json::json!({
            "description": "Milk",
            "quantity": 3,
            "amount_total": 15000,
            "price": { "product": "prod_123" }
        }))
        .unwrap();
        let line = PaidLine::from(item);
        assert_eq!(line.name, "Milk");
        assert_eq!(line.product_id, None);
        assert_eq!(line.quantity, 3);
    }
}
