//! Stripe hosted checkout
//!
//! Creates Checkout Sessions, reads them back for status polls and verifies
//! `Stripe-Signature` headers on webhook deliveries.

use async_trait::async_trait;
use hmac::{Hmac, Mac};
use reqwest::Client;
use serde::Deserialize;
use sha2::Sha256;
use tracing::{debug, error, info, warn};

use crate::config::optional_env;
use crate::error::{AppError, AppResult};
use crate::http_client::{self, Upstream, FORM_CONTENT_TYPE};
use crate::payments::traits::PaymentGateway;
use crate::payments::types::{
    to_minor_units, PaymentRequest, PaymentSession, StatusReport, WebhookOutcome, WebhookPayload,
};
use crate::reconciliation::rules::StripeSignal;
use crate::reconciliation::{PaymentProviderKind, ProviderSignal, SignalInterpretation};

type HmacSha256 = Hmac<Sha256>;

const PROVIDER: &str = "Stripe";

/// Maximum age of a signed webhook timestamp
pub const SIGNATURE_TOLERANCE_SECS: i64 = 300;

/// Stripe configuration
#[derive(Debug, Clone)]
pub struct StripeConfig {
    /// Secret API key (`sk_...`)
    pub api_key: Option<String>,
    /// Endpoint signing secret (`whsec_...`)
    pub webhook_secret: Option<String>,
    /// Stripe API base URL (defaults to https://api.stripe.com)
    pub base_url: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for StripeConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            webhook_secret: None,
            base_url: "https://api.stripe.com".to_string(),
            timeout_secs: 30,
        }
    }
}

impl StripeConfig {
    /// Create config from environment variables
    pub fn from_env(timeout_secs: u64) -> Self {
        Self {
            api_key: optional_env("STRIPE_API_KEY"),
            webhook_secret: optional_env("STRIPE_WEBHOOK_SECRET"),
            base_url: optional_env("STRIPE_BASE_URL")
                .unwrap_or_else(|| "https://api.stripe.com".to_string()),
            timeout_secs,
        }
    }
}

/// Stripe payment gateway
pub struct StripeGateway {
    config: StripeConfig,
    client: Client,
}

impl StripeGateway {
    pub fn new(config: StripeConfig) -> AppResult<Self> {
        let client = http_client::build_client(PROVIDER, config.timeout_secs)?;
        Ok(Self { config, client })
    }

    fn api_key(&self) -> AppResult<&str> {
        self.config
            .api_key
            .as_deref()
            .ok_or_else(|| AppError::configuration("Stripe API key not configured"))
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> AppResult<StripeCheckoutSession> {
        let response = request
            .send()
            .await
            .map_err(|e| {
                http_client::transport_error(Upstream::Payment, PROVIDER, self.config.timeout_secs, e)
            })?;
        let (status, body) =
            http_client::read_body(Upstream::Payment, PROVIDER, self.config.timeout_secs, response)
                .await?;

        if !(200..300).contains(&status) {
            let message = serde_json::from_str::<StripeErrorEnvelope>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            error!("Stripe API error: HTTP {}: {}", status, message);
            return Err(AppError::payment_provider(
                PROVIDER,
                format!("HTTP {}: {}", status, message),
            ));
        }

        serde_json::from_str::<StripeCheckoutSession>(&body).map_err(|e| {
            error!("Failed to parse Stripe response: {}", e);
            AppError::payment_provider(PROVIDER, format!("Invalid response format: {}", e))
        })
    }

    fn session_form(request: &PaymentRequest) -> Vec<(String, String)> {
        let mut form = vec![
            ("mode".to_string(), "payment".to_string()),
            (
                "line_items[0][price_data][currency]".to_string(),
                request.currency.to_lowercase(),
            ),
            (
                "line_items[0][price_data][unit_amount]".to_string(),
                to_minor_units(request.amount).to_string(),
            ),
            (
                "line_items[0][price_data][product_data][name]".to_string(),
                match &request.reference {
                    Some(reference) => format!("Order {}", reference),
                    None => "Order".to_string(),
                },
            ),
            ("line_items[0][quantity]".to_string(), "1".to_string()),
        ];

        if let Some(url) = &request.success_url {
            form.push(("success_url".to_string(), url.clone()));
        }
        if let Some(url) = &request.cancel_url {
            form.push(("cancel_url".to_string(), url.clone()));
        }
        if let Some(reference) = &request.reference {
            form.push(("client_reference_id".to_string(), reference.clone()));
        }
        if let Some(email) = request.customer.as_ref().and_then(|c| c.email.clone()) {
            form.push(("customer_email".to_string(), email));
        }
        for (key, value) in &request.metadata {
            form.push((format!("metadata[{}]", key), value.clone()));
        }
        form
    }
}

#[async_trait]
impl PaymentGateway for StripeGateway {
    fn provider(&self) -> PaymentProviderKind {
        PaymentProviderKind::Stripe
    }

    async fn initiate(&self, request: PaymentRequest) -> AppResult<PaymentSession> {
        let api_key = self.api_key()?;
        info!(
            "Creating Stripe checkout session: {:.2} {} reference={:?}",
            request.amount, request.currency, request.reference
        );

        let body = http_client::form_body(&Self::session_form(&request))?;
        let session = self
            .send(
                self.client
                    .post(format!("{}/v1/checkout/sessions", self.config.base_url))
                    .basic_auth(api_key, Option::<&str>::None)
                    .header("Content-Type", FORM_CONTENT_TYPE)
                    .body(body),
            )
            .await?;

        let url = session.url.clone().ok_or_else(|| {
            AppError::payment_provider(PROVIDER, "Checkout session has no redirect URL")
        })?;

        info!("Stripe checkout session created: session_id={}", session.id);

        Ok(PaymentSession {
            provider_session_id: session.id,
            redirect_url: Some(url),
            widget_url: None,
            result_code: session.status,
            result_description: None,
        })
    }

    async fn query_status(&self, reference: &str, _brand: Option<&str>) -> AppResult<StatusReport> {
        let api_key = self.api_key()?;
        info!("Fetching Stripe checkout session: session_id={}", reference);

        let session_id = http_client::reference_segment("session id", reference)?;
        let url = http_client::endpoint(
            &self.config.base_url,
            &["v1", "checkout", "sessions", session_id],
        )?;

        let session = self
            .send(
                self.client
                    .get(url)
                    .basic_auth(api_key, Option::<&str>::None),
            )
            .await?;

        let signal = ProviderSignal::Stripe(StripeSignal {
            event_type: None,
            session_status: session.status.clone(),
            payment_status: session.payment_status.clone(),
        });

        debug!(
            "Stripe session {} status={:?} payment_status={:?}",
            reference, session.status, session.payment_status
        );

        Ok(StatusReport {
            result: signal.normalize(),
            amount: session.amount_total.map(|minor| minor as f64 / 100.0),
            currency: session.currency,
            metadata: session.metadata,
            session_status: session.status,
            payment_status: session.payment_status,
        })
    }

    fn handle_webhook(&self, payload: &WebhookPayload) -> AppResult<WebhookOutcome> {
        let secret = self
            .config
            .webhook_secret
            .as_deref()
            .ok_or_else(|| AppError::configuration("Stripe webhook secret not configured"))?;

        let header = payload
            .signature
            .as_deref()
            .ok_or_else(|| AppError::invalid_webhook("Missing Stripe-Signature header"))?;

        verify_signature(
            secret,
            &payload.body,
            header,
            chrono::Utc::now().timestamp(),
        )
        .map_err(|reason| {
            warn!("Stripe webhook signature rejected: {}", reason);
            AppError::invalid_webhook(reason)
        })?;

        let event: StripeEvent = serde_json::from_slice(&payload.body)
            .map_err(|e| AppError::invalid_webhook(format!("Malformed event body: {}", e)))?;

        info!("Stripe webhook verified: event_type={}", event.event_type);

        let signal = ProviderSignal::Stripe(StripeSignal {
            event_type: Some(event.event_type.clone()),
            session_status: event.data.object.status.clone(),
            payment_status: event.data.object.payment_status.clone(),
        });

        match signal.interpret() {
            SignalInterpretation::Apply(result) => {
                let reference = event.data.object.id.ok_or_else(|| {
                    AppError::invalid_webhook("Checkout event has no session id")
                })?;
                Ok(WebhookOutcome::Reconcile { reference, result })
            }
            SignalInterpretation::Ignore(reason) => Ok(WebhookOutcome::Ignored { reason }),
        }
    }
}

struct SignatureHeader {
    timestamp: i64,
    signatures: Vec<Vec<u8>>,
}

fn parse_signature_header(header: &str) -> Option<SignatureHeader> {
    let mut timestamp = None;
    let mut signatures = Vec::new();

    for part in header.split(',') {
        let (key, value) = part.trim().split_once('=')?;
        match key {
            "t" => timestamp = value.parse::<i64>().ok(),
            "v1" => {
                if let Ok(bytes) = hex::decode(value) {
                    signatures.push(bytes);
                }
            }
            _ => {}
        }
    }

    Some(SignatureHeader {
        timestamp: timestamp?,
        signatures,
    })
}

/// Checks a `Stripe-Signature` header against the raw request body
///
/// Accepts the delivery when any `v1` entry matches and the timestamp is
/// within [`SIGNATURE_TOLERANCE_SECS`] of `now`.
pub fn verify_signature(secret: &str, payload: &[u8], header: &str, now: i64) -> Result<(), String> {
    let header = parse_signature_header(header)
        .ok_or_else(|| "Malformed Stripe-Signature header".to_string())?;

    if header.signatures.is_empty() {
        return Err("No v1 signature in header".to_string());
    }

    if (now - header.timestamp).abs() > SIGNATURE_TOLERANCE_SECS {
        return Err(format!(
            "Timestamp outside tolerance ({} seconds)",
            now - header.timestamp
        ));
    }

    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| format!("Invalid webhook secret: {}", e))?;
    mac.update(header.timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);

    let valid = header
        .signatures
        .iter()
        .any(|candidate| mac.clone().verify_slice(candidate).is_ok());

    if valid {
        Ok(())
    } else {
        Err("Signature mismatch".to_string())
    }
}

/// Builds a `Stripe-Signature` header value for `payload`
pub fn sign_payload(secret: &str, timestamp: i64, payload: &[u8]) -> String {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .expect("HMAC can take key of any size");
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);
    format!("t={},v1={}", timestamp, hex::encode(mac.finalize().into_bytes()))
}

#[derive(Debug, Deserialize)]
struct StripeCheckoutSession {
    id: String,
    #[serde(default)]
    url: Option<String>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    payment_status: Option<String>,
    #[serde(default)]
    amount_total: Option<i64>,
    #[serde(default)]
    currency: Option<String>,
    #[serde(default)]
    metadata: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct StripeErrorEnvelope {
    error: StripeErrorBody,
}

#[derive(Debug, Deserialize)]
struct StripeErrorBody {
    message: String,
}

#[derive(Debug, Deserialize)]
struct StripeEvent {
    #[serde(rename = "type")]
    event_type: String,
    data: StripeEventData,
}

#[derive(Debug, Deserialize)]
struct StripeEventData {
    object: StripeEventObject,
}

#[derive(Debug, Deserialize)]
struct StripeEventObject {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    status: Option<String>,
    #[serde(default)]
    payment_status: Option<String>,
}
