//! HyperPay COPYandPAY integration
//!
//! Checkouts are created server side; the shopper pays through the widget
//! script served from `{base}/v1/paymentWidgets.js`. Results arrive either
//! from a status poll or from a signed notification.

use async_trait::async_trait;
use hmac::{Hmac, Mac};
use reqwest::Client;
use serde::Deserialize;
use sha2::Sha256;
use tracing::{error, info, warn};

use crate::config::optional_env;
use crate::error::{AppError, AppResult};
use crate::http_client::{self, Upstream, FORM_CONTENT_TYPE};
use crate::payments::traits::PaymentGateway;
use crate::payments::types::{
    PaymentRequest, PaymentSession, StatusReport, WebhookOutcome, WebhookPayload,
};
use crate::reconciliation::rules::{hyperpay_checkout_created, HyperPaySignal};
use crate::reconciliation::{PaymentProviderKind, ProviderSignal};

type HmacSha256 = Hmac<Sha256>;

const PROVIDER: &str = "HyperPay";

/// Default payment type: immediate debit
pub const DEFAULT_PAYMENT_TYPE: &str = "DB";

/// Header carrying the notification signature
pub const SIGNATURE_HEADER: &str = "x-hyperpay-signature";

#[derive(Debug, Clone)]
pub struct HyperPayConfig {
    /// https://eu-test.oppwa.com (test) or https://oppwa.com (live)
    pub base_url: String,
    pub access_token: Option<String>,
    /// Entity for VISA / MASTER
    pub entity_id: Option<String>,
    /// Separate entity for MADA, when the merchant has one
    pub entity_id_mada: Option<String>,
    /// Shared secret for notification signatures
    pub webhook_secret: Option<String>,
    pub timeout_secs: u64,
}

impl Default for HyperPayConfig {
    fn default() -> Self {
        Self {
            base_url: "https://eu-test.oppwa.com".to_string(),
            access_token: None,
            entity_id: None,
            entity_id_mada: None,
            webhook_secret: None,
            timeout_secs: 30,
        }
    }
}

impl HyperPayConfig {
    pub fn from_env(timeout_secs: u64) -> Self {
        Self {
            base_url: optional_env("HYPERPAY_BASE_URL")
                .unwrap_or_else(|| "https://eu-test.oppwa.com".to_string()),
            access_token: optional_env("HYPERPAY_ACCESS_TOKEN"),
            entity_id: optional_env("HYPERPAY_ENTITY_ID"),
            entity_id_mada: optional_env("HYPERPAY_ENTITY_ID_MADA"),
            webhook_secret: optional_env("HYPERPAY_WEBHOOK_SECRET"),
            timeout_secs,
        }
    }
}

pub struct HyperPayGateway {
    config: HyperPayConfig,
    client: Client,
}

impl HyperPayGateway {
    pub fn new(config: HyperPayConfig) -> AppResult<Self> {
        let client = http_client::build_client(PROVIDER, config.timeout_secs)?;
        Ok(Self { config, client })
    }

    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    /// Script URL the storefront loads to render the payment form
    pub fn widget_url(&self, checkout_id: &str) -> String {
        format!(
            "{}/v1/paymentWidgets.js?checkoutId={}",
            self.config.base_url, checkout_id
        )
    }

    fn credentials(&self, brand: Option<&str>) -> AppResult<(&str, &str)> {
        let missing: Vec<&str> = [
            ("HYPERPAY_ACCESS_TOKEN", self.config.access_token.is_none()),
            ("HYPERPAY_ENTITY_ID", self.config.entity_id.is_none()),
        ]
        .iter()
        .filter(|(_, missing)| *missing)
        .map(|(name, _)| *name)
        .collect();

        match (&self.config.access_token, &self.config.entity_id) {
            (Some(token), Some(entity)) => {
                Ok((token.as_str(), self.entity_for(brand, entity.as_str())))
            }
            _ => Err(AppError::configuration(format!(
                "HyperPay not configured (missing {})",
                missing.join(", ")
            ))),
        }
    }

    fn entity_for<'a>(&'a self, brand: Option<&str>, default: &'a str) -> &'a str {
        match (brand, &self.config.entity_id_mada) {
            (Some(b), Some(mada)) if b.eq_ignore_ascii_case("MADA") => mada.as_str(),
            _ => default,
        }
    }

    fn checkout_form(entity_id: &str, request: &PaymentRequest) -> Vec<(String, String)> {
        let currency = request.currency.to_uppercase();
        let mut form = vec![
            ("entityId".to_string(), entity_id.to_string()),
            ("amount".to_string(), format!("{:.2}", request.amount)),
            ("currency".to_string(), currency.clone()),
            (
                "paymentType".to_string(),
                request
                    .payment_type
                    .clone()
                    .unwrap_or_else(|| DEFAULT_PAYMENT_TYPE.to_string()),
            ),
        ];

        if let Some(reference) = &request.reference {
            form.push(("merchantTransactionId".to_string(), reference.clone()));
        }

        if let Some(customer) = &request.customer {
            let fields = [
                ("customer.email", &customer.email),
                ("customer.givenName", &customer.given_name),
                ("customer.surname", &customer.surname),
                ("customer.mobile", &customer.mobile),
                ("billing.street1", &customer.street),
                ("billing.city", &customer.city),
                ("billing.postcode", &customer.postcode),
            ];
            for (key, value) in fields {
                if let Some(value) = value {
                    form.push((key.to_string(), value.clone()));
                }
            }
            form.push((
                "billing.country".to_string(),
                customer.country.clone().unwrap_or_else(|| "SA".to_string()),
            ));
        }

        for (i, item) in request.items.iter().enumerate() {
            let name: String = item.name.chars().take(50).collect();
            form.push((format!("cart.items[{}].name", i), name));
            form.push((format!("cart.items[{}].quantity", i), item.quantity.to_string()));
            form.push((format!("cart.items[{}].price", i), format!("{:.2}", item.price)));
            form.push((format!("cart.items[{}].currency", i), currency.clone()));
        }

        form
    }

    /// Parses a HyperPay body, falling back to a provider error with the raw text
    fn parse_body(status: u16, body: &str) -> AppResult<HyperPayResponse> {
        serde_json::from_str::<HyperPayResponse>(body).map_err(|e| {
            error!("Unreadable HyperPay response (HTTP {}): {}", status, e);
            AppError::payment_provider(PROVIDER, format!("HTTP {}: {}", status, body))
        })
    }

    async fn execute(&self, request: reqwest::RequestBuilder) -> AppResult<(u16, String)> {
        let response = request.send().await.map_err(|e| {
            http_client::transport_error(Upstream::Payment, PROVIDER, self.config.timeout_secs, e)
        })?;
        http_client::read_body(Upstream::Payment, PROVIDER, self.config.timeout_secs, response)
            .await
    }
}

#[async_trait]
impl PaymentGateway for HyperPayGateway {
    fn provider(&self) -> PaymentProviderKind {
        PaymentProviderKind::HyperPay
    }

    async fn initiate(&self, request: PaymentRequest) -> AppResult<PaymentSession> {
        let (token, entity_id) = self.credentials(request.brand.as_deref())?;
        info!(
            "Creating HyperPay checkout: {:.2} {} brand={:?}",
            request.amount, request.currency, request.brand
        );

        let body = http_client::form_body(&Self::checkout_form(entity_id, &request))?;
        let (status, text) = self
            .execute(
                self.client
                    .post(format!("{}/v1/checkouts", self.config.base_url))
                    .bearer_auth(token)
                    .header("Content-Type", FORM_CONTENT_TYPE)
                    .body(body),
            )
            .await?;

        if status >= 500 {
            error!("HyperPay checkout failed: HTTP {}: {}", status, text);
            return Err(AppError::payment_provider(
                PROVIDER,
                format!("HTTP {}: {}", status, text),
            ));
        }

        let parsed = Self::parse_body(status, &text)?;
        let code = parsed.result.code.clone().unwrap_or_default();
        let description = parsed.result.description.clone();

        match parsed.id {
            Some(id) if hyperpay_checkout_created(&code) => {
                info!("HyperPay checkout created: checkout_id={} code={}", id, code);
                Ok(PaymentSession {
                    widget_url: Some(self.widget_url(&id)),
                    provider_session_id: id,
                    redirect_url: None,
                    result_code: Some(code),
                    result_description: description,
                })
            }
            _ => {
                warn!("HyperPay rejected checkout: code={} description={:?}", code, description);
                Err(AppError::provider_rejected(
                    PROVIDER,
                    Some(code.clone()),
                    format!(
                        "{} ({})",
                        description.unwrap_or_else(|| "Checkout creation failed".to_string()),
                        code
                    ),
                ))
            }
        }
    }

    async fn query_status(&self, reference: &str, brand: Option<&str>) -> AppResult<StatusReport> {
        let (token, entity_id) = self.credentials(brand)?;
        info!("Fetching HyperPay payment status: checkout_id={}", reference);

        let checkout_id = http_client::reference_segment("checkout id", reference)?;
        let mut url = http_client::endpoint(
            &self.config.base_url,
            &["v1", "checkouts", checkout_id, "payment"],
        )?;
        url.query_pairs_mut().append_pair("entityId", entity_id);

        let (status, text) = self
            .execute(self.client.get(url).bearer_auth(token))
            .await?;

        if status >= 500 {
            error!("HyperPay status failed: HTTP {}: {}", status, text);
            return Err(AppError::payment_provider(
                PROVIDER,
                format!("HTTP {}: {}", status, text),
            ));
        }

        // Declined payments come back as 4xx with a result block; a body
        // without a code reads as a failed payment
        let parsed = Self::parse_body(status, &text)?;
        let signal = ProviderSignal::HyperPay(HyperPaySignal {
            result_code: parsed.result.code.clone(),
            description: parsed.result.description.clone(),
        });

        Ok(StatusReport {
            result: signal.normalize(),
            amount: parsed.amount.as_deref().and_then(|a| a.parse().ok()),
            currency: parsed.currency,
            metadata: serde_json::json!({
                "payment_brand": parsed.payment_brand,
                "payment_type": parsed.payment_type,
            }),
            session_status: None,
            payment_status: parsed.result.code,
        })
    }

    fn handle_webhook(&self, payload: &WebhookPayload) -> AppResult<WebhookOutcome> {
        let secret = self
            .config
            .webhook_secret
            .as_deref()
            .ok_or_else(|| AppError::configuration("HyperPay webhook secret not configured"))?;

        let checkout_id = payload
            .params
            .get("checkoutId")
            .filter(|s| !s.is_empty())
            .ok_or_else(|| AppError::invalid_webhook("Missing checkoutId"))?;
        // Absent code is signed as the empty string and reconciles as a failure
        let code = payload
            .params
            .get("result.code")
            .map(String::as_str)
            .unwrap_or_default();
        let signature = payload
            .signature
            .as_deref()
            .ok_or_else(|| AppError::invalid_webhook("Missing X-HyperPay-Signature header"))?;

        if !verify_notification(secret, checkout_id, code, signature) {
            warn!("HyperPay notification signature rejected: checkout_id={}", checkout_id);
            return Err(AppError::invalid_webhook("Signature mismatch"));
        }

        let result = ProviderSignal::HyperPay(HyperPaySignal {
            result_code: Some(code).filter(|c| !c.is_empty()).map(str::to_string),
            description: payload.params.get("result.description").cloned(),
        })
        .normalize();

        info!(
            "HyperPay notification verified: checkout_id={} code={}",
            checkout_id, code
        );

        Ok(WebhookOutcome::Reconcile {
            reference: checkout_id.clone(),
            result,
        })
    }
}

fn notification_mac(secret: &str, checkout_id: &str, code: &str) -> HmacSha256 {
    let mut mac =
        HmacSha256::new_from_slice(secret.as_bytes()).expect("HMAC can take key of any size");
    mac.update(checkout_id.as_bytes());
    mac.update(b":");
    mac.update(code.as_bytes());
    mac
}

/// Constant-time check of a hex signature over `"{checkout_id}:{code}"`
pub fn verify_notification(secret: &str, checkout_id: &str, code: &str, signature: &str) -> bool {
    match hex::decode(signature.trim()) {
        Ok(bytes) => notification_mac(secret, checkout_id, code)
            .verify_slice(&bytes)
            .is_ok(),
        Err(_) => false,
    }
}

/// Hex signature a notification sender attaches
pub fn sign_notification(secret: &str, checkout_id: &str, code: &str) -> String {
    hex::encode(
        notification_mac(secret, checkout_id, code)
            .finalize()
            .into_bytes(),
    )
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct HyperPayResponse {
    #[serde(default)]
    id: Option<String>,
    #[serde(default)]
    result: HyperPayResult,
    #[serde(default)]
    amount: Option<String>,
    #[serde(default)]
    currency: Option<String>,
    #[serde(default)]
    payment_brand: Option<String>,
    #[serde(default)]
    payment_type: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct HyperPayResult {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    description: Option<String>,
}
