//! Stripe hosted checkout orchestration

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{info, warn};

use crate::database::Stores;
use crate::error::{AppError, AppResult};
use crate::models::{validate_items, LineItem, Order, PaymentTransaction, ShippingAddress};
use crate::payments::types::to_minor_units;
use crate::payments::{PaymentGateway, PaymentRequest, WebhookOutcome, WebhookPayload};
use crate::reconciliation::{ReconcileOutcome, Reconciler};

/// Tag sent with every Stripe session so dashboard entries can be traced back
const METADATA_SOURCE: &str = "storefront";

#[derive(Debug, Deserialize)]
pub struct CheckoutRequest {
    pub origin_url: String,
    pub items: Vec<LineItem>,
    #[serde(default)]
    pub shipping_address: Option<ShippingAddress>,
    #[serde(default)]
    pub discount_code: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CheckoutSessionResponse {
    pub url: String,
    pub session_id: String,
    pub order_id: String,
}

#[derive(Debug, Serialize)]
pub struct CheckoutStatusResponse {
    pub status: String,
    pub payment_status: String,
    /// Minor currency units, as Stripe reports it
    pub amount_total: Option<i64>,
    pub currency: Option<String>,
    pub metadata: serde_json::Value,
}

#[derive(Clone)]
pub struct CheckoutService {
    gateway: Arc<dyn PaymentGateway>,
    stores: Stores,
    reconciler: Reconciler,
    currency: String,
}

impl CheckoutService {
    pub fn new(
        gateway: Arc<dyn PaymentGateway>,
        stores: Stores,
        reconciler: Reconciler,
        currency: impl Into<String>,
    ) -> Self {
        Self {
            gateway,
            stores,
            reconciler,
            currency: currency.into(),
        }
    }

    /// Creates a Stripe session plus the local transaction and order records
    pub async fn create_session(
        &self,
        request: CheckoutRequest,
        user_id: Option<String>,
    ) -> AppResult<CheckoutSessionResponse> {
        let origin = validate_origin(&request.origin_url)?;
        validate_items(&request.items)?;

        let order = Order::new(
            user_id.clone(),
            request.items,
            request.shipping_address,
            request.discount_code,
            &self.currency,
        );

        let mut metadata = BTreeMap::new();
        metadata.insert("source".to_string(), METADATA_SOURCE.to_string());
        metadata.insert("items_count".to_string(), order.items.len().to_string());
        metadata.insert("order_id".to_string(), order.id.clone());

        let session = self
            .gateway
            .initiate(PaymentRequest {
                amount: order.total,
                currency: self.currency.clone(),
                reference: Some(order.id.clone()),
                success_url: Some(format!(
                    "{}/checkout/success?session_id={{CHECKOUT_SESSION_ID}}",
                    origin
                )),
                cancel_url: Some(format!("{}/checkout/cancel", origin)),
                items: order.items.0.clone(),
                metadata,
                ..PaymentRequest::default()
            })
            .await?;

        let url = session.redirect_url.ok_or_else(|| {
            AppError::payment_provider("Stripe", "Checkout session has no redirect URL")
        })?;
        let session_id = session.provider_session_id;

        let items_snapshot = serde_json::to_value(&order.items.0)
            .map_err(|e| AppError::internal(format!("Failed to snapshot cart: {}", e)))?;
        let transaction = PaymentTransaction::new(
            session_id.clone(),
            user_id,
            order.total,
            &self.currency,
            items_snapshot,
        );
        self.stores.transactions.insert(&transaction).await?;

        let order = order.with_session(session_id.clone());
        self.stores.orders.insert(&order).await?;

        info!(
            "Checkout session {} created for order {} ({:.2} {})",
            session_id, order.id, order.total, order.currency
        );

        Ok(CheckoutSessionResponse {
            url,
            session_id,
            order_id: order.id,
        })
    }

    /// Polls Stripe and reconciles the stored records with the answer
    pub async fn status(&self, session_id: &str) -> AppResult<CheckoutStatusResponse> {
        let report = self.gateway.query_status(session_id, None).await?;
        self.reconciler.apply(session_id, &report.result).await?;

        Ok(CheckoutStatusResponse {
            status: report.result.status.as_str().to_string(),
            payment_status: report
                .payment_status
                .unwrap_or_else(|| report.result.status.as_str().to_string()),
            amount_total: report.amount.map(to_minor_units),
            currency: report.currency,
            metadata: report.metadata,
        })
    }

    /// Verifies a Stripe delivery, then reconciles it
    ///
    /// Returns `None` for verified events that do not concern checkout state.
    pub async fn handle_webhook(
        &self,
        payload: WebhookPayload,
    ) -> AppResult<Option<ReconcileOutcome>> {
        match self.gateway.handle_webhook(&payload)? {
            WebhookOutcome::Reconcile { reference, result } => {
                Ok(Some(self.reconciler.apply(&reference, &result).await?))
            }
            WebhookOutcome::Ignored { reason } => {
                info!("Stripe webhook acknowledged without changes: {}", reason);
                Ok(None)
            }
        }
    }
}

/// Returns the origin without a trailing slash
fn validate_origin(origin_url: &str) -> AppResult<&str> {
    let origin = origin_url.trim().trim_end_matches('/');
    let valid = ["http://", "https://"]
        .iter()
        .any(|scheme| origin.len() > scheme.len() && origin.starts_with(scheme));
    if !valid {
        warn!("Rejected checkout origin {:?}", origin_url);
        return Err(AppError::validation(
            "origin_url must be an absolute http(s) URL",
        ));
    }
    Ok(origin)
}
