//! HyperPay COPYandPAY orchestration

use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

use crate::database::Stores;
use crate::error::{AppError, AppResult};
use crate::models::{HyperPayTransaction, LineItem};
use crate::payments::providers::hyperpay::DEFAULT_PAYMENT_TYPE;
use crate::payments::types::CustomerInfo;
use crate::payments::{PaymentGateway, PaymentRequest, WebhookOutcome, WebhookPayload};
use crate::reconciliation::{PaymentState, ReconcileOutcome, Reconciler};

#[derive(Debug, Deserialize)]
pub struct InitiateRequest {
    pub amount: f64,
    #[serde(default)]
    pub currency: Option<String>,
    #[serde(default)]
    pub payment_type: Option<String>,
    #[serde(default)]
    pub brand: Option<String>,
    #[serde(default)]
    pub order_id: Option<String>,
    #[serde(default)]
    pub customer: Option<CustomerInfo>,
    #[serde(default)]
    pub items: Vec<LineItem>,
}

#[derive(Debug, Serialize)]
pub struct InitiateResponse {
    pub checkout_id: String,
    pub widget_url: String,
    pub base_url: String,
    pub result_code: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct HyperPayStatusResponse {
    pub checkout_id: String,
    pub status: PaymentState,
    pub result_code: Option<String>,
    pub result_description: Option<String>,
    pub amount: Option<f64>,
    pub currency: Option<String>,
    pub order_updated: bool,
}

#[derive(Clone)]
pub struct HyperPayService {
    gateway: Arc<dyn PaymentGateway>,
    stores: Stores,
    reconciler: Reconciler,
    base_url: String,
    currency: String,
}

impl HyperPayService {
    pub fn new(
        gateway: Arc<dyn PaymentGateway>,
        stores: Stores,
        reconciler: Reconciler,
        base_url: impl Into<String>,
        currency: impl Into<String>,
    ) -> Self {
        Self {
            gateway,
            stores,
            reconciler,
            base_url: base_url.into(),
            currency: currency.into(),
        }
    }

    pub async fn initiate(
        &self,
        request: InitiateRequest,
        user_id: Option<String>,
    ) -> AppResult<InitiateResponse> {
        if !request.amount.is_finite() || request.amount <= 0.0 {
            return Err(AppError::validation("amount must be greater than zero"));
        }

        // Unknown orders are rejected before the provider is contacted
        if let Some(order_id) = &request.order_id {
            if self.stores.orders.find_by_id(order_id).await?.is_none() {
                return Err(AppError::not_found("Order", order_id.clone()));
            }
        }

        let currency = request
            .currency
            .clone()
            .unwrap_or_else(|| self.currency.clone())
            .to_uppercase();
        let payment_type = request
            .payment_type
            .clone()
            .unwrap_or_else(|| DEFAULT_PAYMENT_TYPE.to_string());

        let session = self
            .gateway
            .initiate(PaymentRequest {
                amount: request.amount,
                currency: currency.clone(),
                reference: request.order_id.clone(),
                payment_type: Some(payment_type.clone()),
                brand: request.brand.clone(),
                customer: request.customer,
                items: request.items,
                ..PaymentRequest::default()
            })
            .await?;

        let checkout_id = session.provider_session_id;
        let widget_url = session.widget_url.ok_or_else(|| {
            AppError::payment_provider("HyperPay", "Checkout has no widget URL")
        })?;

        let transaction = HyperPayTransaction::new(
            checkout_id.clone(),
            request.order_id.clone(),
            user_id,
            request.amount,
            &currency,
            &payment_type,
            request.brand,
            session.result_code.clone(),
            session.result_description,
        );
        self.stores.hyperpay.insert(&transaction).await?;

        if let Some(order_id) = &request.order_id {
            if !self.stores.orders.attach_session(order_id, &checkout_id).await? {
                warn!("Order {} vanished before checkout {} was attached", order_id, checkout_id);
            }
        }

        info!("HyperPay checkout {} recorded", checkout_id);

        Ok(InitiateResponse {
            checkout_id,
            widget_url,
            base_url: self.base_url.clone(),
            result_code: session.result_code,
        })
    }

    /// Polls HyperPay and reconciles the stored records with the answer
    pub async fn status(&self, checkout_id: &str) -> AppResult<HyperPayStatusResponse> {
        // MADA checkouts must be queried with the MADA entity
        let brand = self
            .stores
            .hyperpay
            .find_by_checkout_id(checkout_id)
            .await?
            .and_then(|tx| tx.brand);

        let report = self.gateway.query_status(checkout_id, brand.as_deref()).await?;
        let outcome = self.reconciler.apply(checkout_id, &report.result).await?;

        Ok(HyperPayStatusResponse {
            checkout_id: checkout_id.to_string(),
            status: report.result.status,
            result_code: report.result.raw_code,
            result_description: report.result.raw_description,
            amount: report.amount,
            currency: report.currency,
            order_updated: outcome.orders_updated > 0,
        })
    }

    pub async fn handle_webhook(&self, payload: WebhookPayload) -> AppResult<Option<ReconcileOutcome>> {
        match self.gateway.handle_webhook(&payload)? {
            WebhookOutcome::Reconcile { reference, result } => {
                Ok(Some(self.reconciler.apply(&reference, &result).await?))
            }
            WebhookOutcome::Ignored { reason } => {
                info!("HyperPay notification acknowledged without changes: {}", reason);
                Ok(None)
            }
        }
    }
}
