use serde::Serialize;
use std::sync::Arc;
use tracing::{info, warn};

use crate::database::repository::{HyperPayStore, OrderStore, TransactionStore};
use crate::database::Stores;
use crate::error::AppResult;
use crate::models::StatusUpdate;
use crate::reconciliation::rules::{
    hyperpay_order_status, NormalizedPaymentResult, PaymentProviderKind,
};

/// What a reconciliation pass changed
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReconcileOutcome {
    pub provider: PaymentProviderKind,
    pub reference: String,
    pub status: String,
    /// Whether a transaction record matched the reference
    pub transaction_updated: bool,
    pub orders_updated: u64,
}

impl ReconcileOutcome {
    pub fn matched_anything(&self) -> bool {
        self.transaction_updated || self.orders_updated > 0
    }
}

/// Writes normalised payment results to the transaction and order records
///
/// Status polls and webhooks for the same provider both go through
/// [`Reconciler::apply`], so the stored state does not depend on which path
/// delivered the result.
#[derive(Clone)]
pub struct Reconciler {
    transactions: Arc<dyn TransactionStore>,
    hyperpay: Arc<dyn HyperPayStore>,
    orders: Arc<dyn OrderStore>,
}

impl Reconciler {
    pub fn new(stores: &Stores) -> Self {
        Self {
            transactions: stores.transactions.clone(),
            hyperpay: stores.hyperpay.clone(),
            orders: stores.orders.clone(),
        }
    }

    /// Applies `result` to records keyed by `reference`
    ///
    /// `reference` is the Stripe session id or the HyperPay checkout id.
    /// Missing records are reported in the outcome, not as errors.
    pub async fn apply(
        &self,
        reference: &str,
        result: &NormalizedPaymentResult,
    ) -> AppResult<ReconcileOutcome> {
        let outcome = match result.provider {
            PaymentProviderKind::Stripe => self.apply_stripe(reference, result).await?,
            PaymentProviderKind::HyperPay => self.apply_hyperpay(reference, result).await?,
        };

        if outcome.matched_anything() {
            info!(
                provider = ?outcome.provider,
                reference = %reference,
                status = %outcome.status,
                orders_updated = outcome.orders_updated,
                "Payment status reconciled"
            );
        } else {
            warn!(
                provider = ?outcome.provider,
                reference = %reference,
                "No records matched payment reference"
            );
        }

        Ok(outcome)
    }

    async fn apply_stripe(
        &self,
        session_id: &str,
        result: &NormalizedPaymentResult,
    ) -> AppResult<ReconcileOutcome> {
        let status = result.status.as_str();
        let payment_status = result.raw_code.as_deref().unwrap_or(status);
        let update = StatusUpdate::new(status, payment_status);

        let transaction_updated = self.transactions.update_status(session_id, &update).await?;
        if !transaction_updated {
            warn!("No payment transaction for Stripe session {}", session_id);
        }

        let orders_updated = self
            .orders
            .update_status_by_session(session_id, &update)
            .await?;

        Ok(ReconcileOutcome {
            provider: PaymentProviderKind::Stripe,
            reference: session_id.to_string(),
            status: status.to_string(),
            transaction_updated,
            orders_updated,
        })
    }

    async fn apply_hyperpay(
        &self,
        checkout_id: &str,
        result: &NormalizedPaymentResult,
    ) -> AppResult<ReconcileOutcome> {
        let status = result.status.as_str();

        let transaction_updated = self
            .hyperpay
            .update_result(
                checkout_id,
                status,
                result.raw_code.as_deref(),
                result.raw_description.as_deref(),
            )
            .await?;
        if !transaction_updated {
            warn!("No HyperPay transaction for checkout {}", checkout_id);
        }

        let (order_status, order_payment_status) = hyperpay_order_status(result.status);
        let orders_updated = self
            .orders
            .update_status_by_session(
                checkout_id,
                &StatusUpdate::new(order_status, order_payment_status),
            )
            .await?;

        Ok(ReconcileOutcome {
            provider: PaymentProviderKind::HyperPay,
            reference: checkout_id.to_string(),
            status: status.to_string(),
            transaction_updated,
            orders_updated,
        })
    }
}
