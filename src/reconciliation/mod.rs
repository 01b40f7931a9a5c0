//! Payment status reconciliation
//!
//! `rules` turns provider vocabulary into a [`rules::NormalizedPaymentResult`];
//! `reconciler` writes that result to the stores.

pub mod reconciler;
pub mod rules;

pub use reconciler::{ReconcileOutcome, Reconciler};
pub use rules::{
    NormalizedPaymentResult, PaymentProviderKind, PaymentState, ProviderSignal,
    SignalInterpretation,
};
