//! Provider status normalisation
//!
//! Each payment provider reports progress in its own vocabulary. The rules in
//! this module are the only place that vocabulary is interpreted; everything
//! downstream sees a [`NormalizedPaymentResult`].

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::OnceLock;

/// Successful HyperPay payment result codes
const HYPERPAY_SUCCESS_PATTERN: &str = r"^(000\.000|000\.100\.1)";

/// HyperPay code returned when a checkout was created
const HYPERPAY_CHECKOUT_CREATED_PATTERN: &str = r"^000\.200\.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentState {
    Pending,
    Completed,
    Failed,
}

impl PaymentState {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentState::Pending => "pending",
            PaymentState::Completed => "completed",
            PaymentState::Failed => "failed",
        }
    }
}

impl fmt::Display for PaymentState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentProviderKind {
    Stripe,
    HyperPay,
}

impl PaymentProviderKind {
    pub fn display_name(&self) -> &'static str {
        match self {
            PaymentProviderKind::Stripe => "Stripe",
            PaymentProviderKind::HyperPay => "HyperPay",
        }
    }
}

/// Stripe checkout session vocabulary, from a webhook event or a poll
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StripeSignal {
    /// Set for webhook deliveries (`checkout.session.completed`, ...)
    pub event_type: Option<String>,
    /// Session `status`: `open`, `complete` or `expired`
    pub session_status: Option<String>,
    /// Session `payment_status`: `paid`, `unpaid` or `no_payment_required`
    pub payment_status: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HyperPaySignal {
    pub result_code: Option<String>,
    pub description: Option<String>,
}

/// Raw provider status before interpretation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProviderSignal {
    Stripe(StripeSignal),
    HyperPay(HyperPaySignal),
}

/// Provider-neutral payment result
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NormalizedPaymentResult {
    pub provider: PaymentProviderKind,
    pub status: PaymentState,
    /// Provider status code, kept for the record
    pub raw_code: Option<String>,
    pub raw_description: Option<String>,
}

/// Result of interpreting a webhook event
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignalInterpretation {
    Apply(NormalizedPaymentResult),
    /// The event carries nothing this system tracks
    Ignore(String),
}

impl ProviderSignal {
    pub fn provider(&self) -> PaymentProviderKind {
        match self {
            ProviderSignal::Stripe(_) => PaymentProviderKind::Stripe,
            ProviderSignal::HyperPay(_) => PaymentProviderKind::HyperPay,
        }
    }

    /// Interprets the signal, ignoring webhook events outside the checkout lifecycle
    pub fn interpret(&self) -> SignalInterpretation {
        match self {
            ProviderSignal::Stripe(signal) => match &signal.event_type {
                Some(event_type) => match stripe_event_state(event_type) {
                    Some(status) => SignalInterpretation::Apply(stripe_result(signal, status)),
                    None => SignalInterpretation::Ignore(format!(
                        "event type '{}' does not affect checkout state",
                        event_type
                    )),
                },
                None => {
                    SignalInterpretation::Apply(stripe_result(signal, stripe_poll_state(signal)))
                }
            },
            ProviderSignal::HyperPay(_) => SignalInterpretation::Apply(self.normalize()),
        }
    }

    /// Maps the signal to a canonical state
    ///
    /// Unrecognised webhook events normalise to `Pending`; callers that can
    /// receive arbitrary events should use [`ProviderSignal::interpret`].
    pub fn normalize(&self) -> NormalizedPaymentResult {
        match self {
            ProviderSignal::Stripe(signal) => {
                let status = match &signal.event_type {
                    Some(event_type) => {
                        stripe_event_state(event_type).unwrap_or(PaymentState::Pending)
                    }
                    None => stripe_poll_state(signal),
                };
                stripe_result(signal, status)
            }
            ProviderSignal::HyperPay(signal) => NormalizedPaymentResult {
                provider: PaymentProviderKind::HyperPay,
                status: hyperpay_state(signal.result_code.as_deref()),
                raw_code: signal.result_code.clone(),
                raw_description: signal.description.clone(),
            },
        }
    }
}

fn stripe_result(signal: &StripeSignal, status: PaymentState) -> NormalizedPaymentResult {
    NormalizedPaymentResult {
        provider: PaymentProviderKind::Stripe,
        status,
        raw_code: signal.payment_status.clone(),
        raw_description: signal
            .event_type
            .clone()
            .or_else(|| signal.session_status.clone()),
    }
}

/// Webhook event types that move a checkout session
pub fn stripe_event_state(event_type: &str) -> Option<PaymentState> {
    match event_type {
        "checkout.session.completed" | "checkout.session.async_payment_succeeded" => {
            Some(PaymentState::Completed)
        }
        "checkout.session.async_payment_failed" | "checkout.session.expired" => {
            Some(PaymentState::Failed)
        }
        _ => None,
    }
}

/// Session state read back from the sessions API. Never completes by default.
pub fn stripe_poll_state(signal: &StripeSignal) -> PaymentState {
    let payment_status = signal.payment_status.as_deref();
    let session_status = signal.session_status.as_deref();

    match (session_status, payment_status) {
        (_, Some("paid")) | (_, Some("no_payment_required")) => PaymentState::Completed,
        (Some("expired"), _) => PaymentState::Failed,
        (Some("open"), _) => PaymentState::Pending,
        (Some("complete"), Some("unpaid")) => PaymentState::Pending,
        _ => PaymentState::Failed,
    }
}

fn hyperpay_success() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(HYPERPAY_SUCCESS_PATTERN).expect("valid regex literal"))
}

fn hyperpay_created() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(HYPERPAY_CHECKOUT_CREATED_PATTERN).expect("valid regex literal"))
}

/// HyperPay has no pending state for a finished payment; anything that is not
/// an explicit success code is a failure.
pub fn hyperpay_state(result_code: Option<&str>) -> PaymentState {
    match result_code {
        Some(code) if hyperpay_success().is_match(code) => PaymentState::Completed,
        _ => PaymentState::Failed,
    }
}

/// Whether a checkout creation call succeeded
pub fn hyperpay_checkout_created(result_code: &str) -> bool {
    hyperpay_created().is_match(result_code)
}

/// Order fields written for a HyperPay result
pub fn hyperpay_order_status(state: PaymentState) -> (&'static str, &'static str) {
    match state {
        PaymentState::Completed => ("confirmed", "paid"),
        PaymentState::Failed => ("failed", "failed"),
        PaymentState::Pending => ("pending", "pending"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn stripe_event(event_type: &str, payment_status: Option<&str>) -> ProviderSignal {
        ProviderSignal::Stripe(StripeSignal {
            event_type: Some(event_type.to_string()),
            session_status: None,
            payment_status: payment_status.map(str::to_string),
        })
    }

    fn stripe_poll(session_status: Option<&str>, payment_status: Option<&str>) -> PaymentState {
        stripe_poll_state(&StripeSignal {
            event_type: None,
            session_status: session_status.map(str::to_string),
            payment_status: payment_status.map(str::to_string),
        })
    }

    fn hyperpay(code: Option<&str>) -> ProviderSignal {
        ProviderSignal::HyperPay(HyperPaySignal {
            result_code: code.map(str::to_string),
            description: None,
        })
    }

    #[test]
    fn test_completed_event_completes_regardless_of_payment_status() {
        let result = stripe_event("checkout.session.completed", Some("unpaid")).normalize();
        assert_eq!(result.status, PaymentState::Completed);
        assert_eq!(result.raw_code.as_deref(), Some("unpaid"));
    }

    #[test]
    fn test_async_events_map_both_ways() {
        assert_eq!(
            stripe_event("checkout.session.async_payment_succeeded", None)
                .normalize()
                .status,
            PaymentState::Completed
        );
        assert_eq!(
            stripe_event("checkout.session.async_payment_failed", None)
                .normalize()
                .status,
            PaymentState::Failed
        );
        assert_eq!(
            stripe_event("checkout.session.expired", None).normalize().status,
            PaymentState::Failed
        );
    }

    #[test]
    fn test_unrelated_event_is_ignored() {
        let interpretation = stripe_event("payment_intent.created", None).interpret();
        assert!(matches!(interpretation, SignalInterpretation::Ignore(_)));
    }

    #[test]
    fn test_poll_states() {
        assert_eq!(stripe_poll(Some("complete"), Some("paid")), PaymentState::Completed);
        assert_eq!(
            stripe_poll(Some("complete"), Some("no_payment_required")),
            PaymentState::Completed
        );
        assert_eq!(stripe_poll(Some("open"), Some("unpaid")), PaymentState::Pending);
        assert_eq!(stripe_poll(Some("complete"), Some("unpaid")), PaymentState::Pending);
        assert_eq!(stripe_poll(Some("expired"), Some("unpaid")), PaymentState::Failed);
    }

    #[test]
    fn test_poll_unknown_status_fails_closed() {
        assert_eq!(stripe_poll(None, None), PaymentState::Failed);
        assert_eq!(stripe_poll(Some("mystery"), Some("unknown")), PaymentState::Failed);
    }

    #[test]
    fn test_hyperpay_codes() {
        assert_eq!(hyperpay(Some("000.000.000")).normalize().status, PaymentState::Completed);
        assert_eq!(hyperpay(Some("000.100.110")).normalize().status, PaymentState::Completed);
        assert_eq!(hyperpay(Some("000.100.200")).normalize().status, PaymentState::Failed);
        assert_eq!(hyperpay(Some("800.100.151")).normalize().status, PaymentState::Failed);
        assert_eq!(hyperpay(Some("")).normalize().status, PaymentState::Failed);
        assert_eq!(hyperpay(None).normalize().status, PaymentState::Failed);
    }

    #[test]
    fn test_checkout_created_code() {
        assert!(hyperpay_checkout_created("000.200.100"));
        assert!(!hyperpay_checkout_created("200.300.404"));
        assert!(!hyperpay_checkout_created("000.000.000"));
    }

    #[test]
    fn test_hyperpay_order_mapping() {
        assert_eq!(hyperpay_order_status(PaymentState::Completed), ("confirmed", "paid"));
        assert_eq!(hyperpay_order_status(PaymentState::Failed), ("failed", "failed"));
    }

    proptest! {
        #[test]
        fn prop_success_prefixes_complete(suffix in "[0-9.]{0,8}") {
            let a = format!("000.000{}", suffix);
            let b = format!("000.100.1{}", suffix);
            prop_assert_eq!(hyperpay_state(Some(&a)), PaymentState::Completed);
            prop_assert_eq!(hyperpay_state(Some(&b)), PaymentState::Completed);
        }

        #[test]
        fn prop_other_codes_fail(code in "[1-9][0-9]{2}\\.[0-9]{3}\\.[0-9]{3}") {
            prop_assert_eq!(hyperpay_state(Some(&code)), PaymentState::Failed);
        }

        #[test]
        fn prop_normalize_is_deterministic(code in "\\PC{0,16}") {
            let signal = hyperpay(Some(&code));
            prop_assert_eq!(signal.normalize(), signal.normalize());
        }
    }
}
