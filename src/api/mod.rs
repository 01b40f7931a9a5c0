//! HTTP surface
//!
//! Everything except `/health` is mounted under `/api`.

pub mod auth;
pub mod checkout;
pub mod extract;
pub mod health;
pub mod hyperpay;
pub mod orders;
pub mod shipping;
pub mod webhooks;

use axum::http::HeaderValue;
use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;
use tracing::warn;

use crate::auth::TokenService;
use crate::config::Config;
use crate::database::Stores;
use crate::error::AppResult;
use crate::payments::providers::{HyperPayGateway, StripeGateway};
use crate::payments::PaymentGateway;
use crate::reconciliation::Reconciler;
use crate::services::{AuthService, CheckoutService, HyperPayService, ShippingService};
use crate::shipping::providers::{AramexCarrier, DhlCarrier};
use crate::shipping::ShippingCarrier;

/// Provider adapters the handlers talk to
pub struct Adapters {
    pub stripe: Arc<dyn PaymentGateway>,
    pub hyperpay: Arc<dyn PaymentGateway>,
    pub dhl: Arc<dyn ShippingCarrier>,
    pub aramex: Arc<dyn ShippingCarrier>,
}

impl Adapters {
    /// Builds every adapter from configuration
    ///
    /// Missing credentials do not fail here; each adapter reports them when
    /// an operation needs them.
    pub fn from_config(config: &Config) -> AppResult<Self> {
        Ok(Self {
            stripe: Arc::new(StripeGateway::new(config.stripe.clone())?),
            hyperpay: Arc::new(HyperPayGateway::new(config.hyperpay.clone())?),
            dhl: Arc::new(DhlCarrier::new(config.dhl.clone())?),
            aramex: Arc::new(AramexCarrier::new(config.aramex.clone())?),
        })
    }
}

/// Shared state handed to every handler
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<Config>,
    pub stores: Stores,
    pub auth: AuthService,
    pub checkout: CheckoutService,
    pub hyperpay: HyperPayService,
    pub shipping: ShippingService,
}

impl AppState {
    pub fn new(config: Config, stores: Stores, adapters: Adapters) -> Self {
        let reconciler = Reconciler::new(&stores);
        let currency = config.store.currency.clone();
        let tokens = TokenService::new(&config.auth.jwt_secret, config.auth.token_expiry_hours);

        Self {
            auth: AuthService::new(stores.users.clone(), tokens),
            checkout: CheckoutService::new(
                adapters.stripe,
                stores.clone(),
                reconciler.clone(),
                currency.clone(),
            ),
            hyperpay: HyperPayService::new(
                adapters.hyperpay,
                stores.clone(),
                reconciler,
                config.hyperpay.base_url.clone(),
                currency,
            ),
            shipping: ShippingService::new(adapters.dhl, adapters.aramex, stores.shipments.clone()),
            config: Arc::new(config),
            stores,
        }
    }
}

pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/me", get(auth::me))
        .route("/orders", get(orders::list_orders))
        .route("/orders/:order_id", get(orders::get_order))
        .route("/checkout/create-session", post(checkout::create_session))
        .route("/checkout/status/:session_id", get(checkout::status))
        .route("/webhook/stripe", post(webhooks::stripe))
        .route("/payment/hyperpay/initiate", post(hyperpay::initiate))
        .route("/payment/hyperpay/status/:checkout_id", get(hyperpay::status))
        .route("/webhook/hyperpay", post(webhooks::hyperpay))
        .route("/shipping/:carrier/rates", post(shipping::rates))
        .route("/shipping/:carrier/create-shipment", post(shipping::create_shipment))
        .route(
            "/shipping/:carrier/track/:tracking_number",
            get(shipping::track),
        );

    let cors = cors_layer(&state.config.cors.allowed_origins);

    Router::new()
        .route("/health", get(health::health_check))
        .nest("/api", api)
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http())
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
        .layer(cors)
        .with_state(state)
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if origins.iter().any(|o| o == "*") {
        return layer.allow_origin(Any);
    }

    let parsed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin {:?}", origin);
                None
            }
        })
        .collect();
    layer.allow_origin(AllowOrigin::list(parsed))
}
