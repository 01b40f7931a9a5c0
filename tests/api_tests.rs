//! Router-level tests
//!
//! Each test builds the full router over the in-memory stores, with provider
//! base URLs pointed at mockito servers.

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use mockito::{Matcher, Server};
use serde_json::{json, Value};
use tower::ServiceExt;

use storefront_backend::api::{self, Adapters, AppState};
use storefront_backend::config::{
    AuthConfig, Config, CorsConfig, DatabaseConfig, ServerConfig, StoreConfig,
};
use storefront_backend::database::repository::{HyperPayStore, OrderStore, TransactionStore};
use storefront_backend::database::Stores;
use storefront_backend::models::{HyperPayTransaction, LineItem, Order};
use storefront_backend::payments::providers::hyperpay::{sign_notification, HyperPayConfig};
use storefront_backend::payments::providers::stripe::{sign_payload, StripeConfig};
use storefront_backend::shipping::providers::{AramexConfig, DhlConfig};

const STRIPE_WEBHOOK_SECRET: &str = "whsec_integration";
const HYPERPAY_WEBHOOK_SECRET: &str = "hp_notify_secret";

fn config(stripe_url: &str, hyperpay_url: &str) -> Config {
    Config {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 8000,
            environment: "development".to_string(),
        },
        database: DatabaseConfig {
            url: "postgres://localhost/storefront".to_string(),
            name: None,
            max_connections: 5,
        },
        cors: CorsConfig {
            allowed_origins: vec!["*".to_string()],
        },
        auth: AuthConfig {
            jwt_secret: "integration-test-secret-value".to_string(),
            token_expiry_hours: 1,
        },
        store: StoreConfig {
            currency: "sar".to_string(),
            provider_timeout_secs: 5,
        },
        stripe: StripeConfig {
            api_key: Some("sk_test_integration".to_string()),
            webhook_secret: Some(STRIPE_WEBHOOK_SECRET.to_string()),
            base_url: stripe_url.to_string(),
            timeout_secs: 5,
        },
        hyperpay: HyperPayConfig {
            base_url: hyperpay_url.to_string(),
            access_token: Some("hp_token".to_string()),
            entity_id: Some("8a8294174b7ecb28014b9699220015ca".to_string()),
            entity_id_mada: None,
            webhook_secret: Some(HYPERPAY_WEBHOOK_SECRET.to_string()),
            timeout_secs: 5,
        },
        dhl: DhlConfig::default(),
        aramex: AramexConfig::default(),
    }
}

fn app(config: Config, stores: &Stores) -> Router {
    let adapters = Adapters::from_config(&config).expect("adapters build from config");
    api::router(AppState::new(config, stores.clone(), adapters))
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.expect("router responds");
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body readable");
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, body)
}

fn post_json(uri: &str, body: Value, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::post(uri).header("content-type", "application/json");
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn get(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::get(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }
    builder.body(Body::empty()).unwrap()
}

fn item(price: f64, quantity: u32) -> LineItem {
    LineItem {
        product_id: "sku-1".to_string(),
        name: "Linen shirt".to_string(),
        price,
        quantity,
        size: Some("M".to_string()),
        variant_id: None,
        image: None,
    }
}

async fn register(app: &Router, email: &str) -> String {
    let (status, body) = send(
        app,
        post_json(
            "/api/auth/register",
            json!({ "email": email, "password": "password123", "name": "Sara" }),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    body["token"].as_str().expect("token issued").to_string()
}

fn stripe_event(event_type: &str, session_id: &str, payment_status: &str) -> String {
    json!({
        "id": "evt_test",
        "type": event_type,
        "data": { "object": {
            "id": session_id,
            "object": "checkout.session",
            "status": "complete",
            "payment_status": payment_status
        }}
    })
    .to_string()
}

fn stripe_webhook(body: String, signature: &str) -> Request<Body> {
    Request::post("/api/webhook/stripe")
        .header("content-type", "application/json")
        .header("stripe-signature", signature)
        .body(Body::from(body))
        .unwrap()
}

#[tokio::test]
async fn test_health_reports_configured_providers() {
    let stores = Stores::in_memory();
    let app = app(config("http://127.0.0.1:9", "http://127.0.0.1:9"), &stores);

    let (status, body) = send(&app, get("/health", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["providers"], json!(["stripe", "hyperpay"]));
}

#[tokio::test]
async fn test_checkout_creates_transaction_and_priced_order() {
    let mut stripe = Server::new_async().await;
    let mock = stripe
        .mock("POST", "/v1/checkout/sessions")
        .match_header("authorization", Matcher::Regex("^Basic ".to_string()))
        .match_body(Matcher::AllOf(vec![
            Matcher::UrlEncoded("mode".into(), "payment".into()),
            Matcher::UrlEncoded("line_items[0][price_data][unit_amount]".into(), "115000".into()),
            Matcher::UrlEncoded("line_items[0][price_data][currency]".into(), "sar".into()),
            Matcher::UrlEncoded(
                "success_url".into(),
                "https://shop.example.sa/checkout/success?session_id={CHECKOUT_SESSION_ID}".into(),
            ),
        ]))
        .with_status(200)
        .with_body(
            r#"{"id":"cs_test_1","url":"https://checkout.stripe.com/c/pay/cs_test_1","status":"open","payment_status":"unpaid"}"#,
        )
        .create_async()
        .await;

    let stores = Stores::in_memory();
    let app = app(config(&stripe.url(), "http://127.0.0.1:9"), &stores);
    let token = register(&app, "buyer@example.com").await;

    let (status, body) = send(
        &app,
        post_json(
            "/api/checkout/create-session",
            json!({
                "origin_url": "https://shop.example.sa/",
                "items": [item(500.0, 2)],
            }),
            Some(&token),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK, "{}", body);
    mock.assert_async().await;
    assert_eq!(body["session_id"], "cs_test_1");

    let order_id = body["order_id"].as_str().unwrap();
    let order = stores.orders.find_by_id(order_id).await.unwrap().unwrap();
    assert_eq!(order.subtotal, 1000.0);
    assert_eq!(order.tax, 150.0);
    assert_eq!(order.shipping, 0.0);
    assert_eq!(order.total, 1150.0);
    assert_eq!(order.session_id.as_deref(), Some("cs_test_1"));
    assert_eq!(order.status, "pending");

    let tx = stores
        .transactions
        .find_by_session_id("cs_test_1")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(tx.status, "pending");
    assert_eq!(tx.payment_status, "initiated");

    // The order is listed for its owner only
    let (status, orders) = send(&app, get("/api/orders", Some(&token))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(orders.as_array().unwrap().len(), 1);

    let other = register(&app, "someone@example.com").await;
    let (status, _) = send(&app, get(&format!("/api/orders/{}", order_id), Some(&other))).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_checkout_rejects_empty_cart_without_calling_stripe() {
    let mut stripe = Server::new_async().await;
    let mock = stripe
        .mock("POST", "/v1/checkout/sessions")
        .expect(0)
        .create_async()
        .await;

    let stores = Stores::in_memory();
    let app = app(config(&stripe.url(), "http://127.0.0.1:9"), &stores);

    let (status, body) = send(
        &app,
        post_json(
            "/api/checkout/create-session",
            json!({ "origin_url": "https://shop.example.sa", "items": [] }),
            None,
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "validation_error");
    mock.assert_async().await;
}

#[tokio::test]
async fn test_missing_stripe_key_is_server_error() {
    let stores = Stores::in_memory();
    let mut config = config("http://127.0.0.1:9", "http://127.0.0.1:9");
    config.stripe.api_key = None;
    let app = app(config, &stores);

    let (status, body) = send(
        &app,
        post_json(
            "/api/checkout/create-session",
            json!({ "origin_url": "https://shop.example.sa", "items": [item(10.0, 1)] }),
            None,
        ),
    )
    .await;

    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["code"], "configuration_error");
}

async fn seed_stripe_checkout(stores: &Stores, session_id: &str) -> Order {
    let tx = storefront_backend::models::PaymentTransaction::new(
        session_id,
        None,
        1150.0,
        "sar",
        json!([]),
    );
    stores.transactions.insert(&tx).await.unwrap();
    let order = Order::new(None, vec![item(1000.0, 1)], None, None, "sar").with_session(session_id);
    stores.orders.insert(&order).await.unwrap();
    order
}

#[tokio::test]
async fn test_completed_webhook_updates_transaction_and_order() {
    let stores = Stores::in_memory();
    let app = app(config("http://127.0.0.1:9", "http://127.0.0.1:9"), &stores);
    let order = seed_stripe_checkout(&stores, "cs_hook_1").await;

    let body = stripe_event("checkout.session.completed", "cs_hook_1", "paid");
    let signature = sign_payload(
        STRIPE_WEBHOOK_SECRET,
        chrono::Utc::now().timestamp(),
        body.as_bytes(),
    );

    let (status, response) = send(&app, stripe_webhook(body, &signature)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(response["status"], "processed");

    let tx = stores
        .transactions
        .find_by_session_id("cs_hook_1")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(tx.status, "completed");
    assert_eq!(tx.payment_status, "paid");

    let order = stores.orders.find_by_id(&order.id).await.unwrap().unwrap();
    assert_eq!(order.status, "completed");
    assert_eq!(order.payment_status, "paid");
}

#[tokio::test]
async fn test_bad_stripe_signature_mutates_nothing() {
    let stores = Stores::in_memory();
    let app = app(config("http://127.0.0.1:9", "http://127.0.0.1:9"), &stores);
    seed_stripe_checkout(&stores, "cs_hook_2").await;

    let body = stripe_event("checkout.session.completed", "cs_hook_2", "paid");
    let forged = sign_payload("whsec_wrong", chrono::Utc::now().timestamp(), body.as_bytes());

    let (status, response) = send(&app, stripe_webhook(body, &forged)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(response["code"], "invalid_webhook");

    let tx = stores
        .transactions
        .find_by_session_id("cs_hook_2")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(tx.status, "pending");
    assert_eq!(tx.payment_status, "initiated");
}

#[tokio::test]
async fn test_unrelated_stripe_event_is_acknowledged_without_changes() {
    let stores = Stores::in_memory();
    let app = app(config("http://127.0.0.1:9", "http://127.0.0.1:9"), &stores);
    seed_stripe_checkout(&stores, "cs_hook_3").await;

    let body = stripe_event("customer.created", "cs_hook_3", "paid");
    let signature = sign_payload(
        STRIPE_WEBHOOK_SECRET,
        chrono::Utc::now().timestamp(),
        body.as_bytes(),
    );

    let (status, response) = send(&app, stripe_webhook(body, &signature)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(response["status"], "processed");

    let tx = stores
        .transactions
        .find_by_session_id("cs_hook_3")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(tx.status, "pending");
}

#[tokio::test]
async fn test_stripe_poll_reconciles_like_webhook() {
    let mut stripe = Server::new_async().await;
    stripe
        .mock("GET", "/v1/checkout/sessions/cs_poll_1")
        .with_status(200)
        .with_body(
            r#"{"id":"cs_poll_1","status":"complete","payment_status":"paid","amount_total":115000,"currency":"sar","metadata":{"source":"storefront"}}"#,
        )
        .create_async()
        .await;

    let stores = Stores::in_memory();
    let app = app(config(&stripe.url(), "http://127.0.0.1:9"), &stores);
    let order = seed_stripe_checkout(&stores, "cs_poll_1").await;

    let (status, body) = send(&app, get("/api/checkout/status/cs_poll_1", None)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "completed");
    assert_eq!(body["payment_status"], "paid");
    assert_eq!(body["amount_total"], 115000);
    assert_eq!(body["metadata"]["source"], "storefront");

    let order = stores.orders.find_by_id(&order.id).await.unwrap().unwrap();
    assert_eq!(order.status, "completed");
    assert_eq!(order.payment_status, "paid");
}

async fn seed_hyperpay_checkout(stores: &Stores, checkout_id: &str) -> Order {
    let order = Order::new(None, vec![item(100.0, 1)], None, None, "sar");
    stores.orders.insert(&order).await.unwrap();
    stores
        .orders
        .attach_session(&order.id, checkout_id)
        .await
        .unwrap();
    let tx = HyperPayTransaction::new(
        checkout_id,
        Some(order.id.clone()),
        None,
        115.0,
        "SAR",
        "DB",
        Some("VISA".to_string()),
        Some("000.200.100".to_string()),
        None,
    );
    stores.hyperpay.insert(&tx).await.unwrap();
    order
}

#[tokio::test]
async fn test_hyperpay_initiate_links_order() {
    let mut hyperpay = Server::new_async().await;
    hyperpay
        .mock("POST", "/v1/checkouts")
        .match_header("authorization", "Bearer hp_token")
        .match_body(Matcher::AllOf(vec![
            Matcher::UrlEncoded("amount".into(), "115.00".into()),
            Matcher::UrlEncoded("currency".into(), "SAR".into()),
            Matcher::UrlEncoded("paymentType".into(), "DB".into()),
        ]))
        .with_status(200)
        .with_body(
            r#"{"result":{"code":"000.200.100","description":"successfully created checkout"},"id":"HP_CHECKOUT_1"}"#,
        )
        .create_async()
        .await;

    let stores = Stores::in_memory();
    let app = app(config("http://127.0.0.1:9", &hyperpay.url()), &stores);
    let order = Order::new(None, vec![item(100.0, 1)], None, None, "sar");
    stores.orders.insert(&order).await.unwrap();

    let (status, body) = send(
        &app,
        post_json(
            "/api/payment/hyperpay/initiate",
            json!({ "amount": 115.0, "order_id": order.id }),
            None,
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["checkout_id"], "HP_CHECKOUT_1");
    assert!(body["widget_url"]
        .as_str()
        .unwrap()
        .ends_with("/v1/paymentWidgets.js?checkoutId=HP_CHECKOUT_1"));

    let order = stores.orders.find_by_id(&order.id).await.unwrap().unwrap();
    assert_eq!(order.session_id.as_deref(), Some("HP_CHECKOUT_1"));
    assert!(stores
        .hyperpay
        .find_by_checkout_id("HP_CHECKOUT_1")
        .await
        .unwrap()
        .is_some());
}

#[tokio::test]
async fn test_hyperpay_initiate_unknown_order_is_not_found() {
    let mut hyperpay = Server::new_async().await;
    let mock = hyperpay
        .mock("POST", "/v1/checkouts")
        .expect(0)
        .create_async()
        .await;

    let stores = Stores::in_memory();
    let app = app(config("http://127.0.0.1:9", &hyperpay.url()), &stores);

    let (status, _) = send(
        &app,
        post_json(
            "/api/payment/hyperpay/initiate",
            json!({ "amount": 50.0, "order_id": "missing" }),
            None,
        ),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    mock.assert_async().await;
}

#[tokio::test]
async fn test_hyperpay_status_confirms_order() {
    let mut hyperpay = Server::new_async().await;
    hyperpay
        .mock("GET", "/v1/checkouts/HP_STATUS_1/payment")
        .match_query(Matcher::UrlEncoded(
            "entityId".into(),
            "8a8294174b7ecb28014b9699220015ca".into(),
        ))
        .with_status(200)
        .with_body(
            r#"{"id":"8ac7a4a1","paymentType":"DB","paymentBrand":"VISA","amount":"115.00","currency":"SAR","result":{"code":"000.100.110","description":"Request successfully processed in 'Merchant in Integrator Test Mode'"}}"#,
        )
        .create_async()
        .await;

    let stores = Stores::in_memory();
    let app = app(config("http://127.0.0.1:9", &hyperpay.url()), &stores);
    let order = seed_hyperpay_checkout(&stores, "HP_STATUS_1").await;

    let (status, body) = send(&app, get("/api/payment/hyperpay/status/HP_STATUS_1", None)).await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["status"], "completed");
    assert_eq!(body["order_updated"], true);

    let order = stores.orders.find_by_id(&order.id).await.unwrap().unwrap();
    assert_eq!(order.status, "confirmed");
    assert_eq!(order.payment_status, "paid");

    let tx = stores
        .hyperpay
        .find_by_checkout_id("HP_STATUS_1")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(tx.status, "completed");
    assert_eq!(tx.result_code.as_deref(), Some("000.100.110"));
}

#[tokio::test]
async fn test_signed_hyperpay_notification_updates_order() {
    let stores = Stores::in_memory();
    let app = app(config("http://127.0.0.1:9", "http://127.0.0.1:9"), &stores);
    let order = seed_hyperpay_checkout(&stores, "HP_HOOK_1").await;

    let code = "800.100.151";
    let signature = sign_notification(HYPERPAY_WEBHOOK_SECRET, "HP_HOOK_1", code);
    let request = Request::post(format!(
        "/api/webhook/hyperpay?checkoutId=HP_HOOK_1&result.code={}&result.description=Transaction%20declined",
        code
    ))
    .header("x-hyperpay-signature", signature)
    .body(Body::empty())
    .unwrap();

    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "received");

    let order = stores.orders.find_by_id(&order.id).await.unwrap().unwrap();
    assert_eq!(order.status, "failed");
    assert_eq!(order.payment_status, "failed");

    let tx = stores
        .hyperpay
        .find_by_checkout_id("HP_HOOK_1")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(tx.result_description.as_deref(), Some("Transaction declined"));
}

#[tokio::test]
async fn test_unsigned_hyperpay_notification_is_rejected() {
    let stores = Stores::in_memory();
    let app = app(config("http://127.0.0.1:9", "http://127.0.0.1:9"), &stores);
    let order = seed_hyperpay_checkout(&stores, "HP_HOOK_2").await;

    let request = Request::post("/api/webhook/hyperpay?checkoutId=HP_HOOK_2&result.code=000.000.000")
        .body(Body::empty())
        .unwrap();

    let (status, _) = send(&app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let order = stores.orders.find_by_id(&order.id).await.unwrap().unwrap();
    assert_eq!(order.status, "pending");
    let tx = stores
        .hyperpay
        .find_by_checkout_id("HP_HOOK_2")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(tx.status, "pending");
}

#[tokio::test]
async fn test_hyperpay_notification_without_code_fails_order() {
    let stores = Stores::in_memory();
    let app = app(config("http://127.0.0.1:9", "http://127.0.0.1:9"), &stores);
    let order = seed_hyperpay_checkout(&stores, "HP_HOOK_3").await;

    let signature = sign_notification(HYPERPAY_WEBHOOK_SECRET, "HP_HOOK_3", "");
    let request = Request::post("/api/webhook/hyperpay?checkoutId=HP_HOOK_3")
        .header("x-hyperpay-signature", signature)
        .body(Body::empty())
        .unwrap();

    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    assert_eq!(body["status"], "received");

    let order = stores.orders.find_by_id(&order.id).await.unwrap().unwrap();
    assert_eq!(order.status, "failed");
    assert_eq!(order.payment_status, "failed");
}

#[tokio::test]
async fn test_hyperpay_status_rejects_encoded_path_in_checkout_id() {
    let mut hyperpay = Server::new_async().await;
    let mock = hyperpay
        .mock("GET", "/v1/registrations/secret")
        .match_query(Matcher::Any)
        .with_status(400)
        .with_body(r#"{"leaked":"merchant data"}"#)
        .expect(0)
        .create_async()
        .await;

    let stores = Stores::in_memory();
    let app = app(config("http://127.0.0.1:9", &hyperpay.url()), &stores);

    let (status, body) = send(
        &app,
        get("/api/payment/hyperpay/status/..%2Fregistrations%2Fsecret%23", None),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["code"], "validation_error");
    assert!(!body.to_string().contains("merchant data"));
    mock.assert_async().await;
}

#[tokio::test]
async fn test_auth_flow_and_errors() {
    let stores = Stores::in_memory();
    let app = app(config("http://127.0.0.1:9", "http://127.0.0.1:9"), &stores);

    let token = register(&app, "Sara@Example.com").await;

    let (status, body) = send(&app, get("/api/auth/me", Some(&token))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["email"], "sara@example.com");
    assert!(body.get("password_hash").is_none());

    let (status, body) = send(
        &app,
        post_json(
            "/api/auth/register",
            json!({ "email": "sara@example.com", "password": "password123", "name": "Again" }),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "conflict");

    let (status, _) = send(
        &app,
        post_json(
            "/api/auth/login",
            json!({ "email": "sara@example.com", "password": "wrong-password" }),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, body) = send(
        &app,
        post_json(
            "/api/auth/login",
            json!({ "email": "SARA@example.com", "password": "password123" }),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["token"].is_string());
}

#[tokio::test]
async fn test_orders_require_valid_token() {
    let stores = Stores::in_memory();
    let app = app(config("http://127.0.0.1:9", "http://127.0.0.1:9"), &stores);

    let (status, _) = send(&app, get("/api/orders", None)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = send(&app, get("/api/orders", Some("not-a-jwt"))).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_unknown_carrier_is_not_found() {
    let stores = Stores::in_memory();
    let app = app(config("http://127.0.0.1:9", "http://127.0.0.1:9"), &stores);

    let (status, _) = send(&app, get("/api/shipping/fedex/track/123", None)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_missing_carrier_credentials_fail_before_any_request() {
    let stores = Stores::in_memory();
    let app = app(config("http://127.0.0.1:9", "http://127.0.0.1:9"), &stores);

    let (status, body) = send(
        &app,
        post_json(
            "/api/shipping/aramex/rates",
            json!({ "destination": { "country_code": "SA", "city": "Jeddah" } }),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["code"], "configuration_error");
}
