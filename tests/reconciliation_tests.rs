//! Reconciliation against the in-memory stores

use serde_json::json;

use storefront_backend::database::repository::{HyperPayStore, OrderStore, TransactionStore};
use storefront_backend::database::Stores;
use storefront_backend::models::{HyperPayTransaction, LineItem, Order, PaymentTransaction};
use storefront_backend::reconciliation::rules::{HyperPaySignal, StripeSignal};
use storefront_backend::reconciliation::{PaymentState, ProviderSignal, Reconciler};

fn cart() -> Vec<LineItem> {
    vec![LineItem {
        product_id: "42".to_string(),
        name: "Abaya".to_string(),
        price: 200.0,
        quantity: 1,
        size: None,
        variant_id: None,
        image: None,
    }]
}

#[tokio::test]
async fn test_replayed_signal_leaves_same_state() {
    let stores = Stores::in_memory();
    let reconciler = Reconciler::new(&stores);

    stores
        .transactions
        .insert(&PaymentTransaction::new("cs_replay", None, 230.0, "sar", json!([])))
        .await
        .unwrap();

    let result = ProviderSignal::Stripe(StripeSignal {
        event_type: Some("checkout.session.completed".to_string()),
        session_status: Some("complete".to_string()),
        payment_status: Some("paid".to_string()),
    })
    .normalize();

    let first = reconciler.apply("cs_replay", &result).await.unwrap();
    let after_first = stores
        .transactions
        .find_by_session_id("cs_replay")
        .await
        .unwrap()
        .unwrap();

    let second = reconciler.apply("cs_replay", &result).await.unwrap();
    let after_second = stores
        .transactions
        .find_by_session_id("cs_replay")
        .await
        .unwrap()
        .unwrap();

    assert_eq!(first.status, second.status);
    assert_eq!(after_first.status, after_second.status);
    assert_eq!(after_first.payment_status, after_second.payment_status);
    assert_eq!(after_second.status, "completed");
}

#[tokio::test]
async fn test_poll_and_webhook_paths_converge() {
    let poll_stores = Stores::in_memory();
    let hook_stores = Stores::in_memory();

    for stores in [&poll_stores, &hook_stores] {
        let order = Order::new(None, cart(), None, None, "sar");
        stores.orders.insert(&order).await.unwrap();
        stores.orders.attach_session(&order.id, "HP_1").await.unwrap();
        stores
            .hyperpay
            .insert(&HyperPayTransaction::new(
                "HP_1",
                Some(order.id.clone()),
                None,
                230.0,
                "SAR",
                "DB",
                None,
                None,
                None,
            ))
            .await
            .unwrap();
    }

    // Poll responses and notifications carry the same code and description
    let signal = ProviderSignal::HyperPay(HyperPaySignal {
        result_code: Some("000.000.000".to_string()),
        description: Some("Transaction succeeded".to_string()),
    });

    Reconciler::new(&poll_stores)
        .apply("HP_1", &signal.normalize())
        .await
        .unwrap();
    Reconciler::new(&hook_stores)
        .apply("HP_1", &signal.normalize())
        .await
        .unwrap();

    let polled = poll_stores.orders.find_by_session_id("HP_1").await.unwrap().unwrap();
    let hooked = hook_stores.orders.find_by_session_id("HP_1").await.unwrap().unwrap();
    assert_eq!(polled.status, "confirmed");
    assert_eq!(polled.status, hooked.status);
    assert_eq!(polled.payment_status, hooked.payment_status);
}

#[tokio::test]
async fn test_unknown_reference_is_reported_not_raised() {
    let stores = Stores::in_memory();
    let result = ProviderSignal::HyperPay(HyperPaySignal {
        result_code: Some("100.396.101".to_string()),
        description: None,
    })
    .normalize();
    assert_eq!(result.status, PaymentState::Failed);

    let outcome = Reconciler::new(&stores).apply("HP_missing", &result).await.unwrap();
    assert!(!outcome.transaction_updated);
    assert_eq!(outcome.orders_updated, 0);
}
