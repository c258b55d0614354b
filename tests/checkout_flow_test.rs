//! Integration tests for the checkout/order processor.
//!
//! Covers the documented behavior: all-or-nothing validation, conditional
//! stock decrement, payment-method-derived payment status, order/purchase
//! grouping, non-idempotence, and the race for the last unit.

mod common;

use axum::http::{Method, StatusCode};
use common::{decimal_of, response_json, TestApp};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use serde_json::{json, Value};
use uuid::Uuid;

fn checkout_payload(buyer_id: Uuid, items: Value, total: Decimal, method: &str) -> Value {
    json!({
        "buyer_id": buyer_id,
        "buyer_name": "Checkout Buyer",
        "cart_items": items,
        "shipping_address": "42 Integration Lane",
        "payment_method": method,
        "total_amount": total,
    })
}

#[tokio::test]
async fn multi_line_cod_checkout_creates_order_and_decrements_stock() {
    let app = TestApp::new().await;
    let product_a = app.seed_product("Product A", dec!(100), 5).await;
    let product_b = app.seed_product("Product B", dec!(50), 1).await;

    let payload = checkout_payload(
        Uuid::new_v4(),
        json!([
            {"product_id": product_a.id, "quantity": 2, "price": 100},
            {"product_id": product_b.id, "quantity": 1, "price": 50},
        ]),
        dec!(250),
        "cod",
    );

    let response = app
        .request(Method::POST, "/api/v1/checkout", Some(payload))
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = response_json(response).await;
    assert_eq!(body["success"], json!(true));

    let order = &body["order"];
    assert_eq!(decimal_of(&order["total_amount"]), dec!(250));
    assert_eq!(order["payment_status"], json!("pending"));
    assert_eq!(order["order_status"], json!("confirmed"));
    assert!(order["order_number"]
        .as_str()
        .unwrap()
        .starts_with("ORD-"));

    let purchases = order["purchases"].as_array().unwrap();
    assert_eq!(purchases.len(), 2);

    // Desired invariant: the claimed total matches the purchase sum
    let purchase_sum: Decimal = purchases
        .iter()
        .map(|p| decimal_of(&p["amount"]))
        .sum();
    assert_eq!(purchase_sum, decimal_of(&order["total_amount"]));

    for purchase in purchases {
        assert_eq!(purchase["status"], json!("completed"));
        assert_eq!(purchase["payment_status"], json!("pending"));
        assert!(purchase["product"]["name"].is_string());
    }

    assert_eq!(app.product_stock(product_a.id).await, (3, true));
    assert_eq!(app.product_stock(product_b.id).await, (0, false));
}

#[tokio::test]
async fn online_payment_is_settled_immediately() {
    let app = TestApp::new().await;
    let product = app.seed_product("Instant Pay Item", dec!(20), 4).await;

    let payload = checkout_payload(
        Uuid::new_v4(),
        json!([{"product_id": product.id, "quantity": 1, "price": 20}]),
        dec!(20),
        "online",
    );

    let response = app
        .request(Method::POST, "/api/v1/checkout", Some(payload))
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = response_json(response).await;
    assert_eq!(body["order"]["payment_status"], json!("paid"));
    assert_eq!(body["order"]["purchases"][0]["payment_status"], json!("paid"));
}

#[tokio::test]
async fn oversell_is_rejected_without_any_mutation() {
    let app = TestApp::new().await;
    let product = app.seed_product("Scarce Product", dec!(75), 1).await;
    let buyer_id = Uuid::new_v4();

    let payload = checkout_payload(
        buyer_id,
        json!([{"product_id": product.id, "quantity": 3, "price": 75}]),
        dec!(225),
        "cod",
    );

    let response = app
        .request(Method::POST, "/api/v1/checkout", Some(payload))
        .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let body = response_json(response).await;
    assert!(body["message"]
        .as_str()
        .unwrap()
        .contains("Insufficient stock"));

    // Stock untouched, nothing persisted
    assert_eq!(app.product_stock(product.id).await, (1, true));

    let orders = app
        .request(
            Method::GET,
            &format!("/api/v1/orders/user/{}", buyer_id),
            None,
        )
        .await;
    let orders = response_json(orders).await;
    assert_eq!(orders.as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn one_bad_line_fails_the_whole_cart() {
    let app = TestApp::new().await;
    let good = app.seed_product("Plentiful Product", dec!(10), 50).await;
    let scarce = app.seed_product("Nearly Gone", dec!(30), 1).await;

    let payload = checkout_payload(
        Uuid::new_v4(),
        json!([
            {"product_id": good.id, "quantity": 2, "price": 10},
            {"product_id": scarce.id, "quantity": 2, "price": 30},
        ]),
        dec!(80),
        "cod",
    );

    let response = app
        .request(Method::POST, "/api/v1/checkout", Some(payload))
        .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    // The valid line's stock must not move either
    assert_eq!(app.product_stock(good.id).await, (50, true));
    assert_eq!(app.product_stock(scarce.id).await, (1, true));
}

#[tokio::test]
async fn empty_cart_is_rejected() {
    let app = TestApp::new().await;

    let payload = checkout_payload(Uuid::new_v4(), json!([]), Decimal::ZERO, "cod");
    let response = app
        .request(Method::POST, "/api/v1/checkout", Some(payload))
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = response_json(response).await;
    assert!(body["message"].as_str().unwrap().contains("Cart is empty"));
}

#[tokio::test]
async fn missing_product_is_rejected_before_any_mutation() {
    let app = TestApp::new().await;
    let existing = app.seed_product("Real Product", dec!(15), 10).await;

    let payload = checkout_payload(
        Uuid::new_v4(),
        json!([
            {"product_id": existing.id, "quantity": 1, "price": 15},
            {"product_id": Uuid::new_v4(), "quantity": 1, "price": 15},
        ]),
        dec!(30),
        "cod",
    );

    let response = app
        .request(Method::POST, "/api/v1/checkout", Some(payload))
        .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(app.product_stock(existing.id).await, (10, true));
}

#[tokio::test]
async fn repeated_checkout_is_not_deduplicated() {
    let app = TestApp::new().await;
    let product = app.seed_product("Repeat Product", dec!(40), 10).await;
    let buyer_id = Uuid::new_v4();

    let payload = checkout_payload(
        buyer_id,
        json!([{"product_id": product.id, "quantity": 2, "price": 40}]),
        dec!(80),
        "cod",
    );

    let first = app
        .request(Method::POST, "/api/v1/checkout", Some(payload.clone()))
        .await;
    let second = app
        .request(Method::POST, "/api/v1/checkout", Some(payload))
        .await;
    assert_eq!(first.status(), StatusCode::OK);
    assert_eq!(second.status(), StatusCode::OK);

    let first = response_json(first).await;
    let second = response_json(second).await;
    assert_ne!(
        first["order"]["order_number"].as_str().unwrap(),
        second["order"]["order_number"].as_str().unwrap()
    );

    // Double submission means double decrement
    assert_eq!(app.product_stock(product.id).await, (6, true));

    let orders = app
        .request(
            Method::GET,
            &format!("/api/v1/orders/user/{}", buyer_id),
            None,
        )
        .await;
    let orders = response_json(orders).await;
    assert_eq!(orders.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn racing_checkouts_for_the_last_unit_cannot_both_win() {
    let app = TestApp::new().await;
    let product = app.seed_product("Last Unit", dec!(99), 1).await;

    let service = app.state.services.checkout.clone();
    let make_input = |buyer: &str| storefront_api::services::checkout::CheckoutInput {
        buyer_id: Uuid::new_v4(),
        buyer_name: buyer.to_string(),
        lines: vec![storefront_api::services::checkout::CartLine {
            product_id: product.id,
            quantity: 1,
            price: dec!(99),
        }],
        shipping_address: "42 Integration Lane".to_string(),
        payment_method: storefront_api::entities::purchase::PaymentMethod::Cod,
        total_amount: dec!(99),
    };

    let (first, second) = tokio::join!(
        service.checkout(make_input("First Buyer")),
        service.checkout(make_input("Second Buyer")),
    );

    let successes = [&first, &second].iter().filter(|r| r.is_ok()).count();
    assert_eq!(successes, 1, "exactly one racing checkout may succeed");
    assert_eq!(app.product_stock(product.id).await, (0, false));
}
