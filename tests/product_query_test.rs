//! Integration tests for the product query builder, catalog maintenance,
//! and review aggregation.

mod common;

use axum::http::{Method, StatusCode};
use common::{decimal_of, response_json, TestApp};
use rust_decimal_macros::dec;
use serde_json::{json, Value};
use uuid::Uuid;

async fn create_product(app: &TestApp, payload: Value) -> Value {
    let response = app
        .request(Method::POST, "/api/v1/products", Some(payload))
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    response_json(response).await
}

async fn list(app: &TestApp, query: &str) -> Value {
    let response = app
        .request(Method::GET, &format!("/api/v1/products{}", query), None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    response_json(response).await
}

#[tokio::test]
async fn filters_combine_conjunctively() {
    let app = TestApp::new().await;

    create_product(
        &app,
        json!({"name": "Cheap Gadget", "price": 10, "category": "Electronics", "stock_quantity": 5}),
    )
    .await;
    create_product(
        &app,
        json!({"name": "Expensive Gadget", "price": 500, "category": "Electronics", "stock_quantity": 5}),
    )
    .await;
    create_product(
        &app,
        json!({"name": "Leather Bag", "price": 300, "category": "Fashion", "stock_quantity": 5}),
    )
    .await;

    let body = list(&app, "?category=Electronics").await;
    assert_eq!(body["total"], json!(2));

    let body = list(&app, "?category=Electronics&min_price=100").await;
    assert_eq!(body["total"], json!(1));
    assert_eq!(body["products"][0]["name"], json!("Expensive Gadget"));

    let body = list(&app, "?min_price=100&max_price=400").await;
    assert_eq!(body["total"], json!(1));
    assert_eq!(body["products"][0]["name"], json!("Leather Bag"));
}

#[tokio::test]
async fn price_sort_orders_both_directions() {
    let app = TestApp::new().await;
    for (name, price) in [("Mid", 50), ("Low", 10), ("High", 90)] {
        create_product(
            &app,
            json!({"name": name, "price": price, "category": "Other", "stock_quantity": 1}),
        )
        .await;
    }

    let body = list(&app, "?sort=price-low").await;
    let names: Vec<&str> = body["products"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Low", "Mid", "High"]);

    let body = list(&app, "?sort=price-high").await;
    let names: Vec<&str> = body["products"]
        .as_array()
        .unwrap()
        .iter()
        .map(|p| p["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["High", "Mid", "Low"]);
}

#[tokio::test]
async fn discount_sort_returns_highest_discounts_in_order() {
    let app = TestApp::new().await;

    // Discounts: 10, 40, 0, 25
    create_product(
        &app,
        json!({"name": "Ten Off", "price": 90, "original_price": 100, "category": "Other", "stock_quantity": 1}),
    )
    .await;
    create_product(
        &app,
        json!({"name": "Forty Off", "price": 60, "original_price": 100, "category": "Other", "stock_quantity": 1}),
    )
    .await;
    create_product(
        &app,
        json!({"name": "Full Price", "price": 100, "category": "Other", "stock_quantity": 1}),
    )
    .await;
    create_product(
        &app,
        json!({"name": "TwentyFive Off", "price": 75, "original_price": 100, "category": "Other", "stock_quantity": 1}),
    )
    .await;

    let body = list(&app, "?sort=discount&limit=2&skip=0").await;
    let products = body["products"].as_array().unwrap();
    assert_eq!(products.len(), 2);
    assert_eq!(products[0]["name"], json!("Forty Off"));
    assert_eq!(products[1]["name"], json!("TwentyFive Off"));

    // Pagination continues down the discount ordering
    let body = list(&app, "?sort=discount&limit=2&skip=2").await;
    let products = body["products"].as_array().unwrap();
    assert_eq!(products.len(), 2);
    assert_eq!(products[0]["name"], json!("Ten Off"));
    assert_eq!(products[1]["name"], json!("Full Price"));
}

#[tokio::test]
async fn discount_filter_requires_original_above_price() {
    let app = TestApp::new().await;

    create_product(
        &app,
        json!({"name": "Discounted", "price": 50, "original_price": 80, "category": "Other", "stock_quantity": 1}),
    )
    .await;
    create_product(
        &app,
        json!({"name": "Not Discounted", "price": 50, "category": "Other", "stock_quantity": 1}),
    )
    .await;

    let body = list(&app, "?has_discount=true").await;
    assert_eq!(body["total"], json!(1));
    assert_eq!(body["products"][0]["name"], json!("Discounted"));
}

#[tokio::test]
async fn search_matches_case_insensitively_across_fields() {
    let app = TestApp::new().await;

    create_product(
        &app,
        json!({"name": "Aurora Lamp", "description": "Warm bedside light", "category": "Home", "stock_quantity": 1, "price": 30}),
    )
    .await;
    create_product(
        &app,
        json!({"name": "Desk Fan", "description": "Quiet and compact", "brand": "AURORA", "category": "Home", "stock_quantity": 1, "price": 25}),
    )
    .await;
    create_product(
        &app,
        json!({"name": "Throw Pillow", "category": "Home", "stock_quantity": 1, "price": 15, "tags": ["aurora", "soft"]}),
    )
    .await;
    create_product(
        &app,
        json!({"name": "Unrelated", "category": "Home", "stock_quantity": 1, "price": 5}),
    )
    .await;

    let body = list(&app, "?search=aurora").await;
    assert_eq!(body["total"], json!(3));
}

#[tokio::test]
async fn featured_listing_is_capped_at_six() {
    let app = TestApp::new().await;

    for i in 0..8 {
        create_product(
            &app,
            json!({"name": format!("Featured {}", i), "price": 10, "category": "Other", "featured": true, "stock_quantity": 1}),
        )
        .await;
    }

    let response = app
        .request(Method::GET, "/api/v1/products/featured", None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body.as_array().unwrap().len(), 6);
}

#[tokio::test]
async fn slug_is_generated_and_regenerated_on_rename() {
    let app = TestApp::new().await;

    let created = create_product(
        &app,
        json!({"name": "Premium Smartphone Pro", "price": 999, "category": "Electronics", "stock_quantity": 3}),
    )
    .await;
    assert_eq!(created["slug"], json!("premium-smartphone-pro"));

    // Lookup by slug returns the same product
    let response = app
        .request(
            Method::GET,
            "/api/v1/products/slug/premium-smartphone-pro",
            None,
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let by_slug = response_json(response).await;
    assert_eq!(by_slug["id"], created["id"]);

    // Renaming regenerates the slug
    let id = created["id"].as_str().unwrap();
    let response = app
        .request(
            Method::PUT,
            &format!("/api/v1/products/{}", id),
            Some(json!({"name": "Premium Smartphone Max"})),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let updated = response_json(response).await;
    assert_eq!(updated["slug"], json!("premium-smartphone-max"));
}

#[tokio::test]
async fn duplicate_slug_is_a_conflict() {
    let app = TestApp::new().await;

    create_product(
        &app,
        json!({"name": "Same Name", "price": 10, "category": "Other", "stock_quantity": 1}),
    )
    .await;

    let response = app
        .request(
            Method::POST,
            "/api/v1/products",
            Some(json!({"name": "Same Name", "price": 12, "category": "Other", "stock_quantity": 1})),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn malformed_product_id_is_a_bad_request() {
    let app = TestApp::new().await;

    let response = app
        .request(Method::GET, "/api/v1/products/not-a-uuid", None)
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = response_json(response).await;
    assert_eq!(body["message"], json!("Invalid product ID format"));
}

#[tokio::test]
async fn reviews_recompute_the_average_rating() {
    let app = TestApp::new().await;
    let product = app.seed_product("Reviewed Product", dec!(20), 5).await;
    let uri = format!("/api/v1/products/{}/reviews", product.id);

    let response = app
        .request(
            Method::POST,
            &uri,
            Some(json!({"user_name": "Alice", "rating": 5, "comment": "Great"})),
        )
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    assert_eq!(body["rating"], json!(5.0));

    let response = app
        .request(
            Method::POST,
            &uri,
            Some(json!({"user_name": "Bob", "rating": 4})),
        )
        .await;
    let body = response_json(response).await;
    assert_eq!(body["rating"], json!(4.5));
    assert_eq!(body["reviews"].as_array().unwrap().len(), 2);

    let response = app
        .request(
            Method::POST,
            &uri,
            Some(json!({"user_name": "Mallory", "rating": 9})),
        )
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn seller_products_are_marked_and_listed() {
    let app = TestApp::new().await;
    let seller_id = Uuid::new_v4();

    let created = create_product(
        &app,
        json!({
            "name": "Seller Special",
            "price": 45,
            "category": "Other",
            "stock_quantity": 2,
            "seller_id": seller_id,
            "seller_name": "Casey Seller"
        }),
    )
    .await;
    assert_eq!(created["is_user_product"], json!(true));

    create_product(
        &app,
        json!({"name": "House Item", "price": 5, "category": "Other", "stock_quantity": 2}),
    )
    .await;

    let response = app
        .request(
            Method::GET,
            &format!("/api/v1/products/user/{}", seller_id),
            None,
        )
        .await;
    let body = response_json(response).await;
    assert_eq!(body.as_array().unwrap().len(), 1);
    assert_eq!(body[0]["name"], json!("Seller Special"));

    let body = list(&app, "?is_user_product=true").await;
    assert_eq!(body["total"], json!(1));
}

#[tokio::test]
async fn listing_reports_pagination_window() {
    let app = TestApp::new().await;
    for i in 0..5 {
        create_product(
            &app,
            json!({"name": format!("Item {}", i), "price": 10 + i, "category": "Other", "stock_quantity": 1}),
        )
        .await;
    }

    let body = list(&app, "?limit=2&skip=1&sort=price-low").await;
    assert_eq!(body["total"], json!(5));
    assert_eq!(body["limit"], json!(2));
    assert_eq!(body["skip"], json!(1));
    let products = body["products"].as_array().unwrap();
    assert_eq!(products.len(), 2);
    assert_eq!(decimal_of(&products[0]["price"]), dec!(11));
}

#[tokio::test]
async fn seed_endpoint_replaces_the_catalog() {
    let app = TestApp::new().await;
    app.seed_product("Pre-Seed Product", dec!(10), 1).await;

    let response = app.request(Method::POST, "/api/v1/seed", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = response_json(response).await;
    let count = body["count"].as_u64().unwrap();
    assert!(count > 0);
    assert_eq!(body["products"].as_array().unwrap().len(), count as usize);

    // The pre-seed product is gone; the catalog now matches the fixtures
    let listing = list(&app, "?limit=100").await;
    assert_eq!(listing["total"], json!(count));

    // Reseeding lands on the same fixture count
    let response = app.request(Method::POST, "/api/v1/seed", None).await;
    let body = response_json(response).await;
    assert_eq!(body["count"].as_u64().unwrap(), count);
}
