mod common;

use checkout_service::models::OrderStatus;
use checkout_service::services::OrderStore;
use common::{
    order_body, TestApp, TEST_CLIENT_ID, TEST_KEY_ID, TEST_SIGNING_SECRET, TEST_USER_ID,
};
use reqwest::StatusCode;
use serde_json::{json, Value};
use service_core::utils::signature::SignedRequest;

#[tokio::test]
async fn creates_pending_order() {
    let app = TestApp::spawn().await;

    let response = app.create_order(&order_body("110001")).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["amount"], 41700);
    assert_eq!(body["currency"], "INR");
    assert_eq!(body["key_id"], TEST_KEY_ID);
    assert_eq!(body["gateway_order_id"], "order_test_1");

    let order_id = body["order_id"].as_str().unwrap();
    let order = app.store.find(order_id).await.unwrap().unwrap();
    assert_eq!(order.status, OrderStatus::Pending);
    assert_eq!(order.gateway_order_id, "order_test_1");
    assert_eq!(order.user_id, TEST_USER_ID);
    assert_eq!(order.items.len(), 2);
    assert_eq!(order.gateway_payment_id, None);

    let gateway_request = app.gateway.last_request().unwrap();
    assert_eq!(gateway_request.amount, 41700);
    assert_eq!(gateway_request.currency, "INR");
    assert!(gateway_request.receipt.starts_with("order_"));
}

#[tokio::test]
async fn missing_fields_are_rejected_before_gateway() {
    let app = TestApp::spawn().await;

    for field in [
        "amount",
        "items",
        "shipping_name",
        "shipping_address",
        "shipping_pincode",
        "user_id",
    ] {
        let mut body = order_body("110001");
        body.as_object_mut().unwrap().remove(field);

        let response = app.create_order(&body).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "without {field}");
        let error: Value = response.json().await.unwrap();
        assert_eq!(error["error"], "Missing required fields");
    }

    let mut empty_items = order_body("110001");
    empty_items["items"] = json!([]);
    assert_eq!(
        app.create_order(&empty_items).await.status(),
        StatusCode::BAD_REQUEST
    );

    assert_eq!(app.gateway.calls(), 0);
    assert!(app.store.is_empty());
}

#[tokio::test]
async fn malformed_json_is_a_bad_request() {
    let app = TestApp::spawn().await;

    let response = app
        .client
        .post(app.url("/order/create"))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body: Value = response.json().await.unwrap();
    assert!(body["error"]
        .as_str()
        .unwrap()
        .starts_with("Invalid request body"));
}

#[tokio::test]
async fn unserviceable_pincode_blocks_order() {
    let app = TestApp::spawn().await;

    let response = app.create_order(&order_body("999999")).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Delivery not available for this pincode");
    assert_eq!(app.gateway.calls(), 0);
    assert!(app.store.is_empty());
}

#[tokio::test]
async fn invalid_shipping_pincode_lists_field() {
    let app = TestApp::spawn().await;

    let response = app.create_order(&order_body("11a001")).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body["fields"]["pincode"], "Pincode must be exactly 6 digits");
    assert_eq!(app.gateway.calls(), 0);
}

#[tokio::test]
async fn amount_must_equal_item_total() {
    let app = TestApp::spawn().await;

    let mut body = order_body("110001");
    body["amount"] = json!(100);

    let response = app.create_order(&body).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(app.gateway.calls(), 0);
}

#[tokio::test]
async fn gateway_failure_is_generic_and_leaves_no_order() {
    let app = TestApp::spawn().await;
    app.gateway.fail_next(true);

    let response = app.create_order(&order_body("110001")).await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let body: Value = response.json().await.unwrap();
    assert_eq!(body, json!({ "error": "Unable to initiate payment, please try again" }));
    assert_eq!(app.gateway.calls(), 1);
    assert!(app.store.is_empty());
}

#[tokio::test]
async fn retry_without_key_creates_second_order() {
    let app = TestApp::spawn().await;

    let first: Value = app.create_order(&order_body("110001")).await.json().await.unwrap();
    let second: Value = app.create_order(&order_body("110001")).await.json().await.unwrap();

    assert_ne!(first["order_id"], second["order_id"]);
    assert_ne!(first["gateway_order_id"], second["gateway_order_id"]);
    assert_eq!(app.store.len(), 2);
}

#[tokio::test]
async fn retry_with_idempotency_key_returns_same_order() {
    let app = TestApp::spawn().await;

    let mut body = order_body("110001");
    body["idempotency_key"] = json!("checkout-7f3a");

    let first: Value = app.create_order(&body).await.json().await.unwrap();
    let second: Value = app.create_order(&body).await.json().await.unwrap();

    assert_eq!(first, second);
    assert_eq!(app.gateway.calls(), 1);
    assert_eq!(app.store.len(), 1);

    body["amount"] = json!(5900);
    body["items"] = json!([
        { "book_id": "1", "title": "How to Find Guru", "price": 5900, "quantity": 1 }
    ]);
    let conflict = app.create_order(&body).await;
    assert_eq!(conflict.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn lists_orders_for_user() {
    let app = TestApp::spawn().await;

    app.create_order(&order_body("110001")).await;
    app.create_order(&order_body("400001")).await;

    let mut other = order_body("110001");
    other["user_id"] = json!("someone-else");
    app.create_order(&other).await;

    let response = app.orders_for(TEST_USER_ID).await;
    assert_eq!(response.status(), StatusCode::OK);

    let orders: Vec<Value> = response.json().await.unwrap();
    assert_eq!(orders.len(), 2);
    assert_eq!(orders[0]["shipping_pincode"], "400001");
    assert_eq!(orders[1]["shipping_pincode"], "110001");
    assert!(orders.iter().all(|o| o["status"] == "Pending"));
}

#[tokio::test]
async fn listing_orders_requires_user_header() {
    let app = TestApp::spawn().await;

    let response = app.orders_for("").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn unsigned_order_history_is_unauthorized() {
    let app = TestApp::spawn().await;
    app.create_order(&order_body("110001")).await;

    let response = app
        .client
        .get(app.url("/orders"))
        .header("X-User-ID", TEST_USER_ID)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = app.get("/orders").await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn order_history_signed_with_the_wrong_secret_is_unauthorized() {
    let app = TestApp::spawn().await;
    app.create_order(&order_body("110001")).await;

    let response = app
        .signed_get("/orders", TEST_USER_ID, "not_the_signing_secret")
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn signature_for_one_user_does_not_open_another_users_history() {
    let app = TestApp::spawn().await;
    app.create_order(&order_body("110001")).await;

    let timestamp = chrono::Utc::now().timestamp();
    let signature = SignedRequest {
        method: "GET",
        path: "/orders",
        timestamp,
        nonce: "nonce-swap",
        user_id: "someone-else",
        body: b"",
    }
    .sign(TEST_SIGNING_SECRET)
    .unwrap();

    let response = app
        .client
        .get(app.url("/orders"))
        .header("X-Client-ID", TEST_CLIENT_ID)
        .header("X-Timestamp", timestamp.to_string())
        .header("X-Nonce", "nonce-swap")
        .header("X-User-ID", TEST_USER_ID)
        .header("X-Signature", signature)
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}
