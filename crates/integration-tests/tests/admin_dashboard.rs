//! Admin dashboard access and data.

#![allow(clippy::unwrap_used, clippy::float_cmp)]

use std::sync::Arc;

use agar_shop_integration_tests::{
    ADMIN_EMAIL, CUSTOMER_EMAIL, MockShopApi, TestClient, test_app,
};
use axum::http::StatusCode;
use serde_json::json;

const ADMIN_REQUIRED: &str = "/unauthorized?message=admin%20login%20required";

#[tokio::test]
async fn test_guests_are_turned_away() {
    let mut client = TestClient::new(test_app(Arc::new(MockShopApi::seeded())));
    let response = client.get("/api/admin/dashboard").await;

    assert_eq!(response.status, StatusCode::SEE_OTHER);
    assert_eq!(response.location.as_deref(), Some(ADMIN_REQUIRED));
}

#[tokio::test]
async fn test_customers_are_turned_away() {
    let mut client = TestClient::new(test_app(Arc::new(MockShopApi::seeded())));
    client.login(CUSTOMER_EMAIL).await;

    let response = client.get("/api/admin/dashboard").await;
    assert_eq!(response.status, StatusCode::SEE_OTHER);
    assert_eq!(response.location.as_deref(), Some(ADMIN_REQUIRED));
}

#[tokio::test]
async fn test_admin_sees_summary_and_chart() {
    let api = Arc::new(MockShopApi::seeded());
    let app = test_app(api.clone());

    // One order from a customer first
    let mut customer = TestClient::new(app.clone());
    customer
        .post("/api/cart/items", json!({ "productId": "p1", "quantity": 2 }))
        .await;
    customer.login(CUSTOMER_EMAIL).await;
    customer
        .post(
            "/api/shipping",
            json!({
                "fullName": "John Smith",
                "address": "Peace Ave 17",
                "city": "Ulaanbaatar",
                "postalCode": "14200",
                "country": "Mongolia"
            }),
        )
        .await;
    customer
        .post("/api/payment", json!({ "paymentMethod": "PayPal" }))
        .await;
    assert_eq!(
        customer.post("/api/placeorder", json!({})).await.status,
        StatusCode::OK
    );

    let mut admin = TestClient::new(app);
    admin.login(ADMIN_EMAIL).await;
    let response = admin.get("/api/admin/dashboard").await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.json["loading"], false);
    assert_eq!(response.json["error"], json!(null));
    assert_eq!(response.json["summary"]["ordersCount"], 1);
    assert_eq!(response.json["summary"]["productsCount"], 3);
    assert_eq!(response.json["summary"]["ordersPrice"], 176.0);
    assert_eq!(response.json["chart"]["labels"], json!(["2024/03"]));
    assert_eq!(response.json["chart"]["data"], json!([176.0]));
}
