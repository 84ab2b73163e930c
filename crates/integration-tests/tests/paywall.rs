//! Free-generation limit and subscriptions.

use axum::http::StatusCode;
use serde_json::json;

use mealmind_core::{SubscriptionStatus, UserId};
use mealmind_integration_tests::{TEST_FREE_LIMIT, TestApp};

#[tokio::test]
async fn usage_for_new_user() {
    let app = TestApp::new();

    let response = app.get("/api/subscription", UserId::random()).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["subscription"], serde_json::Value::Null);
    assert_eq!(response.body["generation_count"], 0);
    assert_eq!(response.body["free_generation_limit"], TEST_FREE_LIMIT);
    assert_eq!(response.body["remaining_free_generations"], TEST_FREE_LIMIT);
    assert_eq!(response.body["paywalled"], false);
}

#[tokio::test]
async fn generation_at_limit_requires_payment() {
    let app = TestApp::new();
    let user = UserId::random();
    app.store.set_generation_count(user, TEST_FREE_LIMIT);
    app.upload_sample_image(user).await;

    let response = app
        .post("/api/workspace/generate", user, json!({}))
        .await;

    assert_eq!(response.status, StatusCode::PAYMENT_REQUIRED);
    assert_eq!(
        response.body["error"],
        "You have used all of your free recipe generations. Subscribe to keep cooking!"
    );
    assert_eq!(app.generator.calls(), 0);
    assert_eq!(app.store.generations_of(user), TEST_FREE_LIMIT);
}

#[tokio::test]
async fn last_free_generation_is_allowed() {
    let app = TestApp::new();
    let user = UserId::random();
    app.store.set_generation_count(user, TEST_FREE_LIMIT - 1);
    app.upload_sample_image(user).await;

    let response = app
        .post("/api/workspace/generate", user, json!({}))
        .await;
    assert_eq!(response.status, StatusCode::OK);

    let usage = app.get("/api/subscription", user).await;
    assert_eq!(usage.body["remaining_free_generations"], 0);
    assert_eq!(usage.body["paywalled"], true);
}

#[tokio::test]
async fn active_subscription_bypasses_limit() {
    let app = TestApp::new();
    let user = UserId::random();
    app.store.set_generation_count(user, TEST_FREE_LIMIT + 10);
    app.store
        .seed_subscription(user, "I-ACTIVE", SubscriptionStatus::Active);
    app.upload_sample_image(user).await;

    let response = app
        .post("/api/workspace/generate", user, json!({}))
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(app.generator.calls(), 1);
}

#[tokio::test]
async fn pending_subscription_does_not_bypass_limit() {
    let app = TestApp::new();
    let user = UserId::random();
    app.store.set_generation_count(user, TEST_FREE_LIMIT);
    app.store
        .seed_subscription(user, "I-PENDING", SubscriptionStatus::Pending);
    app.upload_sample_image(user).await;

    let response = app
        .post("/api/workspace/generate", user, json!({}))
        .await;

    assert_eq!(response.status, StatusCode::PAYMENT_REQUIRED);
}

#[tokio::test]
async fn approve_records_pending_subscription() {
    let app = TestApp::new();
    let user = UserId::random();

    let response = app
        .post(
            "/api/subscription",
            user,
            json!({ "subscriptionID": "I-APPROVED" }),
        )
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["subscription"]["status"], "pending");
    assert_eq!(
        response.body["subscription"]["paypal_subscription_id"],
        "I-APPROVED"
    );
    assert_eq!(response.body["subscription"]["payment_provider"], "paypal");
}

#[tokio::test]
async fn approve_then_webhook_activates() {
    let app = TestApp::new();
    let user = UserId::random();
    app.post(
        "/api/subscription",
        user,
        json!({ "subscription_id": "I-FLOW" }),
    )
    .await;

    app.send(
        axum::http::Method::POST,
        "/api/webhooks/paypal",
        None,
        Some(json!({
            "event_type": "BILLING.SUBSCRIPTION.CREATED",
            "resource": { "id": "I-FLOW" }
        })),
    )
    .await;

    let usage = app.get("/api/subscription", user).await;
    assert_eq!(usage.body["subscription"]["status"], "active");
}

#[tokio::test]
async fn approve_without_id_is_rejected() {
    let app = TestApp::new();

    let response = app
        .post(
            "/api/subscription",
            UserId::random(),
            json!({ "subscription_id": "  " }),
        )
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(response.body["error"], "Subscription id is required");
}
