//! Saved recipes, formatting, printable pages, and authentication.

use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use serde_json::json;

use mealmind_core::{RecipeId, UserId};
use mealmind_integration_tests::{SAMPLE_IMAGE, SAMPLE_RECIPE, TestApp};

#[tokio::test]
async fn api_requires_login() {
    let app = TestApp::new();

    for uri in ["/api/recipes", "/api/workspace", "/api/pantry", "/api/subscription"] {
        let response = app.send(Method::GET, uri, None, None).await;
        assert_eq!(response.status, StatusCode::UNAUTHORIZED, "{uri}");
        assert_eq!(response.body["error"], "Please log in");
    }
}

#[tokio::test]
async fn invalid_token_is_rejected() {
    let app = TestApp::new();

    let request = Request::builder()
        .uri("/api/recipes")
        .header(header::AUTHORIZATION, "Bearer not-a-token")
        .body(Body::empty())
        .unwrap();
    let response = app.send_request(request).await;

    assert_eq!(response.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn public_endpoints_need_no_login() {
    let app = TestApp::new();

    let health = app.send(Method::GET, "/health", None, None).await;
    assert_eq!(health.status, StatusCode::OK);

    let ready = app.send(Method::GET, "/health/ready", None, None).await;
    assert_eq!(ready.status, StatusCode::OK);

    let config = app.send(Method::GET, "/api/config", None, None).await;
    assert_eq!(config.status, StatusCode::OK);
    assert_eq!(config.body["paypal_plan_id"], "P-TEST");
    assert_eq!(config.body["supabase_anon_key"], "test-anon-key");
}

#[tokio::test]
async fn responses_carry_request_id_and_security_headers() {
    let app = TestApp::new();

    let request = Request::builder()
        .uri("/health")
        .header("x-request-id", "req-123")
        .body(Body::empty())
        .unwrap();
    let response = app.send_request(request).await;

    assert_eq!(
        response.headers.get("x-request-id").and_then(|v| v.to_str().ok()),
        Some("req-123")
    );
    assert!(response.headers.contains_key(header::CONTENT_SECURITY_POLICY));
    assert!(response.headers.contains_key(header::X_CONTENT_TYPE_OPTIONS));
}

#[tokio::test]
async fn list_is_newest_first_and_scoped_to_user() {
    let app = TestApp::new();
    let user = UserId::random();
    app.store.seed_recipe(user, "**First**", None);
    app.store.seed_recipe(user, "**Second**", None);
    app.store.seed_recipe(UserId::random(), "**Someone else's**", None);

    let response = app.get("/api/recipes", user).await;

    assert_eq!(response.status, StatusCode::OK);
    let titles: Vec<&str> = response
        .body
        .as_array()
        .unwrap()
        .iter()
        .filter_map(|r| r["title"].as_str())
        .collect();
    assert_eq!(titles, ["Second", "First"]);
}

#[tokio::test]
async fn show_includes_formatted_blocks() {
    let app = TestApp::new();
    let user = UserId::random();
    let recipe = app.store.seed_recipe(user, SAMPLE_RECIPE, Some(SAMPLE_IMAGE));

    let response = app.get(&format!("/api/recipes/{}", recipe.id), user).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["title"], "Tomato Basil Pasta");
    assert_eq!(response.body["recipe_text"], SAMPLE_RECIPE);
    assert_eq!(
        response.body["blocks"][1],
        json!({ "type": "ingredient", "name": "Tomatoes", "confidence": "95%" })
    );
}

#[tokio::test]
async fn other_users_recipe_is_not_found() {
    let app = TestApp::new();
    let recipe = app.store.seed_recipe(UserId::random(), "**Mine**", None);
    let intruder = UserId::random();

    let show = app.get(&format!("/api/recipes/{}", recipe.id), intruder).await;
    assert_eq!(show.status, StatusCode::NOT_FOUND);

    let delete = app
        .delete(&format!("/api/recipes/{}", recipe.id), intruder)
        .await;
    assert_eq!(delete.status, StatusCode::NOT_FOUND);
    assert_eq!(delete.body["error"], "Recipe not found");
}

#[tokio::test]
async fn delete_removes_recipe() {
    let app = TestApp::new();
    let user = UserId::random();
    let recipe = app.store.seed_recipe(user, "**Gone soon**", None);

    let response = app.delete(&format!("/api/recipes/{}", recipe.id), user).await;

    assert_eq!(response.status, StatusCode::NO_CONTENT);
    assert!(app.store.recipes_of(user).is_empty());
}

#[tokio::test]
async fn format_endpoint_returns_blocks() {
    let app = TestApp::new();

    let response = app
        .post(
            "/api/recipes/format",
            UserId::random(),
            json!({ "text": SAMPLE_RECIPE }),
        )
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(
        response.body["blocks"],
        json!([
            { "type": "heading", "text": "Tomato Basil Pasta" },
            { "type": "ingredient", "name": "Tomatoes", "confidence": "95%" },
            { "type": "ingredient", "name": "Basil", "confidence": "80%" },
            { "type": "heading", "text": "Instructions" },
            { "type": "step", "number": 1, "text": "Boil the pasta" },
            { "type": "step", "number": 2, "text": "Toss with tomatoes and basil" }
        ])
    );
}

#[tokio::test]
async fn format_endpoint_handles_empty_text() {
    let app = TestApp::new();

    let response = app
        .post("/api/recipes/format", UserId::random(), json!({ "text": "" }))
        .await;

    assert_eq!(response.body["blocks"], json!([]));
}

#[tokio::test]
async fn printable_page_renders_recipe() {
    let app = TestApp::new();
    let user = UserId::random();
    let recipe = app.store.seed_recipe(user, SAMPLE_RECIPE, Some(SAMPLE_IMAGE));

    let response = app.get(&format!("/recipes/{}", recipe.id), user).await;

    assert_eq!(response.status, StatusCode::OK);
    assert!(response.text.contains("<h1>Tomato Basil Pasta</h1>"));
    assert!(response.text.contains("Boil the pasta"));
    assert!(response.text.contains("Confidence: 95%"));
    assert!(response.text.contains("class=\"recipe-photo\""));
}

#[tokio::test]
async fn printable_page_requires_owner() {
    let app = TestApp::new();
    let recipe = app.store.seed_recipe(UserId::random(), SAMPLE_RECIPE, None);

    let missing = app
        .get(&format!("/recipes/{}", RecipeId::random()), UserId::random())
        .await;
    assert_eq!(missing.status, StatusCode::NOT_FOUND);

    let anonymous = app
        .send(Method::GET, &format!("/recipes/{}", recipe.id), None, None)
        .await;
    assert_eq!(anonymous.status, StatusCode::UNAUTHORIZED);
}
