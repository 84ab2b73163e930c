//! Workspace flow: image, generation, save, edit.

use std::sync::Arc;

use axum::http::{Method, StatusCode};
use serde_json::json;

use mealmind_core::UserId;
use mealmind_core::recipe::INSTRUCTIONS_MARKER;
use mealmind_integration_tests::{
    GenerationGate, SAMPLE_IMAGE, SAMPLE_RECIPE, StubGenerator, TestApp,
};

#[tokio::test]
async fn new_workspace_starts_on_upload_view() {
    let app = TestApp::new();

    let response = app.get("/api/workspace", UserId::random()).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["view"], "upload");
    assert_eq!(response.body["image"], serde_json::Value::Null);
    assert_eq!(response.body["generating"], false);
}

#[tokio::test]
async fn generate_without_image_is_rejected() {
    let app = TestApp::new();

    let response = app
        .post("/api/workspace/generate", UserId::random(), json!({}))
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
    assert_eq!(
        response.body["error"],
        "Please upload an image of your ingredients first"
    );
    assert_eq!(app.generator.calls(), 0);
}

#[tokio::test]
async fn invalid_image_is_rejected() {
    let app = TestApp::new();

    let response = app
        .put(
            "/api/workspace/image",
            UserId::random(),
            json!({ "image": "data:text/plain;base64,aGVsbG8=" }),
        )
        .await;

    assert_eq!(response.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn generate_shows_formatted_recipe_and_counts_usage() {
    let app = TestApp::new();
    let user = UserId::random();

    let response = app.upload_sample_image(user).await;
    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["image"], SAMPLE_IMAGE);

    app.put(
        "/api/workspace/instructions",
        user,
        json!({ "instructions": "make it spicy" }),
    )
    .await;

    let response = app
        .post("/api/workspace/generate", user, json!({}))
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["view"], "recipe");
    assert_eq!(response.body["draft"], SAMPLE_RECIPE);
    assert_eq!(response.body["blocks"][0]["type"], "heading");
    assert_eq!(response.body["blocks"][0]["text"], "Tomato Basil Pasta");
    assert_eq!(app.generator.calls(), 1);
    assert_eq!(app.store.generations_of(user), 1);

    let prompt = app.generator.last_prompt().unwrap();
    assert!(prompt.contains("Additional Instructions: make it spicy"));
    assert!(prompt.contains("Skill level: intermediate"));
}

#[tokio::test]
async fn failed_generation_keeps_workspace_and_usage() {
    let generator = StubGenerator::new(SAMPLE_RECIPE);
    generator.fail();
    let app = TestApp::with_generator(generator);
    let user = UserId::random();
    app.upload_sample_image(user).await;

    let response = app
        .post("/api/workspace/generate", user, json!({}))
        .await;

    assert_eq!(response.status, StatusCode::BAD_GATEWAY);
    assert_eq!(app.store.generations_of(user), 0);

    let workspace = app.get("/api/workspace", user).await;
    assert_eq!(workspace.body["view"], "upload");
    assert_eq!(workspace.body["image"], SAMPLE_IMAGE);
    assert_eq!(workspace.body["generating"], false);
}

#[tokio::test]
async fn second_generation_while_running_is_rejected() {
    let gate = Arc::new(GenerationGate::default());
    let app = TestApp::with_generator(StubGenerator::gated(SAMPLE_RECIPE, gate.clone()));
    let user = UserId::random();
    app.upload_sample_image(user).await;

    let first = tokio::spawn({
        let app = app.clone();
        async move {
            app.post("/api/workspace/generate", user, json!({}))
                .await
                .status
        }
    });
    gate.started.notified().await;

    let status = app.get("/api/workspace", user).await;
    assert_eq!(status.body["generating"], true);

    let second = app
        .post("/api/workspace/generate", user, json!({}))
        .await;
    assert_eq!(second.status, StatusCode::CONFLICT);

    gate.release.notify_one();
    assert_eq!(first.await.unwrap(), StatusCode::OK);
    assert_eq!(app.generator.calls(), 1);

    let status = app.get("/api/workspace", user).await;
    assert_eq!(status.body["generating"], false);
}

#[tokio::test]
async fn save_without_draft_does_nothing() {
    let app = TestApp::new();
    let user = UserId::random();
    app.upload_sample_image(user).await;

    let response = app.post("/api/workspace/save", user, json!({})).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["recipe"], serde_json::Value::Null);
    assert_eq!(app.store.recipe_inserts(), 0);
    assert_eq!(response.body["workspace"]["image"], SAMPLE_IMAGE);
}

#[tokio::test]
async fn save_stores_recipe_and_resets_workspace() {
    let app = TestApp::new();
    let user = UserId::random();
    app.upload_sample_image(user).await;
    app.put(
        "/api/workspace/instructions",
        user,
        json!({ "instructions": "serve cold" }),
    )
    .await;
    app.post("/api/workspace/generate", user, json!({})).await;

    let response = app.post("/api/workspace/save", user, json!({})).await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(
        response.body["recipe"]["recipe_text"],
        format!("{SAMPLE_RECIPE}{INSTRUCTIONS_MARKER}serve cold")
    );
    assert_eq!(response.body["recipe"]["ingredients_image"], SAMPLE_IMAGE);
    assert_eq!(response.body["workspace"]["view"], "upload");
    assert_eq!(response.body["workspace"]["draft"], serde_json::Value::Null);
    assert_eq!(response.body["workspace"]["image"], serde_json::Value::Null);
    assert_eq!(response.body["workspace"]["instructions"], "");

    let saved = app.store.recipes_of(user);
    assert_eq!(saved.len(), 1);
}

#[tokio::test]
async fn edit_restores_saved_recipe() {
    let app = TestApp::new();
    let user = UserId::random();
    let recipe = app.store.seed_recipe(
        user,
        &format!("**Soup**{INSTRUCTIONS_MARKER}less salt"),
        Some(SAMPLE_IMAGE),
    );

    let response = app
        .post(&format!("/api/workspace/edit/{}", recipe.id), user, json!({}))
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["draft"], "**Soup**");
    assert_eq!(response.body["instructions"], "less salt");
    assert_eq!(response.body["image"], SAMPLE_IMAGE);
    assert_eq!(response.body["view"], "upload");
}

#[tokio::test]
async fn edit_of_another_users_recipe_is_not_found() {
    let app = TestApp::new();
    let recipe = app.store.seed_recipe(UserId::random(), "**Soup**", None);

    let response = app
        .post(
            &format!("/api/workspace/edit/{}", recipe.id),
            UserId::random(),
            json!({}),
        )
        .await;

    assert_eq!(response.status, StatusCode::NOT_FOUND);
    assert_eq!(response.body["error"], "Recipe not found");
}

#[tokio::test]
async fn discard_clears_everything() {
    let app = TestApp::new();
    let user = UserId::random();
    app.upload_sample_image(user).await;
    app.post("/api/workspace/generate", user, json!({})).await;

    let response = app
        .send(Method::DELETE, "/api/workspace", Some(user), None)
        .await;

    assert_eq!(response.status, StatusCode::OK);
    assert_eq!(response.body["view"], "upload");
    assert_eq!(response.body["draft"], serde_json::Value::Null);
    assert_eq!(response.body["image"], serde_json::Value::Null);
}

#[tokio::test]
async fn workspaces_are_per_user() {
    let app = TestApp::new();
    let alice = UserId::random();
    app.upload_sample_image(alice).await;

    let bob = app.get("/api/workspace", UserId::random()).await;

    assert_eq!(bob.body["image"], serde_json::Value::Null);
}
