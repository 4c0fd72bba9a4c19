//! HTTP-level tests for the tags resource.

mod common;

use axum::http::StatusCode;
use common::{body_json, create_user, get, post_json, post_json_auth};
use prompthub_core::roles::Role;
use serde_json::json;
use sqlx::PgPool;

#[sqlx::test(migrations = "../../db/migrations")]
async fn create_tag_derives_slug(pool: PgPool) {
    let (_, token) = create_user(&pool, "curator", Role::User).await;
    let app = common::build_test_app(pool).await;

    let response = post_json_auth(
        app,
        "/api/v1/tags",
        json!({ "name": "  Machine Learning " }),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let json = body_json(response).await;
    assert_eq!(json["data"]["name"], "Machine Learning");
    assert_eq!(json["data"]["slug"], "machine-learning");
    assert_eq!(json["data"]["usage_count"], 0);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn tag_names_are_unique_ignoring_case(pool: PgPool) {
    let (_, token) = create_user(&pool, "curator", Role::User).await;
    let app = common::build_test_app(pool).await;

    post_json_auth(app.clone(), "/api/v1/tags", json!({ "name": "Rust" }), &token).await;
    let response = post_json_auth(app, "/api/v1/tags", json!({ "name": "rUST" }), &token).await;

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let json = body_json(response).await;
    assert_eq!(json["details"][0]["field"], "name");
    assert_eq!(json["details"][0]["message"], "has already been taken");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn blank_tag_name_is_rejected(pool: PgPool) {
    let (_, token) = create_user(&pool, "curator", Role::User).await;
    let app = common::build_test_app(pool).await;

    let response = post_json_auth(app, "/api/v1/tags", json!({ "name": "   " }), &token).await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let json = body_json(response).await;
    assert_eq!(json["error"], "name can't be blank");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn create_tag_requires_authentication(pool: PgPool) {
    let app = common::build_test_app(pool).await;
    let response = post_json(app, "/api/v1/tags", json!({ "name": "Anonymous" })).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn list_sorts_alphabetically_on_request(pool: PgPool) {
    let (_, token) = create_user(&pool, "curator", Role::User).await;
    let app = common::build_test_app(pool).await;
    for name in ["Zeta", "Alpha", "Mid"] {
        post_json_auth(app.clone(), "/api/v1/tags", json!({ "name": name }), &token).await;
    }

    let json = body_json(get(app.clone(), "/api/v1/tags?sort=alphabetical").await).await;
    let names: Vec<&str> = json["data"]
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["name"].as_str().unwrap())
        .collect();
    assert_eq!(names, vec!["Alpha", "Mid", "Zeta"]);

    let limited = body_json(get(app, "/api/v1/tags?limit=1&offset=1").await).await;
    assert_eq!(limited["data"].as_array().unwrap().len(), 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn show_tag_by_id_or_slug(pool: PgPool) {
    let (_, token) = create_user(&pool, "curator", Role::User).await;
    let app = common::build_test_app(pool).await;
    let created = body_json(
        post_json_auth(app.clone(), "/api/v1/tags", json!({ "name": "Prompt Design" }), &token)
            .await,
    )
    .await;

    let by_id = get(app.clone(), &format!("/api/v1/tags/{}", created["data"]["id"])).await;
    assert_eq!(by_id.status(), StatusCode::OK);

    let by_slug = body_json(get(app.clone(), "/api/v1/tags/prompt-design").await).await;
    assert_eq!(by_slug["data"]["id"], created["data"]["id"]);

    let missing = get(app, "/api/v1/tags/nothing-here").await;
    assert_eq!(missing.status(), StatusCode::NOT_FOUND);
}
