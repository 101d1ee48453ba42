//! HTTP-level tests for streams, their notes, and stream-related policy.

mod common;

use axum::http::StatusCode;
use common::{
    body_json, delete_auth, get_auth, patch_json_auth, post_auth, post_json_auth, user_with_token,
};
use sqlx::PgPool;
use streamsource_core::roles::Role;
use streamsource_db::repositories::IgnoreListRepo;

async fn create_stream(pool: &PgPool, token: &str, body: serde_json::Value) -> serde_json::Value {
    let response = post_json_auth(common::build_test_app(pool.clone()), "/api/v1/streams", body, token).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await["data"].clone()
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_create_detects_platform_and_defaults(pool: PgPool) {
    let (user, token) = user_with_token(&pool, "editor@example.com", Role::Editor).await;

    let stream = create_stream(
        &pool,
        &token,
        serde_json::json!({ "link": "https://www.twitch.tv/someone" }),
    )
    .await;

    assert_eq!(stream["platform"], "twitch");
    assert_eq!(stream["status"], "unknown");
    assert_eq!(stream["kind"], "video");
    assert_eq!(stream["source"], "www.twitch.tv");
    assert_eq!(stream["user_id"], user.id);
    assert_eq!(stream["is_pinned"], false);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_create_live_stamps_lifecycle(pool: PgPool) {
    let (_, token) = user_with_token(&pool, "editor@example.com", Role::Editor).await;

    let stream = create_stream(
        &pool,
        &token,
        serde_json::json!({ "link": "https://tiktok.com/@x/live", "source": "X", "status": "live" }),
    )
    .await;

    assert_eq!(stream["status"], "live");
    assert!(stream["started_at"].is_string());
    assert!(stream["last_live_at"].is_string());
    assert!(stream["last_checked_at"].is_string());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_create_rejects_invalid_input(pool: PgPool) {
    let (_, token) = user_with_token(&pool, "editor@example.com", Role::Editor).await;

    for body in [
        serde_json::json!({ "link": "ftp://example.com/stream" }),
        serde_json::json!({ "link": "https://example.com", "status": "sleeping" }),
        serde_json::json!({ "link": "https://example.com", "kind": "hologram" }),
    ] {
        let response = post_json_auth(common::build_test_app(pool.clone()), "/api/v1/streams", body, &token).await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_default_role_cannot_create(pool: PgPool) {
    let (_, token) = user_with_token(&pool, "viewer@example.com", Role::Default).await;
    let body = serde_json::json!({ "link": "https://example.com/live" });

    let response = post_json_auth(common::build_test_app(pool), "/api/v1/streams", body, &token).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_ignore_listed_domain_is_rejected(pool: PgPool) {
    let (_, token) = user_with_token(&pool, "editor@example.com", Role::Editor).await;
    IgnoreListRepo::create(&pool, "domain", "spam.example", None)
        .await
        .unwrap();

    let body = serde_json::json!({ "link": "https://live.spam.example/watch" });
    let response = post_json_auth(common::build_test_app(pool), "/api/v1/streams", body, &token).await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let json = body_json(response).await;
    assert!(json["error"].as_str().unwrap().contains("spam.example"));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_editors_update_only_their_own_streams(pool: PgPool) {
    let (_, owner_token) = user_with_token(&pool, "owner@example.com", Role::Editor).await;
    let (_, other_token) = user_with_token(&pool, "other@example.com", Role::Editor).await;
    let (_, admin_token) = user_with_token(&pool, "admin@example.com", Role::Admin).await;
    let stream = create_stream(&pool, &owner_token, serde_json::json!({ "link": "https://example.com/a" })).await;
    let uri = format!("/api/v1/streams/{}", stream["id"]);

    let patch = serde_json::json!({ "title": "Downtown march" });
    let response = patch_json_auth(common::build_test_app(pool.clone()), &uri, patch.clone(), &other_token).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = patch_json_auth(common::build_test_app(pool.clone()), &uri, patch.clone(), &owner_token).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["title"], "Downtown march");

    let response = patch_json_auth(common::build_test_app(pool), &uri, patch, &admin_token).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_status_transitions(pool: PgPool) {
    let (_, token) = user_with_token(&pool, "editor@example.com", Role::Editor).await;
    let stream = create_stream(&pool, &token, serde_json::json!({ "link": "https://example.com/s" })).await;
    let uri = format!("/api/v1/streams/{}/status", stream["id"]);

    let response = patch_json_auth(
        common::build_test_app(pool.clone()),
        &uri,
        serde_json::json!({ "status": "live" }),
        &token,
    )
    .await;
    let live = body_json(response).await["data"].clone();
    assert_eq!(live["status"], "live");
    assert!(live["started_at"].is_string());
    assert!(live["ended_at"].is_null());

    let response = patch_json_auth(
        common::build_test_app(pool.clone()),
        &uri,
        serde_json::json!({ "status": "offline" }),
        &token,
    )
    .await;
    let offline = body_json(response).await["data"].clone();
    assert_eq!(offline["status"], "offline");
    assert!(offline["ended_at"].is_string());
    assert_eq!(offline["started_at"], live["started_at"]);

    let response = patch_json_auth(
        common::build_test_app(pool.clone()),
        &uri,
        serde_json::json!({ "status": "live" }),
        &token,
    )
    .await;
    let relive = body_json(response).await["data"].clone();
    assert!(relive["ended_at"].is_null());
    assert_eq!(relive["started_at"], live["started_at"]);

    let response = post_auth(
        common::build_test_app(pool.clone()),
        &format!("/api/v1/streams/{}/archive", stream["id"]),
        &token,
    )
    .await;
    let archived = body_json(response).await["data"].clone();
    let ended_at: chrono::DateTime<chrono::Utc> =
        serde_json::from_value(archived["ended_at"].clone()).unwrap();
    let last_live_at: chrono::DateTime<chrono::Utc> =
        serde_json::from_value(archived["last_live_at"].clone()).unwrap();
    assert!(ended_at >= last_live_at);

    let response = patch_json_auth(
        common::build_test_app(pool),
        &uri,
        serde_json::json!({ "status": "asleep" }),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_pin_archive_and_list_order(pool: PgPool) {
    let (_, token) = user_with_token(&pool, "editor@example.com", Role::Editor).await;
    let first = create_stream(&pool, &token, serde_json::json!({ "link": "https://example.com/1" })).await;
    let second = create_stream(&pool, &token, serde_json::json!({ "link": "https://example.com/2" })).await;

    let response = post_auth(
        common::build_test_app(pool.clone()),
        &format!("/api/v1/streams/{}/pin", first["id"]),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = get_auth(common::build_test_app(pool.clone()), "/api/v1/streams", &token).await;
    let json = body_json(response).await;
    assert_eq!(json["meta"]["total"], 2);
    assert_eq!(json["data"][0]["id"], first["id"]);

    let response = post_auth(
        common::build_test_app(pool.clone()),
        &format!("/api/v1/streams/{}/archive", second["id"]),
        &token,
    )
    .await;
    let archived = body_json(response).await["data"].clone();
    assert_eq!(archived["is_archived"], true);
    assert!(archived["ended_at"].is_string());

    let response = post_auth(
        common::build_test_app(pool.clone()),
        &format!("/api/v1/streams/{}/pin", second["id"]),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let response = get_auth(
        common::build_test_app(pool),
        "/api/v1/streams?is_archived=false",
        &token,
    )
    .await;
    let json = body_json(response).await;
    assert_eq!(json["meta"]["total"], 1);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_notes_on_streams(pool: PgPool) {
    let (_, token) = user_with_token(&pool, "editor@example.com", Role::Editor).await;
    let (_, other_token) = user_with_token(&pool, "other@example.com", Role::Editor).await;
    let stream = create_stream(&pool, &token, serde_json::json!({ "link": "https://example.com/n" })).await;
    let notes_uri = format!("/api/v1/streams/{}/notes", stream["id"]);

    let response = post_json_auth(
        common::build_test_app(pool.clone()),
        &notes_uri,
        serde_json::json!({ "content": "   " }),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let response = post_json_auth(
        common::build_test_app(pool.clone()),
        &notes_uri,
        serde_json::json!({ "content": "Camera moved to 5th Ave" }),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let note = body_json(response).await["data"].clone();
    assert_eq!(note["notable_type"], "stream");

    let note_uri = format!("/api/v1/notes/{}", note["id"]);
    let response = patch_json_auth(
        common::build_test_app(pool.clone()),
        &note_uri,
        serde_json::json!({ "content": "hijack" }),
        &other_token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = get_auth(common::build_test_app(pool.clone()), &notes_uri, &other_token).await;
    assert_eq!(body_json(response).await["meta"]["total"], 1);

    let response = post_json_auth(
        common::build_test_app(pool),
        "/api/v1/streams/999999/notes",
        serde_json::json!({ "content": "orphan" }),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_delete_requires_ownership(pool: PgPool) {
    let (_, owner_token) = user_with_token(&pool, "owner@example.com", Role::Editor).await;
    let (_, other_token) = user_with_token(&pool, "other@example.com", Role::Editor).await;
    let stream = create_stream(&pool, &owner_token, serde_json::json!({ "link": "https://example.com/d" })).await;
    let uri = format!("/api/v1/streams/{}", stream["id"]);

    let response = delete_auth(common::build_test_app(pool.clone()), &uri, &other_token).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = delete_auth(common::build_test_app(pool.clone()), &uri, &owner_token).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);

    let response = get_auth(common::build_test_app(pool), &uri, &owner_token).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
