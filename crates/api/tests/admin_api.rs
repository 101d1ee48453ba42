//! HTTP-level tests for admin-only endpoints: users, ignore lists,
//! feature flags, and maintenance mode.

mod common;

use axum::http::StatusCode;
use common::{
    body_json, delete_auth, get, get_auth, patch_json_auth, post_auth, post_json_auth,
    put_json_auth, user_with_token,
};
use sqlx::PgPool;
use streamsource_core::roles::Role;
use streamsource_db::repositories::FeatureFlagRepo;

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_admin_routes_reject_non_admins(pool: PgPool) {
    let (_, editor_token) = user_with_token(&pool, "editor@example.com", Role::Editor).await;

    for uri in ["/api/v1/admin/users", "/api/v1/admin/ignore-lists", "/api/v1/admin/feature-flags"] {
        let response = get_auth(common::build_test_app(pool.clone()), uri, &editor_token).await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN, "{uri}");
    }
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_list_users_filters_by_role(pool: PgPool) {
    let (_, admin_token) = user_with_token(&pool, "admin@example.com", Role::Admin).await;
    user_with_token(&pool, "editor@example.com", Role::Editor).await;
    user_with_token(&pool, "viewer@example.com", Role::Default).await;

    let response = get_auth(
        common::build_test_app(pool.clone()),
        "/api/v1/admin/users?role=editor",
        &admin_token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["meta"]["total"], 1);
    assert_eq!(json["data"][0]["email"], "editor@example.com");
    assert!(json["data"][0].get("password_hash").is_none());

    let response = get_auth(
        common::build_test_app(pool),
        "/api/v1/admin/users?role=superuser",
        &admin_token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_admin_changes_role_but_not_their_own(pool: PgPool) {
    let (admin, admin_token) = user_with_token(&pool, "admin@example.com", Role::Admin).await;
    let (viewer, _) = user_with_token(&pool, "viewer@example.com", Role::Default).await;

    let response = patch_json_auth(
        common::build_test_app(pool.clone()),
        &format!("/api/v1/admin/users/{}", viewer.id),
        serde_json::json!({ "role": "editor" }),
        &admin_token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["role"], "editor");

    let own = format!("/api/v1/admin/users/{}", admin.id);
    let response = patch_json_auth(
        common::build_test_app(pool.clone()),
        &own,
        serde_json::json!({ "role": "default" }),
        &admin_token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let response = patch_json_auth(
        common::build_test_app(pool),
        &own,
        serde_json::json!({ "is_active": false }),
        &admin_token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_ignore_list_crud_and_duplicates(pool: PgPool) {
    let (_, admin_token) = user_with_token(&pool, "admin@example.com", Role::Admin).await;

    let body = serde_json::json!({ "list_type": "twitch_user", "value": "@SpamBot" });
    let response = post_json_auth(
        common::build_test_app(pool.clone()),
        "/api/v1/admin/ignore-lists",
        body.clone(),
        &admin_token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let entry = body_json(response).await["data"].clone();
    assert_eq!(entry["value"], "spambot");

    let response = post_json_auth(
        common::build_test_app(pool.clone()),
        "/api/v1/admin/ignore-lists",
        body,
        &admin_token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = post_json_auth(
        common::build_test_app(pool.clone()),
        "/api/v1/admin/ignore-lists",
        serde_json::json!({ "list_type": "email", "value": "x" }),
        &admin_token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let response = post_json_auth(
        common::build_test_app(pool.clone()),
        "/api/v1/admin/ignore-lists/check",
        serde_json::json!({ "twitch_user": "SPAMBOT" }),
        &admin_token,
    )
    .await;
    let json = body_json(response).await;
    assert_eq!(json["data"]["blocked"], true);
    assert_eq!(json["data"]["matches"][0]["field"], "twitch_user");

    let response = delete_auth(
        common::build_test_app(pool),
        &format!("/api/v1/admin/ignore-lists/{}", entry["id"]),
        &admin_token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_bulk_import_skips_existing_and_reports_rejects(pool: PgPool) {
    let (_, admin_token) = user_with_token(&pool, "admin@example.com", Role::Admin).await;
    let body = serde_json::json!({
        "list_type": "domain",
        "values": ["spam.example", "https://www.Junk.example/path", "spam.example", "   "]
    });

    let response = post_json_auth(
        common::build_test_app(pool.clone()),
        "/api/v1/admin/ignore-lists/bulk",
        body.clone(),
        &admin_token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let json = body_json(response).await;
    assert_eq!(json["data"]["submitted"], 4);
    assert_eq!(json["data"]["inserted"], 2);
    assert_eq!(json["data"]["rejected"].as_array().unwrap().len(), 1);

    let response = post_json_auth(
        common::build_test_app(pool),
        "/api/v1/admin/ignore-lists/bulk",
        body,
        &admin_token,
    )
    .await;
    assert_eq!(body_json(response).await["data"]["inserted"], 0);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_bulk_import_publishes_created_events(pool: PgPool) {
    let (admin, admin_token) = user_with_token(&pool, "admin@example.com", Role::Admin).await;
    let state = common::test_state(pool);
    let mut events = state.event_bus.subscribe();

    let response = post_json_auth(
        common::build_test_app_with(state),
        "/api/v1/admin/ignore-lists/bulk",
        serde_json::json!({ "list_type": "twitch_user", "values": ["@LoudBot", "QuietBot"] }),
        &admin_token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let mut values = Vec::new();
    while let Ok(event) = events.try_recv() {
        assert_eq!(event.action.as_str(), "created");
        assert_eq!(event.entity_type, "ignore_list");
        assert_eq!(event.actor_user_id, Some(admin.id));
        values.push(event.payload["value"].as_str().unwrap().to_string());
    }
    values.sort();
    assert_eq!(values, vec!["loudbot", "quietbot"]);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_bulk_import_respects_feature_flag(pool: PgPool) {
    let (_, admin_token) = user_with_token(&pool, "admin@example.com", Role::Admin).await;
    FeatureFlagRepo::set_enabled(&pool, "stream_bulk_import", false)
        .await
        .unwrap();

    let response = post_json_auth(
        common::build_test_app(pool),
        "/api/v1/admin/ignore-lists/bulk",
        serde_json::json!({ "list_type": "domain", "values": ["spam.example"] }),
        &admin_token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_feature_flag_gates(pool: PgPool) {
    let (_, admin_token) = user_with_token(&pool, "admin@example.com", Role::Admin).await;
    let (editor, editor_token) = user_with_token(&pool, "editor@example.com", Role::Editor).await;

    let response = post_json_auth(
        common::build_test_app(pool.clone()),
        "/api/v1/admin/feature-flags",
        serde_json::json!({ "name": "map_view", "description": "Map tab", "enabled": false }),
        &admin_token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = get_auth(
        common::build_test_app(pool.clone()),
        "/api/v1/feature-flags/map_view",
        &editor_token,
    )
    .await;
    assert_eq!(body_json(response).await["data"]["enabled"], false);

    let response = post_auth(
        common::build_test_app(pool.clone()),
        &format!("/api/v1/admin/feature-flags/map_view/actors/{}", editor.id),
        &admin_token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = get_auth(
        common::build_test_app(pool.clone()),
        "/api/v1/feature-flags/map_view",
        &editor_token,
    )
    .await;
    assert_eq!(body_json(response).await["data"]["enabled"], true);

    let response = get(common::build_test_app(pool.clone()), "/api/v1/feature-flags/map_view").await;
    assert_eq!(body_json(response).await["data"]["enabled"], false);

    let response = put_json_auth(
        common::build_test_app(pool.clone()),
        "/api/v1/admin/feature-flags/map_view/percentage",
        serde_json::json!({ "percentage": 150 }),
        &admin_token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let response = post_auth(
        common::build_test_app(pool.clone()),
        "/api/v1/admin/feature-flags/map_view/groups/moderator",
        &admin_token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let response = post_auth(
        common::build_test_app(pool),
        "/api/v1/admin/feature-flags/no_such_flag/enable",
        &admin_token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_maintenance_mode_blocks_non_admins(pool: PgPool) {
    let (_, admin_token) = user_with_token(&pool, "admin@example.com", Role::Admin).await;
    let (_, editor_token) = user_with_token(&pool, "editor@example.com", Role::Editor).await;
    FeatureFlagRepo::set_enabled(&pool, "maintenance_mode", true)
        .await
        .unwrap();

    let response = get_auth(common::build_test_app(pool.clone()), "/api/v1/streams", &editor_token).await;
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

    let response = get_auth(common::build_test_app(pool.clone()), "/api/v1/streams", &admin_token).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = get(common::build_test_app(pool), "/health").await;
    assert_eq!(response.status(), StatusCode::OK);
}
