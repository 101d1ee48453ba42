//! HTTP-level tests for streamers, annotations, timestamps, and locations.

mod common;

use axum::http::StatusCode;
use common::{body_json, delete_auth, get_auth, patch_json_auth, post_json_auth, user_with_token};
use sqlx::PgPool;
use streamsource_core::roles::Role;

async fn created(response: axum::response::Response) -> serde_json::Value {
    assert_eq!(response.status(), StatusCode::CREATED);
    body_json(response).await["data"].clone()
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_streamer_accounts_derive_profile_url(pool: PgPool) {
    let (_, token) = user_with_token(&pool, "editor@example.com", Role::Editor).await;
    let (_, admin_token) = user_with_token(&pool, "admin@example.com", Role::Admin).await;

    let streamer = created(
        post_json_auth(
            common::build_test_app(pool.clone()),
            "/api/v1/streamers",
            serde_json::json!({ "name": "Unicorn Riot" }),
            &token,
        )
        .await,
    )
    .await;
    let accounts_uri = format!("/api/v1/streamers/{}/accounts", streamer["id"]);

    let account = created(
        post_json_auth(
            common::build_test_app(pool.clone()),
            &accounts_uri,
            serde_json::json!({ "platform": "twitch", "username": "@unicornriot" }),
            &token,
        )
        .await,
    )
    .await;
    assert_eq!(account["username"], "unicornriot");
    assert_eq!(account["profile_url"], "https://www.twitch.tv/unicornriot");

    let response = post_json_auth(
        common::build_test_app(pool.clone()),
        &accounts_uri,
        serde_json::json!({ "platform": "twitch", "username": "unicornriot" }),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = patch_json_auth(
        common::build_test_app(pool.clone()),
        &format!("{accounts_uri}/{}", account["id"]),
        serde_json::json!({ "platform": "youtube" }),
        &token,
    )
    .await;
    assert_eq!(
        body_json(response).await["data"]["profile_url"],
        "https://www.youtube.com/@unicornriot"
    );

    let uri = format!("/api/v1/streamers/{}", streamer["id"]);
    let response = delete_auth(common::build_test_app(pool.clone()), &uri, &token).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let response = delete_auth(common::build_test_app(pool), &uri, &admin_token).await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_annotation_review_flow(pool: PgPool) {
    let (_, token) = user_with_token(&pool, "editor@example.com", Role::Editor).await;

    let annotation = created(
        post_json_auth(
            common::build_test_app(pool.clone()),
            "/api/v1/annotations",
            serde_json::json!({
                "title": "Kettling at 3rd and Pine",
                "event_type": "dispersal_order",
                "event_timestamp": "2026-06-01T20:15:00Z",
                "tags": ["Downtown", " downtown ", "kettle"]
            }),
            &token,
        )
        .await,
    )
    .await;
    assert_eq!(annotation["review_status"], "pending");
    assert_eq!(annotation["priority_level"], "medium");
    assert_eq!(annotation["tags"], serde_json::json!(["downtown", "kettle"]));

    let response = common::post_auth(
        common::build_test_app(pool.clone()),
        &format!("/api/v1/annotations/{}/resolve", annotation["id"]),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let resolved = body_json(response).await["data"].clone();
    assert_eq!(resolved["review_status"], "resolved");
    assert!(resolved["resolved_at"].is_string());

    let response = patch_json_auth(
        common::build_test_app(pool.clone()),
        &format!("/api/v1/annotations/{}", annotation["id"]),
        serde_json::json!({ "review_status": "pending" }),
        &token,
    )
    .await;
    assert!(body_json(response).await["data"]["resolved_at"].is_null());

    let response = get_auth(
        common::build_test_app(pool.clone()),
        "/api/v1/annotations?tag=DOWNTOWN",
        &token,
    )
    .await;
    assert_eq!(body_json(response).await["meta"]["total"], 1);

    let response = post_json_auth(
        common::build_test_app(pool),
        "/api/v1/annotations",
        serde_json::json!({
            "title": "Bad coordinates",
            "event_timestamp": "2026-06-01T20:15:00Z",
            "latitude": 95.0,
            "longitude": 10.0
        }),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_annotation_stream_links(pool: PgPool) {
    let (_, token) = user_with_token(&pool, "editor@example.com", Role::Editor).await;
    let stream = created(
        post_json_auth(
            common::build_test_app(pool.clone()),
            "/api/v1/streams",
            serde_json::json!({ "link": "https://example.com/live" }),
            &token,
        )
        .await,
    )
    .await;
    let annotation = created(
        post_json_auth(
            common::build_test_app(pool.clone()),
            "/api/v1/annotations",
            serde_json::json!({ "title": "Arrest", "event_timestamp": "2026-06-01T21:00:00Z" }),
            &token,
        )
        .await,
    )
    .await;
    let links_uri = format!("/api/v1/annotations/{}/streams", annotation["id"]);

    let response = post_json_auth(
        common::build_test_app(pool.clone()),
        &links_uri,
        serde_json::json!({ "stream_id": stream["id"], "relevance_score": 9 }),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let link = serde_json::json!({ "stream_id": stream["id"], "stream_timestamp_seconds": 125 });
    let response = post_json_auth(common::build_test_app(pool.clone()), &links_uri, link.clone(), &token).await;
    let created_link = created(response).await;
    assert_eq!(created_link["relevance_score"], 3);

    let response = post_json_auth(common::build_test_app(pool.clone()), &links_uri, link, &token).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = get_auth(common::build_test_app(pool.clone()), &links_uri, &token).await;
    assert_eq!(body_json(response).await["data"].as_array().unwrap().len(), 1);

    let response = delete_auth(
        common::build_test_app(pool),
        &format!("{links_uri}/{}", stream["id"]),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_timestamps_crud(pool: PgPool) {
    let (_, token) = user_with_token(&pool, "editor@example.com", Role::Editor).await;

    let marker = created(
        post_json_auth(
            common::build_test_app(pool.clone()),
            "/api/v1/timestamps",
            serde_json::json!({ "title": "Crowd moves north", "event_timestamp": "2026-06-01T22:00:00Z" }),
            &token,
        )
        .await,
    )
    .await;

    let response = get_auth(
        common::build_test_app(pool.clone()),
        "/api/v1/timestamps?search=north",
        &token,
    )
    .await;
    assert_eq!(body_json(response).await["meta"]["total"], 1);

    let response = patch_json_auth(
        common::build_test_app(pool.clone()),
        &format!("/api/v1/timestamps/{}", marker["id"]),
        serde_json::json!({ "title": "" }),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let response = delete_auth(
        common::build_test_app(pool),
        &format!("/api/v1/timestamps/{}", marker["id"]),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::NO_CONTENT);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn test_location_dedup(pool: PgPool) {
    let (_, token) = user_with_token(&pool, "editor@example.com", Role::Editor).await;
    let body = serde_json::json!({ "city": "minneapolis", "state_province": "mn" });

    let first = created(
        post_json_auth(common::build_test_app(pool.clone()), "/api/v1/locations", body.clone(), &token).await,
    )
    .await;
    assert_eq!(first["city"], "Minneapolis");

    let response = post_json_auth(
        common::build_test_app(pool.clone()),
        "/api/v1/locations",
        serde_json::json!({ "city": "  MINNEAPOLIS ", "state_province": "MN" }),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);

    let response = post_json_auth(
        common::build_test_app(pool.clone()),
        "/api/v1/locations/find-or-create",
        body.clone(),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["data"]["id"], first["id"]);

    let response = post_json_auth(
        common::build_test_app(pool.clone()),
        "/api/v1/locations/validate",
        body,
        &token,
    )
    .await;
    let preview = body_json(response).await["data"].clone();
    assert_eq!(preview["existing_id"], first["id"]);
    assert_eq!(preview["display_name"], "Minneapolis, Mn");

    let response = delete_auth(
        common::build_test_app(pool),
        &format!("/api/v1/locations/{}", first["id"]),
        &token,
    )
    .await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}
