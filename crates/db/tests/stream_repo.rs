//! Integration tests for the stream repository.
//!
//! - Create applies column defaults
//! - List filtering, search, pinned-first ordering, and archived hiding
//! - Status lifecycle timestamps
//! - Stale-stream archival

use chrono::{Duration, Utc};
use sqlx::PgPool;
use streamsource_core::stream::{apply_status_change, StreamStatus};
use streamsource_db::models::stream::{CreateStream, StreamFilter, UpdateStream};
use streamsource_db::models::user::CreateUser;
use streamsource_db::repositories::{StreamRepo, UserRepo};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn seed_user(pool: &PgPool, email: &str) -> i64 {
    UserRepo::create(
        pool,
        &CreateUser {
            email: email.to_string(),
            password_hash: "not-a-real-hash".to_string(),
            role: "editor".to_string(),
        },
    )
    .await
    .unwrap()
    .id
}

fn new_stream(link: &str, source: &str) -> CreateStream {
    CreateStream {
        link: link.to_string(),
        source: Some(source.to_string()),
        title: None,
        platform: Some("twitch".to_string()),
        status: None,
        orientation: None,
        kind: None,
        city: Some("Portland".to_string()),
        state: Some("OR".to_string()),
        location_id: None,
        notes: None,
        posted_by: None,
        streamer_id: None,
        is_pinned: None,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn create_applies_defaults(pool: PgPool) {
    let user_id = seed_user(&pool, "owner@example.com").await;
    let stream = StreamRepo::create(&pool, user_id, &new_stream("https://twitch.tv/a", "a"))
        .await
        .unwrap();

    assert_eq!(stream.status, "unknown");
    assert_eq!(stream.kind, "video");
    assert!(!stream.is_pinned);
    assert!(!stream.is_archived);
    assert_eq!(stream.user_id, user_id);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn list_filters_and_counts(pool: PgPool) {
    let user_id = seed_user(&pool, "owner@example.com").await;
    let a = StreamRepo::create(&pool, user_id, &new_stream("https://twitch.tv/alpha", "Alpha"))
        .await
        .unwrap();
    StreamRepo::create(&pool, user_id, &new_stream("https://twitch.tv/beta", "Beta"))
        .await
        .unwrap();
    let stamps = apply_status_change(StreamStatus::Unknown, StreamStatus::Live, false, Utc::now());
    StreamRepo::set_status(&pool, a.id, "live", &stamps).await.unwrap();

    let live = StreamFilter {
        status: Some("live".into()),
        ..Default::default()
    };
    let rows = StreamRepo::list(&pool, &live).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].id, a.id);
    assert_eq!(StreamRepo::count(&pool, &live).await.unwrap(), 1);

    let search = StreamFilter {
        search: Some("bet".into()),
        ..Default::default()
    };
    let rows = StreamRepo::list(&pool, &search).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].source, "Beta");
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn pinned_streams_sort_first_and_archived_are_hidden(pool: PgPool) {
    let user_id = seed_user(&pool, "owner@example.com").await;
    let old = StreamRepo::create(&pool, user_id, &new_stream("https://twitch.tv/old", "old"))
        .await
        .unwrap();
    let newer = StreamRepo::create(&pool, user_id, &new_stream("https://twitch.tv/new", "new"))
        .await
        .unwrap();
    let gone = StreamRepo::create(&pool, user_id, &new_stream("https://twitch.tv/gone", "gone"))
        .await
        .unwrap();

    StreamRepo::set_pinned(&pool, old.id, true).await.unwrap();
    let archived = StreamRepo::archive(&pool, gone.id).await.unwrap().unwrap();
    assert!(archived.is_archived);
    assert!(archived.ended_at.is_some());

    let rows = StreamRepo::list(&pool, &StreamFilter::default()).await.unwrap();
    let ids: Vec<i64> = rows.iter().map(|s| s.id).collect();
    assert_eq!(ids, vec![old.id, newer.id]);

    let only_archived = StreamFilter {
        is_archived: Some(true),
        ..Default::default()
    };
    let rows = StreamRepo::list(&pool, &only_archived).await.unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].id, gone.id);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn status_lifecycle_stamps_timestamps(pool: PgPool) {
    let user_id = seed_user(&pool, "owner@example.com").await;
    let s = StreamRepo::create(&pool, user_id, &new_stream("https://twitch.tv/x", "x"))
        .await
        .unwrap();

    let now = Utc::now();
    let live = apply_status_change(StreamStatus::Unknown, StreamStatus::Live, false, now);
    let s = StreamRepo::set_status(&pool, s.id, "live", &live).await.unwrap().unwrap();
    assert_eq!(s.status, "live");
    assert!(s.started_at.is_some());
    assert!(s.last_live_at.is_some());
    assert!(s.ended_at.is_none());

    let off = apply_status_change(StreamStatus::Live, StreamStatus::Offline, true, now);
    let s = StreamRepo::set_status(&pool, s.id, "offline", &off).await.unwrap().unwrap();
    assert_eq!(s.status, "offline");
    assert!(s.ended_at.is_some());
    assert!(s.started_at.is_some());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn going_live_again_clears_previous_end(pool: PgPool) {
    let user_id = seed_user(&pool, "owner@example.com").await;
    let s = StreamRepo::create(&pool, user_id, &new_stream("https://twitch.tv/x", "x"))
        .await
        .unwrap();

    let t0 = Utc::now() - Duration::minutes(30);
    let t1 = t0 + Duration::minutes(10);
    let t2 = t1 + Duration::minutes(10);

    let live = apply_status_change(StreamStatus::Unknown, StreamStatus::Live, false, t0);
    StreamRepo::set_status(&pool, s.id, "live", &live).await.unwrap();
    let off = apply_status_change(StreamStatus::Live, StreamStatus::Offline, true, t1);
    let s = StreamRepo::set_status(&pool, s.id, "offline", &off).await.unwrap().unwrap();
    assert!(s.ended_at.is_some());

    let again = apply_status_change(StreamStatus::Offline, StreamStatus::Live, true, t2);
    let s = StreamRepo::set_status(&pool, s.id, "live", &again).await.unwrap().unwrap();
    assert!(s.ended_at.is_none());
    assert_eq!(s.started_at.map(|t| t.timestamp()), Some(t0.timestamp()));

    let archived = StreamRepo::archive(&pool, s.id).await.unwrap().unwrap();
    let ended = archived.ended_at.expect("archive stamps ended_at");
    assert!(ended >= archived.last_live_at.unwrap());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn archive_keeps_end_of_latest_session(pool: PgPool) {
    let user_id = seed_user(&pool, "owner@example.com").await;
    let s = StreamRepo::create(&pool, user_id, &new_stream("https://twitch.tv/x", "x"))
        .await
        .unwrap();

    let t0 = Utc::now() - Duration::hours(2);
    let t1 = t0 + Duration::minutes(45);
    let live = apply_status_change(StreamStatus::Unknown, StreamStatus::Live, false, t0);
    StreamRepo::set_status(&pool, s.id, "live", &live).await.unwrap();
    let off = apply_status_change(StreamStatus::Live, StreamStatus::Offline, true, t1);
    let s = StreamRepo::set_status(&pool, s.id, "offline", &off).await.unwrap().unwrap();

    let archived = StreamRepo::archive(&pool, s.id).await.unwrap().unwrap();
    assert_eq!(archived.ended_at, s.ended_at);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn archive_stale_stamps_end_after_last_live(pool: PgPool) {
    let user_id = seed_user(&pool, "owner@example.com").await;
    let s = StreamRepo::create(&pool, user_id, &new_stream("https://twitch.tv/x", "x"))
        .await
        .unwrap();

    let t0 = Utc::now() - Duration::days(3);
    let t1 = t0 + Duration::hours(1);
    let t2 = t1 + Duration::hours(1);
    let live = apply_status_change(StreamStatus::Unknown, StreamStatus::Live, false, t0);
    StreamRepo::set_status(&pool, s.id, "live", &live).await.unwrap();
    let off = apply_status_change(StreamStatus::Live, StreamStatus::Offline, true, t1);
    StreamRepo::set_status(&pool, s.id, "offline", &off).await.unwrap();
    let again = apply_status_change(StreamStatus::Offline, StreamStatus::Live, true, t2);
    StreamRepo::set_status(&pool, s.id, "live", &again).await.unwrap();

    let ids = StreamRepo::archive_stale(&pool, Utc::now() - Duration::days(1))
        .await
        .unwrap();
    assert_eq!(ids, vec![s.id]);

    let stored = StreamRepo::find_by_id(&pool, s.id).await.unwrap().unwrap();
    assert!(stored.is_archived);
    assert!(stored.ended_at.unwrap() >= stored.last_live_at.unwrap());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn update_leaves_omitted_fields(pool: PgPool) {
    let user_id = seed_user(&pool, "owner@example.com").await;
    let s = StreamRepo::create(&pool, user_id, &new_stream("https://twitch.tv/x", "x"))
        .await
        .unwrap();
    let input = UpdateStream {
        title: Some("Downtown march".into()),
        ..Default::default()
    };
    let updated = StreamRepo::update(&pool, s.id, &input).await.unwrap().unwrap();
    assert_eq!(updated.title.as_deref(), Some("Downtown march"));
    assert_eq!(updated.city.as_deref(), Some("Portland"));
    assert!(StreamRepo::update(&pool, 999_999, &input).await.unwrap().is_none());
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn archive_stale_skips_pinned_and_recent(pool: PgPool) {
    let user_id = seed_user(&pool, "owner@example.com").await;
    let stale = StreamRepo::create(&pool, user_id, &new_stream("https://twitch.tv/s", "s"))
        .await
        .unwrap();
    let pinned = StreamRepo::create(&pool, user_id, &new_stream("https://twitch.tv/p", "p"))
        .await
        .unwrap();
    let fresh = StreamRepo::create(&pool, user_id, &new_stream("https://twitch.tv/f", "f"))
        .await
        .unwrap();
    StreamRepo::set_pinned(&pool, pinned.id, true).await.unwrap();

    sqlx::query("UPDATE streams SET last_checked_at = NOW() - INTERVAL '2 days' WHERE id = ANY($1)")
        .bind(vec![stale.id, pinned.id])
        .execute(&pool)
        .await
        .unwrap();

    let archived = StreamRepo::archive_stale(&pool, Utc::now() - Duration::hours(24))
        .await
        .unwrap();
    assert_eq!(archived, vec![stale.id]);

    let fresh = StreamRepo::find_by_id(&pool, fresh.id).await.unwrap().unwrap();
    assert!(!fresh.is_archived);
}
