//! Integration tests for the supporting repositories: users, sessions,
//! locations, annotations, ignore lists, and feature flags.

use assert_matches::assert_matches;
use chrono::{Duration, Utc};
use sqlx::PgPool;
use streamsource_core::feature_flags::is_enabled_for;
use streamsource_core::location::normalize_location;
use streamsource_core::roles::Role;
use streamsource_db::models::annotation::{CreateAnnotation, LinkAnnotationStream};
use streamsource_db::models::feature_flag::UpsertFeatureFlag;
use streamsource_db::models::location::CreateLocation;
use streamsource_db::models::session::{NewRefreshSession, RevokeReason};
use streamsource_db::models::stream::CreateStream;
use streamsource_db::models::user::CreateUser;
use streamsource_db::repositories::{
    AnnotationRepo, FeatureFlagRepo, IgnoreListRepo, LocationRepo, NoteRepo, SessionRepo,
    StreamRepo, UserRepo,
};

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn seed_user(pool: &PgPool, email: &str) -> i64 {
    UserRepo::create(
        pool,
        &CreateUser {
            email: email.to_string(),
            password_hash: "hash".to_string(),
            role: "editor".to_string(),
        },
    )
    .await
    .unwrap()
    .id
}

fn location(city: &str, state: Option<&str>) -> CreateLocation {
    CreateLocation {
        city: city.to_string(),
        state_province: state.map(str::to_string),
        region: None,
        country: None,
        latitude: None,
        longitude: None,
        is_known_city: None,
    }
}

// ---------------------------------------------------------------------------
// Users and sessions
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn duplicate_email_is_a_unique_violation(pool: PgPool) {
    seed_user(&pool, "dup@example.com").await;
    let err = UserRepo::create(
        &pool,
        &CreateUser {
            email: "dup@example.com".into(),
            password_hash: "hash".into(),
            role: "default".into(),
        },
    )
    .await
    .unwrap_err();
    assert_matches!(err, sqlx::Error::Database(db) if db.constraint() == Some("uq_users_email"));
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn failed_logins_accumulate_and_reset(pool: PgPool) {
    let id = seed_user(&pool, "lock@example.com").await;
    assert_eq!(UserRepo::increment_failed_login(&pool, id).await.unwrap(), 1);
    assert_eq!(UserRepo::increment_failed_login(&pool, id).await.unwrap(), 2);
    UserRepo::lock_account(&pool, id, Utc::now() + Duration::minutes(15))
        .await
        .unwrap();

    UserRepo::record_successful_login(&pool, id).await.unwrap();
    let user = UserRepo::find_by_id(&pool, id).await.unwrap().unwrap();
    assert_eq!(user.failed_login_count, 0);
    assert!(user.locked_until.is_none());
    assert!(user.last_login_at.is_some());
}

fn new_session(user_id: i64, fingerprint: &str) -> NewRefreshSession {
    NewRefreshSession {
        user_id,
        token_fingerprint: fingerprint.into(),
        issued_role: "editor".into(),
        user_agent: Some("tests".into()),
        expires_at: Utc::now() + Duration::days(7),
    }
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn refresh_token_rotates_once(pool: PgPool) {
    let user_id = seed_user(&pool, "s@example.com").await;
    let opened = SessionRepo::open(&pool, &new_session(user_id, "abc")).await.unwrap();
    assert_eq!(opened.issued_role, "editor");
    assert!(opened.revoked_at.is_none());

    let rotated = SessionRepo::rotate(&pool, "abc").await.unwrap().unwrap();
    assert_eq!(rotated.id, opened.id);
    assert_eq!(rotated.revoke_reason.as_deref(), Some("rotated"));

    // A used token cannot be replayed.
    assert!(SessionRepo::rotate(&pool, "abc").await.unwrap().is_none());
    assert!(SessionRepo::rotate(&pool, "unknown").await.unwrap().is_none());

    // Freshly revoked rows are kept for a while.
    assert_eq!(SessionRepo::cleanup_expired(&pool).await.unwrap(), 0);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn revoke_all_records_reason_and_skips_revoked(pool: PgPool) {
    let user_id = seed_user(&pool, "s@example.com").await;
    SessionRepo::open(&pool, &new_session(user_id, "one")).await.unwrap();
    SessionRepo::open(&pool, &new_session(user_id, "two")).await.unwrap();
    SessionRepo::rotate(&pool, "two").await.unwrap();

    let revoked = SessionRepo::revoke_all_for_user(&pool, user_id, RevokeReason::RoleChanged)
        .await
        .unwrap();
    assert_eq!(revoked, 1);

    let reasons: Vec<String> = sqlx::query_scalar(
        "SELECT revoke_reason FROM refresh_sessions WHERE user_id = $1 ORDER BY token_fingerprint",
    )
    .bind(user_id)
    .fetch_all(&pool)
    .await
    .unwrap();
    assert_eq!(reasons, vec!["role_changed", "rotated"]);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn cleanup_removes_expired_and_old_revoked_sessions(pool: PgPool) {
    let user_id = seed_user(&pool, "s@example.com").await;
    let expired = NewRefreshSession {
        expires_at: Utc::now() - Duration::hours(1),
        ..new_session(user_id, "expired")
    };
    SessionRepo::open(&pool, &expired).await.unwrap();
    SessionRepo::open(&pool, &new_session(user_id, "old")).await.unwrap();
    SessionRepo::open(&pool, &new_session(user_id, "live")).await.unwrap();
    sqlx::query(
        "UPDATE refresh_sessions SET revoked_at = NOW() - INTERVAL '2 days', revoke_reason = 'logout'
         WHERE token_fingerprint = 'old'",
    )
    .execute(&pool)
    .await
    .unwrap();

    assert_eq!(SessionRepo::cleanup_expired(&pool).await.unwrap(), 2);
    assert!(SessionRepo::rotate(&pool, "live").await.unwrap().is_some());
}

// ---------------------------------------------------------------------------
// Locations
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn find_or_create_reuses_normalized_name(pool: PgPool) {
    let a = location("Portland", Some("OR"));
    let b = location("  portland ", Some("or"));
    let key_a = normalize_location(&a.city, a.state_province.as_deref(), None);
    let key_b = normalize_location(&b.city, b.state_province.as_deref(), None);
    assert_eq!(key_a, key_b);

    let first = LocationRepo::find_or_create(&pool, &a, &key_a).await.unwrap();
    let second = LocationRepo::find_or_create(&pool, &b, &key_b).await.unwrap();
    assert_eq!(first.id, second.id);
    assert_eq!(second.city, "Portland");
    assert_eq!(LocationRepo::count(&pool, None).await.unwrap(), 1);
}

// ---------------------------------------------------------------------------
// Annotations
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn annotation_stream_links_are_unique(pool: PgPool) {
    let user_id = seed_user(&pool, "a@example.com").await;
    let stream = StreamRepo::create(
        &pool,
        user_id,
        &CreateStream {
            link: "https://twitch.tv/a".into(),
            source: Some("a".into()),
            title: None,
            platform: None,
            status: None,
            orientation: None,
            kind: None,
            city: None,
            state: None,
            location_id: None,
            notes: None,
            posted_by: None,
            streamer_id: None,
            is_pinned: None,
        },
    )
    .await
    .unwrap();
    let annotation = AnnotationRepo::create(
        &pool,
        user_id,
        &CreateAnnotation {
            title: "Dispersal order".into(),
            description: None,
            event_type: Some("dispersal_order".into()),
            priority_level: None,
            event_timestamp: Utc::now(),
            location: None,
            latitude: None,
            longitude: None,
            tags: Some(vec!["downtown".into()]),
        },
    )
    .await
    .unwrap();
    assert_eq!(annotation.priority_level, "medium");
    assert_eq!(annotation.review_status, "pending");

    let link = LinkAnnotationStream {
        stream_id: stream.id,
        stream_timestamp_seconds: Some(90),
        relevance_score: None,
        stream_notes: None,
    };
    let row = AnnotationRepo::link_stream(&pool, annotation.id, user_id, &link)
        .await
        .unwrap();
    assert_eq!(row.relevance_score, 3);

    let err = AnnotationRepo::link_stream(&pool, annotation.id, user_id, &link)
        .await
        .unwrap_err();
    assert_matches!(err, sqlx::Error::Database(db)
        if db.constraint() == Some("uq_annotation_streams_annotation_stream"));

    assert!(AnnotationRepo::unlink_stream(&pool, annotation.id, stream.id).await.unwrap());
    assert!(AnnotationRepo::list_streams(&pool, annotation.id).await.unwrap().is_empty());
}

// ---------------------------------------------------------------------------
// Notes
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn notes_are_scoped_to_their_record(pool: PgPool) {
    let user_id = seed_user(&pool, "n@example.com").await;
    NoteRepo::create(&pool, "stream", 1, user_id, "first").await.unwrap();
    NoteRepo::create(&pool, "stream", 1, user_id, "second").await.unwrap();
    NoteRepo::create(&pool, "streamer", 1, user_id, "other").await.unwrap();

    let notes = NoteRepo::list_for(&pool, "stream", 1, 25, 0).await.unwrap();
    assert_eq!(notes.len(), 2);
    assert_eq!(notes[0].content, "second");
    assert_eq!(NoteRepo::delete_for(&pool, "stream", 1).await.unwrap(), 2);
    assert_eq!(NoteRepo::count_for(&pool, "streamer", 1).await.unwrap(), 1);
}

// ---------------------------------------------------------------------------
// Ignore lists
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn bulk_insert_skips_existing_values(pool: PgPool) {
    IgnoreListRepo::create(&pool, "domain", "spam.example", None)
        .await
        .unwrap();
    let values = vec!["spam.example".to_string(), "junk.example".to_string()];
    let inserted = IgnoreListRepo::bulk_insert(&pool, "domain", &values, Some("import"))
        .await
        .unwrap();
    assert_eq!(inserted.len(), 1);
    assert_eq!(inserted[0].value, "junk.example");
    assert_eq!(inserted[0].notes.as_deref(), Some("import"));

    let domains = IgnoreListRepo::list_by_type(&pool, &["domain"]).await.unwrap();
    assert_eq!(domains.len(), 2);
    assert!(IgnoreListRepo::list_by_type(&pool, &["url"]).await.unwrap().is_empty());
}

// ---------------------------------------------------------------------------
// Feature flags
// ---------------------------------------------------------------------------

#[sqlx::test(migrations = "../../db/migrations")]
async fn seeded_flags_exist(pool: PgPool) {
    let flag = FeatureFlagRepo::find_by_name(&pool, "maintenance_mode")
        .await
        .unwrap()
        .unwrap();
    assert!(!flag.enabled);
}

#[sqlx::test(migrations = "../../db/migrations")]
async fn gate_edits_are_idempotent(pool: PgPool) {
    FeatureFlagRepo::upsert(
        &pool,
        &UpsertFeatureFlag {
            name: "beta_grid".into(),
            description: Some("New grid".into()),
            enabled: None,
        },
    )
    .await
    .unwrap();

    FeatureFlagRepo::add_actor(&pool, "beta_grid", 7).await.unwrap();
    let flag = FeatureFlagRepo::add_actor(&pool, "beta_grid", 7)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(flag.actor_ids, vec![7]);
    assert!(is_enabled_for(&flag.name, &flag.gates(), Some((7, Role::Default))));

    let flag = FeatureFlagRepo::add_group(&pool, "beta_grid", "editor")
        .await
        .unwrap()
        .unwrap();
    assert!(is_enabled_for(&flag.name, &flag.gates(), Some((8, Role::Editor))));

    let flag = FeatureFlagRepo::remove_actor(&pool, "beta_grid", 7)
        .await
        .unwrap()
        .unwrap();
    assert!(flag.actor_ids.is_empty());
    assert!(FeatureFlagRepo::set_percentage(&pool, "missing", 10)
        .await
        .unwrap()
        .is_none());
}
