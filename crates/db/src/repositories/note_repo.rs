//! Repository for the polymorphic `notes` table.
//!
//! `notable_type` has no foreign key, so deleting a parent record must also
//! call [`NoteRepo::delete_for`].

use sqlx::PgPool;
use streamsource_core::types::DbId;

use crate::models::note::Note;

const COLUMNS: &str = "id, notable_type, notable_id, content, user_id, created_at, updated_at";

pub struct NoteRepo;

impl NoteRepo {
    pub async fn create(
        pool: &PgPool,
        notable_type: &str,
        notable_id: DbId,
        user_id: DbId,
        content: &str,
    ) -> Result<Note, sqlx::Error> {
        let query = format!(
            "INSERT INTO notes (notable_type, notable_id, content, user_id)
             VALUES ($1, $2, $3, $4)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Note>(&query)
            .bind(notable_type)
            .bind(notable_id)
            .bind(content)
            .bind(user_id)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Note>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM notes WHERE id = $1");
        sqlx::query_as::<_, Note>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Notes attached to one record, newest first.
    pub async fn list_for(
        pool: &PgPool,
        notable_type: &str,
        notable_id: DbId,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Note>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM notes
             WHERE notable_type = $1 AND notable_id = $2
             ORDER BY created_at DESC, id DESC
             LIMIT $3 OFFSET $4"
        );
        sqlx::query_as::<_, Note>(&query)
            .bind(notable_type)
            .bind(notable_id)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    pub async fn count_for(
        pool: &PgPool,
        notable_type: &str,
        notable_id: DbId,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM notes WHERE notable_type = $1 AND notable_id = $2",
        )
        .bind(notable_type)
        .bind(notable_id)
        .fetch_one(pool)
        .await
    }

    pub async fn update(
        pool: &PgPool,
        id: DbId,
        content: &str,
    ) -> Result<Option<Note>, sqlx::Error> {
        let query = format!("UPDATE notes SET content = $2 WHERE id = $1 RETURNING {COLUMNS}");
        sqlx::query_as::<_, Note>(&query)
            .bind(id)
            .bind(content)
            .fetch_optional(pool)
            .await
    }

    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM notes WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete every note attached to a record. Returns the count removed.
    pub async fn delete_for(
        pool: &PgPool,
        notable_type: &str,
        notable_id: DbId,
    ) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM notes WHERE notable_type = $1 AND notable_id = $2")
            .bind(notable_type)
            .bind(notable_id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected())
    }
}
