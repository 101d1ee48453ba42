//! Repository for the `ignore_lists` table.
//!
//! Values are normalized by `streamsource_core::ignore_list::normalize_value`
//! before they reach this layer.

use sqlx::PgPool;
use streamsource_core::types::DbId;

use crate::models::ignore_list::{IgnoreListEntry, IgnoreListFilter};

const COLUMNS: &str = "id, list_type, value, notes, created_at, updated_at";

const FILTER_CLAUSE: &str = "
    ($1::TEXT IS NULL OR list_type = $1)
    AND ($2::TEXT IS NULL OR value ILIKE '%' || $2 || '%' OR notes ILIKE '%' || $2 || '%')";

pub struct IgnoreListRepo;

impl IgnoreListRepo {
    pub async fn create(
        pool: &PgPool,
        list_type: &str,
        value: &str,
        notes: Option<&str>,
    ) -> Result<IgnoreListEntry, sqlx::Error> {
        let query = format!(
            "INSERT INTO ignore_lists (list_type, value, notes)
             VALUES ($1, $2, $3)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, IgnoreListEntry>(&query)
            .bind(list_type)
            .bind(value)
            .bind(notes)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<IgnoreListEntry>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM ignore_lists WHERE id = $1");
        sqlx::query_as::<_, IgnoreListEntry>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn list(
        pool: &PgPool,
        filter: &IgnoreListFilter,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<IgnoreListEntry>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM ignore_lists
             WHERE {FILTER_CLAUSE}
             ORDER BY list_type ASC, value ASC
             LIMIT $3 OFFSET $4"
        );
        sqlx::query_as::<_, IgnoreListEntry>(&query)
            .bind(&filter.list_type)
            .bind(&filter.search)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    pub async fn count(pool: &PgPool, filter: &IgnoreListFilter) -> Result<i64, sqlx::Error> {
        let query = format!("SELECT COUNT(*) FROM ignore_lists WHERE {FILTER_CLAUSE}");
        sqlx::query_scalar::<_, i64>(&query)
            .bind(&filter.list_type)
            .bind(&filter.search)
            .fetch_one(pool)
            .await
    }

    /// Every entry of the given types, unpaginated. Used for matching links
    /// and usernames.
    pub async fn list_by_type(
        pool: &PgPool,
        list_types: &[&str],
    ) -> Result<Vec<IgnoreListEntry>, sqlx::Error> {
        let types: Vec<String> = list_types.iter().map(|t| t.to_string()).collect();
        let query = format!(
            "SELECT {COLUMNS} FROM ignore_lists
             WHERE list_type = ANY($1)
             ORDER BY id ASC"
        );
        sqlx::query_as::<_, IgnoreListEntry>(&query)
            .bind(&types)
            .fetch_all(pool)
            .await
    }

    pub async fn update(
        pool: &PgPool,
        id: DbId,
        value: Option<&str>,
        notes: Option<&str>,
    ) -> Result<Option<IgnoreListEntry>, sqlx::Error> {
        let query = format!(
            "UPDATE ignore_lists SET
                value = COALESCE($2, value),
                notes = COALESCE($3, notes)
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, IgnoreListEntry>(&query)
            .bind(id)
            .bind(value)
            .bind(notes)
            .fetch_optional(pool)
            .await
    }

    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM ignore_lists WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Insert many values of one type, skipping ones already listed.
    /// Returns the rows actually inserted.
    pub async fn bulk_insert(
        pool: &PgPool,
        list_type: &str,
        values: &[String],
        notes: Option<&str>,
    ) -> Result<Vec<IgnoreListEntry>, sqlx::Error> {
        let query = format!(
            "INSERT INTO ignore_lists (list_type, value, notes)
             SELECT $1, v, $3 FROM UNNEST($2::TEXT[]) AS v
             ON CONFLICT (list_type, value) DO NOTHING
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, IgnoreListEntry>(&query)
            .bind(list_type)
            .bind(values)
            .bind(notes)
            .fetch_all(pool)
            .await
    }
}
