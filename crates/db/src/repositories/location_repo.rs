//! Repository for the `locations` table.
//!
//! Callers compute `normalized_name` with
//! `streamsource_core::location::normalize_location` before writing.

use sqlx::PgPool;
use streamsource_core::types::DbId;

use crate::models::location::{CreateLocation, Location, UpdateLocation};

const COLUMNS: &str = "id, city, state_province, region, country, latitude, longitude, \
                       is_known_city, normalized_name, created_at, updated_at";

pub struct LocationRepo;

impl LocationRepo {
    pub async fn create(
        pool: &PgPool,
        input: &CreateLocation,
        normalized_name: &str,
    ) -> Result<Location, sqlx::Error> {
        let query = format!(
            "INSERT INTO locations
                (city, state_province, region, country, latitude, longitude, is_known_city, normalized_name)
             VALUES ($1, $2, $3, $4, $5, $6, COALESCE($7, false), $8)
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Location>(&query)
            .bind(&input.city)
            .bind(&input.state_province)
            .bind(&input.region)
            .bind(&input.country)
            .bind(input.latitude)
            .bind(input.longitude)
            .bind(input.is_known_city)
            .bind(normalized_name)
            .fetch_one(pool)
            .await
    }

    /// Return the location with `normalized_name`, inserting it if absent.
    ///
    /// The no-op `DO UPDATE` makes `RETURNING` yield the existing row on
    /// conflict.
    pub async fn find_or_create(
        pool: &PgPool,
        input: &CreateLocation,
        normalized_name: &str,
    ) -> Result<Location, sqlx::Error> {
        let query = format!(
            "INSERT INTO locations
                (city, state_province, region, country, latitude, longitude, is_known_city, normalized_name)
             VALUES ($1, $2, $3, $4, $5, $6, COALESCE($7, false), $8)
             ON CONFLICT (normalized_name) DO UPDATE SET normalized_name = EXCLUDED.normalized_name
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Location>(&query)
            .bind(&input.city)
            .bind(&input.state_province)
            .bind(&input.region)
            .bind(&input.country)
            .bind(input.latitude)
            .bind(input.longitude)
            .bind(input.is_known_city)
            .bind(normalized_name)
            .fetch_one(pool)
            .await
    }

    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Location>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM locations WHERE id = $1");
        sqlx::query_as::<_, Location>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_by_normalized_name(
        pool: &PgPool,
        normalized_name: &str,
    ) -> Result<Option<Location>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM locations WHERE normalized_name = $1");
        sqlx::query_as::<_, Location>(&query)
            .bind(normalized_name)
            .fetch_optional(pool)
            .await
    }

    /// List locations alphabetically, optionally filtered by a name fragment.
    pub async fn list(
        pool: &PgPool,
        search: Option<&str>,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<Location>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM locations
             WHERE ($1::TEXT IS NULL OR normalized_name ILIKE '%' || $1 || '%')
             ORDER BY normalized_name ASC
             LIMIT $2 OFFSET $3"
        );
        sqlx::query_as::<_, Location>(&query)
            .bind(search)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    pub async fn count(pool: &PgPool, search: Option<&str>) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM locations
             WHERE ($1::TEXT IS NULL OR normalized_name ILIKE '%' || $1 || '%')",
        )
        .bind(search)
        .fetch_one(pool)
        .await
    }

    /// Update a location. `normalized_name` is recomputed by the caller from
    /// the merged name components.
    pub async fn update(
        pool: &PgPool,
        id: DbId,
        input: &UpdateLocation,
        normalized_name: &str,
    ) -> Result<Option<Location>, sqlx::Error> {
        let query = format!(
            "UPDATE locations SET
                city = COALESCE($2, city),
                state_province = COALESCE($3, state_province),
                region = COALESCE($4, region),
                country = COALESCE($5, country),
                latitude = COALESCE($6, latitude),
                longitude = COALESCE($7, longitude),
                is_known_city = COALESCE($8, is_known_city),
                normalized_name = $9
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Location>(&query)
            .bind(id)
            .bind(&input.city)
            .bind(&input.state_province)
            .bind(&input.region)
            .bind(&input.country)
            .bind(input.latitude)
            .bind(input.longitude)
            .bind(input.is_known_city)
            .bind(normalized_name)
            .fetch_optional(pool)
            .await
    }

    pub async fn delete(pool: &PgPool, id: DbId) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM locations WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
