//! Handlers for `/locations`.
//!
//! Locations are deduplicated on their normalized name. `find-or-create`
//! returns the existing row for an equivalent name; `validate` previews the
//! normalization without writing.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;
use streamsource_core::location::{
    display_case, normalize_location, validate_coordinates, validate_names,
};
use streamsource_core::policy::{authorize, Action, Resource};
use streamsource_core::types::DbId;
use streamsource_db::models::location::{CreateLocation, Location, UpdateLocation};
use streamsource_db::repositories::LocationRepo;
use streamsource_db::DbPool;
use streamsource_events::EntityEvent;

use super::publish;
use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::RequireEditor;
use crate::query::SearchParams;
use crate::response::{DataResponse, ListResponse};
use crate::state::AppState;

const ENTITY: &str = "location";

/// Result of `POST /locations/validate`.
#[derive(Debug, Serialize)]
pub struct LocationPreview {
    pub city: String,
    pub state_province: Option<String>,
    pub country: Option<String>,
    pub normalized_name: String,
    pub display_name: String,
    /// Id of the stored location with the same normalized name, if any.
    pub existing_id: Option<DbId>,
}

fn clean_optional(value: Option<&str>) -> Option<String> {
    value
        .map(display_case)
        .filter(|v| !v.is_empty())
}

/// Validate a create body and put its name components in display form.
/// Returns the normalized name.
fn prepare(input: &mut CreateLocation) -> AppResult<String> {
    validate_names(
        &input.city,
        input.state_province.as_deref(),
        input.country.as_deref(),
    )
    .map_err(AppError::validation)?;
    validate_coordinates(input.latitude, input.longitude).map_err(AppError::validation)?;

    input.city = display_case(&input.city);
    input.state_province = clean_optional(input.state_province.as_deref());
    input.region = clean_optional(input.region.as_deref());
    input.country = clean_optional(input.country.as_deref());
    Ok(normalize_location(
        &input.city,
        input.state_province.as_deref(),
        input.country.as_deref(),
    ))
}

async fn find_location(pool: &DbPool, id: DbId) -> AppResult<Location> {
    LocationRepo::find_by_id(pool, id)
        .await?
        .ok_or_else(|| AppError::not_found(ENTITY, id))
}

/// GET /api/v1/locations
pub async fn list(
    State(state): State<AppState>,
    _user: AuthUser,
    Query(params): Query<SearchParams>,
) -> AppResult<Json<ListResponse<Location>>> {
    let (limit, offset) = params.window();
    let search = params.term().map(str::to_lowercase);
    let locations = LocationRepo::list(&state.pool, search.as_deref(), limit, offset).await?;
    let total = LocationRepo::count(&state.pool, search.as_deref()).await?;
    Ok(Json(ListResponse::new(locations, limit, offset, total)))
}

/// GET /api/v1/locations/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    _user: AuthUser,
    Path(id): Path<DbId>,
) -> AppResult<Json<DataResponse<Location>>> {
    let location = find_location(&state.pool, id).await?;
    Ok(Json(DataResponse { data: location }))
}

/// POST /api/v1/locations
///
/// An equivalent existing name is a 409.
pub async fn create(
    State(state): State<AppState>,
    RequireEditor(user): RequireEditor,
    Json(mut input): Json<CreateLocation>,
) -> AppResult<(StatusCode, Json<DataResponse<Location>>)> {
    authorize(&user.actor(), Resource::Location, Action::Create, None)?;
    let normalized = prepare(&mut input)?;

    let location = LocationRepo::create(&state.pool, &input, &normalized).await?;

    tracing::info!(user_id = user.user_id, location_id = location.id, name = %location.normalized_name, "Location created");
    publish(
        &state,
        EntityEvent::created(ENTITY, location.id)
            .with_actor(user.user_id)
            .with_record(&location),
    );
    Ok((StatusCode::CREATED, Json(DataResponse { data: location })))
}

/// POST /api/v1/locations/find-or-create
///
/// Returns 201 when a row was inserted, 200 when an equivalent one existed.
pub async fn find_or_create(
    State(state): State<AppState>,
    RequireEditor(user): RequireEditor,
    Json(mut input): Json<CreateLocation>,
) -> AppResult<(StatusCode, Json<DataResponse<Location>>)> {
    authorize(&user.actor(), Resource::Location, Action::Create, None)?;
    let normalized = prepare(&mut input)?;

    if let Some(existing) = LocationRepo::find_by_normalized_name(&state.pool, &normalized).await? {
        return Ok((StatusCode::OK, Json(DataResponse { data: existing })));
    }

    let location = LocationRepo::find_or_create(&state.pool, &input, &normalized).await?;

    tracing::info!(user_id = user.user_id, location_id = location.id, name = %location.normalized_name, "Location resolved");
    publish(
        &state,
        EntityEvent::created(ENTITY, location.id)
            .with_actor(user.user_id)
            .with_record(&location),
    );
    Ok((StatusCode::CREATED, Json(DataResponse { data: location })))
}

/// POST /api/v1/locations/validate
pub async fn validate(
    State(state): State<AppState>,
    _user: AuthUser,
    Json(mut input): Json<CreateLocation>,
) -> AppResult<Json<DataResponse<LocationPreview>>> {
    let normalized = prepare(&mut input)?;
    let existing = LocationRepo::find_by_normalized_name(&state.pool, &normalized).await?;

    let display_name = [
        Some(input.city.as_str()),
        input.state_province.as_deref(),
        input.country.as_deref(),
    ]
    .into_iter()
    .flatten()
    .collect::<Vec<_>>()
    .join(", ");

    Ok(Json(DataResponse {
        data: LocationPreview {
            city: input.city,
            state_province: input.state_province,
            country: input.country,
            normalized_name: normalized,
            display_name,
            existing_id: existing.map(|l| l.id),
        },
    }))
}

/// PATCH /api/v1/locations/{id}
///
/// The normalized name is recomputed from the merged name components.
pub async fn update(
    State(state): State<AppState>,
    RequireEditor(user): RequireEditor,
    Path(id): Path<DbId>,
    Json(mut input): Json<UpdateLocation>,
) -> AppResult<Json<DataResponse<Location>>> {
    authorize(&user.actor(), Resource::Location, Action::Update, None)?;
    let location = find_location(&state.pool, id).await?;

    let city = input.city.as_deref().unwrap_or(&location.city);
    let state_province = input
        .state_province
        .as_deref()
        .or(location.state_province.as_deref());
    let country = input.country.as_deref().or(location.country.as_deref());
    validate_names(city, state_province, country).map_err(AppError::validation)?;
    validate_coordinates(
        input.latitude.or(location.latitude),
        input.longitude.or(location.longitude),
    )
    .map_err(AppError::validation)?;
    let normalized = normalize_location(city, state_province, country);

    input.city = input.city.as_deref().map(display_case);
    input.state_province = clean_optional(input.state_province.as_deref());
    input.region = clean_optional(input.region.as_deref());
    input.country = clean_optional(input.country.as_deref());

    let updated = LocationRepo::update(&state.pool, id, &input, &normalized)
        .await?
        .ok_or_else(|| AppError::not_found(ENTITY, id))?;

    tracing::info!(user_id = user.user_id, location_id = id, "Location updated");
    publish(
        &state,
        EntityEvent::updated(ENTITY, id)
            .with_actor(user.user_id)
            .with_record(&updated),
    );
    Ok(Json(DataResponse { data: updated }))
}

/// DELETE /api/v1/locations/{id}
///
/// Streams and streamers referencing the location keep their rows.
pub async fn delete(
    State(state): State<AppState>,
    RequireEditor(user): RequireEditor,
    Path(id): Path<DbId>,
) -> AppResult<StatusCode> {
    authorize(&user.actor(), Resource::Location, Action::Destroy, None)?;
    if !LocationRepo::delete(&state.pool, id).await? {
        return Err(AppError::not_found(ENTITY, id));
    }

    tracing::info!(user_id = user.user_id, location_id = id, "Location deleted");
    publish(&state, EntityEvent::deleted(ENTITY, id).with_actor(user.user_id));
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn body(city: &str, state: Option<&str>) -> CreateLocation {
        CreateLocation {
            city: city.to_string(),
            state_province: state.map(str::to_string),
            region: None,
            country: Some("  ".to_string()),
            latitude: None,
            longitude: None,
            is_known_city: None,
        }
    }

    #[test]
    fn prepare_display_cases_and_drops_blank_components() {
        let mut input = body("  saint   paul ", Some("MN"));
        let normalized = prepare(&mut input).unwrap();
        assert_eq!(input.city, "Saint Paul");
        assert_eq!(input.state_province.as_deref(), Some("MN"));
        assert_eq!(input.country, None);
        assert_eq!(normalized, "saint paul, mn");
    }

    #[test]
    fn prepare_rejects_half_coordinates() {
        let mut input = body("Portland", None);
        input.latitude = Some(45.0);
        assert!(prepare(&mut input).is_err());
    }
}
