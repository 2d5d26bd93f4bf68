use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get},
    Json, Router,
};
use time::OffsetDateTime;
use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use crate::{
    auth::AuthUser,
    diary::{
        dto::{CreateEntryRequest, DiaryEntryResponse, Pagination},
        repo_types::DiaryEntry,
    },
    state::AppState,
};

type ApiError = (StatusCode, String);

pub fn diary_routes() -> Router<AppState> {
    Router::new()
        .route("/diary", get(list_entries).post(create_entry))
        .route("/diary/:id", delete(delete_entry))
}

fn internal(e: anyhow::Error) -> ApiError {
    error!(error = %e, "diary query failed");
    (StatusCode::INTERNAL_SERVER_ERROR, e.to_string())
}

#[instrument(skip(state, payload))]
pub async fn create_entry(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<CreateEntryRequest>,
) -> Result<(StatusCode, Json<DiaryEntryResponse>), ApiError> {
    if payload.food.name.trim().is_empty() {
        warn!(%user_id, "diary entry without food name");
        return Err((StatusCode::BAD_REQUEST, "Food name is required".into()));
    }

    let date = payload.date.unwrap_or_else(OffsetDateTime::now_utc);
    let entry = DiaryEntry::insert(&state.db, user_id, &payload.food, payload.meal_type, date)
        .await
        .map_err(internal)?;

    info!(%user_id, entry_id = %entry.id, meal_type = payload.meal_type.as_str(), "diary entry saved");
    Ok((StatusCode::CREATED, Json(entry.into())))
}

#[instrument(skip(state))]
pub async fn list_entries(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Query(p): Query<Pagination>,
) -> Result<Json<Vec<DiaryEntryResponse>>, ApiError> {
    let (limit, offset) = p.clamped();
    let rows = DiaryEntry::list_by_user(&state.db, user_id, limit, offset)
        .await
        .map_err(internal)?;
    Ok(Json(rows.into_iter().map(Into::into).collect()))
}

#[instrument(skip(state))]
pub async fn delete_entry(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    if DiaryEntry::delete(&state.db, user_id, id)
        .await
        .map_err(internal)?
    {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err((StatusCode::NOT_FOUND, "Diary entry not found".into()))
    }
}
