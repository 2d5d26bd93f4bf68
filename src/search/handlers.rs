use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument, warn};

use crate::{
    auth::AuthUser,
    food::{insights::generate_insights, FoodQuery, ImagePayload, SearchError},
    search::dto::{
        HistoryResponse, InsightsRequest, InsightsResponse, SearchRequest, SearchResponse,
    },
    state::AppState,
};

/// Upload cap for food photos.
pub const IMAGE_BODY_LIMIT: usize = 20 * 1024 * 1024;

type ApiError = (StatusCode, String);

pub fn search_routes() -> Router<AppState> {
    Router::new()
        .route("/search", post(search_text))
        .route(
            "/search/image",
            post(search_image).layer(DefaultBodyLimit::max(IMAGE_BODY_LIMIT)),
        )
        .route("/search/history", get(search_history))
        .route("/foods/insights", post(food_insights))
}

fn search_error(e: SearchError) -> ApiError {
    match e {
        SearchError::InvalidQuery(msg) => (StatusCode::BAD_REQUEST, msg),
        // the reason is collaborator text and stays in the logs
        SearchError::IdentificationFailed {
            retry_with_text, ..
        } => {
            let mut msg = String::from("Could not identify the food in the image.");
            if retry_with_text {
                msg.push_str(" Try searching by name instead.");
            }
            (StatusCode::UNPROCESSABLE_ENTITY, msg)
        }
    }
}

async fn run_query(
    state: &AppState,
    user_id: uuid::Uuid,
    query: FoodQuery,
) -> Result<Json<SearchResponse>, ApiError> {
    let history = state.history.for_user(user_id);
    let result = state
        .resolver
        .resolve(query, &history)
        .await
        .map_err(search_error)?;
    info!(user_id = %user_id, source = ?result.source, items = result.items.len(), "search resolved");
    Ok(Json(result.into()))
}

#[instrument(skip(state, payload))]
pub async fn search_text(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<SearchRequest>,
) -> Result<Json<SearchResponse>, ApiError> {
    let query = FoodQuery::from_parts(Some(payload.query), None).map_err(search_error)?;
    run_query(&state, user_id, query).await
}

/// Multipart upload: an `image` file and an optional `query` text field.
/// When both are sent the image is used.
#[instrument(skip(state, multipart))]
pub async fn search_image(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    mut multipart: Multipart,
) -> Result<Json<SearchResponse>, ApiError> {
    let mut text = None;
    let mut image = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        warn!(error = %e, "multipart read failed");
        (StatusCode::BAD_REQUEST, e.to_string())
    })? {
        match field.name() {
            Some("image") => {
                let mime = field.content_type().map(str::to_owned);
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?;
                // Browsers send an empty part when no file was picked.
                if !data.is_empty() {
                    image = Some(ImagePayload::new(data, mime.as_deref()));
                }
            }
            Some("query") => {
                text = Some(
                    field
                        .text()
                        .await
                        .map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?,
                );
            }
            _ => {}
        }
    }

    let query = FoodQuery::from_parts(text, image).map_err(search_error)?;
    run_query(&state, user_id, query).await
}

#[instrument(skip(state))]
pub async fn search_history(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Json<HistoryResponse> {
    Json(HistoryResponse {
        history: state.history.load(user_id).await,
    })
}

#[instrument(skip(state, payload))]
pub async fn food_insights(
    State(state): State<AppState>,
    AuthUser(_user_id): AuthUser,
    Json(payload): Json<InsightsRequest>,
) -> Json<InsightsResponse> {
    let limit = state.resolver.config().identify_timeout;
    let insights = generate_insights(state.model.as_ref(), &payload.food, limit).await;
    Json(InsightsResponse { insights })
}
