use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use tracing::instrument;

use crate::error::ApiError;
use crate::state::AppState;
use crate::users::dto::UserDto;

// --- public routers ---

pub fn read_routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(get_all_users))
        .route("/users/email/:email", get(get_user_by_email))
        .route("/users/:user_id", get(get_user_by_id))
}

pub fn write_routes() -> Router<AppState> {
    Router::new()
        .route("/users", post(create_user))
        .route("/users/:user_id", put(update_user).delete(delete_user))
}

// --- handlers ---

#[instrument(skip(state, payload))]
pub async fn create_user(
    State(state): State<AppState>,
    Json(payload): Json<UserDto>,
) -> Result<(StatusCode, Json<UserDto>), ApiError> {
    let user = state.users.create_user(payload).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

#[instrument(skip(state))]
pub async fn get_all_users(
    State(state): State<AppState>,
) -> Result<Json<Vec<UserDto>>, ApiError> {
    Ok(Json(state.users.get_all_users().await?))
}

#[instrument(skip(state))]
pub async fn get_user_by_email(
    State(state): State<AppState>,
    Path(email): Path<String>,
) -> Result<Json<UserDto>, ApiError> {
    Ok(Json(state.users.get_user_by_email(&email).await?))
}

#[instrument(skip(state))]
pub async fn get_user_by_id(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<UserDto>, ApiError> {
    Ok(Json(state.users.get_user_by_id(&user_id).await?))
}

#[instrument(skip(state, payload))]
pub async fn update_user(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
    Json(payload): Json<UserDto>,
) -> Result<Json<UserDto>, ApiError> {
    Ok(Json(state.users.update_user(payload, &user_id).await?))
}

#[instrument(skip(state))]
pub async fn delete_user(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.users.delete_user(&user_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
