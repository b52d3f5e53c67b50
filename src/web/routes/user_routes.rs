use axum::{
    Json, Router,
    extract::{Extension, Path, State},
    http::StatusCode,
    routing::{get, post},
};
use std::sync::Arc;
use uuid::Uuid;

use crate::db::entities::tag;
use crate::services::auth_service;
use crate::web::models::user_models::{UpdateUserRequest, UserPublic};
use crate::web::models::AuthenticatedUser;
use crate::web::{AppError, AppState};

async fn read_me_handler(
    Extension(actor): Extension<AuthenticatedUser>,
    State(app_state): State<Arc<AppState>>,
) -> Result<Json<UserPublic>, AppError> {
    Ok(Json(auth_service::me(&app_state.user_service, &actor).await?))
}

async fn update_me_handler(
    Extension(actor): Extension<AuthenticatedUser>,
    State(app_state): State<Arc<AppState>>,
    Json(payload): Json<UpdateUserRequest>,
) -> Result<Json<UserPublic>, AppError> {
    if payload.password.as_ref().is_some_and(|p| p.len() < 8) {
        return Err(AppError::InvalidInput(
            "Password must be at least 8 characters long.".to_string(),
        ));
    }
    let updated = app_state.user_service.update(actor.id, payload).await?;
    Ok(Json(updated.into()))
}

async fn list_user_tags_handler(
    Extension(actor): Extension<AuthenticatedUser>,
    State(app_state): State<Arc<AppState>>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<Vec<tag::Model>>, AppError> {
    Ok(Json(app_state.user_tag_service.list_for_user(&actor, user_id).await?))
}

async fn assign_tag_handler(
    State(app_state): State<Arc<AppState>>,
    Path((user_id, tag_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, AppError> {
    app_state.user_tag_service.assign(user_id, tag_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn unassign_tag_handler(
    State(app_state): State<Arc<AppState>>,
    Path((user_id, tag_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, AppError> {
    app_state.user_tag_service.unassign(user_id, tag_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Routes that run behind the auth middleware.
pub fn create_user_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/me", get(read_me_handler).patch(update_me_handler))
        .route("/{user_id}/tags", get(list_user_tags_handler))
}

/// Linking and unlinking take no caller identity.
pub fn create_user_tag_link_router() -> Router<Arc<AppState>> {
    Router::new().route(
        "/{user_id}/tags/{tag_id}",
        post(assign_tag_handler).delete(unassign_tag_handler),
    )
}
