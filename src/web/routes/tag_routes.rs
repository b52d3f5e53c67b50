use axum::{
    Json, Router,
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    middleware as axum_middleware,
    routing::{get, post},
};
use std::sync::Arc;
use uuid::Uuid;

use crate::db::entities::tag;
use crate::web::middleware::auth;
use crate::web::models::tag_models::{CreateTagRequest, UpdateTagRequest};
use crate::web::models::{AuthenticatedUser, ListResponse, Message, PaginationParams};
use crate::web::{AppError, AppState};

// Listing is public; everything else requires a token.
async fn list_tags_handler(
    State(app_state): State<Arc<AppState>>,
    Query(params): Query<PaginationParams>,
) -> Result<Json<ListResponse<tag::Model>>, AppError> {
    Ok(Json(app_state.tag_service.list(params.skip, params.limit).await?))
}

async fn get_tag_handler(
    State(app_state): State<Arc<AppState>>,
    Path(tag_id): Path<Uuid>,
) -> Result<Json<tag::Model>, AppError> {
    Ok(Json(app_state.tag_service.get(tag_id).await?))
}

async fn create_tag_handler(
    Extension(actor): Extension<AuthenticatedUser>,
    State(app_state): State<Arc<AppState>>,
    Json(payload): Json<CreateTagRequest>,
) -> Result<(StatusCode, Json<tag::Model>), AppError> {
    let tag = app_state.tag_service.create(&actor, payload).await?;
    Ok((StatusCode::CREATED, Json(tag)))
}

async fn update_tag_handler(
    Extension(actor): Extension<AuthenticatedUser>,
    State(app_state): State<Arc<AppState>>,
    Path(tag_id): Path<Uuid>,
    Json(payload): Json<UpdateTagRequest>,
) -> Result<Json<tag::Model>, AppError> {
    Ok(Json(app_state.tag_service.update(&actor, tag_id, payload).await?))
}

async fn delete_tag_handler(
    Extension(actor): Extension<AuthenticatedUser>,
    State(app_state): State<Arc<AppState>>,
    Path(tag_id): Path<Uuid>,
) -> Result<Json<Message>, AppError> {
    Ok(Json(app_state.tag_service.delete(&actor, tag_id).await?))
}

pub fn create_tags_router(app_state: Arc<AppState>) -> Router<Arc<AppState>> {
    let require_auth = axum_middleware::from_fn_with_state(app_state, auth::auth);

    Router::new()
        .route(
            "/",
            get(list_tags_handler).merge(post(create_tag_handler).route_layer(require_auth.clone())),
        )
        .route(
            "/{tag_id}",
            get(get_tag_handler)
                .put(update_tag_handler)
                .delete(delete_tag_handler)
                .route_layer(require_auth),
        )
}
