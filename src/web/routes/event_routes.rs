use axum::{
    Json, Router,
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    routing::get,
};
use std::sync::Arc;
use uuid::Uuid;

use crate::db::entities::event;
use crate::web::models::event_models::{CreateEventRequest, UpdateEventRequest};
use crate::web::models::{AuthenticatedUser, ListResponse, Message, PaginationParams};
use crate::web::{AppError, AppState};

async fn list_events_handler(
    Extension(actor): Extension<AuthenticatedUser>,
    State(app_state): State<Arc<AppState>>,
    Query(params): Query<PaginationParams>,
) -> Result<Json<ListResponse<event::Model>>, AppError> {
    let page = app_state
        .event_service
        .list(&actor, params.skip, params.limit)
        .await?;
    Ok(Json(page))
}

async fn get_event_handler(
    Extension(actor): Extension<AuthenticatedUser>,
    State(app_state): State<Arc<AppState>>,
    Path(event_id): Path<Uuid>,
) -> Result<Json<event::Model>, AppError> {
    Ok(Json(app_state.event_service.get(&actor, event_id).await?))
}

async fn create_event_handler(
    Extension(actor): Extension<AuthenticatedUser>,
    State(app_state): State<Arc<AppState>>,
    Json(payload): Json<CreateEventRequest>,
) -> Result<(StatusCode, Json<event::Model>), AppError> {
    let event = app_state.event_service.create(&actor, payload).await?;
    Ok((StatusCode::CREATED, Json(event)))
}

async fn update_event_handler(
    Extension(actor): Extension<AuthenticatedUser>,
    State(app_state): State<Arc<AppState>>,
    Path(event_id): Path<Uuid>,
    Json(payload): Json<UpdateEventRequest>,
) -> Result<Json<event::Model>, AppError> {
    Ok(Json(app_state.event_service.update(&actor, event_id, payload).await?))
}

async fn delete_event_handler(
    Extension(actor): Extension<AuthenticatedUser>,
    State(app_state): State<Arc<AppState>>,
    Path(event_id): Path<Uuid>,
) -> Result<Json<Message>, AppError> {
    Ok(Json(app_state.event_service.delete(&actor, event_id).await?))
}

pub fn create_events_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(list_events_handler).post(create_event_handler))
        .route(
            "/{event_id}",
            get(get_event_handler)
                .put(update_event_handler)
                .delete(delete_event_handler),
        )
}
