use axum::{
    Json, Router,
    extract::State,
    http::{Method, StatusCode},
    middleware as axum_middleware,
    routing::{get, post},
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::warn;

use crate::db::services::{EventService, TagService, UserService, UserTagService};
use crate::server::config::ServerConfig;
use crate::services::auth_service;
use crate::version::VERSION;
use crate::web::{
    middleware::auth,
    models::user_models::{LoginRequest, LoginResponse, RegisterRequest, UserPublic},
    routes::*,
};

pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;


pub use error::AppError;

#[derive(Clone)]
pub struct AppState {
    pub db_pool: Arc<DatabaseConnection>,
    pub user_service: UserService,
    pub event_service: EventService,
    pub tag_service: TagService,
    pub user_tag_service: UserTagService,
    pub config: Arc<ServerConfig>,
}

impl AppState {
    pub fn new(db_pool: Arc<DatabaseConnection>, config: Arc<ServerConfig>) -> Self {
        Self {
            user_service: UserService::new(db_pool.clone()).with_hash_cost(config.bcrypt_cost),
            event_service: EventService::new(db_pool.clone()),
            tag_service: TagService::new(db_pool.clone()),
            user_tag_service: UserTagService::new(db_pool.clone()),
            db_pool,
            config,
        }
    }
}

async fn register_handler(
    State(app_state): State<Arc<AppState>>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<UserPublic>), AppError> {
    let user = auth_service::register_user(&app_state.user_service, payload).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

async fn login_handler(
    State(app_state): State<Arc<AppState>>,
    jar: CookieJar,
    Json(payload): Json<LoginRequest>,
) -> Result<(CookieJar, Json<LoginResponse>), AppError> {
    let login_response =
        auth_service::login_user(&app_state.user_service, payload, &app_state.config.jwt_secret).await?;

    let auth_cookie = Cookie::build(("token", login_response.token.clone()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(true)
        .build();

    Ok((jar.add(auth_cookie), Json(login_response)))
}

async fn health_check_handler(
    State(app_state): State<Arc<AppState>>,
) -> (StatusCode, Json<serde_json::Value>) {
    match app_state.db_pool.ping().await {
        Ok(()) => (
            StatusCode::OK,
            Json(serde_json::json!({ "status": "OK", "version": VERSION })),
        ),
        Err(e) => {
            warn!(error = %e, "Health check failed to reach the database.");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(serde_json::json!({ "status": "database unavailable", "version": VERSION })),
            )
        }
    }
}

pub fn create_axum_router(db_pool: Arc<DatabaseConnection>, config: Arc<ServerConfig>) -> Router {
    let app_state = Arc::new(AppState::new(db_pool, config));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(vec![
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers(Any);

    Router::new()
        .route("/api/health", get(health_check_handler))
        .route("/api/auth/register", post(register_handler))
        .route("/api/auth/login", post(login_handler))
        .nest(
            "/api/events",
            event_routes::create_events_router()
                .route_layer(axum_middleware::from_fn_with_state(app_state.clone(), auth::auth)),
        )
        .nest("/api/tags", tag_routes::create_tags_router(app_state.clone()))
        .nest(
            "/api/users",
            user_routes::create_user_router()
                .route_layer(axum_middleware::from_fn_with_state(app_state.clone(), auth::auth))
                .merge(user_routes::create_user_tag_link_router()),
        )
        .with_state(app_state)
        .layer(cors)
}
