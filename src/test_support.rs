//! Shared fixtures for the unit tests: an in-memory SQLite store built from
//! the entities, plus helpers to seed users directly.

use std::sync::Arc;

use chrono::Utc;
use sea_orm::{ActiveModelTrait, ConnectOptions, Database, DatabaseConnection, Set};
use uuid::Uuid;

use crate::db::entities::user;
use crate::db::schema;
use crate::web::models::AuthenticatedUser;

/// Lowest cost bcrypt accepts; keeps hashing fast in tests.
pub const TEST_HASH_COST: u32 = 4;

pub async fn setup_db() -> Arc<DatabaseConnection> {
    // A single connection keeps every query on the same in-memory database.
    let mut opt = ConnectOptions::new("sqlite::memory:");
    opt.max_connections(1).min_connections(1).sqlx_logging(false);

    let db = Database::connect(opt)
        .await
        .expect("failed to open in-memory sqlite");
    schema::create_tables(&db)
        .await
        .expect("failed to create schema");
    Arc::new(db)
}

pub async fn insert_user(db: &DatabaseConnection, email: &str, is_superuser: bool) -> user::Model {
    let now = Utc::now();
    user::ActiveModel {
        id: Set(Uuid::now_v7()),
        email: Set(email.to_string()),
        hashed_password: Set("not-a-real-hash".to_string()),
        full_name: Set(None),
        is_superuser: Set(is_superuser),
        is_active: Set(true),
        created_at: Set(now),
        updated_at: Set(now),
    }
    .insert(db)
    .await
    .expect("failed to insert user")
}

pub fn actor_for(user: &user::Model) -> AuthenticatedUser {
    AuthenticatedUser {
        id: user.id,
        email: user.email.clone(),
        is_superuser: user.is_superuser,
    }
}
