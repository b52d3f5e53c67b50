use bcrypt::{DEFAULT_COST, hash, verify};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, IntoActiveModel, QueryFilter,
    Set, TransactionTrait,
};
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;

use crate::db::entities::user;
use crate::web::error::AppError;
use crate::web::models::user_models::{NewUser, UpdateUserRequest};

const DUPLICATE_EMAIL_MESSAGE: &str = "The user with this email already exists";

#[derive(Clone)]
pub struct UserService {
    db: Arc<DatabaseConnection>,
    hash_cost: u32,
}

impl UserService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self {
            db,
            hash_cost: DEFAULT_COST,
        }
    }

    pub fn with_hash_cost(mut self, hash_cost: u32) -> Self {
        self.hash_cost = hash_cost;
        self
    }

    fn hash_password(&self, password: &str) -> Result<String, AppError> {
        hash(password, self.hash_cost).map_err(|e| AppError::PasswordHashingError(e.to_string()))
    }

    pub async fn create(&self, new_user: NewUser) -> Result<user::Model, AppError> {
        let hashed_password = self.hash_password(&new_user.password)?;
        let now = Utc::now();

        let txn = self.db.begin().await?;
        let user = user::ActiveModel {
            id: Set(Uuid::now_v7()),
            email: Set(new_user.email),
            hashed_password: Set(hashed_password),
            full_name: Set(new_user.full_name),
            is_superuser: Set(new_user.is_superuser),
            is_active: Set(new_user.is_active),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&txn)
        .await
        .map_err(|e| AppError::conflict_or_database(e, DUPLICATE_EMAIL_MESSAGE))?;
        txn.commit().await?;

        info!(user_id = %user.id, is_superuser = user.is_superuser, "User created.");
        Ok(user)
    }

    pub async fn get_by_id(&self, user_id: Uuid) -> Result<Option<user::Model>, AppError> {
        Ok(user::Entity::find_by_id(user_id).one(&*self.db).await?)
    }

    pub async fn get_by_email(&self, email: &str) -> Result<Option<user::Model>, AppError> {
        Ok(user::Entity::find()
            .filter(user::Column::Email.eq(email))
            .one(&*self.db)
            .await?)
    }

    /// Partial update; a present `password` is hashed into `hashed_password`.
    pub async fn update(&self, user_id: Uuid, payload: UpdateUserRequest) -> Result<user::Model, AppError> {
        let hashed_password = payload
            .password
            .as_deref()
            .map(|password| self.hash_password(password))
            .transpose()?;

        let txn = self.db.begin().await?;
        let existing = user::Entity::find_by_id(user_id)
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

        if payload.email.is_none() && hashed_password.is_none() && payload.full_name.is_none() {
            txn.commit().await?;
            return Ok(existing);
        }

        let mut active = existing.into_active_model();
        if let Some(email) = payload.email {
            active.email = Set(email);
        }
        if let Some(hashed_password) = hashed_password {
            active.hashed_password = Set(hashed_password);
        }
        if let Some(full_name) = payload.full_name {
            active.full_name = Set(full_name);
        }
        active.updated_at = Set(Utc::now());

        let updated = active
            .update(&txn)
            .await
            .map_err(|e| AppError::conflict_or_database(e, DUPLICATE_EMAIL_MESSAGE))?;
        txn.commit().await?;

        info!(user_id = %updated.id, "User updated.");
        Ok(updated)
    }

    /// Returns the user only when the email exists and the password matches.
    pub async fn authenticate(&self, email: &str, password: &str) -> Result<Option<user::Model>, AppError> {
        let Some(user) = self.get_by_email(email).await? else {
            return Ok(None);
        };
        let valid = verify(password, &user.hashed_password)
            .map_err(|e| AppError::InternalServerError(format!("Password verification failed: {e}")))?;
        Ok(valid.then_some(user))
    }

    /// Creates the configured superuser unless a user with that email exists.
    pub async fn ensure_first_superuser(&self, email: &str, password: &str) -> Result<user::Model, AppError> {
        if let Some(existing) = self.get_by_email(email).await? {
            return Ok(existing);
        }
        self.create(NewUser {
            email: email.to_string(),
            password: password.to_string(),
            full_name: None,
            is_superuser: true,
            is_active: true,
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{TEST_HASH_COST, setup_db};

    fn new_user(email: &str) -> NewUser {
        NewUser {
            email: email.to_string(),
            password: "correct horse".to_string(),
            full_name: Some("Ada".to_string()),
            is_superuser: false,
            is_active: true,
        }
    }

    #[tokio::test]
    async fn test_create_and_authenticate() {
        let service = UserService::new(setup_db().await).with_hash_cost(TEST_HASH_COST);
        let user = service.create(new_user("ada@example.com")).await.unwrap();

        assert_ne!(user.hashed_password, "correct horse");
        assert_eq!(
            service.authenticate("ada@example.com", "correct horse").await.unwrap(),
            Some(user.clone())
        );
        assert_eq!(service.authenticate("ada@example.com", "wrong").await.unwrap(), None);
        assert_eq!(service.authenticate("nobody@example.com", "x").await.unwrap(), None);
        assert_eq!(service.get_by_id(user.id).await.unwrap(), Some(user));
    }

    #[tokio::test]
    async fn test_duplicate_email_is_conflict() {
        let service = UserService::new(setup_db().await).with_hash_cost(TEST_HASH_COST);
        service.create(new_user("ada@example.com")).await.unwrap();

        let err = service.create(new_user("ada@example.com")).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));
    }

    #[tokio::test]
    async fn test_update_rehashes_password_and_keeps_absent_fields() {
        let service = UserService::new(setup_db().await).with_hash_cost(TEST_HASH_COST);
        let user = service.create(new_user("ada@example.com")).await.unwrap();

        let updated = service
            .update(
                user.id,
                UpdateUserRequest {
                    password: Some("new password".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.full_name.as_deref(), Some("Ada"));
        assert_eq!(updated.email, "ada@example.com");
        assert!(service.authenticate("ada@example.com", "new password").await.unwrap().is_some());
        assert!(service.authenticate("ada@example.com", "correct horse").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_ensure_first_superuser_is_idempotent() {
        let service = UserService::new(setup_db().await).with_hash_cost(TEST_HASH_COST);

        let first = service.ensure_first_superuser("root@example.com", "changethis").await.unwrap();
        let second = service.ensure_first_superuser("root@example.com", "changethis").await.unwrap();

        assert!(first.is_superuser);
        assert_eq!(first.id, second.id);
    }
}
