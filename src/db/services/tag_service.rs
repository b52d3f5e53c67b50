use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, DatabaseConnection, EntityTrait, IntoActiveModel, ModelTrait, PaginatorTrait,
    QueryOrder, QuerySelect, Set, TransactionTrait,
};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::db::entities::tag;
use crate::services::access_policy;
use crate::web::error::AppError;
use crate::web::models::tag_models::{CreateTagRequest, UpdateTagRequest};
use crate::web::models::{AuthenticatedUser, ListResponse, Message};

const DUPLICATE_TAG_MESSAGE: &str = "A tag with this name already exists.";

/// Tags are global. Anyone may read them; only superusers may change them.
///
/// Mutations check the superuser rule before looking the tag up, so a
/// regular user gets `Forbidden` even for an id that does not exist.
#[derive(Clone)]
pub struct TagService {
    db: Arc<DatabaseConnection>,
}

impl TagService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    pub async fn list(&self, skip: u64, limit: u64) -> Result<ListResponse<tag::Model>, AppError> {
        let txn = self.db.begin().await?;

        let count = tag::Entity::find().count(&txn).await?;
        let data = tag::Entity::find()
            .order_by_asc(tag::Column::Id)
            .offset(skip)
            .limit(limit)
            .all(&txn)
            .await?;

        txn.commit().await?;
        Ok(ListResponse { data, count })
    }

    pub async fn get(&self, tag_id: Uuid) -> Result<tag::Model, AppError> {
        tag::Entity::find_by_id(tag_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("Tag not found".to_string()))
    }

    /// Name uniqueness is left to the store; a duplicate surfaces as `Conflict`.
    pub async fn create(
        &self,
        actor: &AuthenticatedUser,
        payload: CreateTagRequest,
    ) -> Result<tag::Model, AppError> {
        Self::ensure_superuser(actor)?;

        let txn = self.db.begin().await?;
        let now = Utc::now();
        let new_tag = tag::ActiveModel {
            id: Set(Uuid::now_v7()),
            name: Set(payload.name),
            description: Set(payload.description),
            created_at: Set(now),
            updated_at: Set(now),
        };
        let tag = new_tag
            .insert(&txn)
            .await
            .map_err(|e| AppError::conflict_or_database(e, DUPLICATE_TAG_MESSAGE))?;

        txn.commit().await?;
        info!(tag_id = %tag.id, name = %tag.name, "Tag created.");
        Ok(tag)
    }

    pub async fn update(
        &self,
        actor: &AuthenticatedUser,
        tag_id: Uuid,
        payload: UpdateTagRequest,
    ) -> Result<tag::Model, AppError> {
        Self::ensure_superuser(actor)?;

        let txn = self.db.begin().await?;
        let existing = tag::Entity::find_by_id(tag_id)
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::NotFound("Tag not found".to_string()))?;

        if payload.is_empty() {
            txn.commit().await?;
            return Ok(existing);
        }

        let mut active = existing.into_active_model();
        if let Some(name) = payload.name {
            active.name = Set(name);
        }
        if let Some(description) = payload.description {
            active.description = Set(description);
        }
        active.updated_at = Set(Utc::now());

        let updated = active
            .update(&txn)
            .await
            .map_err(|e| AppError::conflict_or_database(e, DUPLICATE_TAG_MESSAGE))?;
        txn.commit().await?;

        info!(tag_id = %updated.id, "Tag updated.");
        Ok(updated)
    }

    pub async fn delete(&self, actor: &AuthenticatedUser, tag_id: Uuid) -> Result<Message, AppError> {
        Self::ensure_superuser(actor)?;

        let txn = self.db.begin().await?;
        let existing = tag::Entity::find_by_id(tag_id)
            .one(&txn)
            .await?
            .ok_or_else(|| AppError::NotFound("Tag not found".to_string()))?;
        existing.delete(&txn).await?;
        txn.commit().await?;

        info!(tag_id = %tag_id, "Tag deleted.");
        Ok(Message::new("Tag deleted successfully"))
    }

    fn ensure_superuser(actor: &AuthenticatedUser) -> Result<(), AppError> {
        access_policy::ensure(access_policy::superuser_only(actor)).inspect_err(|_| {
            warn!(actor_id = %actor.id, "Non-superuser attempted to modify tags.");
        })
    }
}
