use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, EntityTrait,
    IntoActiveModel, ModelTrait, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, Set,
    TransactionTrait,
};
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::db::entities::event;
use crate::services::access_policy;
use crate::web::error::AppError;
use crate::web::models::event_models::{CreateEventRequest, UpdateEventRequest};
use crate::web::models::{AuthenticatedUser, ListResponse, Message};

#[derive(Clone)]
pub struct EventService {
    db: Arc<DatabaseConnection>,
}

impl EventService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    /// Superusers page through every event; everyone else only through the
    /// events they host. `count` is the size of the filtered set.
    pub async fn list(
        &self,
        actor: &AuthenticatedUser,
        skip: u64,
        limit: u64,
    ) -> Result<ListResponse<event::Model>, AppError> {
        let txn = self.db.begin().await?;

        let mut query = event::Entity::find();
        if !actor.is_superuser {
            query = query.filter(event::Column::HostId.eq(actor.id));
        }

        let count = query.clone().count(&txn).await?;
        let data = query
            .order_by_asc(event::Column::Id)
            .offset(skip)
            .limit(limit)
            .all(&txn)
            .await?;

        txn.commit().await?;
        Ok(ListResponse { data, count })
    }

    pub async fn get(&self, actor: &AuthenticatedUser, event_id: Uuid) -> Result<event::Model, AppError> {
        let txn = self.db.begin().await?;
        let event = Self::find_authorized(&txn, actor, event_id).await?;
        txn.commit().await?;
        Ok(event)
    }

    pub async fn create(
        &self,
        actor: &AuthenticatedUser,
        payload: CreateEventRequest,
    ) -> Result<event::Model, AppError> {
        let txn = self.db.begin().await?;
        let now = Utc::now();

        let new_event = event::ActiveModel {
            id: Set(Uuid::now_v7()),
            host_id: Set(actor.id),
            title: Set(payload.title),
            description: Set(payload.description),
            location: Set(payload.location),
            starts_at: Set(payload.starts_at),
            ends_at: Set(payload.ends_at),
            created_at: Set(now),
            updated_at: Set(now),
        };
        let event = new_event.insert(&txn).await?;

        txn.commit().await?;
        info!(event_id = %event.id, host_id = %event.host_id, "Event created.");
        Ok(event)
    }

    /// Overwrites only the fields present in `payload`.
    pub async fn update(
        &self,
        actor: &AuthenticatedUser,
        event_id: Uuid,
        payload: UpdateEventRequest,
    ) -> Result<event::Model, AppError> {
        let txn = self.db.begin().await?;
        let existing = Self::find_authorized(&txn, actor, event_id).await?;

        if payload.is_empty() {
            txn.commit().await?;
            return Ok(existing);
        }

        let mut active = existing.into_active_model();
        if let Some(title) = payload.title {
            active.title = Set(title);
        }
        if let Some(description) = payload.description {
            active.description = Set(description);
        }
        if let Some(location) = payload.location {
            active.location = Set(location);
        }
        if let Some(starts_at) = payload.starts_at {
            active.starts_at = Set(starts_at);
        }
        if let Some(ends_at) = payload.ends_at {
            active.ends_at = Set(ends_at);
        }
        active.updated_at = Set(Utc::now());

        let updated = active.update(&txn).await?;
        txn.commit().await?;
        info!(event_id = %updated.id, actor_id = %actor.id, "Event updated.");
        Ok(updated)
    }

    pub async fn delete(&self, actor: &AuthenticatedUser, event_id: Uuid) -> Result<Message, AppError> {
        let txn = self.db.begin().await?;
        let existing = Self::find_authorized(&txn, actor, event_id).await?;
        existing.delete(&txn).await?;
        txn.commit().await?;

        info!(event_id = %event_id, actor_id = %actor.id, "Event deleted.");
        Ok(Message::new("Event deleted successfully"))
    }

    // Existence first, then ownership.
    async fn find_authorized(
        txn: &DatabaseTransaction,
        actor: &AuthenticatedUser,
        event_id: Uuid,
    ) -> Result<event::Model, AppError> {
        let event = event::Entity::find_by_id(event_id)
            .one(txn)
            .await?
            .ok_or_else(|| AppError::NotFound("Event not found".to_string()))?;

        if !access_policy::owner_or_superuser(actor, event.host_id).is_allowed() {
            warn!(event_id = %event_id, actor_id = %actor.id, "Denied access to event.");
            return Err(AppError::forbidden());
        }
        Ok(event)
    }
}
