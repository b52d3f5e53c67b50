use chrono::Utc;
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ColumnTrait, DatabaseConnection, EntityTrait, JoinType, ModelTrait,
    QueryFilter, QueryOrder, QuerySelect, RelationTrait, Set, TransactionTrait,
};
use std::sync::Arc;
use tracing::{debug, info};
use uuid::Uuid;

use crate::db::entities::{tag, user, user_tag};
use crate::services::access_policy;
use crate::web::error::AppError;
use crate::web::models::AuthenticatedUser;

/// Manages the many-to-many link between users and tags.
///
/// `assign` and `unassign` are idempotent: a missing user or tag, an existing
/// link on assign and a missing link on unassign all complete without error
/// and without touching the store.
#[derive(Clone)]
pub struct UserTagService {
    db: Arc<DatabaseConnection>,
}

impl UserTagService {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    pub async fn list_for_user(
        &self,
        actor: &AuthenticatedUser,
        user_id: Uuid,
    ) -> Result<Vec<tag::Model>, AppError> {
        access_policy::ensure(access_policy::self_or_superuser(actor, user_id))?;

        let tags = tag::Entity::find()
            .join(JoinType::InnerJoin, tag::Relation::UserTags.def())
            .filter(user_tag::Column::UserId.eq(user_id))
            .order_by_asc(user_tag::Column::CreatedAt)
            .all(&*self.db)
            .await?;
        Ok(tags)
    }

    pub async fn assign(&self, user_id: Uuid, tag_id: Uuid) -> Result<(), AppError> {
        let txn = self.db.begin().await?;

        let user_exists = user::Entity::find_by_id(user_id).one(&txn).await?.is_some();
        let tag_exists = tag::Entity::find_by_id(tag_id).one(&txn).await?.is_some();
        if !user_exists || !tag_exists {
            debug!(%user_id, %tag_id, user_exists, tag_exists, "Skipping tag assignment for missing endpoint.");
            return Ok(());
        }

        let inserted = user_tag::Entity::insert(user_tag::ActiveModel {
            user_id: Set(user_id),
            tag_id: Set(tag_id),
            created_at: Set(Utc::now()),
        })
        .on_conflict(
            OnConflict::columns([user_tag::Column::UserId, user_tag::Column::TagId])
                .do_nothing()
                .to_owned(),
        )
        .exec_without_returning(&txn)
        .await?;
        txn.commit().await?;

        if inserted == 0 {
            debug!(%user_id, %tag_id, "Tag already assigned.");
            return Ok(());
        }
        info!(%user_id, %tag_id, "Tag assigned to user.");
        Ok(())
    }

    pub async fn unassign(&self, user_id: Uuid, tag_id: Uuid) -> Result<(), AppError> {
        let txn = self.db.begin().await?;

        let Some(link) = user_tag::Entity::find_by_id((user_id, tag_id)).one(&txn).await? else {
            debug!(%user_id, %tag_id, "No tag assignment to remove.");
            return Ok(());
        };
        link.delete(&txn).await?;
        txn.commit().await?;

        info!(%user_id, %tag_id, "Tag removed from user.");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::services::TagService;
    use crate::test_support::{actor_for, insert_user, setup_db};
    use crate::web::models::tag_models::CreateTagRequest;
    use sea_orm::{ActiveModelTrait, PaginatorTrait};

    async fn create_tag(db: &Arc<DatabaseConnection>, admin: &AuthenticatedUser, name: &str) -> tag::Model {
        TagService::new(db.clone())
            .create(
                admin,
                CreateTagRequest {
                    name: name.to_string(),
                    description: None,
                },
            )
            .await
            .unwrap()
    }

    async fn link_count(db: &DatabaseConnection) -> u64 {
        user_tag::Entity::find().count(db).await.unwrap()
    }

    #[tokio::test]
    async fn test_assign_twice_keeps_one_link() {
        let db = setup_db().await;
        let user = actor_for(&insert_user(&db, "user@example.com", false).await);
        let admin = actor_for(&insert_user(&db, "admin@example.com", true).await);
        let tag = create_tag(&db, &admin, "vip").await;
        let service = UserTagService::new(db.clone());

        service.assign(user.id, tag.id).await.unwrap();
        service.assign(user.id, tag.id).await.unwrap();

        assert_eq!(link_count(&db).await, 1);
        let tags = service.list_for_user(&user, user.id).await.unwrap();
        assert_eq!(tags, vec![tag]);
    }

    #[tokio::test]
    async fn test_assign_over_existing_link_is_noop() {
        let db = setup_db().await;
        let user = actor_for(&insert_user(&db, "user@example.com", false).await);
        let admin = actor_for(&insert_user(&db, "admin@example.com", true).await);
        let tag = create_tag(&db, &admin, "vip").await;
        let service = UserTagService::new(db.clone());

        // Another writer got there first.
        let existing = user_tag::ActiveModel {
            user_id: Set(user.id),
            tag_id: Set(tag.id),
            created_at: Set(Utc::now()),
        }
        .insert(&*db)
        .await
        .unwrap();

        service.assign(user.id, tag.id).await.unwrap();

        let links = user_tag::Entity::find().all(&*db).await.unwrap();
        assert_eq!(links, vec![existing]);
    }

    #[tokio::test]
    async fn test_assign_with_missing_endpoint_is_noop() {
        let db = setup_db().await;
        let user = actor_for(&insert_user(&db, "user@example.com", false).await);
        let admin = actor_for(&insert_user(&db, "admin@example.com", true).await);
        let tag = create_tag(&db, &admin, "vip").await;
        let service = UserTagService::new(db.clone());

        service.assign(Uuid::now_v7(), tag.id).await.unwrap();
        service.assign(user.id, Uuid::now_v7()).await.unwrap();

        assert_eq!(link_count(&db).await, 0);
    }

    #[tokio::test]
    async fn test_unassign() {
        let db = setup_db().await;
        let user = actor_for(&insert_user(&db, "user@example.com", false).await);
        let admin = actor_for(&insert_user(&db, "admin@example.com", true).await);
        let vip = create_tag(&db, &admin, "vip").await;
        let beta = create_tag(&db, &admin, "beta").await;
        let service = UserTagService::new(db.clone());

        service.assign(user.id, vip.id).await.unwrap();

        // Removing a link that was never made leaves the store alone.
        service.unassign(user.id, beta.id).await.unwrap();
        assert_eq!(link_count(&db).await, 1);

        service.unassign(user.id, vip.id).await.unwrap();
        assert_eq!(link_count(&db).await, 0);
        assert!(service.list_for_user(&user, user.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_listing_other_users_tags_requires_superuser() {
        let db = setup_db().await;
        let x = actor_for(&insert_user(&db, "x@example.com", false).await);
        let y = actor_for(&insert_user(&db, "y@example.com", false).await);
        let admin = actor_for(&insert_user(&db, "admin@example.com", true).await);
        let vip = create_tag(&db, &admin, "vip").await;
        let beta = create_tag(&db, &admin, "beta").await;
        let service = UserTagService::new(db.clone());

        service.assign(y.id, vip.id).await.unwrap();
        service.assign(y.id, beta.id).await.unwrap();
        service.assign(x.id, beta.id).await.unwrap();

        assert!(matches!(
            service.list_for_user(&x, y.id).await,
            Err(AppError::Forbidden(_))
        ));

        let mut names: Vec<String> = service
            .list_for_user(&admin, y.id)
            .await
            .unwrap()
            .into_iter()
            .map(|t| t.name)
            .collect();
        names.sort();
        assert_eq!(names, vec!["beta".to_string(), "vip".to_string()]);
    }

    #[tokio::test]
    async fn test_deleting_tag_removes_its_links() {
        let db = setup_db().await;
        let user = actor_for(&insert_user(&db, "user@example.com", false).await);
        let admin = actor_for(&insert_user(&db, "admin@example.com", true).await);
        let tag = create_tag(&db, &admin, "vip").await;
        let service = UserTagService::new(db.clone());

        service.assign(user.id, tag.id).await.unwrap();
        TagService::new(db.clone()).delete(&admin, tag.id).await.unwrap();

        assert_eq!(link_count(&db).await, 0);
    }
}
