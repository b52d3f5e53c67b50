//! Table creation driven by the entity definitions.
//!
//! Tables are created in dependency order so foreign keys always point at an
//! existing table. Every statement is `IF NOT EXISTS`, which makes startup
//! safe to repeat against an already initialised database.

use sea_orm::{ConnectionTrait, DbErr, EntityTrait, Schema};
use tracing::info;

use crate::db::entities::prelude::{Event, Tag, User, UserTag};

async fn create_table_for<C, E>(db: &C, schema: &Schema, entity: E) -> Result<(), DbErr>
where
    C: ConnectionTrait,
    E: EntityTrait,
{
    let backend = db.get_database_backend();
    let mut statement = schema.create_table_from_entity(entity);
    statement.if_not_exists();
    db.execute(backend.build(&statement)).await?;
    Ok(())
}

pub async fn create_tables<C: ConnectionTrait>(db: &C) -> Result<(), DbErr> {
    let schema = Schema::new(db.get_database_backend());

    create_table_for(db, &schema, User).await?;
    create_table_for(db, &schema, Tag).await?;
    create_table_for(db, &schema, Event).await?;
    create_table_for(db, &schema, UserTag).await?;

    info!("Database schema is up to date.");
    Ok(())
}
