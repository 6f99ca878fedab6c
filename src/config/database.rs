//! Database configuration module.
//!
//! This module handles the `SQLite` connection and table creation using `SeaORM`.
//! Tables are generated from the entity definitions with
//! `Schema::create_table_from_entity`, so the schema always matches the Rust
//! structs without hand-written SQL. Creation is idempotent: the service runs
//! it on every start against a persistent file.

use crate::entities::{
    Competition, CompetitionScore, CompetitionService, Inject, InjectSubmission, RegexCheck,
    ScoringBox, Service, ServiceCheck, Team, TeamMember, User,
};
use crate::errors::Result;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, EntityTrait, Schema};
use tracing::{debug, info};

/// Default database location when `DATABASE_URL` is not set.
pub const DEFAULT_DATABASE_URL: &str = "sqlite://blue_devil.sqlite?mode=rwc";

/// Gets the database URL from environment variable or returns default `SQLite` path.
#[must_use]
pub fn get_database_url() -> String {
    std::env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string())
}

/// Establishes a connection to the database at `database_url`.
pub async fn create_connection(database_url: &str) -> Result<DatabaseConnection> {
    info!("Connecting to database at {database_url}");
    Database::connect(database_url).await.map_err(Into::into)
}

async fn create_table<E>(db: &DatabaseConnection, schema: &Schema, entity: E) -> Result<()>
where
    E: EntityTrait,
{
    debug!("Ensuring table {}", entity.table_name());
    let builder = db.get_database_backend();
    let mut statement = schema.create_table_from_entity(entity);
    statement.if_not_exists();
    db.execute(builder.build(&statement)).await?;
    Ok(())
}

/// Creates every table the service needs, skipping the ones that already exist.
///
/// Parent tables are created before the tables whose foreign keys point at them.
pub async fn create_tables(db: &DatabaseConnection) -> Result<()> {
    let schema = Schema::new(db.get_database_backend());

    create_table(db, &schema, Team).await?;
    create_table(db, &schema, User).await?;
    create_table(db, &schema, TeamMember).await?;
    create_table(db, &schema, Service).await?;
    create_table(db, &schema, ServiceCheck).await?;
    create_table(db, &schema, RegexCheck).await?;
    create_table(db, &schema, ScoringBox).await?;
    create_table(db, &schema, CompetitionService).await?;
    create_table(db, &schema, CompetitionScore).await?;
    create_table(db, &schema, Competition).await?;
    create_table(db, &schema, Inject).await?;
    create_table(db, &schema, InjectSubmission).await?;

    Ok(())
}
