//! Shared test utilities for Blue Devil.
//!
//! This module provides common helper functions for setting up test databases
//! and creating test entities with sensible defaults.

use crate::{
    core::{
        competition::{self, CheckResult},
        inject::{self, InjectDefinition},
        service::{self, ServiceDefinition},
        team,
    },
    entities,
    errors::Result,
};
use sea_orm::DatabaseConnection;

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

pub async fn create_test_team(db: &DatabaseConnection, name: &str) -> Result<entities::team::Model> {
    team::create_team(db, name).await
}

/// Creates a service without any checks.
pub async fn create_test_service(
    db: &DatabaseConnection,
    name: &str,
) -> Result<entities::service::Model> {
    let details = service::save_service(
        db,
        ServiceDefinition {
            name: name.to_string(),
            ..Default::default()
        },
    )
    .await?;
    Ok(details.service)
}

/// Records one check outcome with no captured output.
pub async fn create_test_check(
    db: &DatabaseConnection,
    team_id: i64,
    service_id: i64,
    round: i64,
    is_up: bool,
) -> Result<entities::competition_service::Model> {
    competition::record_check_result(
        db,
        CheckResult {
            team_id,
            service_id,
            round,
            is_up,
            output: None,
        },
    )
    .await
}

pub async fn create_test_adjustment(
    db: &DatabaseConnection,
    team_id: i64,
    score: i64,
    round: Option<i64>,
) -> Result<entities::competition_score::Model> {
    competition::add_score_adjustment(db, team_id, score, round, None).await
}

/// Creates an inject released `release_time` minutes after the start.
///
/// # Defaults
/// * title: "Inject {inject_id}"
/// * no description, attachment or due time
pub async fn create_test_inject(
    db: &DatabaseConnection,
    inject_id: &str,
    release_time: i64,
) -> Result<entities::inject::Model> {
    inject::upsert_inject(
        db,
        InjectDefinition {
            inject_id: inject_id.to_string(),
            title: format!("Inject {inject_id}"),
            description: None,
            filename: None,
            release_time,
            due_time: None,
        },
    )
    .await
}
