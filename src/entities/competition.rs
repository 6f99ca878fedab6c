//! Competition entity - The singleton competition clock.
//!
//! Exactly one logical row exists at a time; it is created on first access.
//! Times are kept as RFC 3339 text because they are entered by hand in the
//! admin panel, so a stored value is not guaranteed to parse.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Lifecycle state of the competition
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "lowercase")]
pub enum CompetitionStatus {
    #[default]
    #[sea_orm(string_value = "stopped")]
    Stopped,
    #[sea_orm(string_value = "scheduled")]
    Scheduled,
    #[sea_orm(string_value = "running")]
    Running,
}

/// Competition database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "competition")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub status: CompetitionStatus,
    pub scheduled_time: Option<String>,
    /// Zero point for every inject release offset
    pub started_time: Option<String>,
    pub stopped_time: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
