//! Competition service record entity - One up/down check result.
//!
//! There is one row per (team, service, round). Rows are append-only: a new
//! round produces new rows instead of mutating old ones, which makes this table
//! the ground truth for every status and uptime figure on the scoreboard.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Check record database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "competition_services")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub team_id: i64,
    pub service_id: i64,
    /// Whether every check for the service passed this round
    pub is_up: bool,
    /// Captured checker output, free text
    pub output: Option<String>,
    /// Scoring round the check belongs to
    pub round: i64,
    /// When the result was recorded
    pub timestamp: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::team::Entity",
        from = "Column::TeamId",
        to = "super::team::Column::Id"
    )]
    Team,
    #[sea_orm(
        belongs_to = "super::service::Entity",
        from = "Column::ServiceId",
        to = "super::service::Column::Id"
    )]
    Service,
}

impl Related<super::team::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Team.def()
    }
}

impl Related<super::service::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Service.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
