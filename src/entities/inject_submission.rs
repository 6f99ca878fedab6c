//! Inject submission entity - A team's response to an inject.
//!
//! A team may submit any number of times; nothing is overwritten.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Inject submission database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "inject_submissions")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Business key of the inject (not the storage id)
    pub inject_id: String,
    pub team_id: i64,
    pub filename: String,
    pub submitted_at: DateTimeUtc,
    pub scored: bool,
    pub score: Option<i64>,
    pub reviewer: Option<String>,
    pub notes: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::team::Entity",
        from = "Column::TeamId",
        to = "super::team::Column::Id"
    )]
    Team,
}

impl Related<super::team::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Team.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
