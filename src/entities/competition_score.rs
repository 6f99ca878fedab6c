//! Competition score entity - One scoring event for a team.
//!
//! Automated per-round deltas carry a round number; manual adjustments added by
//! administrators may leave it empty. Rows are append-only.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Score adjustment database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "competition_scores")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub team_id: i64,
    /// Signed score delta (negative values are penalties)
    pub score: i64,
    /// Round the delta belongs to, None for manual adjustments
    pub round: Option<i64>,
    pub description: Option<String>,
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
}

impl Related<super::team::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Team.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
