//! Regex check entity - A pattern matched against a check's output.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Regex check database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "regex_checks")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub service_check_id: i64,
    pub pattern: String,
    /// Whether the pattern is expected to match (true) or expected to be absent (false)
    pub expected: bool,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::service_check::Entity",
        from = "Column::ServiceCheckId",
        to = "super::service_check::Column::Id"
    )]
    ServiceCheck,
}

impl Related<super::service_check::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ServiceCheck.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
