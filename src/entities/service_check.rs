//! Service check entity - One command run against a service's box.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Service check database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "service_checks")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub service_id: i64,
    pub name: String,
    /// Command line executed by the checker
    pub command: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::service::Entity",
        from = "Column::ServiceId",
        to = "super::service::Column::Id"
    )]
    Service,
    #[sea_orm(has_many = "super::regex_check::Entity")]
    Regexes,
}

impl Related<super::service::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Service.def()
    }
}

impl Related<super::regex_check::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Regexes.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
