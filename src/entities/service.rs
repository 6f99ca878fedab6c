//! Service entity - A scored service (e.g. "web", "ssh", "dns").
//!
//! Each service owns an ordered list of checks, and each check owns an ordered
//! list of regexes. Services are admin-managed configuration and are read-only
//! from the scoring side.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Service database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "services")]
pub struct Model {
    /// Unique identifier for the service
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Human-readable service name, unique
    #[sea_orm(unique)]
    pub name: String,
    /// Host or free-text description of where the service runs
    pub description: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One service has many checks
    #[sea_orm(has_many = "super::service_check::Entity")]
    Checks,
}

impl Related<super::service_check::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Checks.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
