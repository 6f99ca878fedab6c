//! Team entity - A competing blue team.
//!
//! Teams are created by administrators and stay stable for the duration of a
//! competition. Check records, score adjustments and submissions reference them.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Team database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "teams")]
pub struct Model {
    /// Unique identifier for the team
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Display name, unique across teams
    #[sea_orm(unique)]
    pub name: String,
}

/// Teams are referenced by child tables; the relations live on the children.
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
