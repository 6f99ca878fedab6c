//! Inject entity - A challenge document released to teams during the competition.
//!
//! `inject_id` is the business key used in URLs and by submissions; `id` is
//! only the storage key. `release_time` is measured in minutes after the
//! competition started, with 0 meaning "visible immediately".

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Inject database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "injects")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    #[sea_orm(unique)]
    pub inject_id: String,
    pub title: String,
    pub description: Option<String>,
    /// Attached document, served from the injects directory
    pub filename: Option<String>,
    /// Minutes after competition start
    pub release_time: i64,
    pub due_time: Option<String>,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
