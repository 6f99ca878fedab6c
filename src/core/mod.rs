//! Core business logic - framework-agnostic operations on the scoring database.
//!
//! Functions take a `&DatabaseConnection` and return the crate `Result`; the web
//! layer only translates between HTTP and these calls.

pub mod competition;
pub mod info;
pub mod inject;
pub mod scoring;
pub mod scoring_box;
pub mod service;
pub mod team;
pub mod user;
pub mod visibility;
