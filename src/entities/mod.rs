//! Entity module - Contains all SeaORM entity definitions for the database.
//! These entities represent the database tables and their relationships.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod competition;
pub mod competition_score;
pub mod competition_service;
pub mod inject;
pub mod inject_submission;
pub mod regex_check;
pub mod scoring_box;
pub mod service;
pub mod service_check;
pub mod team;
pub mod team_member;
pub mod user;

// Re-export specific types to avoid conflicts
pub use competition::{
    Column as CompetitionColumn, CompetitionStatus, Entity as Competition,
    Model as CompetitionModel,
};
pub use competition_score::{
    Column as CompetitionScoreColumn, Entity as CompetitionScore, Model as CompetitionScoreModel,
};
pub use competition_service::{
    Column as CompetitionServiceColumn, Entity as CompetitionService,
    Model as CompetitionServiceModel,
};
pub use inject::{Column as InjectColumn, Entity as Inject, Model as InjectModel};
pub use inject_submission::{
    Column as InjectSubmissionColumn, Entity as InjectSubmission, Model as InjectSubmissionModel,
};
pub use regex_check::{Column as RegexCheckColumn, Entity as RegexCheck, Model as RegexCheckModel};
pub use scoring_box::{Column as ScoringBoxColumn, Entity as ScoringBox, Model as ScoringBoxModel};
pub use service::{Column as ServiceColumn, Entity as Service, Model as ServiceModel};
pub use service_check::{
    Column as ServiceCheckColumn, Entity as ServiceCheck, Model as ServiceCheckModel,
};
pub use team::{Column as TeamColumn, Entity as Team, Model as TeamModel};
pub use team_member::{Column as TeamMemberColumn, Entity as TeamMember, Model as TeamMemberModel};
pub use user::{Column as UserColumn, Entity as User, Model as UserModel};
