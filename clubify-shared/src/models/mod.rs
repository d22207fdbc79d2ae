/// Database models for Clubify
///
/// Each submodule owns one collection: its record type, the input structs
/// used to create or change it, and the SQL that reads and writes it.
///
/// # Models
///
/// - `user`: Accounts and roles
/// - `club`: Clubs, their members and the default-club resolver
/// - `task`: Tasks assigned by leads, with notes
/// - `event`: Club events and attendees
/// - `product`: Items a club sells
/// - `sale`: Recorded sales
/// - `proposal`: Member proposals and their review trail
/// - `message`: Internal messages between users
///
/// References to other records are returned "populated": a user reference
/// becomes a [`UserSummary`], a club reference a [`ClubSummary`].

pub mod club;
pub mod event;
pub mod message;
pub mod product;
pub mod proposal;
pub mod sale;
pub mod task;
pub mod user;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use self::user::UserRole;

/// Urgency shared by tasks, proposals and messages
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "priority_level", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
    Urgent,
}

/// Populated user reference
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSummary {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub role: UserRole,
}

/// Populated club reference
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClubSummary {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub name: String,
}

/// SQL fragment selecting a user as `{prefix}_id, {prefix}_name, ...`
///
/// Joined queries use it so that row structs can rebuild a [`UserSummary`].
pub(crate) fn user_columns(alias: &str, prefix: &str) -> String {
    format!(
        "{alias}.id AS {prefix}_id, {alias}.name AS {prefix}_name, \
         {alias}.email AS {prefix}_email, {alias}.role AS {prefix}_role"
    )
}
