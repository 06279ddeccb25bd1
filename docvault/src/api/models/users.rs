//! API request/response models for users and the approval workflow.

use crate::db::models::users::UserDBResponse;
use crate::types::UserId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Archive role, from least to most privileged.
///
/// - `Public`: read public documents, submit feedback
/// - `Researcher`: additionally read restricted documents and annotate
/// - `Archivist`: full control (uploads, edits, user approval, triage)
#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, ToSchema)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Archivist,
    Researcher,
    Public,
}

/// Account lifecycle state.
///
/// Registration creates `Pending` accounts; an archivist approves them to
/// `Active` and may suspend an active account. `Suspended` is terminal -
/// no return path to `Active` is modeled.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, ToSchema)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum AccountStatus {
    Pending,
    Active,
    Suspended,
}

/// The authenticated identity a request executes as.
///
/// Built by the bearer-token extractor from the session token plus a fresh
/// user-directory lookup, so `role` and `status` always reflect the current
/// database state rather than the snapshot baked into the token. Every
/// authorization decision takes this value explicitly; there is no ambient
/// "current user".
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Identity {
    #[schema(value_type = String, format = "uuid")]
    pub id: UserId,
    pub email: String,
    pub name: String,
    pub role: Role,
    pub status: AccountStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: UserId,
    pub email: String,
    pub name: String,
    pub role: Role,
    pub status: AccountStatus,
    pub organization: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<UserDBResponse> for UserResponse {
    fn from(db: UserDBResponse) -> Self {
        Self {
            id: db.id,
            email: db.email,
            name: db.display_name,
            role: db.role,
            status: db.status,
            organization: db.organization,
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}

impl From<UserDBResponse> for Identity {
    fn from(db: UserDBResponse) -> Self {
        Self {
            id: db.id,
            email: db.email,
            name: db.display_name,
            role: db.role,
            status: db.status,
        }
    }
}

/// Body of `PUT /users/{id}/access`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct UserAccessUpdate {
    pub status: AccountStatus,
}

/// Aggregate counts for the archivist dashboard.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserStatsResponse {
    pub total_users: i64,
    pub pending_users: i64,
    pub active_users: i64,
    pub suspended_users: i64,
}
