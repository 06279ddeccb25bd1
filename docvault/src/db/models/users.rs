//! Database models for users.

use crate::api::models::users::{AccountStatus, Role};
use crate::types::UserId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct UserDBResponse {
    pub id: UserId,
    pub email: String,
    pub display_name: String,
    pub role: Role,
    pub status: AccountStatus,
    pub organization: Option<String>,
    pub password_hash: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct UserCreateDBRequest {
    pub email: String,
    pub display_name: String,
    pub role: Role,
    pub status: AccountStatus,
    pub organization: Option<String>,
    pub password_hash: Option<String>,
}

/// Partial update; `None` fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct UserUpdateDBRequest {
    pub display_name: Option<String>,
    pub organization: Option<String>,
    pub status: Option<AccountStatus>,
    pub password_hash: Option<String>,
}

/// Row shape for `GET /users/stats/overview` aggregation.
#[derive(Debug, Clone, FromRow)]
pub struct UserStatsDBResponse {
    pub total_users: i64,
    pub pending_users: i64,
    pub active_users: i64,
    pub suspended_users: i64,
}
