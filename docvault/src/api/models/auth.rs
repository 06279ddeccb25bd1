//! API request/response models for authentication.

use crate::api::models::users::{Role, UserResponse};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

/// Successful login: the bearer credential plus the authoritative user record.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct LoginResponse {
    pub token: String,
    pub user: UserResponse,
}

/// Body of `POST /auth/register`.
///
/// Only `researcher` and `public` roles can be requested; archivists are
/// provisioned at startup, never self-registered.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct RegisterRequest {
    pub email: String,
    pub password: String,
    pub name: String,
    pub role: Role,
    pub organization: Option<String>,
}

/// Registration outcome. No token is issued: the account starts `pending`
/// and cannot establish a session until an archivist approves it.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RegisterResponse {
    pub user: UserResponse,
    pub message: String,
}
