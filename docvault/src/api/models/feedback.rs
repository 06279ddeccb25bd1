//! API request/response models for archive-improvement feedback.

use crate::db::models::feedback::FeedbackDBResponse;
use crate::types::FeedbackId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, ToSchema)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum FeedbackCategory {
    Suggestion,
    Issue,
    Compliment,
    Question,
    Other,
}

/// Triage state. `New` is initial; `Reviewed` is terminal, and transitions
/// only move forward.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, ToSchema)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum FeedbackStatus {
    New,
    Reviewed,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct FeedbackResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: FeedbackId,
    pub submitter_name: Option<String>,
    pub submitter_email: Option<String>,
    pub subject: String,
    pub message: String,
    pub category: FeedbackCategory,
    pub status: FeedbackStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<FeedbackDBResponse> for FeedbackResponse {
    fn from(db: FeedbackDBResponse) -> Self {
        Self {
            id: db.id,
            submitter_name: db.submitter_name,
            submitter_email: db.submitter_email,
            subject: db.subject,
            message: db.message,
            category: db.category,
            status: db.status,
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}

/// Body of `POST /feedback`. Submitter identity is optional; feedback is
/// accepted from unauthenticated visitors.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct FeedbackCreate {
    pub name: Option<String>,
    pub email: Option<String>,
    pub subject: String,
    pub message: String,
    pub category: FeedbackCategory,
}

/// Body of `PUT /feedback/{id}`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct FeedbackStatusUpdate {
    pub status: FeedbackStatus,
}
