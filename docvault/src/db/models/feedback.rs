//! Database models for feedback submissions.

use crate::api::models::feedback::{FeedbackCategory, FeedbackStatus};
use crate::types::FeedbackId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct FeedbackDBResponse {
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

#[derive(Debug, Clone)]
pub struct FeedbackCreateDBRequest {
    pub submitter_name: Option<String>,
    pub submitter_email: Option<String>,
    pub subject: String,
    pub message: String,
    pub category: FeedbackCategory,
}

#[derive(Debug, Clone)]
pub struct FeedbackUpdateDBRequest {
    pub status: FeedbackStatus,
}
