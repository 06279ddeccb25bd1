//! Database models for archive documents.
//!
//! `DocumentDBResponse` deliberately omits the stored file bytes; listing
//! and metadata reads never drag blobs out of the database.

use crate::api::models::documents::{AccessLevel, Category};
use crate::types::{DocumentId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct DocumentDBResponse {
    pub id: DocumentId,
    pub title: String,
    pub description: String,
    pub category: Category,
    pub tags: Option<String>,
    pub access_level: AccessLevel,
    pub uploaded_by: UserId,
    pub file_name: String,
    pub file_size: i64,
    pub mime_type: Option<String>,
    pub view_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct DocumentCreateDBRequest {
    pub title: String,
    pub description: String,
    pub category: Category,
    pub tags: Option<String>,
    pub access_level: AccessLevel,
    pub uploaded_by: UserId,
    pub file_name: String,
    pub mime_type: Option<String>,
    pub file_data: Vec<u8>,
}

/// Partial update; `None` fields are left untouched.
#[derive(Debug, Clone, Default)]
pub struct DocumentUpdateDBRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<Category>,
    pub tags: Option<String>,
    pub access_level: Option<AccessLevel>,
}

#[derive(Debug, Clone, FromRow)]
pub struct DocumentStatsDBResponse {
    pub total_documents: i64,
    pub public_documents: i64,
    pub total_views: i64,
}
