//! Database models for annotations.

use crate::api::models::annotations::AnnotationKind;
use crate::types::{AnnotationId, DocumentId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AnnotationDBResponse {
    pub id: AnnotationId,
    pub document_id: DocumentId,
    pub user_id: UserId,
    pub content: String,
    pub kind: AnnotationKind,
    pub page: Option<i64>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct AnnotationCreateDBRequest {
    pub document_id: DocumentId,
    pub user_id: UserId,
    pub content: String,
    pub kind: AnnotationKind,
    pub page: Option<i64>,
}

/// Only the content is mutable; document and author bindings are fixed at
/// creation.
#[derive(Debug, Clone)]
pub struct AnnotationUpdateDBRequest {
    pub content: String,
}
