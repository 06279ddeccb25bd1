//! API request/response models for annotations.

use crate::db::models::annotations::AnnotationDBResponse;
use crate::types::{AnnotationId, DocumentId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Annotation flavor. `Note` is the default; the set is expected to grow.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, ToSchema)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum AnnotationKind {
    #[default]
    Note,
    Highlight,
    Comment,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AnnotationResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: AnnotationId,
    #[schema(value_type = String, format = "uuid")]
    pub document_id: DocumentId,
    #[schema(value_type = String, format = "uuid")]
    pub user_id: UserId,
    pub content: String,
    pub kind: AnnotationKind,
    pub page: Option<i64>,
    pub created_at: DateTime<Utc>,
}

impl From<AnnotationDBResponse> for AnnotationResponse {
    fn from(db: AnnotationDBResponse) -> Self {
        Self {
            id: db.id,
            document_id: db.document_id,
            user_id: db.user_id,
            content: db.content,
            kind: db.kind,
            page: db.page,
            created_at: db.created_at,
        }
    }
}

/// Body of `POST /annotations`.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct AnnotationCreate {
    #[schema(value_type = String, format = "uuid")]
    pub document_id: DocumentId,
    pub content: String,
    #[serde(default)]
    pub kind: AnnotationKind,
    pub page: Option<i64>,
}

/// Body of `PUT /annotations/{id}`. The author binding is immutable; only
/// the content can change.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct AnnotationUpdate {
    pub content: String,
}
