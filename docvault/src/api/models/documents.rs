//! API request/response models for archive documents.

use crate::db::models::documents::DocumentDBResponse;
use crate::types::{DocumentId, UserId};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use utoipa::{IntoParams, ToSchema};

/// Closed document category set. Client-supplied strings outside this set
/// are rejected at the boundary.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, ToSchema)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Category {
    Historical,
    Legal,
    Research,
    Administrative,
    Cultural,
    Other,
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "historical" => Ok(Category::Historical),
            "legal" => Ok(Category::Legal),
            "research" => Ok(Category::Research),
            "administrative" => Ok(Category::Administrative),
            "cultural" => Ok(Category::Cultural),
            "other" => Ok(Category::Other),
            other => Err(format!("'{other}' is not a valid document category")),
        }
    }
}

/// Per-document sensitivity tier gating the minimum role required to read.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, sqlx::Type, PartialEq, Eq, ToSchema)]
#[sqlx(rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum AccessLevel {
    Public,
    Restricted,
    Confidential,
}

impl AccessLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccessLevel::Public => "public",
            AccessLevel::Restricted => "restricted",
            AccessLevel::Confidential => "confidential",
        }
    }
}

impl FromStr for AccessLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "public" => Ok(AccessLevel::Public),
            "restricted" => Ok(AccessLevel::Restricted),
            "confidential" => Ok(AccessLevel::Confidential),
            other => Err(format!("'{other}' is not a valid access level")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DocumentResponse {
    #[schema(value_type = String, format = "uuid")]
    pub id: DocumentId,
    pub title: String,
    pub description: String,
    pub category: Category,
    pub tags: Option<String>,
    pub access_level: AccessLevel,
    #[schema(value_type = String, format = "uuid")]
    pub uploaded_by: UserId,
    pub file_name: String,
    pub file_size: i64,
    pub mime_type: Option<String>,
    pub view_count: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<DocumentDBResponse> for DocumentResponse {
    fn from(db: DocumentDBResponse) -> Self {
        Self {
            id: db.id,
            title: db.title,
            description: db.description,
            category: db.category,
            tags: db.tags,
            access_level: db.access_level,
            uploaded_by: db.uploaded_by,
            file_name: db.file_name,
            file_size: db.file_size,
            mime_type: db.mime_type,
            view_count: db.view_count,
            created_at: db.created_at,
            updated_at: db.updated_at,
        }
    }
}

/// Query parameters for `GET /documents`.
#[derive(Debug, Default, Deserialize, IntoParams, ToSchema)]
pub struct ListDocumentsQuery {
    /// Case-insensitive substring match over title and description
    pub search: Option<String>,

    /// Exact category match; the sentinel "all" (or omission) disables the filter
    pub category: Option<String>,
}

/// Partial update for `PUT /documents/{id}`. Unknown fields are rejected.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[serde(deny_unknown_fields)]
pub struct DocumentUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<Category>,
    pub tags: Option<String>,
    pub access_level: Option<AccessLevel>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct DocumentStatsResponse {
    pub total_documents: i64,
    pub public_documents: i64,
    pub total_views: i64,
}
