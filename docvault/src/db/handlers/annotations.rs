//! Database repository for annotations.

use crate::db::{
    errors::{DbError, Result},
    handlers::repository::Repository,
    models::annotations::{AnnotationCreateDBRequest, AnnotationDBResponse, AnnotationUpdateDBRequest},
};
use crate::types::{abbrev_uuid, AnnotationId, DocumentId};
use chrono::Utc;
use sqlx::SqliteConnection;
use tracing::instrument;
use uuid::Uuid;

/// Annotations are listed per document.
#[derive(Debug, Clone, Copy)]
pub struct AnnotationFilter {
    pub document_id: DocumentId,
}

pub struct Annotations<'c> {
    db: &'c mut SqliteConnection,
}

impl<'c> Annotations<'c> {
    pub fn new(db: &'c mut SqliteConnection) -> Self {
        Self { db }
    }
}

#[async_trait::async_trait]
impl<'c> Repository for Annotations<'c> {
    type CreateRequest = AnnotationCreateDBRequest;
    type UpdateRequest = AnnotationUpdateDBRequest;
    type Response = AnnotationDBResponse;
    type Id = AnnotationId;
    type Filter = AnnotationFilter;

    #[instrument(skip(self, request), fields(document_id = %abbrev_uuid(&request.document_id)), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let annotation_id = Uuid::new_v4();

        let annotation = sqlx::query_as::<_, AnnotationDBResponse>(
            r#"
            INSERT INTO annotations (id, document_id, user_id, content, kind, page, created_at)
            VALUES (?, ?, ?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(annotation_id)
        .bind(request.document_id)
        .bind(request.user_id)
        .bind(&request.content)
        .bind(request.kind)
        .bind(request.page)
        .bind(Utc::now())
        .fetch_one(&mut *self.db)
        .await?;

        Ok(annotation)
    }

    #[instrument(skip(self), fields(annotation_id = %abbrev_uuid(&id)), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let annotation = sqlx::query_as::<_, AnnotationDBResponse>("SELECT * FROM annotations WHERE id = ?")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(annotation)
    }

    /// Oldest first, so a document's margin reads like a conversation.
    #[instrument(skip(self, filter), fields(document_id = %abbrev_uuid(&filter.document_id)), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let annotations = sqlx::query_as::<_, AnnotationDBResponse>(
            "SELECT * FROM annotations WHERE document_id = ? ORDER BY created_at ASC, id ASC",
        )
        .bind(filter.document_id)
        .fetch_all(&mut *self.db)
        .await?;

        Ok(annotations)
    }

    #[instrument(skip(self, request), fields(annotation_id = %abbrev_uuid(&id)), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let annotation = sqlx::query_as::<_, AnnotationDBResponse>(
            "UPDATE annotations SET content = ? WHERE id = ? RETURNING *",
        )
        .bind(&request.content)
        .bind(id)
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or(DbError::NotFound)?;

        Ok(annotation)
    }

    #[instrument(skip(self), fields(annotation_id = %abbrev_uuid(&id)), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM annotations WHERE id = ?")
            .bind(id)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
