//! Database repository for feedback submissions.

use crate::db::{
    errors::{DbError, Result},
    handlers::repository::Repository,
    models::feedback::{FeedbackCreateDBRequest, FeedbackDBResponse, FeedbackUpdateDBRequest},
};
use crate::types::{abbrev_uuid, FeedbackId};
use chrono::Utc;
use sqlx::SqliteConnection;
use tracing::instrument;
use uuid::Uuid;

/// Feedback triage has no query parameters; the whole inbox is listed.
#[derive(Debug, Clone, Copy, Default)]
pub struct FeedbackFilter;

pub struct Feedback<'c> {
    db: &'c mut SqliteConnection,
}

impl<'c> Feedback<'c> {
    pub fn new(db: &'c mut SqliteConnection) -> Self {
        Self { db }
    }
}

#[async_trait::async_trait]
impl<'c> Repository for Feedback<'c> {
    type CreateRequest = FeedbackCreateDBRequest;
    type UpdateRequest = FeedbackUpdateDBRequest;
    type Response = FeedbackDBResponse;
    type Id = FeedbackId;
    type Filter = FeedbackFilter;

    #[instrument(skip(self, request), fields(category = ?request.category), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let feedback_id = Uuid::new_v4();
        let now = Utc::now();

        let feedback = sqlx::query_as::<_, FeedbackDBResponse>(
            r#"
            INSERT INTO feedback (id, submitter_name, submitter_email, subject, message, category, status, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, 'new', ?, ?)
            RETURNING *
            "#,
        )
        .bind(feedback_id)
        .bind(&request.submitter_name)
        .bind(&request.submitter_email)
        .bind(&request.subject)
        .bind(&request.message)
        .bind(request.category)
        .bind(now)
        .bind(now)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(feedback)
    }

    #[instrument(skip(self), fields(feedback_id = %abbrev_uuid(&id)), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let feedback = sqlx::query_as::<_, FeedbackDBResponse>("SELECT * FROM feedback WHERE id = ?")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(feedback)
    }

    /// Newest first, so fresh submissions surface at the top of the inbox.
    #[instrument(skip(self, _filter), err)]
    async fn list(&mut self, _filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        let feedback = sqlx::query_as::<_, FeedbackDBResponse>("SELECT * FROM feedback ORDER BY created_at DESC, id DESC")
            .fetch_all(&mut *self.db)
            .await?;

        Ok(feedback)
    }

    #[instrument(skip(self, request), fields(feedback_id = %abbrev_uuid(&id)), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let feedback = sqlx::query_as::<_, FeedbackDBResponse>(
            "UPDATE feedback SET status = ?, updated_at = ? WHERE id = ? RETURNING *",
        )
        .bind(request.status)
        .bind(Utc::now())
        .bind(id)
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or(DbError::NotFound)?;

        Ok(feedback)
    }

    #[instrument(skip(self), fields(feedback_id = %abbrev_uuid(&id)), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let result = sqlx::query("DELETE FROM feedback WHERE id = ?")
            .bind(id)
            .execute(&mut *self.db)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}
