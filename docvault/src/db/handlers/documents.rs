//! Database repository for archive documents.

use crate::api::models::documents::{AccessLevel, Category};
use crate::db::{
    errors::{DbError, Result},
    handlers::repository::Repository,
    models::documents::{DocumentCreateDBRequest, DocumentDBResponse, DocumentStatsDBResponse, DocumentUpdateDBRequest},
};
use crate::types::{abbrev_uuid, DocumentId};
use chrono::Utc;
use sqlx::{Connection, SqliteConnection};
use tracing::instrument;
use uuid::Uuid;

/// Metadata columns; the stored file bytes are never selected here.
const DOCUMENT_COLUMNS: &str = "id, title, description, category, tags, access_level, uploaded_by, \
                                file_name, file_size, mime_type, view_count, created_at, updated_at";

/// Filter for listing documents.
///
/// `levels` comes from the authorization policy (`readable_levels`), so the
/// listing query can never expose a document the policy would deny reading.
#[derive(Debug, Clone)]
pub struct DocumentFilter {
    pub levels: Vec<AccessLevel>,
    pub search: Option<String>,
    pub category: Option<Category>,
}

/// Escape LIKE metacharacters so a search term matches them literally.
fn escape_like(term: &str) -> String {
    term.replace('\\', "\\\\").replace('%', "\\%").replace('_', "\\_")
}

pub struct Documents<'c> {
    db: &'c mut SqliteConnection,
}

impl<'c> Documents<'c> {
    pub fn new(db: &'c mut SqliteConnection) -> Self {
        Self { db }
    }

    /// Atomically add 1 to the view count and return the updated metadata.
    ///
    /// The increment is a single UPDATE with an in-place add, so concurrent
    /// reads of the same document cannot lose updates.
    #[instrument(skip(self), fields(document_id = %abbrev_uuid(&id)), err)]
    pub async fn increment_view_count(&mut self, id: DocumentId) -> Result<Option<DocumentDBResponse>> {
        let document = sqlx::query_as::<_, DocumentDBResponse>(&format!(
            "UPDATE documents SET view_count = view_count + 1 WHERE id = ? RETURNING {DOCUMENT_COLUMNS}"
        ))
        .bind(id)
        .fetch_optional(&mut *self.db)
        .await?;

        Ok(document)
    }

    /// Fetch the stored file bytes for one document.
    #[instrument(skip(self), fields(document_id = %abbrev_uuid(&id)), err)]
    pub async fn get_file_data(&mut self, id: DocumentId) -> Result<Option<Vec<u8>>> {
        let data = sqlx::query_scalar::<_, Vec<u8>>("SELECT file_data FROM documents WHERE id = ?")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(data)
    }

    #[instrument(skip(self), err)]
    pub async fn stats(&mut self) -> Result<DocumentStatsDBResponse> {
        let stats = sqlx::query_as::<_, DocumentStatsDBResponse>(
            r#"
            SELECT
                COUNT(*) AS total_documents,
                COALESCE(SUM(CASE WHEN access_level = 'public' THEN 1 ELSE 0 END), 0) AS public_documents,
                COALESCE(SUM(view_count), 0) AS total_views
            FROM documents
            "#,
        )
        .fetch_one(&mut *self.db)
        .await?;

        Ok(stats)
    }
}

#[async_trait::async_trait]
impl<'c> Repository for Documents<'c> {
    type CreateRequest = DocumentCreateDBRequest;
    type UpdateRequest = DocumentUpdateDBRequest;
    type Response = DocumentDBResponse;
    type Id = DocumentId;
    type Filter = DocumentFilter;

    #[instrument(skip(self, request), fields(title = %request.title), err)]
    async fn create(&mut self, request: &Self::CreateRequest) -> Result<Self::Response> {
        let document_id = Uuid::new_v4();
        let now = Utc::now();

        let document = sqlx::query_as::<_, DocumentDBResponse>(&format!(
            r#"
            INSERT INTO documents
                (id, title, description, category, tags, access_level, uploaded_by,
                 file_name, file_size, mime_type, file_data, view_count, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, 0, ?, ?)
            RETURNING {DOCUMENT_COLUMNS}
            "#
        ))
        .bind(document_id)
        .bind(&request.title)
        .bind(&request.description)
        .bind(request.category)
        .bind(&request.tags)
        .bind(request.access_level)
        .bind(request.uploaded_by)
        .bind(&request.file_name)
        .bind(request.file_data.len() as i64)
        .bind(&request.mime_type)
        .bind(&request.file_data)
        .bind(now)
        .bind(now)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(document)
    }

    #[instrument(skip(self), fields(document_id = %abbrev_uuid(&id)), err)]
    async fn get_by_id(&mut self, id: Self::Id) -> Result<Option<Self::Response>> {
        let document = sqlx::query_as::<_, DocumentDBResponse>(&format!("SELECT {DOCUMENT_COLUMNS} FROM documents WHERE id = ?"))
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(document)
    }

    /// Freshly computed per call; results are in insertion order.
    #[instrument(skip(self, filter), fields(levels = filter.levels.len()), err)]
    async fn list(&mut self, filter: &Self::Filter) -> Result<Vec<Self::Response>> {
        if filter.levels.is_empty() {
            return Ok(Vec::new());
        }

        let mut query = sqlx::QueryBuilder::<sqlx::Sqlite>::new(format!(
            "SELECT {DOCUMENT_COLUMNS} FROM documents WHERE access_level IN ("
        ));
        {
            let mut levels = query.separated(", ");
            for level in &filter.levels {
                levels.push_bind(*level);
            }
        }
        query.push(")");

        if let Some(search) = filter.search.as_deref().filter(|s| !s.trim().is_empty()) {
            let pattern = format!("%{}%", escape_like(&search.trim().to_lowercase()));
            query
                .push(" AND (LOWER(title) LIKE ")
                .push_bind(pattern.clone())
                .push(" ESCAPE '\\' OR LOWER(description) LIKE ")
                .push_bind(pattern)
                .push(" ESCAPE '\\')");
        }

        if let Some(category) = filter.category {
            query.push(" AND category = ").push_bind(category);
        }

        query.push(" ORDER BY created_at ASC, id ASC");

        let documents = query
            .build_query_as::<DocumentDBResponse>()
            .fetch_all(&mut *self.db)
            .await?;

        Ok(documents)
    }

    #[instrument(skip(self, request), fields(document_id = %abbrev_uuid(&id)), err)]
    async fn update(&mut self, id: Self::Id, request: &Self::UpdateRequest) -> Result<Self::Response> {
        let document = sqlx::query_as::<_, DocumentDBResponse>(&format!(
            r#"
            UPDATE documents SET
                title = COALESCE(?, title),
                description = COALESCE(?, description),
                category = COALESCE(?, category),
                tags = COALESCE(?, tags),
                access_level = COALESCE(?, access_level),
                updated_at = ?
            WHERE id = ?
            RETURNING {DOCUMENT_COLUMNS}
            "#
        ))
        .bind(&request.title)
        .bind(&request.description)
        .bind(request.category)
        .bind(&request.tags)
        .bind(request.access_level)
        .bind(Utc::now())
        .bind(id)
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or(DbError::NotFound)?;

        Ok(document)
    }

    /// Deleting a document cascades to its annotations in one transaction,
    /// so an annotation can never outlive its document.
    #[instrument(skip(self), fields(document_id = %abbrev_uuid(&id)), err)]
    async fn delete(&mut self, id: Self::Id) -> Result<bool> {
        let mut tx = self.db.begin().await?;

        sqlx::query("DELETE FROM annotations WHERE document_id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;

        let result = sqlx::query("DELETE FROM documents WHERE id = ?").bind(id).execute(&mut *tx).await?;

        tx.commit().await?;

        Ok(result.rows_affected() > 0)
    }
}
