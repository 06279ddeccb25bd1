//! Database repository for users.
//!
//! Users are never hard-deleted, so this repository does not implement the
//! base [`Repository`](super::repository::Repository) trait; it exposes only
//! the operations the approval workflow needs.

use crate::db::{
    errors::{DbError, Result},
    models::users::{UserCreateDBRequest, UserDBResponse, UserStatsDBResponse, UserUpdateDBRequest},
};
use crate::types::{abbrev_uuid, UserId};
use chrono::Utc;
use sqlx::SqliteConnection;
use tracing::instrument;
use uuid::Uuid;

pub struct Users<'c> {
    db: &'c mut SqliteConnection,
}

impl<'c> Users<'c> {
    pub fn new(db: &'c mut SqliteConnection) -> Self {
        Self { db }
    }

    #[instrument(skip(self, request), fields(email = %request.email), err)]
    pub async fn create(&mut self, request: &UserCreateDBRequest) -> Result<UserDBResponse> {
        let user_id = Uuid::new_v4();
        let now = Utc::now();

        let user = sqlx::query_as::<_, UserDBResponse>(
            r#"
            INSERT INTO users (id, email, display_name, role, status, organization, password_hash, created_at, updated_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING *
            "#,
        )
        .bind(user_id)
        .bind(&request.email)
        .bind(&request.display_name)
        .bind(request.role)
        .bind(request.status)
        .bind(&request.organization)
        .bind(&request.password_hash)
        .bind(now)
        .bind(now)
        .fetch_one(&mut *self.db)
        .await?;

        Ok(user)
    }

    #[instrument(skip(self), fields(user_id = %abbrev_uuid(&id)), err)]
    pub async fn get_by_id(&mut self, id: UserId) -> Result<Option<UserDBResponse>> {
        let user = sqlx::query_as::<_, UserDBResponse>("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(user)
    }

    #[instrument(skip(self, email), err)]
    pub async fn get_by_email(&mut self, email: &str) -> Result<Option<UserDBResponse>> {
        let user = sqlx::query_as::<_, UserDBResponse>("SELECT * FROM users WHERE email = ?")
            .bind(email)
            .fetch_optional(&mut *self.db)
            .await?;

        Ok(user)
    }

    #[instrument(skip(self), err)]
    pub async fn list(&mut self) -> Result<Vec<UserDBResponse>> {
        let users = sqlx::query_as::<_, UserDBResponse>("SELECT * FROM users ORDER BY created_at DESC")
            .fetch_all(&mut *self.db)
            .await?;

        Ok(users)
    }

    /// Partial update; fields left `None` in the request keep their value.
    #[instrument(skip(self, request), fields(user_id = %abbrev_uuid(&id)), err)]
    pub async fn update(&mut self, id: UserId, request: &UserUpdateDBRequest) -> Result<UserDBResponse> {
        let user = sqlx::query_as::<_, UserDBResponse>(
            r#"
            UPDATE users SET
                display_name = COALESCE(?, display_name),
                organization = COALESCE(?, organization),
                status = COALESCE(?, status),
                password_hash = COALESCE(?, password_hash),
                updated_at = ?
            WHERE id = ?
            RETURNING *
            "#,
        )
        .bind(&request.display_name)
        .bind(&request.organization)
        .bind(request.status)
        .bind(&request.password_hash)
        .bind(Utc::now())
        .bind(id)
        .fetch_optional(&mut *self.db)
        .await?
        .ok_or(DbError::NotFound)?;

        Ok(user)
    }

    #[instrument(skip(self), err)]
    pub async fn stats(&mut self) -> Result<UserStatsDBResponse> {
        let stats = sqlx::query_as::<_, UserStatsDBResponse>(
            r#"
            SELECT
                COUNT(*) AS total_users,
                COALESCE(SUM(CASE WHEN status = 'pending' THEN 1 ELSE 0 END), 0) AS pending_users,
                COALESCE(SUM(CASE WHEN status = 'active' THEN 1 ELSE 0 END), 0) AS active_users,
                COALESCE(SUM(CASE WHEN status = 'suspended' THEN 1 ELSE 0 END), 0) AS suspended_users
            FROM users
            "#,
        )
        .fetch_one(&mut *self.db)
        .await?;

        Ok(stats)
    }
}
