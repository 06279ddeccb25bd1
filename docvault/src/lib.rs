//! docvault: a role-gated digital archive service.
//!
//! The archive stores scanned documents with tiered access levels, lets
//! researchers annotate them, collects visitor feedback, and gates new
//! accounts behind an archivist approval workflow.
//!
//! # Architecture
//!
//! - **[`api`]**: axum handlers and request/response models
//! - **[`auth`]**: JWT sessions, Argon2 passwords, and the access policy
//! - **[`db`]**: SQLite repositories and record models
//! - **[`config`]**: YAML + environment configuration via figment
//!
//! # Usage
//!
//! ```no_run
//! use clap::Parser;
//! use docvault::{config::{Args, Config}, Application};
//!
//! # async fn run() -> anyhow::Result<()> {
//! let args = Args::parse();
//! let config = Config::load(&args)?;
//! let app = Application::new(config).await?;
//! app.serve(async { tokio::signal::ctrl_c().await.ok(); }).await?;
//! # Ok(())
//! # }
//! ```

use std::str::FromStr;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post, put},
    Json, Router,
};
use bon::Builder;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    SqlitePool,
};
use tokio::net::TcpListener;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::{debug, info, instrument, Level};
use utoipa::OpenApi;

pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod errors;
pub mod openapi;
pub mod telemetry;
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
pub mod types;

use crate::{
    api::models::users::{AccountStatus, Role},
    auth::password,
    config::Config,
    db::{handlers::Users, models::users::UserCreateDBRequest},
    types::UserId,
};

/// Shared application state passed to all request handlers.
#[derive(Clone, Builder)]
pub struct AppState {
    pub db: SqlitePool,
    pub config: Config,
}

/// Get the docvault database migrator
pub fn migrator() -> sqlx::migrate::Migrator {
    sqlx::migrate!("./migrations")
}

/// Create the initial archivist account if it doesn't exist.
///
/// Idempotent: creates an active archivist on first startup, or updates the
/// password of the existing account when one is provided. Called during
/// application startup so the approval workflow always has an approver.
#[instrument(skip_all)]
pub async fn create_initial_archivist(email: &str, password: Option<&str>, db: &SqlitePool) -> anyhow::Result<UserId> {
    let password_hash = match password {
        Some(pwd) => Some(password::hash_string(pwd).map_err(|e| anyhow::anyhow!("Failed to hash archivist password: {e}"))?),
        None => None,
    };

    let mut conn = db.acquire().await?;
    let mut user_repo = Users::new(&mut conn);

    if let Some(existing) = user_repo.get_by_email(email).await? {
        if password_hash.is_some() {
            user_repo
                .update(
                    existing.id,
                    &db::models::users::UserUpdateDBRequest {
                        password_hash,
                        ..Default::default()
                    },
                )
                .await?;
        }
        return Ok(existing.id);
    }

    let created = user_repo
        .create(&UserCreateDBRequest {
            email: email.to_string(),
            display_name: "Archivist".to_string(),
            role: Role::Archivist,
            status: AccountStatus::Active,
            organization: None,
            password_hash,
        })
        .await?;

    info!(email, "Created initial archivist account");
    Ok(created.id)
}

/// Connect to the database, run migrations, and seed the initial archivist.
#[instrument(skip_all)]
pub async fn setup_database(config: &Config) -> anyhow::Result<SqlitePool> {
    let options = SqliteConnectOptions::from_str(&config.database_url)?
        .create_if_missing(true)
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new().max_connections(5).connect_with(options).await?;
    migrator().run(&pool).await?;

    create_initial_archivist(&config.archivist_email, config.archivist_password.as_deref(), &pool).await?;

    Ok(pool)
}

/// Build the application router with all endpoints and middleware.
pub fn build_router(state: AppState) -> Router {
    let upload_limit = state.config.limits.max_upload_bytes;

    let router = Router::new()
        .route("/healthz", get(|| async { "OK" }))
        .route("/api-docs/openapi.json", get(|| async { Json(openapi::ApiDoc::openapi()) }))
        // Auth
        .route("/auth/register", post(api::handlers::auth::register))
        .route("/auth/login", post(api::handlers::auth::login))
        .route("/auth/me", get(api::handlers::auth::me))
        // Documents. The body limit covers the configured file size plus
        // multipart framing overhead.
        .route(
            "/documents",
            get(api::handlers::documents::list_documents)
                .post(api::handlers::documents::create_document)
                .layer(DefaultBodyLimit::max(upload_limit + 64 * 1024)),
        )
        .route("/documents/stats/overview", get(api::handlers::documents::document_stats))
        .route(
            "/documents/{id}",
            get(api::handlers::documents::get_document)
                .put(api::handlers::documents::update_document)
                .delete(api::handlers::documents::delete_document),
        )
        .route("/documents/{id}/download", get(api::handlers::documents::download_document))
        // Annotations. GET takes a document id and lists its annotations;
        // PUT and DELETE take an annotation id.
        .route("/annotations", post(api::handlers::annotations::create_annotation))
        .route(
            "/annotations/{id}",
            get(api::handlers::annotations::list_annotations)
                .put(api::handlers::annotations::update_annotation)
                .delete(api::handlers::annotations::delete_annotation),
        )
        // Users
        .route("/users", get(api::handlers::users::list_users))
        .route("/users/stats/overview", get(api::handlers::users::user_stats))
        .route("/users/{id}", get(api::handlers::users::get_user))
        .route("/users/{id}/access", put(api::handlers::users::update_user_access))
        // Feedback
        .route(
            "/feedback",
            post(api::handlers::feedback::create_feedback).get(api::handlers::feedback::list_feedback),
        )
        .route(
            "/feedback/{id}",
            put(api::handlers::feedback::update_feedback_status).delete(api::handlers::feedback::delete_feedback),
        )
        .with_state(state);

    router.layer(CorsLayer::permissive()).layer(
        TraceLayer::new_for_http()
            .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
            .on_request(DefaultOnRequest::new().level(Level::INFO))
            .on_response(DefaultOnResponse::new().level(Level::INFO)),
    )
}

/// A fully initialized application ready to serve.
pub struct Application {
    router: Router,
    config: Config,
    pool: SqlitePool,
}

impl Application {
    /// Create a new application instance with all resources initialized
    pub async fn new(config: Config) -> anyhow::Result<Self> {
        debug!("Starting docvault with configuration: {:#?}", config);

        let pool = setup_database(&config).await?;

        let state = AppState::builder().db(pool.clone()).config(config.clone()).build();
        let router = build_router(state);

        Ok(Self { router, config, pool })
    }

    /// Start serving the application
    pub async fn serve<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let bind_addr = self.config.bind_address();
        let listener = TcpListener::bind(&bind_addr).await?;
        info!("docvault listening on http://{}", bind_addr);

        axum::serve(listener, self.router.into_make_service())
            .with_graceful_shutdown(shutdown)
            .await?;

        info!("Closing database connections...");
        self.pool.close().await;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::models::users::Identity;
    use crate::test_utils::{create_test_app, upload_document, TEST_PASSWORD};
    use axum::http::StatusCode;
    use serde_json::{json, Value};

    #[sqlx::test]
    #[test_log::test]
    async fn test_initial_archivist_is_idempotent(pool: SqlitePool) {
        let first = create_initial_archivist("keeper@archive.org", Some("hunter22"), &pool).await.unwrap();
        let second = create_initial_archivist("keeper@archive.org", Some("changed-password"), &pool)
            .await
            .unwrap();
        assert_eq!(first, second);

        let mut conn = pool.acquire().await.unwrap();
        let user = Users::new(&mut conn).get_by_email("keeper@archive.org").await.unwrap().unwrap();
        assert_eq!(user.role, Role::Archivist);
        assert_eq!(user.status, AccountStatus::Active);
        // Password was rotated on the second call
        assert!(password::verify_string("changed-password", user.password_hash.as_deref().unwrap()).unwrap());
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_healthz(pool: SqlitePool) {
        let server = create_test_app(pool);
        let response = server.get("/healthz").await;
        response.assert_status_ok();
        assert_eq!(response.text(), "OK");
    }

    // The full lifecycle: register, sit pending, get approved, work, and
    // watch the access tiers hold at every step.
    #[sqlx::test]
    #[test_log::test]
    async fn test_registration_approval_and_access_flow(pool: SqlitePool) {
        let server = create_test_app(pool.clone());
        let archivist_id = create_initial_archivist("keeper@archive.org", Some(TEST_PASSWORD), &pool).await.unwrap();

        // Archivist logs in and stocks the archive
        let login: Value = server
            .post("/auth/login")
            .json(&json!({"email": "keeper@archive.org", "password": TEST_PASSWORD}))
            .await
            .json();
        let archivist_token = login["token"].as_str().unwrap().to_string();
        upload_document(&server, &archivist_token, "Town Charter", "public").await;
        upload_document(&server, &archivist_token, "Harbor Census", "restricted").await;

        // A visitor registers a public account
        let registered: Value = server
            .post("/auth/register")
            .json(&json!({
                "email": "visitor@example.com",
                "password": TEST_PASSWORD,
                "name": "Visitor",
                "role": "public",
            }))
            .await
            .json();
        assert_eq!(registered["user"]["status"], "pending");
        let visitor_id = registered["user"]["id"].as_str().unwrap().to_string();

        // Pending accounts cannot log in
        let response = server
            .post("/auth/login")
            .json(&json!({"email": "visitor@example.com", "password": TEST_PASSWORD}))
            .await;
        response.assert_status(StatusCode::FORBIDDEN);

        // The archivist approves the account
        server
            .put(&format!("/users/{visitor_id}/access"))
            .authorization_bearer(&archivist_token)
            .json(&json!({"status": "active"}))
            .await
            .assert_status_ok();

        // Now login works and the public tier applies
        let login: Value = server
            .post("/auth/login")
            .json(&json!({"email": "visitor@example.com", "password": TEST_PASSWORD}))
            .await
            .json();
        let visitor_token = login["token"].as_str().unwrap().to_string();

        let docs: Value = server.get("/documents").authorization_bearer(&visitor_token).await.json();
        let titles: Vec<_> = docs.as_array().unwrap().iter().map(|d| d["title"].as_str().unwrap()).collect();
        assert_eq!(titles, vec!["Town Charter"]);

        // Anonymous feedback still works throughout
        server
            .post("/feedback")
            .json(&json!({"subject": "Hours", "message": "When are you open?", "category": "question"}))
            .await
            .assert_status(StatusCode::CREATED);

        // Sanity: the archivist account used above is the seeded one
        let me: Value = server.get("/auth/me").authorization_bearer(&archivist_token).await.json();
        let identity: Identity = serde_json::from_value(me.clone()).unwrap();
        assert_eq!(identity.id, archivist_id);
    }
}
