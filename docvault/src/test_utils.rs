//! Shared helpers for tests.

use axum_test::multipart::{MultipartForm, Part};
use axum_test::TestServer;
use serde_json::{json, Value};
use sqlx::SqlitePool;
use uuid::Uuid;

use crate::{
    api::models::users::{AccountStatus, Identity, Role},
    auth::{
        password::{hash_string_with_params, Argon2Params},
        session,
    },
    build_router,
    config::Config,
    db::{handlers::Users, models::users::UserCreateDBRequest},
    AppState,
};

pub const TEST_PASSWORD: &str = "correct-horse-battery";
pub const TEST_FILE_BYTES: &[u8] = b"%PDF-1.4 test fixture";

pub fn create_test_config() -> Config {
    Config {
        secret_key: Some("test-secret-key-for-jwt".to_string()),
        ..Default::default()
    }
}

/// Spin up the full router against the given pool.
pub fn create_test_app(pool: SqlitePool) -> TestServer {
    let state = AppState::builder().db(pool).config(create_test_config()).build();
    TestServer::new(build_router(state)).expect("Failed to create test server")
}

/// Insert a user with the given role and status, password [`TEST_PASSWORD`].
pub async fn create_test_user(pool: &SqlitePool, role: Role, status: AccountStatus) -> Identity {
    // Cheap hashing parameters; production strength is irrelevant here
    let password_hash = hash_string_with_params(
        TEST_PASSWORD,
        Some(Argon2Params {
            memory_kib: 1024,
            iterations: 1,
            parallelism: 1,
        }),
    )
    .expect("Failed to hash test password");

    let mut conn = pool.acquire().await.expect("Failed to acquire connection");
    let user = Users::new(&mut conn)
        .create(&UserCreateDBRequest {
            email: format!("user-{}@example.com", Uuid::new_v4().simple()),
            display_name: "Test User".to_string(),
            role,
            status,
            organization: None,
            password_hash: Some(password_hash),
        })
        .await
        .expect("Failed to create test user");

    Identity::from(user)
}

/// Mint a session token for a user, signed with the test secret.
pub fn login_token(user: &Identity) -> String {
    session::create_session_token(user, &create_test_config()).expect("Failed to create session token")
}

pub fn register_body(email: &str, role: Role) -> Value {
    json!({
        "email": email,
        "password": TEST_PASSWORD,
        "name": "Test Registrant",
        "role": role,
        "organization": "Test University",
    })
}

/// A well-formed document upload form.
pub fn document_form(title: &str, access_level: &str) -> MultipartForm {
    MultipartForm::new()
        .add_text("title", title.to_string())
        .add_text("description", format!("{title} description"))
        .add_text("category", "historical")
        .add_text("access_level", access_level.to_string())
        .add_part(
            "file",
            Part::bytes(TEST_FILE_BYTES.to_vec())
                .file_name("scan.pdf")
                .mime_type("application/pdf"),
        )
}

/// Upload a document as the given archivist token and return its JSON body.
pub async fn upload_document(server: &TestServer, token: &str, title: &str, access_level: &str) -> Value {
    let response = server
        .post("/documents")
        .authorization_bearer(token)
        .multipart(document_form(title, access_level))
        .await;
    response.assert_status(axum::http::StatusCode::CREATED);
    response.json()
}
