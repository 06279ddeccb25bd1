use axum::{extract::State, http::StatusCode, Json};

use crate::{
    api::models::{
        auth::{LoginRequest, LoginResponse, RegisterRequest, RegisterResponse},
        users::{AccountStatus, Identity, Role, UserResponse},
    },
    auth::{
        password,
        policy::{can, Action},
        session,
    },
    db::{
        handlers::Users,
        models::users::UserCreateDBRequest,
    },
    errors::Error,
    AppState,
};

fn validate_password(password: &str, config: &crate::config::Config) -> Result<(), Error> {
    let password_config = &config.auth.password;
    if password.len() < password_config.min_length {
        return Err(Error::Validation {
            message: format!("Password must be at least {} characters", password_config.min_length),
        });
    }
    if password.len() > password_config.max_length {
        return Err(Error::Validation {
            message: format!("Password must be no more than {} characters", password_config.max_length),
        });
    }
    Ok(())
}

async fn hash_password(password: String) -> Result<String, Error> {
    tokio::task::spawn_blocking(move || password::hash_string(&password))
        .await
        .map_err(|e| Error::Internal {
            operation: format!("spawn password hashing task: {e}"),
        })?
}

/// Register a new account.
///
/// New accounts start pending and cannot do anything until an archivist
/// approves them, so no session token is issued here.
#[utoipa::path(
    post,
    path = "/auth/register",
    request_body = RegisterRequest,
    tag = "auth",
    responses(
        (status = 201, description = "Account registered, awaiting approval", body = RegisterResponse),
        (status = 400, description = "Invalid input"),
        (status = 409, description = "An account with this email already exists"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn register(State(state): State<AppState>, Json(request): Json<RegisterRequest>) -> Result<(StatusCode, Json<RegisterResponse>), Error> {
    let email = request.email.trim().to_lowercase();
    if email.is_empty() || !email.contains('@') {
        return Err(Error::Validation {
            message: "A valid email address is required".to_string(),
        });
    }
    if request.name.trim().is_empty() {
        return Err(Error::Validation {
            message: "Display name must not be empty".to_string(),
        });
    }
    // Archivists are provisioned at deployment or promoted by hand, never
    // self-registered
    if request.role == Role::Archivist {
        return Err(Error::Validation {
            message: "Only researcher and public accounts can be registered".to_string(),
        });
    }
    validate_password(&request.password, &state.config)?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut user_repo = Users::new(&mut conn);

    if user_repo.get_by_email(&email).await?.is_some() {
        return Err(Error::Conflict {
            message: "An account with this email address already exists".to_string(),
        });
    }

    // Hash on a blocking thread to avoid stalling the async runtime
    let password_hash = hash_password(request.password).await?;

    let created_user = user_repo
        .create(&UserCreateDBRequest {
            email,
            display_name: request.name.trim().to_string(),
            role: request.role,
            status: AccountStatus::Pending,
            organization: request.organization,
            password_hash: Some(password_hash),
        })
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            user: UserResponse::from(created_user),
            message: "Registration received. An archivist must approve the account before login.".to_string(),
        }),
    ))
}

/// Login with email and password.
///
/// The password is verified before the account status is checked, so a
/// pending or suspended response never reveals whether a guessed password
/// was correct.
#[utoipa::path(
    post,
    path = "/auth/login",
    request_body = LoginRequest,
    tag = "auth",
    responses(
        (status = 200, description = "Login successful", body = LoginResponse),
        (status = 401, description = "Invalid credentials"),
        (status = 403, description = "Account pending approval or suspended"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn login(State(state): State<AppState>, Json(request): Json<LoginRequest>) -> Result<Json<LoginResponse>, Error> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut user_repo = Users::new(&mut conn);

    let user = user_repo
        .get_by_email(request.email.trim().to_lowercase().as_str())
        .await?
        .ok_or_else(|| Error::Unauthenticated {
            message: Some("Invalid email or password".to_string()),
        })?;

    let password_hash = user.password_hash.clone().ok_or_else(|| Error::Unauthenticated {
        message: Some("Invalid email or password".to_string()),
    })?;

    // Verify on a blocking thread to avoid stalling the async runtime
    let password = request.password;
    let is_valid = tokio::task::spawn_blocking(move || password::verify_string(&password, &password_hash))
        .await
        .map_err(|e| Error::Internal {
            operation: format!("spawn password verification task: {e}"),
        })??;

    if !is_valid {
        return Err(Error::Unauthenticated {
            message: Some("Invalid email or password".to_string()),
        });
    }

    match user.status {
        AccountStatus::Pending => return Err(Error::AccountPending),
        AccountStatus::Suspended => return Err(Error::AccountSuspended),
        AccountStatus::Active => {}
    }

    let identity = Identity::from(user.clone());
    let token = session::create_session_token(&identity, &state.config)?;

    Ok(Json(LoginResponse {
        token,
        user: UserResponse::from(user),
    }))
}

/// The authenticated caller's own profile.
///
/// This is the one endpoint a pending or suspended account can still reach
/// with a valid token.
#[utoipa::path(
    get,
    path = "/auth/me",
    tag = "auth",
    responses(
        (status = 200, description = "Current user profile", body = UserResponse),
        (status = 401, description = "Not authenticated"),
    ),
    security(("bearer_token" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn me(State(state): State<AppState>, identity: Identity) -> Result<Json<UserResponse>, Error> {
    if !can(Some(&identity), &Action::ReadOwnProfile { user_id: identity.id }) {
        return Err(Error::Forbidden {
            action: "read profile",
            resource: identity.id.to_string(),
        });
    }

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let user = Users::new(&mut conn)
        .get_by_id(identity.id)
        .await?
        .ok_or(Error::Unauthenticated { message: None })?;

    Ok(Json(UserResponse::from(user)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{create_test_app, create_test_user, login_token, register_body};
    use serde_json::{json, Value};
    use sqlx::SqlitePool;

    #[sqlx::test]
    #[test_log::test]
    async fn test_register_creates_pending_account(pool: SqlitePool) {
        let server = create_test_app(pool.clone());

        let response = server
            .post("/auth/register")
            .json(&register_body("scholar@example.com", Role::Researcher))
            .await;
        response.assert_status(StatusCode::CREATED);

        let body: Value = response.json();
        assert_eq!(body["user"]["email"], "scholar@example.com");
        assert_eq!(body["user"]["status"], "pending");
        // No token until approved
        assert!(body.get("token").is_none());
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_register_rejects_archivist_role(pool: SqlitePool) {
        let server = create_test_app(pool.clone());

        let response = server
            .post("/auth/register")
            .json(&register_body("boss@example.com", Role::Archivist))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);

        let body: Value = response.json();
        assert_eq!(body["error"], "validation_failed");
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_register_duplicate_email_conflicts(pool: SqlitePool) {
        let server = create_test_app(pool.clone());
        let body = register_body("dup@example.com", Role::Public);

        server.post("/auth/register").json(&body).await.assert_status(StatusCode::CREATED);
        let response = server.post("/auth/register").json(&body).await;
        response.assert_status(StatusCode::CONFLICT);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_register_short_password(pool: SqlitePool) {
        let server = create_test_app(pool.clone());

        let response = server
            .post("/auth/register")
            .json(&json!({
                "email": "short@example.com",
                "password": "tiny",
                "name": "Shorty",
                "role": "public",
            }))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_login_happy_path(pool: SqlitePool) {
        let server = create_test_app(pool.clone());
        let user = create_test_user(&pool, Role::Researcher, AccountStatus::Active).await;

        let response = server
            .post("/auth/login")
            .json(&json!({"email": user.email, "password": crate::test_utils::TEST_PASSWORD}))
            .await;
        response.assert_status_ok();

        let body: Value = response.json();
        assert!(!body["token"].as_str().unwrap().is_empty());
        assert_eq!(body["user"]["email"], user.email.as_str());
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_login_wrong_password_is_generic_401(pool: SqlitePool) {
        let server = create_test_app(pool.clone());
        let user = create_test_user(&pool, Role::Researcher, AccountStatus::Active).await;

        let response = server
            .post("/auth/login")
            .json(&json!({"email": user.email, "password": "not-the-password"}))
            .await;
        response.assert_status(StatusCode::UNAUTHORIZED);

        // Unknown email gives the identical error kind and message
        let unknown = server
            .post("/auth/login")
            .json(&json!({"email": "ghost@example.com", "password": "whatever"}))
            .await;
        unknown.assert_status(StatusCode::UNAUTHORIZED);

        let a: Value = response.json();
        let b: Value = unknown.json();
        assert_eq!(a, b);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_login_pending_and_suspended_are_distinguishable(pool: SqlitePool) {
        let server = create_test_app(pool.clone());
        let pending = create_test_user(&pool, Role::Researcher, AccountStatus::Pending).await;
        let suspended = create_test_user(&pool, Role::Researcher, AccountStatus::Suspended).await;

        let response = server
            .post("/auth/login")
            .json(&json!({"email": pending.email, "password": crate::test_utils::TEST_PASSWORD}))
            .await;
        response.assert_status(StatusCode::FORBIDDEN);
        let body: Value = response.json();
        assert_eq!(body["error"], "account_pending");

        let response = server
            .post("/auth/login")
            .json(&json!({"email": suspended.email, "password": crate::test_utils::TEST_PASSWORD}))
            .await;
        response.assert_status(StatusCode::FORBIDDEN);
        let body: Value = response.json();
        assert_eq!(body["error"], "account_suspended");
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_login_status_never_leaks_for_wrong_password(pool: SqlitePool) {
        let server = create_test_app(pool.clone());
        let suspended = create_test_user(&pool, Role::Researcher, AccountStatus::Suspended).await;

        // Wrong password on a suspended account: generic 401, not 403
        let response = server
            .post("/auth/login")
            .json(&json!({"email": suspended.email, "password": "wrong"}))
            .await;
        response.assert_status(StatusCode::UNAUTHORIZED);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_me_works_for_pending_accounts(pool: SqlitePool) {
        let server = create_test_app(pool.clone());
        let user = create_test_user(&pool, Role::Researcher, AccountStatus::Pending).await;
        let token = login_token(&user);

        let response = server.get("/auth/me").authorization_bearer(&token).await;
        response.assert_status_ok();

        let body: Value = response.json();
        assert_eq!(body["email"], user.email.as_str());
        assert_eq!(body["status"], "pending");
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_me_requires_auth(pool: SqlitePool) {
        let server = create_test_app(pool.clone());
        server.get("/auth/me").await.assert_status(StatusCode::UNAUTHORIZED);
    }
}
