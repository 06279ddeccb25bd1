use axum::{
    extract::{Path, State},
    Json,
};

use crate::{
    api::models::users::{AccountStatus, Identity, UserAccessUpdate, UserResponse, UserStatsResponse},
    auth::policy::{can, Action},
    db::{handlers::Users, models::users::UserUpdateDBRequest},
    errors::Error,
    types::UserId,
    AppState,
};

fn require_manage_users(identity: &Identity) -> Result<(), Error> {
    if !can(Some(identity), &Action::ManageUsers) {
        return Err(Error::Forbidden {
            action: "manage users",
            resource: "users".to_string(),
        });
    }
    Ok(())
}

/// List all accounts, newest first.
#[utoipa::path(
    get,
    path = "/users",
    tag = "users",
    responses(
        (status = 200, description = "All accounts", body = Vec<UserResponse>),
        (status = 403, description = "Only archivists can list users"),
    ),
    security(("bearer_token" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn list_users(State(state): State<AppState>, identity: Identity) -> Result<Json<Vec<UserResponse>>, Error> {
    require_manage_users(&identity)?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let users = Users::new(&mut conn).list().await?;

    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}

/// Fetch one account.
#[utoipa::path(
    get,
    path = "/users/{id}",
    tag = "users",
    params(("id" = uuid::Uuid, Path, description = "User ID")),
    responses(
        (status = 200, description = "Account", body = UserResponse),
        (status = 403, description = "Only archivists can inspect other accounts"),
        (status = 404, description = "User not found"),
    ),
    security(("bearer_token" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn get_user(State(state): State<AppState>, identity: Identity, Path(id): Path<UserId>) -> Result<Json<UserResponse>, Error> {
    // Reading your own profile is always allowed; everyone else's needs
    // user management rights
    if !can(Some(&identity), &Action::ReadOwnProfile { user_id: id }) {
        require_manage_users(&identity)?;
    }

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let user = Users::new(&mut conn).get_by_id(id).await?.ok_or(Error::NotFound {
        resource: "user",
        id: id.to_string(),
    })?;

    Ok(Json(UserResponse::from(user)))
}

/// The legal status transitions. Repeating the current status is an
/// idempotent no-op; everything else is rejected.
fn check_transition(current: AccountStatus, requested: AccountStatus) -> Result<(), Error> {
    if current == requested {
        return Ok(());
    }
    match (current, requested) {
        (AccountStatus::Pending, AccountStatus::Active) | (AccountStatus::Active, AccountStatus::Suspended) => Ok(()),
        _ => Err(Error::Validation {
            message: format!("Cannot change account status from {current:?} to {requested:?}"),
        }),
    }
}

/// Approve or suspend an account.
#[utoipa::path(
    put,
    path = "/users/{id}/access",
    tag = "users",
    request_body = UserAccessUpdate,
    params(("id" = uuid::Uuid, Path, description = "User ID")),
    responses(
        (status = 200, description = "Updated account", body = UserResponse),
        (status = 400, description = "Illegal status transition"),
        (status = 403, description = "Only archivists can change account status"),
        (status = 404, description = "User not found"),
    ),
    security(("bearer_token" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn update_user_access(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<UserId>,
    Json(request): Json<UserAccessUpdate>,
) -> Result<Json<UserResponse>, Error> {
    require_manage_users(&identity)?;

    if id == identity.id && request.status != AccountStatus::Active {
        return Err(Error::Validation {
            message: "Archivists cannot suspend their own account".to_string(),
        });
    }

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut user_repo = Users::new(&mut conn);

    let user = user_repo.get_by_id(id).await?.ok_or(Error::NotFound {
        resource: "user",
        id: id.to_string(),
    })?;

    check_transition(user.status, request.status)?;

    if user.status == request.status {
        return Ok(Json(UserResponse::from(user)));
    }

    let updated = user_repo
        .update(
            id,
            &UserUpdateDBRequest {
                status: Some(request.status),
                ..Default::default()
            },
        )
        .await?;

    Ok(Json(UserResponse::from(updated)))
}

/// Aggregate account counts for the dashboard.
#[utoipa::path(
    get,
    path = "/users/stats/overview",
    tag = "users",
    responses(
        (status = 200, description = "Account counts by status", body = UserStatsResponse),
        (status = 403, description = "Only archivists can view user statistics"),
    ),
    security(("bearer_token" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn user_stats(State(state): State<AppState>, identity: Identity) -> Result<Json<UserStatsResponse>, Error> {
    require_manage_users(&identity)?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let stats = Users::new(&mut conn).stats().await?;

    Ok(Json(UserStatsResponse {
        total_users: stats.total_users,
        pending_users: stats.pending_users,
        active_users: stats.active_users,
        suspended_users: stats.suspended_users,
    }))
}
