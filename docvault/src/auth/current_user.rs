//! Extractors for the authenticated identity.

use axum::{extract::FromRequestParts, http::request::Parts};
use tracing::{instrument, trace};

use crate::{
    api::models::users::Identity,
    auth::session,
    db::{errors::DbError, handlers::Users},
    errors::{Error, Result},
    AppState,
};

/// Pull the bearer token out of the Authorization header, if any.
fn bearer_token(parts: &Parts) -> Result<Option<&str>> {
    let Some(auth_header) = parts.headers.get(axum::http::header::AUTHORIZATION) else {
        return Ok(None);
    };

    let auth_str = auth_header.to_str().map_err(|e| Error::Unauthenticated {
        message: Some(format!("Invalid authorization header: {e}")),
    })?;

    match auth_str.strip_prefix("Bearer ") {
        Some(token) => Ok(Some(token)),
        None => Err(Error::Unauthenticated {
            message: Some("Authorization header must use the Bearer scheme".to_string()),
        }),
    }
}

/// Resolve a token to a live identity.
///
/// The token only proves who the caller is; role and status come from the
/// users table on every request, so status changes apply to existing
/// sessions immediately.
async fn resolve_identity(token: &str, state: &AppState) -> Result<Identity> {
    let claims = session::verify_session_token(token, &state.config)?;

    let mut conn = state.db.acquire().await.map_err(DbError::from)?;
    let user = Users::new(&mut conn)
        .get_by_id(claims.sub)
        .await?
        .ok_or(Error::Unauthenticated { message: None })?;

    Ok(Identity::from(user))
}

impl FromRequestParts<AppState> for Identity {
    type Rejection = Error;

    #[instrument(skip(parts, state))]
    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        let Some(token) = bearer_token(parts)? else {
            trace!("No authentication credentials found in request");
            return Err(Error::Unauthenticated { message: None });
        };

        resolve_identity(token, state).await
    }
}

/// Optional identity for endpoints that serve both anonymous and
/// authenticated callers. Absent credentials yield `None`; present but
/// invalid credentials are still rejected.
#[derive(Debug, Clone)]
pub struct MaybeIdentity(pub Option<Identity>);

impl FromRequestParts<AppState> for MaybeIdentity {
    type Rejection = Error;

    #[instrument(skip(parts, state))]
    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self> {
        match bearer_token(parts)? {
            Some(token) => Ok(Self(Some(resolve_identity(token, state).await?))),
            None => Ok(Self(None)),
        }
    }
}
