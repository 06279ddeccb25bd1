use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::{
    api::models::{
        feedback::{FeedbackCreate, FeedbackResponse, FeedbackStatus, FeedbackStatusUpdate},
        users::Identity,
    },
    auth::{
        current_user::MaybeIdentity,
        policy::{can, Action},
    },
    db::{
        handlers::{Feedback, FeedbackFilter, Repository},
        models::feedback::{FeedbackCreateDBRequest, FeedbackUpdateDBRequest},
    },
    errors::Error,
    types::FeedbackId,
    AppState,
};

fn require_triage(identity: &Identity) -> Result<(), Error> {
    if !can(Some(identity), &Action::TriageFeedback) {
        return Err(Error::Forbidden {
            action: "triage feedback",
            resource: "feedback".to_string(),
        });
    }
    Ok(())
}

/// Submit feedback. Open to everyone, including unauthenticated visitors,
/// but a suspended or pending account may not submit under its credentials.
#[utoipa::path(
    post,
    path = "/feedback",
    tag = "feedback",
    request_body = FeedbackCreate,
    responses(
        (status = 201, description = "Feedback recorded", body = FeedbackResponse),
        (status = 400, description = "Invalid input"),
        (status = 403, description = "Account is not active"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn create_feedback(
    State(state): State<AppState>,
    MaybeIdentity(identity): MaybeIdentity,
    Json(request): Json<FeedbackCreate>,
) -> Result<(StatusCode, Json<FeedbackResponse>), Error> {
    if identity.is_some() && !can(identity.as_ref(), &Action::SubmitFeedback) {
        return Err(Error::Forbidden {
            action: "submit feedback",
            resource: "feedback".to_string(),
        });
    }

    if request.subject.trim().is_empty() {
        return Err(Error::Validation {
            message: "Subject must not be empty".to_string(),
        });
    }
    if request.message.trim().is_empty() {
        return Err(Error::Validation {
            message: "Message must not be empty".to_string(),
        });
    }

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let feedback = Feedback::new(&mut conn)
        .create(&FeedbackCreateDBRequest {
            submitter_name: request.name.filter(|n| !n.trim().is_empty()),
            submitter_email: request.email.filter(|e| !e.trim().is_empty()),
            subject: request.subject,
            message: request.message,
            category: request.category,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(FeedbackResponse::from(feedback))))
}

/// List the feedback inbox, newest first.
#[utoipa::path(
    get,
    path = "/feedback",
    tag = "feedback",
    responses(
        (status = 200, description = "All feedback", body = Vec<FeedbackResponse>),
        (status = 403, description = "Only archivists can read the inbox"),
    ),
    security(("bearer_token" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn list_feedback(State(state): State<AppState>, identity: Identity) -> Result<Json<Vec<FeedbackResponse>>, Error> {
    require_triage(&identity)?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let feedback = Feedback::new(&mut conn).list(&FeedbackFilter).await?;

    Ok(Json(feedback.into_iter().map(FeedbackResponse::from).collect()))
}

/// Mark a submission as reviewed.
///
/// Triage only moves forward: marking an already-reviewed submission
/// reviewed again succeeds without effect, but a reviewed submission can
/// never go back to new.
#[utoipa::path(
    put,
    path = "/feedback/{id}",
    tag = "feedback",
    request_body = FeedbackStatusUpdate,
    params(("id" = uuid::Uuid, Path, description = "Feedback ID")),
    responses(
        (status = 200, description = "Updated submission", body = FeedbackResponse),
        (status = 400, description = "Illegal status transition"),
        (status = 403, description = "Only archivists can triage feedback"),
        (status = 404, description = "Feedback not found"),
    ),
    security(("bearer_token" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn update_feedback_status(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<FeedbackId>,
    Json(request): Json<FeedbackStatusUpdate>,
) -> Result<Json<FeedbackResponse>, Error> {
    require_triage(&identity)?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Feedback::new(&mut conn);

    let feedback = repo.get_by_id(id).await?.ok_or(Error::NotFound {
        resource: "feedback",
        id: id.to_string(),
    })?;

    if feedback.status == request.status {
        return Ok(Json(FeedbackResponse::from(feedback)));
    }
    if feedback.status == FeedbackStatus::Reviewed && request.status == FeedbackStatus::New {
        return Err(Error::Validation {
            message: "Reviewed feedback cannot be reopened".to_string(),
        });
    }

    let updated = repo.update(id, &FeedbackUpdateDBRequest { status: request.status }).await?;

    Ok(Json(FeedbackResponse::from(updated)))
}

/// Remove a submission from the inbox.
#[utoipa::path(
    delete,
    path = "/feedback/{id}",
    tag = "feedback",
    params(("id" = uuid::Uuid, Path, description = "Feedback ID")),
    responses(
        (status = 204, description = "Feedback deleted"),
        (status = 403, description = "Only archivists can delete feedback"),
        (status = 404, description = "Feedback not found"),
    ),
    security(("bearer_token" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn delete_feedback(State(state): State<AppState>, identity: Identity, Path(id): Path<FeedbackId>) -> Result<StatusCode, Error> {
    require_triage(&identity)?;

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let deleted = Feedback::new(&mut conn).delete(id).await?;
    if !deleted {
        return Err(Error::NotFound {
            resource: "feedback",
            id: id.to_string(),
        });
    }

    Ok(StatusCode::NO_CONTENT)
}
