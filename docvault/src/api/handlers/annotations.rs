use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};

use crate::{
    api::models::{
        annotations::{AnnotationCreate, AnnotationResponse, AnnotationUpdate},
        users::Identity,
    },
    auth::{
        current_user::MaybeIdentity,
        policy::{can, Action},
    },
    db::{
        handlers::{AnnotationFilter, Annotations, Documents, Repository},
        models::annotations::{AnnotationCreateDBRequest, AnnotationUpdateDBRequest},
    },
    errors::Error,
    types::{AnnotationId, DocumentId},
    AppState,
};

fn document_not_found(id: DocumentId) -> Error {
    Error::NotFound {
        resource: "document",
        id: id.to_string(),
    }
}

fn annotation_not_found(id: AnnotationId) -> Error {
    Error::NotFound {
        resource: "annotation",
        id: id.to_string(),
    }
}

/// List a document's annotations.
///
/// Listing follows document read semantics: a document the caller may not
/// read is reported as missing.
#[utoipa::path(
    get,
    path = "/annotations/{id}",
    tag = "annotations",
    params(("id" = uuid::Uuid, Path, description = "Document ID")),
    responses(
        (status = 200, description = "Annotations in creation order", body = Vec<AnnotationResponse>),
        (status = 404, description = "Document missing or not readable"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn list_annotations(
    State(state): State<AppState>,
    MaybeIdentity(identity): MaybeIdentity,
    Path(document_id): Path<DocumentId>,
) -> Result<Json<Vec<AnnotationResponse>>, Error> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;

    let document = Documents::new(&mut conn)
        .get_by_id(document_id)
        .await?
        .ok_or_else(|| document_not_found(document_id))?;
    if !can(identity.as_ref(), &Action::ReadDocument(document.access_level)) {
        return Err(document_not_found(document_id));
    }

    let annotations = Annotations::new(&mut conn).list(&AnnotationFilter { document_id }).await?;

    Ok(Json(annotations.into_iter().map(AnnotationResponse::from).collect()))
}

/// Create an annotation on a document.
#[utoipa::path(
    post,
    path = "/annotations",
    tag = "annotations",
    request_body = AnnotationCreate,
    responses(
        (status = 201, description = "Annotation created", body = AnnotationResponse),
        (status = 400, description = "Invalid input"),
        (status = 403, description = "Caller may not annotate this document"),
        (status = 404, description = "Document not found"),
    ),
    security(("bearer_token" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn create_annotation(
    State(state): State<AppState>,
    identity: Identity,
    Json(request): Json<AnnotationCreate>,
) -> Result<(StatusCode, Json<AnnotationResponse>), Error> {
    if request.content.trim().is_empty() {
        return Err(Error::Validation {
            message: "Annotation content must not be empty".to_string(),
        });
    }

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;

    let document = Documents::new(&mut conn)
        .get_by_id(request.document_id)
        .await?
        .ok_or_else(|| document_not_found(request.document_id))?;

    if !can(
        Some(&identity),
        &Action::CreateAnnotation {
            document_access: document.access_level,
        },
    ) {
        return Err(Error::Forbidden {
            action: "annotate document",
            resource: request.document_id.to_string(),
        });
    }

    let annotation = Annotations::new(&mut conn)
        .create(&AnnotationCreateDBRequest {
            document_id: request.document_id,
            user_id: identity.id,
            content: request.content,
            kind: request.kind,
            page: request.page,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(AnnotationResponse::from(annotation))))
}

/// Edit an annotation's content.
#[utoipa::path(
    put,
    path = "/annotations/{id}",
    tag = "annotations",
    request_body = AnnotationUpdate,
    params(("id" = uuid::Uuid, Path, description = "Annotation ID")),
    responses(
        (status = 200, description = "Updated annotation", body = AnnotationResponse),
        (status = 403, description = "Only the author or an archivist may edit"),
        (status = 404, description = "Annotation not found"),
    ),
    security(("bearer_token" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn update_annotation(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<AnnotationId>,
    Json(request): Json<AnnotationUpdate>,
) -> Result<Json<AnnotationResponse>, Error> {
    if request.content.trim().is_empty() {
        return Err(Error::Validation {
            message: "Annotation content must not be empty".to_string(),
        });
    }

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Annotations::new(&mut conn);

    let annotation = repo.get_by_id(id).await?.ok_or_else(|| annotation_not_found(id))?;
    if !can(Some(&identity), &Action::ModifyAnnotation { author: annotation.user_id }) {
        return Err(Error::Forbidden {
            action: "edit annotation",
            resource: id.to_string(),
        });
    }

    let updated = repo.update(id, &AnnotationUpdateDBRequest { content: request.content }).await?;

    Ok(Json(AnnotationResponse::from(updated)))
}

/// Delete an annotation.
#[utoipa::path(
    delete,
    path = "/annotations/{id}",
    tag = "annotations",
    params(("id" = uuid::Uuid, Path, description = "Annotation ID")),
    responses(
        (status = 204, description = "Annotation deleted"),
        (status = 403, description = "Only the author or an archivist may delete"),
        (status = 404, description = "Annotation not found"),
    ),
    security(("bearer_token" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn delete_annotation(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<AnnotationId>,
) -> Result<StatusCode, Error> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Annotations::new(&mut conn);

    let annotation = repo.get_by_id(id).await?.ok_or_else(|| annotation_not_found(id))?;
    if !can(Some(&identity), &Action::ModifyAnnotation { author: annotation.user_id }) {
        return Err(Error::Forbidden {
            action: "delete annotation",
            resource: id.to_string(),
        });
    }

    repo.delete(id).await?;

    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::models::users::{AccountStatus, Role};
    use crate::test_utils::{create_test_app, create_test_user, login_token, upload_document};
    use serde_json::{json, Value};
    use sqlx::SqlitePool;

    #[sqlx::test]
    #[test_log::test]
    async fn test_researcher_annotates_restricted_document(pool: SqlitePool) {
        let server = create_test_app(pool.clone());
        let archivist = create_test_user(&pool, Role::Archivist, AccountStatus::Active).await;
        let doc = upload_document(&server, &login_token(&archivist), "Census", "restricted").await;

        let researcher = create_test_user(&pool, Role::Researcher, AccountStatus::Active).await;
        let response = server
            .post("/annotations")
            .authorization_bearer(login_token(&researcher))
            .json(&json!({
                "document_id": doc["id"],
                "content": "See column three for the 1851 figures.",
                "kind": "note",
                "page": 3,
            }))
            .await;
        response.assert_status(StatusCode::CREATED);

        let body: Value = response.json();
        assert_eq!(body["user_id"].as_str().unwrap(), researcher.id.to_string());
        assert_eq!(body["page"], 3);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_annotation_on_unreadable_document_is_forbidden(pool: SqlitePool) {
        let server = create_test_app(pool.clone());
        let archivist = create_test_user(&pool, Role::Archivist, AccountStatus::Active).await;
        let doc = upload_document(&server, &login_token(&archivist), "Sealed Will", "confidential").await;

        let researcher = create_test_user(&pool, Role::Researcher, AccountStatus::Active).await;
        let response = server
            .post("/annotations")
            .authorization_bearer(login_token(&researcher))
            .json(&json!({"document_id": doc["id"], "content": "peek"}))
            .await;
        response.assert_status(StatusCode::FORBIDDEN);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_public_accounts_cannot_annotate(pool: SqlitePool) {
        let server = create_test_app(pool.clone());
        let archivist = create_test_user(&pool, Role::Archivist, AccountStatus::Active).await;
        let doc = upload_document(&server, &login_token(&archivist), "Charter", "public").await;

        let visitor = create_test_user(&pool, Role::Public, AccountStatus::Active).await;
        let response = server
            .post("/annotations")
            .authorization_bearer(login_token(&visitor))
            .json(&json!({"document_id": doc["id"], "content": "nice"}))
            .await;
        response.assert_status(StatusCode::FORBIDDEN);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_kind_defaults_to_note(pool: SqlitePool) {
        let server = create_test_app(pool.clone());
        let archivist = create_test_user(&pool, Role::Archivist, AccountStatus::Active).await;
        let token = login_token(&archivist);
        let doc = upload_document(&server, &token, "Ledger", "public").await;

        let body: Value = server
            .post("/annotations")
            .authorization_bearer(&token)
            .json(&json!({"document_id": doc["id"], "content": "margin note"}))
            .await
            .json();
        assert_eq!(body["kind"], "note");
        assert_eq!(body["page"], Value::Null);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_list_follows_document_visibility(pool: SqlitePool) {
        let server = create_test_app(pool.clone());
        let archivist = create_test_user(&pool, Role::Archivist, AccountStatus::Active).await;
        let token = login_token(&archivist);
        let doc = upload_document(&server, &token, "Sealed Will", "confidential").await;
        let id = doc["id"].as_str().unwrap();

        server
            .post("/annotations")
            .authorization_bearer(&token)
            .json(&json!({"document_id": doc["id"], "content": "internal note"}))
            .await
            .assert_status(StatusCode::CREATED);

        // Anonymous caller gets 404, not an empty list
        let response = server.get(&format!("/annotations/{id}")).await;
        response.assert_status(StatusCode::NOT_FOUND);

        let body: Value = server
            .get(&format!("/annotations/{id}"))
            .authorization_bearer(&token)
            .await
            .json();
        assert_eq!(body.as_array().unwrap().len(), 1);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_edit_is_author_or_archivist_only(pool: SqlitePool) {
        let server = create_test_app(pool.clone());
        let archivist = create_test_user(&pool, Role::Archivist, AccountStatus::Active).await;
        let archivist_token = login_token(&archivist);
        let doc = upload_document(&server, &archivist_token, "Census", "public").await;

        let author = create_test_user(&pool, Role::Researcher, AccountStatus::Active).await;
        let author_token = login_token(&author);
        let created: Value = server
            .post("/annotations")
            .authorization_bearer(&author_token)
            .json(&json!({"document_id": doc["id"], "content": "draft"}))
            .await
            .json();
        let id = created["id"].as_str().unwrap();

        // Another researcher may not edit it
        let other = create_test_user(&pool, Role::Researcher, AccountStatus::Active).await;
        let response = server
            .put(&format!("/annotations/{id}"))
            .authorization_bearer(login_token(&other))
            .json(&json!({"content": "vandalism"}))
            .await;
        response.assert_status(StatusCode::FORBIDDEN);

        // The author may
        let body: Value = server
            .put(&format!("/annotations/{id}"))
            .authorization_bearer(&author_token)
            .json(&json!({"content": "final"}))
            .await
            .json();
        assert_eq!(body["content"], "final");

        // And an archivist may delete anyone's annotation
        let response = server
            .delete(&format!("/annotations/{id}"))
            .authorization_bearer(&archivist_token)
            .await;
        response.assert_status(StatusCode::NO_CONTENT);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_empty_content_rejected(pool: SqlitePool) {
        let server = create_test_app(pool.clone());
        let archivist = create_test_user(&pool, Role::Archivist, AccountStatus::Active).await;
        let token = login_token(&archivist);
        let doc = upload_document(&server, &token, "Charter", "public").await;

        let response = server
            .post("/annotations")
            .authorization_bearer(&token)
            .json(&json!({"document_id": doc["id"], "content": "   "}))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_annotation_requires_auth(pool: SqlitePool) {
        let server = create_test_app(pool.clone());
        let response = server
            .post("/annotations")
            .json(&json!({"document_id": uuid::Uuid::new_v4(), "content": "anon"}))
            .await;
        response.assert_status(StatusCode::UNAUTHORIZED);
    }
}
