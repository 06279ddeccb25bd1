use axum::{
    extract::{Multipart, Path, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use std::str::FromStr;

use crate::{
    api::models::documents::{
        AccessLevel, Category, DocumentResponse, DocumentStatsResponse, DocumentUpdate, ListDocumentsQuery,
    },
    auth::{
        current_user::MaybeIdentity,
        policy::{can, readable_levels, Action},
    },
    db::{
        handlers::{DocumentFilter, Documents, Repository},
        models::documents::{DocumentCreateDBRequest, DocumentUpdateDBRequest},
    },
    errors::Error,
    types::DocumentId,
    AppState,
};
use crate::api::models::users::Identity;

fn document_not_found(id: DocumentId) -> Error {
    Error::NotFound {
        resource: "document",
        id: id.to_string(),
    }
}

/// The parsed multipart form for a document upload.
#[derive(Debug, Default)]
struct UploadForm {
    title: Option<String>,
    description: Option<String>,
    category: Option<String>,
    tags: Option<String>,
    access_level: Option<String>,
    file_name: Option<String>,
    mime_type: Option<String>,
    file_data: Option<Vec<u8>>,
}

async fn read_upload_form(mut multipart: Multipart, max_upload_bytes: usize) -> Result<UploadForm, Error> {
    let mut form = UploadForm::default();

    while let Some(field) = multipart.next_field().await.map_err(|e| Error::Validation {
        message: format!("Malformed multipart body: {e}"),
    })? {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };

        match name.as_str() {
            "file" => {
                form.file_name = field.file_name().map(str::to_string);
                form.mime_type = field.content_type().map(str::to_string);
                let data = field.bytes().await.map_err(|e| Error::Validation {
                    message: format!("Failed to read uploaded file: {e}"),
                })?;
                if data.len() > max_upload_bytes {
                    return Err(Error::Validation {
                        message: format!("Uploaded file exceeds the {max_upload_bytes} byte limit"),
                    });
                }
                form.file_data = Some(data.to_vec());
            }
            other => {
                let value = field.text().await.map_err(|e| Error::Validation {
                    message: format!("Malformed multipart field '{other}': {e}"),
                })?;
                match other {
                    "title" => form.title = Some(value),
                    "description" => form.description = Some(value),
                    "category" => form.category = Some(value),
                    "tags" => form.tags = Some(value),
                    "access_level" => form.access_level = Some(value),
                    _ => {
                        return Err(Error::Validation {
                            message: format!("Unknown form field '{other}'"),
                        })
                    }
                }
            }
        }
    }

    Ok(form)
}

fn require_field<T>(value: Option<T>, name: &str) -> Result<T, Error> {
    value.ok_or_else(|| Error::Validation {
        message: format!("Missing required field '{name}'"),
    })
}

/// Upload a new document.
#[utoipa::path(
    post,
    path = "/documents",
    tag = "documents",
    request_body(content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Document created", body = DocumentResponse),
        (status = 400, description = "Invalid input"),
        (status = 403, description = "Only archivists can upload documents"),
    ),
    security(("bearer_token" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn create_document(
    State(state): State<AppState>,
    identity: Identity,
    multipart: Multipart,
) -> Result<(StatusCode, Json<DocumentResponse>), Error> {
    if !can(Some(&identity), &Action::CreateDocument) {
        return Err(Error::Forbidden {
            action: "upload document",
            resource: "documents".to_string(),
        });
    }

    let form = read_upload_form(multipart, state.config.limits.max_upload_bytes).await?;

    let title = require_field(form.title, "title")?.trim().to_string();
    if title.is_empty() {
        return Err(Error::Validation {
            message: "Title must not be empty".to_string(),
        });
    }
    let description = require_field(form.description, "description")?.trim().to_string();
    if description.is_empty() {
        return Err(Error::Validation {
            message: "Description must not be empty".to_string(),
        });
    }
    let category = Category::from_str(&require_field(form.category, "category")?).map_err(|message| Error::Validation { message })?;
    let access_level =
        AccessLevel::from_str(&require_field(form.access_level, "access_level")?).map_err(|message| Error::Validation { message })?;
    let file_data = require_field(form.file_data, "file")?;
    if file_data.is_empty() {
        return Err(Error::Validation {
            message: "Uploaded file must not be empty".to_string(),
        });
    }
    let file_name = form.file_name.unwrap_or_else(|| "upload.bin".to_string());

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let document = Documents::new(&mut conn)
        .create(&DocumentCreateDBRequest {
            title,
            description,
            category,
            tags: form.tags,
            access_level,
            uploaded_by: identity.id,
            file_name,
            mime_type: form.mime_type,
            file_data,
        })
        .await?;

    Ok((StatusCode::CREATED, Json(DocumentResponse::from(document))))
}

/// List documents visible to the caller.
#[utoipa::path(
    get,
    path = "/documents",
    tag = "documents",
    params(ListDocumentsQuery),
    responses(
        (status = 200, description = "Documents the caller may read", body = Vec<DocumentResponse>),
        (status = 403, description = "Account is not active"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn list_documents(
    State(state): State<AppState>,
    MaybeIdentity(identity): MaybeIdentity,
    Query(query): Query<ListDocumentsQuery>,
) -> Result<Json<Vec<DocumentResponse>>, Error> {
    let levels = readable_levels(identity.as_ref());
    // An authenticated but non-active account is refused outright rather
    // than shown an empty archive
    if identity.is_some() && levels.is_empty() {
        return Err(Error::Forbidden {
            action: "list documents",
            resource: "documents".to_string(),
        });
    }

    let category = match query.category.as_deref() {
        None | Some("all") | Some("") => None,
        Some(raw) => Some(Category::from_str(raw).map_err(|message| Error::Validation { message })?),
    };

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let documents = Documents::new(&mut conn)
        .list(&DocumentFilter {
            levels,
            search: query.search,
            category,
        })
        .await?;

    Ok(Json(documents.into_iter().map(DocumentResponse::from).collect()))
}

/// Fetch one document's metadata, counting the view.
///
/// A document the caller is not allowed to read is reported as missing, so
/// its existence never leaks through this endpoint.
#[utoipa::path(
    get,
    path = "/documents/{id}",
    tag = "documents",
    params(("id" = uuid::Uuid, Path, description = "Document ID")),
    responses(
        (status = 200, description = "Document metadata", body = DocumentResponse),
        (status = 404, description = "Document missing or not readable"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn get_document(
    State(state): State<AppState>,
    MaybeIdentity(identity): MaybeIdentity,
    Path(id): Path<DocumentId>,
) -> Result<Json<DocumentResponse>, Error> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Documents::new(&mut conn);

    let document = repo.get_by_id(id).await?.ok_or_else(|| document_not_found(id))?;
    if !can(identity.as_ref(), &Action::ReadDocument(document.access_level)) {
        return Err(document_not_found(id));
    }

    // Count the view only once the read is allowed
    let document = repo.increment_view_count(id).await?.ok_or_else(|| document_not_found(id))?;

    Ok(Json(DocumentResponse::from(document)))
}

/// Download a document's stored file.
///
/// Downloads do not increment the view counter; only metadata reads do.
#[utoipa::path(
    get,
    path = "/documents/{id}/download",
    tag = "documents",
    params(("id" = uuid::Uuid, Path, description = "Document ID")),
    responses(
        (status = 200, description = "File contents", content_type = "application/octet-stream"),
        (status = 404, description = "Document missing or not readable"),
    )
)]
#[tracing::instrument(skip_all)]
pub async fn download_document(
    State(state): State<AppState>,
    MaybeIdentity(identity): MaybeIdentity,
    Path(id): Path<DocumentId>,
) -> Result<impl IntoResponse, Error> {
    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let mut repo = Documents::new(&mut conn);

    let document = repo.get_by_id(id).await?.ok_or_else(|| document_not_found(id))?;
    if !can(identity.as_ref(), &Action::ReadDocument(document.access_level)) {
        return Err(document_not_found(id));
    }

    let data = repo.get_file_data(id).await?.ok_or_else(|| document_not_found(id))?;

    let content_type = document.mime_type.unwrap_or_else(|| "application/octet-stream".to_string());
    let disposition = format!("attachment; filename=\"{}\"", document.file_name.replace('"', ""));

    Ok((
        [
            (header::CONTENT_TYPE, content_type),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        data,
    ))
}

/// Update document metadata.
#[utoipa::path(
    put,
    path = "/documents/{id}",
    tag = "documents",
    request_body = DocumentUpdate,
    params(("id" = uuid::Uuid, Path, description = "Document ID")),
    responses(
        (status = 200, description = "Updated document", body = DocumentResponse),
        (status = 403, description = "Only archivists can edit documents"),
        (status = 404, description = "Document not found"),
    ),
    security(("bearer_token" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn update_document(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<DocumentId>,
    Json(update): Json<DocumentUpdate>,
) -> Result<Json<DocumentResponse>, Error> {
    if !can(Some(&identity), &Action::UpdateDocument) {
        return Err(Error::Forbidden {
            action: "update document",
            resource: id.to_string(),
        });
    }

    if let Some(title) = &update.title {
        if title.trim().is_empty() {
            return Err(Error::Validation {
                message: "Title must not be empty".to_string(),
            });
        }
    }
    if let Some(description) = &update.description {
        if description.trim().is_empty() {
            return Err(Error::Validation {
                message: "Description must not be empty".to_string(),
            });
        }
    }

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let document = Documents::new(&mut conn)
        .update(
            id,
            &DocumentUpdateDBRequest {
                title: update.title,
                description: update.description,
                category: update.category,
                tags: update.tags,
                access_level: update.access_level,
            },
        )
        .await
        .map_err(|e| match e {
            crate::db::errors::DbError::NotFound => document_not_found(id),
            other => Error::Database(other),
        })?;

    Ok(Json(DocumentResponse::from(document)))
}

/// Delete a document and all of its annotations.
#[utoipa::path(
    delete,
    path = "/documents/{id}",
    tag = "documents",
    params(("id" = uuid::Uuid, Path, description = "Document ID")),
    responses(
        (status = 204, description = "Document deleted"),
        (status = 403, description = "Only archivists can delete documents"),
        (status = 404, description = "Document not found"),
    ),
    security(("bearer_token" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn delete_document(
    State(state): State<AppState>,
    identity: Identity,
    Path(id): Path<DocumentId>,
) -> Result<StatusCode, Error> {
    if !can(Some(&identity), &Action::DeleteDocument) {
        return Err(Error::Forbidden {
            action: "delete document",
            resource: id.to_string(),
        });
    }

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let deleted = Documents::new(&mut conn).delete(id).await?;
    if !deleted {
        return Err(document_not_found(id));
    }

    Ok(StatusCode::NO_CONTENT)
}

/// Aggregate document statistics.
#[utoipa::path(
    get,
    path = "/documents/stats/overview",
    tag = "documents",
    responses(
        (status = 200, description = "Archive statistics", body = DocumentStatsResponse),
        (status = 403, description = "Only archivists can view statistics"),
    ),
    security(("bearer_token" = []))
)]
#[tracing::instrument(skip_all)]
pub async fn document_stats(State(state): State<AppState>, identity: Identity) -> Result<Json<DocumentStatsResponse>, Error> {
    if !can(Some(&identity), &Action::ViewDocumentStats) {
        return Err(Error::Forbidden {
            action: "view document statistics",
            resource: "documents".to_string(),
        });
    }

    let mut conn = state.db.acquire().await.map_err(|e| Error::Database(e.into()))?;
    let stats = Documents::new(&mut conn).stats().await?;

    Ok(Json(DocumentStatsResponse {
        total_documents: stats.total_documents,
        public_documents: stats.public_documents,
        total_views: stats.total_views,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::models::users::{AccountStatus, Role};
    use crate::test_utils::{create_test_app, create_test_user, login_token, upload_document};
    use axum_test::multipart::{MultipartForm, Part};
    use serde_json::Value;
    use sqlx::SqlitePool;

    #[sqlx::test]
    #[test_log::test]
    async fn test_upload_requires_archivist(pool: SqlitePool) {
        let server = create_test_app(pool.clone());
        let researcher = create_test_user(&pool, Role::Researcher, AccountStatus::Active).await;
        let token = login_token(&researcher);

        let response = server
            .post("/documents")
            .authorization_bearer(&token)
            .multipart(crate::test_utils::document_form("Charter", "public"))
            .await;
        response.assert_status(StatusCode::FORBIDDEN);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_upload_requires_description(pool: SqlitePool) {
        let server = create_test_app(pool.clone());
        let archivist = create_test_user(&pool, Role::Archivist, AccountStatus::Active).await;
        let token = login_token(&archivist);

        let form = |description: Option<&str>| {
            let mut form = MultipartForm::new()
                .add_text("title", "Charter")
                .add_text("category", "historical")
                .add_text("access_level", "public");
            if let Some(description) = description {
                form = form.add_text("description", description.to_string());
            }
            form.add_part(
                "file",
                Part::bytes(crate::test_utils::TEST_FILE_BYTES.to_vec())
                    .file_name("scan.pdf")
                    .mime_type("application/pdf"),
            )
        };

        // Blank and missing descriptions are both rejected
        let response = server.post("/documents").authorization_bearer(&token).multipart(form(Some(" "))).await;
        response.assert_status(StatusCode::BAD_REQUEST);

        let response = server.post("/documents").authorization_bearer(&token).multipart(form(None)).await;
        response.assert_status(StatusCode::BAD_REQUEST);

        let response = server
            .post("/documents")
            .authorization_bearer(&token)
            .multipart(form(Some("A town charter from 1815.")))
            .await;
        response.assert_status(StatusCode::CREATED);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_update_cannot_blank_title_or_description(pool: SqlitePool) {
        let server = create_test_app(pool.clone());
        let archivist = create_test_user(&pool, Role::Archivist, AccountStatus::Active).await;
        let token = login_token(&archivist);

        let created = upload_document(&server, &token, "Minutes", "public").await;
        let id = created["id"].as_str().unwrap();

        let response = server
            .put(&format!("/documents/{id}"))
            .authorization_bearer(&token)
            .json(&serde_json::json!({"description": ""}))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);

        let response = server
            .put(&format!("/documents/{id}"))
            .authorization_bearer(&token)
            .json(&serde_json::json!({"title": "  "}))
            .await;
        response.assert_status(StatusCode::BAD_REQUEST);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_upload_and_fetch(pool: SqlitePool) {
        let server = create_test_app(pool.clone());
        let archivist = create_test_user(&pool, Role::Archivist, AccountStatus::Active).await;
        let token = login_token(&archivist);

        let created = upload_document(&server, &token, "Town Charter", "public").await;
        assert_eq!(created["view_count"], 0);

        let id = created["id"].as_str().unwrap();
        let response = server.get(&format!("/documents/{id}")).await;
        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["title"], "Town Charter");
        // Each metadata read counts one view
        assert_eq!(body["view_count"], 1);

        let again: Value = server.get(&format!("/documents/{id}")).await.json();
        assert_eq!(again["view_count"], 2);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_restricted_document_is_hidden_not_forbidden(pool: SqlitePool) {
        let server = create_test_app(pool.clone());
        let archivist = create_test_user(&pool, Role::Archivist, AccountStatus::Active).await;
        let archivist_token = login_token(&archivist);

        let created = upload_document(&server, &archivist_token, "Sealed Will", "confidential").await;
        let id = created["id"].as_str().unwrap();

        // Anonymous caller: 404, not 403
        let response = server.get(&format!("/documents/{id}")).await;
        response.assert_status(StatusCode::NOT_FOUND);

        // Researcher can't see confidential either
        let researcher = create_test_user(&pool, Role::Researcher, AccountStatus::Active).await;
        let response = server
            .get(&format!("/documents/{id}"))
            .authorization_bearer(login_token(&researcher))
            .await;
        response.assert_status(StatusCode::NOT_FOUND);

        // Denied reads never bump the counter
        let body: Value = server
            .get(&format!("/documents/{id}"))
            .authorization_bearer(&archivist_token)
            .await
            .json();
        assert_eq!(body["view_count"], 1);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_listing_respects_role_tiers(pool: SqlitePool) {
        let server = create_test_app(pool.clone());
        let archivist = create_test_user(&pool, Role::Archivist, AccountStatus::Active).await;
        let token = login_token(&archivist);

        upload_document(&server, &token, "Public Charter", "public").await;
        upload_document(&server, &token, "Restricted Census", "restricted").await;
        upload_document(&server, &token, "Confidential Will", "confidential").await;

        // Anonymous sees only public
        let body: Value = server.get("/documents").await.json();
        assert_eq!(body.as_array().unwrap().len(), 1);

        // Researcher sees public + restricted
        let researcher = create_test_user(&pool, Role::Researcher, AccountStatus::Active).await;
        let body: Value = server.get("/documents").authorization_bearer(login_token(&researcher)).await.json();
        assert_eq!(body.as_array().unwrap().len(), 2);

        // Archivist sees all
        let body: Value = server.get("/documents").authorization_bearer(&token).await.json();
        assert_eq!(body.as_array().unwrap().len(), 3);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_listing_rejects_suspended_account(pool: SqlitePool) {
        let server = create_test_app(pool.clone());
        let suspended = create_test_user(&pool, Role::Researcher, AccountStatus::Suspended).await;

        let response = server.get("/documents").authorization_bearer(login_token(&suspended)).await;
        response.assert_status(StatusCode::FORBIDDEN);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_listing_search_and_category(pool: SqlitePool) {
        let server = create_test_app(pool.clone());
        let archivist = create_test_user(&pool, Role::Archivist, AccountStatus::Active).await;
        let token = login_token(&archivist);

        upload_document(&server, &token, "Harbor Ledger", "public").await;
        upload_document(&server, &token, "Court Minutes", "public").await;

        let body: Value = server.get("/documents?search=harbor").await.json();
        assert_eq!(body.as_array().unwrap().len(), 1);

        // "all" disables the category filter
        let body: Value = server.get("/documents?category=all").await.json();
        assert_eq!(body.as_array().unwrap().len(), 2);

        let response = server.get("/documents?category=bogus").await;
        response.assert_status(StatusCode::BAD_REQUEST);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_update_and_delete(pool: SqlitePool) {
        let server = create_test_app(pool.clone());
        let archivist = create_test_user(&pool, Role::Archivist, AccountStatus::Active).await;
        let token = login_token(&archivist);

        let created = upload_document(&server, &token, "Minutes", "public").await;
        let id = created["id"].as_str().unwrap();

        let response = server
            .put(&format!("/documents/{id}"))
            .authorization_bearer(&token)
            .json(&serde_json::json!({"access_level": "restricted"}))
            .await;
        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["access_level"], "restricted");

        // Researchers may not edit
        let researcher = create_test_user(&pool, Role::Researcher, AccountStatus::Active).await;
        let response = server
            .put(&format!("/documents/{id}"))
            .authorization_bearer(login_token(&researcher))
            .json(&serde_json::json!({"title": "Hijacked"}))
            .await;
        response.assert_status(StatusCode::FORBIDDEN);

        let response = server.delete(&format!("/documents/{id}")).authorization_bearer(&token).await;
        response.assert_status(StatusCode::NO_CONTENT);

        let response = server.get(&format!("/documents/{id}")).authorization_bearer(&token).await;
        response.assert_status(StatusCode::NOT_FOUND);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_download(pool: SqlitePool) {
        let server = create_test_app(pool.clone());
        let archivist = create_test_user(&pool, Role::Archivist, AccountStatus::Active).await;
        let token = login_token(&archivist);

        let created = upload_document(&server, &token, "Ledger", "public").await;
        let id = created["id"].as_str().unwrap();

        let response = server.get(&format!("/documents/{id}/download")).await;
        response.assert_status_ok();
        assert_eq!(response.as_bytes().as_ref(), crate::test_utils::TEST_FILE_BYTES);

        // Downloads are not views
        let body: Value = server.get(&format!("/documents/{id}")).await.json();
        assert_eq!(body["view_count"], 1);
    }

    #[sqlx::test]
    #[test_log::test]
    async fn test_stats_requires_archivist(pool: SqlitePool) {
        let server = create_test_app(pool.clone());
        let archivist = create_test_user(&pool, Role::Archivist, AccountStatus::Active).await;
        let token = login_token(&archivist);

        upload_document(&server, &token, "A", "public").await;
        upload_document(&server, &token, "B", "confidential").await;

        let response = server.get("/documents/stats/overview").authorization_bearer(&token).await;
        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["total_documents"], 2);
        assert_eq!(body["public_documents"], 1);

        let researcher = create_test_user(&pool, Role::Researcher, AccountStatus::Active).await;
        let response = server.get("/documents/stats/overview").authorization_bearer(login_token(&researcher)).await;
        response.assert_status(StatusCode::FORBIDDEN);
    }
}
