//! OpenAPI documentation for the archive API.

use utoipa::{
    openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    Modify, OpenApi,
};

use crate::api;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_token",
                SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Bearer).bearer_format("JWT").build()),
            );
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    modifiers(&SecurityAddon),
    paths(
        api::handlers::auth::register,
        api::handlers::auth::login,
        api::handlers::auth::me,
        api::handlers::documents::create_document,
        api::handlers::documents::list_documents,
        api::handlers::documents::get_document,
        api::handlers::documents::download_document,
        api::handlers::documents::update_document,
        api::handlers::documents::delete_document,
        api::handlers::documents::document_stats,
        api::handlers::annotations::list_annotations,
        api::handlers::annotations::create_annotation,
        api::handlers::annotations::update_annotation,
        api::handlers::annotations::delete_annotation,
        api::handlers::users::list_users,
        api::handlers::users::get_user,
        api::handlers::users::update_user_access,
        api::handlers::users::user_stats,
        api::handlers::feedback::create_feedback,
        api::handlers::feedback::list_feedback,
        api::handlers::feedback::update_feedback_status,
        api::handlers::feedback::delete_feedback,
    ),
    components(schemas(
        api::models::auth::LoginRequest,
        api::models::auth::LoginResponse,
        api::models::auth::RegisterRequest,
        api::models::auth::RegisterResponse,
        api::models::users::Role,
        api::models::users::AccountStatus,
        api::models::users::UserResponse,
        api::models::users::UserAccessUpdate,
        api::models::users::UserStatsResponse,
        api::models::documents::Category,
        api::models::documents::AccessLevel,
        api::models::documents::DocumentResponse,
        api::models::documents::DocumentUpdate,
        api::models::documents::DocumentStatsResponse,
        api::models::annotations::AnnotationKind,
        api::models::annotations::AnnotationResponse,
        api::models::annotations::AnnotationCreate,
        api::models::annotations::AnnotationUpdate,
        api::models::feedback::FeedbackCategory,
        api::models::feedback::FeedbackStatus,
        api::models::feedback::FeedbackResponse,
        api::models::feedback::FeedbackCreate,
        api::models::feedback::FeedbackStatusUpdate,
    )),
    tags(
        (name = "auth", description = "Registration, login, and the current profile"),
        (name = "documents", description = "Archive document management and access"),
        (name = "annotations", description = "Scholarly annotations on documents"),
        (name = "users", description = "Account approval and suspension"),
        (name = "feedback", description = "Visitor feedback and triage"),
    )
)]
pub struct ApiDoc;
