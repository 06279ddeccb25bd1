//! API layer for HTTP request handling and data models.
//!
//! This module contains the REST API implementation, organized into:
//!
//! - **[`handlers`]**: Axum route handlers for all API endpoints
//! - **[`models`]**: Request/response data structures for API communication
//!
//! # API Structure
//!
//! - **Auth** (`/auth/*`): registration, login, current profile
//! - **Documents** (`/documents/*`): upload, listing, metadata, download, stats
//! - **Annotations** (`/annotations/*`): listing per document, create, edit, delete
//! - **Users** (`/users/*`): account listing, approval, suspension, stats
//! - **Feedback** (`/feedback/*`): open submission and archivist triage
//!
//! # OpenAPI Documentation
//!
//! All endpoints are documented with OpenAPI annotations using `utoipa`; the
//! generated document is served at `/api-docs/openapi.json`.

pub mod handlers;
pub mod models;
