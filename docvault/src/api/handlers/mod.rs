//! HTTP request handlers for all API endpoints.
//!
//! Each handler validates and deserializes the request, checks the caller's
//! permissions through [`crate::auth::policy`], runs the business logic via
//! the database repositories, and serializes the response.
//!
//! # Handler Modules
//!
//! - [`annotations`]: annotation creation, listing, editing, and deletion
//! - [`auth`]: registration, login, and the current profile
//! - [`documents`]: document upload, listing, metadata, download, and stats
//! - [`feedback`]: open feedback submission and archivist triage
//! - [`users`]: account listing and the approval workflow
//!
//! # Error Handling
//!
//! Handlers return [`crate::errors::Error`] which converts to the
//! appropriate HTTP status code and JSON error body.

pub mod annotations;
pub mod auth;
pub mod documents;
pub mod feedback;
pub mod users;
