//! API request and response data models.
//!
//! These models define the public API contract and are distinct from the
//! database models in [`crate::db::models`], so the API and storage
//! representations can evolve independently. All enum-valued fields are
//! closed tagged variants rejected at deserialization time when outside
//! their set; the service never trusts client-supplied strings.
//!
//! - [`auth`]: Login and registration payloads
//! - [`users`]: Roles, account status, identity, approval workflow
//! - [`documents`]: Document metadata, filters, and aggregates
//! - [`annotations`]: Annotation payloads
//! - [`feedback`]: Feedback submission and triage payloads

pub mod annotations;
pub mod auth;
pub mod documents;
pub mod feedback;
pub mod users;
