//! Common type definitions shared across the service.
//!
//! All entity IDs are UUIDs wrapped in type aliases for better type safety:
//!
//! - [`UserId`]: User account identifier
//! - [`DocumentId`]: Archive document identifier
//! - [`AnnotationId`]: Annotation identifier
//! - [`FeedbackId`]: Feedback submission identifier

use uuid::Uuid;

pub type UserId = Uuid;
pub type DocumentId = Uuid;
pub type AnnotationId = Uuid;
pub type FeedbackId = Uuid;

/// Abbreviate a UUID to its first 8 characters for more readable logs and traces
/// Example: "550e8400-e29b-41d4-a716-446655440000" -> "550e8400"
pub fn abbrev_uuid(uuid: &Uuid) -> String {
    uuid.to_string().chars().take(8).collect()
}
