//! Repositories over the archive tables.
//!
//! Each repository borrows a connection for its lifetime, so a handler can
//! run several repositories against one pooled connection or transaction.

pub mod annotations;
pub mod documents;
pub mod feedback;
pub mod repository;
pub mod users;

pub use annotations::{AnnotationFilter, Annotations};
pub use documents::{DocumentFilter, Documents};
pub use feedback::{Feedback, FeedbackFilter};
pub use repository::Repository;
pub use users::Users;
