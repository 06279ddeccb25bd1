//! Database record structures matching table schemas.

pub mod annotations;
pub mod documents;
pub mod feedback;
pub mod users;
