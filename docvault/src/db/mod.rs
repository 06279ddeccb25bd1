//! Database layer: repositories, record models, and storage errors.

pub mod errors;
pub mod handlers;
pub mod models;
