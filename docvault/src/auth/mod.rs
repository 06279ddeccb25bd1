//! Authentication and authorization.
//!
//! Authentication is JWT bearer tokens issued by `/auth/login`. The token
//! proves identity only; each request re-reads the user's role and account
//! status from the database, so approvals and suspensions take effect on the
//! next request rather than at token expiry.
//!
//! Authorization is a single pure decision function over (identity, action);
//! see [`policy`].
//!
//! # Modules
//!
//! - [`current_user`]: extractors that resolve the bearer token to an identity
//! - [`password`]: Argon2 password hashing and verification
//! - [`policy`]: the access control matrix
//! - [`session`]: JWT creation and verification

pub mod current_user;
pub mod password;
pub mod policy;
pub mod session;
