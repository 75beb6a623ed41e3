//! Request extractors.

pub mod auth;

pub use auth::{AuthRejection, BearerToken, RequireAdmin, RequireUser};
