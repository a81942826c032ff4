//! Middleware for request processing.

pub mod auth;

pub use auth::{auth_middleware, AuthUser};
