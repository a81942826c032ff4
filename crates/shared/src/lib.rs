//! Shared types and configuration for FuelFlow.
//!
//! This crate provides common types used across all other crates:
//! - Configuration management
//! - JWT claims and token handling
//! - Authentication request/response payloads

pub mod auth;
pub mod config;
pub mod jwt;

pub use auth::{Claims, LoginRequest, LoginResponse, RegisterRequest, TokenType, UserInfo};
pub use config::AppConfig;
pub use jwt::{JwtConfig, JwtError, JwtService};
