//! Core business logic for FuelFlow.
//!
//! This crate contains pure business logic with ZERO web or database dependencies.
//! All domain types, validation rules, and the approval state machine live here.
//!
//! # Modules
//!
//! - `workflow` - Fuel-request approval state machine and role gates
//! - `attachment` - Justification attachment lifecycle
//! - `storage` - Blob storage abstraction for attachments
//! - `auth` - Password hashing

pub mod attachment;
pub mod auth;
pub mod storage;
pub mod workflow;
