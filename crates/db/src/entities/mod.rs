//! `SeaORM` entity definitions for the fleet schema.

pub mod action_logs;
pub mod attachments;
pub mod fuel_requests;
pub mod sea_orm_active_enums;
pub mod users;
pub mod validation_records;
pub mod vehicle_types;
pub mod vehicles;
