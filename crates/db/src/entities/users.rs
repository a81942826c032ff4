//! `SeaORM` Entity for the users table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::UserRole;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub email: String,
    pub display_name: String,
    pub role: UserRole,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub is_active: bool,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::fuel_requests::Entity")]
    FuelRequests,
    #[sea_orm(has_many = "super::validation_records::Entity")]
    ValidationRecords,
}

impl Related<super::fuel_requests::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::FuelRequests.def()
    }
}

impl Related<super::validation_records::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::ValidationRecords.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
