//! `SeaORM` Entity for the vehicles table.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "vehicles")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    #[sea_orm(unique)]
    pub plate_number: String,
    pub vehicle_type_id: Uuid,
    pub model: Option<String>,
    pub year: Option<i32>,
    pub is_active: bool,
    pub created_at: DateTimeWithTimeZone,
    pub updated_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::vehicle_types::Entity",
        from = "Column::VehicleTypeId",
        to = "super::vehicle_types::Column::Id"
    )]
    VehicleTypes,
    #[sea_orm(has_many = "super::fuel_requests::Entity")]
    FuelRequests,
}

impl Related<super::vehicle_types::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::VehicleTypes.def()
    }
}

impl Related<super::fuel_requests::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::FuelRequests.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
