//! `SeaORM` Entity for the validation_records table.
//!
//! One immutable row per decision; rows are never updated or deleted.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use super::sea_orm_active_enums::DecisionOutcome;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "validation_records")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub request_id: Uuid,
    pub level: i16,
    pub validator_id: Uuid,
    pub outcome: DecisionOutcome,
    pub comment: Option<String>,
    pub decided_at: DateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::fuel_requests::Entity",
        from = "Column::RequestId",
        to = "super::fuel_requests::Column::Id"
    )]
    FuelRequests,
    #[sea_orm(
        belongs_to = "super::users::Entity",
        from = "Column::ValidatorId",
        to = "super::users::Column::Id"
    )]
    Users,
}

impl Related<super::fuel_requests::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::FuelRequests.def()
    }
}

impl Related<super::users::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Users.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
