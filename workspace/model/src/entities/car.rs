use std::fmt;

use super::{car_driver, driver, manufacturer};
use sea_orm::entity::prelude::*;

/// A vehicle in the fleet. References its manufacturer and carries a
/// many-to-many set of assigned drivers through `cars_drivers`.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "cars")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub model: String,
    pub manufacturer_id: i32,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::manufacturer::Entity",
        from = "Column::ManufacturerId",
        to = "super::manufacturer::Column::Id"
    )]
    Manufacturer,
    #[sea_orm(has_many = "super::car_driver::Entity")]
    CarDriver,
}

impl Related<manufacturer::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Manufacturer.def()
    }
}

impl Related<driver::Entity> for Entity {
    fn to() -> RelationDef {
        car_driver::Relation::Driver.def()
    }
    fn via() -> Option<RelationDef> {
        Some(car_driver::Relation::Car.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl fmt::Display for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.model)
    }
}
