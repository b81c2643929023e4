use std::fmt;

use super::{car, car_driver};
use sea_orm::entity::prelude::*;

/// A user account extended with a driving license number.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "drivers")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub username: String,
    pub first_name: String,
    pub last_name: String,
    /// Argon2 PHC string; never the plain credential.
    pub password_hash: String,
    /// Must satisfy `crate::license::is_valid` at creation and update time.
    #[sea_orm(unique)]
    pub license_number: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::car_driver::Entity")]
    CarDriver,
}

impl Related<car::Entity> for Entity {
    fn to() -> RelationDef {
        car_driver::Relation::Car.def()
    }
    fn via() -> Option<RelationDef> {
        Some(car_driver::Relation::Driver.def().rev())
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl fmt::Display for Model {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} {})", self.username, self.first_name, self.last_name)
    }
}
