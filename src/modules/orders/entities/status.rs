use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

pub const NOT_ACCEPTED: i32 = 1;
pub const ACCEPT: i32 = 2;
pub const ON_TRANSIT: i32 = 3;
pub const DELIVERED: i32 = 4;

pub fn name(status_id: i32) -> Option<&'static str> {
    match status_id {
        NOT_ACCEPTED => Some("NOT ACCEPTED"),
        ACCEPT => Some("ACCEPT"),
        ON_TRANSIT => Some("ON TRANSIT"),
        DELIVERED => Some("DELIVERED"),
        _ => None,
    }
}

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Deserialize, Serialize)]
#[sea_orm(table_name = "status")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: i32,
    pub name: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::order::Entity")]
    Orders,
}

impl Related<super::order::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Orders.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
