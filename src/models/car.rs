use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// The `cars` table.
///
/// Deleting a car while rentals still reference it is vetoed by
/// `CarService::can_delete_car`; that guard is a capability for the car
/// management layer to invoke, not an automatic hook.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "cars")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    /// Owner of the car.
    pub user_id: i32,

    pub name: String,

    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::user::Entity",
        from = "Column::UserId",
        to = "super::user::Column::Id"
    )]
    User,
}

impl Related<super::user::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::User.def()
    }
}

impl Related<super::rental::Entity> for Entity {
    fn to() -> RelationDef {
        super::rental::Relation::Car.def().rev()
    }
}

impl ActiveModelBehavior for ActiveModel {}
