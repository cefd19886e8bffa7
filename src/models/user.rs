use chrono::{DateTime, Utc};
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// The `users` table.
///
/// Carries two denormalized counter caches: `rentals_count` (rentals owned)
/// and `renter_rentals_count` (rentals claimed as the renter). Both are
/// maintained by the rental save/destroy pipelines via direct column writes,
/// not recomputed from source of truth.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,

    pub name: String,

    pub email: String,

    /// Counter cache: rentals this user owns.
    pub rentals_count: i32,

    /// Counter cache: rentals this user has claimed as renter.
    pub renter_rentals_count: i32,

    pub created_at: DateTime<Utc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl Related<super::rental::Entity> for Entity {
    fn to() -> RelationDef {
        super::rental::Relation::User.def().rev()
    }
}

impl Related<super::car::Entity> for Entity {
    fn to() -> RelationDef {
        super::car::Relation::User.def().rev()
    }
}

impl ActiveModelBehavior for ActiveModel {}
