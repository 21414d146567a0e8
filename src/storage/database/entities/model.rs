use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Logical model database model
///
/// The client-facing name, decoupled from any concrete upstream. `max_retry`
/// and `timeout_seconds` are the dispatch budget applied to every request
/// targeting this model.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "models")]
pub struct Model {
    /// Model ID
    #[sea_orm(primary_key)]
    pub id: i64,

    /// Logical model name (unique)
    #[sea_orm(unique)]
    pub name: String,

    /// Human-readable description
    pub description: String,

    /// Maximum dispatch attempts per request (>= 1)
    pub max_retry: i32,

    /// Per-request time budget in seconds (>= 1)
    pub timeout_seconds: i64,

    /// Creation timestamp
    pub created_at: DateTimeWithTimeZone,

    /// Last update timestamp
    pub updated_at: DateTimeWithTimeZone,

    /// Soft-delete marker
    pub deleted_at: Option<DateTimeWithTimeZone>,
}

/// Model entity relations
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Mappings binding this model to providers
    #[sea_orm(has_many = "super::model_with_provider::Entity")]
    Mappings,
}

impl Related<super::model_with_provider::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Mappings.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
