use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Mapping database model: binds one logical model to one provider
///
/// The capability flags are three-valued: `None` leaves the capability
/// unconstrained, `Some(true)` declares support, `Some(false)` declares the
/// upstream cannot do it and excludes the mapping from requests that need it.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "model_with_providers")]
pub struct Model {
    /// Mapping ID
    #[sea_orm(primary_key)]
    pub id: i64,

    /// Logical model this mapping belongs to
    pub model_id: i64,

    /// Provider backing this mapping
    pub provider_id: i64,

    /// Model name the upstream provider expects
    pub provider_model: String,

    /// Selection weight (>= 1)
    pub weight: i32,

    /// Tool-call capability flag
    pub tool_call: Option<bool>,

    /// Structured-output capability flag
    pub structured_output: Option<bool>,

    /// Image-input capability flag
    pub image: Option<bool>,

    /// Creation timestamp
    pub created_at: DateTimeWithTimeZone,

    /// Last update timestamp
    pub updated_at: DateTimeWithTimeZone,

    /// Soft-delete marker
    pub deleted_at: Option<DateTimeWithTimeZone>,
}

/// Mapping entity relations
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Owning logical model
    #[sea_orm(
        belongs_to = "super::model::Entity",
        from = "Column::ModelId",
        to = "super::model::Column::Id"
    )]
    Model,

    /// Backing provider
    #[sea_orm(
        belongs_to = "super::provider::Entity",
        from = "Column::ProviderId",
        to = "super::provider::Column::Id"
    )]
    Provider,
}

impl Related<super::model::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Model.def()
    }
}

impl Related<super::provider::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Provider.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
