use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Upstream provider database model
///
/// `config` is an opaque JSON blob interpreted only by the adapter matching
/// `style` (typically `{base_url, api_key, version}`).
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "providers")]
pub struct Model {
    /// Provider ID
    #[sea_orm(primary_key)]
    pub id: i64,

    /// Provider name (unique)
    #[sea_orm(unique)]
    pub name: String,

    /// Wire dialect the provider speaks (`openai`, `anthropic`, ...)
    #[sea_orm(column_name = "type")]
    #[serde(rename = "type")]
    pub style: String,

    /// Adapter-interpreted configuration blob
    pub config: Json,

    /// Creation timestamp
    pub created_at: DateTimeWithTimeZone,

    /// Last update timestamp
    pub updated_at: DateTimeWithTimeZone,

    /// Soft-delete marker
    pub deleted_at: Option<DateTimeWithTimeZone>,
}

/// Provider entity relations
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Mappings pointing at this provider
    #[sea_orm(has_many = "super::model_with_provider::Entity")]
    Mappings,
}

impl Related<super::model_with_provider::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Mappings.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
