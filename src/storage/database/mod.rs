//! SeaORM-backed database access
//!
//! `Database` owns the connection pool and exposes both the dispatch-facing
//! repository queries (see [`crate::storage::repository`]) and the admin
//! CRUD operations. Every query here excludes soft-deleted rows.

pub mod entities;
pub mod migration;

use crate::utils::error::{GatewayError, Result};
use chrono::Utc;
use sea_orm::*;
use sea_orm_migration::MigratorTrait;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info, warn};

use entities::{chat_log, model, model_with_provider, provider};
use migration::Migrator;

/// Database handle shared across the process
#[derive(Debug, Clone)]
pub struct Database {
    conn: DatabaseConnection,
}

/// Admin payload for creating or updating a provider
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderDraft {
    /// Unique provider name
    pub name: String,
    /// Wire dialect (`openai`, `anthropic`, ...)
    #[serde(rename = "type")]
    pub style: String,
    /// Adapter-interpreted configuration blob
    pub config: serde_json::Value,
}

/// Admin payload for creating or updating a logical model
#[derive(Debug, Clone, Deserialize)]
pub struct ModelDraft {
    /// Unique logical model name
    pub name: String,
    /// Human-readable description
    #[serde(default)]
    pub description: String,
    /// Maximum dispatch attempts (>= 1)
    pub max_retry: i32,
    /// Per-request time budget in seconds (>= 1)
    pub timeout_seconds: i64,
}

/// Admin payload for creating or updating a mapping
#[derive(Debug, Clone, Deserialize)]
pub struct MappingDraft {
    /// Logical model id
    pub model_id: i64,
    /// Provider id
    pub provider_id: i64,
    /// Upstream model name
    pub provider_model: String,
    /// Selection weight (>= 1)
    pub weight: i32,
    /// Tool-call capability flag
    #[serde(default)]
    pub tool_call: Option<bool>,
    /// Structured-output capability flag
    #[serde(default)]
    pub structured_output: Option<bool>,
    /// Image-input capability flag
    #[serde(default)]
    pub image: Option<bool>,
}

impl Database {
    /// Connect to the database named by `url`
    pub async fn connect(url: &str) -> Result<Self> {
        let mut opt = ConnectOptions::new(url.to_owned());
        opt.max_connections(10)
            .min_connections(1)
            .connect_timeout(Duration::from_secs(10))
            .acquire_timeout(Duration::from_secs(30))
            .sqlx_logging(false);

        let conn = sea_orm::Database::connect(opt)
            .await
            .map_err(GatewayError::Database)?;

        info!("Database connection established");
        Ok(Self { conn })
    }

    /// Wrap an existing connection (used by tests)
    pub fn from_connection(conn: DatabaseConnection) -> Self {
        Self { conn }
    }

    /// Run pending migrations
    pub async fn migrate(&self) -> Result<()> {
        info!("Running database migrations");
        Migrator::up(&self.conn, None).await.map_err(|e| {
            warn!("Migration failed: {}", e);
            GatewayError::Database(e)
        })?;
        Ok(())
    }

    /// Liveness probe: one trivial round-trip
    pub async fn health_check(&self) -> Result<()> {
        self.conn
            .ping()
            .await
            .map_err(GatewayError::Database)
    }

    /// Underlying connection
    pub fn connection(&self) -> &DatabaseConnection {
        &self.conn
    }

    // ---- providers -------------------------------------------------------

    /// List live providers
    pub async fn list_providers(&self) -> Result<Vec<provider::Model>> {
        Ok(entities::Provider::find()
            .filter(provider::Column::DeletedAt.is_null())
            .order_by_asc(provider::Column::Id)
            .all(&self.conn)
            .await?)
    }

    /// Create a provider
    pub async fn create_provider(&self, draft: ProviderDraft) -> Result<provider::Model> {
        validate_non_empty("name", &draft.name)?;
        validate_non_empty("type", &draft.style)?;
        let now = Utc::now().into();
        let active = provider::ActiveModel {
            name: Set(draft.name),
            style: Set(draft.style),
            config: Set(draft.config),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };
        Ok(active.insert(&self.conn).await?)
    }

    /// Update a provider in place
    pub async fn update_provider(&self, id: i64, draft: ProviderDraft) -> Result<provider::Model> {
        validate_non_empty("name", &draft.name)?;
        validate_non_empty("type", &draft.style)?;
        let existing = self.find_live_provider(id).await?;
        let mut active: provider::ActiveModel = existing.into();
        active.name = Set(draft.name);
        active.style = Set(draft.style);
        active.config = Set(draft.config);
        active.updated_at = Set(Utc::now().into());
        Ok(active.update(&self.conn).await?)
    }

    /// Soft-delete a provider
    pub async fn delete_provider(&self, id: i64) -> Result<()> {
        let existing = self.find_live_provider(id).await?;
        let mut active: provider::ActiveModel = existing.into();
        active.deleted_at = Set(Some(Utc::now().into()));
        active.update(&self.conn).await?;
        Ok(())
    }

    async fn find_live_provider(&self, id: i64) -> Result<provider::Model> {
        entities::Provider::find_by_id(id)
            .filter(provider::Column::DeletedAt.is_null())
            .one(&self.conn)
            .await?
            .ok_or_else(|| GatewayError::NotFound(format!("provider {}", id)))
    }

    // ---- models ----------------------------------------------------------

    /// List live logical models
    pub async fn list_models(&self) -> Result<Vec<model::Model>> {
        Ok(entities::Model::find()
            .filter(model::Column::DeletedAt.is_null())
            .order_by_asc(model::Column::Id)
            .all(&self.conn)
            .await?)
    }

    /// Create a logical model
    pub async fn create_model(&self, draft: ModelDraft) -> Result<model::Model> {
        validate_non_empty("name", &draft.name)?;
        validate_budget(draft.max_retry, draft.timeout_seconds)?;
        let now = Utc::now().into();
        let active = model::ActiveModel {
            name: Set(draft.name),
            description: Set(draft.description),
            max_retry: Set(draft.max_retry),
            timeout_seconds: Set(draft.timeout_seconds),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };
        Ok(active.insert(&self.conn).await?)
    }

    /// Update a logical model in place
    pub async fn update_model(&self, id: i64, draft: ModelDraft) -> Result<model::Model> {
        validate_non_empty("name", &draft.name)?;
        validate_budget(draft.max_retry, draft.timeout_seconds)?;
        let existing = self.find_live_model(id).await?;
        let mut active: model::ActiveModel = existing.into();
        active.name = Set(draft.name);
        active.description = Set(draft.description);
        active.max_retry = Set(draft.max_retry);
        active.timeout_seconds = Set(draft.timeout_seconds);
        active.updated_at = Set(Utc::now().into());
        Ok(active.update(&self.conn).await?)
    }

    /// Soft-delete a logical model
    pub async fn delete_model(&self, id: i64) -> Result<()> {
        let existing = self.find_live_model(id).await?;
        let mut active: model::ActiveModel = existing.into();
        active.deleted_at = Set(Some(Utc::now().into()));
        active.update(&self.conn).await?;
        Ok(())
    }

    async fn find_live_model(&self, id: i64) -> Result<model::Model> {
        entities::Model::find_by_id(id)
            .filter(model::Column::DeletedAt.is_null())
            .one(&self.conn)
            .await?
            .ok_or_else(|| GatewayError::NotFound(format!("model {}", id)))
    }

    // ---- mappings --------------------------------------------------------

    /// List live mappings
    pub async fn list_mappings(&self) -> Result<Vec<model_with_provider::Model>> {
        Ok(entities::ModelWithProvider::find()
            .filter(model_with_provider::Column::DeletedAt.is_null())
            .order_by_asc(model_with_provider::Column::Id)
            .all(&self.conn)
            .await?)
    }

    /// Create a mapping between a model and a provider
    pub async fn create_mapping(&self, draft: MappingDraft) -> Result<model_with_provider::Model> {
        self.validate_mapping(&draft).await?;
        let now = Utc::now().into();
        let active = model_with_provider::ActiveModel {
            model_id: Set(draft.model_id),
            provider_id: Set(draft.provider_id),
            provider_model: Set(draft.provider_model),
            weight: Set(draft.weight),
            tool_call: Set(draft.tool_call),
            structured_output: Set(draft.structured_output),
            image: Set(draft.image),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };
        Ok(active.insert(&self.conn).await?)
    }

    /// Update a mapping in place
    pub async fn update_mapping(
        &self,
        id: i64,
        draft: MappingDraft,
    ) -> Result<model_with_provider::Model> {
        self.validate_mapping(&draft).await?;
        let existing = self.find_live_mapping(id).await?;
        let mut active: model_with_provider::ActiveModel = existing.into();
        active.model_id = Set(draft.model_id);
        active.provider_id = Set(draft.provider_id);
        active.provider_model = Set(draft.provider_model);
        active.weight = Set(draft.weight);
        active.tool_call = Set(draft.tool_call);
        active.structured_output = Set(draft.structured_output);
        active.image = Set(draft.image);
        active.updated_at = Set(Utc::now().into());
        Ok(active.update(&self.conn).await?)
    }

    /// Soft-delete a mapping
    pub async fn delete_mapping(&self, id: i64) -> Result<()> {
        let existing = self.find_live_mapping(id).await?;
        let mut active: model_with_provider::ActiveModel = existing.into();
        active.deleted_at = Set(Some(Utc::now().into()));
        active.update(&self.conn).await?;
        Ok(())
    }

    async fn find_live_mapping(&self, id: i64) -> Result<model_with_provider::Model> {
        entities::ModelWithProvider::find_by_id(id)
            .filter(model_with_provider::Column::DeletedAt.is_null())
            .one(&self.conn)
            .await?
            .ok_or_else(|| GatewayError::NotFound(format!("mapping {}", id)))
    }

    /// A mapping must reference a live model and a live provider
    async fn validate_mapping(&self, draft: &MappingDraft) -> Result<()> {
        if draft.weight < 1 {
            return Err(GatewayError::Validation("weight must be >= 1".to_string()));
        }
        validate_non_empty("provider_model", &draft.provider_model)?;
        self.find_live_model(draft.model_id).await?;
        self.find_live_provider(draft.provider_id).await?;
        Ok(())
    }

    // ---- chat logs -------------------------------------------------------

    /// List chat logs, newest first
    pub async fn list_chat_logs(&self, page: u64, page_size: u64) -> Result<Vec<chat_log::Model>> {
        let page_size = page_size.clamp(1, 200);
        debug!("Listing chat logs page={} page_size={}", page, page_size);
        Ok(entities::ChatLog::find()
            .filter(chat_log::Column::DeletedAt.is_null())
            .order_by_desc(chat_log::Column::Id)
            .paginate(&self.conn, page_size)
            .fetch_page(page)
            .await?)
    }
}

fn validate_non_empty(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(GatewayError::Validation(format!(
            "{} must not be empty",
            field
        )));
    }
    Ok(())
}

fn validate_budget(max_retry: i32, timeout_seconds: i64) -> Result<()> {
    if max_retry < 1 {
        return Err(GatewayError::Validation(
            "max_retry must be >= 1".to_string(),
        ));
    }
    if timeout_seconds < 1 {
        return Err(GatewayError::Validation(
            "timeout_seconds must be >= 1".to_string(),
        ));
    }
    Ok(())
}
