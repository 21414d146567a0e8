//! Repository contract seen by the dispatch core
//!
//! Dispatch never talks to SeaORM directly; it goes through this trait so
//! tests can substitute an in-memory fake. All implementations must exclude
//! soft-deleted rows.

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter, Set};

use crate::storage::database::entities::{self, chat_log, model, model_with_provider, provider};
use crate::storage::database::Database;
use crate::utils::error::{GatewayError, Result};

/// A failed-attempt or provisional-success chat log row
#[derive(Debug, Clone)]
pub struct NewChatLog {
    /// Logical model name
    pub name: String,
    /// Upstream model name
    pub provider_model: String,
    /// Provider name
    pub provider_name: String,
    /// `success` or `error`
    pub status: String,
    /// Wire dialect
    pub style: String,
    /// 0-based attempt index
    pub retry: i32,
    /// Error text for failed attempts
    pub error: Option<String>,
    /// Wall time from request receipt to provider selection (ms)
    pub proxy_time_ms: i64,
}

/// Accounting update applied to a provisional success row at stream end
#[derive(Debug, Clone, Default)]
pub struct ChatLogPatch {
    /// Time from upstream call start to first response byte (ms)
    pub first_chunk_time_ms: i64,
    /// Time from upstream call start to stream end (ms)
    pub total_time_ms: i64,
    /// Prompt tokens reported by the upstream
    pub prompt_tokens: i64,
    /// Completion tokens reported by the upstream
    pub completion_tokens: i64,
    /// Total tokens reported by the upstream
    pub total_tokens: i64,
    /// Error observed while forwarding, if any
    pub error: Option<String>,
}

/// Read and append operations the dispatch core needs
#[async_trait]
pub trait Repository: Send + Sync {
    /// Look up a live model row by its logical name
    async fn find_model_by_name(&self, name: &str) -> Result<Option<model::Model>>;

    /// All live mappings for one logical model
    async fn find_mappings_by_model_id(
        &self,
        model_id: i64,
    ) -> Result<Vec<model_with_provider::Model>>;

    /// Live providers among `ids` whose style matches
    async fn find_providers_by_ids_and_type(
        &self,
        ids: &[i64],
        style: &str,
    ) -> Result<Vec<provider::Model>>;

    /// Append a chat log row, returning its id
    async fn insert_chat_log(&self, log: NewChatLog) -> Result<i64>;

    /// Enrich a provisional success row with timings and token counts
    async fn update_chat_log(&self, id: i64, patch: ChatLogPatch) -> Result<()>;
}

#[async_trait]
impl Repository for Database {
    async fn find_model_by_name(&self, name: &str) -> Result<Option<model::Model>> {
        Ok(entities::Model::find()
            .filter(model::Column::Name.eq(name))
            .filter(model::Column::DeletedAt.is_null())
            .one(self.connection())
            .await?)
    }

    async fn find_mappings_by_model_id(
        &self,
        model_id: i64,
    ) -> Result<Vec<model_with_provider::Model>> {
        Ok(entities::ModelWithProvider::find()
            .filter(model_with_provider::Column::ModelId.eq(model_id))
            .filter(model_with_provider::Column::DeletedAt.is_null())
            .all(self.connection())
            .await?)
    }

    async fn find_providers_by_ids_and_type(
        &self,
        ids: &[i64],
        style: &str,
    ) -> Result<Vec<provider::Model>> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        Ok(entities::Provider::find()
            .filter(provider::Column::Id.is_in(ids.to_vec()))
            .filter(provider::Column::Style.eq(style))
            .filter(provider::Column::DeletedAt.is_null())
            .all(self.connection())
            .await?)
    }

    async fn insert_chat_log(&self, log: NewChatLog) -> Result<i64> {
        let active = chat_log::ActiveModel {
            name: Set(log.name),
            provider_model: Set(log.provider_model),
            provider_name: Set(log.provider_name),
            status: Set(log.status),
            style: Set(log.style),
            retry: Set(log.retry),
            error: Set(log.error),
            proxy_time_ms: Set(log.proxy_time_ms),
            created_at: Set(Utc::now().into()),
            ..Default::default()
        };
        let inserted = entities::ChatLog::insert(active)
            .exec(self.connection())
            .await?;
        Ok(inserted.last_insert_id)
    }

    async fn update_chat_log(&self, id: i64, patch: ChatLogPatch) -> Result<()> {
        let existing = entities::ChatLog::find_by_id(id)
            .one(self.connection())
            .await?
            .ok_or_else(|| GatewayError::NotFound(format!("chat log {}", id)))?;
        let mut active: chat_log::ActiveModel = existing.into();
        active.first_chunk_time_ms = Set(patch.first_chunk_time_ms);
        active.total_time_ms = Set(patch.total_time_ms);
        active.prompt_tokens = Set(patch.prompt_tokens);
        active.completion_tokens = Set(patch.completion_tokens);
        active.total_tokens = Set(patch.total_tokens);
        if patch.error.is_some() {
            active.error = Set(patch.error);
        }
        sea_orm::ActiveModelTrait::update(active, self.connection()).await?;
        Ok(())
    }
}
