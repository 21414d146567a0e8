//! Shared test fixtures
//!
//! `MemoryRepository` is an in-memory stand-in for the database so the
//! dispatch engine can be exercised without SQL; chat logs and their
//! accounting patches are captured for assertions.

#![allow(dead_code)]

use async_trait::async_trait;
use chrono::Utc;
use modelmux::storage::database::entities::{model, model_with_provider, provider};
use modelmux::{ChatLogPatch, GatewayError, NewChatLog, Repository};
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// One captured chat log row plus its accounting patch, if applied
#[derive(Debug, Clone)]
pub struct LoggedRow {
    pub id: i64,
    pub log: NewChatLog,
    pub patch: Option<ChatLogPatch>,
}

/// In-memory repository fake
#[derive(Default)]
pub struct MemoryRepository {
    pub models: Vec<model::Model>,
    pub mappings: Vec<model_with_provider::Model>,
    pub providers: Vec<provider::Model>,
    logs: Mutex<Vec<LoggedRow>>,
    next_log_id: AtomicI64,
}

impl MemoryRepository {
    pub fn new() -> Self {
        Self {
            next_log_id: AtomicI64::new(1),
            ..Default::default()
        }
    }

    pub fn with_model(mut self, id: i64, name: &str, max_retry: i32, timeout_seconds: i64) -> Self {
        self.models.push(model::Model {
            id,
            name: name.to_string(),
            description: String::new(),
            max_retry,
            timeout_seconds,
            created_at: Utc::now().into(),
            updated_at: Utc::now().into(),
            deleted_at: None,
        });
        self
    }

    pub fn with_provider(mut self, id: i64, name: &str, style: &str, base_url: &str) -> Self {
        self.providers.push(provider::Model {
            id,
            name: name.to_string(),
            style: style.to_string(),
            config: serde_json::json!({
                "base_url": base_url,
                "api_key": "sk-test",
            }),
            created_at: Utc::now().into(),
            updated_at: Utc::now().into(),
            deleted_at: None,
        });
        self
    }

    pub fn with_mapping(
        mut self,
        id: i64,
        model_id: i64,
        provider_id: i64,
        provider_model: &str,
        weight: i32,
    ) -> Self {
        self.mappings.push(model_with_provider::Model {
            id,
            model_id,
            provider_id,
            provider_model: provider_model.to_string(),
            weight,
            tool_call: None,
            structured_output: None,
            image: None,
            created_at: Utc::now().into(),
            updated_at: Utc::now().into(),
            deleted_at: None,
        });
        self
    }

    pub fn with_mapping_caps(
        mut self,
        id: i64,
        model_id: i64,
        provider_id: i64,
        provider_model: &str,
        weight: i32,
        tool_call: Option<bool>,
        structured_output: Option<bool>,
        image: Option<bool>,
    ) -> Self {
        self.mappings.push(model_with_provider::Model {
            id,
            model_id,
            provider_id,
            provider_model: provider_model.to_string(),
            weight,
            tool_call,
            structured_output,
            image,
            created_at: Utc::now().into(),
            updated_at: Utc::now().into(),
            deleted_at: None,
        });
        self
    }

    /// Snapshot of everything logged so far
    pub fn logs(&self) -> Vec<LoggedRow> {
        self.logs.lock().unwrap().clone()
    }

    /// Rows with a given status
    pub fn logs_with_status(&self, status: &str) -> Vec<LoggedRow> {
        self.logs()
            .into_iter()
            .filter(|row| row.log.status == status)
            .collect()
    }
}

#[async_trait]
impl Repository for MemoryRepository {
    async fn find_model_by_name(
        &self,
        name: &str,
    ) -> Result<Option<model::Model>, GatewayError> {
        Ok(self
            .models
            .iter()
            .find(|m| m.name == name && m.deleted_at.is_none())
            .cloned())
    }

    async fn find_mappings_by_model_id(
        &self,
        model_id: i64,
    ) -> Result<Vec<model_with_provider::Model>, GatewayError> {
        Ok(self
            .mappings
            .iter()
            .filter(|m| m.model_id == model_id && m.deleted_at.is_none())
            .cloned()
            .collect())
    }

    async fn find_providers_by_ids_and_type(
        &self,
        ids: &[i64],
        style: &str,
    ) -> Result<Vec<provider::Model>, GatewayError> {
        Ok(self
            .providers
            .iter()
            .filter(|p| ids.contains(&p.id) && p.style == style && p.deleted_at.is_none())
            .cloned()
            .collect())
    }

    async fn insert_chat_log(&self, log: NewChatLog) -> Result<i64, GatewayError> {
        let id = self.next_log_id.fetch_add(1, Ordering::SeqCst);
        self.logs.lock().unwrap().push(LoggedRow {
            id,
            log,
            patch: None,
        });
        Ok(id)
    }

    async fn update_chat_log(&self, id: i64, patch: ChatLogPatch) -> Result<(), GatewayError> {
        let mut logs = self.logs.lock().unwrap();
        let row = logs
            .iter_mut()
            .find(|row| row.id == id)
            .ok_or_else(|| GatewayError::NotFound(format!("chat log {}", id)))?;
        assert!(
            row.patch.is_none(),
            "chat log {} must be finalized exactly once",
            id
        );
        row.patch = Some(patch);
        Ok(())
    }
}

/// Wait until the success row with the given id has been finalized by the
/// accounting task
pub async fn wait_for_patch(repo: &Arc<MemoryRepository>, log_id: i64) -> ChatLogPatch {
    for _ in 0..100 {
        if let Some(patch) = repo
            .logs()
            .into_iter()
            .find(|row| row.id == log_id)
            .and_then(|row| row.patch)
        {
            return patch;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    panic!("chat log {} was never finalized", log_id);
}
