use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Append-only dispatch log
///
/// One row per attempt that reached the upstream call site, plus exactly one
/// `success` row per satisfied request. The success row is inserted
/// provisionally and enriched with timings and token counts when the
/// response stream ends.
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq, Serialize, Deserialize)]
#[sea_orm(table_name = "chat_logs")]
pub struct Model {
    /// Log ID
    #[sea_orm(primary_key)]
    pub id: i64,

    /// Logical model name the client asked for
    pub name: String,

    /// Upstream model name the attempt was sent to
    pub provider_model: String,

    /// Provider name the attempt was sent to
    pub provider_name: String,

    /// `success` or `error`
    pub status: String,

    /// Wire dialect of the request
    pub style: String,

    /// 0-based attempt index within the request
    pub retry: i32,

    /// Error text for failed attempts
    pub error: Option<String>,

    /// Wall time from request receipt to provider selection (ms)
    pub proxy_time_ms: i64,

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

    /// Creation timestamp
    pub created_at: DateTimeWithTimeZone,

    /// Soft-delete marker
    pub deleted_at: Option<DateTimeWithTimeZone>,
}

/// Chat log entity relations
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}

/// Status value for satisfied requests
pub const STATUS_SUCCESS: &str = "success";
/// Status value for failed attempts
pub const STATUS_ERROR: &str = "error";
