//! SeaORM entities
//!
//! Every table carries `created_at` / `updated_at` / nullable `deleted_at`.
//! Deletes are soft: rows are retired by setting `deleted_at`, and every
//! read path filters them out.

pub mod chat_log;
pub mod model;
pub mod model_with_provider;
pub mod provider;

pub use chat_log::Entity as ChatLog;
pub use model::Entity as Model;
pub use model_with_provider::Entity as ModelWithProvider;
pub use provider::Entity as Provider;
