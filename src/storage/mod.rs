//! Persistence layer
//!
//! The gateway keeps its routing tables (providers, models, mappings) and
//! the append-only chat log in a relational store accessed through SeaORM.

pub mod database;
pub mod repository;

pub use database::Database;
pub use repository::{ChatLogPatch, NewChatLog, Repository};
