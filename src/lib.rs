//! # modelmux
//!
//! A weighted-routing LLM gateway. Clients call logical model names over
//! the OpenAI or Anthropic wire dialect; the gateway resolves the name to a
//! weighted pool of (provider, upstream model) bindings, picks one at
//! random in proportion to weight, and streams the upstream response back
//! byte-for-byte while a teed copy feeds token accounting. Failures retry
//! across the pool under an adaptive policy: hard errors evict a candidate,
//! rate limits only shave its weight.
//!
//! ## Running the gateway
//!
//! ```rust,no_run
//! #[tokio::main]
//! async fn main() -> Result<(), modelmux::GatewayError> {
//!     modelmux::server::run_server().await
//! }
//! ```
//!
//! Configuration is environment-driven: `TOKEN` gates the APIs (empty
//! disables auth), `PORT` defaults to 7070, `DATABASE_URL` defaults to a
//! local SQLite file.

#![warn(clippy::all)]
#![allow(clippy::module_inception)]

pub mod config;
pub mod core;
pub mod server;
pub mod storage;
pub mod utils;

// Re-export main types
pub use config::Settings;
pub use utils::error::{GatewayError, Result};

pub use core::balancer::PoolWeights;
pub use core::dispatch::DispatchEngine;
pub use core::introspect::RequestProfile;
pub use core::providers::{Adapter, ProviderStyle, TokenUsage};
pub use core::resolver::CandidatePool;
pub use storage::{ChatLogPatch, Database, NewChatLog, Repository};

/// Current version of the crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
/// Name of the crate
pub const NAME: &str = env!("CARGO_PKG_NAME");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_constants() {
        assert_eq!(VERSION, env!("CARGO_PKG_VERSION"));
        assert_eq!(NAME, "modelmux");
    }
}
