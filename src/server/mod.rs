//! HTTP surface
//!
//! Client-facing chat endpoints, the admin CRUD API, and the glue that
//! wires them to the dispatch engine.

pub mod middleware;
pub mod routes;
pub mod server;
pub mod state;

pub use server::{run_server, HttpServer};
pub use state::AppState;
