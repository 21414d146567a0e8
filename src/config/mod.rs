//! Process configuration
//!
//! Settings are environment-driven: a `.env` file is loaded first (if
//! present), then process environment variables override the built-in
//! defaults.

use crate::utils::error::Result;
use serde::Deserialize;

/// Runtime settings for the gateway process
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// Bind address
    pub host: String,
    /// Bind port
    pub port: u16,
    /// Shared access token gating both the client and admin APIs.
    /// An empty token disables authentication.
    pub token: String,
    /// Database connection string (sqlite or postgres)
    pub database_url: String,
}

impl Settings {
    /// Load settings from the environment, layered over defaults
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        let settings = config::Config::builder()
            .set_default("host", "0.0.0.0")?
            .set_default("port", 7070)?
            .set_default("token", "")?
            .set_default("database_url", "sqlite://modelmux.db?mode=rwc")?
            .add_source(config::Environment::default())
            .build()?
            .try_deserialize()?;

        Ok(settings)
    }

    /// Whether request authentication is enabled
    pub fn auth_enabled(&self) -> bool {
        !self.token.is_empty()
    }

    /// Address string suitable for binding
    pub fn bind_addr(&self) -> (String, u16) {
        (self.host.clone(), self.port)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 7070,
            token: String::new(),
            database_url: "sqlite://modelmux.db?mode=rwc".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = Settings::default();
        assert_eq!(settings.port, 7070);
        assert!(!settings.auth_enabled());
    }

    #[test]
    fn test_auth_enabled_with_token() {
        let settings = Settings {
            token: "sk-gateway".to_string(),
            ..Settings::default()
        };
        assert!(settings.auth_enabled());
    }
}
