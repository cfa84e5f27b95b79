//! Server configuration

use anyhow::Result;
use axum::http::HeaderValue;
use serde::Deserialize;

/// Origins allowed by default for browser clients
pub const DEFAULT_CORS_ORIGINS: &str = "http://localhost:5173,http://localhost:3000";

/// HTTP server configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Whether the session cookie carries the `Secure` attribute
    pub cookie_secure: bool,
    /// Comma-separated list of allowed origins
    pub cors_origins: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            cookie_secure: false,
            cors_origins: DEFAULT_CORS_ORIGINS.to_string(),
        }
    }
}

impl ServerConfig {
    /// Load the configuration from `SERVER_*` environment variables
    ///
    /// # Environment Variables
    /// - `SERVER_HOST`: Bind address (default: 0.0.0.0)
    /// - `SERVER_PORT`: Bind port (default: 8000)
    /// - `SERVER_COOKIE_SECURE`: Mark the session cookie `Secure` (default: false)
    /// - `SERVER_CORS_ORIGINS`: Allowed origins (default: http://localhost:5173,http://localhost:3000)
    pub fn from_env() -> Result<Self> {
        let defaults = ServerConfig::default();

        let settings = config::Config::builder()
            .set_default("host", defaults.host)?
            .set_default("port", defaults.port as i64)?
            .set_default("cookie_secure", defaults.cookie_secure)?
            .set_default("cors_origins", defaults.cors_origins)?
            .add_source(config::Environment::with_prefix("SERVER"))
            .build()?;

        Ok(settings.try_deserialize()?)
    }

    /// Socket address to bind
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Parsed allowed origins, skipping blank or invalid entries
    pub fn allowed_origins(&self) -> Vec<HeaderValue> {
        self.cors_origins
            .split(',')
            .map(str::trim)
            .filter(|origin| !origin.is_empty())
            .filter_map(|origin| HeaderValue::from_str(origin).ok())
            .collect()
    }
}

/// Which persistence backend the service runs against
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DataBackend {
    Postgres,
    Memory,
}

impl DataBackend {
    /// Read `DATA_BACKEND` (`postgres` or `memory`, default: postgres)
    pub fn from_env() -> Result<Self> {
        match std::env::var("DATA_BACKEND")
            .unwrap_or_else(|_| "postgres".to_string())
            .to_lowercase()
            .as_str()
        {
            "postgres" | "postgresql" => Ok(DataBackend::Postgres),
            "memory" => Ok(DataBackend::Memory),
            other => anyhow::bail!("Unknown DATA_BACKEND: {}", other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn clear_env() {
        unsafe {
            std::env::remove_var("SERVER_HOST");
            std::env::remove_var("SERVER_PORT");
            std::env::remove_var("SERVER_COOKIE_SECURE");
            std::env::remove_var("SERVER_CORS_ORIGINS");
            std::env::remove_var("DATA_BACKEND");
        }
    }

    #[test]
    #[serial]
    fn test_server_config_defaults() {
        clear_env();

        let config = ServerConfig::from_env().unwrap();
        assert_eq!(config.bind_address(), "0.0.0.0:8000");
        assert!(!config.cookie_secure);
        assert_eq!(config.allowed_origins().len(), 2);
        assert_eq!(DataBackend::from_env().unwrap(), DataBackend::Postgres);
    }

    #[test]
    #[serial]
    fn test_server_config_from_env() {
        clear_env();
        unsafe {
            std::env::set_var("SERVER_HOST", "127.0.0.1");
            std::env::set_var("SERVER_PORT", "9090");
            std::env::set_var("SERVER_COOKIE_SECURE", "true");
            std::env::set_var("SERVER_CORS_ORIGINS", "https://vidshare.test, ,https://admin.test");
            std::env::set_var("DATA_BACKEND", "memory");
        }

        let config = ServerConfig::from_env().unwrap();
        assert_eq!(config.bind_address(), "127.0.0.1:9090");
        assert!(config.cookie_secure);
        assert_eq!(
            config.allowed_origins(),
            vec![
                HeaderValue::from_static("https://vidshare.test"),
                HeaderValue::from_static("https://admin.test")
            ]
        );
        assert_eq!(DataBackend::from_env().unwrap(), DataBackend::Memory);

        clear_env();
    }
}
