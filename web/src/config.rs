//! Configuration loaded from environment variables with sensible defaults.

use std::env;

/// Application configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Database settings.
    pub database: DatabaseConfig,
    /// HTTP server settings.
    pub server: ServerConfig,
    /// Session authentication settings.
    pub auth: AuthConfig,
}

/// `PostgreSQL` settings.
#[derive(Debug, Clone)]
pub struct DatabaseConfig {
    /// Connection URL.
    pub url: String,
    /// Maximum number of pooled connections.
    pub max_connections: u32,
}

/// HTTP server settings.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Host to bind to.
    pub host: String,
    /// Port to bind to.
    pub port: u16,
    /// Frontend origin allowed by CORS (credentials are sent cross-origin).
    pub cors_origin: String,
}

/// Session authentication settings.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// HS256 secret for signing session tokens.
    pub jwt_secret: String,
    /// Session lifetime in hours.
    pub session_ttl_hours: i64,
}

impl Config {
    /// Load configuration from the environment.
    #[must_use]
    pub fn from_env() -> Self {
        Self {
            database: DatabaseConfig {
                url: env::var("DATABASE_URL")
                    .unwrap_or_else(|_| "postgres://localhost/rollcall".to_string()),
                max_connections: env::var("DATABASE_MAX_CONNECTIONS")
                    .ok()
                    .and_then(|raw| raw.parse().ok())
                    .unwrap_or(10),
            },
            server: ServerConfig {
                host: env::var("SERVER_HOST").unwrap_or_else(|_| "0.0.0.0".to_string()),
                port: env::var("SERVER_PORT")
                    .ok()
                    .and_then(|raw| raw.parse().ok())
                    .unwrap_or(8080),
                cors_origin: env::var("CORS_ORIGIN")
                    .unwrap_or_else(|_| "http://localhost:5173".to_string()),
            },
            auth: AuthConfig {
                jwt_secret: env::var("JWT_SECRET")
                    .unwrap_or_else(|_| "insecure-dev-secret".to_string()),
                session_ttl_hours: env::var("SESSION_TTL_HOURS")
                    .ok()
                    .and_then(|raw| raw.parse().ok())
                    .unwrap_or(12),
            },
        }
    }

    /// The socket address to bind.
    #[must_use]
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
