/// Configuration management for the API server
///
/// Settings are layered with the `config` crate, lowest precedence first:
///
/// 1. Built-in defaults
/// 2. `CLUBIFY_*` environment variables, `__` separating sections
///    (`CLUBIFY_API__PORT=8080`, `CLUBIFY_MAIL__RELAY_URL=...`)
/// 3. The conventional variables `PORT`, `API_HOST`, `DATABASE_URL` and
///    `JWT_SECRET`
///
/// A `.env` file in the working directory is loaded first when present.
///
/// # Example
///
/// ```no_run
/// use clubify_api::config::Config;
///
/// # fn example() -> anyhow::Result<()> {
/// let config = Config::from_env()?;
/// println!("Server will listen on {}", config.bind_address());
/// # Ok(())
/// # }
/// ```

use anyhow::Context;
use clubify_shared::{db::pool, mail::MailSettings};
use config::{builder::DefaultState, ConfigBuilder, Environment};
use serde::{Deserialize, Serialize};
use std::env;

/// Shortest accepted JWT signing secret
pub const MIN_JWT_SECRET_LENGTH: usize = 32;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub api: ApiConfig,
    pub database: DatabaseConfig,
    pub auth: AuthConfig,
    pub mail: MailConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    pub host: String,
    pub port: u16,

    /// Allowed origins; `*` allows any origin
    pub cors_origins: Vec<String>,

    /// Enables HSTS and other production-only behaviour
    pub production: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// PostgreSQL connection URL
    pub url: String,

    pub max_connections: u32,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthConfig {
    /// Secret for signing session tokens
    ///
    /// Must be at least 32 characters. Generate with: `openssl rand -hex 32`
    pub jwt_secret: String,

    pub token_ttl_hours: i64,

    /// Accept the plain `user-id` header as an identity
    pub allow_header_identity: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MailConfig {
    /// HTTP relay endpoint; unset means e-mails are only logged
    pub relay_url: Option<String>,

    pub api_key: Option<String>,

    pub from_address: String,

    pub timeout_seconds: u64,
}

impl Config {
    /// Loads configuration from `.env`, `CLUBIFY_*` and the conventional variables
    ///
    /// # Errors
    ///
    /// Fails when `DATABASE_URL` or `JWT_SECRET` is missing, a value cannot be
    /// parsed, or the secret is too short.
    pub fn from_env() -> anyhow::Result<Self> {
        // Load .env file if present (for development)
        dotenvy::dotenv().ok();

        let builder = Self::defaults()?
            .add_source(
                Environment::with_prefix("CLUBIFY")
                    .prefix_separator("_")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("api.cors_origins")
                    .try_parsing(true),
            )
            .set_override_option("api.port", env::var("PORT").ok())?
            .set_override_option("api.host", env::var("API_HOST").ok())?
            .set_override_option("database.url", env::var("DATABASE_URL").ok())?
            .set_override_option("auth.jwt_secret", env::var("JWT_SECRET").ok())?;

        Self::from_builder(builder)
    }

    /// Builder holding the default value of every optional setting
    pub fn defaults() -> Result<ConfigBuilder<DefaultState>, config::ConfigError> {
        config::Config::builder()
            .set_default("api.host", "0.0.0.0")?
            .set_default("api.port", 5001)?
            .set_default("api.cors_origins", vec!["*"])?
            .set_default("api.production", false)?
            .set_default("database.max_connections", 10)?
            .set_default("auth.token_ttl_hours", 24)?
            .set_default("auth.allow_header_identity", true)?
            .set_default("mail.from_address", "noreply@clubify.app")?
            .set_default("mail.timeout_seconds", 10)
    }

    /// Deserializes and validates whatever `builder` was given
    pub fn from_builder(builder: ConfigBuilder<DefaultState>) -> anyhow::Result<Self> {
        let config: Config = builder
            .build()?
            .try_deserialize()
            .context("DATABASE_URL and JWT_SECRET must be set")?;

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> anyhow::Result<()> {
        if self.database.url.trim().is_empty() {
            anyhow::bail!("DATABASE_URL must not be empty");
        }

        if self.auth.jwt_secret.len() < MIN_JWT_SECRET_LENGTH {
            anyhow::bail!("JWT_SECRET must be at least {MIN_JWT_SECRET_LENGTH} characters long");
        }

        if self.auth.token_ttl_hours <= 0 {
            anyhow::bail!("auth.token_ttl_hours must be positive");
        }

        Ok(())
    }

    /// Returns the server bind address
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.api.host, self.api.port)
    }

    /// Whether any origin may call the API
    pub fn cors_allows_any(&self) -> bool {
        self.api.cors_origins.iter().any(|origin| origin == "*")
    }

    pub fn pool_config(&self) -> pool::DatabaseConfig {
        pool::DatabaseConfig {
            url: self.database.url.clone(),
            max_connections: self.database.max_connections,
            ..Default::default()
        }
    }

    pub fn mail_settings(&self) -> MailSettings {
        MailSettings {
            relay_url: self.mail.relay_url.clone(),
            api_key: self.mail.api_key.clone(),
            from_address: self.mail.from_address.clone(),
            timeout_seconds: self.mail.timeout_seconds,
        }
    }
}
