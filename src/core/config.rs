//! Application configuration from environment variables.
//!
//! Load configuration using `Config::from_env()` after calling `dotenvy::dotenv()`.
//! The resulting value is passed explicitly into the token codec, the hasher and
//! the stores at start-up.

use std::fmt;
use std::net::SocketAddr;

use crate::core::auth::jwt::JwtConfig;

/// Default access token lifetime (60 seconds)
pub const DEFAULT_ACCESS_TOKEN_TTL_SECS: i64 = 60;

/// Default refresh token lifetime (7 days)
pub const DEFAULT_REFRESH_TOKEN_TTL_SECS: i64 = 7 * 24 * 60 * 60;

/// Default bcrypt cost factor (12 is recommended for production)
pub const DEFAULT_BCRYPT_COST: u32 = 12;

const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3000";
const MEMORY_STORE_URL: &str = "memory://";

/// Configuration errors
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{0} environment variable not set")]
    MissingVar(&'static str),

    #[error("ACCESS_TOKEN_SECRET and REFRESH_TOKEN_SECRET must differ")]
    SharedSecret,

    #[error("{var} must be a number, got {value:?}")]
    InvalidNumber { var: &'static str, value: String },

    #[error("{0} must be greater than zero")]
    NonPositiveTtl(&'static str),

    #[error("BCRYPT_COST must be between 4 and 31, got {0}")]
    InvalidBcryptCost(u32),

    #[error("Unsupported session store URL: {0}")]
    UnsupportedStoreUrl(String),

    #[error("Postgres support is not compiled in (enable the `postgres` feature)")]
    PostgresDisabled,

    #[error("Invalid BIND_ADDR: {0}")]
    InvalidBindAddr(String),
}

/// Where refresh-token sessions live
#[derive(Clone, PartialEq, Eq)]
pub enum SessionStoreBackend {
    /// Process-local store, lost on restart
    Memory,
    /// PostgreSQL store at the given connection URL
    Postgres(String),
}

impl SessionStoreBackend {
    fn parse(url: &str) -> Result<Self, ConfigError> {
        if url == MEMORY_STORE_URL {
            return Ok(Self::Memory);
        }

        if url.starts_with("postgres://") || url.starts_with("postgresql://") {
            if cfg!(feature = "postgres") {
                return Ok(Self::Postgres(url.to_string()));
            }
            return Err(ConfigError::PostgresDisabled);
        }

        Err(ConfigError::UnsupportedStoreUrl(url.to_string()))
    }

    /// Backend name for logging (never includes the connection URL)
    pub fn name(&self) -> &'static str {
        match self {
            Self::Memory => "memory",
            Self::Postgres(_) => "postgres",
        }
    }
}

impl fmt::Debug for SessionStoreBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Application configuration loaded from environment variables.
#[derive(Clone)]
pub struct Config {
    /// HMAC secret for access tokens
    pub access_token_secret: String,
    /// HMAC secret for refresh tokens, distinct from the access secret
    pub refresh_token_secret: String,
    /// Access token lifetime in seconds
    pub access_token_ttl_secs: i64,
    /// Refresh token lifetime in seconds, also the session record TTL
    pub refresh_token_ttl_secs: i64,
    /// Session store backend
    pub session_store: SessionStoreBackend,
    /// User directory database URL; in-memory directory when unset
    pub database_url: Option<String>,
    /// bcrypt cost factor
    pub bcrypt_cost: u32,
    /// Address the HTTP server listens on
    pub bind_addr: SocketAddr,
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Call `dotenvy::dotenv()` before this to load from `.env` file.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from an arbitrary key lookup
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let access_token_secret = lookup("ACCESS_TOKEN_SECRET")
            .filter(|v| !v.is_empty())
            .ok_or(ConfigError::MissingVar("ACCESS_TOKEN_SECRET"))?;
        let refresh_token_secret = lookup("REFRESH_TOKEN_SECRET")
            .filter(|v| !v.is_empty())
            .ok_or(ConfigError::MissingVar("REFRESH_TOKEN_SECRET"))?;

        if access_token_secret == refresh_token_secret {
            return Err(ConfigError::SharedSecret);
        }

        let access_token_ttl_secs = parse_ttl(
            &lookup,
            "ACCESS_TOKEN_TTL_SECS",
            DEFAULT_ACCESS_TOKEN_TTL_SECS,
        )?;
        let refresh_token_ttl_secs = parse_ttl(
            &lookup,
            "REFRESH_TOKEN_TTL_SECS",
            DEFAULT_REFRESH_TOKEN_TTL_SECS,
        )?;

        let bcrypt_cost = match lookup("BCRYPT_COST") {
            Some(value) => value.parse().map_err(|_| ConfigError::InvalidNumber {
                var: "BCRYPT_COST",
                value,
            })?,
            None => DEFAULT_BCRYPT_COST,
        };
        if !(4..=31).contains(&bcrypt_cost) {
            return Err(ConfigError::InvalidBcryptCost(bcrypt_cost));
        }

        let session_store = SessionStoreBackend::parse(
            lookup("SESSION_STORE_URL")
                .as_deref()
                .unwrap_or(MEMORY_STORE_URL),
        )?;

        let bind_addr = lookup("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());
        let bind_addr: SocketAddr = bind_addr
            .parse()
            .map_err(|_| ConfigError::InvalidBindAddr(bind_addr))?;

        Ok(Self {
            access_token_secret,
            refresh_token_secret,
            access_token_ttl_secs,
            refresh_token_ttl_secs,
            session_store,
            database_url: lookup("DATABASE_URL").filter(|v| !v.is_empty()),
            bcrypt_cost,
            bind_addr,
        })
    }

    /// Check if a directory database is configured
    pub fn has_database(&self) -> bool {
        self.database_url.is_some()
    }

    /// Token codec configuration derived from this config
    pub fn jwt_config(&self) -> JwtConfig {
        JwtConfig::new(&self.access_token_secret, &self.refresh_token_secret)
            .access_token_ttl(self.access_token_ttl_secs)
            .refresh_token_ttl(self.refresh_token_ttl_secs)
    }
}

fn parse_ttl<F>(lookup: &F, var: &'static str, default: i64) -> Result<i64, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let Some(value) = lookup(var) else {
        return Ok(default);
    };

    let secs: i64 = value
        .parse()
        .map_err(|_| ConfigError::InvalidNumber { var, value })?;

    if secs <= 0 {
        return Err(ConfigError::NonPositiveTtl(var));
    }

    Ok(secs)
}

// Secrets stay out of logs even when the whole config is debug-printed.
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("access_token_secret", &"<redacted>")
            .field("refresh_token_secret", &"<redacted>")
            .field("access_token_ttl_secs", &self.access_token_ttl_secs)
            .field("refresh_token_ttl_secs", &self.refresh_token_ttl_secs)
            .field("session_store", &self.session_store)
            .field("has_database", &self.has_database())
            .field("bcrypt_cost", &self.bcrypt_cost)
            .field("bind_addr", &self.bind_addr)
            .finish()
    }
}
