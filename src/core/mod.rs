//! Core authentication domain: configuration, credential hashing, tokens,
//! session storage, the user directory client and the auth protocol itself.

pub mod auth;
pub mod config;
#[cfg(feature = "postgres")]
pub mod db;
pub mod directory;
pub mod notify;
pub mod session;

pub use config::{Config, ConfigError, SessionStoreBackend};
