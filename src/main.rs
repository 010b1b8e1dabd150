use std::error::Error;
use std::sync::Arc;

use sessiongate::core::auth::{
    AuthApiState, AuthService, JwtService, PasswordHasher, auth_api_router,
};
use sessiongate::core::config::{Config, SessionStoreBackend};
use sessiongate::core::directory::{MemoryDirectory, UserDirectory};
use sessiongate::core::notify::LogNotifier;
use sessiongate::core::session::{MemorySessionStore, PURGE_INTERVAL, PurgeTask, SessionStore};
use tower_http::trace::TraceLayer;

type Backends = (Arc<dyn UserDirectory>, Arc<dyn SessionStore>);

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    // Load .env file (if exists)
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt::init();

    let config = Config::from_env()?;

    // Log config status (without revealing secrets)
    tracing::info!(
        "Config loaded: database={}, session_store={}, bcrypt_cost={}",
        config.has_database(),
        config.session_store.name(),
        config.bcrypt_cost
    );

    let (directory, sessions) = build_backends(&config).await?;

    PurgeTask::new(sessions.clone(), PURGE_INTERVAL).spawn();

    let auth_service = AuthService::new(
        directory,
        sessions,
        Arc::new(LogNotifier),
        JwtService::new(config.jwt_config()),
        PasswordHasher::new(config.bcrypt_cost),
    );

    let app = auth_api_router(AuthApiState::new(auth_service)).layer(TraceLayer::new_for_http());

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!("listening on http://{}", config.bind_addr);

    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(feature = "postgres")]
async fn build_backends(config: &Config) -> Result<Backends, Box<dyn Error>> {
    use sessiongate::core::db::{DbConfig, create_pool_with_migrations};
    use sessiongate::core::directory::PgDirectory;
    use sessiongate::core::session::PgSessionStore;

    let db_config = DbConfig::default();

    let directory: Arc<dyn UserDirectory> = match &config.database_url {
        Some(url) => {
            let pool = create_pool_with_migrations(url, &db_config).await?;
            Arc::new(PgDirectory::new(pool))
        }
        None => {
            tracing::warn!("DATABASE_URL not set, users are kept in memory");
            Arc::new(MemoryDirectory::new())
        }
    };

    let sessions: Arc<dyn SessionStore> = match &config.session_store {
        SessionStoreBackend::Memory => Arc::new(MemorySessionStore::new()),
        SessionStoreBackend::Postgres(url) => {
            let pool = create_pool_with_migrations(url, &db_config).await?;
            Arc::new(PgSessionStore::new(pool))
        }
    };

    Ok((directory, sessions))
}

#[cfg(not(feature = "postgres"))]
async fn build_backends(config: &Config) -> Result<Backends, Box<dyn Error>> {
    use sessiongate::core::config::ConfigError;

    if config.has_database() {
        return Err(ConfigError::PostgresDisabled.into());
    }

    let sessions: Arc<dyn SessionStore> = match &config.session_store {
        SessionStoreBackend::Memory => Arc::new(MemorySessionStore::new()),
        SessionStoreBackend::Postgres(_) => return Err(ConfigError::PostgresDisabled.into()),
    };

    Ok((Arc::new(MemoryDirectory::new()), sessions))
}
