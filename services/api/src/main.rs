use anyhow::Result;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use api::{
    AppState, VideoCatalog,
    config::{DataBackend, ServerConfig},
    create_router,
    repositories::{MemoryVideoStore, VideoRepository, VideoStore},
};
use auth::{
    CredentialStore, JwtConfig, JwtService,
    repositories::{MemoryUserStore, UserRepository, UserStore},
};
use common::database::{DatabaseConfig, health_check, init_pool, run_migrations};
use media::{
    MemoryObjectStore, ObjectStore, Publisher, S3ObjectStore, StagingConfig, StorageBackend,
    StorageConfig, UploadStaging,
};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Starting API service");

    let server_config = ServerConfig::from_env()?;
    let jwt = JwtService::new(&JwtConfig::from_env()?);
    let staging_config = StagingConfig::from_env()?;
    let storage_config = StorageConfig::from_env()?;

    let (users, videos): (Arc<dyn UserStore>, Arc<dyn VideoStore>) =
        match DataBackend::from_env()? {
            DataBackend::Postgres => {
                let db_config = DatabaseConfig::from_env()?;
                let pool = init_pool(&db_config).await?;

                if health_check(&pool).await? {
                    info!("Database connection successful");
                } else {
                    anyhow::bail!("Failed to connect to database");
                }

                run_migrations(&pool).await?;

                let users: Arc<dyn UserStore> = Arc::new(UserRepository::new(pool.clone()));
                let videos: Arc<dyn VideoStore> = Arc::new(VideoRepository::new(pool));
                (users, videos)
            }
            DataBackend::Memory => {
                warn!("Using in-memory stores, data is lost on restart");
                let users: Arc<dyn UserStore> = Arc::new(MemoryUserStore::new());
                let videos: Arc<dyn VideoStore> = Arc::new(MemoryVideoStore::new(users.clone()));
                (users, videos)
            }
        };

    let key_prefix = storage_config.key_prefix.clone();
    let object_store: Arc<dyn ObjectStore> = match storage_config.backend {
        StorageBackend::S3 => Arc::new(S3ObjectStore::connect(storage_config).await?),
        StorageBackend::Memory => {
            warn!("Using in-memory object storage, uploads are lost on restart");
            Arc::new(MemoryObjectStore::default())
        }
    };

    info!(
        "Staging uploads in {} (max {} bytes per file)",
        staging_config.scratch_dir.display(),
        staging_config.max_file_bytes
    );

    let app_state = AppState {
        credentials: CredentialStore::new(users.clone()),
        jwt,
        catalog: VideoCatalog::new(videos, users),
        staging: UploadStaging::new(staging_config),
        publisher: Publisher::new(object_store, key_prefix),
        config: Arc::new(server_config.clone()),
    };

    let app = create_router(app_state);

    let address = server_config.bind_address();
    let listener = tokio::net::TcpListener::bind(&address).await?;
    info!("API service listening on {}", address);

    axum::serve(listener, app).await?;

    Ok(())
}
