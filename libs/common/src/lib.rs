//! Common library for the Vidshare backend
//!
//! This crate provides shared functionality used across the services of the
//! Vidshare backend: database connectivity and migrations, the storage error
//! type shared by every repository, and the uniform JSON response envelope.

pub mod database;
pub mod error;
pub mod response;

pub use response::ApiResponse;

/// Example usage of the database module
///
/// ```rust,no_run
/// use common::database::{DatabaseConfig, health_check, init_pool, run_migrations};
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = DatabaseConfig::from_env()?;
///     let pool = init_pool(&config).await?;
///     run_migrations(&pool).await?;
///     let is_healthy = health_check(&pool).await?;
///     println!("Database health check: {}", is_healthy);
///     Ok(())
/// }
/// ```
pub fn example_usage() {}
