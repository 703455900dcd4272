/// PostgreSQL plumbing for Taskboard
///
/// # Modules
///
/// - `pool`: Connection pool management with health checks
/// - `migrations`: Schema migration runner
///
/// Queries themselves live in [`crate::store::postgres`].
///
/// # Example
///
/// ```no_run
/// use taskboard_shared::db::pool::{create_pool, DatabaseConfig};
/// use taskboard_shared::db::migrations::run_migrations;
///
/// #[tokio::main]
/// async fn main() -> Result<(), Box<dyn std::error::Error>> {
///     let config = DatabaseConfig::new(std::env::var("DATABASE_URL")?);
///
///     let pool = create_pool(&config).await?;
///     run_migrations(&pool).await?;
///     Ok(())
/// }
/// ```

pub mod migrations;
pub mod pool;
