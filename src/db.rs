use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};
use std::fs;
use std::path::PathBuf;

pub type DbPool = SqlitePool;

/// Application state holding the database connection pool
///
/// Constructed once at service start and passed explicitly to every
/// collaborator; closed via `shutdown` when the service stops.
pub struct AppState {
  pub db: DbPool,
}

impl AppState {
  pub async fn shutdown(&self) {
    self.db.close().await;
  }
}

/// Resolve the database file path
///
/// `DB_PATH` wins when set; otherwise `DATA_DIR` (default `./data`) joined
/// with `kukkido.db`.
fn get_db_path() -> Result<PathBuf, Box<dyn std::error::Error>> {
  if let Ok(path) = std::env::var("DB_PATH") {
    return Ok(PathBuf::from(path));
  }

  let data_dir = PathBuf::from(std::env::var("DATA_DIR").unwrap_or_else(|_| "./data".to_string()));

  // Create directory if it doesn't exist
  fs::create_dir_all(&data_dir)?;

  Ok(data_dir.join("kukkido.db"))
}

/// Initialize the database connection pool and run migrations
pub async fn initialize_db() -> Result<DbPool, Box<dyn std::error::Error>> {
  let db_path = get_db_path()?;
  let db_url = format!("sqlite://{}?mode=rwc", db_path.display());

  tracing::info!("Initializing database at: {}", db_path.display());

  // Create connection pool
  let pool = SqlitePoolOptions::new()
    .max_connections(5)
    .connect(&db_url)
    .await?;

  // Run migrations
  sqlx::migrate!("./migrations").run(&pool).await?;

  tracing::info!("Database initialized successfully");

  Ok(pool)
}
