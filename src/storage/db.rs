use migration::{Migrator, MigratorTrait};
use sea_orm::{ConnectOptions, ConnectionTrait, Database, DatabaseConnection, DbErr};
use std::time::Duration;

/// Opens the connection pool and brings the schema up to date.
///
/// The returned connection is the only handle to the database: callers pass
/// it into the repository and close it on shutdown with [`close_db`].
pub async fn init_db(
    database_url: &str,
    max_connections: u32,
) -> Result<DatabaseConnection, DbErr> {
    tracing::info!("Connecting to database: {}", database_url);

    let in_memory = database_url.contains(":memory:");
    if !in_memory {
        let path_str = database_url
            .strip_prefix("sqlite://")
            .ok_or_else(|| DbErr::Custom("Invalid SQLite URL format".to_string()))?;
        let path_str = path_str.split('?').next().unwrap_or(path_str);
        let path = std::path::Path::new(path_str);

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| DbErr::Custom(format!("Failed to create DB directory: {}", e)))?;
                tracing::info!("Created database directory: {}", parent.display());
            }
        }

        if !path.exists() {
            std::fs::File::create(path)
                .map_err(|e| DbErr::Custom(format!("Failed to create DB file: {}", e)))?;
            tracing::info!("Created database file: {}", path.display());
        }
    }

    let mut opts = ConnectOptions::new(database_url.to_owned());
    // Every pooled connection to ":memory:" would otherwise see its own database
    opts.max_connections(if in_memory { 1 } else { max_connections })
        .min_connections(1)
        .acquire_timeout(Duration::from_secs(10))
        .sqlx_logging(false);

    let db = Database::connect(opts).await?;

    if !in_memory {
        db.execute_unprepared("PRAGMA journal_mode=WAL;").await?;
    }

    tracing::info!("Applying migrations...");
    Migrator::up(&db, None).await?;

    Ok(db)
}

pub async fn close_db(db: DatabaseConnection) {
    match db.close().await {
        Ok(()) => tracing::info!("Database connection pool closed"),
        Err(e) => tracing::warn!("Error closing database pool: {}", e),
    }
}
