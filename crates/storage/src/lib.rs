//! Storage layer: the SQLite database holding the local mirror of the
//! remote file tree.
//!
//! Owns pool setup and schema migrations for the `files` table; the
//! queries themselves live with the store and reconciliation code in the
//! core crate.

use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;

/// Opens the mirror database, accepting either a ready `sqlite:` URL or a
/// plain filesystem path (parent directories are created as needed).
pub async fn connect(database_url: &str) -> anyhow::Result<SqlitePool> {
    let mut url = database_url.to_string();
    if !database_url.starts_with("sqlite:") {
        let path = std::path::PathBuf::from(database_url);
        if let Some(parent) = path.parent() {
            let _ = std::fs::create_dir_all(parent);
        }
        let norm = path.to_string_lossy().replace('\\', "/");
        if path.is_absolute() {
            url = format!("sqlite:///{}", norm.trim_start_matches('/'));
        } else {
            url = format!("sqlite://{}", norm);
        }
    }
    let mut opts = SqlitePoolOptions::new();
    if url.contains("memory") {
        // In-memory databases vanish per connection unless shared.
        opts = opts.max_connections(1);
    } else {
        opts = opts.max_connections(5);
    }
    let pool = opts.connect(&url).await?;
    Ok(pool)
}

/// Brings the mirror schema up to date. Safe to run on every startup;
/// already-applied migrations are skipped.
pub async fn migrate(pool: &SqlitePool) -> anyhow::Result<()> {
    sqlx::migrate!("./migrations").run(pool).await?;
    Ok(())
}
