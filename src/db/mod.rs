pub mod models;
pub mod places;
pub mod relations;
pub mod reviews;
pub mod users;

use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::params;
use std::path::Path;

use crate::config::AdminConfig;
use crate::state::DbPool;

const MIGRATIONS: &[(&str, &str)] = &[(
    "001_initial",
    include_str!("../../migrations/001_initial.sql"),
)];

pub fn create_pool(db_path: &Path) -> anyhow::Result<DbPool> {
    // Ensure parent directory exists
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let manager = SqliteConnectionManager::file(db_path).with_init(|conn| {
        conn.execute_batch(
            "
            PRAGMA journal_mode = WAL;
            PRAGMA synchronous = NORMAL;
            PRAGMA foreign_keys = ON;
            PRAGMA busy_timeout = 5000;
            ",
        )
    });
    let pool = Pool::builder().max_size(8).build(manager)?;

    Ok(pool)
}

/// In-memory pool for tests. `foreign_keys` is per-connection in SQLite,
/// so it goes through the same init hook as the file-backed pool.
pub fn create_test_pool() -> DbPool {
    let manager = SqliteConnectionManager::memory().with_init(|conn| {
        conn.execute_batch("PRAGMA foreign_keys = ON;")
    });
    Pool::builder().max_size(1).build(manager).unwrap()
}

pub fn run_migrations(pool: &DbPool) -> anyhow::Result<()> {
    let conn = pool.get()?;

    // Create migrations tracking table
    conn.execute_batch(
        "CREATE TABLE IF NOT EXISTS schema_version (
            name TEXT PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT (datetime('now'))
        );",
    )?;

    for (name, sql) in MIGRATIONS {
        let already_applied: bool = conn.query_row(
            "SELECT COUNT(*) > 0 FROM schema_version WHERE name = ?1",
            params![name],
            |row| row.get(0),
        )?;

        if !already_applied {
            tracing::info!("Applying migration: {}", name);
            conn.execute_batch(sql)?;
            conn.execute(
                "INSERT INTO schema_version (name) VALUES (?1)",
                params![name],
            )?;
        }
    }

    tracing::info!("Database migrations complete");
    Ok(())
}

/// Create or update the administrator account from config. Replaces the
/// hardcoded admin credential of earlier iterations: the admin is an
/// ordinary user row with `is_admin` set and a real password hash.
pub fn seed_admin(pool: &DbPool, admin: &AdminConfig) -> anyhow::Result<()> {
    let (Some(email), Some(password)) = (&admin.email, &admin.password) else {
        return Ok(());
    };

    let conn = pool.get()?;
    let hash = crate::auth::password::hash(password)?;
    conn.execute(
        "INSERT INTO users (email, name, password_hash, is_admin) VALUES (?1, 'Administrator', ?2, 1)
         ON CONFLICT(email) DO UPDATE SET password_hash = excluded.password_hash, is_admin = 1",
        params![email.to_lowercase(), hash],
    )?;
    tracing::info!("Administrator account ready: {}", email);
    Ok(())
}
