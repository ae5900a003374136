use rand::Rng;
use rusqlite::params;

use crate::state::DbPool;

/// Create a new session for a user. Returns the session token.
pub fn create_session(pool: &DbPool, user_id: i64, hours: u64) -> Result<String, rusqlite::Error> {
    let conn = pool.get().map_err(|e| {
        rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_ERROR),
            Some(e.to_string()),
        )
    })?;

    // Expired rows are never read again; drop them while we hold a connection
    conn.execute(
        "DELETE FROM sessions WHERE expires_at <= datetime('now')",
        [],
    )?;

    let token = generate_token();

    conn.execute(
        "INSERT INTO sessions (user_id, token, expires_at) VALUES (?1, ?2, datetime('now', ?3))",
        params![user_id, token, format!("+{} hours", hours)],
    )?;

    Ok(token)
}

/// Delete a session by token.
pub fn delete_session(pool: &DbPool, token: &str) -> Result<(), rusqlite::Error> {
    let conn = pool.get().map_err(|e| {
        rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_ERROR),
            Some(e.to_string()),
        )
    })?;

    conn.execute("DELETE FROM sessions WHERE token = ?1", params![token])?;
    Ok(())
}

/// Generate a cryptographically random 32-byte hex token.
pub fn generate_token() -> String {
    let mut rng = rand::thread_rng();
    let bytes: [u8; 32] = rng.gen();
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use crate::db::users::{self, NewUser};

    #[test]
    fn generate_token_is_64_hex_chars() {
        let token = generate_token();
        assert_eq!(token.len(), 64);
        assert!(token.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn generate_token_is_unique() {
        let t1 = generate_token();
        let t2 = generate_token();
        assert_ne!(t1, t2);
    }

    #[test]
    fn create_and_delete_session() {
        let pool = db::create_test_pool();
        db::run_migrations(&pool).unwrap();
        let uid = {
            let conn = pool.get().unwrap();
            users::create(
                &conn,
                &NewUser {
                    email: "s@example.com",
                    name: "S",
                    password_hash: "x",
                    is_vendor: false,
                },
            )
            .unwrap()
        };

        let token = create_session(&pool, uid, 1).unwrap();
        let conn = pool.get().unwrap();
        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sessions WHERE token = ?1 AND expires_at > datetime('now')",
                params![token],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(count, 1);
        drop(conn);

        delete_session(&pool, &token).unwrap();
        let conn = pool.get().unwrap();
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM sessions", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 0);
    }

    #[test]
    fn expired_sessions_are_purged_on_new_login() {
        let pool = db::create_test_pool();
        db::run_migrations(&pool).unwrap();
        let uid = {
            let conn = pool.get().unwrap();
            users::create(
                &conn,
                &NewUser {
                    email: "p@example.com",
                    name: "P",
                    password_hash: "x",
                    is_vendor: false,
                },
            )
            .unwrap()
        };

        {
            let conn = pool.get().unwrap();
            conn.execute(
                "INSERT INTO sessions (user_id, token, expires_at) \
                 VALUES (?1, 'stale', datetime('now', '-1 hour'))",
                params![uid],
            )
            .unwrap();
        }

        let token = create_session(&pool, uid, 1).unwrap();

        let conn = pool.get().unwrap();
        let stale: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sessions WHERE token = 'stale'",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(stale, 0);
        let live: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM sessions WHERE token = ?1",
                params![token],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(live, 1);
    }
}
