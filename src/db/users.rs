use rusqlite::{params, Connection, OptionalExtension};

use super::models::User;

pub struct NewUser<'a> {
    pub email: &'a str,
    pub name: &'a str,
    pub password_hash: &'a str,
    pub is_vendor: bool,
}

/// Insert a user. The email is stored lowercased; a case-insensitive
/// duplicate trips the UNIQUE constraint and surfaces as Err.
pub fn create(conn: &Connection, user: &NewUser<'_>) -> rusqlite::Result<i64> {
    conn.execute(
        "INSERT INTO users (email, name, password_hash, is_vendor) VALUES (?1, ?2, ?3, ?4)",
        params![
            user.email.to_lowercase(),
            user.name,
            user.password_hash,
            user.is_vendor
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn find_by_email(conn: &Connection, email: &str) -> rusqlite::Result<Option<User>> {
    conn.query_row(
        &format!(
            "SELECT {} FROM users WHERE email = ?1",
            User::COLUMNS
        ),
        params![email.to_lowercase()],
        User::from_row,
    )
    .optional()
}

pub fn find_by_id(conn: &Connection, id: i64) -> rusqlite::Result<Option<User>> {
    conn.query_row(
        &format!("SELECT {} FROM users WHERE id = ?1", User::COLUMNS),
        params![id],
        User::from_row,
    )
    .optional()
}

pub fn email_taken(conn: &Connection, email: &str) -> rusqlite::Result<bool> {
    conn.query_row(
        "SELECT COUNT(*) > 0 FROM users WHERE email = ?1",
        params![email.to_lowercase()],
        |row| row.get(0),
    )
}
