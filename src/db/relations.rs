//! Likes and favorites share one shape: a unique (user, place) row whose
//! cardinality per place is the public count. Both endpoints go through the
//! same primitive with a different [`Action`], so their idempotency rules
//! live in exactly one spot.

use rusqlite::{params, Connection};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Relation {
    Like,
    Favorite,
}

impl Relation {
    fn table(self) -> &'static str {
        match self {
            Relation::Like => "likes",
            Relation::Favorite => "favorites",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Ensure the row exists. Re-adding is a no-op.
    Set,
    /// Ensure the row is gone. Removing a missing row is a no-op.
    Clear,
    /// Insert when absent, delete when present.
    Flip,
}

/// Outcome of applying an action: whether the relation now holds, and the
/// place's current count.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Outcome {
    pub present: bool,
    pub count: i64,
}

pub fn apply(
    conn: &Connection,
    relation: Relation,
    user_id: i64,
    place_id: i64,
    action: Action,
) -> rusqlite::Result<Outcome> {
    let table = relation.table();
    let present = match action {
        Action::Set => {
            set(conn, table, user_id, place_id)?;
            true
        }
        Action::Clear => {
            clear(conn, table, user_id, place_id)?;
            false
        }
        Action::Flip => {
            if exists(conn, relation, user_id, place_id)? {
                clear(conn, table, user_id, place_id)?;
                false
            } else {
                set(conn, table, user_id, place_id)?;
                true
            }
        }
    };
    Ok(Outcome {
        present,
        count: count(conn, relation, place_id)?,
    })
}

pub fn exists(
    conn: &Connection,
    relation: Relation,
    user_id: i64,
    place_id: i64,
) -> rusqlite::Result<bool> {
    conn.query_row(
        &format!(
            "SELECT COUNT(*) > 0 FROM {} WHERE user_id = ?1 AND place_id = ?2",
            relation.table()
        ),
        params![user_id, place_id],
        |row| row.get(0),
    )
}

pub fn count(conn: &Connection, relation: Relation, place_id: i64) -> rusqlite::Result<i64> {
    conn.query_row(
        &format!(
            "SELECT COUNT(*) FROM {} WHERE place_id = ?1",
            relation.table()
        ),
        params![place_id],
        |row| row.get(0),
    )
}

// INSERT OR IGNORE also absorbs the race where two requests pass the
// existence check together: the loser's UNIQUE violation becomes a no-op
// instead of an error.
fn set(conn: &Connection, table: &str, user_id: i64, place_id: i64) -> rusqlite::Result<()> {
    conn.execute(
        &format!("INSERT OR IGNORE INTO {table} (user_id, place_id) VALUES (?1, ?2)"),
        params![user_id, place_id],
    )?;
    Ok(())
}

fn clear(conn: &Connection, table: &str, user_id: i64, place_id: i64) -> rusqlite::Result<()> {
    conn.execute(
        &format!("DELETE FROM {table} WHERE user_id = ?1 AND place_id = ?2"),
        params![user_id, place_id],
    )?;
    Ok(())
}
