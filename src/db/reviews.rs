use rusqlite::{params, Connection, OptionalExtension};

use super::models::Review;

pub struct NewReview {
    pub user_id: i64,
    pub place_id: i64,
    pub rating: i64,
    pub text: Option<String>,
    pub cost: Option<i64>,
    pub image_file: Option<String>,
}

pub fn insert(conn: &Connection, review: &NewReview) -> rusqlite::Result<i64> {
    conn.execute(
        "INSERT INTO reviews (user_id, place_id, rating, text, cost, image_file) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            review.user_id,
            review.place_id,
            review.rating,
            review.text,
            review.cost,
            review.image_file,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn get(conn: &Connection, id: i64) -> rusqlite::Result<Option<Review>> {
    conn.query_row(
        &format!("SELECT {} FROM reviews WHERE id = ?1", Review::COLUMNS),
        params![id],
        Review::from_row,
    )
    .optional()
}

/// Reviews for a place with the author's display name, newest first.
pub fn list_for_place(conn: &Connection, place_id: i64) -> rusqlite::Result<Vec<(Review, String)>> {
    let mut stmt = conn.prepare(
        "SELECT r.id, r.user_id, r.place_id, r.rating, r.text, r.cost, r.image_file, r.created_at, \
                u.name \
         FROM reviews r JOIN users u ON u.id = r.user_id \
         WHERE r.place_id = ?1 ORDER BY r.created_at DESC, r.id DESC",
    )?;
    let rows = stmt
        .query_map(params![place_id], |row| {
            Ok((Review::from_row(row)?, row.get(8)?))
        })?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

/// All reviews newest-first with place name, for the admin dashboard.
pub fn list_all(conn: &Connection) -> rusqlite::Result<Vec<(Review, String)>> {
    let mut stmt = conn.prepare(
        "SELECT r.id, r.user_id, r.place_id, r.rating, r.text, r.cost, r.image_file, r.created_at, \
                p.name \
         FROM reviews r JOIN places p ON p.id = r.place_id \
         ORDER BY r.created_at DESC, r.id DESC",
    )?;
    let rows = stmt
        .query_map([], |row| Ok((Review::from_row(row)?, row.get(8)?)))?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

pub fn delete(conn: &Connection, id: i64) -> rusqlite::Result<bool> {
    let affected = conn.execute("DELETE FROM reviews WHERE id = ?1", params![id])?;
    Ok(affected > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use crate::db::places::{self, NewPlace};
    use crate::db::users::{self, NewUser};
    use crate::state::DbPool;

    fn setup() -> (DbPool, i64, i64) {
        let pool = db::create_test_pool();
        db::run_migrations(&pool).unwrap();
        let conn = pool.get().unwrap();
        let uid = users::create(
            &conn,
            &NewUser {
                email: "rev@example.com",
                name: "Reviewer",
                password_hash: "x",
                is_vendor: false,
            },
        )
        .unwrap();
        let pid = places::insert(
            &conn,
            &NewPlace {
                name: "Spot".to_string(),
                description: None,
                cuisine_types: String::new(),
                diet_options: String::new(),
                price_min: None,
                price_max: None,
                hours: None,
                contact_info: None,
                menu_url: None,
                latitude: 0.0,
                longitude: 0.0,
                created_by: uid,
            },
        )
        .unwrap();
        drop(conn);
        (pool, uid, pid)
    }

    #[test]
    fn out_of_range_ratings_violate_the_check_constraint() {
        let (pool, uid, pid) = setup();
        let conn = pool.get().unwrap();

        for bad in [0, 6] {
            let result = insert(
                &conn,
                &NewReview {
                    user_id: uid,
                    place_id: pid,
                    rating: bad,
                    text: None,
                    cost: None,
                    image_file: None,
                },
            );
            assert!(result.is_err(), "rating {bad} should be rejected");
        }
    }

    #[test]
    fn same_user_may_review_a_place_twice() {
        let (pool, uid, pid) = setup();
        let conn = pool.get().unwrap();

        for rating in [1, 5] {
            insert(
                &conn,
                &NewReview {
                    user_id: uid,
                    place_id: pid,
                    rating,
                    text: None,
                    cost: None,
                    image_file: None,
                },
            )
            .unwrap();
        }

        let listed = list_for_place(&conn, pid).unwrap();
        assert_eq!(listed.len(), 2);
        assert!(listed.iter().all(|(_, name)| name == "Reviewer"));
    }

    #[test]
    fn delete_review_row() {
        let (pool, uid, pid) = setup();
        let conn = pool.get().unwrap();

        let id = insert(
            &conn,
            &NewReview {
                user_id: uid,
                place_id: pid,
                rating: 3,
                text: Some("fine".to_string()),
                cost: Some(12),
                image_file: None,
            },
        )
        .unwrap();

        assert!(delete(&conn, id).unwrap());
        assert!(get(&conn, id).unwrap().is_none());
        assert!(!delete(&conn, id).unwrap());
    }
}
