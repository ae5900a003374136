use rusqlite::{params, Connection, OptionalExtension};

use super::models::{Place, PlaceStats};

pub struct NewPlace {
    pub name: String,
    pub description: Option<String>,
    pub cuisine_types: String,
    pub diet_options: String,
    pub price_min: Option<i64>,
    pub price_max: Option<i64>,
    pub hours: Option<String>,
    pub contact_info: Option<String>,
    pub menu_url: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
    pub created_by: i64,
}

/// Catalog search filter. Cuisine/diet keywords use AND semantics: a place
/// matches only if its stored (lowercased) string contains every keyword
/// as a substring. Price bounds treat a NULL stored value as a match.
#[derive(Debug, Default, Clone)]
pub struct PlaceFilter {
    pub cuisine: Vec<String>,
    pub diet: Vec<String>,
    pub price_min: Option<i64>,
    pub price_max: Option<i64>,
}

impl PlaceFilter {
    /// Split a comma-separated keyword parameter, trimming blanks and
    /// lowercasing so matching stays case-insensitive.
    pub fn keywords(raw: &str) -> Vec<String> {
        raw.split(',')
            .map(|s| s.trim().to_lowercase())
            .filter(|s| !s.is_empty())
            .collect()
    }

    fn matches(&self, place: &Place) -> bool {
        self.cuisine
            .iter()
            .all(|kw| place.cuisine_types.contains(kw.as_str()))
            && self
                .diet
                .iter()
                .all(|kw| place.diet_options.contains(kw.as_str()))
            && self
                .price_min
                .is_none_or(|min| place.price_min.is_none_or(|v| v >= min))
            && self
                .price_max
                .is_none_or(|max| place.price_max.is_none_or(|v| v <= max))
    }
}

pub fn insert(conn: &Connection, place: &NewPlace) -> rusqlite::Result<i64> {
    conn.execute(
        "INSERT INTO places (name, description, cuisine_types, diet_options, \
         price_min, price_max, hours, contact_info, menu_url, \
         latitude, longitude, created_by) \
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
        params![
            place.name,
            place.description,
            place.cuisine_types,
            place.diet_options,
            place.price_min,
            place.price_max,
            place.hours,
            place.contact_info,
            place.menu_url,
            place.latitude,
            place.longitude,
            place.created_by,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn get(conn: &Connection, id: i64) -> rusqlite::Result<Option<Place>> {
    conn.query_row(
        &format!("SELECT {} FROM places WHERE id = ?1", Place::COLUMNS),
        params![id],
        Place::from_row,
    )
    .optional()
}

/// All places newest-first, filtered in memory. The catalog is small and
/// the substring-AND semantics map poorly onto static SQL.
pub fn list(conn: &Connection, filter: &PlaceFilter) -> rusqlite::Result<Vec<Place>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM places ORDER BY created_at DESC, id DESC",
        Place::COLUMNS
    ))?;
    let places = stmt
        .query_map([], Place::from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(places.into_iter().filter(|p| filter.matches(p)).collect())
}

pub fn list_by_creator(conn: &Connection, user_id: i64) -> rusqlite::Result<Vec<Place>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {} FROM places WHERE created_by = ?1 ORDER BY created_at DESC, id DESC",
        Place::COLUMNS
    ))?;
    let rows = stmt
        .query_map(params![user_id], Place::from_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

pub fn stats(conn: &Connection, place_id: i64) -> rusqlite::Result<PlaceStats> {
    let avg_rating: Option<f64> = conn.query_row(
        "SELECT ROUND(AVG(rating), 2) FROM reviews WHERE place_id = ?1",
        params![place_id],
        |row| row.get(0),
    )?;
    let like_count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM likes WHERE place_id = ?1",
        params![place_id],
        |row| row.get(0),
    )?;
    let favorite_count: i64 = conn.query_row(
        "SELECT COUNT(*) FROM favorites WHERE place_id = ?1",
        params![place_id],
        |row| row.get(0),
    )?;
    Ok(PlaceStats {
        avg_rating,
        like_count,
        favorite_count,
    })
}

pub fn add_photo(conn: &Connection, place_id: i64, file_name: &str) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO place_images (place_id, file_name) VALUES (?1, ?2)",
        params![place_id, file_name],
    )?;
    Ok(())
}

pub fn photo_files(conn: &Connection, place_id: i64) -> rusqlite::Result<Vec<String>> {
    let mut stmt = conn.prepare(
        "SELECT file_name FROM place_images WHERE place_id = ?1 ORDER BY id",
    )?;
    let rows = stmt
        .query_map(params![place_id], |row| row.get(0))?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(rows)
}

/// Every upload backing this place: its photos plus any review images.
/// Collected before deletion so the files can be cleaned up afterwards.
pub fn upload_files(conn: &Connection, place_id: i64) -> rusqlite::Result<Vec<String>> {
    let mut files = photo_files(conn, place_id)?;
    let mut stmt = conn.prepare(
        "SELECT image_file FROM reviews WHERE place_id = ?1 AND image_file IS NOT NULL",
    )?;
    let review_images = stmt
        .query_map(params![place_id], |row| row.get::<_, String>(0))?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    files.extend(review_images);
    Ok(files)
}

/// Delete the place row; images, reviews, likes, and favorites go with it
/// via the schema's ON DELETE CASCADE. Returns false when no row matched.
pub fn delete(conn: &Connection, id: i64) -> rusqlite::Result<bool> {
    let affected = conn.execute("DELETE FROM places WHERE id = ?1", params![id])?;
    Ok(affected > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use crate::db::users::{self, NewUser};
    use crate::state::DbPool;

    fn test_pool() -> DbPool {
        let pool = db::create_test_pool();
        db::run_migrations(&pool).unwrap();
        pool
    }

    fn seed_user(conn: &Connection) -> i64 {
        users::create(
            conn,
            &NewUser {
                email: "owner@example.com",
                name: "Owner",
                password_hash: "x",
                is_vendor: true,
            },
        )
        .unwrap()
    }

    fn new_place(name: &str, created_by: i64) -> NewPlace {
        NewPlace {
            name: name.to_string(),
            description: None,
            cuisine_types: String::new(),
            diet_options: String::new(),
            price_min: None,
            price_max: None,
            hours: None,
            contact_info: None,
            menu_url: None,
            latitude: 1.0,
            longitude: 2.0,
            created_by,
        }
    }

    #[test]
    fn keywords_split_trim_and_lowercase() {
        assert_eq!(
            PlaceFilter::keywords(" Italian, VEGAN ,,thai "),
            vec!["italian", "vegan", "thai"]
        );
        assert!(PlaceFilter::keywords("").is_empty());
    }

    #[test]
    fn cuisine_filter_requires_all_keywords() {
        let pool = test_pool();
        let conn = pool.get().unwrap();
        let uid = seed_user(&conn);

        let mut p = new_place("Both", uid);
        p.cuisine_types = "italian,vegan".to_string();
        insert(&conn, &p).unwrap();
        let mut p = new_place("OnlyItalian", uid);
        p.cuisine_types = "italian".to_string();
        insert(&conn, &p).unwrap();

        let filter = PlaceFilter {
            cuisine: PlaceFilter::keywords("italian,vegan"),
            ..Default::default()
        };
        let found = list(&conn, &filter).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "Both");
    }

    #[test]
    fn diet_filter_requires_all_keywords() {
        let pool = test_pool();
        let conn = pool.get().unwrap();
        let uid = seed_user(&conn);

        let mut p = new_place("Both", uid);
        p.diet_options = "vegan,gluten-free".to_string();
        insert(&conn, &p).unwrap();
        let mut p = new_place("OnlyVegan", uid);
        p.diet_options = "vegan".to_string();
        insert(&conn, &p).unwrap();

        let filter = PlaceFilter {
            diet: PlaceFilter::keywords("vegan,gluten-free"),
            ..Default::default()
        };
        let found = list(&conn, &filter).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name, "Both");
    }

    #[test]
    fn price_filters_treat_null_as_match() {
        let pool = test_pool();
        let conn = pool.get().unwrap();
        let uid = seed_user(&conn);

        let mut cheap = new_place("Cheap", uid);
        cheap.price_min = Some(5);
        cheap.price_max = Some(10);
        insert(&conn, &cheap).unwrap();
        insert(&conn, &new_place("Unpriced", uid)).unwrap();

        let filter = PlaceFilter {
            price_min: Some(8),
            ..Default::default()
        };
        let names: Vec<String> = list(&conn, &filter)
            .unwrap()
            .into_iter()
            .map(|p| p.name)
            .collect();
        // Cheap has price_min 5 < 8, Unpriced has NULL and matches
        assert_eq!(names, vec!["Unpriced"]);

        let filter = PlaceFilter {
            price_max: Some(12),
            ..Default::default()
        };
        let mut names: Vec<String> = list(&conn, &filter)
            .unwrap()
            .into_iter()
            .map(|p| p.name)
            .collect();
        names.sort();
        assert_eq!(names, vec!["Cheap", "Unpriced"]);
    }

    #[test]
    fn stats_absent_rating_and_zero_counts() {
        let pool = test_pool();
        let conn = pool.get().unwrap();
        let uid = seed_user(&conn);
        let pid = insert(&conn, &new_place("Empty", uid)).unwrap();

        let s = stats(&conn, pid).unwrap();
        assert!(s.avg_rating.is_none());
        assert_eq!(s.like_count, 0);
        assert_eq!(s.favorite_count, 0);
    }

    #[test]
    fn avg_rating_rounds_to_two_decimals() {
        let pool = test_pool();
        let conn = pool.get().unwrap();
        let uid = seed_user(&conn);
        let pid = insert(&conn, &new_place("Rated", uid)).unwrap();

        for rating in [4, 5, 5] {
            conn.execute(
                "INSERT INTO reviews (user_id, place_id, rating) VALUES (?1, ?2, ?3)",
                params![uid, pid, rating],
            )
            .unwrap();
        }
        // mean of 4,5,5 = 4.666... -> 4.67
        let s = stats(&conn, pid).unwrap();
        assert_eq!(s.avg_rating, Some(4.67));
    }

    #[test]
    fn delete_cascades_child_rows() {
        let pool = test_pool();
        let conn = pool.get().unwrap();
        let uid = seed_user(&conn);
        let pid = insert(&conn, &new_place("Doomed", uid)).unwrap();

        add_photo(&conn, pid, "place_1_abc.jpg").unwrap();
        conn.execute(
            "INSERT INTO reviews (user_id, place_id, rating, image_file) VALUES (?1, ?2, 3, 'rev.jpg')",
            params![uid, pid],
        )
        .unwrap();
        conn.execute(
            "INSERT INTO likes (user_id, place_id) VALUES (?1, ?2)",
            params![uid, pid],
        )
        .unwrap();
        conn.execute(
            "INSERT INTO favorites (user_id, place_id) VALUES (?1, ?2)",
            params![uid, pid],
        )
        .unwrap();

        assert_eq!(
            upload_files(&conn, pid).unwrap(),
            vec!["place_1_abc.jpg", "rev.jpg"]
        );

        assert!(delete(&conn, pid).unwrap());
        assert!(get(&conn, pid).unwrap().is_none());
        for table in ["place_images", "reviews", "likes", "favorites"] {
            let count: i64 = conn
                .query_row(
                    &format!("SELECT COUNT(*) FROM {table} WHERE place_id = ?1"),
                    params![pid],
                    |row| row.get(0),
                )
                .unwrap();
            assert_eq!(count, 0, "{table} rows should cascade");
        }
    }

    #[test]
    fn delete_missing_place_returns_false() {
        let pool = test_pool();
        let conn = pool.get().unwrap();
        assert!(!delete(&conn, 999).unwrap());
    }
}
