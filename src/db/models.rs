use rusqlite::Row;
use serde::Serialize;

#[derive(Debug, Clone)]
pub struct User {
    pub id: i64,
    pub email: String,
    pub name: String,
    pub password_hash: String,
    pub is_vendor: bool,
    pub is_admin: bool,
    pub created_at: String,
}

impl User {
    pub const COLUMNS: &'static str =
        "id, email, name, password_hash, is_vendor, is_admin, created_at";

    pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            email: row.get(1)?,
            name: row.get(2)?,
            password_hash: row.get(3)?,
            is_vendor: row.get(4)?,
            is_admin: row.get(5)?,
            created_at: row.get(6)?,
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Place {
    pub id: i64,
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
    pub created_at: String,
}

impl Place {
    pub const COLUMNS: &'static str = "id, name, description, cuisine_types, diet_options, \
         price_min, price_max, hours, contact_info, menu_url, \
         latitude, longitude, created_by, created_at";

    pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            name: row.get(1)?,
            description: row.get(2)?,
            cuisine_types: row.get(3)?,
            diet_options: row.get(4)?,
            price_min: row.get(5)?,
            price_max: row.get(6)?,
            hours: row.get(7)?,
            contact_info: row.get(8)?,
            menu_url: row.get(9)?,
            latitude: row.get(10)?,
            longitude: row.get(11)?,
            created_by: row.get(12)?,
            created_at: row.get(13)?,
        })
    }
}

#[derive(Debug, Clone)]
pub struct Review {
    pub id: i64,
    pub user_id: i64,
    pub place_id: i64,
    pub rating: i64,
    pub text: Option<String>,
    pub cost: Option<i64>,
    pub image_file: Option<String>,
    pub created_at: String,
}

impl Review {
    pub const COLUMNS: &'static str =
        "id, user_id, place_id, rating, text, cost, image_file, created_at";

    pub fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            user_id: row.get(1)?,
            place_id: row.get(2)?,
            rating: row.get(3)?,
            text: row.get(4)?,
            cost: row.get(5)?,
            image_file: row.get(6)?,
            created_at: row.get(7)?,
        })
    }
}

/// Per-place aggregates derived at query time, never stored.
#[derive(Debug, Clone, Copy, Default)]
pub struct PlaceStats {
    pub avg_rating: Option<f64>,
    pub like_count: i64,
    pub favorite_count: i64,
}
