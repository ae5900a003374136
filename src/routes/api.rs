use axum::body::Bytes;
use axum::extract::{FromRequest, Multipart, Path, Query, Request, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use rusqlite::Connection;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::db::models::{Place, Review};
use crate::db::places::{self, NewPlace, PlaceFilter};
use crate::db::relations::{self, Action, Relation};
use crate::db::reviews::{self, NewReview};
use crate::error::{AppError, AppResult};
use crate::extractors::CurrentUser;
use crate::state::AppState;
use crate::uploads;

#[derive(Deserialize)]
pub struct PlaceListQuery {
    pub cuisine: Option<String>,
    pub diet: Option<String>,
    pub price_min: Option<i64>,
    pub price_max: Option<i64>,
}

fn upload_url(file_name: &str) -> String {
    format!("/uploads/{}", file_name)
}

fn review_json(review: &Review, user_name: &str) -> Value {
    json!({
        "id": review.id,
        "user_id": review.user_id,
        "user_name": user_name,
        "place_id": review.place_id,
        "rating": review.rating,
        "text": review.text,
        "cost": review.cost,
        "image_url": review.image_file.as_deref().map(upload_url),
        "created_at": review.created_at,
    })
}

fn place_json(conn: &Connection, place: &Place, include_reviews: bool) -> rusqlite::Result<Value> {
    let stats = places::stats(conn, place.id)?;
    let photo_urls: Vec<String> = places::photo_files(conn, place.id)?
        .iter()
        .map(|f| upload_url(f))
        .collect();

    let mut data = json!({
        "id": place.id,
        "name": place.name,
        "description": place.description,
        "cuisine_types": place.cuisine_types,
        "diet_options": place.diet_options,
        "price_min": place.price_min,
        "price_max": place.price_max,
        "hours": place.hours,
        "contact_info": place.contact_info,
        "menu_url": place.menu_url,
        "latitude": place.latitude,
        "longitude": place.longitude,
        "created_by": place.created_by,
        "created_at": place.created_at,
        "photo_urls": photo_urls,
        "avg_rating": stats.avg_rating,
        "like_count": stats.like_count,
        "favorite_count": stats.favorite_count,
    });

    if include_reviews {
        let listed: Vec<Value> = reviews::list_for_place(conn, place.id)?
            .iter()
            .map(|(r, name)| review_json(r, name))
            .collect();
        data["reviews"] = Value::Array(listed);
    }
    Ok(data)
}

/// GET /api/places — the filtered catalog, newest first.
pub async fn list_places(
    State(state): State<AppState>,
    Query(query): Query<PlaceListQuery>,
) -> AppResult<Json<Value>> {
    let filter = PlaceFilter {
        cuisine: query
            .cuisine
            .as_deref()
            .map(PlaceFilter::keywords)
            .unwrap_or_default(),
        diet: query
            .diet
            .as_deref()
            .map(PlaceFilter::keywords)
            .unwrap_or_default(),
        price_min: query.price_min,
        price_max: query.price_max,
    };

    let conn = state.db.get()?;
    let listed = places::list(&conn, &filter)?
        .iter()
        .map(|p| place_json(&conn, p, false))
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(Json(Value::Array(listed)))
}

/// Text fields and image parts pulled out of a multipart body.
#[derive(Default)]
struct MultipartForm {
    fields: std::collections::HashMap<String, String>,
    images: Vec<(String, String, Bytes)>, // (part name, extension, bytes)
}

impl MultipartForm {
    fn text(&self, name: &str) -> Option<&str> {
        self.fields.get(name).map(|s| s.as_str()).filter(|s| !s.is_empty())
    }

    fn int(&self, name: &str) -> Result<Option<i64>, AppError> {
        match self.text(name) {
            None => Ok(None),
            Some(raw) => raw
                .trim()
                .parse()
                .map(Some)
                .map_err(|_| AppError::BadRequest(format!("Invalid {}", name))),
        }
    }
}

/// Collect a multipart request. Image parts with a disallowed extension or
/// an empty body are silently dropped, matching the upload contract.
async fn read_multipart(mut multipart: Multipart, image_parts: &[&str]) -> AppResult<MultipartForm> {
    let mut form = MultipartForm::default();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Malformed multipart body: {}", e)))?
    {
        let name = field.name().unwrap_or_default().to_string();
        if image_parts.contains(&name.as_str()) {
            let ext = field.file_name().and_then(uploads::allowed_extension);
            let bytes = field
                .bytes()
                .await
                .map_err(|e| AppError::BadRequest(format!("Malformed multipart body: {}", e)))?;
            if let Some(ext) = ext {
                if !bytes.is_empty() {
                    form.images.push((name, ext, bytes));
                }
            }
        } else {
            let text = field
                .text()
                .await
                .map_err(|e| AppError::BadRequest(format!("Malformed multipart body: {}", e)))?;
            form.fields.insert(name, text);
        }
    }
    Ok(form)
}

/// POST /api/places — create a place with optional photos (multipart).
pub async fn create_place(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    multipart: Multipart,
) -> AppResult<Response> {
    let form = read_multipart(multipart, &["photos"]).await?;

    let name = form.text("name").unwrap_or_default().trim().to_string();
    if name.is_empty() {
        return Err(AppError::BadRequest("Name is required".into()));
    }
    let coords = form
        .text("latitude")
        .and_then(|lat| lat.trim().parse::<f64>().ok())
        .zip(form.text("longitude").and_then(|lon| lon.trim().parse::<f64>().ok()));
    let Some((latitude, longitude)) = coords else {
        return Err(AppError::BadRequest(
            "Valid latitude and longitude required".into(),
        ));
    };

    let new_place = NewPlace {
        name,
        description: form.text("description").map(str::to_string),
        cuisine_types: form.text("cuisine_types").unwrap_or_default().to_lowercase(),
        diet_options: form.text("diet_options").unwrap_or_default().to_lowercase(),
        price_min: form.int("price_min")?,
        price_max: form.int("price_max")?,
        hours: form.text("hours").map(str::to_string),
        contact_info: form.text("contact_info").map(str::to_string),
        menu_url: form.text("menu_url").map(str::to_string),
        latitude,
        longitude,
        created_by: user.id,
    };

    let conn = state.db.get()?;
    let place_id = places::insert(&conn, &new_place)?;

    for (_, ext, bytes) in &form.images {
        let file_name = uploads::place_photo_name(place_id, ext);
        uploads::save(state.config.uploads_path(), &file_name, bytes)?;
        places::add_photo(&conn, place_id, &file_name)?;
    }
    tracing::info!(
        "User {} created place {} with {} photo(s)",
        user.id,
        place_id,
        form.images.len()
    );

    let place = places::get(&conn, place_id)?
        .ok_or_else(|| AppError::Internal("Place vanished after insert".into()))?;
    let body = place_json(&conn, &place, true)?;
    Ok((StatusCode::CREATED, Json(body)).into_response())
}

/// GET /api/places/{id} — full place including reviews.
pub async fn get_place(
    State(state): State<AppState>,
    Path(place_id): Path<i64>,
) -> AppResult<Json<Value>> {
    let conn = state.db.get()?;
    let place = places::get(&conn, place_id)?.ok_or(AppError::NotFound)?;
    Ok(Json(place_json(&conn, &place, true)?))
}

/// POST /api/places/{id}/review — add a review with optional image.
pub async fn add_review(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(place_id): Path<i64>,
    multipart: Multipart,
) -> AppResult<Response> {
    let conn = state.db.get()?;
    if places::get(&conn, place_id)?.is_none() {
        return Err(AppError::NotFound);
    }

    let form = read_multipart(multipart, &["image"]).await?;

    let rating = form
        .text("rating")
        .and_then(|r| r.trim().parse::<i64>().ok())
        .filter(|r| (1..=5).contains(r))
        .ok_or_else(|| AppError::BadRequest("Rating 1-5 required".into()))?;

    let image_file = match form.images.first() {
        Some((_, ext, bytes)) => {
            let file_name = uploads::review_image_name(place_id, user.id, ext);
            uploads::save(state.config.uploads_path(), &file_name, bytes)?;
            Some(file_name)
        }
        None => None,
    };

    let review_id = reviews::insert(
        &conn,
        &NewReview {
            user_id: user.id,
            place_id,
            rating,
            text: form.text("text").map(str::to_string),
            cost: form.int("cost")?,
            image_file,
        },
    )?;

    let review = reviews::get(&conn, review_id)?
        .ok_or_else(|| AppError::Internal("Review vanished after insert".into()))?;
    Ok((StatusCode::CREATED, Json(review_json(&review, &user.name))).into_response())
}

/// Pull an `action` value out of a JSON or urlencoded body.
fn parse_action(body: &[u8]) -> Option<String> {
    if let Ok(value) = serde_json::from_slice::<Value>(body) {
        return value
            .get("action")
            .and_then(Value::as_str)
            .map(str::to_string);
    }
    std::str::from_utf8(body).ok().and_then(|text| {
        text.split('&').find_map(|pair| {
            let (key, val) = pair.split_once('=')?;
            (key == "action").then(|| val.trim().to_string())
        })
    })
}

/// Pull the `action` value out of a request body, whichever way the client
/// encoded it: multipart form data, JSON, or urlencoded.
async fn read_action(request: Request) -> AppResult<Option<String>> {
    let is_multipart = request
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|ct| ct.starts_with("multipart/form-data"));

    if is_multipart {
        let multipart = Multipart::from_request(request, &())
            .await
            .map_err(|e| AppError::BadRequest(format!("Malformed multipart body: {}", e)))?;
        let form = read_multipart(multipart, &[]).await?;
        return Ok(form.text("action").map(str::to_string));
    }

    let bytes = axum::body::to_bytes(request.into_body(), usize::MAX)
        .await
        .map_err(|e| AppError::BadRequest(format!("Unreadable body: {}", e)))?;
    Ok(parse_action(&bytes))
}

/// POST /api/places/{id}/favorite — explicit set/clear semantics.
/// `action=remove` clears, anything else sets; both idempotent.
pub async fn favorite(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(place_id): Path<i64>,
    request: Request,
) -> AppResult<Json<Value>> {
    let conn = state.db.get()?;
    if places::get(&conn, place_id)?.is_none() {
        return Err(AppError::NotFound);
    }

    let action = match read_action(request).await?.as_deref() {
        Some("remove") => Action::Clear,
        _ => Action::Set,
    };
    let outcome = relations::apply(&conn, Relation::Favorite, user.id, place_id, action)?;
    let status = if outcome.present { "added" } else { "removed" };
    Ok(Json(json!({
        "status": status,
        "favorite_count": outcome.count,
    })))
}

/// POST /api/places/{id}/like — flip semantics; two calls cancel out.
pub async fn like(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    Path(place_id): Path<i64>,
) -> AppResult<Json<Value>> {
    let conn = state.db.get()?;
    if places::get(&conn, place_id)?.is_none() {
        return Err(AppError::NotFound);
    }

    let outcome = relations::apply(&conn, Relation::Like, user.id, place_id, Action::Flip)?;
    let status = if outcome.present { "liked" } else { "unliked" };
    Ok(Json(json!({
        "status": status,
        "like_count": outcome.count,
    })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_action_reads_json_bodies() {
        assert_eq!(
            parse_action(br#"{"action":"remove"}"#).as_deref(),
            Some("remove")
        );
        assert_eq!(parse_action(br#"{"other":1}"#), None);
    }

    #[test]
    fn parse_action_reads_urlencoded_bodies() {
        assert_eq!(parse_action(b"action=remove").as_deref(), Some("remove"));
        assert_eq!(
            parse_action(b"x=1&action=add&y=2").as_deref(),
            Some("add")
        );
        assert_eq!(parse_action(b""), None);
    }
}
