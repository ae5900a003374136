use askama::Template;
use axum::extract::{Path, State};
use axum::response::{IntoResponse, Response};

use crate::db::{places, reviews};
use crate::error::AppResult;
use crate::extractors::AdminUser;
use crate::routes::flash::{self, Flash};
use crate::routes::home::Html;
use crate::state::AppState;
use crate::uploads;

#[derive(Template)]
#[template(path = "pages/admin.html")]
pub struct AdminTemplate {
    pub flash: String,
    pub places: Vec<AdminPlaceRow>,
    pub reviews: Vec<AdminReviewRow>,
}

pub struct AdminPlaceRow {
    pub id: i64,
    pub name: String,
    pub created_at: String,
}

pub struct AdminReviewRow {
    pub id: i64,
    pub place_name: String,
    pub rating: i64,
    pub created_at: String,
}

pub async fn dashboard(
    State(state): State<AppState>,
    _admin: AdminUser,
    Flash(flash_text): Flash,
) -> AppResult<Response> {
    let conn = state.db.get()?;
    let places = places::list(&conn, &places::PlaceFilter::default())?
        .into_iter()
        .map(|p| AdminPlaceRow {
            id: p.id,
            name: p.name,
            created_at: p.created_at,
        })
        .collect();
    let reviews = reviews::list_all(&conn)?
        .into_iter()
        .map(|(r, place_name)| AdminReviewRow {
            id: r.id,
            place_name,
            rating: r.rating,
            created_at: r.created_at,
        })
        .collect();

    let template = AdminTemplate {
        flash: flash_text,
        places,
        reviews,
    };
    Ok(([flash::clear_header()], Html(template)).into_response())
}

/// Delete a place and everything hanging off it. Upload files go first,
/// best-effort; the row delete then cascades images, reviews, likes, and
/// favorites. A file that cannot be removed never blocks the delete.
pub async fn delete_place(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(place_id): Path<i64>,
) -> AppResult<Response> {
    let conn = state.db.get()?;
    if places::get(&conn, place_id)?.is_none() {
        return Ok(flash::redirect("/admin", flash::PLACE_MISSING));
    }

    let files = places::upload_files(&conn, place_id)?;
    for file in &files {
        uploads::remove_quiet(state.config.uploads_path(), file);
    }

    places::delete(&conn, place_id)?;
    tracing::info!(
        "Admin deleted place {} and {} upload file(s)",
        place_id,
        files.len()
    );
    Ok(flash::redirect("/admin", flash::PLACE_DELETED))
}

pub async fn delete_review(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(review_id): Path<i64>,
) -> AppResult<Response> {
    let conn = state.db.get()?;
    let Some(review) = reviews::get(&conn, review_id)? else {
        return Ok(flash::redirect("/admin", flash::REVIEW_MISSING));
    };

    if let Some(image) = &review.image_file {
        uploads::remove_quiet(state.config.uploads_path(), image);
    }

    reviews::delete(&conn, review_id)?;
    tracing::info!("Admin deleted review {}", review_id);
    Ok(flash::redirect("/admin", flash::REVIEW_DELETED))
}
