use askama::Template;
use axum::extract::State;
use axum::response::{IntoResponse, Response};

use crate::db::places;
use crate::error::AppResult;
use crate::extractors::VendorUser;
use crate::routes::home::Html;
use crate::state::AppState;

#[derive(Template)]
#[template(path = "pages/vendor.html")]
pub struct VendorTemplate {
    pub user_name: String,
    pub places: Vec<VendorPlaceRow>,
}

pub struct VendorPlaceRow {
    pub id: i64,
    pub name: String,
    pub cuisine_types: String,
    pub created_at: String,
}

pub async fn portal(
    State(state): State<AppState>,
    VendorUser(user): VendorUser,
) -> AppResult<Response> {
    let conn = state.db.get()?;
    let rows = places::list_by_creator(&conn, user.id)?
        .into_iter()
        .map(|p| VendorPlaceRow {
            id: p.id,
            name: p.name,
            cuisine_types: p.cuisine_types,
            created_at: p.created_at,
        })
        .collect();

    Ok(Html(VendorTemplate {
        user_name: user.name,
        places: rows,
    })
    .into_response())
}
