use askama::Template;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::error::AppResult;
use crate::extractors::MaybeUser;
use crate::routes::flash::{self, Flash};
use crate::state::AppState;

#[derive(Template)]
#[template(path = "pages/home.html")]
pub struct HomeTemplate {
    pub logged_in: bool,
    pub is_admin: bool,
    pub user_name: String,
    pub place_count: i64,
    pub flash: String,
}

/// Wrapper to render askama templates as axum responses
pub struct Html<T: Template>(pub T);

impl<T: Template> IntoResponse for Html<T> {
    fn into_response(self) -> Response {
        match self.0.render() {
            Ok(body) => (
                StatusCode::OK,
                [(header::CONTENT_TYPE, "text/html; charset=utf-8")],
                body,
            )
                .into_response(),
            Err(e) => {
                tracing::error!("Template render error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Template error").into_response()
            }
        }
    }
}

pub async fn index(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
    Flash(flash_text): Flash,
) -> AppResult<Response> {
    let conn = state.db.get()?;
    let place_count: i64 = conn.query_row("SELECT COUNT(*) FROM places", [], |row| row.get(0))?;

    let template = HomeTemplate {
        logged_in: user.is_some(),
        is_admin: user.as_ref().is_some_and(|u| u.is_admin),
        user_name: user.map(|u| u.name).unwrap_or_default(),
        place_count,
        flash: flash_text,
    };
    Ok(([flash::clear_header()], Html(template)).into_response())
}
