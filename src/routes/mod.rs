pub mod admin;
pub mod api;
pub mod auth;
pub mod files;
pub mod flash;
pub mod home;
pub mod vendor;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;

use crate::state::AppState;

const MAX_UPLOAD_BYTES: usize = 32 * 1024 * 1024;

pub fn app_router() -> Router<AppState> {
    Router::new()
        .route("/", get(home::index))
        .route("/login", get(auth::login_page).post(auth::login_submit))
        .route(
            "/register",
            get(auth::register_page).post(auth::register_submit),
        )
        .route("/logout", get(auth::logout))
        .route("/vendor", get(vendor::portal))
        .route("/uploads/{file}", get(files::serve))
        .route("/admin", get(admin::dashboard))
        .route("/admin/place/{id}/delete", post(admin::delete_place))
        .route("/admin/review/{id}/delete", post(admin::delete_review))
        .route("/api/places", get(api::list_places).post(api::create_place))
        .route("/api/places/{id}", get(api::get_place))
        .route("/api/places/{id}/review", post(api::add_review))
        .route("/api/places/{id}/favorite", post(api::favorite))
        .route("/api/places/{id}/like", post(api::like))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
}
