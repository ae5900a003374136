//! Cookie-based flash messages for the HTML surface. Only fixed codes
//! travel in the cookie, so values never need escaping; the human text is
//! resolved when the next page renders.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use std::convert::Infallible;

use crate::extractors::cookie_value;

pub const COOKIE: &str = "fh_flash";

pub const LOGIN_REQUIRED: &str = "login-required";
pub const VENDOR_REQUIRED: &str = "vendor-required";
pub const ADMIN_REQUIRED: &str = "admin-required";
pub const LOGGED_OUT: &str = "logged-out";
pub const ACCOUNT_CREATED: &str = "account-created";
pub const PLACE_DELETED: &str = "place-deleted";
pub const PLACE_MISSING: &str = "place-missing";
pub const REVIEW_DELETED: &str = "review-deleted";
pub const REVIEW_MISSING: &str = "review-missing";

fn message(code: &str) -> &'static str {
    match code {
        LOGIN_REQUIRED => "Please log in first.",
        VENDOR_REQUIRED => "Vendor access required.",
        ADMIN_REQUIRED => "Admin access required.",
        LOGGED_OUT => "Logged out.",
        ACCOUNT_CREATED => "Account created.",
        PLACE_DELETED => "Place deleted.",
        PLACE_MISSING => "Place not found.",
        REVIEW_DELETED => "Review deleted.",
        REVIEW_MISSING => "Review not found.",
        _ => "",
    }
}

/// 302 redirect that carries a flash code for the next page render.
pub fn redirect(location: &str, code: &str) -> Response {
    let cookie = format!("{}={}; Path=/; Max-Age=60", COOKIE, code);
    (
        StatusCode::FOUND,
        [
            (
                header::LOCATION,
                HeaderValue::from_str(location).expect("redirect target is ASCII"),
            ),
            (
                header::SET_COOKIE,
                HeaderValue::from_str(&cookie).expect("flash cookie is ASCII"),
            ),
        ],
    )
        .into_response()
}

/// Set-Cookie header that expires the flash once it has been shown.
pub fn clear_header() -> (header::HeaderName, HeaderValue) {
    (
        header::SET_COOKIE,
        HeaderValue::from_str(&format!("{}=; Path=/; Max-Age=0", COOKIE))
            .expect("flash cookie is ASCII"),
    )
}

/// Extracts the pending flash message, already resolved to display text
/// (empty string when there is none).
pub struct Flash(pub String);

impl<S: Send + Sync> FromRequestParts<S> for Flash {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let text = cookie_value(&parts.headers, COOKIE)
            .map(|code| message(&code).to_string())
            .unwrap_or_default();
        Ok(Flash(text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redirect_sets_location_and_flash_cookie() {
        let response = redirect("/admin", PLACE_DELETED);
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(response.headers()[header::LOCATION], "/admin");
        let cookie = response.headers()[header::SET_COOKIE].to_str().unwrap();
        assert!(cookie.starts_with("fh_flash=place-deleted"));
    }

    #[test]
    fn unknown_codes_resolve_to_empty_text() {
        assert_eq!(message("garbage"), "");
        assert_eq!(message(ADMIN_REQUIRED), "Admin access required.");
    }
}
