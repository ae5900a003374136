use axum::extract::FromRequestParts;
use axum::http::header;
use axum::http::request::Parts;
use axum::response::{IntoResponse, Response};
use rusqlite::params;

use crate::error::AppError;
use crate::routes::flash;
use crate::state::AppState;

/// The authenticated user behind a session cookie.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: i64,
    pub email: String,
    pub name: String,
    pub is_vendor: bool,
    pub is_admin: bool,
}

/// Who is making this request. Admin is a role on a real account, not an
/// ambient flag: an admin session is still tied to a user row.
#[derive(Debug, Clone)]
pub enum Principal {
    Anonymous,
    User(AuthUser),
    Admin(AuthUser),
}

impl Principal {
    pub fn user(&self) -> Option<&AuthUser> {
        match self {
            Principal::Anonymous => None,
            Principal::User(u) | Principal::Admin(u) => Some(u),
        }
    }
}

impl FromRequestParts<AppState> for Principal {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let Some(token) = cookie_value(&parts.headers, &state.config.auth.cookie_name) else {
            return Ok(Principal::Anonymous);
        };

        let conn = state.db.get()?;
        let user = conn
            .query_row(
                "SELECT u.id, u.email, u.name, u.is_vendor, u.is_admin \
                 FROM sessions s JOIN users u ON u.id = s.user_id \
                 WHERE s.token = ?1 AND s.expires_at > datetime('now')",
                params![token],
                |row| {
                    Ok(AuthUser {
                        id: row.get(0)?,
                        email: row.get(1)?,
                        name: row.get(2)?,
                        is_vendor: row.get(3)?,
                        is_admin: row.get(4)?,
                    })
                },
            )
            .ok();

        Ok(match user {
            None => Principal::Anonymous,
            Some(u) if u.is_admin => Principal::Admin(u),
            Some(u) => Principal::User(u),
        })
    }
}

/// Required authentication for API endpoints. Rejects with 401 JSON.
pub struct CurrentUser(pub AuthUser);

impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        match Principal::from_request_parts(parts, state).await? {
            Principal::Anonymous => Err(AppError::Unauthorized),
            Principal::User(u) | Principal::Admin(u) => Ok(CurrentUser(u)),
        }
    }
}

/// Optional user for pages that render either way.
pub struct MaybeUser(pub Option<AuthUser>);

impl FromRequestParts<AppState> for MaybeUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let principal = Principal::from_request_parts(parts, state).await?;
        Ok(MaybeUser(principal.user().cloned()))
    }
}

/// Vendor-portal access: an authenticated user with the vendor flag.
/// HTML-facing, so rejection is a redirect with a flash, never JSON.
pub struct VendorUser(pub AuthUser);

impl FromRequestParts<AppState> for VendorUser {
    type Rejection = Response;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let principal = Principal::from_request_parts(parts, state)
            .await
            .map_err(IntoResponse::into_response)?;
        match principal.user() {
            None => Err(flash::redirect("/login", flash::LOGIN_REQUIRED)),
            Some(u) if !u.is_vendor => Err(flash::redirect("/", flash::VENDOR_REQUIRED)),
            Some(u) => Ok(VendorUser(u.clone())),
        }
    }
}

/// Moderation access: an authenticated user with the admin role.
pub struct AdminUser(pub AuthUser);

impl FromRequestParts<AppState> for AdminUser {
    type Rejection = Response;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let principal = Principal::from_request_parts(parts, state)
            .await
            .map_err(IntoResponse::into_response)?;
        match principal {
            Principal::Admin(u) => Ok(AdminUser(u)),
            _ => Err(flash::redirect("/login", flash::ADMIN_REQUIRED)),
        }
    }
}

pub fn cookie_value(headers: &axum::http::HeaderMap, name: &str) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|s| s.split(';'))
        .map(|s| s.trim())
        .find_map(|cookie| {
            let (key, val) = cookie.split_once('=')?;
            if key.trim() == name {
                Some(val.trim().to_string())
            } else {
                None
            }
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    fn headers_with_cookie(value: &str) -> axum::http::HeaderMap {
        let req = Request::builder()
            .header(header::COOKIE, value)
            .body(())
            .unwrap();
        req.into_parts().0.headers
    }

    #[test]
    fn cookie_value_finds_named_cookie() {
        let headers = headers_with_cookie("a=1; fh_session=tok123; b=2");
        assert_eq!(
            cookie_value(&headers, "fh_session").as_deref(),
            Some("tok123")
        );
        assert_eq!(cookie_value(&headers, "missing"), None);
    }

    #[test]
    fn cookie_value_handles_whitespace() {
        let headers = headers_with_cookie("  fh_session = tok ;x=y");
        assert_eq!(cookie_value(&headers, "fh_session").as_deref(), Some("tok"));
    }
}
