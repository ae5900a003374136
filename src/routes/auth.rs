use askama::Template;
use axum::extract::{Form, State};
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::Deserialize;

use crate::auth::{password, session};
use crate::config::Config;
use crate::db::users::{self, NewUser};
use crate::error::AppResult;
use crate::extractors::cookie_value;
use crate::routes::flash::{self, Flash};
use crate::routes::home::Html;
use crate::state::AppState;

#[derive(Template)]
#[template(path = "pages/login.html")]
pub struct LoginTemplate {
    pub error: String,
    pub flash: String,
}

#[derive(Template)]
#[template(path = "pages/register.html")]
pub struct RegisterTemplate {
    pub error: String,
}

#[derive(Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Deserialize)]
pub struct RegisterForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
    /// Checkbox value; present as "on" when ticked.
    #[serde(default)]
    pub is_vendor: Option<String>,
}

fn session_cookie(config: &Config, token: &str) -> HeaderValue {
    let cookie = format!(
        "{}={}; HttpOnly; SameSite=Lax; Path=/; Max-Age={}",
        config.auth.cookie_name,
        token,
        config.auth.session_hours * 3600
    );
    HeaderValue::from_str(&cookie).expect("session cookie is ASCII")
}

fn expired_session_cookie(config: &Config) -> HeaderValue {
    let cookie = format!("{}=; HttpOnly; Path=/; Max-Age=0", config.auth.cookie_name);
    HeaderValue::from_str(&cookie).expect("session cookie is ASCII")
}

pub async fn login_page(Flash(flash_text): Flash) -> Response {
    (
        [flash::clear_header()],
        Html(LoginTemplate {
            error: String::new(),
            flash: flash_text,
        }),
    )
        .into_response()
}

/// One login path for everyone: look up by lowercased email and verify the
/// bcrypt hash. Admins are ordinary accounts with the admin role; they just
/// land on the dashboard instead of the front page.
pub async fn login_submit(
    State(state): State<AppState>,
    Form(form): Form<LoginForm>,
) -> AppResult<Response> {
    let conn = state.db.get()?;
    let user = users::find_by_email(&conn, form.email.trim())?;
    drop(conn);

    let Some(user) = user.filter(|u| password::verify(&form.password, &u.password_hash)) else {
        // Same message for unknown email and wrong password
        return Ok(Html(LoginTemplate {
            error: "Invalid credentials".to_string(),
            flash: String::new(),
        })
        .into_response());
    };

    let token = session::create_session(&state.db, user.id, state.config.auth.session_hours)?;
    let location = if user.is_admin { "/admin" } else { "/" };

    Ok((
        StatusCode::FOUND,
        [
            (header::LOCATION, HeaderValue::from_static(location)),
            (header::SET_COOKIE, session_cookie(&state.config, &token)),
        ],
    )
        .into_response())
}

pub async fn register_page() -> Response {
    Html(RegisterTemplate {
        error: String::new(),
    })
    .into_response()
}

pub async fn register_submit(
    State(state): State<AppState>,
    Form(form): Form<RegisterForm>,
) -> AppResult<Response> {
    let name = form.name.trim();
    let email = form.email.trim().to_lowercase();
    let is_vendor = form.is_vendor.as_deref() == Some("on");

    let rerender = |msg: &str| {
        Html(RegisterTemplate {
            error: msg.to_string(),
        })
        .into_response()
    };

    if name.is_empty() || email.is_empty() || form.password.is_empty() {
        return Ok(rerender("All fields are required."));
    }

    let conn = state.db.get()?;
    if users::email_taken(&conn, &email)? {
        return Ok(rerender("Email already registered."));
    }

    let hash = password::hash(&form.password)
        .map_err(|e| crate::error::AppError::Internal(e.to_string()))?;
    let user_id = users::create(
        &conn,
        &NewUser {
            email: &email,
            name,
            password_hash: &hash,
            is_vendor,
        },
    )?;
    drop(conn);

    let token = session::create_session(&state.db, user_id, state.config.auth.session_hours)?;
    tracing::info!("Registered user {} ({})", user_id, email);

    let mut response = flash::redirect("/", flash::ACCOUNT_CREATED);
    response
        .headers_mut()
        .append(header::SET_COOKIE, session_cookie(&state.config, &token));
    Ok(response)
}

pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> AppResult<Response> {
    if let Some(token) = cookie_value(&headers, &state.config.auth.cookie_name) {
        session::delete_session(&state.db, &token)?;
    }

    let mut response = flash::redirect("/", flash::LOGGED_OUT);
    response.headers_mut().append(
        header::SET_COOKIE,
        expired_session_cookie(&state.config),
    );
    Ok(response)
}
