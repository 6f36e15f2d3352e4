use askama::Template;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{AppendHeaders, IntoResponse, Response};

use crate::auth::{session, users};
use crate::config::AuthConfig;
use crate::error::AppResult;
use crate::extractors::{cookie_value, MaybeUser};
use crate::flash::{Flash, IncomingFlash};
use crate::forms::{FieldErrors, FormData, LoginForm, SignupForm};
use crate::routes::home::{Html, Layout};
use crate::state::AppState;

// -- Templates --

#[derive(Template)]
#[template(path = "pages/signup.html")]
pub struct SignupTemplate {
    pub layout: Layout,
    pub form: SignupForm,
    pub errors: FieldErrors,
}

#[derive(Template)]
#[template(path = "pages/login.html")]
pub struct LoginTemplate {
    pub layout: Layout,
    pub form: LoginForm,
    pub errors: FieldErrors,
}

// -- Cookie helpers --

fn session_cookie(auth: &AuthConfig, token: &str) -> String {
    let max_age_secs = auth.session_hours * 3600;
    format!(
        "{}={}; HttpOnly; SameSite=Strict; Path=/; Max-Age={}",
        auth.cookie_name, token, max_age_secs
    )
}

pub fn clear_session_cookie(auth: &AuthConfig) -> String {
    format!(
        "{}=; HttpOnly; SameSite=Strict; Path=/; Max-Age=0",
        auth.cookie_name
    )
}

/// Starts a session for `user_id` and redirects to their profile with
/// `flash`, setting both cookies.
fn start_session(
    state: &AppState,
    conn: &rusqlite::Connection,
    user_id: i64,
    flash: Flash,
) -> AppResult<Response> {
    let auth = &state.config.auth;
    let token = session::create_session(conn, user_id, auth.session_hours)?;

    Ok((
        StatusCode::SEE_OTHER,
        AppendHeaders([
            (header::LOCATION, format!("/user/{}", user_id)),
            (header::SET_COOKIE, session_cookie(auth, &token)),
            (header::SET_COOKIE, flash.cookie()),
        ]),
    )
        .into_response())
}

fn already_signed_in(maybe_user: &MaybeUser) -> Option<Response> {
    let user = maybe_user.0.as_ref()?;
    Some(
        Flash::success(format!("Welcome back {}!", user.username))
            .redirect(&format!("/user/{}", user.id)),
    )
}

// -- Signup --

/// GET /signup
pub async fn signup_page(maybe_user: MaybeUser, flash: IncomingFlash) -> Response {
    if let Some(redirect) = already_signed_in(&maybe_user) {
        return redirect;
    }

    Html(SignupTemplate {
        layout: Layout::new(None, flash),
        form: SignupForm::default(),
        errors: FieldErrors::default(),
    })
    .into_response()
}

/// POST /signup: creates the account and signs it in.
pub async fn signup_submit(
    State(state): State<AppState>,
    flash: IncomingFlash,
    body: Bytes,
) -> AppResult<Response> {
    let form = SignupForm::from_data(&FormData::parse(&body));
    let mut errors = form.validate();

    let conn = state.db.get()?;
    if errors.get("username").is_none() && users::username_taken(&conn, &form.username)? {
        errors.add("username", "Username already taken");
    }
    if errors.get("email").is_none() && users::email_taken(&conn, &form.email)? {
        errors.add("email", "Email already in use");
    }

    if !errors.is_empty() {
        return Ok(Html(SignupTemplate {
            layout: Layout::new(None, flash),
            form: SignupForm {
                password: String::new(),
                confirm: String::new(),
                ..form
            },
            errors,
        })
        .into_response());
    }

    let user = users::signup(
        &conn,
        &form.username,
        &form.email,
        &form.password,
        state.config.auth.bcrypt_cost,
    )?;

    start_session(
        &state,
        &conn,
        user.id,
        Flash::success(format!("Welcome, {}!", user.username)),
    )
}

// -- Login --

/// GET /login
pub async fn login_page(maybe_user: MaybeUser, flash: IncomingFlash) -> Response {
    if let Some(redirect) = already_signed_in(&maybe_user) {
        return redirect;
    }

    Html(LoginTemplate {
        layout: Layout::new(None, flash),
        form: LoginForm::default(),
        errors: FieldErrors::default(),
    })
    .into_response()
}

/// POST /login
pub async fn login_submit(
    State(state): State<AppState>,
    flash: IncomingFlash,
    body: Bytes,
) -> AppResult<Response> {
    let form = LoginForm::from_data(&FormData::parse(&body));
    let mut errors = form.validate();

    let conn = state.db.get()?;
    if errors.is_empty() {
        if let Some(user) = users::authenticate(&conn, &form.username, &form.password)? {
            tracing::info!("User {} ({}) logged in", user.username, user.id);
            return start_session(
                &state,
                &conn,
                user.id,
                Flash::success(format!("Hello, {}!", user.username)),
            );
        }
        tracing::info!("Failed login for {}", form.username);
        errors.add("form", "Invalid credentials.");
    }

    Ok(Html(LoginTemplate {
        layout: Layout::new(None, flash),
        form: LoginForm {
            password: String::new(),
            ..form
        },
        errors,
    })
    .into_response())
}

// -- Logout --

/// GET or POST /logout
pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> AppResult<Response> {
    let auth = &state.config.auth;

    if let Some(token) = cookie_value(&headers, &auth.cookie_name) {
        let conn = state.db.get()?;
        if let Some(user) = session::resolve_session(&conn, token)? {
            tracing::info!("User {} ({}) logged out", user.username, user.id);
        }
        session::delete_session(&conn, token)?;
    }

    Ok((
        StatusCode::SEE_OTHER,
        AppendHeaders([
            (header::LOCATION, "/".to_string()),
            (header::SET_COOKIE, clear_session_cookie(auth)),
            (
                header::SET_COOKIE,
                Flash::success("Successfully logged out!").cookie(),
            ),
        ]),
    )
        .into_response())
}
