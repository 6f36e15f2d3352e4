use askama::Template;
use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::{AppendHeaders, IntoResponse, Response};
use axum::routing::get;
use axum::Router;

use crate::auth::handlers::clear_session_cookie;
use crate::auth::{ownership, users};
use crate::characters::{repository, Character};
use crate::db::models::User;
use crate::error::{AppError, AppResult};
use crate::extractors::CurrentUser;
use crate::flash::{Flash, IncomingFlash};
use crate::routes::home::{Html, Layout};
use crate::state::AppState;

#[derive(Template)]
#[template(path = "pages/user.html")]
pub struct UserTemplate {
    pub layout: Layout,
    pub profile: User,
    pub characters: Vec<Character>,
}

#[derive(Template)]
#[template(path = "pages/user_delete.html")]
pub struct UserDeleteTemplate {
    pub layout: Layout,
    pub profile: User,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/user/{id}", get(profile))
        .route("/user/{id}/delete", get(delete_page).post(delete_submit))
}

async fn profile(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    user: CurrentUser,
    flash: IncomingFlash,
) -> AppResult<Response> {
    if !ownership::owns(&user, id) {
        return Ok(ownership::reject(
            &user,
            &format!("view profile {}", id),
            "You can't access another users profile",
            "/",
        ));
    }

    let conn = state.db.get()?;
    let profile = users::find_user(&conn, id)?.ok_or(AppError::NotFound)?;
    let characters = repository::list_for_user(&conn, id)?;

    Ok(Html(UserTemplate {
        layout: Layout::new(Some(user), flash),
        profile,
        characters,
    })
    .into_response())
}

async fn delete_page(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    user: CurrentUser,
    flash: IncomingFlash,
) -> AppResult<Response> {
    if !ownership::owns(&user, id) {
        return Ok(ownership::reject(
            &user,
            &format!("delete user {}", id),
            "You can't delete another user",
            "/",
        ));
    }

    let conn = state.db.get()?;
    let profile = users::find_user(&conn, id)?.ok_or(AppError::NotFound)?;

    Ok(Html(UserDeleteTemplate {
        layout: Layout::new(Some(user), flash),
        profile,
    })
    .into_response())
}

/// Deletes the account and everything it owns, then signs the browser out.
async fn delete_submit(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    user: CurrentUser,
) -> AppResult<Response> {
    if !ownership::owns(&user, id) {
        return Ok(ownership::reject(
            &user,
            &format!("delete user {}", id),
            "You can't delete another user",
            "/",
        ));
    }

    let conn = state.db.get()?;
    if !users::delete_user(&conn, id)? {
        return Err(AppError::NotFound);
    }
    tracing::info!("Deleted user {} ({})", user.username, user.id);

    Ok((
        StatusCode::SEE_OTHER,
        AppendHeaders([
            (header::LOCATION, "/".to_string()),
            (header::SET_COOKIE, clear_session_cookie(&state.config.auth)),
            (
                header::SET_COOKIE,
                Flash::success(format!("Deleted {} account", user.username)).cookie(),
            ),
        ]),
    )
        .into_response())
}
