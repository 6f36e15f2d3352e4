use askama::Template;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::extractors::{CurrentUser, MaybeUser};
use crate::flash::{Flash, IncomingFlash};

/// Chrome shared by every page: the signed-in user for the nav bar and the
/// flash message to show, if any.
#[derive(Debug, Clone, Default)]
pub struct Layout {
    pub user: Option<CurrentUser>,
    pub flash: Option<Flash>,
}

impl Layout {
    pub fn new(user: Option<CurrentUser>, flash: IncomingFlash) -> Self {
        Self {
            user,
            flash: flash.0,
        }
    }
}

#[derive(Template)]
#[template(path = "pages/home.html")]
pub struct HomeTemplate {
    pub layout: Layout,
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

pub async fn index(maybe_user: MaybeUser, flash: IncomingFlash) -> Response {
    // Signed-in users go straight to their profile; a pending flash rides along
    if let Some(user) = maybe_user.0 {
        let flash = flash
            .0
            .unwrap_or_else(|| Flash::success(format!("Welcome back {}!", user.username)));
        return flash.redirect(&format!("/user/{}", user.id));
    }

    Html(HomeTemplate {
        layout: Layout::new(None, flash),
    })
    .into_response()
}
