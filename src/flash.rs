//! One-shot messages shown on the next rendered page.
//!
//! A flash travels in its own cookie, set on a redirect and cleared by the
//! first page that displays it.

use axum::extract::{FromRequestParts, Request};
use axum::http::request::Parts;
use axum::http::{header, HeaderValue, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};
use std::convert::Infallible;

use crate::extractors::cookie_value;

pub const FLASH_COOKIE: &str = "spell_tracker_flash";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlashKind {
    Success,
    Error,
}

impl FlashKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            FlashKind::Success => "success",
            FlashKind::Error => "error",
        }
    }

    fn parse(value: &str) -> Option<Self> {
        match value {
            "success" => Some(FlashKind::Success),
            "error" => Some(FlashKind::Error),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Flash {
    pub kind: FlashKind,
    pub message: String,
}

impl Flash {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: FlashKind::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: FlashKind::Error,
            message: message.into(),
        }
    }

    pub fn css_class(&self) -> &'static str {
        self.kind.as_str()
    }

    fn encode(&self) -> String {
        url::form_urlencoded::Serializer::new(String::new())
            .append_pair("kind", self.kind.as_str())
            .append_pair("message", &self.message)
            .finish()
    }

    fn decode(value: &str) -> Option<Self> {
        let mut kind = None;
        let mut message = None;
        for (key, val) in url::form_urlencoded::parse(value.as_bytes()) {
            match key.as_ref() {
                "kind" => kind = FlashKind::parse(&val),
                "message" => message = Some(val.into_owned()),
                _ => {}
            }
        }
        Some(Self {
            kind: kind?,
            message: message?,
        })
    }

    /// `Set-Cookie` value carrying this flash to the next request.
    pub fn cookie(&self) -> String {
        format!(
            "{}={}; HttpOnly; SameSite=Strict; Path=/; Max-Age=300",
            FLASH_COOKIE,
            self.encode()
        )
    }

    /// 303 redirect to `to` carrying this flash.
    pub fn redirect(self, to: &str) -> Response {
        (
            StatusCode::SEE_OTHER,
            [
                (header::LOCATION, to.to_string()),
                (header::SET_COOKIE, self.cookie()),
            ],
            "",
        )
            .into_response()
    }
}

pub fn clear_flash_cookie() -> String {
    format!(
        "{}=; HttpOnly; SameSite=Strict; Path=/; Max-Age=0",
        FLASH_COOKIE
    )
}

/// Flash message that arrived with the request, if any.
#[derive(Debug, Clone, Default)]
pub struct IncomingFlash(pub Option<Flash>);

impl<S: Send + Sync> FromRequestParts<S> for IncomingFlash {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(IncomingFlash(
            cookie_value(&parts.headers, FLASH_COOKIE).and_then(Flash::decode),
        ))
    }
}

/// Middleware that expires a flash once a page has shown it. Redirects pass
/// it through untouched, and so does any response that sets a new one.
pub async fn clear_shown_flash(req: Request, next: Next) -> Response {
    let had_flash = cookie_value(req.headers(), FLASH_COOKIE).is_some();
    let mut response = next.run(req).await;

    let sets_flash = response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .any(|v| v.starts_with(FLASH_COOKIE));

    if had_flash && response.status() == StatusCode::OK && !sets_flash {
        if let Ok(value) = HeaderValue::from_str(&clear_flash_cookie()) {
            response.headers_mut().append(header::SET_COOKIE, value);
        }
    }
    response
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cookie_carries_punctuation() {
        let flash = Flash::error("You can't delete another user's list; sorry!");
        let cookie = flash.cookie();
        let value = cookie
            .strip_prefix("spell_tracker_flash=")
            .and_then(|rest| rest.split(';').next())
            .unwrap();

        assert!(!value.contains(' '));
        assert!(!value.contains(';'));
        assert_eq!(Flash::decode(value), Some(flash));
    }

    #[test]
    fn garbage_cookie_is_ignored() {
        assert_eq!(Flash::decode("kind=shout&message=hi"), None);
        assert_eq!(Flash::decode("nonsense"), None);
    }

    #[tokio::test]
    async fn shown_flash_is_cleared_but_redirects_keep_it() {
        use axum::body::Body;
        use axum::routing::get;
        use axum::Router;
        use tower::ServiceExt;

        let app = Router::new()
            .route("/page", get(|| async { "page" }))
            .route("/bounce", get(|| async { Flash::error("again").redirect("/page") }))
            .layer(axum::middleware::from_fn(clear_shown_flash));

        let request = |uri: &str| {
            axum::http::Request::builder()
                .uri(uri)
                .header(header::COOKIE, Flash::success("hi").cookie())
                .body(Body::empty())
                .unwrap()
        };

        let page = app.clone().oneshot(request("/page")).await.unwrap();
        assert_eq!(page.headers()[header::SET_COOKIE], clear_flash_cookie());

        let bounce = app.oneshot(request("/bounce")).await.unwrap();
        let cookies: Vec<_> = bounce.headers().get_all(header::SET_COOKIE).iter().collect();
        assert_eq!(cookies.len(), 1);
        assert!(cookies[0].to_str().unwrap().contains("again"));
    }

    #[test]
    fn redirect_is_see_other() {
        let response = Flash::success("Saved").redirect("/char/1");
        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_eq!(response.headers()[header::LOCATION], "/char/1");
    }
}
