use axum::response::Response;

use crate::extractors::CurrentUser;
use crate::flash::Flash;

/// Whether the acting user owns a resource whose owner is `owner_id`.
///
/// There is no blanket gate: every mutating handler calls this itself.
pub fn owns(user: &CurrentUser, owner_id: i64) -> bool {
    user.id == owner_id
}

/// Refuse a mutation: log it, flash `message` and redirect to `to`.
pub fn reject(user: &CurrentUser, action: &str, message: &str, to: &str) -> Response {
    tracing::warn!(
        "User {} ({}) denied: {}",
        user.username,
        user.id,
        action
    );
    Flash::error(message).redirect(to)
}
