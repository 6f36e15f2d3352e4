pub mod assets;
pub mod auth;
pub mod characters;
pub mod home;
pub mod spell_lists;
pub mod users;

use axum::routing::get;
use axum::Router;
use tower_http::trace::TraceLayer;

use crate::flash;
use crate::state::AppState;

/// The whole web surface, ready to serve.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/", get(home::index))
        .route("/assets/{*path}", get(assets::serve))
        .merge(auth::router())
        .merge(users::router())
        .merge(characters::router())
        .merge(spell_lists::router())
        .layer(axum::middleware::from_fn(flash::clear_shown_flash))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
