#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Request, Response};
use axum::Router;
use rusqlite::Connection;
use tempfile::TempDir;
use tower::ServiceExt;

use spell_tracker::auth::{session, users};
use spell_tracker::config::Config;
use spell_tracker::db;
use spell_tracker::routes;
use spell_tracker::rules::{InMemoryRules, RulesApi};
use spell_tracker::state::{AppState, DbPool};

pub const TEST_COST: u32 = 4;

pub const DRUID_BLOCK: &[(&str, i64)] = &[
    ("cantrips_known", 2),
    ("spell_slots_level_1", 4),
    ("spell_slots_level_2", 3),
    ("spell_slots_level_3", 0),
    ("spell_slots_level_4", 0),
];

/// File-backed database in a temp dir. Keep the `TempDir` alive for the test.
pub fn pool() -> (TempDir, DbPool) {
    let dir = TempDir::new().unwrap();
    let pool = db::create_pool(&dir.path().join("test.db")).unwrap();
    db::run_migrations(&pool).unwrap();
    (dir, pool)
}

/// Druid (class id 1) and fighter (class id 2) plus a small spell catalog.
pub fn seed_reference(conn: &Connection) {
    conn.execute_batch(
        "INSERT INTO classes (api_index, name) VALUES ('druid', 'Druid');
         INSERT INTO classes (api_index, name) VALUES ('fighter', 'Fighter');
         INSERT INTO subclasses (api_index, name, parent_class) VALUES ('land', 'Land', 'druid');
         INSERT INTO spells (api_index, name, level, school) VALUES ('shillelagh', 'Shillelagh', 0, 'Transmutation');
         INSERT INTO spells (api_index, name, level, school) VALUES ('entangle', 'Entangle', 1, 'Conjuration');
         INSERT INTO spells (api_index, name, level, school) VALUES ('cure-wounds', 'Cure Wounds', 1, 'Evocation');
         INSERT INTO spells (api_index, name, level, school) VALUES ('moonbeam', 'Moonbeam', 2, 'Evocation');
         INSERT INTO spells (api_index, name, level, school) VALUES ('call-lightning', 'Call Lightning', 3, 'Conjuration');
         INSERT INTO spells (api_index, name, level, school) VALUES ('magic-missile', 'Magic Missile', 1, 'Evocation');",
    )
    .unwrap();
}

/// Rules service matching `seed_reference`. `thorn-whip` is legal for
/// druids but missing from the local catalog.
pub fn rules() -> InMemoryRules {
    InMemoryRules::new()
        .with_spellcasting("druid", 4, DRUID_BLOCK)
        .with_class_spells(
            "druid",
            &[
                ("shillelagh", "Shillelagh", 0),
                ("thorn-whip", "Thorn Whip", 0),
                ("entangle", "Entangle", 1),
                ("cure-wounds", "Cure Wounds", 1),
                ("moonbeam", "Moonbeam", 2),
                ("call-lightning", "Call Lightning", 3),
            ],
        )
        .with_level("fighter", 3)
}

pub fn state(pool: DbPool, rules: impl RulesApi + 'static) -> AppState {
    let mut config = Config::default();
    config.auth.bcrypt_cost = TEST_COST;
    AppState {
        db: pool,
        config,
        rules: Arc::new(rules),
    }
}

/// Signs up `username` and opens a session. Returns the user id and a
/// `Cookie` header value.
pub fn login(conn: &Connection, username: &str) -> (i64, String) {
    let user = users::signup(
        conn,
        username,
        &format!("{}@example.com", username),
        "password",
        TEST_COST,
    )
    .unwrap();
    let token = session::create_session(conn, user.id, 1).unwrap();
    (user.id, format!("spell_tracker_session={}", token))
}

/// A character owned by `user_id` with the given class row and level.
pub fn character(conn: &Connection, user_id: i64, name: &str, class_id: i64, level: u32) -> i64 {
    use spell_tracker::characters::{repository, Stats};
    use spell_tracker::forms::CharacterInput;

    repository::create(
        conn,
        user_id,
        &CharacterInput {
            name: name.to_string(),
            class_id,
            subclass_id: None,
            level,
            stats: Stats::from_values([10; 7]),
        },
    )
    .unwrap()
}

pub fn app(state: AppState) -> Router {
    routes::app(state)
}

pub async fn get(app: &Router, uri: &str, cookie: Option<&str>) -> Response<Body> {
    let mut request = Request::builder().uri(uri);
    if let Some(cookie) = cookie {
        request = request.header(header::COOKIE, cookie);
    }
    app.clone()
        .oneshot(request.body(Body::empty()).unwrap())
        .await
        .unwrap()
}

pub async fn post_form(app: &Router, uri: &str, cookie: Option<&str>, body: &str) -> Response<Body> {
    let mut request = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
    if let Some(cookie) = cookie {
        request = request.header(header::COOKIE, cookie);
    }
    app.clone()
        .oneshot(request.body(Body::from(body.to_string())).unwrap())
        .await
        .unwrap()
}

pub async fn body_text(response: Response<Body>) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

pub fn location(response: &Response<Body>) -> &str {
    response.headers()[header::LOCATION].to_str().unwrap()
}

/// Decoded flash message set by `response`, if any.
pub fn flash_message(response: &Response<Body>) -> Option<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .filter_map(|v| v.strip_prefix("spell_tracker_flash="))
        .filter_map(|v| v.split(';').next())
        .find(|v| !v.is_empty())
        .and_then(|v| {
            url::form_urlencoded::parse(v.as_bytes())
                .find(|(k, _)| k == "message")
                .map(|(_, m)| m.into_owned())
        })
}

pub fn count(conn: &Connection, table: &str) -> i64 {
    conn.query_row(&format!("SELECT COUNT(*) FROM {}", table), [], |row| {
        row.get(0)
    })
    .unwrap()
}
