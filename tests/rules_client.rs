use std::net::SocketAddr;
use std::time::Duration;

use axum::routing::get;
use axum::{Json, Router};
use serde_json::json;

use spell_tracker::rules::{Dnd5eClient, RulesApi, RulesError};
use spell_tracker::spells::{self, ClassLevel};

/// Serves a tiny slice of the rules API on an ephemeral port.
async fn fake_rules_service() -> SocketAddr {
    let app = Router::new()
        .route(
            "/api/classes/wizard/levels",
            get(|| async {
                Json(json!([
                    {"level": 1, "index": "wizard-1", "spellcasting": {
                        "cantrips_known": 3, "spell_slots_level_1": 2, "spell_slots_level_2": 0
                    }},
                    {"level": 3, "index": "wizard-3", "spellcasting": {
                        "cantrips_known": 3, "spell_slots_level_1": 4, "spell_slots_level_2": 2
                    }},
                    {"level": 3, "index": "wizard-evocation-3", "subclass": {
                        "index": "evocation", "name": "Evocation", "url": "/api/subclasses/evocation"
                    }}
                ]))
            }),
        )
        .route(
            "/api/classes/wizard/spells",
            get(|| async {
                Json(json!({"count": 2, "results": [
                    {"index": "fire-bolt", "name": "Fire Bolt", "level": 0, "url": "/api/spells/fire-bolt"},
                    {"index": "magic-missile", "name": "Magic Missile", "level": 1, "url": "/api/spells/magic-missile"}
                ]}))
            }),
        )
        .route(
            "/api/spells/magic-missile",
            get(|| async {
                Json(json!({
                    "index": "magic-missile",
                    "name": "Magic Missile",
                    "level": 1,
                    "range": "120 feet",
                    "concentration": false,
                    "school": {"index": "evocation", "name": "Evocation", "url": "/api/magic-schools/evocation"},
                    "damage": {"damage_type": {"index": "force"}}
                }))
            }),
        )
        .route("/api/classes", get(|| async { "not json" }))
        .route(
            "/api/classes/bard/levels",
            get(|| async {
                tokio::time::sleep(Duration::from_secs(2)).await;
                Json(json!([]))
            }),
        );

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    addr
}

fn client(addr: SocketAddr) -> Dnd5eClient {
    Dnd5eClient::new(&format!("http://{}/", addr), Some(Duration::from_secs(5))).unwrap()
}

#[tokio::test]
async fn resolves_slots_from_base_class_row() {
    let rules = client(fake_rules_service().await);

    let slots = spells::resolve_spell_slots(&rules, &[ClassLevel::new("wizard", 3)])
        .await
        .unwrap();

    assert_eq!(slots.len(), 1);
    assert_eq!(slots[0].block.cantrips_known, Some(3));
    assert_eq!(spells::reduce(&slots).highest_level, 2);
}

#[tokio::test]
async fn lists_class_spells() {
    let rules = client(fake_rules_service().await);

    let listed = rules.class_spells("wizard").await.unwrap();

    let indices: Vec<&str> = listed.iter().map(|spell| spell.index.as_str()).collect();
    assert_eq!(indices, vec!["fire-bolt", "magic-missile"]);
    assert_eq!(listed[1].level, Some(1));
}

#[tokio::test]
async fn fetches_spell_detail() {
    let rules = client(fake_rules_service().await);

    let detail = rules.spell("magic-missile").await.unwrap();

    assert_eq!(detail.range.as_deref(), Some("120 feet"));
    assert!(detail.is_damaging());
    assert!(!detail.is_healing());
}

#[tokio::test]
async fn unknown_class_is_a_status_error() {
    let rules = client(fake_rules_service().await);

    let err = rules.class_levels("nonesuch").await.unwrap_err();

    assert!(matches!(err, RulesError::Status { status: 404, .. }));
}

#[tokio::test]
async fn malformed_body_is_an_unexpected_shape() {
    let rules = client(fake_rules_service().await);

    let err = rules.classes().await.unwrap_err();

    assert!(matches!(err, RulesError::UnexpectedShape { .. }));
}

#[tokio::test]
async fn configured_timeout_is_applied() {
    let addr = fake_rules_service().await;
    let rules =
        Dnd5eClient::new(&format!("http://{}", addr), Some(Duration::from_millis(200))).unwrap();

    let err = rules.class_levels("bard").await.unwrap_err();

    match err {
        RulesError::Request(e) => assert!(e.is_timeout()),
        other => panic!("expected a timeout, got {other:?}"),
    }
}
