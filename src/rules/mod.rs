//! Client side of the external rules reference service.
//!
//! The service is a read-only JSON API keyed by class and spell index. Only
//! the handful of endpoints the spell pipeline and the seed step need are
//! modelled here.

mod client;
mod memory;

use async_trait::async_trait;
use serde::Deserialize;
use std::collections::BTreeMap;
use thiserror::Error;

pub use client::Dnd5eClient;
pub use memory::InMemoryRules;

#[derive(Debug, Error)]
pub enum RulesError {
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("{url} returned status {status}")]
    Status { url: String, status: u16 },

    #[error("Unexpected response from {url}: {reason}")]
    UnexpectedShape { url: String, reason: String },
}

/// `{ index, name, url }` triple the service uses to point at other resources.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ApiReference {
    pub index: String,
    pub name: String,
    #[serde(default)]
    pub url: Option<String>,
    /// Present on class spell listings.
    #[serde(default)]
    pub level: Option<u8>,
}

/// `{ count, results: [...] }` envelope around list endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct ResourceList {
    #[serde(default)]
    pub count: usize,
    pub results: Vec<ApiReference>,
}

/// One row of a class's level progression table.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LevelEntry {
    pub level: u32,
    /// Slot-tier name to count, exactly as the service spells it.
    #[serde(default)]
    pub spellcasting: Option<BTreeMap<String, i64>>,
    /// Set on subclass-specific rows that share a level with the base class.
    #[serde(default)]
    pub subclass: Option<ApiReference>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NamedReference {
    pub name: String,
}

/// Full spell record; only the fields the local catalog caches are kept.
#[derive(Debug, Clone, Deserialize)]
pub struct SpellDetail {
    pub index: String,
    pub name: String,
    pub level: u8,
    #[serde(default)]
    pub range: Option<String>,
    #[serde(default)]
    pub duration: Option<String>,
    #[serde(default)]
    pub concentration: bool,
    #[serde(default)]
    pub casting_time: Option<String>,
    #[serde(default)]
    pub school: Option<NamedReference>,
    #[serde(default)]
    pub damage: Option<serde_json::Value>,
    #[serde(default)]
    pub heal_at_slot_level: Option<serde_json::Value>,
}

impl SpellDetail {
    pub fn is_damaging(&self) -> bool {
        self.damage.is_some()
    }

    pub fn is_healing(&self) -> bool {
        self.heal_at_slot_level.is_some()
    }
}

#[async_trait]
pub trait RulesApi: Send + Sync {
    /// `GET /api/classes/{index}/levels`
    async fn class_levels(&self, class_index: &str) -> Result<Vec<LevelEntry>, RulesError>;

    /// `GET /api/classes/{index}/spells`
    async fn class_spells(&self, class_index: &str) -> Result<Vec<ApiReference>, RulesError>;

    /// `GET /api/classes`
    async fn classes(&self) -> Result<Vec<ApiReference>, RulesError>;

    /// `GET /api/classes/{index}/subclasses`
    async fn subclasses(&self, class_index: &str) -> Result<Vec<ApiReference>, RulesError>;

    /// `GET /api/spells`
    async fn spells(&self) -> Result<Vec<ApiReference>, RulesError>;

    /// `GET /api/spells/{index}`
    async fn spell(&self, index: &str) -> Result<SpellDetail, RulesError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_entry_without_spellcasting_parses() {
        let entry: LevelEntry = serde_json::from_str(
            r#"{"level": 3, "prof_bonus": 2, "features": [], "index": "fighter-3"}"#,
        )
        .unwrap();
        assert_eq!(entry.level, 3);
        assert!(entry.spellcasting.is_none());
        assert!(entry.subclass.is_none());
    }

    #[test]
    fn spell_detail_flags_follow_optional_blocks() {
        let detail: SpellDetail = serde_json::from_str(
            r#"{
                "index": "cure-wounds",
                "name": "Cure Wounds",
                "level": 1,
                "range": "Touch",
                "duration": "Instantaneous",
                "concentration": false,
                "casting_time": "1 action",
                "school": {"index": "evocation", "name": "Evocation", "url": "/api/magic-schools/evocation"},
                "heal_at_slot_level": {"1": "1d8 + MOD"}
            }"#,
        )
        .unwrap();
        assert!(detail.is_healing());
        assert!(!detail.is_damaging());
        assert_eq!(detail.school.unwrap().name, "Evocation");
    }
}
