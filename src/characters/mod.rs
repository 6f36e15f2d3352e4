//! Character aggregate: stats, class assignments and the character-level
//! face of the spell availability pipeline.

pub mod repository;

use rusqlite::Connection;
use serde::Serialize;
use std::collections::BTreeSet;

use crate::db::models::Spell;
use crate::rules::{RulesApi, RulesError};
use crate::spells::{self, ClassLevel, ClassSlots};

/// How many class assignments are honoured when a single class is needed
/// (form pre-fill, edits, the sheet). The data model keeps a list so
/// multiclassing can be added later; until then only the first entry counts.
pub const HONOURED_CLASS_ASSIGNMENTS: usize = 1;

/// HP plus the six ability scores. Any integer is accepted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Stats {
    #[serde(rename = "HP")]
    pub hp: i64,
    #[serde(rename = "STR")]
    pub str: i64,
    #[serde(rename = "DEX")]
    pub dex: i64,
    #[serde(rename = "CON")]
    pub con: i64,
    #[serde(rename = "INT")]
    pub int: i64,
    #[serde(rename = "WIS")]
    pub wis: i64,
    #[serde(rename = "CHA")]
    pub cha: i64,
}

impl Stats {
    /// From values in HP, STR, DEX, CON, INT, WIS, CHA order.
    pub fn from_values(values: [i64; 7]) -> Self {
        let [hp, str, dex, con, int, wis, cha] = values;
        Self {
            hp,
            str,
            dex,
            con,
            int,
            wis,
            cha,
        }
    }

    /// Values in HP, STR, DEX, CON, INT, WIS, CHA order.
    pub fn values(&self) -> [i64; 7] {
        [
            self.hp, self.str, self.dex, self.con, self.int, self.wis, self.cha,
        ]
    }
}

/// "This character is `class_name` at `level`", with the reference rows
/// resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassAssignment {
    pub id: i64,
    pub class_id: i64,
    pub class_index: String,
    pub class_name: String,
    pub subclass_id: Option<i64>,
    pub subclass_name: Option<String>,
    pub level: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Character {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    pub created_at: String,
    pub stats: Stats,
    /// In assignment order.
    pub classes: Vec<ClassAssignment>,
}

/// Flattened view used to pre-fill forms: the seven stats, the name, and the
/// honoured class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CharacterSheet {
    pub name: String,
    pub class_index: Option<String>,
    pub level: Option<u32>,
    #[serde(flatten)]
    pub stats: Stats,
}

/// What the spell list form can offer for a character.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpellOptions {
    /// No class can cast at its level, or no class grants any spell.
    Unavailable,
    Available {
        slots: Vec<ClassSlots>,
        legal: BTreeSet<String>,
    },
}

impl Character {
    /// Class assignments as level/index pairs, or `None` when the character
    /// has none.
    pub fn classes(&self) -> Option<Vec<ClassLevel>> {
        if self.classes.is_empty() {
            return None;
        }
        Some(
            self.classes
                .iter()
                .map(|c| ClassLevel::new(c.class_index.clone(), c.level))
                .collect(),
        )
    }

    /// The class assignment honoured wherever only one class is supported.
    /// See [`HONOURED_CLASS_ASSIGNMENTS`].
    pub fn primary_class(&self) -> Option<&ClassAssignment> {
        self.classes.iter().take(HONOURED_CLASS_ASSIGNMENTS).next()
    }

    /// Spellcasting blocks for every class that can cast at its level.
    pub async fn spell_slots(&self, rules: &dyn RulesApi) -> Result<Vec<ClassSlots>, RulesError> {
        match self.classes() {
            Some(classes) => spells::resolve_spell_slots(rules, &classes).await,
            None => Ok(Vec::new()),
        }
    }

    pub fn highest_spell_level(slots: &[ClassSlots]) -> u8 {
        spells::reduce(slots).highest_level
    }

    /// Union of the spell indices the character's classes may learn.
    pub async fn class_spells(
        &self,
        rules: &dyn RulesApi,
    ) -> Result<Option<BTreeSet<String>>, RulesError> {
        match self.classes() {
            Some(classes) => spells::fetch_class_spell_indices(rules, &classes).await,
            None => Ok(None),
        }
    }

    /// Cached spells the character can pick, in catalog order.
    pub fn spells_from_db(
        conn: &Connection,
        slots: &[ClassSlots],
        legal: &BTreeSet<String>,
    ) -> rusqlite::Result<Vec<Spell>> {
        spells::reconcile(conn, legal, Self::highest_spell_level(slots))
    }

    /// Runs the rules service half of the pipeline. Touches no database, so
    /// callers can hold off on taking a connection until it returns.
    pub async fn spell_options(&self, rules: &dyn RulesApi) -> Result<SpellOptions, RulesError> {
        let slots = self.spell_slots(rules).await?;
        if slots.is_empty() {
            return Ok(SpellOptions::Unavailable);
        }

        match self.class_spells(rules).await? {
            Some(legal) => Ok(SpellOptions::Available { slots, legal }),
            None => Ok(SpellOptions::Unavailable),
        }
    }

    pub fn serialize(&self) -> CharacterSheet {
        let primary = self.primary_class();
        CharacterSheet {
            name: self.name.clone(),
            class_index: primary.map(|c| c.class_index.clone()),
            level: primary.map(|c| c.level),
            stats: self.stats,
        }
    }
}
