use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub created_at: String,
}

/// Playable class, seeded from the rules reference service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Class {
    pub id: i64,
    pub index: String,
    pub name: String,
    pub url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subclass {
    pub id: i64,
    pub index: String,
    pub name: String,
    pub url: Option<String>,
    pub parent_class: String,
}

/// Locally cached subset of a spell's attributes, enough for list display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Spell {
    pub id: i64,
    pub index: String,
    pub name: String,
    pub range: Option<String>,
    pub duration: Option<String>,
    pub concentration: bool,
    pub casting_time: Option<String>,
    pub level: u8,
    pub damaging: bool,
    pub healing: bool,
    pub school: Option<String>,
}

impl Spell {
    pub fn level_label(&self) -> String {
        match self.level {
            0 => "Cantrip".to_string(),
            n => format!("Level {}", n),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpellList {
    pub id: i64,
    pub character_id: i64,
    pub name: String,
    pub created_on: NaiveDate,
}
