//! Submitted HTML forms.
//!
//! Each form shape has its own struct and an explicit mapping from the
//! urlencoded body; only the named fields are read and nothing is copied
//! into models by field name.

use std::collections::BTreeMap;

use crate::characters::{Character, Stats};

/// Decoded `application/x-www-form-urlencoded` body. Keeps repeated keys,
/// which multi-selects rely on.
#[derive(Debug, Clone, Default)]
pub struct FormData {
    pairs: Vec<(String, String)>,
}

impl FormData {
    pub fn parse(body: &[u8]) -> Self {
        Self {
            pairs: url::form_urlencoded::parse(body).into_owned().collect(),
        }
    }

    /// First value for `name`, untouched.
    pub fn raw(&self, name: &str) -> String {
        self.pairs
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.clone())
            .unwrap_or_default()
    }

    /// First value for `name` with surrounding whitespace removed.
    pub fn text(&self, name: &str) -> String {
        self.raw(name).trim().to_string()
    }

    pub fn all(&self, name: &str) -> Vec<&str> {
        self.pairs
            .iter()
            .filter(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
            .collect()
    }
}

/// Per-field validation messages, rendered next to their inputs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors {
    errors: BTreeMap<String, String>,
}

impl FieldErrors {
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.errors
            .entry(field.to_string())
            .or_insert_with(|| message.into());
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.errors.get(field).map(String::as_str)
    }

    /// Message for `field`, or an empty string.
    pub fn message(&self, field: &str) -> &str {
        self.get(field).unwrap_or("")
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }
}

fn check_length(errors: &mut FieldErrors, field: &str, value: &str, min: usize, max: usize) {
    let len = value.chars().count();
    if len < min || len > max {
        errors.add(
            field,
            format!("Field must be between {} and {} characters long.", min, max),
        );
    }
}

fn required_int(errors: &mut FieldErrors, field: &str, value: &str) -> Option<i64> {
    if value.is_empty() {
        errors.add(field, "This field is required.");
        return None;
    }
    match value.parse::<i64>() {
        Ok(n) => Some(n),
        Err(_) => {
            errors.add(field, "Not a valid integer value.");
            None
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SignupForm {
    pub username: String,
    pub email: String,
    pub password: String,
    pub confirm: String,
}

impl SignupForm {
    pub fn from_data(data: &FormData) -> Self {
        Self {
            username: data.text("username"),
            email: data.text("email"),
            password: data.raw("password"),
            confirm: data.raw("confirm"),
        }
    }

    /// Shape checks only; uniqueness needs the database.
    pub fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::default();
        check_length(&mut errors, "username", &self.username, 4, 25);
        check_length(&mut errors, "email", &self.email, 6, 35);
        if !self.email.contains('@') {
            errors.add("email", "Invalid email address.");
        }
        if self.password.is_empty() {
            errors.add("password", "This field is required.");
        } else if self.password.chars().count() < 6 {
            errors.add("password", "Field must be at least 6 characters long.");
        } else if self.password != self.confirm {
            errors.add("password", "Passwords must match");
        }
        errors
    }
}

#[derive(Debug, Clone, Default)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
}

impl LoginForm {
    pub fn from_data(data: &FormData) -> Self {
        Self {
            username: data.text("username"),
            password: data.raw("password"),
        }
    }

    pub fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::default();
        if self.username.is_empty() {
            errors.add("username", "This field is required.");
        }
        if self.password.is_empty() {
            errors.add("password", "This field is required.");
        }
        errors
    }
}

pub const STAT_FIELDS: [&str; 7] = ["HP", "STR", "DEX", "CON", "INT", "WIS", "CHA"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatField {
    pub name: &'static str,
    pub value: String,
}

/// Character create/edit form, kept as submitted so it can be re-rendered.
#[derive(Debug, Clone, Default)]
pub struct CharacterForm {
    pub name: String,
    pub class_id: String,
    pub subclass_id: String,
    pub level: String,
    /// In `STAT_FIELDS` order.
    pub stats: [String; 7],
}

/// Validated character fields, ready for the repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CharacterInput {
    pub name: String,
    pub class_id: i64,
    pub subclass_id: Option<i64>,
    pub level: u32,
    pub stats: Stats,
}

impl CharacterForm {
    pub fn from_data(data: &FormData) -> Self {
        Self {
            name: data.text("name"),
            class_id: data.text("class_id"),
            subclass_id: data.text("subclass_id"),
            level: data.text("level"),
            stats: STAT_FIELDS.map(|field| data.text(field)),
        }
    }

    /// Pre-filled from an existing character for the edit page.
    pub fn from_character(character: &Character) -> Self {
        let sheet = character.serialize();
        let primary = character.primary_class();
        Self {
            name: sheet.name,
            class_id: primary.map(|c| c.class_id.to_string()).unwrap_or_default(),
            subclass_id: primary
                .and_then(|c| c.subclass_id)
                .map(|id| id.to_string())
                .unwrap_or_default(),
            level: sheet.level.map(|l| l.to_string()).unwrap_or_default(),
            stats: sheet.stats.values().map(|v| v.to_string()),
        }
    }

    pub fn stat_fields(&self) -> Vec<StatField> {
        STAT_FIELDS
            .iter()
            .zip(self.stats.iter())
            .map(|(name, value)| StatField {
                name,
                value: value.clone(),
            })
            .collect()
    }

    pub fn validate(&self) -> Result<CharacterInput, FieldErrors> {
        let mut errors = FieldErrors::default();

        check_length(&mut errors, "name", &self.name, 1, 50);

        let class_id = required_int(&mut errors, "class_id", &self.class_id);
        let subclass_id = if self.subclass_id.is_empty() {
            None
        } else {
            required_int(&mut errors, "subclass_id", &self.subclass_id)
        };

        let level = required_int(&mut errors, "level", &self.level).and_then(|level| {
            match u32::try_from(level) {
                Ok(level) if level >= 1 => Some(level),
                _ => {
                    errors.add("level", "Level must be at least 1.");
                    None
                }
            }
        });

        let mut values = [0i64; 7];
        for (i, field) in STAT_FIELDS.iter().enumerate() {
            if let Some(n) = required_int(&mut errors, field, &self.stats[i]) {
                values[i] = n;
            }
        }

        match (class_id, level) {
            (Some(class_id), Some(level)) if errors.is_empty() => Ok(CharacterInput {
                name: self.name.clone(),
                class_id,
                subclass_id,
                level,
                stats: Stats::from_values(values),
            }),
            _ => Err(errors),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct SpellListForm {
    pub name: String,
    pub spells: Vec<i64>,
}

impl SpellListForm {
    pub fn from_data(data: &FormData) -> Self {
        Self {
            name: data.text("name"),
            spells: data
                .all("spells")
                .into_iter()
                .filter_map(|id| id.trim().parse().ok())
                .collect(),
        }
    }

    pub fn validate(&self) -> FieldErrors {
        let mut errors = FieldErrors::default();
        check_length(&mut errors, "name", &self.name, 3, 50);
        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data(body: &str) -> FormData {
        FormData::parse(body.as_bytes())
    }

    #[test]
    fn repeated_keys_are_kept() {
        let form = SpellListForm::from_data(&data("name=Daily+Prep&spells=3&spells=7&spells=x"));
        assert_eq!(form.name, "Daily Prep");
        assert_eq!(form.spells, vec![3, 7]);
        assert!(form.validate().is_empty());
    }

    #[test]
    fn signup_checks_lengths_and_confirmation() {
        let form = SignupForm::from_data(&data(
            "username=abc&email=a%40b.c&password=secret1&confirm=secret2",
        ));
        let errors = form.validate();
        assert!(errors.get("username").is_some());
        assert!(errors.get("email").is_some());
        assert_eq!(errors.get("password"), Some("Passwords must match"));
    }

    #[test]
    fn valid_signup_has_no_errors() {
        let form = SignupForm::from_data(&data(
            "username=testuser&email=test%40hotmail.com&password=HASHED_PASSWORD&confirm=HASHED_PASSWORD",
        ));
        assert!(form.validate().is_empty());
    }

    #[test]
    fn character_form_maps_named_fields() {
        let form = CharacterForm::from_data(&data(
            "name=Mira&class_id=4&level=3&HP=10&STR=8&DEX=14&CON=12&INT=10&WIS=16&CHA=11&is_admin=1",
        ));
        let input = form.validate().unwrap();
        assert_eq!(input.name, "Mira");
        assert_eq!(input.class_id, 4);
        assert_eq!(input.subclass_id, None);
        assert_eq!(input.level, 3);
        assert_eq!(input.stats.wis, 16);
        assert_eq!(input.stats.cha, 11);
    }

    #[test]
    fn character_form_reports_each_bad_field() {
        let form = CharacterForm::from_data(&data(
            "name=&class_id=4&level=0&HP=ten&STR=8&DEX=14&CON=12&INT=10&WIS=16",
        ));
        let errors = form.validate().unwrap_err();
        assert!(errors.get("name").is_some());
        assert_eq!(errors.get("level"), Some("Level must be at least 1."));
        assert_eq!(errors.get("HP"), Some("Not a valid integer value."));
        assert_eq!(errors.get("CHA"), Some("This field is required."));
        assert_eq!(errors.message("STR"), "");
    }
}
