use async_trait::async_trait;
use std::collections::{BTreeMap, HashMap};

use super::{ApiReference, LevelEntry, NamedReference, RulesApi, RulesError, SpellDetail};

/// In-memory rules service. Backs the unit and integration tests; the
/// binary always talks to [`super::Dnd5eClient`].
///
/// Unknown classes answer the level table with a 404, the same way the
/// real service does; their spell listing is simply empty.
#[derive(Debug, Clone, Default)]
pub struct InMemoryRules {
    levels: HashMap<String, Vec<LevelEntry>>,
    class_spells: HashMap<String, Vec<ApiReference>>,
    classes: Vec<ApiReference>,
    subclasses: HashMap<String, Vec<ApiReference>>,
    spells: Vec<SpellDetail>,
    unavailable: bool,
}

fn reference(index: &str, name: &str) -> ApiReference {
    ApiReference {
        index: index.to_string(),
        name: name.to_string(),
        url: None,
        level: None,
    }
}

impl InMemoryRules {
    pub fn new() -> Self {
        Self::default()
    }

    /// Level table row carrying a spellcasting block.
    pub fn with_spellcasting(mut self, class_index: &str, level: u32, block: &[(&str, i64)]) -> Self {
        let spellcasting: BTreeMap<String, i64> =
            block.iter().map(|(k, v)| (k.to_string(), *v)).collect();
        self.levels
            .entry(class_index.to_string())
            .or_default()
            .push(LevelEntry {
                level,
                spellcasting: Some(spellcasting),
                subclass: None,
            });
        self
    }

    /// Level table row with no spellcasting block.
    pub fn with_level(mut self, class_index: &str, level: u32) -> Self {
        self.levels
            .entry(class_index.to_string())
            .or_default()
            .push(LevelEntry {
                level,
                ..LevelEntry::default()
            });
        self
    }

    /// Spells a class may learn, as `(index, name, level)`.
    pub fn with_class_spells(mut self, class_index: &str, spells: &[(&str, &str, u8)]) -> Self {
        let entries = self.class_spells.entry(class_index.to_string()).or_default();
        for (index, name, level) in spells {
            entries.push(ApiReference {
                level: Some(*level),
                ..reference(index, name)
            });
        }
        self
    }

    pub fn with_class(mut self, index: &str, name: &str) -> Self {
        self.classes.push(reference(index, name));
        self
    }

    pub fn with_subclass(mut self, class_index: &str, index: &str, name: &str) -> Self {
        self.subclasses
            .entry(class_index.to_string())
            .or_default()
            .push(reference(index, name));
        self
    }

    pub fn with_spell(mut self, index: &str, name: &str, level: u8, school: &str) -> Self {
        self.spells.push(SpellDetail {
            index: index.to_string(),
            name: name.to_string(),
            level,
            range: Some("60 feet".to_string()),
            duration: Some("Instantaneous".to_string()),
            concentration: false,
            casting_time: Some("1 action".to_string()),
            school: Some(NamedReference {
                name: school.to_string(),
            }),
            damage: None,
            heal_at_slot_level: None,
        });
        self
    }

    /// Every call fails as if the service were down.
    pub fn unavailable(mut self) -> Self {
        self.unavailable = true;
        self
    }

    fn check_available(&self, path: String) -> Result<(), RulesError> {
        if self.unavailable {
            return Err(RulesError::Status {
                url: path,
                status: 503,
            });
        }
        Ok(())
    }
}

#[async_trait]
impl RulesApi for InMemoryRules {
    async fn class_levels(&self, class_index: &str) -> Result<Vec<LevelEntry>, RulesError> {
        let path = format!("/api/classes/{}/levels", class_index);
        self.check_available(path.clone())?;
        self.levels
            .get(class_index)
            .cloned()
            .ok_or(RulesError::Status {
                url: path,
                status: 404,
            })
    }

    async fn class_spells(&self, class_index: &str) -> Result<Vec<ApiReference>, RulesError> {
        self.check_available(format!("/api/classes/{}/spells", class_index))?;
        Ok(self
            .class_spells
            .get(class_index)
            .cloned()
            .unwrap_or_default())
    }

    async fn classes(&self) -> Result<Vec<ApiReference>, RulesError> {
        self.check_available("/api/classes".to_string())?;
        Ok(self.classes.clone())
    }

    async fn subclasses(&self, class_index: &str) -> Result<Vec<ApiReference>, RulesError> {
        self.check_available(format!("/api/classes/{}/subclasses", class_index))?;
        Ok(self
            .subclasses
            .get(class_index)
            .cloned()
            .unwrap_or_default())
    }

    async fn spells(&self) -> Result<Vec<ApiReference>, RulesError> {
        self.check_available("/api/spells".to_string())?;
        Ok(self
            .spells
            .iter()
            .map(|s| reference(&s.index, &s.name))
            .collect())
    }

    async fn spell(&self, index: &str) -> Result<SpellDetail, RulesError> {
        let path = format!("/api/spells/{}", index);
        self.check_available(path.clone())?;
        self.spells
            .iter()
            .find(|s| s.index == index)
            .cloned()
            .ok_or(RulesError::Status {
                url: path,
                status: 404,
            })
    }
}
