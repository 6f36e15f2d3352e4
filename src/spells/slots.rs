use std::collections::BTreeMap;

use super::ClassLevel;
use crate::rules::{LevelEntry, RulesApi, RulesError};

pub const CANTRIPS_KEY: &str = "cantrips_known";
const SLOT_KEY_PREFIX: &str = "spell_slots_level_";

/// Slot count for one spell level.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotTier {
    pub spell_level: u8,
    pub count: i64,
}

/// Typed form of the service's `spellcasting` object.
///
/// Key-name classification happens once, in [`SpellcastingBlock::from_wire`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SpellcastingBlock {
    pub cantrips_known: Option<i64>,
    /// Ascending by spell level.
    pub slots: Vec<SlotTier>,
    /// Anything else the block carries (`spells_known`, ...), in key order.
    pub resources: Vec<(String, i64)>,
}

impl SpellcastingBlock {
    pub fn from_wire(raw: &BTreeMap<String, i64>) -> Self {
        let mut block = SpellcastingBlock::default();

        for (key, &value) in raw {
            if key.contains("cantrip") {
                block.cantrips_known = Some(value);
            } else if let Some(spell_level) = slot_level(key) {
                block.slots.push(SlotTier {
                    spell_level,
                    count: value,
                });
            } else {
                block.resources.push((key.clone(), value));
            }
        }

        block.slots.sort_by_key(|tier| tier.spell_level);
        block
    }
}

fn slot_level(key: &str) -> Option<u8> {
    key.strip_prefix(SLOT_KEY_PREFIX)?
        .parse::<u8>()
        .ok()
        .filter(|level| (1..=9).contains(level))
}

/// Spellcasting block for one class, tagged with the class it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassSlots {
    pub class_index: String,
    pub block: SpellcastingBlock,
}

/// Picks the level table row for `level`, preferring the base-class row over
/// subclass rows that share the same level.
fn row_for_level(rows: &[LevelEntry], level: u32) -> Option<&LevelEntry> {
    rows.iter()
        .find(|row| row.level == level && row.subclass.is_none())
        .or_else(|| rows.iter().find(|row| row.level == level))
}

/// Spellcasting block for one class at one level, or `None` when the class
/// cannot cast at that level.
pub async fn resolve_class_slots(
    rules: &dyn RulesApi,
    class: &ClassLevel,
) -> Result<Option<SpellcastingBlock>, RulesError> {
    let rows = rules.class_levels(&class.class_index).await?;

    Ok(row_for_level(&rows, class.level)
        .and_then(|row| row.spellcasting.as_ref())
        .map(SpellcastingBlock::from_wire))
}

/// Runs [`resolve_class_slots`] for every class, in order, leaving out the
/// classes without spellcasting.
pub async fn resolve_spell_slots(
    rules: &dyn RulesApi,
    classes: &[ClassLevel],
) -> Result<Vec<ClassSlots>, RulesError> {
    let mut resolved = Vec::with_capacity(classes.len());

    for class in classes {
        match resolve_class_slots(rules, class).await? {
            Some(block) => resolved.push(ClassSlots {
                class_index: class.class_index.clone(),
                block,
            }),
            None => tracing::debug!(
                "{} has no spellcasting at level {}",
                class.class_index,
                class.level
            ),
        }
    }

    Ok(resolved)
}
