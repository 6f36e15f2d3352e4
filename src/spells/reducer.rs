use serde::Serialize;

use super::slots::{ClassSlots, SpellcastingBlock};

const CANTRIPS_LABEL: &str = "Cantrips Known";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SlotEntry {
    pub label: String,
    pub value: i64,
}

/// Display rows for one class's spellcasting block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SlotSummary {
    pub class_index: String,
    pub entries: Vec<SlotEntry>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SpellAvailability {
    /// 0 when only cantrips (or nothing) can be cast.
    pub highest_level: u8,
    pub classes: Vec<SlotSummary>,
}

fn slot_label(spell_level: u8) -> String {
    format!("Spell Slots Level {}", spell_level)
}

/// Number of slot tiers with a nonzero count. Cantrips never count.
fn castable_tiers(block: &SpellcastingBlock) -> u8 {
    let tiers = block.slots.iter().filter(|tier| tier.count != 0).count();
    u8::try_from(tiers).unwrap_or(u8::MAX)
}

fn summarize(slots: &ClassSlots) -> SlotSummary {
    let block = &slots.block;
    let mut entries = Vec::with_capacity(1 + block.slots.len() + block.resources.len());

    if let Some(cantrips) = block.cantrips_known {
        entries.push(SlotEntry {
            label: CANTRIPS_LABEL.to_string(),
            value: cantrips,
        });
    }

    entries.extend(
        block
            .slots
            .iter()
            .filter(|tier| tier.count != 0)
            .map(|tier| SlotEntry {
                label: slot_label(tier.spell_level),
                value: tier.count,
            }),
    );

    entries.extend(block.resources.iter().map(|(key, value)| SlotEntry {
        label: key.clone(),
        value: *value,
    }));

    SlotSummary {
        class_index: slots.class_index.clone(),
        entries,
    }
}

/// Drops empty slot tiers, relabels the rest for display and works out the
/// highest castable spell level.
///
/// With several classes the highest level is the best single class's tier
/// count; slots are not pooled across classes.
pub fn reduce(slots: &[ClassSlots]) -> SpellAvailability {
    let highest_level = slots
        .iter()
        .map(|class| castable_tiers(&class.block))
        .max()
        .unwrap_or(0);

    SpellAvailability {
        highest_level,
        classes: slots.iter().map(summarize).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spells::slots::SlotTier;

    fn class_slots(index: &str, cantrips: Option<i64>, tiers: &[i64]) -> ClassSlots {
        ClassSlots {
            class_index: index.to_string(),
            block: SpellcastingBlock {
                cantrips_known: cantrips,
                slots: tiers
                    .iter()
                    .enumerate()
                    .map(|(i, count)| SlotTier {
                        spell_level: i as u8 + 1,
                        count: *count,
                    })
                    .collect(),
                resources: Vec::new(),
            },
        }
    }

    #[test]
    fn druid_level_four() {
        let availability = reduce(&[class_slots("druid", Some(2), &[4, 3, 0])]);

        assert_eq!(availability.highest_level, 2);
        assert_eq!(
            availability.classes[0].entries,
            vec![
                SlotEntry { label: "Cantrips Known".to_string(), value: 2 },
                SlotEntry { label: "Spell Slots Level 1".to_string(), value: 4 },
                SlotEntry { label: "Spell Slots Level 2".to_string(), value: 3 },
            ]
        );
    }

    #[test]
    fn all_zero_tiers_means_level_zero() {
        let availability = reduce(&[class_slots("paladin", None, &[0, 0, 0, 0, 0])]);
        assert_eq!(availability.highest_level, 0);
        assert!(availability.classes[0].entries.is_empty());
    }

    #[test]
    fn highest_level_is_count_of_nonzero_tiers() {
        for tiers in [vec![2], vec![4, 2], vec![4, 3, 3, 1], vec![4, 3, 3, 3, 2, 1, 1, 1, 1]] {
            let availability = reduce(&[class_slots("wizard", Some(4), &tiers)]);
            assert_eq!(availability.highest_level as usize, tiers.len());
        }
    }

    #[test]
    fn cantrips_do_not_raise_highest_level() {
        let availability = reduce(&[class_slots("wizard", Some(5), &[0])]);
        assert_eq!(availability.highest_level, 0);
        assert_eq!(availability.classes[0].entries.len(), 1);
    }

    #[test]
    fn other_block_keys_pass_through() {
        let mut slots = class_slots("ranger", None, &[2]);
        slots.block.resources.push(("spells_known".to_string(), 2));

        let availability = reduce(&[slots]);
        let labels: Vec<&str> = availability.classes[0]
            .entries
            .iter()
            .map(|e| e.label.as_str())
            .collect();
        assert_eq!(labels, vec!["Spell Slots Level 1", "spells_known"]);
        assert_eq!(availability.highest_level, 1);
    }

    #[test]
    fn multiclass_takes_best_single_class() {
        let availability = reduce(&[
            class_slots("wizard", Some(4), &[4, 3]),
            class_slots("cleric", Some(3), &[2]),
        ]);

        // Slots are not pooled: 2 tiers beats 1, never 2 + 1.
        assert_eq!(availability.highest_level, 2);
        assert_eq!(availability.classes.len(), 2);
        assert_eq!(availability.classes[1].class_index, "cleric");
    }

    #[test]
    fn no_classes_means_level_zero() {
        let availability = reduce(&[]);
        assert_eq!(availability.highest_level, 0);
        assert!(availability.classes.is_empty());
    }
}
