//! Spell availability pipeline.
//!
//! A character's class assignments go through four steps to become the list
//! of spells a user may pick from:
//!
//! 1. [`slots`] resolves each class's spellcasting block at its level.
//! 2. [`reducer`] drops empty slot tiers and derives the highest castable level.
//! 3. [`fetcher`] unions the spell indices each class may learn.
//! 4. [`catalog`] intersects those indices with the local spell cache.

pub mod catalog;
pub mod fetcher;
pub mod reducer;
pub mod slots;

use serde::Serialize;

pub use catalog::reconcile;
pub use fetcher::fetch_class_spell_indices;
pub use reducer::{reduce, SlotEntry, SlotSummary, SpellAvailability};
pub use slots::{resolve_spell_slots, ClassSlots, SlotTier, SpellcastingBlock};

/// "This character is class `class_index` at `level`."
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassLevel {
    pub level: u32,
    pub class_index: String,
}

impl ClassLevel {
    pub fn new(class_index: impl Into<String>, level: u32) -> Self {
        Self {
            level,
            class_index: class_index.into(),
        }
    }
}
