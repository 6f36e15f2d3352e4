use std::collections::BTreeSet;

use super::ClassLevel;
use crate::rules::{RulesApi, RulesError};

/// Union of the spell indices every class may learn.
///
/// `None` means no class grants any spell, which callers treat as "no spell
/// list can be made for this character" rather than as an error.
pub async fn fetch_class_spell_indices(
    rules: &dyn RulesApi,
    classes: &[ClassLevel],
) -> Result<Option<BTreeSet<String>>, RulesError> {
    let mut indices = BTreeSet::new();

    for class in classes {
        let spells = rules.class_spells(&class.class_index).await?;
        tracing::debug!("{} grants {} spells", class.class_index, spells.len());
        indices.extend(spells.into_iter().map(|spell| spell.index));
    }

    Ok(if indices.is_empty() { None } else { Some(indices) })
}
