//! Loads reference data from the rules service into the local database.
//!
//! Classes, the first subclass of each class, and the spell catalog are
//! upserted by index, so seeding again refreshes rows in place and keeps
//! existing characters and spell lists pointing at the same ids.

use crate::db;
use crate::reference;
use crate::rules::{ApiReference, RulesApi, SpellDetail};
use crate::spells::catalog;
use crate::state::DbPool;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedReport {
    pub classes: usize,
    pub subclasses: usize,
    pub spells: usize,
}

pub async fn run(pool: &DbPool, rules: &dyn RulesApi, skip_spells: bool) -> anyhow::Result<SeedReport> {
    let classes = rules.classes().await?;
    tracing::info!("Fetched {} classes", classes.len());

    let mut subclasses: Vec<(String, ApiReference)> = Vec::with_capacity(classes.len());
    for class in &classes {
        match rules.subclasses(&class.index).await?.into_iter().next() {
            Some(subclass) => subclasses.push((class.index.clone(), subclass)),
            None => tracing::warn!("{} has no subclasses", class.index),
        }
    }

    let mut details: Vec<SpellDetail> = Vec::new();
    if skip_spells {
        tracing::info!("Skipping spell catalog");
    } else {
        let spells = rules.spells().await?;
        tracing::info!("Fetching {} spells", spells.len());
        details.reserve(spells.len());
        for (i, spell) in spells.iter().enumerate() {
            details.push(rules.spell(&spell.index).await?);
            if (i + 1) % 50 == 0 {
                tracing::info!("Fetched {}/{} spells", i + 1, spells.len());
            }
        }
    }

    let conn = pool.get()?;
    db::atomic(&conn, |conn| {
        for class in &classes {
            reference::upsert_class(conn, class)?;
        }
        for (parent, subclass) in &subclasses {
            reference::upsert_subclass(conn, parent, subclass)?;
        }
        for detail in &details {
            catalog::upsert_spell(conn, detail)?;
        }
        Ok::<_, rusqlite::Error>(())
    })?;

    let report = SeedReport {
        classes: classes.len(),
        subclasses: subclasses.len(),
        spells: details.len(),
    };
    tracing::info!(
        "Seeded {} classes, {} subclasses, {} spells",
        report.classes,
        report.subclasses,
        report.spells
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::InMemoryRules;

    fn rules() -> InMemoryRules {
        InMemoryRules::new()
            .with_class("druid", "Druid")
            .with_class("fighter", "Fighter")
            .with_subclass("druid", "land", "Land")
            .with_subclass("druid", "moon", "Moon")
            .with_spell("entangle", "Entangle", 1, "Conjuration")
            .with_spell("fireball", "Fireball", 3, "Evocation")
    }

    fn pool() -> DbPool {
        let pool = db::memory_pool().unwrap();
        db::run_migrations(&pool).unwrap();
        pool
    }

    #[tokio::test]
    async fn seeds_first_subclass_and_spells() {
        let pool = pool();
        let report = run(&pool, &rules(), false).await.unwrap();
        assert_eq!(
            report,
            SeedReport {
                classes: 2,
                subclasses: 1,
                spells: 2
            }
        );

        let conn = pool.get().unwrap();
        let subclasses = reference::list_subclasses(&conn).unwrap();
        assert_eq!(subclasses.len(), 1);
        assert_eq!(subclasses[0].index, "land");
        assert_eq!(subclasses[0].parent_class, "druid");
        assert_eq!(catalog::count(&conn).unwrap(), 2);
    }

    #[tokio::test]
    async fn reseeding_is_stable() {
        let pool = pool();
        run(&pool, &rules(), false).await.unwrap();
        let before = reference::list_classes(&pool.get().unwrap()).unwrap();
        run(&pool, &rules(), false).await.unwrap();
        let conn = pool.get().unwrap();

        assert_eq!(reference::list_classes(&conn).unwrap(), before);
        assert_eq!(catalog::count(&conn).unwrap(), 2);
    }

    #[tokio::test]
    async fn skip_spells_leaves_catalog_empty() {
        let pool = pool();
        let report = run(&pool, &rules(), true).await.unwrap();
        assert_eq!(report.spells, 0);
        assert_eq!(catalog::count(&pool.get().unwrap()).unwrap(), 0);
    }

    #[tokio::test]
    async fn outage_writes_nothing() {
        let pool = pool();
        assert!(run(&pool, &InMemoryRules::new().unavailable(), false).await.is_err());
        assert!(reference::list_classes(&pool.get().unwrap()).unwrap().is_empty());
    }
}
