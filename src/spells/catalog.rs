use rusqlite::types::ToSql;
use rusqlite::{params, Connection, Row};
use std::collections::BTreeSet;

use crate::db::models::Spell;
use crate::rules::SpellDetail;

const SPELL_COLUMNS: &str = "s.id, s.api_index, s.name, s.spell_range, s.duration, \
     s.concentration, s.casting_time, s.level, s.damaging, s.healing, s.school";

pub(crate) fn spell_from_row(row: &Row<'_>) -> rusqlite::Result<Spell> {
    Ok(Spell {
        id: row.get(0)?,
        index: row.get(1)?,
        name: row.get(2)?,
        range: row.get(3)?,
        duration: row.get(4)?,
        concentration: row.get(5)?,
        casting_time: row.get(6)?,
        level: row.get(7)?,
        damaging: row.get(8)?,
        healing: row.get(9)?,
        school: row.get(10)?,
    })
}

/// Cached spells that are both legal for the character (`legal` indices from
/// the rules service) and castable (`level <= highest_level`), ordered by
/// level and then name.
///
/// Legal spells missing from the local cache are left out; re-running the
/// seed step is the only way to pick them up.
pub fn reconcile(
    conn: &Connection,
    legal: &BTreeSet<String>,
    highest_level: u8,
) -> rusqlite::Result<Vec<Spell>> {
    if legal.is_empty() {
        return Ok(Vec::new());
    }

    let placeholders = (0..legal.len())
        .map(|i| format!("?{}", i + 2))
        .collect::<Vec<_>>()
        .join(", ");
    let sql = format!(
        "SELECT {} FROM spells s \
         WHERE s.level <= ?1 AND s.api_index IN ({}) \
         ORDER BY s.level, s.name",
        SPELL_COLUMNS, placeholders
    );

    let mut values: Vec<&dyn ToSql> = Vec::with_capacity(legal.len() + 1);
    values.push(&highest_level);
    values.extend(legal.iter().map(|index| index as &dyn ToSql));

    let mut stmt = conn.prepare(&sql)?;
    let spells = stmt
        .query_map(values.as_slice(), spell_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(spells)
}

/// Spells of one list, in catalog order.
pub fn spells_in_list(conn: &Connection, list_id: i64) -> rusqlite::Result<Vec<Spell>> {
    let sql = format!(
        "SELECT {} FROM spells s \
         JOIN spell_list_spells ls ON ls.spell_id = s.id \
         WHERE ls.list_id = ?1 \
         ORDER BY s.level, s.name",
        SPELL_COLUMNS
    );
    let mut stmt = conn.prepare(&sql)?;
    let spells = stmt
        .query_map(params![list_id], spell_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(spells)
}

/// Inserts or refreshes a spell by its index. Existing rows keep their id so
/// spell lists pointing at them stay intact.
pub fn upsert_spell(conn: &Connection, detail: &SpellDetail) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO spells (api_index, name, spell_range, duration, concentration,
                             casting_time, level, damaging, healing, school)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
         ON CONFLICT(api_index) DO UPDATE SET
           name = excluded.name,
           spell_range = excluded.spell_range,
           duration = excluded.duration,
           concentration = excluded.concentration,
           casting_time = excluded.casting_time,
           level = excluded.level,
           damaging = excluded.damaging,
           healing = excluded.healing,
           school = excluded.school",
        params![
            detail.index,
            detail.name,
            detail.range,
            detail.duration,
            detail.concentration,
            detail.casting_time,
            detail.level,
            detail.is_damaging(),
            detail.is_healing(),
            detail.school.as_ref().map(|school| school.name.as_str()),
        ],
    )?;
    Ok(())
}

pub fn count(conn: &Connection) -> rusqlite::Result<i64> {
    conn.query_row("SELECT COUNT(*) FROM spells", [], |row| row.get(0))
}
