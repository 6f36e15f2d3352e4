//! Named, per-character selections from the spells a character could pick
//! when the list was made. Membership is a snapshot and is not re-checked
//! after a level-up.

use chrono::NaiveDate;
use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::db::{self, models::SpellList};

fn list_from_row(row: &Row<'_>) -> rusqlite::Result<SpellList> {
    Ok(SpellList {
        id: row.get(0)?,
        character_id: row.get(1)?,
        name: row.get(2)?,
        created_on: row.get::<_, NaiveDate>(3)?,
    })
}

/// Stores a list holding the chosen spells that are also in `selectable`.
/// Anything else in `chosen` is dropped. Returns the new list's id.
pub fn create(
    conn: &Connection,
    character_id: i64,
    name: &str,
    chosen: &[i64],
    selectable: &[i64],
) -> rusqlite::Result<i64> {
    let kept: Vec<i64> = chosen
        .iter()
        .copied()
        .filter(|id| selectable.contains(id))
        .collect();
    if kept.len() < chosen.len() {
        tracing::warn!(
            "Dropped {} spells not selectable for character {}",
            chosen.len() - kept.len(),
            character_id
        );
    }

    let id = db::atomic(conn, |conn| {
        conn.execute(
            "INSERT INTO spell_lists (character_id, name) VALUES (?1, ?2)",
            params![character_id, name],
        )?;
        let id = conn.last_insert_rowid();

        let mut stmt = conn.prepare(
            "INSERT OR IGNORE INTO spell_list_spells (list_id, spell_id) VALUES (?1, ?2)",
        )?;
        for spell_id in &kept {
            stmt.execute(params![id, spell_id])?;
        }
        Ok::<_, rusqlite::Error>(id)
    })?;

    tracing::info!(
        "Created spell list {} ({}) with {} spells for character {}",
        name,
        id,
        kept.len(),
        character_id
    );
    Ok(id)
}

pub fn find(conn: &Connection, id: i64) -> rusqlite::Result<Option<SpellList>> {
    conn.query_row(
        "SELECT id, character_id, name, created_on FROM spell_lists WHERE id = ?1",
        params![id],
        list_from_row,
    )
    .optional()
}

pub fn list_for_character(conn: &Connection, character_id: i64) -> rusqlite::Result<Vec<SpellList>> {
    let mut stmt = conn.prepare(
        "SELECT id, character_id, name, created_on FROM spell_lists
         WHERE character_id = ?1 ORDER BY created_on DESC, name",
    )?;
    let lists = stmt
        .query_map(params![character_id], list_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(lists)
}

pub fn name_taken(conn: &Connection, character_id: i64, name: &str) -> rusqlite::Result<bool> {
    conn.query_row(
        "SELECT COUNT(*) > 0 FROM spell_lists WHERE character_id = ?1 AND name = ?2",
        params![character_id, name],
        |row| row.get(0),
    )
}

/// Deletes the list and its memberships. Spells stay in the catalog.
pub fn delete(conn: &Connection, id: i64) -> rusqlite::Result<bool> {
    let rows = conn.execute("DELETE FROM spell_lists WHERE id = ?1", params![id])?;
    if rows > 0 {
        tracing::info!("Deleted spell list {}", id);
    }
    Ok(rows > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spells::catalog;
    use crate::state::DbPool;

    fn setup() -> DbPool {
        let pool = db::memory_pool().unwrap();
        db::run_migrations(&pool).unwrap();
        {
            let conn = pool.get().unwrap();
            conn.execute_batch(
                "INSERT INTO users (username, email, password_hash) VALUES ('owner', 'o@x.io', 'h');
                 INSERT INTO characters (user_id, name) VALUES (1, 'Tamsin');
                 INSERT INTO spells (api_index, name, level) VALUES ('shillelagh', 'Shillelagh', 0);
                 INSERT INTO spells (api_index, name, level) VALUES ('entangle', 'Entangle', 1);
                 INSERT INTO spells (api_index, name, level) VALUES ('fireball', 'Fireball', 3);",
            )
            .unwrap();
        }
        pool
    }

    #[test]
    fn create_keeps_only_selectable_spells() {
        let pool = setup();
        let conn = pool.get().unwrap();

        let id = create(&conn, 1, "Daily", &[2, 3, 1], &[1, 2]).unwrap();
        let spells = catalog::spells_in_list(&conn, id).unwrap();
        let names: Vec<_> = spells.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["Shillelagh", "Entangle"]);

        let list = find(&conn, id).unwrap().unwrap();
        assert_eq!(list.name, "Daily");
        assert_eq!(list.character_id, 1);
    }

    #[test]
    fn names_are_unique_per_character() {
        let pool = setup();
        let conn = pool.get().unwrap();

        create(&conn, 1, "Daily", &[], &[]).unwrap();
        assert!(name_taken(&conn, 1, "Daily").unwrap());
        assert!(create(&conn, 1, "Daily", &[], &[]).is_err());
        assert_eq!(list_for_character(&conn, 1).unwrap().len(), 1);
    }

    #[test]
    fn delete_keeps_catalog() {
        let pool = setup();
        let conn = pool.get().unwrap();

        let id = create(&conn, 1, "Daily", &[1, 2], &[1, 2]).unwrap();
        assert!(delete(&conn, id).unwrap());

        let joins: i64 = conn
            .query_row("SELECT COUNT(*) FROM spell_list_spells", [], |row| row.get(0))
            .unwrap();
        assert_eq!(joins, 0);
        assert_eq!(catalog::count(&conn).unwrap(), 3);
    }
}
