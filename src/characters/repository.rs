use rusqlite::{params, Connection, OptionalExtension};

use super::{Character, ClassAssignment, Stats};
use crate::db;
use crate::forms::CharacterInput;

fn load_stats(conn: &Connection, character_id: i64) -> rusqlite::Result<Stats> {
    conn.query_row(
        "SELECT hp, strength, dexterity, constitution, intelligence, wisdom, charisma
         FROM stats WHERE character_id = ?1",
        params![character_id],
        |row| {
            Ok(Stats::from_values([
                row.get(0)?,
                row.get(1)?,
                row.get(2)?,
                row.get(3)?,
                row.get(4)?,
                row.get(5)?,
                row.get(6)?,
            ]))
        },
    )
}

fn load_classes(conn: &Connection, character_id: i64) -> rusqlite::Result<Vec<ClassAssignment>> {
    let mut stmt = conn.prepare(
        "SELECT ca.id, c.id, c.api_index, c.name, s.id, s.name, ca.level
         FROM class_assignments ca
         JOIN classes c ON c.id = ca.class_id
         LEFT JOIN subclasses s ON s.id = ca.subclass_id
         WHERE ca.character_id = ?1
         ORDER BY ca.id",
    )?;
    let classes = stmt
        .query_map(params![character_id], |row| {
            Ok(ClassAssignment {
                id: row.get(0)?,
                class_id: row.get(1)?,
                class_index: row.get(2)?,
                class_name: row.get(3)?,
                subclass_id: row.get(4)?,
                subclass_name: row.get(5)?,
                level: row.get(6)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(classes)
}

fn write_stats(conn: &Connection, character_id: i64, stats: &Stats) -> rusqlite::Result<()> {
    let [hp, str, dex, con, int, wis, cha] = stats.values();
    conn.execute(
        "INSERT INTO stats (character_id, hp, strength, dexterity, constitution,
                            intelligence, wisdom, charisma)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
         ON CONFLICT(character_id) DO UPDATE SET
           hp = excluded.hp,
           strength = excluded.strength,
           dexterity = excluded.dexterity,
           constitution = excluded.constitution,
           intelligence = excluded.intelligence,
           wisdom = excluded.wisdom,
           charisma = excluded.charisma",
        params![character_id, hp, str, dex, con, int, wis, cha],
    )?;
    Ok(())
}

/// Creates the character, its stats and its class assignment in one
/// transaction. Returns the new character's id.
pub fn create(conn: &Connection, user_id: i64, input: &CharacterInput) -> rusqlite::Result<i64> {
    let id = db::atomic(conn, |conn| {
        conn.execute(
            "INSERT INTO characters (user_id, name) VALUES (?1, ?2)",
            params![user_id, input.name],
        )?;
        let id = conn.last_insert_rowid();

        write_stats(conn, id, &input.stats)?;
        conn.execute(
            "INSERT INTO class_assignments (character_id, class_id, subclass_id, level)
             VALUES (?1, ?2, ?3, ?4)",
            params![id, input.class_id, input.subclass_id, input.level],
        )?;
        Ok::<_, rusqlite::Error>(id)
    })?;

    tracing::info!("Created character {} ({}) for user {}", input.name, id, user_id);
    Ok(id)
}

pub fn find(conn: &Connection, id: i64) -> rusqlite::Result<Option<Character>> {
    let row = conn
        .query_row(
            "SELECT id, user_id, name, created_at FROM characters WHERE id = ?1",
            params![id],
            |row| {
                Ok((
                    row.get::<_, i64>(0)?,
                    row.get::<_, i64>(1)?,
                    row.get::<_, String>(2)?,
                    row.get::<_, String>(3)?,
                ))
            },
        )
        .optional()?;

    let Some((id, user_id, name, created_at)) = row else {
        return Ok(None);
    };

    Ok(Some(Character {
        id,
        user_id,
        name,
        created_at,
        stats: load_stats(conn, id)?,
        classes: load_classes(conn, id)?,
    }))
}

/// The user's characters, by name.
pub fn list_for_user(conn: &Connection, user_id: i64) -> rusqlite::Result<Vec<Character>> {
    let ids = {
        let mut stmt = conn.prepare("SELECT id FROM characters WHERE user_id = ?1 ORDER BY name")?;
        let ids = stmt
            .query_map(params![user_id], |row| row.get::<_, i64>(0))?
            .collect::<Result<Vec<_>, _>>()?;
        ids
    };

    let mut characters = Vec::with_capacity(ids.len());
    for id in ids {
        if let Some(character) = find(conn, id)? {
            characters.push(character);
        }
    }
    Ok(characters)
}

/// Rewrites name, stats and the primary class assignment. Other class
/// assignments are left alone.
pub fn update(conn: &Connection, character: &Character, input: &CharacterInput) -> rusqlite::Result<()> {
    db::atomic(conn, |conn| {
        conn.execute(
            "UPDATE characters SET name = ?1 WHERE id = ?2",
            params![input.name, character.id],
        )?;
        write_stats(conn, character.id, &input.stats)?;

        match character.primary_class() {
            Some(primary) => conn.execute(
                "UPDATE class_assignments SET class_id = ?1, subclass_id = ?2, level = ?3
                 WHERE id = ?4",
                params![input.class_id, input.subclass_id, input.level, primary.id],
            )?,
            None => conn.execute(
                "INSERT INTO class_assignments (character_id, class_id, subclass_id, level)
                 VALUES (?1, ?2, ?3, ?4)",
                params![character.id, input.class_id, input.subclass_id, input.level],
            )?,
        };
        Ok::<_, rusqlite::Error>(())
    })?;

    tracing::info!("Updated character {} ({})", input.name, character.id);
    Ok(())
}

/// Deletes the character; stats, class assignments and spell lists cascade.
pub fn delete(conn: &Connection, id: i64) -> rusqlite::Result<bool> {
    let rows = conn.execute("DELETE FROM characters WHERE id = ?1", params![id])?;
    if rows > 0 {
        tracing::info!("Deleted character {}", id);
    }
    Ok(rows > 0)
}

/// Whether the user already has a character called `name`, ignoring the
/// character being edited.
pub fn name_taken(
    conn: &Connection,
    user_id: i64,
    name: &str,
    except: Option<i64>,
) -> rusqlite::Result<bool> {
    conn.query_row(
        "SELECT COUNT(*) > 0 FROM characters
         WHERE user_id = ?1 AND name = ?2 AND id IS NOT ?3",
        params![user_id, name, except],
        |row| row.get(0),
    )
}
