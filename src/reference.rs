//! Seeded class and subclass catalog. Read-only once the server is running.

use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::db::models::{Class, Subclass};
use crate::rules::ApiReference;

fn class_from_row(row: &Row<'_>) -> rusqlite::Result<Class> {
    Ok(Class {
        id: row.get(0)?,
        index: row.get(1)?,
        name: row.get(2)?,
        url: row.get(3)?,
    })
}

fn subclass_from_row(row: &Row<'_>) -> rusqlite::Result<Subclass> {
    Ok(Subclass {
        id: row.get(0)?,
        index: row.get(1)?,
        name: row.get(2)?,
        url: row.get(3)?,
        parent_class: row.get(4)?,
    })
}

pub fn list_classes(conn: &Connection) -> rusqlite::Result<Vec<Class>> {
    let mut stmt = conn.prepare("SELECT id, api_index, name, url FROM classes ORDER BY name")?;
    let classes = stmt
        .query_map([], class_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(classes)
}

pub fn find_class(conn: &Connection, id: i64) -> rusqlite::Result<Option<Class>> {
    conn.query_row(
        "SELECT id, api_index, name, url FROM classes WHERE id = ?1",
        params![id],
        class_from_row,
    )
    .optional()
}

pub fn list_subclasses(conn: &Connection) -> rusqlite::Result<Vec<Subclass>> {
    let mut stmt = conn.prepare(
        "SELECT id, api_index, name, url, parent_class FROM subclasses ORDER BY parent_class, name",
    )?;
    let subclasses = stmt
        .query_map([], subclass_from_row)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(subclasses)
}

/// Whether `subclass_id` is a subclass of `class_id`.
pub fn subclass_belongs_to(
    conn: &Connection,
    subclass_id: i64,
    class_id: i64,
) -> rusqlite::Result<bool> {
    conn.query_row(
        "SELECT COUNT(*) > 0 FROM subclasses s \
         JOIN classes c ON c.api_index = s.parent_class \
         WHERE s.id = ?1 AND c.id = ?2",
        params![subclass_id, class_id],
        |row| row.get(0),
    )
}

/// Inserts or refreshes a class by its index, keeping its id.
pub fn upsert_class(conn: &Connection, class: &ApiReference) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO classes (api_index, name, url) VALUES (?1, ?2, ?3)
         ON CONFLICT(api_index) DO UPDATE SET name = excluded.name, url = excluded.url",
        params![class.index, class.name, class.url],
    )?;
    Ok(())
}

pub fn upsert_subclass(
    conn: &Connection,
    parent_class: &str,
    subclass: &ApiReference,
) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO subclasses (api_index, name, url, parent_class) VALUES (?1, ?2, ?3, ?4)
         ON CONFLICT(api_index) DO UPDATE SET
           name = excluded.name,
           url = excluded.url,
           parent_class = excluded.parent_class",
        params![subclass.index, subclass.name, subclass.url, parent_class],
    )?;
    Ok(())
}
