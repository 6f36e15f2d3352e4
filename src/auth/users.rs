use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::db::models::User;
use crate::error::AppResult;

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        username: row.get(1)?,
        email: row.get(2)?,
        password_hash: row.get(3)?,
        created_at: row.get(4)?,
    })
}

/// Hash the password and store a new user. Uniqueness is checked by the
/// caller so it can be reported on the form; the table constraints back it up.
pub fn signup(
    conn: &Connection,
    username: &str,
    email: &str,
    password: &str,
    cost: u32,
) -> AppResult<User> {
    let password_hash = bcrypt::hash(password, cost)?;

    conn.execute(
        "INSERT INTO users (username, email, password_hash) VALUES (?1, ?2, ?3)",
        params![username, email, password_hash],
    )?;

    let user = find_user(conn, conn.last_insert_rowid())?
        .ok_or_else(|| crate::error::AppError::Internal("New user vanished".into()))?;
    tracing::info!("Signed up user {} ({})", user.username, user.id);
    Ok(user)
}

/// The user with this username and password, or `None` on either mismatch.
pub fn authenticate(conn: &Connection, username: &str, password: &str) -> AppResult<Option<User>> {
    let user = conn
        .query_row(
            "SELECT id, username, email, password_hash, created_at FROM users WHERE username = ?1",
            params![username],
            user_from_row,
        )
        .optional()?;

    match user {
        Some(user) if bcrypt::verify(password, &user.password_hash).unwrap_or(false) => {
            Ok(Some(user))
        }
        _ => Ok(None),
    }
}

pub fn find_user(conn: &Connection, id: i64) -> rusqlite::Result<Option<User>> {
    conn.query_row(
        "SELECT id, username, email, password_hash, created_at FROM users WHERE id = ?1",
        params![id],
        user_from_row,
    )
    .optional()
}

pub fn username_taken(conn: &Connection, username: &str) -> rusqlite::Result<bool> {
    conn.query_row(
        "SELECT COUNT(*) > 0 FROM users WHERE username = ?1",
        params![username],
        |row| row.get(0),
    )
}

pub fn email_taken(conn: &Connection, email: &str) -> rusqlite::Result<bool> {
    conn.query_row(
        "SELECT COUNT(*) > 0 FROM users WHERE email = ?1",
        params![email],
        |row| row.get(0),
    )
}

/// Removes the user; characters, sessions and everything beneath them cascade.
pub fn delete_user(conn: &Connection, id: i64) -> rusqlite::Result<bool> {
    let rows = conn.execute("DELETE FROM users WHERE id = ?1", params![id])?;
    Ok(rows > 0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;

    const TEST_COST: u32 = 4;

    fn pool() -> crate::state::DbPool {
        let pool = db::memory_pool().unwrap();
        db::run_migrations(&pool).unwrap();
        pool
    }

    #[test]
    fn signup_hashes_password() {
        let pool = pool();
        let conn = pool.get().unwrap();
        let user = signup(&conn, "testuser", "test@hotmail.com", "HASHED_PASSWORD", TEST_COST).unwrap();

        assert_eq!(user.username, "testuser");
        assert_eq!(user.email, "test@hotmail.com");
        assert_ne!(user.password_hash, "HASHED_PASSWORD");
        assert!(user.password_hash.starts_with("$2"));
    }

    #[test]
    fn authenticate_checks_password() {
        let pool = pool();
        let conn = pool.get().unwrap();
        signup(&conn, "testuser", "test@hotmail.com", "secret1", TEST_COST).unwrap();

        assert!(authenticate(&conn, "testuser", "secret1").unwrap().is_some());
        assert!(authenticate(&conn, "testuser", "wrong").unwrap().is_none());
        assert!(authenticate(&conn, "nobody", "secret1").unwrap().is_none());
    }

    #[test]
    fn duplicate_username_and_email_are_detected() {
        let pool = pool();
        let conn = pool.get().unwrap();
        signup(&conn, "testuser", "test@hotmail.com", "secret1", TEST_COST).unwrap();

        assert!(username_taken(&conn, "testuser").unwrap());
        assert!(!username_taken(&conn, "other").unwrap());
        assert!(email_taken(&conn, "test@hotmail.com").unwrap());
        assert!(signup(&conn, "testuser", "else@hotmail.com", "secret1", TEST_COST).is_err());
    }
}
