// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::error::{Error, Result};
use crate::models::{DEFAULT_BOOK_NAME, DEFAULT_CATEGORIES, OTHERS_CATEGORY};
use rusqlite::{params, Connection};
use std::path::Path;
use tracing::info;

pub fn open_or_init(path: &Path) -> Result<Connection> {
    let conn = Connection::open(path)
        .map_err(|e| Error::StorageIo(format!("Open DB at {}: {}", path.display(), e)))?;
    init_schema(&conn)?;
    Ok(conn)
}

pub fn open_in_memory() -> Result<Connection> {
    let conn = Connection::open_in_memory()?;
    init_schema(&conn)?;
    Ok(conn)
}

/// Creates tables and triggers if missing and seeds defaults into empty tables.
/// Safe to run on every start.
pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(&SCHEMA.replace("TOUCH", TOUCH_STAMP))?;
    conn.execute_batch(SECRETS_TABLE)?;
    seed_defaults(conn)
}

/// Opens the database with only the `secrets` table ensured; no books or
/// categories are seeded.
pub fn open_secrets(path: &Path) -> Result<Connection> {
    let conn = Connection::open(path)
        .map_err(|e| Error::StorageIo(format!("Open DB at {}: {}", path.display(), e)))?;
    conn.execute_batch(SECRETS_TABLE)?;
    Ok(conn)
}

const SECRETS_TABLE: &str = "
    -- onboarding secrets (appPin, securityQuestion, securityAnswer, isFirst)
    CREATE TABLE IF NOT EXISTS secrets(
        key TEXT PRIMARY KEY,
        value TEXT NOT NULL
    );";

// millisecond stamps in one fixed format compare correctly as text
const TOUCH_STAMP: &str = "MAX(strftime('%Y-%m-%dT%H:%M:%fZ','now'), \
     IFNULL(strftime('%Y-%m-%dT%H:%M:%fZ', last_updated, '+0.001 seconds'), ''))";

const SCHEMA: &str = r#"
    PRAGMA foreign_keys = ON;

    CREATE TABLE IF NOT EXISTS books(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL,
        last_updated TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ','now'))
    );

    CREATE TABLE IF NOT EXISTS categories(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        name TEXT NOT NULL UNIQUE,
        is_default INTEGER NOT NULL DEFAULT 0
    );

    CREATE TABLE IF NOT EXISTS transactions(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        date TEXT NOT NULL,
        time TEXT NOT NULL,
        book_id INTEGER NOT NULL,
        cat_id INTEGER NOT NULL,
        amount TEXT NOT NULL,
        remark TEXT,
        cashin INTEGER NOT NULL DEFAULT 0,
        cashout INTEGER NOT NULL DEFAULT 0,
        created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ','now')),
        CHECK(cashin + cashout = 1),
        FOREIGN KEY(book_id) REFERENCES books(id),
        FOREIGN KEY(cat_id) REFERENCES categories(id)
    );
    CREATE INDEX IF NOT EXISTS idx_transactions_book ON transactions(book_id, date, time);

    DROP TRIGGER IF EXISTS books_touch_on_rename;
    DROP TRIGGER IF EXISTS books_touch_on_tx_insert;
    DROP TRIGGER IF EXISTS books_touch_on_tx_update;
    DROP TRIGGER IF EXISTS books_touch_on_tx_delete;

    -- each touch stamps now, or 1 ms past the previous stamp, so it is strictly later
    CREATE TRIGGER books_touch_on_rename
    AFTER UPDATE OF name ON books
    BEGIN
        UPDATE books SET last_updated = TOUCH WHERE id = NEW.id;
    END;

    CREATE TRIGGER books_touch_on_tx_insert
    AFTER INSERT ON transactions
    BEGIN
        UPDATE books SET last_updated = TOUCH WHERE id = NEW.book_id;
    END;

    -- a transfer changes book_id, so both books are touched
    CREATE TRIGGER books_touch_on_tx_update
    AFTER UPDATE ON transactions
    BEGIN
        UPDATE books SET last_updated = TOUCH WHERE id IN (OLD.book_id, NEW.book_id);
    END;

    CREATE TRIGGER books_touch_on_tx_delete
    AFTER DELETE ON transactions
    BEGIN
        UPDATE books SET last_updated = TOUCH WHERE id = OLD.book_id;
    END;
"#;

fn seed_defaults(conn: &Connection) -> Result<()> {
    let books: i64 = conn.query_row("SELECT COUNT(*) FROM books", [], |r| r.get(0))?;
    if books == 0 {
        conn.execute(
            "INSERT INTO books(name) VALUES (?1)",
            params![DEFAULT_BOOK_NAME],
        )?;
        info!(book = DEFAULT_BOOK_NAME, "seeded default book");
    }

    let categories: i64 = conn.query_row("SELECT COUNT(*) FROM categories", [], |r| r.get(0))?;
    if categories == 0 {
        let mut stmt = conn.prepare("INSERT INTO categories(name, is_default) VALUES (?1, ?2)")?;
        for name in DEFAULT_CATEGORIES {
            stmt.execute(params![name, name == OTHERS_CATEGORY])?;
        }
        info!(count = DEFAULT_CATEGORIES.len(), "seeded default categories");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bootstrap_twice_does_not_duplicate_seed() {
        let conn = open_in_memory().unwrap();
        init_schema(&conn).unwrap();
        let books: i64 = conn
            .query_row("SELECT COUNT(*) FROM books", [], |r| r.get(0))
            .unwrap();
        let cats: i64 = conn
            .query_row("SELECT COUNT(*) FROM categories", [], |r| r.get(0))
            .unwrap();
        assert_eq!(books, 1);
        assert_eq!(cats, 5);
        let others_default: bool = conn
            .query_row(
                "SELECT is_default FROM categories WHERE name='Others'",
                [],
                |r| r.get(0),
            )
            .unwrap();
        assert!(others_default);
    }

    #[test]
    fn touch_is_strictly_later_than_previous_stamp() {
        let conn = open_in_memory().unwrap();
        let future = "2999-01-01T00:00:00.000Z";
        conn.execute("UPDATE books SET last_updated=?1", params![future])
            .unwrap();
        conn.execute("UPDATE books SET name='Renamed'", []).unwrap();
        conn.execute("UPDATE books SET name='Again'", []).unwrap();
        let stamp: String = conn
            .query_row("SELECT last_updated FROM books", [], |r| r.get(0))
            .unwrap();
        assert_eq!(stamp, "2999-01-01T00:00:00.002Z");
    }

    #[test]
    fn secrets_only_open_seeds_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cashbook.sqlite");
        let conn = open_secrets(&path).unwrap();
        let tables: Vec<String> = conn
            .prepare("SELECT name FROM sqlite_master WHERE type='table' ORDER BY name")
            .unwrap()
            .query_map([], |r| r.get(0))
            .unwrap()
            .collect::<rusqlite::Result<_>>()
            .unwrap();
        assert_eq!(tables, ["secrets"]);

        drop(conn);
        let full = open_or_init(&path).unwrap();
        let books: i64 = full
            .query_row("SELECT COUNT(*) FROM books", [], |r| r.get(0))
            .unwrap();
        assert_eq!(books, 1);
    }
}
