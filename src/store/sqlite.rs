// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::{missing, validate_input, Repository};
use crate::db;
use crate::error::{Error, Result};
use crate::models::{
    Book, BookSummary, Category, Direction, Transaction, TransactionInput, OTHERS_CATEGORY,
};
use crate::utils::{
    check_amount, format_stamp, now_stamp, parse_date, parse_stamp, parse_time, require_name,
};
use rusqlite::{params, Connection, OptionalExtension};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, warn};

const TX_SELECT: &str = "SELECT t.id, t.book_id, t.cat_id, IFNULL(c.name,''), t.amount, t.cashin, \
     t.date, t.time, t.remark, t.created_at \
     FROM transactions t LEFT JOIN categories c ON t.cat_id=c.id";

pub struct SqliteStore {
    conn: Connection,
}

type RawTx = (
    i64,
    i64,
    i64,
    String,
    String,
    bool,
    String,
    String,
    Option<String>,
    String,
);

fn raw_tx(r: &rusqlite::Row<'_>) -> rusqlite::Result<RawTx> {
    Ok((
        r.get(0)?,
        r.get(1)?,
        r.get(2)?,
        r.get(3)?,
        r.get(4)?,
        r.get(5)?,
        r.get(6)?,
        r.get(7)?,
        r.get(8)?,
        r.get(9)?,
    ))
}

fn into_transaction(raw: RawTx) -> Result<Transaction> {
    let (id, book_id, cat_id, category, amount, cashin, date, time, remark, created_at) = raw;
    let amount = stored_amount(id, &amount)?;
    Ok(Transaction {
        id: id.to_string(),
        book_id: book_id.to_string(),
        category_id: cat_id.to_string(),
        category,
        amount,
        direction: if cashin {
            Direction::CashIn
        } else {
            Direction::CashOut
        },
        date: parse_date(&date)?,
        time: parse_time(&time)?,
        remark,
        created_at: parse_stamp(&created_at)?,
    })
}

fn stored_amount(tx_id: i64, text: &str) -> Result<Decimal> {
    text.parse::<Decimal>()
        .map_err(|_| Error::Validation(format!("Invalid amount '{}'", text)))
        .and_then(check_amount)
        .map_err(|e| Error::StorageIo(format!("Transaction {}: {}", tx_id, e)))
}

fn into_book(id: i64, name: String, last_updated: String) -> Result<Book> {
    Ok(Book {
        id: id.to_string(),
        business_id: None,
        name,
        updated_at: parse_stamp(&last_updated)?,
    })
}

fn parse_id(kind: &str, id: &str) -> Result<i64> {
    id.trim()
        .parse::<i64>()
        .map_err(|_| Error::Validation(format!("Invalid {} id '{}'", kind, id)))
}

impl SqliteStore {
    pub fn open(path: &Path) -> Result<SqliteStore> {
        Ok(SqliteStore {
            conn: db::open_or_init(path)?,
        })
    }

    /// Wraps a connection, bootstrapping the schema on it.
    pub fn from_connection(conn: Connection) -> Result<SqliteStore> {
        db::init_schema(&conn)?;
        Ok(SqliteStore { conn })
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Folds every stored amount in `Decimal`, so balances are exact.
    fn books_with_balance(&self) -> Result<Vec<BookSummary>> {
        let mut sums: HashMap<i64, Decimal> = HashMap::new();
        let mut stmt = self
            .conn
            .prepare("SELECT id, book_id, amount, cashin FROM transactions")?;
        let rows = stmt.query_map([], |r| {
            Ok((
                r.get::<_, i64>(0)?,
                r.get::<_, i64>(1)?,
                r.get::<_, String>(2)?,
                r.get::<_, bool>(3)?,
            ))
        })?;
        for row in rows {
            let (id, book_id, amount, cashin) = row?;
            let amount = stored_amount(id, &amount)?;
            let signed = if cashin { amount } else { -amount };
            let sum = sums.entry(book_id).or_default();
            *sum = sum.checked_add(signed).ok_or_else(|| {
                Error::StorageIo(format!("Balance of book {} overflowed", book_id))
            })?;
        }

        let mut out = self.plain_books()?;
        for summary in &mut out {
            let id = parse_id("book", &summary.book.id)?;
            summary.balance = Some(sums.get(&id).copied().unwrap_or(Decimal::ZERO));
        }
        Ok(out)
    }

    fn plain_books(&self) -> Result<Vec<BookSummary>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, last_updated FROM books ORDER BY last_updated DESC, id DESC")?;
        let rows = stmt.query_map([], |r| {
            Ok((
                r.get::<_, i64>(0)?,
                r.get::<_, String>(1)?,
                r.get::<_, String>(2)?,
            ))
        })?;
        let mut out = Vec::new();
        for row in rows {
            let (id, name, last_updated) = row?;
            out.push(BookSummary {
                book: into_book(id, name, last_updated)?,
                balance: None,
            });
        }
        Ok(out)
    }

    fn category(&self, id: i64) -> Result<Category> {
        self.conn
            .query_row(
                "SELECT id, name, is_default FROM categories WHERE id=?1",
                params![id],
                |r| {
                    Ok(Category {
                        id: r.get::<_, i64>(0)?.to_string(),
                        name: r.get(1)?,
                        is_default: r.get(2)?,
                    })
                },
            )
            .optional()?
            .ok_or_else(|| missing("Category", &id.to_string()))
    }

    fn category_name_taken(&self, name: &str, except: Option<i64>) -> Result<bool> {
        let found: Option<i64> = self
            .conn
            .query_row(
                "SELECT id FROM categories WHERE name=?1",
                params![name],
                |r| r.get(0),
            )
            .optional()?;
        Ok(matches!(found, Some(id) if Some(id) != except))
    }

    fn require_book(&self, id: i64) -> Result<()> {
        let found: Option<i64> = self
            .conn
            .query_row("SELECT id FROM books WHERE id=?1", params![id], |r| r.get(0))
            .optional()?;
        found.map(|_| ()).ok_or_else(|| missing("Book", &id.to_string()))
    }

    fn transaction_row(&self, book_id: i64, id: i64) -> Result<Transaction> {
        let raw = self
            .conn
            .query_row(
                &format!("{} WHERE t.id=?1 AND t.book_id=?2", TX_SELECT),
                params![id, book_id],
                raw_tx,
            )
            .optional()?
            .ok_or_else(|| missing("Transaction", &id.to_string()))?;
        into_transaction(raw)
    }
}

impl Repository for SqliteStore {
    /// Falls back to balance-less rows if the aggregation fails.
    fn list_books(&self, _business: Option<&str>) -> Result<Vec<BookSummary>> {
        match self.books_with_balance() {
            Ok(books) => Ok(books),
            Err(err) => {
                warn!(error = %err, "book balance aggregation failed, listing books without balance");
                self.plain_books()
            }
        }
    }

    fn get_book(&self, id: &str) -> Result<Book> {
        let id = parse_id("book", id)?;
        let row = self
            .conn
            .query_row(
                "SELECT id, name, last_updated FROM books WHERE id=?1",
                params![id],
                |r| Ok((r.get::<_, i64>(0)?, r.get::<_, String>(1)?, r.get::<_, String>(2)?)),
            )
            .optional()?
            .ok_or_else(|| missing("Book", &id.to_string()))?;
        into_book(row.0, row.1, row.2)
    }

    fn create_book(&mut self, _business: Option<&str>, name: &str) -> Result<Book> {
        let name = require_name("Book", name)?;
        self.conn.execute(
            "INSERT INTO books(name, last_updated) VALUES (?1, ?2)",
            params![name, format_stamp(&now_stamp())],
        )?;
        let id = self.conn.last_insert_rowid();
        debug!(book = id, "created book");
        self.get_book(&id.to_string())
    }

    fn rename_book(&mut self, id: &str, name: &str) -> Result<Book> {
        let book_id = parse_id("book", id)?;
        let name = require_name("Book", name)?;
        self.require_book(book_id)?;
        self.conn
            .execute("UPDATE books SET name=?1 WHERE id=?2", params![name, book_id])?;
        self.get_book(id)
    }

    fn delete_book(&mut self, id: &str) -> Result<()> {
        let book_id = parse_id("book", id)?;
        self.require_book(book_id)?;
        // dropping `tx` before commit rolls both deletes back
        let tx = self.conn.transaction()?;
        let removed = tx.execute("DELETE FROM transactions WHERE book_id=?1", params![book_id])?;
        tx.execute("DELETE FROM books WHERE id=?1", params![book_id])?;
        tx.commit()?;
        debug!(book = book_id, transactions = removed, "deleted book");
        Ok(())
    }

    fn list_categories(&self) -> Result<Vec<Category>> {
        let mut stmt = self
            .conn
            .prepare("SELECT id, name, is_default FROM categories ORDER BY name ASC")?;
        let rows = stmt.query_map([], |r| {
            Ok(Category {
                id: r.get::<_, i64>(0)?.to_string(),
                name: r.get(1)?,
                is_default: r.get(2)?,
            })
        })?;
        let mut out = Vec::new();
        for row in rows {
            out.push(row?);
        }
        Ok(out)
    }

    fn create_category(&mut self, name: &str) -> Result<Category> {
        let name = require_name("Category", name)?;
        if self.category_name_taken(&name, None)? {
            return Err(Error::DuplicateName(format!("Category '{}' already exists", name)));
        }
        self.conn.execute(
            "INSERT INTO categories(name, is_default) VALUES (?1, 0)",
            params![name],
        )?;
        self.category(self.conn.last_insert_rowid())
    }

    fn rename_category(&mut self, id: &str, name: &str) -> Result<Category> {
        let cat_id = parse_id("category", id)?;
        let name = require_name("Category", name)?;
        let current = self.category(cat_id)?;
        if current.is_others() {
            return Err(Error::ProtectedEntity(format!(
                "Category '{}' cannot be renamed",
                OTHERS_CATEGORY
            )));
        }
        if self.category_name_taken(&name, Some(cat_id))? {
            return Err(Error::DuplicateName(format!("Category '{}' already exists", name)));
        }
        self.conn.execute(
            "UPDATE categories SET name=?1 WHERE id=?2",
            params![name, cat_id],
        )?;
        self.category(cat_id)
    }

    fn delete_category(&mut self, id: &str) -> Result<()> {
        let cat_id = parse_id("category", id)?;
        let current = self.category(cat_id)?;
        if current.is_others() {
            return Err(Error::ProtectedEntity(format!(
                "Category '{}' cannot be deleted",
                OTHERS_CATEGORY
            )));
        }
        let others: i64 = self
            .conn
            .query_row(
                "SELECT id FROM categories WHERE name=?1",
                params![OTHERS_CATEGORY],
                |r| r.get(0),
            )
            .optional()?
            .ok_or_else(|| {
                Error::InvariantViolation(format!("'{}' category is missing", OTHERS_CATEGORY))
            })?;

        let tx = self.conn.transaction()?;
        let moved = tx.execute(
            "UPDATE transactions SET cat_id=?1 WHERE cat_id=?2",
            params![others, cat_id],
        )?;
        tx.execute("DELETE FROM categories WHERE id=?1", params![cat_id])?;
        tx.commit()?;
        debug!(category = cat_id, reassigned = moved, "deleted category");
        Ok(())
    }

    fn list_transactions(&self, book_id: &str) -> Result<Vec<Transaction>> {
        let book_id = parse_id("book", book_id)?;
        self.require_book(book_id)?;
        let mut stmt = self.conn.prepare(&format!(
            "{} WHERE t.book_id=?1 ORDER BY t.date DESC, t.time DESC, t.id DESC",
            TX_SELECT
        ))?;
        let rows = stmt.query_map(params![book_id], raw_tx)?;
        let mut out = Vec::new();
        for row in rows {
            out.push(into_transaction(row?)?);
        }
        Ok(out)
    }

    fn get_transaction(&self, book_id: &str, id: &str) -> Result<Transaction> {
        self.transaction_row(parse_id("book", book_id)?, parse_id("transaction", id)?)
    }

    fn add_transaction(&mut self, book_id: &str, input: TransactionInput) -> Result<Transaction> {
        let book = parse_id("book", book_id)?;
        let cat = parse_id("category", &input.category_id)?;
        let input = validate_input(input)?;
        self.require_book(book)?;
        self.category(cat)?;
        self.conn.execute(
            "INSERT INTO transactions(date, time, book_id, cat_id, amount, remark, cashin, cashout, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
            params![
                input.date.to_string(),
                input.time.format("%H:%M:%S").to_string(),
                book,
                cat,
                input.amount.to_string(),
                input.remark,
                input.direction == Direction::CashIn,
                input.direction == Direction::CashOut,
                format_stamp(&now_stamp()),
            ],
        )?;
        let id = self.conn.last_insert_rowid();
        debug!(book, transaction = id, "added transaction");
        self.transaction_row(book, id)
    }

    fn update_transaction(
        &mut self,
        book_id: &str,
        id: &str,
        input: TransactionInput,
    ) -> Result<Transaction> {
        let book = parse_id("book", book_id)?;
        let tx_id = parse_id("transaction", id)?;
        let cat = parse_id("category", &input.category_id)?;
        let input = validate_input(input)?;
        self.transaction_row(book, tx_id)?;
        self.category(cat)?;
        self.conn.execute(
            "UPDATE transactions SET date=?1, time=?2, cat_id=?3, amount=?4, remark=?5, cashin=?6, cashout=?7
             WHERE id=?8 AND book_id=?9",
            params![
                input.date.to_string(),
                input.time.format("%H:%M:%S").to_string(),
                cat,
                input.amount.to_string(),
                input.remark,
                input.direction == Direction::CashIn,
                input.direction == Direction::CashOut,
                tx_id,
                book,
            ],
        )?;
        self.transaction_row(book, tx_id)
    }

    fn delete_transaction(&mut self, book_id: &str, id: &str) -> Result<()> {
        let book = parse_id("book", book_id)?;
        let tx_id = parse_id("transaction", id)?;
        let n = self.conn.execute(
            "DELETE FROM transactions WHERE id=?1 AND book_id=?2",
            params![tx_id, book],
        )?;
        if n == 0 {
            return Err(missing("Transaction", id));
        }
        Ok(())
    }

    fn transfer_transaction(
        &mut self,
        from_book: &str,
        to_book: &str,
        id: &str,
    ) -> Result<Transaction> {
        let from = parse_id("book", from_book)?;
        let to = parse_id("book", to_book)?;
        let tx_id = parse_id("transaction", id)?;
        if from == to {
            return Err(Error::Validation(
                "Source and destination book are the same".into(),
            ));
        }
        self.require_book(to)?;
        self.transaction_row(from, tx_id)?;
        self.conn.execute(
            "UPDATE transactions SET book_id=?1 WHERE id=?2 AND book_id=?3",
            params![to, tx_id, from],
        )?;
        debug!(transaction = tx_id, from, to, "transferred transaction");
        self.transaction_row(to, tx_id)
    }
}
