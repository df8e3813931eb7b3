// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Storage backends behind one repository contract.
//!
//! `SqliteStore` keeps books, categories and transactions in SQLite.
//! `FileStore` keeps them (plus businesses and settings) in JSON files.
//! Callers pick one with [`open`] and use the [`Repository`] trait.

pub mod commit;
pub mod files;
pub mod sqlite;

pub use files::FileStore;
pub use sqlite::SqliteStore;

use crate::config::{Backend, Config};
use crate::error::Result;
use crate::models::{Book, BookSummary, Category, Transaction, TransactionInput};

/// Book, category and transaction operations shared by both backends.
///
/// Reads take `&self`; anything that writes takes `&mut self`.
pub trait Repository {
    /// Books visible in `business` (ignored by backends without businesses),
    /// most recently updated first, each with its cash-in minus cash-out balance.
    fn list_books(&self, business: Option<&str>) -> Result<Vec<BookSummary>>;

    fn get_book(&self, id: &str) -> Result<Book>;

    fn create_book(&mut self, business: Option<&str>, name: &str) -> Result<Book>;

    fn rename_book(&mut self, id: &str, name: &str) -> Result<Book>;

    /// Deletes the book and every transaction it owns, all or nothing.
    fn delete_book(&mut self, id: &str) -> Result<()>;

    /// Ordered by name ascending.
    fn list_categories(&self) -> Result<Vec<Category>>;

    /// Fails with `DuplicateName` if the name exists.
    fn create_category(&mut self, name: &str) -> Result<Category>;

    /// Fails with `ProtectedEntity` for "Others".
    fn rename_category(&mut self, id: &str, name: &str) -> Result<Category>;

    /// Reassigns the category's transactions to "Others", then deletes it.
    fn delete_category(&mut self, id: &str) -> Result<()>;

    /// Most recent first (date desc, time desc).
    fn list_transactions(&self, book_id: &str) -> Result<Vec<Transaction>>;

    fn get_transaction(&self, book_id: &str, id: &str) -> Result<Transaction>;

    fn add_transaction(&mut self, book_id: &str, input: TransactionInput) -> Result<Transaction>;

    /// Replaces every mutable field of the transaction.
    fn update_transaction(
        &mut self,
        book_id: &str,
        id: &str,
        input: TransactionInput,
    ) -> Result<Transaction>;

    fn delete_transaction(&mut self, book_id: &str, id: &str) -> Result<()>;

    /// Re-parents a transaction from one book to another.
    fn transfer_transaction(&mut self, from_book: &str, to_book: &str, id: &str)
        -> Result<Transaction>;

    /// Backend-specific handle on the flat-file store, if that is what this is.
    fn as_files(&mut self) -> Option<&mut FileStore> {
        None
    }
}

pub fn open(config: &Config) -> Result<Box<dyn Repository>> {
    let dir = config.ensure_data_dir()?;
    match config.backend {
        Backend::Files => Ok(Box::new(FileStore::open(dir)?)),
        Backend::Sqlite => Ok(Box::new(SqliteStore::open(&config.db_path())?)),
    }
}

pub(crate) fn missing(kind: &str, id: &str) -> crate::error::Error {
    crate::error::Error::NotFound(format!("{} '{}'", kind, id))
}

/// Normalizes caller input: non-negative amount, blank remark dropped.
pub(crate) fn validate_input(mut input: TransactionInput) -> Result<TransactionInput> {
    input.amount = crate::utils::check_amount(input.amount)?;
    input.remark = input
        .remark
        .map(|r| r.trim().to_string())
        .filter(|r| !r.is_empty());
    Ok(input)
}
