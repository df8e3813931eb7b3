// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! JSON-file backend.
//!
//! Each entity family is one file holding a JSON array (settings is a single
//! object). Transactions are partitioned into `book_<id>.json` per book.
//! Every mutation reads the whole file, changes it in memory and rewrites it
//! through a [`Commit`]; concurrent writers are not coordinated and the last
//! write wins.

use super::commit::Commit;
use super::{missing, validate_input, Repository};
use crate::balance;
use crate::error::{Error, Result};
use crate::models::{
    Book, BookSummary, Business, Category, EntityId, Settings, Transaction, TransactionInput,
    DEFAULT_BOOK_NAME, DEFAULT_CATEGORIES, OTHERS_CATEGORY,
};
use crate::utils::{check_amount, next_stamp, now_stamp, require_name};
use serde::de::DeserializeOwned;
use std::cmp::Reverse;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use uuid::Uuid;

pub const BUSINESS_FILE: &str = "business.json";
pub const BOOKS_FILE: &str = "books.json";
pub const CATEGORIES_FILE: &str = "categories.json";
pub const SETTINGS_FILE: &str = "settings.json";

pub fn book_file(book_id: &str) -> String {
    format!("book_{}.json", book_id)
}

fn new_id() -> EntityId {
    Uuid::new_v4().to_string()
}

pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Opens the store rooted at `dir`, seeding default categories on first run.
    pub fn open(dir: &Path) -> Result<FileStore> {
        fs::create_dir_all(dir)?;
        let store = FileStore {
            dir: dir.to_path_buf(),
        };
        if !dir.join(CATEGORIES_FILE).exists() {
            let defaults: Vec<Category> = DEFAULT_CATEGORIES
                .iter()
                .map(|name| Category {
                    id: new_id(),
                    name: name.to_string(),
                    is_default: *name == OTHERS_CATEGORY,
                })
                .collect();
            store.write_one(CATEGORIES_FILE, &defaults)?;
            info!(dir = %dir.display(), "seeded default categories");
        }
        Ok(store)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// A missing file reads as an empty list.
    fn read_list<T: DeserializeOwned>(&self, file: &str) -> Result<Vec<T>> {
        let path = self.dir.join(file);
        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(err) => return Err(Error::StorageIo(format!("Read {}: {}", file, err))),
        };
        serde_json::from_str(&text)
            .map_err(|e| Error::StorageIo(format!("Parse {}: {}", file, e)))
    }

    fn write_one<T: serde::Serialize + ?Sized>(&self, file: &str, value: &T) -> Result<()> {
        let mut commit = Commit::new(&self.dir);
        commit.write_json(file, value)?;
        commit.apply()?;
        Ok(())
    }

    fn books(&self) -> Result<Vec<Book>> {
        self.read_list(BOOKS_FILE)
    }

    fn categories(&self) -> Result<Vec<Category>> {
        self.read_list(CATEGORIES_FILE)
    }

    /// Rejects a file holding an amount that input validation would refuse.
    fn book_transactions(&self, book_id: &str) -> Result<Vec<Transaction>> {
        let file = book_file(book_id);
        let txs: Vec<Transaction> = self.read_list(&file)?;
        for tx in &txs {
            check_amount(tx.amount).map_err(|e| {
                Error::StorageIo(format!("{}: transaction {}: {}", file, tx.id, e))
            })?;
        }
        Ok(txs)
    }

    fn position_of_book(books: &[Book], id: &str) -> Result<usize> {
        books
            .iter()
            .position(|b| b.id == id)
            .ok_or_else(|| missing("Book", id))
    }

    fn touch(books: &mut [Book], ids: &[&str]) {
        for book in books.iter_mut().filter(|b| ids.contains(&b.id.as_str())) {
            book.updated_at = next_stamp(book.updated_at);
        }
    }

    fn category_by_id(&self, id: &str) -> Result<Category> {
        self.categories()?
            .into_iter()
            .find(|c| c.id == id)
            .ok_or_else(|| missing("Category", id))
    }

    fn ensure_unique_category(cats: &[Category], name: &str, except: Option<&str>) -> Result<()> {
        if cats
            .iter()
            .any(|c| c.name == name && Some(c.id.as_str()) != except)
        {
            return Err(Error::DuplicateName(format!(
                "Category '{}' already exists",
                name
            )));
        }
        Ok(())
    }

    fn build_transaction(
        id: EntityId,
        book_id: &str,
        category: &Category,
        input: TransactionInput,
        created_at: chrono::DateTime<chrono::Utc>,
    ) -> Transaction {
        Transaction {
            id,
            book_id: book_id.to_string(),
            category_id: category.id.clone(),
            category: category.name.clone(),
            amount: input.amount,
            direction: input.direction,
            date: input.date,
            time: input.time,
            remark: input.remark,
            created_at,
        }
    }

    // --- businesses and settings ---

    pub fn settings(&self) -> Result<Settings> {
        let path = self.dir.join(SETTINGS_FILE);
        match fs::read_to_string(&path) {
            Ok(text) => serde_json::from_str(&text)
                .map_err(|e| Error::StorageIo(format!("Parse {}: {}", SETTINGS_FILE, e))),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(Settings::default()),
            Err(err) => Err(Error::StorageIo(format!("Read {}: {}", SETTINGS_FILE, err))),
        }
    }

    pub fn selected_business(&self) -> Result<Option<EntityId>> {
        Ok(self.settings()?.selected_business)
    }

    pub fn list_businesses(&self) -> Result<Vec<Business>> {
        self.read_list(BUSINESS_FILE)
    }

    pub fn get_business(&self, id: &str) -> Result<Business> {
        self.list_businesses()?
            .into_iter()
            .find(|b| b.id == id)
            .ok_or_else(|| missing("Business", id))
    }

    /// Writes the business, its default book and the new selection as one commit.
    pub fn create_business(
        &mut self,
        name: &str,
        category: &str,
        r#type: &str,
    ) -> Result<(Business, Book)> {
        let name = require_name("Business", name)?;
        let now = now_stamp();
        let business = Business {
            id: new_id(),
            name,
            category: category.trim().to_string(),
            r#type: r#type.trim().to_string(),
            created_at: now,
            updated_at: now,
        };
        let book = Book {
            id: new_id(),
            business_id: Some(business.id.clone()),
            name: DEFAULT_BOOK_NAME.to_string(),
            updated_at: now,
        };

        let mut businesses = self.list_businesses()?;
        businesses.push(business.clone());
        let mut books = self.books()?;
        books.push(book.clone());
        let mut settings = self.settings()?;
        settings.selected_business = Some(business.id.clone());

        let mut commit = Commit::new(&self.dir);
        commit.write_json(BUSINESS_FILE, &businesses)?;
        commit.write_json(BOOKS_FILE, &books)?;
        commit.write_json(SETTINGS_FILE, &settings)?;
        commit.apply()?;
        info!(business = %business.id, "created business");
        Ok((business, book))
    }

    pub fn update_business(
        &mut self,
        id: &str,
        name: Option<&str>,
        category: Option<&str>,
        r#type: Option<&str>,
    ) -> Result<Business> {
        let mut businesses = self.list_businesses()?;
        let business = businesses
            .iter_mut()
            .find(|b| b.id == id)
            .ok_or_else(|| missing("Business", id))?;
        if let Some(name) = name {
            business.name = require_name("Business", name)?;
        }
        if let Some(category) = category {
            business.category = category.trim().to_string();
        }
        if let Some(t) = r#type {
            business.r#type = t.trim().to_string();
        }
        business.updated_at = next_stamp(business.updated_at);
        let updated = business.clone();
        self.write_one(BUSINESS_FILE, &businesses)?;
        Ok(updated)
    }

    /// Removes the business with all of its books and their transactions.
    pub fn delete_business(&mut self, id: &str) -> Result<()> {
        let mut businesses = self.list_businesses()?;
        let before = businesses.len();
        businesses.retain(|b| b.id != id);
        if businesses.len() == before {
            return Err(missing("Business", id));
        }
        let (owned, kept): (Vec<Book>, Vec<Book>) = self
            .books()?
            .into_iter()
            .partition(|b| b.business_id.as_deref() == Some(id));
        let mut settings = self.settings()?;

        let mut commit = Commit::new(&self.dir);
        commit.write_json(BUSINESS_FILE, &businesses)?;
        commit.write_json(BOOKS_FILE, &kept)?;
        for book in &owned {
            commit.remove(&book_file(&book.id));
        }
        if settings.selected_business.as_deref() == Some(id) {
            settings.selected_business = None;
            commit.write_json(SETTINGS_FILE, &settings)?;
        }
        commit.apply()?;
        info!(business = id, books = owned.len(), "deleted business");
        Ok(())
    }

    pub fn select_business(&mut self, id: &str) -> Result<Settings> {
        self.get_business(id)?;
        let mut settings = self.settings()?;
        settings.selected_business = Some(id.to_string());
        self.write_one(SETTINGS_FILE, &settings)?;
        Ok(settings)
    }

    /// `None` leaves a field as is; an empty string clears it.
    pub fn update_profile(
        &mut self,
        name: Option<&str>,
        mobile: Option<&str>,
        email: Option<&str>,
    ) -> Result<Settings> {
        fn apply(field: &mut Option<String>, value: Option<&str>) {
            if let Some(v) = value {
                let v = v.trim();
                *field = if v.is_empty() { None } else { Some(v.to_string()) };
            }
        }
        let mut settings = self.settings()?;
        apply(&mut settings.name, name);
        apply(&mut settings.mobile, mobile);
        apply(&mut settings.email, email);
        self.write_one(SETTINGS_FILE, &settings)?;
        Ok(settings)
    }
}

impl Repository for FileStore {
    fn list_books(&self, business: Option<&str>) -> Result<Vec<BookSummary>> {
        let mut out = Vec::new();
        for book in self.books()? {
            if business.is_some() && book.business_id.as_deref() != business {
                continue;
            }
            let balance = match self.book_transactions(&book.id) {
                Ok(txs) => Some(balance::totals(&txs).net),
                Err(err) => {
                    warn!(book = %book.id, error = %err, "could not read book file, balance omitted");
                    None
                }
            };
            out.push(BookSummary { book, balance });
        }
        out.sort_by_key(|s| Reverse(s.book.updated_at));
        Ok(out)
    }

    fn get_book(&self, id: &str) -> Result<Book> {
        self.books()?
            .into_iter()
            .find(|b| b.id == id)
            .ok_or_else(|| missing("Book", id))
    }

    /// Without an explicit business the book goes to the selected one.
    fn create_book(&mut self, business: Option<&str>, name: &str) -> Result<Book> {
        let name = require_name("Book", name)?;
        let business_id = match business {
            Some(id) => Some(self.get_business(id)?.id),
            None => self.selected_business()?,
        };
        let book = Book {
            id: new_id(),
            business_id,
            name,
            updated_at: now_stamp(),
        };
        let mut books = self.books()?;
        books.push(book.clone());
        self.write_one(BOOKS_FILE, &books)?;
        debug!(book = %book.id, "created book");
        Ok(book)
    }

    fn rename_book(&mut self, id: &str, name: &str) -> Result<Book> {
        let name = require_name("Book", name)?;
        let mut books = self.books()?;
        let idx = Self::position_of_book(&books, id)?;
        books[idx].name = name;
        Self::touch(&mut books, &[id]);
        let renamed = books[idx].clone();
        self.write_one(BOOKS_FILE, &books)?;
        Ok(renamed)
    }

    fn delete_book(&mut self, id: &str) -> Result<()> {
        let mut books = self.books()?;
        let idx = Self::position_of_book(&books, id)?;
        books.remove(idx);
        let mut commit = Commit::new(&self.dir);
        commit.write_json(BOOKS_FILE, &books)?;
        commit.remove(&book_file(id));
        commit.apply()?;
        debug!(book = id, "deleted book");
        Ok(())
    }

    fn list_categories(&self) -> Result<Vec<Category>> {
        let mut cats = self.categories()?;
        cats.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(cats)
    }

    fn create_category(&mut self, name: &str) -> Result<Category> {
        let name = require_name("Category", name)?;
        let mut cats = self.categories()?;
        Self::ensure_unique_category(&cats, &name, None)?;
        let cat = Category {
            id: new_id(),
            name,
            is_default: false,
        };
        cats.push(cat.clone());
        self.write_one(CATEGORIES_FILE, &cats)?;
        Ok(cat)
    }

    /// Stored transactions keep the name they were written with.
    fn rename_category(&mut self, id: &str, name: &str) -> Result<Category> {
        let name = require_name("Category", name)?;
        let mut cats = self.categories()?;
        let idx = cats
            .iter()
            .position(|c| c.id == id)
            .ok_or_else(|| missing("Category", id))?;
        if cats[idx].is_others() {
            return Err(Error::ProtectedEntity(format!(
                "Category '{}' cannot be renamed",
                OTHERS_CATEGORY
            )));
        }
        Self::ensure_unique_category(&cats, &name, Some(id))?;
        cats[idx].name = name;
        let renamed = cats[idx].clone();
        self.write_one(CATEGORIES_FILE, &cats)?;
        Ok(renamed)
    }

    fn delete_category(&mut self, id: &str) -> Result<()> {
        let mut cats = self.categories()?;
        let idx = cats
            .iter()
            .position(|c| c.id == id)
            .ok_or_else(|| missing("Category", id))?;
        if cats[idx].is_others() {
            return Err(Error::ProtectedEntity(format!(
                "Category '{}' cannot be deleted",
                OTHERS_CATEGORY
            )));
        }
        let others = cats
            .iter()
            .find(|c| c.is_others())
            .cloned()
            .ok_or_else(|| {
                Error::InvariantViolation(format!("'{}' category is missing", OTHERS_CATEGORY))
            })?;
        cats.remove(idx);

        let mut commit = Commit::new(&self.dir);
        let mut books = self.books()?;
        let mut touched = Vec::new();
        for book in &books {
            let mut txs = self.book_transactions(&book.id)?;
            let mut changed = false;
            for tx in txs.iter_mut().filter(|t| t.category_id == id) {
                tx.category_id = others.id.clone();
                tx.category = others.name.clone();
                changed = true;
            }
            if changed {
                commit.write_json(&book_file(&book.id), &txs)?;
                touched.push(book.id.clone());
            }
        }
        if !touched.is_empty() {
            let ids: Vec<&str> = touched.iter().map(String::as_str).collect();
            Self::touch(&mut books, &ids);
            commit.write_json(BOOKS_FILE, &books)?;
        }
        commit.write_json(CATEGORIES_FILE, &cats)?;
        commit.apply()?;
        debug!(category = id, books = touched.len(), "deleted category");
        Ok(())
    }

    fn list_transactions(&self, book_id: &str) -> Result<Vec<Transaction>> {
        self.get_book(book_id)?;
        let mut txs = self.book_transactions(book_id)?;
        txs.sort_by(|a, b| {
            (b.date, b.time, b.created_at).cmp(&(a.date, a.time, a.created_at))
        });
        Ok(txs)
    }

    fn get_transaction(&self, book_id: &str, id: &str) -> Result<Transaction> {
        self.get_book(book_id)?;
        self.book_transactions(book_id)?
            .into_iter()
            .find(|t| t.id == id)
            .ok_or_else(|| missing("Transaction", id))
    }

    fn add_transaction(&mut self, book_id: &str, input: TransactionInput) -> Result<Transaction> {
        let input = validate_input(input)?;
        let mut books = self.books()?;
        Self::position_of_book(&books, book_id)?;
        let category = self.category_by_id(&input.category_id)?;

        let tx = Self::build_transaction(new_id(), book_id, &category, input, now_stamp());
        let mut txs = self.book_transactions(book_id)?;
        txs.push(tx.clone());
        Self::touch(&mut books, &[book_id]);

        let mut commit = Commit::new(&self.dir);
        commit.write_json(&book_file(book_id), &txs)?;
        commit.write_json(BOOKS_FILE, &books)?;
        commit.apply()?;
        debug!(book = book_id, transaction = %tx.id, "added transaction");
        Ok(tx)
    }

    /// Re-snapshots the category name from the current category list.
    fn update_transaction(
        &mut self,
        book_id: &str,
        id: &str,
        input: TransactionInput,
    ) -> Result<Transaction> {
        let input = validate_input(input)?;
        let mut books = self.books()?;
        Self::position_of_book(&books, book_id)?;
        let category = self.category_by_id(&input.category_id)?;

        let mut txs = self.book_transactions(book_id)?;
        let slot = txs
            .iter_mut()
            .find(|t| t.id == id)
            .ok_or_else(|| missing("Transaction", id))?;
        let (tx_id, created_at) = (slot.id.clone(), slot.created_at);
        *slot = Self::build_transaction(tx_id, book_id, &category, input, created_at);
        let updated = slot.clone();
        Self::touch(&mut books, &[book_id]);

        let mut commit = Commit::new(&self.dir);
        commit.write_json(&book_file(book_id), &txs)?;
        commit.write_json(BOOKS_FILE, &books)?;
        commit.apply()?;
        Ok(updated)
    }

    fn delete_transaction(&mut self, book_id: &str, id: &str) -> Result<()> {
        let mut books = self.books()?;
        Self::position_of_book(&books, book_id)?;
        let mut txs = self.book_transactions(book_id)?;
        let before = txs.len();
        txs.retain(|t| t.id != id);
        if txs.len() == before {
            return Err(missing("Transaction", id));
        }
        Self::touch(&mut books, &[book_id]);

        let mut commit = Commit::new(&self.dir);
        commit.write_json(&book_file(book_id), &txs)?;
        commit.write_json(BOOKS_FILE, &books)?;
        commit.apply()?;
        Ok(())
    }

    fn transfer_transaction(
        &mut self,
        from_book: &str,
        to_book: &str,
        id: &str,
    ) -> Result<Transaction> {
        if from_book == to_book {
            return Err(Error::Validation(
                "Source and destination book are the same".into(),
            ));
        }
        let mut books = self.books()?;
        Self::position_of_book(&books, from_book)?;
        Self::position_of_book(&books, to_book)?;

        let mut source = self.book_transactions(from_book)?;
        let idx = source
            .iter()
            .position(|t| t.id == id)
            .ok_or_else(|| missing("Transaction", id))?;
        let mut moved = source.remove(idx);
        moved.book_id = to_book.to_string();
        let mut dest = self.book_transactions(to_book)?;
        dest.push(moved.clone());
        Self::touch(&mut books, &[from_book, to_book]);

        let mut commit = Commit::new(&self.dir);
        commit.write_json(&book_file(from_book), &source)?;
        commit.write_json(&book_file(to_book), &dest)?;
        commit.write_json(BOOKS_FILE, &books)?;
        commit.apply()?;
        debug!(transaction = id, from = from_book, to = to_book, "transferred transaction");
        Ok(moved)
    }

    fn as_files(&mut self) -> Option<&mut FileStore> {
        Some(self)
    }
}
