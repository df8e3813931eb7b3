// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Caller-owned cache of the last-loaded books and transactions.
//!
//! Nothing here refreshes itself: after a write, call [`AppState::refresh`]
//! (or the narrower `refresh_books` / `open_book`) to reload from the store.

use crate::balance::{self, BalancedTransaction, Totals};
use crate::error::{Error, Result};
use crate::models::{BookSummary, EntityId};
use crate::store::Repository;
use tracing::debug;

#[derive(Debug, Default)]
pub struct AppState {
    selected_business: Option<EntityId>,
    books: Vec<BookSummary>,
    open_book: Option<EntityId>,
    transactions: Vec<BalancedTransaction>,
    totals: Totals,
}

impl AppState {
    pub fn new(selected_business: Option<EntityId>) -> AppState {
        AppState {
            selected_business,
            ..AppState::default()
        }
    }

    pub fn selected_business(&self) -> Option<&str> {
        self.selected_business.as_deref()
    }

    /// Switching business drops everything loaded under the previous one.
    pub fn select_business(&mut self, business: Option<EntityId>) {
        if self.selected_business != business {
            self.selected_business = business;
            self.books.clear();
            self.close_book();
        }
    }

    pub fn books(&self) -> &[BookSummary] {
        &self.books
    }

    pub fn open_book_id(&self) -> Option<&str> {
        self.open_book.as_deref()
    }

    /// Newest first, each with its running balance.
    pub fn transactions(&self) -> &[BalancedTransaction] {
        &self.transactions
    }

    pub fn totals(&self) -> Totals {
        self.totals
    }

    pub fn refresh_books<R: Repository + ?Sized>(&mut self, repo: &R) -> Result<&[BookSummary]> {
        self.books = repo.list_books(self.selected_business.as_deref())?;
        debug!(books = self.books.len(), "refreshed books");
        Ok(&self.books)
    }

    pub fn open_book<R: Repository + ?Sized>(
        &mut self,
        repo: &R,
        book_id: &str,
    ) -> Result<&[BalancedTransaction]> {
        let txs = repo.list_transactions(book_id)?;
        self.totals = balance::totals(&txs);
        self.transactions = balance::running_balances(&txs);
        self.open_book = Some(book_id.to_string());
        Ok(&self.transactions)
    }

    pub fn close_book(&mut self) {
        self.open_book = None;
        self.transactions.clear();
        self.totals = Totals::default();
    }

    /// Reloads the book list and the open book. A book that has since been
    /// deleted is closed rather than reported as an error.
    pub fn refresh<R: Repository + ?Sized>(&mut self, repo: &R) -> Result<()> {
        self.refresh_books(repo)?;
        if let Some(id) = self.open_book.clone() {
            match self.open_book(repo, &id) {
                Ok(_) => {}
                Err(Error::NotFound(_)) => self.close_book(),
                Err(err) => return Err(err),
            }
        }
        Ok(())
    }

    pub fn search(&self, query: &str) -> Vec<BalancedTransaction> {
        balance::search(&self.transactions, query)
    }
}
