// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use cashbook::models::{Direction, TransactionInput};
use cashbook::state::AppState;
use cashbook::store::{FileStore, Repository};
use chrono::{NaiveDate, NaiveTime};
use rust_decimal::Decimal;
use tempfile::tempdir;

fn entry(cat: &str, amount: i64, direction: Direction, day: u32, remark: &str) -> TransactionInput {
    TransactionInput {
        category_id: cat.to_string(),
        amount: Decimal::new(amount, 0),
        direction,
        date: NaiveDate::from_ymd_opt(2025, 1, day).unwrap(),
        time: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
        remark: Some(remark.to_string()),
    }
}

#[test]
fn open_book_annotates_and_refresh_tracks_writes() {
    let dir = tempdir().unwrap();
    let mut store = FileStore::open(dir.path()).unwrap();
    let (business, book) = store.create_business("Shop A", "", "").unwrap();
    let others = store
        .list_categories()
        .unwrap()
        .into_iter()
        .find(|c| c.is_others())
        .unwrap();
    store
        .add_transaction(&book.id, entry(&others.id, 100, Direction::CashIn, 1, "opening"))
        .unwrap();
    store
        .add_transaction(&book.id, entry(&others.id, 70, Direction::CashOut, 2, "rent"))
        .unwrap();

    let mut state = AppState::new(Some(business.id.clone()));
    assert_eq!(state.refresh_books(&store).unwrap().len(), 1);
    let rows = state.open_book(&store, &book.id).unwrap();
    let balances: Vec<Decimal> = rows.iter().map(|r| r.running_balance).collect();
    assert_eq!(balances, [Decimal::new(30, 0), Decimal::new(100, 0)]);
    assert_eq!(state.totals().net, Decimal::new(30, 0));
    assert_eq!(state.search("RENT").len(), 1);

    // the cache is stale until refreshed
    store
        .add_transaction(&book.id, entry(&others.id, 120, Direction::CashIn, 3, "sales"))
        .unwrap();
    assert_eq!(state.transactions().len(), 2);
    state.refresh(&store).unwrap();
    assert_eq!(state.transactions().len(), 3);
    assert_eq!(state.totals().net, Decimal::new(150, 0));
    assert_eq!(state.books()[0].balance, Some(Decimal::new(150, 0)));

    store.delete_book(&book.id).unwrap();
    state.refresh(&store).unwrap();
    assert_eq!(state.open_book_id(), None);
    assert!(state.transactions().is_empty());
    assert!(state.books().is_empty());
}

#[test]
fn switching_business_clears_cached_data() {
    let dir = tempdir().unwrap();
    let mut store = FileStore::open(dir.path()).unwrap();
    let (first, book) = store.create_business("First", "", "").unwrap();
    let (second, _) = store.create_business("Second", "", "").unwrap();

    let mut state = AppState::new(Some(first.id.clone()));
    state.refresh_books(&store).unwrap();
    state.open_book(&store, &book.id).unwrap();
    assert_eq!(state.open_book_id(), Some(book.id.as_str()));

    state.select_business(Some(first.id.clone()));
    assert_eq!(state.open_book_id(), Some(book.id.as_str()));

    state.select_business(Some(second.id.clone()));
    assert_eq!(state.selected_business(), Some(second.id.as_str()));
    assert_eq!(state.open_book_id(), None);
    assert!(state.books().is_empty());
    assert_eq!(state.refresh_books(&store).unwrap().len(), 1);
}
