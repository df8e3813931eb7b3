// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use cashbook::commands::{backup, books, business, categories, exporter, transactions};
use cashbook::config::{Backend, Config};
use cashbook::store::{FileStore, Repository, SqliteStore};
use cashbook::{cli, Error};
use rusqlite::Connection;
use rust_decimal::Decimal;
use std::fs;
use tempfile::tempdir;

fn run(store: &mut dyn Repository, args: &[&str]) -> anyhow::Result<()> {
    let mut argv = vec!["cashbook"];
    argv.extend_from_slice(args);
    let matches = cli::build_cli().get_matches_from(argv);
    match matches.subcommand() {
        Some(("tx", m)) => transactions::handle(store, m),
        Some(("book", m)) => books::handle(store, m),
        Some(("category", m)) => categories::handle(store, m),
        Some(("business", m)) => business::handle(store, m),
        Some(("export", m)) => exporter::handle(store, m),
        other => panic!("unexpected subcommand {:?}", other.map(|(n, _)| n)),
    }
}

fn shop(store: &mut FileStore) -> String {
    let book = store.create_book(None, "Shop A").unwrap();
    for (amount, kind, date, remark) in [
        ("100", "in", "2025-01-01", "opening"),
        ("70", "out", "2025-01-02", "rent"),
        ("120", "income", "2025-01-03", "sales"),
    ] {
        run(
            &mut *store,
            &[
                "tx", "add", "--book", &book.id, "--amount", amount, "--type", kind, "--date",
                date, "--time", "09:00", "--remark", remark,
            ],
        )
        .unwrap();
    }
    book.id
}

#[test]
fn tx_add_defaults_to_others_category() {
    let dir = tempdir().unwrap();
    let mut store = FileStore::open(dir.path()).unwrap();
    let book_id = shop(&mut store);
    let txs = store.list_transactions(&book_id).unwrap();
    assert_eq!(txs.len(), 3);
    assert!(txs.iter().all(|t| t.category == "Others"));
    assert_eq!(txs[0].remark.as_deref(), Some("sales"));
    assert_eq!(
        store.list_books(None).unwrap()[0].balance,
        Some(Decimal::new(150, 0))
    );
}

#[test]
fn tx_edit_changes_only_given_fields() {
    let dir = tempdir().unwrap();
    let mut store = FileStore::open(dir.path()).unwrap();
    let book_id = shop(&mut store);
    let rent = store
        .list_transactions(&book_id)
        .unwrap()
        .into_iter()
        .find(|t| t.remark.as_deref() == Some("rent"))
        .unwrap();

    run(
        &mut store,
        &["tx", "edit", "--book", &book_id, "--id", &rent.id, "--amount", "80", "--category", "food"],
    )
    .unwrap();
    let edited = store.get_transaction(&book_id, &rent.id).unwrap();
    assert_eq!(edited.amount, Decimal::new(80, 0));
    assert_eq!(edited.category, "Food");
    assert_eq!(edited.date, rent.date);
    assert_eq!(edited.remark, rent.remark);
    assert_eq!(edited.direction, rent.direction);
}

#[test]
fn tx_add_rejects_bad_input() {
    let dir = tempdir().unwrap();
    let mut store = FileStore::open(dir.path()).unwrap();
    let book = store.create_book(None, "Shop").unwrap();
    let id = book.id.as_str();

    let negative = ["tx", "add", "--book", id, "--amount=-5", "--type", "in"];
    let err = run(&mut store, &negative).unwrap_err();
    assert!(matches!(err.downcast_ref::<Error>(), Some(Error::Validation(_))));

    let bad_type = ["tx", "add", "--book", id, "--amount", "5", "--type", "sideways"];
    assert!(run(&mut store, &bad_type).is_err());

    let bad_category = [
        "tx", "add", "--book", id, "--amount", "5", "--type", "in", "--category", "Nope",
    ];
    let err = run(&mut store, &bad_category).unwrap_err();
    assert!(matches!(err.downcast_ref::<Error>(), Some(Error::NotFound(_))));

    assert!(store.list_transactions(&book.id).unwrap().is_empty());
}

#[test]
fn tx_move_and_rm() {
    let dir = tempdir().unwrap();
    let mut store = FileStore::open(dir.path()).unwrap();
    let from = shop(&mut store);
    let to = store.create_book(None, "Cash").unwrap().id;
    let first = store.list_transactions(&from).unwrap()[0].id.clone();

    run(&mut store, &["tx", "move", "--from", &from, "--to", &to, "--id", &first]).unwrap();
    assert_eq!(store.list_transactions(&from).unwrap().len(), 2);
    assert_eq!(store.list_transactions(&to).unwrap()[0].id, first);

    run(&mut store, &["tx", "rm", "--book", &to, "--id", &first]).unwrap();
    assert!(store.list_transactions(&to).unwrap().is_empty());
}

#[test]
fn export_book_writes_chronological_csv() {
    let dir = tempdir().unwrap();
    let mut store = FileStore::open(dir.path()).unwrap();
    let book_id = shop(&mut store);
    let out = dir.path().join("shop.csv");
    let out_str = out.to_string_lossy().to_string();

    run(&mut store, &["export", "book", "--book", &book_id, "--out", &out_str]).unwrap();

    let mut rdr = csv::Reader::from_path(&out).unwrap();
    let headers: Vec<String> = rdr.headers().unwrap().iter().map(String::from).collect();
    assert_eq!(
        headers,
        ["date", "time", "type", "category", "remark", "amount", "balance"]
    );
    let rows: Vec<Vec<String>> = rdr
        .records()
        .map(|r| r.unwrap().iter().map(String::from).collect())
        .collect();
    let balances: Vec<&str> = rows.iter().map(|r| r[6].as_str()).collect();
    assert_eq!(balances, ["100", "30", "150"]);
    assert_eq!(rows[1][2], "expense");
    assert_eq!(rows[1][4], "rent");
}

#[test]
fn export_book_json_and_unknown_format() {
    let dir = tempdir().unwrap();
    let mut store = FileStore::open(dir.path()).unwrap();
    let book_id = shop(&mut store);

    let json_out = dir.path().join("shop.json");
    let json_str = json_out.to_string_lossy().to_string();
    run(
        &mut store,
        &["export", "book", "--book", &book_id, "--format", "json", "--out", &json_str],
    )
    .unwrap();
    let parsed: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&json_out).unwrap()).unwrap();
    assert_eq!(parsed[0]["amount"], "100");
    assert_eq!(parsed[2]["balance"], "150");
    assert_eq!(parsed[1]["type"], "expense");

    let xml_out = dir.path().join("shop.xml");
    let xml_str = xml_out.to_string_lossy().to_string();
    assert!(run(
        &mut store,
        &["export", "book", "--book", &book_id, "--format", "xml", "--out", &xml_str],
    )
    .is_err());
    assert!(!xml_out.exists());
}

#[test]
fn category_and_book_commands_work_on_sqlite() {
    let mut store = SqliteStore::from_connection(Connection::open_in_memory().unwrap()).unwrap();
    run(&mut store, &["category", "add", "--name", "Fuel"]).unwrap();
    assert!(run(&mut store, &["category", "add", "--name", "Fuel"]).is_err());
    run(&mut store, &["book", "add", "--name", "Second"]).unwrap();
    assert_eq!(store.list_books(None).unwrap().len(), 2);

    let others = store
        .list_categories()
        .unwrap()
        .into_iter()
        .find(|c| c.name == "Others")
        .unwrap();
    let err = run(&mut store, &["category", "rm", "--id", &others.id]).unwrap_err();
    assert!(matches!(err.downcast_ref::<Error>(), Some(Error::ProtectedEntity(_))));
}

#[test]
fn business_commands_need_file_backend() {
    let mut sqlite = SqliteStore::from_connection(Connection::open_in_memory().unwrap()).unwrap();
    assert!(run(&mut sqlite, &["business", "add", "--name", "Shop"]).is_err());

    let dir = tempdir().unwrap();
    let mut files = FileStore::open(dir.path()).unwrap();
    run(&mut files, &["business", "add", "--name", "Shop", "--category", "Retail"]).unwrap();
    let businesses = files.list_businesses().unwrap();
    assert_eq!(businesses.len(), 1);
    assert_eq!(businesses[0].category, "Retail");

    run(&mut files, &["book", "add", "--name", "Cash"]).unwrap();
    let books = files.list_books(Some(&businesses[0].id)).unwrap();
    assert_eq!(books.len(), 2);
}

#[test]
fn restore_requires_force_for_unsigned_archive() {
    let dir = tempdir().unwrap();
    let config = Config::for_dir(dir.path(), Backend::Files);
    let archive_path = dir.path().join("unsigned.zip");
    {
        use std::io::Write;
        let file = fs::File::create(&archive_path).unwrap();
        let mut zip = zip::ZipWriter::new(file);
        zip.start_file("books.json", zip::write::SimpleFileOptions::default())
            .unwrap();
        zip.write_all(b"[]").unwrap();
        zip.finish().unwrap();
    }
    let archive_str = archive_path.to_string_lossy().to_string();

    let restore = |extra: &[&str]| {
        let mut argv = vec!["cashbook", "backup", "restore", "--file", archive_str.as_str()];
        argv.extend_from_slice(extra);
        let matches = cli::build_cli().get_matches_from(argv);
        match matches.subcommand() {
            Some(("backup", m)) => backup::handle(&config, m),
            _ => panic!("no backup subcommand"),
        }
    };

    assert!(restore(&[]).is_err());
    assert!(!dir.path().join("books.json").exists());
    restore(&["--force"]).unwrap();
    assert_eq!(fs::read_to_string(dir.path().join("books.json")).unwrap(), "[]");
}
