// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::{arg, opt_arg};
use crate::store::Repository;
use crate::utils::{fmt_money, format_stamp, maybe_print_json, pretty_table};
use anyhow::Result;

pub fn handle(repo: &mut dyn Repository, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let book = repo.create_book(opt_arg(sub, "business"), arg(sub, "name")?)?;
            println!("Added book '{}' ({})", book.name, book.id);
        }
        Some(("list", sub)) => list(repo, sub)?,
        Some(("rename", sub)) => {
            let book = repo.rename_book(arg(sub, "id")?, arg(sub, "name")?)?;
            println!("Renamed book {} to '{}'", book.id, book.name);
        }
        Some(("rm", sub)) => {
            let id = arg(sub, "id")?;
            repo.delete_book(id)?;
            println!("Removed book {} and its transactions", id);
        }
        _ => {}
    }
    Ok(())
}

fn list(repo: &mut dyn Repository, sub: &clap::ArgMatches) -> Result<()> {
    let business = if sub.get_flag("all") {
        None
    } else {
        match opt_arg(sub, "business") {
            Some(b) => Some(b.to_string()),
            None => match repo.as_files() {
                Some(files) => files.selected_business()?,
                None => None,
            },
        }
    };
    let books = repo.list_books(business.as_deref())?;
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &books)? {
        let rows = books
            .iter()
            .map(|s| {
                vec![
                    s.book.id.clone(),
                    s.book.name.clone(),
                    s.balance.as_ref().map(fmt_money).unwrap_or_else(|| "?".into()),
                    format_stamp(&s.book.updated_at),
                ]
            })
            .collect();
        println!("{}", pretty_table(&["Id", "Name", "Balance", "Updated"], rows));
    }
    Ok(())
}
