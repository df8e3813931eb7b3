// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::{arg, opt_arg, resolve_category};
use crate::balance::{self, BalancedTransaction};
use crate::models::TransactionInput;
use crate::store::Repository;
use crate::utils::{
    fmt_money, maybe_print_json, parse_amount, parse_date, parse_direction, parse_time,
    pretty_table,
};
use anyhow::Result;
use chrono::{Local, NaiveDate, NaiveTime, Timelike};

pub fn handle(repo: &mut dyn Repository, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(repo, sub)?,
        Some(("list", sub)) => list(repo, sub)?,
        Some(("edit", sub)) => edit(repo, sub)?,
        Some(("rm", sub)) => {
            let (book, id) = (arg(sub, "book")?, arg(sub, "id")?);
            repo.delete_transaction(book, id)?;
            println!("Removed transaction {} from book {}", id, book);
        }
        Some(("move", sub)) => {
            let (from, to) = (arg(sub, "from")?, arg(sub, "to")?);
            let tx = repo.transfer_transaction(from, to, arg(sub, "id")?)?;
            println!("Moved transaction {} from book {} to book {}", tx.id, from, to);
        }
        Some(("search", sub)) => search(repo, sub)?,
        _ => {}
    }
    Ok(())
}

fn now_local() -> (NaiveDate, NaiveTime) {
    let now = Local::now().naive_local();
    let time = now.time();
    (now.date(), time.with_nanosecond(0).unwrap_or(time))
}

fn add(repo: &mut dyn Repository, sub: &clap::ArgMatches) -> Result<()> {
    let book = arg(sub, "book")?;
    let (today, now) = now_local();
    let category = resolve_category(repo, opt_arg(sub, "category"))?;
    let input = TransactionInput {
        category_id: category.id,
        amount: parse_amount(arg(sub, "amount")?)?,
        direction: parse_direction(arg(sub, "type")?)?,
        date: opt_arg(sub, "date").map(parse_date).transpose()?.unwrap_or(today),
        time: opt_arg(sub, "time").map(parse_time).transpose()?.unwrap_or(now),
        remark: opt_arg(sub, "remark").map(str::to_string),
    };
    let tx = repo.add_transaction(book, input)?;
    println!(
        "Recorded {} {} on {} {} under '{}' ({})",
        tx.direction.as_str(),
        fmt_money(&tx.amount),
        tx.date,
        tx.time.format("%H:%M"),
        tx.category,
        tx.id
    );
    Ok(())
}

/// Fields not given on the command line keep their stored values.
fn edit(repo: &mut dyn Repository, sub: &clap::ArgMatches) -> Result<()> {
    let (book, id) = (arg(sub, "book")?, arg(sub, "id")?);
    let current = repo.get_transaction(book, id)?;
    let category_id = match opt_arg(sub, "category") {
        Some(key) => resolve_category(repo, Some(key))?.id,
        None => current.category_id.clone(),
    };
    let input = TransactionInput {
        category_id,
        amount: opt_arg(sub, "amount")
            .map(parse_amount)
            .transpose()?
            .unwrap_or(current.amount),
        direction: opt_arg(sub, "type")
            .map(parse_direction)
            .transpose()?
            .unwrap_or(current.direction),
        date: opt_arg(sub, "date").map(parse_date).transpose()?.unwrap_or(current.date),
        time: opt_arg(sub, "time").map(parse_time).transpose()?.unwrap_or(current.time),
        remark: match opt_arg(sub, "remark") {
            Some(r) => Some(r.to_string()),
            None => current.remark.clone(),
        },
    };
    let tx = repo.update_transaction(book, id, input)?;
    println!("Updated transaction {} in book {}", tx.id, book);
    Ok(())
}

fn list(repo: &mut dyn Repository, sub: &clap::ArgMatches) -> Result<()> {
    let txs = repo.list_transactions(arg(sub, "book")?)?;
    let from = opt_arg(sub, "from").map(parse_date).transpose()?;
    let to = opt_arg(sub, "to").map(parse_date).transpose()?;
    let annotated = balance::filter_by_date(&balance::running_balances(&txs), from, to);
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &annotated)? {
        print_ledger(&annotated);
        let totals = balance::totals(&txs);
        println!(
            "Cash in {}  Cash out {}  Balance {}",
            fmt_money(&totals.total_in),
            fmt_money(&totals.total_out),
            fmt_money(&totals.net)
        );
    }
    Ok(())
}

fn search(repo: &mut dyn Repository, sub: &clap::ArgMatches) -> Result<()> {
    let txs = repo.list_transactions(arg(sub, "book")?)?;
    let hits = balance::search(&balance::running_balances(&txs), arg(sub, "query")?);
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &hits)? {
        print_ledger(&hits);
    }
    Ok(())
}

pub(crate) fn print_ledger(rows: &[BalancedTransaction]) {
    let data = rows
        .iter()
        .map(|b| {
            let tx = &b.transaction;
            vec![
                tx.id.clone(),
                tx.date.to_string(),
                tx.time.format("%H:%M").to_string(),
                tx.direction.as_str().to_string(),
                tx.category.clone(),
                fmt_money(&tx.amount),
                fmt_money(&b.running_balance),
                tx.remark.clone().unwrap_or_default(),
            ]
        })
        .collect();
    println!(
        "{}",
        pretty_table(
            &["Id", "Date", "Time", "Type", "Category", "Amount", "Balance", "Remark"],
            data
        )
    );
}
