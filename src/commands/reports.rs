// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::{arg, opt_arg};
use crate::balance;
use crate::store::Repository;
use crate::utils::{fmt_money, maybe_print_json, parse_date, pretty_table};
use anyhow::Result;
use serde::Serialize;

#[derive(Serialize)]
struct BookReport {
    book_id: String,
    name: String,
    transactions: usize,
    #[serde(flatten)]
    totals: balance::Totals,
}

pub fn handle(repo: &mut dyn Repository, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("summary", sub)) => summary(repo, sub)?,
        Some(("daily", sub)) => daily(repo, sub)?,
        _ => {}
    }
    Ok(())
}

fn summary(repo: &dyn Repository, sub: &clap::ArgMatches) -> Result<()> {
    let book = repo.get_book(arg(sub, "book")?)?;
    let txs = repo.list_transactions(&book.id)?;
    let report = BookReport {
        transactions: txs.len(),
        totals: balance::totals(&txs),
        book_id: book.id,
        name: book.name,
    };
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &report)? {
        let rows = vec![vec![
            report.name.clone(),
            report.transactions.to_string(),
            fmt_money(&report.totals.total_in),
            fmt_money(&report.totals.total_out),
            fmt_money(&report.totals.net),
        ]];
        println!(
            "{}",
            pretty_table(&["Book", "Entries", "Cash in", "Cash out", "Balance"], rows)
        );
    }
    Ok(())
}

fn daily(repo: &dyn Repository, sub: &clap::ArgMatches) -> Result<()> {
    let txs = repo.list_transactions(arg(sub, "book")?)?;
    let from = opt_arg(sub, "from").map(parse_date).transpose()?;
    let to = opt_arg(sub, "to").map(parse_date).transpose()?;
    // closing balances count every earlier day, so filter after summarising
    let days: Vec<_> = balance::daily_summary(&txs)
        .into_iter()
        .filter(|d| from.is_none_or(|f| d.date >= f))
        .filter(|d| to.is_none_or(|t| d.date <= t))
        .collect();
    if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &days)? {
        let rows = days
            .iter()
            .map(|d| {
                vec![
                    d.date.to_string(),
                    fmt_money(&d.total_in),
                    fmt_money(&d.total_out),
                    fmt_money(&d.net),
                    fmt_money(&d.closing_balance),
                ]
            })
            .collect();
        println!(
            "{}",
            pretty_table(&["Date", "Cash in", "Cash out", "Net", "Closing"], rows)
        );
    }
    Ok(())
}
