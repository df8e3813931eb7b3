// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::arg;
use crate::balance;
use crate::store::Repository;
use anyhow::{bail, Result};
use serde_json::json;

pub fn handle(repo: &mut dyn Repository, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("book", sub)) => export_book(repo, sub),
        _ => Ok(()),
    }
}

/// Oldest first, each row carrying the balance after it.
fn export_book(repo: &dyn Repository, sub: &clap::ArgMatches) -> Result<()> {
    let fmt = arg(sub, "format")?.to_lowercase();
    let out = arg(sub, "out")?;
    if fmt != "csv" && fmt != "json" {
        bail!("Unknown format: {} (use csv|json)", fmt);
    }

    let book = repo.get_book(arg(sub, "book")?)?;
    let mut ledger = balance::running_balances(&repo.list_transactions(&book.id)?);
    ledger.reverse();

    if fmt == "csv" {
        let mut wtr = csv::Writer::from_path(out)?;
        wtr.write_record([
            "date", "time", "type", "category", "remark", "amount", "balance",
        ])?;
        for row in &ledger {
            let tx = &row.transaction;
            wtr.write_record([
                tx.date.to_string(),
                tx.time.format("%H:%M:%S").to_string(),
                tx.direction.as_str().to_string(),
                tx.category.clone(),
                tx.remark.clone().unwrap_or_default(),
                tx.amount.to_string(),
                row.running_balance.to_string(),
            ])?;
        }
        wtr.flush()?;
    } else {
        let items: Vec<_> = ledger
            .iter()
            .map(|row| {
                let tx = &row.transaction;
                json!({
                    "date": tx.date.to_string(),
                    "time": tx.time.format("%H:%M:%S").to_string(),
                    "type": tx.direction.as_str(),
                    "category": tx.category,
                    "remark": tx.remark,
                    "amount": tx.amount.to_string(),
                    "balance": row.running_balance.to_string(),
                })
            })
            .collect();
        std::fs::write(out, serde_json::to_string_pretty(&items)?)?;
    }
    println!("Exported {} transactions of '{}' to {}", ledger.len(), book.name, out);
    Ok(())
}
