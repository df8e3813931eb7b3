// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::{arg, file_store, opt_arg};
use crate::store::Repository;
use crate::utils::{format_stamp, maybe_print_json, pretty_table};
use anyhow::Result;

pub fn handle(repo: &mut dyn Repository, m: &clap::ArgMatches) -> Result<()> {
    let store = file_store(repo)?;
    match m.subcommand() {
        Some(("add", sub)) => {
            let (business, book) = store.create_business(
                arg(sub, "name")?,
                opt_arg(sub, "category").unwrap_or_default(),
                opt_arg(sub, "type").unwrap_or_default(),
            )?;
            println!(
                "Added business '{}' ({}) with book '{}' ({}); now selected",
                business.name, business.id, book.name, book.id
            );
        }
        Some(("list", sub)) => {
            let businesses = store.list_businesses()?;
            if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &businesses)? {
                let selected = store.selected_business()?;
                let rows = businesses
                    .iter()
                    .map(|b| {
                        let mark = if selected.as_deref() == Some(b.id.as_str()) {
                            "*"
                        } else {
                            ""
                        };
                        vec![
                            mark.to_string(),
                            b.id.clone(),
                            b.name.clone(),
                            b.category.clone(),
                            b.r#type.clone(),
                            format_stamp(&b.updated_at),
                        ]
                    })
                    .collect();
                println!(
                    "{}",
                    pretty_table(&["", "Id", "Name", "Category", "Type", "Updated"], rows)
                );
            }
        }
        Some(("update", sub)) => {
            let business = store.update_business(
                arg(sub, "id")?,
                opt_arg(sub, "name"),
                opt_arg(sub, "category"),
                opt_arg(sub, "type"),
            )?;
            println!("Updated business '{}' ({})", business.name, business.id);
        }
        Some(("select", sub)) => {
            let id = arg(sub, "id")?;
            store.select_business(id)?;
            println!("Selected business {}", id);
        }
        Some(("rm", sub)) => {
            let id = arg(sub, "id")?;
            store.delete_business(id)?;
            println!("Removed business {} and its books", id);
        }
        _ => {}
    }
    Ok(())
}
