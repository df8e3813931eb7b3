// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::arg;
use crate::store::Repository;
use crate::utils::{maybe_print_json, pretty_table};
use anyhow::Result;

pub fn handle(repo: &mut dyn Repository, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => {
            let category = repo.create_category(arg(sub, "name")?)?;
            println!("Added category '{}' ({})", category.name, category.id);
        }
        Some(("list", sub)) => {
            let categories = repo.list_categories()?;
            if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &categories)? {
                let rows = categories
                    .iter()
                    .map(|c| {
                        vec![
                            c.id.clone(),
                            c.name.clone(),
                            if c.is_default { "yes" } else { "" }.to_string(),
                        ]
                    })
                    .collect();
                println!("{}", pretty_table(&["Id", "Category", "Default"], rows));
            }
        }
        Some(("rename", sub)) => {
            let category = repo.rename_category(arg(sub, "id")?, arg(sub, "name")?)?;
            println!("Renamed category {} to '{}'", category.id, category.name);
        }
        Some(("rm", sub)) => {
            let id = arg(sub, "id")?;
            repo.delete_category(id)?;
            println!("Removed category {}; its transactions moved to Others", id);
        }
        _ => {}
    }
    Ok(())
}
