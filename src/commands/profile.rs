// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::{file_store, opt_arg};
use crate::store::Repository;
use crate::utils::{maybe_print_json, pretty_table};
use anyhow::Result;

pub fn handle(repo: &mut dyn Repository, m: &clap::ArgMatches) -> Result<()> {
    let store = file_store(repo)?;
    match m.subcommand() {
        Some(("set", sub)) => {
            store.update_profile(
                opt_arg(sub, "name"),
                opt_arg(sub, "mobile"),
                opt_arg(sub, "email"),
            )?;
            println!("Profile updated");
        }
        Some(("show", sub)) => {
            let settings = store.settings()?;
            if !maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &settings)? {
                let field = |v: &Option<String>| v.clone().unwrap_or_else(|| "-".into());
                let rows = vec![
                    vec!["Name".to_string(), field(&settings.name)],
                    vec!["Mobile".to_string(), field(&settings.mobile)],
                    vec!["Email".to_string(), field(&settings.email)],
                    vec![
                        "Selected business".to_string(),
                        field(&settings.selected_business),
                    ],
                ];
                println!("{}", pretty_table(&["Field", "Value"], rows));
            }
        }
        _ => {}
    }
    Ok(())
}
