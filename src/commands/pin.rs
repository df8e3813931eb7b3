// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::{arg, opt_arg};
use crate::secrets::{SecretStore, APP_PIN, SECURITY_ANSWER, SECURITY_QUESTION};
use anyhow::{bail, Result};
use rusqlite::Connection;

pub fn handle(conn: &Connection, m: &clap::ArgMatches) -> Result<()> {
    let secrets = SecretStore::new(conn);
    match m.subcommand() {
        Some(("set", sub)) => {
            let pin = arg(sub, "pin")?.trim();
            if pin.is_empty() || !pin.chars().all(|c| c.is_ascii_digit()) {
                bail!("PIN must be digits only");
            }
            secrets.set(APP_PIN, pin)?;
            if let Some(q) = opt_arg(sub, "question") {
                secrets.set(SECURITY_QUESTION, q.trim())?;
            }
            if let Some(a) = opt_arg(sub, "answer") {
                secrets.set(SECURITY_ANSWER, a.trim())?;
            }
            secrets.mark_onboarded()?;
            println!("PIN saved");
        }
        Some(("verify", sub)) => {
            if !secrets.verify_pin(arg(sub, "pin")?)? {
                bail!("PIN does not match");
            }
            println!("PIN OK");
        }
        Some(("status", _)) => {
            println!(
                "First run: {}, PIN set: {}, security question: {}",
                secrets.is_first_run()?,
                secrets.get(APP_PIN)?.is_some(),
                secrets
                    .get(SECURITY_QUESTION)?
                    .unwrap_or_else(|| "-".to_string())
            );
        }
        _ => {}
    }
    Ok(())
}
