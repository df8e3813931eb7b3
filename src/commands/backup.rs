// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::arg;
use crate::backup;
use crate::config::{Backend, Config};
use anyhow::{bail, Result};
use std::path::Path;
use tracing::warn;

pub fn handle(config: &Config, m: &clap::ArgMatches) -> Result<()> {
    if config.backend == Backend::Sqlite {
        warn!("backups cover the flat-file data only; the SQLite database is not included");
    }
    let dir = config.ensure_data_dir()?;
    match m.subcommand() {
        Some(("create", sub)) => {
            let out = arg(sub, "out")?;
            let summary = backup::create_backup_file(dir, Path::new(out))?;
            for name in &summary.skipped {
                eprintln!("Skipped unreadable file {}", name);
            }
            println!("Backed up {} files to {}", summary.files.len(), out);
        }
        Some(("verify", sub)) => {
            let sig = backup::validate_backup_file(Path::new(arg(sub, "file")?))?;
            println!(
                "Valid {} backup from {} (version {})",
                sig.app_name, sig.backup_date, sig.version
            );
        }
        Some(("restore", sub)) => {
            let file = Path::new(arg(sub, "file")?);
            if let Err(err) = backup::validate_backup_file(file) {
                if !sub.get_flag("force") {
                    bail!("{}; pass --force to restore anyway", err);
                }
                warn!(error = %err, "restoring an archive that failed validation");
            }
            let summary = backup::restore_backup_file(file, dir)?;
            for name in &summary.skipped {
                eprintln!("Ignored archive entry {}", name);
            }
            println!("Restored {} files into {}", summary.restored.len(), dir.display());
        }
        _ => {}
    }
    Ok(())
}
