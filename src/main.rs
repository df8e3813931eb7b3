// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;
use tracing_subscriber::EnvFilter;

use cashbook::config::{Config, ENV_LOG};
use cashbook::{cli, commands, db, store};

fn init_tracing() {
    let filter = EnvFilter::try_from_env(ENV_LOG).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn main() -> Result<()> {
    init_tracing();
    let cli = cli::build_cli();
    let matches = cli.get_matches();

    let config = Config::resolve(
        matches.get_one::<String>("data_dir").map(String::as_str),
        matches.get_one::<String>("backend").map(String::as_str),
    )?;

    match matches.subcommand() {
        Some(("backup", sub)) => return commands::backup::handle(&config, sub),
        Some(("pin", sub)) => {
            config.ensure_data_dir()?;
            let conn = db::open_secrets(&config.db_path())?;
            return commands::pin::handle(&conn, sub);
        }
        _ => {}
    }

    let mut repo = store::open(&config)?;

    match matches.subcommand() {
        Some(("init", _)) => commands::init(&config, &*repo)?,
        Some(("business", sub)) => commands::business::handle(&mut *repo, sub)?,
        Some(("profile", sub)) => commands::profile::handle(&mut *repo, sub)?,
        Some(("book", sub)) => commands::books::handle(&mut *repo, sub)?,
        Some(("category", sub)) => commands::categories::handle(&mut *repo, sub)?,
        Some(("tx", sub)) => commands::transactions::handle(&mut *repo, sub)?,
        Some(("report", sub)) => commands::reports::handle(&mut *repo, sub)?,
        Some(("export", sub)) => commands::exporter::handle(&mut *repo, sub)?,
        _ => {
            cli::build_cli().print_help()?;
            println!();
        }
    }
    Ok(())
}
