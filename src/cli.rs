// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::config::{ENV_BACKEND, ENV_DATA_DIR};
use clap::{Arg, ArgAction, Command};

fn opt(name: &'static str, help: &'static str) -> Arg {
    Arg::new(name).long(name).help(help)
}

fn req(name: &'static str, help: &'static str) -> Arg {
    opt(name, help).required(true)
}

fn json_flags(cmd: Command) -> Command {
    cmd.arg(
        Arg::new("json")
            .long("json")
            .action(ArgAction::SetTrue)
            .help("Pretty JSON output"),
    )
    .arg(
        Arg::new("jsonl")
            .long("jsonl")
            .action(ArgAction::SetTrue)
            .conflicts_with("json")
            .help("One JSON object per line"),
    )
}

fn tx_fields(cmd: Command, required: bool) -> Command {
    let amount = opt("amount", "Amount (non-negative)");
    let direction = opt("type", "in|out (income|expense)");
    let (amount, direction) = if required {
        (amount.required(true), direction.required(true))
    } else {
        (amount, direction)
    };
    cmd.arg(amount)
        .arg(direction)
        .arg(opt("category", "Category name or id (default: Others)"))
        .arg(opt("date", "YYYY-MM-DD (default: today)"))
        .arg(opt("time", "HH:MM[:SS] (default: now)"))
        .arg(opt("remark", "Free-text remark"))
}

pub fn build_cli() -> Command {
    Command::new("cashbook")
        .about("CashBook: cashbooks, categories, transactions, balances and backups")
        .version(env!("CARGO_PKG_VERSION"))
        .arg(
            Arg::new("data_dir")
                .long("data-dir")
                .env(ENV_DATA_DIR)
                .global(true)
                .help("Data directory (default: platform data dir)"),
        )
        .arg(
            Arg::new("backend")
                .long("backend")
                .env(ENV_BACKEND)
                .global(true)
                .help("files|sqlite (default: files)"),
        )
        .subcommand(Command::new("init").about("Create the data directory and seed defaults"))
        .subcommand(
            Command::new("business")
                .about("Businesses (files backend)")
                .subcommand(
                    Command::new("add")
                        .arg(req("name", "Business name"))
                        .arg(opt("category", "Business category"))
                        .arg(opt("type", "Business type")),
                )
                .subcommand(json_flags(Command::new("list")))
                .subcommand(
                    Command::new("update")
                        .arg(req("id", "Business id"))
                        .arg(opt("name", "New name"))
                        .arg(opt("category", "New category"))
                        .arg(opt("type", "New type")),
                )
                .subcommand(Command::new("select").arg(req("id", "Business id")))
                .subcommand(Command::new("rm").arg(req("id", "Business id"))),
        )
        .subcommand(
            Command::new("profile")
                .about("User profile (files backend)")
                .subcommand(
                    Command::new("set")
                        .arg(opt("name", "Display name"))
                        .arg(opt("mobile", "Mobile number"))
                        .arg(opt("email", "Email address")),
                )
                .subcommand(json_flags(Command::new("show"))),
        )
        .subcommand(
            Command::new("book")
                .about("Cashbooks")
                .subcommand(
                    Command::new("add")
                        .arg(req("name", "Book name"))
                        .arg(opt("business", "Owning business id (default: selected)")),
                )
                .subcommand(json_flags(
                    Command::new("list")
                        .arg(opt("business", "Business id (default: selected)"))
                        .arg(
                            Arg::new("all")
                                .long("all")
                                .action(ArgAction::SetTrue)
                                .help("Books of every business"),
                        ),
                ))
                .subcommand(
                    Command::new("rename")
                        .arg(req("id", "Book id"))
                        .arg(req("name", "New name")),
                )
                .subcommand(Command::new("rm").arg(req("id", "Book id"))),
        )
        .subcommand(
            Command::new("category")
                .about("Categories")
                .subcommand(Command::new("add").arg(req("name", "Category name")))
                .subcommand(json_flags(Command::new("list")))
                .subcommand(
                    Command::new("rename")
                        .arg(req("id", "Category id"))
                        .arg(req("name", "New name")),
                )
                .subcommand(Command::new("rm").arg(req("id", "Category id"))),
        )
        .subcommand(
            Command::new("tx")
                .about("Transactions")
                .subcommand(tx_fields(
                    Command::new("add").arg(req("book", "Book id")),
                    true,
                ))
                .subcommand(json_flags(
                    Command::new("list")
                        .arg(req("book", "Book id"))
                        .arg(opt("from", "From date, inclusive"))
                        .arg(opt("to", "To date, inclusive")),
                ))
                .subcommand(tx_fields(
                    Command::new("edit")
                        .arg(req("book", "Book id"))
                        .arg(req("id", "Transaction id")),
                    false,
                ))
                .subcommand(
                    Command::new("rm")
                        .arg(req("book", "Book id"))
                        .arg(req("id", "Transaction id")),
                )
                .subcommand(
                    Command::new("move")
                        .arg(req("from", "Source book id"))
                        .arg(req("to", "Destination book id"))
                        .arg(req("id", "Transaction id")),
                )
                .subcommand(json_flags(
                    Command::new("search")
                        .arg(req("book", "Book id"))
                        .arg(req("query", "Matches remark, category or amount")),
                )),
        )
        .subcommand(
            Command::new("report")
                .about("Totals and daily summaries")
                .subcommand(json_flags(Command::new("summary").arg(req("book", "Book id"))))
                .subcommand(json_flags(
                    Command::new("daily")
                        .arg(req("book", "Book id"))
                        .arg(opt("from", "From date, inclusive"))
                        .arg(opt("to", "To date, inclusive")),
                )),
        )
        .subcommand(
            Command::new("export").about("Export a book").subcommand(
                Command::new("book")
                    .arg(req("book", "Book id"))
                    .arg(opt("format", "csv|json").default_value("csv"))
                    .arg(req("out", "Output path")),
            ),
        )
        .subcommand(
            Command::new("backup")
                .about("Zip backups of the flat-file data")
                .subcommand(Command::new("create").arg(req("out", "Archive path")))
                .subcommand(Command::new("verify").arg(req("file", "Archive path")))
                .subcommand(
                    Command::new("restore")
                        .arg(req("file", "Archive path"))
                        .arg(
                            Arg::new("force")
                                .long("force")
                                .action(ArgAction::SetTrue)
                                .help("Restore even if the signature does not validate"),
                        ),
                ),
        )
        .subcommand(
            Command::new("pin")
                .about("App PIN and onboarding state")
                .subcommand(
                    Command::new("set")
                        .arg(req("pin", "New PIN"))
                        .arg(opt("question", "Security question"))
                        .arg(opt("answer", "Security answer")),
                )
                .subcommand(Command::new("verify").arg(req("pin", "PIN to check")))
                .subcommand(Command::new("status")),
        )
}
