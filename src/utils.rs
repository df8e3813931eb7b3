// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::error::{Error, Result};
use crate::models::Direction;
use chrono::{DateTime, Duration, NaiveDate, NaiveTime, SecondsFormat, SubsecRound, Utc};
use comfy_table::{presets::UTF8_FULL, Cell, Table};
use rust_decimal::Decimal;

pub fn parse_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .map_err(|_| Error::Validation(format!("Invalid date '{}', expected YYYY-MM-DD", s)))
}

/// Accepts `HH:MM` or `HH:MM:SS`.
pub fn parse_time(s: &str) -> Result<NaiveTime> {
    let s = s.trim();
    NaiveTime::parse_from_str(s, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(s, "%H:%M"))
        .map_err(|_| Error::Validation(format!("Invalid time '{}', expected HH:MM[:SS]", s)))
}

/// Amounts are magnitudes; the direction carries the sign.
pub fn parse_amount(s: &str) -> Result<Decimal> {
    let d = s
        .trim()
        .parse::<Decimal>()
        .map_err(|_| Error::Validation(format!("Invalid amount '{}'", s)))?;
    check_amount(d)
}

/// Largest accepted amount; sums of stored amounts stay inside `Decimal`'s range.
pub const MAX_AMOUNT: i64 = 1_000_000_000_000;

pub fn check_amount(d: Decimal) -> Result<Decimal> {
    if d.is_sign_negative() {
        return Err(Error::Validation(format!(
            "Amount must be non-negative, got {}",
            d
        )));
    }
    if d > Decimal::from(MAX_AMOUNT) {
        return Err(Error::Validation(format!(
            "Amount must not exceed {}, got {}",
            MAX_AMOUNT, d
        )));
    }
    Ok(d.normalize())
}

pub fn parse_direction(s: &str) -> Result<Direction> {
    Direction::parse(s).ok_or_else(|| {
        Error::Validation(format!(
            "Invalid direction '{}', expected in|out (income|expense)",
            s
        ))
    })
}

/// Trims and rejects empty names.
pub fn require_name(kind: &str, s: &str) -> Result<String> {
    let name = s.trim();
    if name.is_empty() {
        return Err(Error::Validation(format!("{} name must not be empty", kind)));
    }
    Ok(name.to_string())
}

pub fn now_stamp() -> DateTime<Utc> {
    Utc::now().trunc_subsecs(3)
}

/// A timestamp strictly after `prev`, at millisecond resolution.
pub fn next_stamp(prev: DateTime<Utc>) -> DateTime<Utc> {
    let now = now_stamp();
    if now > prev {
        now
    } else {
        prev.trunc_subsecs(3) + Duration::milliseconds(1)
    }
}

pub fn format_stamp(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub fn parse_stamp(s: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|d| d.with_timezone(&Utc))
        .map_err(|e| Error::StorageIo(format!("Invalid timestamp '{}': {}", s, e)))
}

pub fn fmt_money(d: &Decimal) -> String {
    format!("{:.2}", d.round_dp(2))
}

pub fn pretty_table(headers: &[&str], rows: Vec<Vec<String>>) -> Table {
    let mut t = Table::new();
    t.load_preset(UTF8_FULL);
    t.set_header(headers.iter().map(|h| Cell::new(*h)));
    for r in rows {
        t.add_row(r.into_iter().map(Cell::new));
    }
    t
}

pub fn maybe_print_json<T: serde::Serialize>(
    json_flag: bool,
    jsonl_flag: bool,
    v: &T,
) -> Result<bool> {
    if json_flag {
        println!("{}", serde_json::to_string_pretty(v)?);
        return Ok(true);
    }
    if jsonl_flag {
        // If v is an array, stream each element; else stream single line
        let val = serde_json::to_value(v)?;
        if let Some(arr) = val.as_array() {
            for item in arr {
                println!("{}", serde_json::to_string(item)?);
            }
        } else {
            println!("{}", serde_json::to_string(&val)?);
        }
        return Ok(true);
    }
    Ok(false)
}
