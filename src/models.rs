// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Opaque id. The SQLite backend renders its integer keys as decimal strings.
pub type EntityId = String;

pub const OTHERS_CATEGORY: &str = "Others";
pub const DEFAULT_CATEGORIES: [&str; 5] = ["Food", "Transport", "Salary", "Shopping", "Others"];
pub const DEFAULT_BOOK_NAME: &str = "My Book";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    #[serde(rename = "income")]
    CashIn,
    #[serde(rename = "expense")]
    CashOut,
}

impl Direction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Direction::CashIn => "income",
            Direction::CashOut => "expense",
        }
    }

    pub fn parse(s: &str) -> Option<Direction> {
        match s.trim().to_lowercase().as_str() {
            "in" | "cashin" | "income" => Some(Direction::CashIn),
            "out" | "cashout" | "expense" => Some(Direction::CashOut),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Business {
    pub id: EntityId,
    pub name: String,
    pub category: String,
    pub r#type: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Book {
    pub id: EntityId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub business_id: Option<EntityId>,
    pub name: String,
    pub updated_at: DateTime<Utc>,
}

/// A book plus its derived balance. `balance` is `None` when the backend
/// could not aggregate.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BookSummary {
    #[serde(flatten)]
    pub book: Book,
    pub balance: Option<Decimal>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: EntityId,
    pub name: String,
    #[serde(default)]
    pub is_default: bool,
}

impl Category {
    pub fn is_others(&self) -> bool {
        self.name == OTHERS_CATEGORY
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: EntityId,
    pub book_id: EntityId,
    pub category_id: EntityId,
    /// Name snapshot taken when the transaction was written.
    pub category: String,
    pub amount: Decimal,
    #[serde(rename = "type")]
    pub direction: Direction,
    pub date: NaiveDate,
    pub time: NaiveTime,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remark: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Caller-supplied fields of a transaction; ids and timestamps are assigned by the store.
#[derive(Debug, Clone, PartialEq)]
pub struct TransactionInput {
    pub category_id: EntityId,
    pub amount: Decimal,
    pub direction: Direction,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub remark: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub selected_business: Option<EntityId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mobile: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}
