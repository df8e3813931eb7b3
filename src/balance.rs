// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Derived balances. Pure functions over a transaction list; nothing here is
//! ever persisted.

use crate::models::{Direction, Transaction};
use crate::utils::fmt_money;
use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BalancedTransaction {
    #[serde(flatten)]
    pub transaction: Transaction,
    /// Balance as of and including this transaction, in chronological order.
    pub running_balance: Decimal,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Totals {
    pub total_in: Decimal,
    pub total_out: Decimal,
    pub net: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DaySummary {
    pub date: NaiveDate,
    pub total_in: Decimal,
    pub total_out: Decimal,
    pub net: Decimal,
    /// Running balance after the day's last transaction.
    pub closing_balance: Decimal,
}

pub fn signed_amount(tx: &Transaction) -> Decimal {
    match tx.direction {
        Direction::CashIn => tx.amount,
        Direction::CashOut => -tx.amount,
    }
}

// id breaks ties so the walk never depends on the caller's ordering
fn chronological_key(tx: &Transaction) -> (NaiveDate, NaiveTime, DateTime<Utc>, &str) {
    (tx.date, tx.time, tx.created_at, tx.id.as_str())
}

/// Annotates each transaction with its running balance, keeping the input order.
pub fn running_balances(txs: &[Transaction]) -> Vec<BalancedTransaction> {
    let mut order: Vec<usize> = (0..txs.len()).collect();
    order.sort_by(|&a, &b| chronological_key(&txs[a]).cmp(&chronological_key(&txs[b])));

    let mut balances = vec![Decimal::ZERO; txs.len()];
    let mut running = Decimal::ZERO;
    for i in order {
        running += signed_amount(&txs[i]);
        balances[i] = running;
    }

    txs.iter()
        .zip(balances)
        .map(|(tx, running_balance)| BalancedTransaction {
            transaction: tx.clone(),
            running_balance,
        })
        .collect()
}

pub fn totals(txs: &[Transaction]) -> Totals {
    let mut t = Totals::default();
    for tx in txs {
        match tx.direction {
            Direction::CashIn => t.total_in += tx.amount,
            Direction::CashOut => t.total_out += tx.amount,
        }
    }
    t.net = t.total_in - t.total_out;
    t
}

/// Case-insensitive substring match on remark, category or amount. The amount
/// matches in both its stored form (`12.5`) and two-place form (`12.50`).
pub fn matches_query(tx: &Transaction, query: &str) -> bool {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return true;
    }
    tx.remark
        .as_deref()
        .is_some_and(|r| r.to_lowercase().contains(&needle))
        || tx.category.to_lowercase().contains(&needle)
        || tx.amount.to_string().contains(&needle)
        || fmt_money(&tx.amount).contains(&needle)
}

/// Filters an annotated list; balances keep their unfiltered values.
pub fn search(annotated: &[BalancedTransaction], query: &str) -> Vec<BalancedTransaction> {
    annotated
        .iter()
        .filter(|b| matches_query(&b.transaction, query))
        .cloned()
        .collect()
}

/// Inclusive on both ends; `None` leaves that side open.
pub fn filter_by_date(
    annotated: &[BalancedTransaction],
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
) -> Vec<BalancedTransaction> {
    annotated
        .iter()
        .filter(|b| from.is_none_or(|f| b.transaction.date >= f))
        .filter(|b| to.is_none_or(|t| b.transaction.date <= t))
        .cloned()
        .collect()
}

/// Per-day totals, newest day first.
pub fn daily_summary(txs: &[Transaction]) -> Vec<DaySummary> {
    let mut days: BTreeMap<NaiveDate, (Decimal, Decimal)> = BTreeMap::new();
    for tx in txs {
        let day = days.entry(tx.date).or_default();
        match tx.direction {
            Direction::CashIn => day.0 += tx.amount,
            Direction::CashOut => day.1 += tx.amount,
        }
    }

    let mut running = Decimal::ZERO;
    let mut out: Vec<DaySummary> = days
        .into_iter()
        .map(|(date, (total_in, total_out))| {
            let net = total_in - total_out;
            running += net;
            DaySummary {
                date,
                total_in,
                total_out,
                net,
                closing_balance: running,
            }
        })
        .collect();
    out.reverse();
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dec(s: &str) -> Decimal {
        s.parse().unwrap()
    }

    fn tx(
        id: &str,
        date: &str,
        time: &str,
        dir: Direction,
        amount: &str,
        remark: &str,
    ) -> Transaction {
        Transaction {
            id: id.into(),
            book_id: "shop-a".into(),
            category_id: "c1".into(),
            category: "Food".into(),
            amount: dec(amount),
            direction: dir,
            date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            time: NaiveTime::parse_from_str(time, "%H:%M:%S").unwrap(),
            remark: if remark.is_empty() { None } else { Some(remark.into()) },
            created_at: DateTime::parse_from_rfc3339("2025-01-01T00:00:00Z")
                .unwrap()
                .with_timezone(&Utc),
        }
    }

    fn shop_a() -> Vec<Transaction> {
        vec![
            tx("1", "2025-03-01", "09:00:00", Direction::CashIn, "100", "opening float"),
            tx("2", "2025-03-02", "10:00:00", Direction::CashOut, "30", "rickshaw fare"),
            tx("3", "2025-03-03", "11:00:00", Direction::CashIn, "50", "sale"),
        ]
    }

    fn balances(list: &[BalancedTransaction]) -> Vec<(String, Decimal)> {
        list.iter()
            .map(|b| (b.transaction.id.clone(), b.running_balance))
            .collect()
    }

    #[test]
    fn shop_a_running_balances_and_totals() {
        let txs = shop_a();
        let annotated = running_balances(&txs);
        let got: Vec<Decimal> = annotated.iter().map(|b| b.running_balance).collect();
        assert_eq!(got, vec![dec("100"), dec("70"), dec("120")]);

        let t = totals(&txs);
        assert_eq!(t.total_in, dec("150"));
        assert_eq!(t.total_out, dec("30"));
        assert_eq!(t.net, dec("120"));
    }

    #[test]
    fn display_order_does_not_change_balances() {
        let oldest_first = shop_a();
        let mut newest_first = shop_a();
        newest_first.reverse();

        let mut a = balances(&running_balances(&oldest_first));
        let b = balances(&running_balances(&newest_first));
        // caller order is preserved
        assert_eq!(b[0].0, "3");
        a.reverse();
        assert_eq!(a, b);
    }

    #[test]
    fn last_chronological_balance_equals_net() {
        let mut txs = shop_a();
        txs.push(tx("4", "2025-02-28", "23:00:00", Direction::CashOut, "12.75", ""));
        txs.swap(0, 3);
        let annotated = running_balances(&txs);
        let last = annotated
            .iter()
            .max_by(|x, y| {
                chronological_key(&x.transaction).cmp(&chronological_key(&y.transaction))
            })
            .unwrap();
        assert_eq!(last.running_balance, totals(&txs).net);
    }

    #[test]
    fn same_instant_ties_break_on_id() {
        let txs = vec![
            tx("b", "2025-03-01", "09:00:00", Direction::CashOut, "5", ""),
            tx("a", "2025-03-01", "09:00:00", Direction::CashIn, "20", ""),
        ];
        let annotated = running_balances(&txs);
        assert_eq!(annotated[1].running_balance, dec("20"));
        assert_eq!(annotated[0].running_balance, dec("15"));
    }

    #[test]
    fn search_keeps_unfiltered_balances() {
        let annotated = running_balances(&shop_a());
        let hits = search(&annotated, "RICKSHAW");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].transaction.id, "2");
        assert_eq!(hits[0].running_balance, dec("70"));

        assert_eq!(search(&annotated, "food").len(), 3);
        assert_eq!(search(&annotated, "50").len(), 1);
        assert_eq!(search(&annotated, "  ").len(), 3);
        assert!(search(&annotated, "salary").is_empty());
    }

    #[test]
    fn search_matches_two_place_amounts() {
        let mut stored = tx("1", "2025-03-01", "09:00:00", Direction::CashIn, "12.50", "");
        stored.amount = stored.amount.normalize();
        assert_eq!(stored.amount.to_string(), "12.5");
        let annotated = running_balances(&[stored]);
        assert_eq!(search(&annotated, "12.50").len(), 1);
        assert_eq!(search(&annotated, "12.5").len(), 1);
        assert!(search(&annotated, "12.55").is_empty());
    }

    #[test]
    fn date_filter_is_inclusive() {
        let annotated = running_balances(&shop_a());
        let d = |s| NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap();
        let hits = filter_by_date(&annotated, Some(d("2025-03-02")), Some(d("2025-03-03")));
        assert_eq!(balances(&hits), vec![("2".into(), dec("70")), ("3".into(), dec("120"))]);
        assert_eq!(filter_by_date(&annotated, None, None).len(), 3);
    }

    #[test]
    fn daily_summary_is_newest_first_with_closing_balance() {
        let mut txs = shop_a();
        txs.push(tx("4", "2025-03-03", "18:00:00", Direction::CashOut, "20", ""));
        let days = daily_summary(&txs);
        assert_eq!(days.len(), 3);
        assert_eq!(days[0].date.to_string(), "2025-03-03");
        assert_eq!(days[0].net, dec("30"));
        assert_eq!(days[0].closing_balance, dec("100"));
        assert_eq!(days[2].closing_balance, dec("100"));
    }

    #[test]
    fn empty_list_is_all_zero() {
        assert!(running_balances(&[]).is_empty());
        assert_eq!(totals(&[]), Totals::default());
    }
}
