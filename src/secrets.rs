// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::error::Result;
use rusqlite::{params, Connection, OptionalExtension};

pub const APP_PIN: &str = "appPin";
pub const SECURITY_QUESTION: &str = "securityQuestion";
pub const SECURITY_ANSWER: &str = "securityAnswer";
pub const IS_FIRST: &str = "isFirst";

/// Key/value store for onboarding state, kept in the `secrets` table.
pub struct SecretStore<'c> {
    conn: &'c Connection,
}

impl<'c> SecretStore<'c> {
    pub fn new(conn: &'c Connection) -> SecretStore<'c> {
        SecretStore { conn }
    }

    pub fn get(&self, key: &str) -> Result<Option<String>> {
        let v = self
            .conn
            .query_row(
                "SELECT value FROM secrets WHERE key=?1",
                params![key],
                |r| r.get(0),
            )
            .optional()?;
        Ok(v)
    }

    pub fn set(&self, key: &str, value: &str) -> Result<()> {
        self.conn.execute(
            "INSERT INTO secrets(key, value) VALUES(?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value=excluded.value",
            params![key, value],
        )?;
        Ok(())
    }

    pub fn remove(&self, key: &str) -> Result<()> {
        self.conn
            .execute("DELETE FROM secrets WHERE key=?1", params![key])?;
        Ok(())
    }

    /// True until onboarding has been completed once.
    pub fn is_first_run(&self) -> Result<bool> {
        Ok(self.get(IS_FIRST)?.as_deref() != Some("false"))
    }

    pub fn mark_onboarded(&self) -> Result<()> {
        self.set(IS_FIRST, "false")
    }

    /// False when no PIN has been set.
    pub fn verify_pin(&self, candidate: &str) -> Result<bool> {
        Ok(self.get(APP_PIN)?.is_some_and(|pin| pin == candidate))
    }

    /// Case-insensitive, whitespace-trimmed comparison against the stored answer.
    pub fn verify_security_answer(&self, candidate: &str) -> Result<bool> {
        Ok(self
            .get(SECURITY_ANSWER)?
            .is_some_and(|a| a.trim().eq_ignore_ascii_case(candidate.trim())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;

    #[test]
    fn onboarding_flow() {
        let conn = db::open_in_memory().unwrap();
        let s = SecretStore::new(&conn);
        assert!(s.is_first_run().unwrap());
        assert!(!s.verify_pin("1234").unwrap());

        s.set(APP_PIN, "1234").unwrap();
        s.set(SECURITY_QUESTION, "First school?").unwrap();
        s.set(SECURITY_ANSWER, "Udayan").unwrap();
        s.mark_onboarded().unwrap();

        assert!(!s.is_first_run().unwrap());
        assert!(s.verify_pin("1234").unwrap());
        assert!(!s.verify_pin("0000").unwrap());
        assert!(s.verify_security_answer(" udayan ").unwrap());

        s.set(APP_PIN, "9999").unwrap();
        assert!(s.verify_pin("9999").unwrap());
        s.remove(APP_PIN).unwrap();
        assert_eq!(s.get(APP_PIN).unwrap(), None);
    }
}
