// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::error::{Error, Result};
use directories::ProjectDirs;
use once_cell::sync::Lazy;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

static APP: Lazy<(&str, &str, &str)> = Lazy::new(|| ("bd.cashbook", "CashBook", "cashbook"));

pub const DB_FILE: &str = "cashbook.sqlite";
pub const ENV_DATA_DIR: &str = "CASHBOOK_DATA_DIR";
pub const ENV_BACKEND: &str = "CASHBOOK_BACKEND";
pub const ENV_LOG: &str = "CASHBOOK_LOG";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Backend {
    #[default]
    Files,
    Sqlite,
}

impl FromStr for Backend {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_lowercase().as_str() {
            "files" | "file" | "json" => Ok(Backend::Files),
            "sqlite" | "db" => Ok(Backend::Sqlite),
            other => Err(Error::Validation(format!(
                "Unknown backend '{}' (use files|sqlite)",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub data_dir: PathBuf,
    pub backend: Backend,
}

impl Config {
    /// `data_dir` and `backend` come from flags or their env fallbacks; unset
    /// values resolve to the platform data dir and the flat-file backend.
    pub fn resolve(data_dir: Option<&str>, backend: Option<&str>) -> Result<Config> {
        let data_dir = match data_dir.map(str::trim).filter(|s| !s.is_empty()) {
            Some(dir) => PathBuf::from(dir),
            None => default_data_dir()?,
        };
        let backend = match backend {
            Some(b) => b.parse()?,
            None => Backend::default(),
        };
        Ok(Config { data_dir, backend })
    }

    pub fn for_dir(dir: &Path, backend: Backend) -> Config {
        Config {
            data_dir: dir.to_path_buf(),
            backend,
        }
    }

    pub fn ensure_data_dir(&self) -> Result<&Path> {
        fs::create_dir_all(&self.data_dir).map_err(|e| {
            Error::StorageIo(format!(
                "Failed to create data dir {}: {}",
                self.data_dir.display(),
                e
            ))
        })?;
        Ok(&self.data_dir)
    }

    pub fn db_path(&self) -> PathBuf {
        self.data_dir.join(DB_FILE)
    }
}

fn default_data_dir() -> Result<PathBuf> {
    let proj = ProjectDirs::from(APP.0, APP.1, APP.2).ok_or_else(|| {
        Error::StorageIo("Could not determine platform-specific data dir".into())
    })?;
    Ok(proj.data_dir().to_path_buf())
}
