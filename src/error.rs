// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Error types for the cashbook data layer.
//!
//! Storage operations surface these to the caller and never retry. The CLI
//! wraps them in `anyhow` with context.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// Referenced book, business, category or transaction is absent
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Duplicate name: {0}")]
    DuplicateName(String),

    /// Mutation of the reserved "Others" category
    #[error("Protected entity: {0}")]
    ProtectedEntity(String),

    /// A seeded row the layer depends on is missing
    #[error("Invariant violation: {0}")]
    InvariantViolation(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Storage error: {0}")]
    StorageIo(String),

    #[error("Invalid archive: {0}")]
    InvalidArchive(String),

    /// A staged multi-file commit failed and its rollback failed too.
    #[error("Partial write: {failed} failed ({reason}); left modified: {written:?}")]
    PartialWrite {
        written: Vec<String>,
        failed: String,
        reason: String,
    },
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::StorageIo(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::StorageIo(format!("JSON: {}", err))
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::StorageIo(format!("SQLite: {}", err))
    }
}

impl From<zip::result::ZipError> for Error {
    fn from(err: zip::result::ZipError) -> Self {
        Error::StorageIo(format!("Zip: {}", err))
    }
}
