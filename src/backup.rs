// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Zip backups of the flat-file store.
//!
//! An archive holds verbatim copies of the data files plus a
//! `backup_signature.json` entry. Validation only looks at the signature;
//! whether to restore an archive that fails validation is up to the caller.

use crate::error::{Error, Result};
use crate::models::Book;
use crate::store::commit::Commit;
use crate::store::files::{book_file, BOOKS_FILE, BUSINESS_FILE, CATEGORIES_FILE, SETTINGS_FILE};
use crate::utils::{format_stamp, now_stamp};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{self, Read, Seek, Write};
use std::path::Path;
use tracing::{info, warn};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

pub const SIGNATURE_FILE: &str = "backup_signature.json";
pub const SIGNATURE_MAGIC: &str = "CASHBOOK_APP_BD_v1";
pub const APP_NAME: &str = "CashBook BD";

const BASE_FILES: [&str; 4] = [BUSINESS_FILE, BOOKS_FILE, CATEGORIES_FILE, SETTINGS_FILE];

static BOOK_FILE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^book_[A-Za-z0-9-]+\.json$").expect("static regex"));

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Signature {
    pub signature: String,
    pub app_name: String,
    pub backup_date: String,
    pub version: String,
}

impl Signature {
    fn current() -> Signature {
        Signature {
            signature: SIGNATURE_MAGIC.to_string(),
            app_name: APP_NAME.to_string(),
            backup_date: format_stamp(&now_stamp()),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BackupSummary {
    pub files: Vec<String>,
    /// Present but unreadable.
    pub skipped: Vec<String>,
    pub signature: Option<Signature>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RestoreSummary {
    pub restored: Vec<String>,
    /// Entries whose names are not data files.
    pub skipped: Vec<String>,
}

/// Whether `name` is a file the flat-file store owns.
pub fn is_data_file(name: &str) -> bool {
    BASE_FILES.contains(&name) || BOOK_FILE_RE.is_match(name)
}

/// The four base files plus one transaction file per book listed in books.json.
fn data_files(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = BASE_FILES.iter().map(|s| s.to_string()).collect();
    match fs::read_to_string(dir.join(BOOKS_FILE)) {
        Ok(text) => match serde_json::from_str::<Vec<Book>>(&text) {
            Ok(books) => names.extend(books.iter().map(|b| book_file(&b.id))),
            Err(err) => warn!(error = %err, "books.json unparseable, book files not included"),
        },
        Err(err) if err.kind() == io::ErrorKind::NotFound => {}
        Err(err) => warn!(error = %err, "books.json unreadable, book files not included"),
    }
    names
}

fn entry_options() -> SimpleFileOptions {
    SimpleFileOptions::default().compression_method(CompressionMethod::Deflated)
}

/// Writes every readable data file under `dir` plus the signature into `writer`.
pub fn create_backup<W: Write + Seek>(dir: &Path, writer: W) -> Result<BackupSummary> {
    let mut zip = ZipWriter::new(writer);
    let mut summary = BackupSummary::default();

    for name in data_files(dir) {
        let text = match fs::read_to_string(dir.join(&name)) {
            Ok(text) => text,
            Err(err) if err.kind() == io::ErrorKind::NotFound => continue,
            Err(err) => {
                warn!(file = %name, error = %err, "skipping unreadable file");
                summary.skipped.push(name);
                continue;
            }
        };
        zip.start_file(name.as_str(), entry_options())?;
        zip.write_all(text.as_bytes())?;
        summary.files.push(name);
    }

    if summary.files.is_empty() {
        return Err(Error::StorageIo(format!(
            "No data files could be read from {}",
            dir.display()
        )));
    }

    let signature = Signature::current();
    zip.start_file(SIGNATURE_FILE, entry_options())?;
    zip.write_all(&serde_json::to_vec_pretty(&signature)?)?;
    zip.finish()?;

    info!(files = summary.files.len(), skipped = summary.skipped.len(), "backup written");
    summary.signature = Some(signature);
    Ok(summary)
}

/// Like [`create_backup`], removing the half-written archive on failure.
pub fn create_backup_file(dir: &Path, out: &Path) -> Result<BackupSummary> {
    let file = File::create(out)
        .map_err(|e| Error::StorageIo(format!("Create {}: {}", out.display(), e)))?;
    let result = create_backup(dir, file);
    if result.is_err() {
        let _ = fs::remove_file(out);
    }
    result
}

fn open_archive<R: Read + Seek>(reader: R) -> Result<ZipArchive<R>> {
    ZipArchive::new(reader).map_err(|e| Error::InvalidArchive(format!("Not a zip archive: {}", e)))
}

fn read_signature<R: Read + Seek>(archive: &mut ZipArchive<R>) -> Result<Signature> {
    let mut entry = match archive.by_name(SIGNATURE_FILE) {
        Ok(entry) => entry,
        Err(zip::result::ZipError::FileNotFound) => {
            return Err(Error::InvalidArchive(format!("{} is missing", SIGNATURE_FILE)));
        }
        Err(err) => return Err(err.into()),
    };
    let mut text = String::new();
    entry.read_to_string(&mut text)?;
    let sig: Signature = serde_json::from_str(&text)
        .map_err(|e| Error::InvalidArchive(format!("Unreadable signature: {}", e)))?;
    if sig.signature != SIGNATURE_MAGIC {
        return Err(Error::InvalidArchive(format!(
            "Signature '{}' does not match {}",
            sig.signature, SIGNATURE_MAGIC
        )));
    }
    Ok(sig)
}

pub fn validate_backup<R: Read + Seek>(reader: R) -> Result<Signature> {
    let mut archive = open_archive(reader)?;
    read_signature(&mut archive)
}

pub fn validate_backup_file(path: &Path) -> Result<Signature> {
    let file = File::open(path)
        .map_err(|e| Error::StorageIo(format!("Open {}: {}", path.display(), e)))?;
    validate_backup(file)
}

/// Overwrites every data file present in the archive. Files the archive does
/// not contain are left untouched. Does not check the signature.
pub fn restore_backup<R: Read + Seek>(reader: R, dir: &Path) -> Result<RestoreSummary> {
    let mut archive = open_archive(reader)?;
    let mut summary = RestoreSummary::default();
    let mut commit = Commit::new(dir);

    for i in 0..archive.len() {
        let mut entry = archive.by_index(i)?;
        let name = entry.name().to_string();
        if name == SIGNATURE_FILE {
            continue;
        }
        if !is_data_file(&name) {
            warn!(entry = %name, "skipping archive entry that is not a data file");
            summary.skipped.push(name);
            continue;
        }
        let mut bytes = Vec::new();
        entry.read_to_end(&mut bytes)?;
        commit.write_bytes(&name, bytes);
        summary.restored.push(name);
    }

    fs::create_dir_all(dir)?;
    commit.apply()?;
    info!(files = summary.restored.len(), "backup restored");
    Ok(summary)
}

pub fn restore_backup_file(path: &Path, dir: &Path) -> Result<RestoreSummary> {
    let file = File::open(path)
        .map_err(|e| Error::StorageIo(format!("Open {}: {}", path.display(), e)))?;
    restore_backup(file, dir)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data_file_names_are_whitelisted() {
        assert!(is_data_file("books.json"));
        assert!(is_data_file("book_3f2c9a1e-0000-4000-8000-000000000001.json"));
        assert!(is_data_file("book_12.json"));
        assert!(!is_data_file("../books.json"));
        assert!(!is_data_file("book_../../etc.json"));
        assert!(!is_data_file("notes.txt"));
        assert!(!is_data_file(SIGNATURE_FILE));
    }
}
