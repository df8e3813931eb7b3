// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Staged multi-file writes for the flat-file store.
//!
//! A [`Commit`] collects every file a logical operation touches, snapshots
//! their current bytes, then applies the writes in order. If one write fails
//! the files already written are restored from their snapshots, so callers
//! see either the whole operation or none of it. Only when a restore also
//! fails does the caller get [`Error::PartialWrite`].

use crate::error::{Error, Result};
use serde::Serialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

enum Op {
    Write(Vec<u8>),
    Remove,
}

pub struct Commit {
    dir: PathBuf,
    staged: Vec<(String, Op)>,
}

impl Commit {
    pub fn new(dir: &Path) -> Commit {
        Commit {
            dir: dir.to_path_buf(),
            staged: Vec::new(),
        }
    }

    /// Serializes now, so an encoding error aborts before any file is touched.
    /// Staging the same file twice keeps the last value.
    pub fn write_json<T: Serialize + ?Sized>(&mut self, file: &str, value: &T) -> Result<()> {
        let bytes = serde_json::to_vec_pretty(value)?;
        self.stage(file, Op::Write(bytes));
        Ok(())
    }

    pub fn write_bytes(&mut self, file: &str, bytes: Vec<u8>) {
        self.stage(file, Op::Write(bytes));
    }

    pub fn remove(&mut self, file: &str) {
        self.stage(file, Op::Remove);
    }

    fn stage(&mut self, file: &str, op: Op) {
        self.staged.retain(|(name, _)| name != file);
        self.staged.push((file.to_string(), op));
    }

    /// Applies every staged change and returns the touched file names.
    pub fn apply(self) -> Result<Vec<String>> {
        let mut snapshots = Vec::with_capacity(self.staged.len());
        for (name, _) in &self.staged {
            snapshots.push(read_optional(&self.dir.join(name))?);
        }

        for (i, (name, op)) in self.staged.iter().enumerate() {
            let path = self.dir.join(name);
            let outcome = match op {
                Op::Write(bytes) => write_atomic(&path, bytes),
                Op::Remove => remove_if_exists(&path),
            };
            if let Err(err) = outcome {
                warn!(file = %name, error = %err, "commit failed, rolling back");
                return Err(self.roll_back(i, &snapshots, name, err));
            }
        }

        let names: Vec<String> = self.staged.into_iter().map(|(name, _)| name).collect();
        debug!(files = ?names, "commit applied");
        Ok(names)
    }

    fn roll_back(
        &self,
        applied: usize,
        snapshots: &[Option<Vec<u8>>],
        failed: &str,
        cause: io::Error,
    ) -> Error {
        let mut stuck = Vec::new();
        for j in (0..applied).rev() {
            let (name, _) = &self.staged[j];
            let path = self.dir.join(name);
            let restored = match &snapshots[j] {
                Some(bytes) => write_atomic(&path, bytes),
                None => remove_if_exists(&path),
            };
            if let Err(err) = restored {
                warn!(file = %name, error = %err, "rollback could not restore file");
                stuck.push(name.clone());
            }
        }
        if stuck.is_empty() {
            Error::StorageIo(format!("Write {} failed: {}", failed, cause))
        } else {
            Error::PartialWrite {
                written: stuck,
                failed: failed.to_string(),
                reason: cause.to_string(),
            }
        }
    }
}

fn read_optional(path: &Path) -> Result<Option<Vec<u8>>> {
    match fs::read(path) {
        Ok(bytes) => Ok(Some(bytes)),
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(err) => Err(Error::StorageIo(format!(
            "Read {}: {}",
            path.display(),
            err
        ))),
    }
}

fn remove_if_exists(path: &Path) -> io::Result<()> {
    match fs::remove_file(path) {
        Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
        other => other,
    }
}

/// Writes `bytes` to a temp sibling and renames it over `path`.
pub fn write_atomic(path: &Path, bytes: &[u8]) -> io::Result<()> {
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();
    let temp = path.with_file_name(format!(".{}.tmp", file_name));
    fs::write(&temp, bytes)?;
    rename_with_fallback(&temp, path)
}

/// Some platforms refuse to rename over an existing file; remove it and retry.
/// The temp file is cleaned up if the retry fails too.
fn rename_with_fallback(temp_path: &Path, destination: &Path) -> io::Result<()> {
    if let Err(initial_err) = fs::rename(temp_path, destination) {
        let _ = fs::remove_file(destination);
        fs::rename(temp_path, destination).map_err(|retry_err| {
            let _ = fs::remove_file(temp_path);
            io::Error::new(
                retry_err.kind(),
                format!(
                    "rename failed (initial: {}, retry: {})",
                    initial_err, retry_err
                ),
            )
        })?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn applies_all_writes_and_removals() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("old.json"), "[]").unwrap();

        let mut c = Commit::new(dir.path());
        c.write_json("a.json", &vec![1, 2]).unwrap();
        c.remove("old.json");
        let touched = c.apply().unwrap();

        assert_eq!(touched, vec!["a.json".to_string(), "old.json".to_string()]);
        let a: Vec<i32> =
            serde_json::from_slice(&fs::read(dir.path().join("a.json")).unwrap()).unwrap();
        assert_eq!(a, vec![1, 2]);
        assert!(!dir.path().join("old.json").exists());
        assert!(!dir.path().join(".a.json.tmp").exists());
    }

    #[test]
    fn failed_write_restores_earlier_files() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("books.json"), "original").unwrap();
        // occupy the temp path so the third write cannot start
        fs::create_dir(dir.path().join(".blocked.json.tmp")).unwrap();

        let mut c = Commit::new(dir.path());
        c.write_json("books.json", &vec!["changed"]).unwrap();
        c.write_json("fresh.json", &vec!["new"]).unwrap();
        c.write_json("blocked.json", &vec!["never"]).unwrap();
        let err = c.apply().unwrap_err();

        assert!(matches!(err, Error::StorageIo(_)));
        assert_eq!(
            fs::read_to_string(dir.path().join("books.json")).unwrap(),
            "original"
        );
        assert!(!dir.path().join("fresh.json").exists());
        assert!(!dir.path().join("blocked.json").exists());
    }

    #[test]
    fn restaging_a_file_keeps_the_last_value() {
        let dir = tempdir().unwrap();
        let mut c = Commit::new(dir.path());
        c.write_json("x.json", &1).unwrap();
        c.write_json("x.json", &2).unwrap();
        assert_eq!(c.apply().unwrap().len(), 1);
        assert_eq!(fs::read_to_string(dir.path().join("x.json")).unwrap(), "2");
    }
}
