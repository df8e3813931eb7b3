// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

pub mod backup;
pub mod books;
pub mod business;
pub mod categories;
pub mod exporter;
pub mod pin;
pub mod profile;
pub mod reports;
pub mod transactions;

use crate::config::Config;
use crate::error::Error;
use crate::models::{Category, OTHERS_CATEGORY};
use crate::store::{FileStore, Repository};
use anyhow::{Context, Result};
use clap::ArgMatches;

pub(crate) fn arg<'a>(m: &'a ArgMatches, name: &str) -> Result<&'a str> {
    opt_arg(m, name).with_context(|| format!("--{} is required", name))
}

pub(crate) fn opt_arg<'a>(m: &'a ArgMatches, name: &str) -> Option<&'a str> {
    m.get_one::<String>(name).map(String::as_str)
}

pub(crate) fn file_store(repo: &mut dyn Repository) -> Result<&mut FileStore> {
    repo.as_files()
        .context("Businesses and the profile are only kept by the files backend")
}

/// Looks a category up by id, then by case-insensitive name. Blank means "Others".
pub(crate) fn resolve_category(repo: &dyn Repository, key: Option<&str>) -> Result<Category> {
    let key = key
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .unwrap_or(OTHERS_CATEGORY);
    let categories = repo.list_categories()?;
    let found = categories
        .iter()
        .find(|c| c.id == key)
        .or_else(|| categories.iter().find(|c| c.name.eq_ignore_ascii_case(key)))
        .cloned();
    Ok(found.ok_or_else(|| Error::NotFound(format!("Category '{}'", key)))?)
}

pub fn init(config: &Config, repo: &dyn Repository) -> Result<()> {
    let books = repo.list_books(None)?;
    let categories = repo.list_categories()?;
    println!(
        "Data initialized at {} ({:?} backend, {} books, {} categories)",
        config.data_dir.display(),
        config.backend,
        books.len(),
        categories.len()
    );
    Ok(())
}
