//! Flat, file-backed list of favorite cities.
//!
//! The whole list is rewritten on every change.

use anyhow::{Context, Result};
use std::{
    fs,
    path::{Path, PathBuf},
};

use crate::{Config, model::FavoriteEntry};

const FAVORITES_FILE: &str = "favorites.json";

#[derive(Debug)]
pub struct FavoritesStore {
    path: PathBuf,
    entries: Vec<FavoriteEntry>,
}

impl FavoritesStore {
    /// Open the store at the default location in the platform data directory.
    pub fn open_default() -> Result<Self> {
        Self::open(Config::data_dir()?.join(FAVORITES_FILE))
    }

    /// Open a store backed by `path`. A missing file is an empty list.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let entries = if path.exists() {
            let contents = fs::read_to_string(&path)
                .with_context(|| format!("Failed to read favorites file: {}", path.display()))?;
            serde_json::from_str(&contents)
                .with_context(|| format!("Failed to parse favorites file: {}", path.display()))?
        } else {
            Vec::new()
        };

        Ok(Self { path, entries })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn entries(&self) -> &[FavoriteEntry] {
        &self.entries
    }

    pub fn contains(&self, city: &str) -> bool {
        let city = city.trim();
        self.entries.iter().any(|e| e.city == city)
    }

    /// Add a favorite. A city already in the list is updated in place.
    /// City names are stored trimmed.
    pub fn add(&mut self, mut entry: FavoriteEntry) -> Result<()> {
        entry.city = entry.city.trim().to_string();
        match self.entries.iter_mut().find(|e| e.city == entry.city) {
            Some(existing) => *existing = entry,
            None => {
                tracing::info!("Adding favorite '{}'", entry.city);
                self.entries.push(entry);
            }
        }
        self.save()
    }

    /// Remove every entry named `city`. Returns whether anything was removed.
    pub fn remove(&mut self, city: &str) -> Result<bool> {
        let city = city.trim();
        let before = self.entries.len();
        self.entries.retain(|e| e.city != city);
        if self.entries.len() == before {
            return Ok(false);
        }

        tracing::info!("Removed favorite '{city}'");
        self.save()?;
        Ok(true)
    }

    /// Add `entry` if its city is absent, otherwise remove it.
    /// Returns whether the city is a favorite afterwards.
    pub fn toggle(&mut self, entry: FavoriteEntry) -> Result<bool> {
        if self.contains(&entry.city) {
            let city = entry.city;
            self.remove(&city)?;
            Ok(false)
        } else {
            self.add(entry)?;
            Ok(true)
        }
    }

    fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create favorites directory: {}", parent.display())
            })?;
        }

        let json = serde_json::to_string_pretty(&self.entries)
            .context("Failed to serialize favorites")?;

        fs::write(&self.path, json)
            .with_context(|| format!("Failed to write favorites file: {}", self.path.display()))
    }
}
