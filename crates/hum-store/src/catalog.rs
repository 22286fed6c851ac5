//! Catalog of feature files loaded from a directory

use crate::format::{FeatureFile, FileFormat};
use crate::reader::FeatureReader;
use anyhow::Result;
use hum_core::FeatureBundle;
use rayon::prelude::*;
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// One catalog entry
#[derive(Debug, Clone)]
pub struct CatalogEntry {
    /// Identifier used in rankings
    pub id: String,
    pub path: PathBuf,
    pub file: FeatureFile,
}

/// Ordered collection of feature files
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    entries: Vec<CatalogEntry>,
}

impl Catalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load every `.json` / `.bin` feature file in `dir`.
    ///
    /// Files are read in parallel; unreadable files are skipped with a
    /// warning. Entries are ordered by file name.
    pub fn load_dir(dir: &Path) -> Result<Self> {
        if !dir.is_dir() {
            anyhow::bail!("Catalog directory not found: {}", dir.display());
        }

        let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.is_file() && FileFormat::from_path(path).is_some())
            .collect();
        paths.sort();

        log::info!("Found {} feature files, loading in parallel...", paths.len());

        let load_start = std::time::Instant::now();
        let mut entries: Vec<CatalogEntry> = paths
            .par_iter()
            .filter_map(|path| match FeatureReader::read(path) {
                Ok(file) => Some(CatalogEntry {
                    id: entry_id(path, &file),
                    path: path.clone(),
                    file,
                }),
                Err(e) => {
                    log::warn!("Failed to load {}: {:#}", path.display(), e);
                    None
                }
            })
            .collect();

        let mut seen = HashSet::new();
        for entry in &mut entries {
            if !seen.insert(entry.id.clone()) {
                entry.id = disambiguate(&entry.id, &entry.path, |id| seen.contains(id));
                seen.insert(entry.id.clone());
            }
        }

        log::info!(
            "Loaded {} of {} files in {:.2}s",
            entries.len(),
            paths.len(),
            load_start.elapsed().as_secs_f64()
        );

        Ok(Self { entries })
    }

    pub fn push(&mut self, path: PathBuf, file: FeatureFile) {
        let mut id = entry_id(&path, &file);
        if self.get(&id).is_some() {
            id = disambiguate(&id, &path, |id| self.get(id).is_some());
        }
        self.entries.push(CatalogEntry { id, path, file });
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn get(&self, id: &str) -> Option<&CatalogEntry> {
        self.entries.iter().find(|e| e.id == id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// `(id, features)` pairs in catalog order, as the matcher expects
    pub fn candidates(&self) -> Vec<(String, FeatureBundle)> {
        self.entries
            .iter()
            .map(|e| (e.id.clone(), e.file.features.clone()))
            .collect()
    }
}

/// Song id from the metadata, or the file stem when the id is blank
fn entry_id(path: &Path, file: &FeatureFile) -> String {
    let id = file.metadata.song_id.trim();
    if !id.is_empty() {
        return id.to_string();
    }
    file_stem(path)
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default()
        .to_string()
}

/// Replacement id for a file whose song id is already taken: the file
/// stem, or the full path if the stem is taken too
fn disambiguate(id: &str, path: &Path, taken: impl Fn(&str) -> bool) -> String {
    let stem = file_stem(path);
    let replacement = if stem.is_empty() || taken(&stem) {
        path.display().to_string()
    } else {
        stem
    };
    log::warn!(
        "Duplicate song id {:?} in {}; ranking it as {:?}",
        id,
        path.display(),
        replacement
    );
    replacement
}
