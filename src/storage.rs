//! Persistence of the caught collection
//!
//! Stores the user's Pokedex as pretty-printed JSON. Writes go to a temporary
//! sibling file which is then renamed over the target, so a crash mid-write
//! never leaves a truncated save. A save file that fails to parse is copied
//! aside to `<path>.backup` and the collection starts empty.

use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use directories::BaseDirs;
use thiserror::Error;
use tracing::warn;

use crate::data::CaughtPokemon;

/// File name used for the save file when no path is given
pub const DEFAULT_SAVE_FILE_NAME: &str = ".pokedex.json";

/// The user's collection, keyed by creature name
pub type Pokedex = BTreeMap<String, CaughtPokemon>;

/// Errors that can occur when loading or saving the Pokedex
#[derive(Debug, Error)]
pub enum StorageError {
    /// Reading the save file failed
    #[error("Failed to read Pokedex file {path}: {source}")]
    Read { path: PathBuf, source: io::Error },

    /// Writing the save file failed
    #[error("Failed to save Pokedex file {path}: {source}")]
    Write { path: PathBuf, source: io::Error },

    /// The collection could not be serialized
    #[error("Failed to serialize Pokedex: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Reads and writes the Pokedex save file
#[derive(Debug, Clone)]
pub struct PokedexStore {
    path: PathBuf,
}

impl PokedexStore {
    /// Creates a store for the save file at `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Default save location, `~/.pokedex.json`
    ///
    /// Falls back to `.pokedex.json` in the working directory if the home
    /// directory cannot be determined.
    pub fn default_path() -> PathBuf {
        match BaseDirs::new() {
            Some(dirs) => dirs.home_dir().join(DEFAULT_SAVE_FILE_NAME),
            None => PathBuf::from(DEFAULT_SAVE_FILE_NAME),
        }
    }

    /// Path of the save file
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn sibling(&self, suffix: &str) -> PathBuf {
        let mut name = self.path.clone().into_os_string();
        name.push(suffix);
        PathBuf::from(name)
    }

    /// Loads the collection
    ///
    /// # Returns
    /// * `Ok(Pokedex)` - The saved collection; empty if the file is missing,
    ///   empty, or corrupt (corrupt files are first copied to `<path>.backup`)
    /// * `Err(StorageError::Read)` - If the file exists but cannot be read
    pub fn load(&self) -> Result<Pokedex, StorageError> {
        let data = match fs::read(&self.path) {
            Ok(data) => data,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Pokedex::new()),
            Err(source) => {
                return Err(StorageError::Read {
                    path: self.path.clone(),
                    source,
                })
            }
        };

        if data.iter().all(u8::is_ascii_whitespace) {
            return Ok(Pokedex::new());
        }

        match serde_json::from_slice::<Pokedex>(&data) {
            Ok(pokedex) => Ok(pokedex),
            Err(e) => {
                let backup = self.sibling(".backup");
                match fs::write(&backup, &data) {
                    Ok(()) => warn!(
                        error = %e,
                        backup = %backup.display(),
                        "Pokedex file was corrupted, backed up and starting fresh"
                    ),
                    Err(backup_err) => warn!(
                        error = %e,
                        backup_error = %backup_err,
                        "Pokedex file was corrupted and could not be backed up, starting fresh"
                    ),
                }
                Ok(Pokedex::new())
            }
        }
    }

    /// Saves the collection, replacing the previous save atomically
    pub fn save(&self, pokedex: &Pokedex) -> Result<(), StorageError> {
        let json = serde_json::to_string_pretty(pokedex)?;
        let write_err = |source: io::Error| StorageError::Write {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(write_err)?;
        }

        let temp_path = self.sibling(".tmp");
        fs::write(&temp_path, json).map_err(write_err)?;

        if let Err(e) = fs::rename(&temp_path, &self.path) {
            let _ = fs::remove_file(&temp_path);
            return Err(write_err(e));
        }

        Ok(())
    }
}
