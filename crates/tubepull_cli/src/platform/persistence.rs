use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use pull_logging::{pull_info, pull_warn};
use serde::{Deserialize, Serialize};
use tempfile::NamedTempFile;
use thiserror::Error;
use tubepull_core::{Container, MediaPreference};

const PREFS_FILENAME: &str = ".tubepull_prefs.ron";

#[derive(Debug, Error)]
pub enum PersistError {
    #[error("state directory missing or not writable: {0}")]
    StateDir(String),
    #[error("could not serialize preferences: {0}")]
    Serialize(String),
    #[error("io error: {0}")]
    Io(#[from] io::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct PersistedPreference {
    format: String,
    quality: String,
}

/// Last used preference, or the default when nothing usable is stored.
pub(crate) fn load_preference(state_dir: &Path) -> MediaPreference {
    let path = state_dir.join(PREFS_FILENAME);
    let content = match fs::read_to_string(&path) {
        Ok(text) => text,
        Err(err) if err.kind() == io::ErrorKind::NotFound => {
            return MediaPreference::default();
        }
        Err(err) => {
            pull_warn!("Failed to read preferences from {:?}: {}", path, err);
            return MediaPreference::default();
        }
    };

    let persisted: PersistedPreference = match ron::from_str(&content) {
        Ok(persisted) => persisted,
        Err(err) => {
            pull_warn!("Failed to parse preferences from {:?}: {}", path, err);
            return MediaPreference::default();
        }
    };

    let mut preference = MediaPreference::default();
    match persisted.format.parse::<Container>() {
        Ok(container) => preference.set_container(container),
        Err(err) => {
            pull_warn!("Ignoring stored preferences: {}", err);
            return preference;
        }
    }
    if !preference.set_quality(&persisted.quality) {
        pull_warn!(
            "Stored quality {} does not fit {}, using {}",
            persisted.quality,
            preference.container(),
            preference.quality()
        );
    }
    pull_info!("Loaded preferences from {:?}", path);
    preference
}

pub(crate) fn save_preference(
    state_dir: &Path,
    preference: &MediaPreference,
) -> Result<PathBuf, PersistError> {
    let persisted = PersistedPreference {
        format: preference.container().as_str().to_string(),
        quality: preference.quality().to_string(),
    };
    let content = ron::ser::to_string_pretty(&persisted, ron::ser::PrettyConfig::new())
        .map_err(|err| PersistError::Serialize(err.to_string()))?;
    write_atomically(state_dir, PREFS_FILENAME, &content)
}

fn ensure_state_dir(dir: &Path) -> Result<(), PersistError> {
    if dir.exists() {
        let meta = fs::metadata(dir).map_err(|e| PersistError::StateDir(e.to_string()))?;
        if !meta.is_dir() {
            return Err(PersistError::StateDir("path is not a directory".into()));
        }
    } else {
        fs::create_dir_all(dir).map_err(|e| PersistError::StateDir(e.to_string()))?;
    }
    Ok(())
}

/// Writes a temp file next to the target and renames it over the target.
fn write_atomically(dir: &Path, filename: &str, content: &str) -> Result<PathBuf, PersistError> {
    ensure_state_dir(dir)?;

    let target = dir.join(filename);
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(content.as_bytes())?;
    tmp.flush()?;
    tmp.as_file_mut().sync_all()?;
    tmp.persist(&target).map_err(|e| PersistError::Io(e.error))?;
    Ok(target)
}
