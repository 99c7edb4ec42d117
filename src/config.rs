//! # Configuration Module
//!
//! Locates the catalog database. Soundsig keeps a single SQLite file in the
//! platform-standard data directory:
//! - Linux: `~/.local/share/soundsig/catalog.db`
//! - macOS: `~/Library/Application Support/soundsig/catalog.db`
//! - Windows: `%APPDATA%\soundsig\catalog.db`
//!
//! The location can be overridden per invocation with `--db` or the
//! `SOUNDSIG_DB` environment variable. Preferences such as the filter mode
//! live inside the catalog itself.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

const APP_DIR: &str = "soundsig";
const DB_FILE: &str = "catalog.db";

/// Returns the soundsig data directory, creating it if needed.
///
/// # Errors
///
/// Fails if the platform has no data directory or the `soundsig`
/// subdirectory cannot be created.
pub fn get_data_dir() -> Result<PathBuf> {
    let data_dir = dirs::data_dir().ok_or_else(|| {
        anyhow::anyhow!(
            "Could not determine system data directory. Please ensure your platform supports standard data directories."
        )
    })?;

    let app_dir = data_dir.join(APP_DIR);
    fs::create_dir_all(&app_dir).with_context(|| {
        format!("Failed to create soundsig data directory at {}. Please check file permissions.", app_dir.display())
    })?;

    Ok(app_dir)
}

/// Returns the default catalog path inside [`get_data_dir`].
///
/// ```no_run
/// use soundsig::config::get_db_path;
///
/// let db_path = get_db_path()?;
/// println!("Catalog location: {}", db_path.display());
/// # Ok::<(), anyhow::Error>(())
/// ```
pub fn get_db_path() -> Result<PathBuf> {
    Ok(get_data_dir()?.join(DB_FILE))
}

/// Configuration for runtime behavior
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Path to the catalog database
    pub db_path: PathBuf,
}

impl RuntimeConfig {
    /// Default location, or `db_path` when one was given on the command line.
    pub fn resolve(db_path: Option<PathBuf>) -> Result<Self> {
        match db_path {
            Some(path) => Self::with_db_path(path),
            None => Ok(Self { db_path: get_db_path()? }),
        }
    }

    /// Use an explicit database path. Its parent directory is created.
    pub fn with_db_path(db_path: PathBuf) -> Result<Self> {
        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            ensure_dir(parent)?;
        }
        Ok(Self { db_path })
    }
}

fn ensure_dir(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir).with_context(|| format!("Failed to create directory {}", dir.display()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_db_path_structure() {
        let path = get_db_path().expect("Should get valid path");
        assert_eq!(path.file_name().unwrap(), DB_FILE);
        assert_eq!(path.parent().unwrap().file_name().unwrap(), APP_DIR);
        assert!(path.is_absolute(), "Database path should be absolute");
    }

    #[test]
    fn test_explicit_path_creates_parent() {
        let dir = tempfile::tempdir().unwrap();
        let db_path = dir.path().join("nested/deeper/catalog.db");
        let config = RuntimeConfig::resolve(Some(db_path.clone())).unwrap();
        assert_eq!(config.db_path, db_path);
        assert!(db_path.parent().unwrap().is_dir());
    }

    #[test]
    fn test_bare_file_name_is_accepted() {
        let config = RuntimeConfig::with_db_path(PathBuf::from("catalog.db")).unwrap();
        assert_eq!(config.db_path, PathBuf::from("catalog.db"));
    }
}
