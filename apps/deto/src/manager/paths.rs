//! Path management for the deto version manager.
//!
//! The default root directory is `~/.deto/`, which can be overridden by
//! setting the `DETO_HOME` environment variable.
//!
//! ## Directory Structure
//!
//! ```text
//! ~/.deto/                    # Root directory (or DETO_HOME)
//!   config.json               # Manifest of installed candidates
//!   config.json.lock          # Advisory lock guarding manifest updates
//!   downloads/                # Artifacts while they are being installed
//!   java/                     # One directory per candidate
//!     17.0.1/                 # Unpacked artifact for one version
//!     21.0.2/
//!   go/
//!     1.22.0/
//! ```

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Environment variable to override the default root directory.
pub const DETO_HOME_ENV: &str = "DETO_HOME";

/// Name of the root directory inside the user's home.
const DEFAULT_LOCATION: &str = ".deto";

/// Manifest file name inside the root directory.
const MANIFEST_FILE: &str = "config.json";

/// Manages paths for candidate installations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DetoPaths {
    /// Root directory for all deto data (`~/.deto` or `DETO_HOME`).
    pub root: PathBuf,
    /// Directory for in-flight artifact downloads.
    pub downloads: PathBuf,
}

impl DetoPaths {
    /// Creates a new `DetoPaths` instance.
    ///
    /// The root directory is determined by:
    /// 1. The `DETO_HOME` environment variable if set
    /// 2. `~/.deto` in the user's home directory
    ///
    /// # Errors
    ///
    /// Returns an error if the home directory cannot be determined.
    pub fn new() -> Result<Self> {
        let root = if let Ok(home) = std::env::var(DETO_HOME_ENV) {
            PathBuf::from(home)
        } else {
            dirs::home_dir()
                .context("Cannot determine home directory. Set DETO_HOME environment variable.")?
                .join(DEFAULT_LOCATION)
        };

        Ok(Self::with_root(root))
    }

    /// Creates a new `DetoPaths` instance with a specific root directory.
    #[must_use = "returns new paths instance without side effects"]
    pub fn with_root(root: PathBuf) -> Self {
        Self {
            downloads: root.join("downloads"),
            root,
        }
    }

    /// Returns the manifest file location.
    #[must_use = "returns the path without side effects"]
    pub fn manifest_file(&self) -> PathBuf {
        self.root.join(MANIFEST_FILE)
    }

    /// Returns the directory holding every installed version of a candidate.
    #[must_use = "returns the path without side effects"]
    pub fn candidate_dir(&self, candidate: &str) -> PathBuf {
        self.root.join(candidate)
    }

    /// Returns `<root>/<candidate>/<version>`.
    #[must_use = "returns the path without side effects"]
    pub fn version_dir(&self, candidate: &str, version: &str) -> PathBuf {
        self.candidate_dir(candidate).join(version)
    }

    /// Returns the path for a downloaded archive file.
    #[must_use = "returns the path without side effects"]
    pub fn download_path(&self, filename: &str) -> PathBuf {
        let name = Path::new(filename)
            .file_name()
            .map_or_else(|| filename.into(), PathBuf::from);
        self.downloads.join(name)
    }

    /// Ensures the root and downloads directories exist.
    ///
    /// # Errors
    ///
    /// Returns an error if any directory cannot be created.
    pub fn ensure_directories(&self) -> Result<()> {
        for dir in [&self.root, &self.downloads] {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create directory: {}", dir.display()))?;
        }
        Ok(())
    }
}
