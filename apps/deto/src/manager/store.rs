//! Persisted record of installed candidates.
//!
//! The manifest is a single JSON array stored at `<root>/config.json`:
//!
//! ```json
//! [
//!   { "candidate": "java", "versions": ["17.0.1", "21.0.2"], "current": "21.0.2" },
//!   { "candidate": "go", "versions": ["1.22.0"], "current": "1.22.0" }
//! ]
//! ```
//!
//! Every mutation is a full read-modify-write. The cycle runs while holding an
//! exclusive advisory lock on `config.json.lock`, and the new document is
//! written to a temporary file that is renamed over the manifest, so readers
//! only ever see a complete document and concurrent invocations cannot lose
//! each other's updates.

use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use fs2::FileExt;
use serde::{Deserialize, Serialize};

use crate::errors::DetoError;

/// One candidate's installed versions.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CandidateManifestEntry {
    /// Candidate name, unique across the manifest.
    pub candidate: String,
    /// Installed versions in install order.
    pub versions: Vec<String>,
    /// The selected version; empty or an element of `versions`.
    pub current: String,
}

impl CandidateManifestEntry {
    /// Checks whether `version` is installed.
    #[must_use]
    pub fn has_version(&self, version: &str) -> bool {
        self.versions.iter().any(|v| v == version)
    }
}

/// Loads and updates the manifest file.
#[derive(Debug, Clone)]
pub struct VersionStore {
    path: PathBuf,
}

impl VersionStore {
    /// Creates a store backed by the manifest at `path`.
    #[must_use]
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Returns the manifest location.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock_path(&self) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(".lock");
        PathBuf::from(name)
    }

    /// Reads every entry from the manifest.
    ///
    /// Returns an empty list when the manifest does not exist yet.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read, or `CorruptManifest` if it
    /// is not a JSON array of candidate entries.
    pub fn load(&self) -> Result<Vec<CandidateManifestEntry>> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => {
                return Err(e).with_context(|| {
                    format!("Failed to read manifest: {}", self.path.display())
                });
            }
        };

        serde_json::from_str(&content)
            .map_err(|e| DetoError::corrupt_manifest(self.path.clone(), e.to_string()).into())
    }

    /// Returns the entry for `candidate`, if any.
    ///
    /// # Errors
    ///
    /// Same as [`VersionStore::load`].
    pub fn find(&self, candidate: &str) -> Result<Option<CandidateManifestEntry>> {
        Ok(self
            .load()?
            .into_iter()
            .find(|entry| entry.candidate == candidate))
    }

    /// Records `version` as installed for `candidate`.
    ///
    /// The first version of a candidate also becomes its current version.
    /// Recording a version that is already present changes nothing.
    ///
    /// # Errors
    ///
    /// Returns an error if the manifest cannot be locked, read, or written.
    pub fn add_version(&self, candidate: &str, version: &str) -> Result<()> {
        self.update(|entries| {
            match entries.iter_mut().find(|e| e.candidate == candidate) {
                Some(entry) if entry.has_version(version) => {
                    log::debug!("{candidate} {version} already recorded");
                }
                Some(entry) => {
                    entry.versions.push(version.to_string());
                    if entry.current.is_empty() {
                        entry.current = version.to_string();
                    }
                }
                None => entries.push(CandidateManifestEntry {
                    candidate: candidate.to_string(),
                    versions: vec![version.to_string()],
                    current: version.to_string(),
                }),
            }
            Ok(())
        })
    }

    /// Makes `version` the current version of `candidate`.
    ///
    /// # Errors
    ///
    /// Returns `VersionNotInstalled` without touching the manifest if the
    /// version is not recorded for the candidate.
    pub fn set_default(&self, candidate: &str, version: &str) -> Result<()> {
        self.update(|entries| {
            let entry = entries
                .iter_mut()
                .find(|e| e.candidate == candidate && e.has_version(version))
                .ok_or_else(|| DetoError::version_not_installed(candidate, version))?;
            entry.current = version.to_string();
            Ok(())
        })
    }

    /// Drops `version` from `candidate` and returns the new current version.
    ///
    /// When the removed version was current, the most recently installed
    /// remaining version takes its place, or the current version becomes empty
    /// if none remain. The candidate entry itself is kept.
    ///
    /// # Errors
    ///
    /// Returns `VersionNotInstalled` without touching the manifest if the
    /// version is not recorded for the candidate.
    pub fn remove_version(&self, candidate: &str, version: &str) -> Result<String> {
        let mut current = String::new();
        self.update(|entries| {
            let entry = entries
                .iter_mut()
                .find(|e| e.candidate == candidate && e.has_version(version))
                .ok_or_else(|| DetoError::version_not_installed(candidate, version))?;
            entry.versions.retain(|v| v != version);
            if entry.current == version {
                entry.current = entry.versions.last().cloned().unwrap_or_default();
            }
            current.clone_from(&entry.current);
            Ok(())
        })?;
        Ok(current)
    }

    /// Runs one locked load-mutate-save cycle.
    ///
    /// Nothing is written when `mutate` fails.
    fn update<F>(&self, mutate: F) -> Result<()>
    where
        F: FnOnce(&mut Vec<CandidateManifestEntry>) -> Result<()>,
    {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }

        let lock_path = self.lock_path();
        let lock_file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock_path)
            .with_context(|| format!("Failed to open lock file: {}", lock_path.display()))?;
        lock_file
            .lock_exclusive()
            .with_context(|| format!("Failed to lock manifest: {}", lock_path.display()))?;

        let mut entries = self.load()?;
        mutate(&mut entries)?;
        self.save(&entries)

        // Lock released when lock_file is dropped
    }

    fn save(&self, entries: &[CandidateManifestEntry]) -> Result<()> {
        let content =
            serde_json::to_string_pretty(entries).context("Failed to serialize manifest")?;

        let mut temp_name = self.path.as_os_str().to_owned();
        temp_name.push(format!(".{}.tmp", std::process::id()));
        let temp_path = PathBuf::from(temp_name);

        let mut temp_file = create_manifest_file(&temp_path)
            .with_context(|| format!("Failed to create {}", temp_path.display()))?;
        temp_file
            .write_all(content.as_bytes())
            .and_then(|()| temp_file.sync_all())
            .with_context(|| format!("Failed to write {}", temp_path.display()))?;
        drop(temp_file);

        fs::rename(&temp_path, &self.path).with_context(|| {
            format!(
                "Failed to replace manifest {} with {}",
                self.path.display(),
                temp_path.display()
            )
        })
    }
}

#[cfg(unix)]
fn create_manifest_file(path: &Path) -> std::io::Result<File> {
    use std::os::unix::fs::OpenOptionsExt;

    OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .mode(0o755)
        .open(path)
}

#[cfg(not(unix))]
fn create_manifest_file(path: &Path) -> std::io::Result<File> {
    OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(true)
        .open(path)
}
