//! Install action for the deto CLI.
//!
//! Fetches the registry document for a candidate, lets the user pick a build,
//! then downloads, verifies and unpacks it and records the new version.
//!
//! ## Usage
//!
//! ```bash
//! deto man -a install -c java              # choose from the available builds
//! deto man -a install -c go -v 1.22.0      # install a specific version
//! ```
//!
//! ## States
//!
//! ```text
//! Idle -> EnsureBaseDir -> FetchRegistry -> AwaitSelection -> Downloading
//!      -> Verifying -> Extracting -> RecordVersion -> Done
//! ```
//!
//! Any failure moves the pipeline to `Aborted`. The downloaded archive is
//! removed on every path once it exists; a partially unpacked version
//! directory is left in place.

use std::cmp::Ordering;
use std::fmt;
use std::path::{Path, PathBuf};

use anyhow::{Result, bail};
use semver::Version;

use crate::commands::{is_plain_component, select};
use crate::config::Settings;
use crate::errors::DetoError;
use crate::manager::verify::{self, Algorithm};
use crate::manager::{
    ArchiveExtractor, Downloader, Platform, RegistryClient, RegistryEntry, VersionStore,
};
use crate::ui::Ui;

/// What to install.
#[derive(Debug, Clone, Default)]
pub struct InstallRequest {
    /// Candidate name.
    pub candidate: String,
    /// Version to pick without prompting.
    pub version: Option<String>,
    /// Skip the host architecture filter.
    pub all_architectures: bool,
}

/// Pipeline position of an [`Installer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallState {
    Idle,
    EnsureBaseDir,
    FetchRegistry,
    AwaitSelection,
    Downloading,
    Verifying,
    Extracting,
    RecordVersion,
    Done,
    Aborted,
}

impl fmt::Display for InstallState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}

/// How an install finished.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InstallOutcome {
    /// The version was unpacked and recorded.
    Installed {
        /// Installed version.
        version: String,
        /// Directory the artifact was unpacked into.
        path: PathBuf,
        /// Whether the version is now the candidate's current version.
        current: bool,
    },
    /// The version was already recorded and present on disk.
    AlreadyInstalled {
        /// The version that was selected.
        version: String,
    },
}

/// Drives one install through the pipeline states.
pub struct Installer<'a> {
    settings: &'a Settings,
    ui: &'a dyn Ui,
    state: InstallState,
    history: Vec<InstallState>,
}

impl<'a> Installer<'a> {
    /// Creates an installer in the `Idle` state.
    #[must_use]
    pub fn new(settings: &'a Settings, ui: &'a dyn Ui) -> Self {
        Self {
            settings,
            ui,
            state: InstallState::Idle,
            history: vec![InstallState::Idle],
        }
    }

    /// Current pipeline state.
    #[must_use]
    pub fn state(&self) -> InstallState {
        self.state
    }

    /// Every state entered so far, in order.
    #[must_use]
    pub fn history(&self) -> &[InstallState] {
        &self.history
    }

    fn enter(&mut self, state: InstallState) {
        log::info!("install: {} -> {state}", self.state);
        self.state = state;
        self.history.push(state);
    }

    /// Runs the pipeline to completion.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The root directory cannot be created
    /// - The registry lookup fails or offers no build for this platform
    /// - The selection is invalid (`InvalidSelection`)
    /// - The download fails or its checksum does not match (`ChecksumMismatch`)
    /// - Extraction fails or the manifest cannot be updated
    pub async fn run(&mut self, request: &InstallRequest) -> Result<InstallOutcome> {
        match self.pipeline(request).await {
            Ok(outcome) => {
                self.enter(InstallState::Done);
                Ok(outcome)
            }
            Err(e) => {
                self.enter(InstallState::Aborted);
                Err(e)
            }
        }
    }

    async fn pipeline(&mut self, request: &InstallRequest) -> Result<InstallOutcome> {
        let settings = self.settings;
        let candidate = request.candidate.as_str();
        let paths = &settings.paths;
        let platform = settings.platform;

        self.enter(InstallState::EnsureBaseDir);
        paths.ensure_directories()?;

        self.enter(InstallState::FetchRegistry);
        println!("Fetching available {candidate} versions...");
        let registry = RegistryClient::new(settings.registry_url.as_str())?;
        let entries = registry.fetch_entries(candidate, platform.os()).await?;
        let entries = installable_entries(entries, platform, request.all_architectures);
        if entries.is_empty() {
            bail!("{candidate} is not available for {platform}.");
        }

        self.enter(InstallState::AwaitSelection);
        let entry = self.select_entry(candidate, &entries, request.version.as_deref())?;
        if !is_plain_component(&entry.version) {
            return Err(DetoError::invalid_selection(format!(
                "registry version {:?} cannot be used as a directory name",
                entry.version
            ))
            .into());
        }

        let store = VersionStore::new(paths.manifest_file());
        let version_dir = paths.version_dir(candidate, &entry.version);
        if version_dir.is_dir()
            && store
                .find(candidate)?
                .is_some_and(|e| e.has_version(&entry.version))
        {
            println!("{candidate} {} is already installed.", entry.version);
            return Ok(InstallOutcome::AlreadyInstalled {
                version: entry.version.clone(),
            });
        }

        let artifact = artifact_name(entry);
        if Path::new(&artifact).file_name().is_none() {
            return Err(DetoError::invalid_selection(format!(
                "cannot derive an artifact file name from {:?}",
                entry.link
            ))
            .into());
        }

        self.enter(InstallState::Downloading);
        println!("Downloading {candidate} {} from {}...", entry.version, entry.link);
        let archive = paths.download_path(&artifact);
        let downloader = Downloader::new(self.ui.progress())?;
        downloader.download(&entry.link, &archive).await?;

        let result = self.finish(candidate, entry, &archive, &store);
        remove_archive(&archive);
        result
    }

    fn select_entry<'e>(
        &self,
        candidate: &str,
        entries: &'e [RegistryEntry],
        version: Option<&str>,
    ) -> Result<&'e RegistryEntry> {
        if let Some(version) = version {
            return entries.iter().find(|e| e.version == version).ok_or_else(|| {
                DetoError::invalid_selection(format!(
                    "{candidate} {version} is not offered for {}",
                    self.settings.platform
                ))
                .into()
            });
        }

        let labels: Vec<String> = entries.iter().map(RegistryEntry::label).collect();
        let index = select(
            self.ui,
            &format!("Select a version of {candidate} to install"),
            &labels,
        )?;
        Ok(&entries[index])
    }

    fn finish(
        &mut self,
        candidate: &str,
        entry: &RegistryEntry,
        archive: &Path,
        store: &VersionStore,
    ) -> Result<InstallOutcome> {
        self.enter(InstallState::Verifying);
        println!("Verifying checksum...");
        if !verify::verify(archive, &entry.checksum, &Algorithm::default().to_string())? {
            return Err(DetoError::checksum_mismatch(artifact_name(entry), &entry.checksum).into());
        }

        self.enter(InstallState::Extracting);
        println!("Extracting...");
        let extractor = ArchiveExtractor::new(self.settings.paths.clone());
        let path = extractor.extract(archive, candidate, &entry.version)?;

        self.enter(InstallState::RecordVersion);
        store.add_version(candidate, &entry.version)?;
        let current = store
            .find(candidate)?
            .is_some_and(|e| e.current == entry.version);

        Ok(InstallOutcome::Installed {
            version: entry.version.clone(),
            path,
            current,
        })
    }
}

/// Executes the install action.
///
/// # Errors
///
/// See [`Installer::run`].
pub async fn execute(request: &InstallRequest, settings: &Settings, ui: &dyn Ui) -> Result<()> {
    let mut installer = Installer::new(settings, ui);
    let outcome = installer.run(request).await?;

    if let InstallOutcome::Installed {
        version,
        path,
        current,
    } = outcome
    {
        let candidate = &request.candidate;
        println!(
            "{candidate} {version} installed successfully to {}.",
            path.display()
        );
        if current {
            println!("{candidate} {version} is now the current version.");
        } else {
            println!("Run 'deto man -a default -c {candidate} -v {version}' to make it current.");
        }
    }

    Ok(())
}

/// Drops builds for other architectures and orders the rest newest first.
#[must_use]
pub fn installable_entries(
    entries: Vec<RegistryEntry>,
    platform: Platform,
    all_architectures: bool,
) -> Vec<RegistryEntry> {
    let mut entries: Vec<RegistryEntry> = entries
        .into_iter()
        .filter(|e| all_architectures || platform.matches_architecture(&e.architecture))
        .collect();
    entries.sort_by(|a, b| compare_versions(&b.version, &a.version));
    entries
}

/// Orders version strings semantically, falling back to string order for
/// versions that do not parse. Parsable versions sort above the rest.
fn compare_versions(a: &str, b: &str) -> Ordering {
    match (parse_version(a), parse_version(b)) {
        (Some(a), Some(b)) => a.cmp(&b),
        (Some(_), None) => Ordering::Greater,
        (None, Some(_)) => Ordering::Less,
        (None, None) => a.cmp(b),
    }
}

/// Parses `17`, `17.0` and `17.0.1` alike. Leading non-digits such as the
/// `go` in `go1.22.0` are ignored.
fn parse_version(version: &str) -> Option<Version> {
    let version = version
        .trim()
        .trim_start_matches(|c: char| !c.is_ascii_digit());
    Version::parse(version).ok().or_else(|| {
        let padded = match version.matches('.').count() {
            0 => format!("{version}.0.0"),
            1 => format!("{version}.0"),
            _ => return None,
        };
        Version::parse(&padded).ok()
    })
}

/// File name for the downloaded artifact, from the entry name or its link.
fn artifact_name(entry: &RegistryEntry) -> String {
    if entry.name.is_empty() {
        entry
            .link
            .rsplit('/')
            .next()
            .unwrap_or_default()
            .to_string()
    } else {
        entry.name.clone()
    }
}

fn remove_archive(archive: &Path) {
    if let Err(e) = std::fs::remove_file(archive)
        && e.kind() != std::io::ErrorKind::NotFound
    {
        log::warn!("could not remove {}: {e}", archive.display());
    }
}
