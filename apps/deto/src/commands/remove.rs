//! Remove action for the deto CLI.
//!
//! Deletes an installed version of a candidate and drops it from the manifest.
//!
//! ## Usage
//!
//! ```bash
//! deto man -a remove -c java -v 17.0.1
//! ```

use anyhow::Result;

use super::{choose_installed, is_plain_component};
use crate::config::Settings;
use crate::errors::DetoError;
use crate::manager::VersionStore;
use crate::ui::Ui;

/// Executes the remove action.
///
/// # Process
///
/// 1. Check the version is recorded for the candidate
/// 2. Delete `<root>/<candidate>/<version>`
/// 3. Drop the version from the manifest, moving `current` if needed
///
/// # Errors
///
/// Returns an error if:
/// - The version is not installed (`VersionNotInstalled`)
/// - The recorded version is not a plain directory name (`InvalidArguments`)
/// - The version directory cannot be deleted
/// - The manifest cannot be read or written
pub fn execute(
    candidate: &str,
    version: Option<&str>,
    settings: &Settings,
    ui: &dyn Ui,
) -> Result<()> {
    let store = VersionStore::new(settings.paths.manifest_file());
    let entry = store.find(candidate)?;

    let version = match version {
        Some(version) => version.to_string(),
        None => {
            let versions = entry.as_ref().map(|e| e.versions.as_slice()).unwrap_or(&[]);
            choose_installed(
                ui,
                &format!("Select the {candidate} version to remove"),
                candidate,
                versions,
            )?
        }
    };

    let Some(entry) = entry.filter(|e| e.has_version(&version)) else {
        return Err(DetoError::version_not_installed(candidate, version).into());
    };
    if !is_plain_component(&version) {
        return Err(DetoError::invalid_arguments(format!(
            "recorded version {version:?} cannot be used as a directory name"
        ))
        .into());
    }
    if entry.current == version {
        println!("Warning: {version} is the current {candidate} version.");
    }

    println!("Removing {candidate} {version}...");

    let version_dir = settings.paths.version_dir(candidate, &version);
    if version_dir.exists() {
        std::fs::remove_dir_all(&version_dir).map_err(|e| {
            DetoError::io(
                format!("failed to remove {}", version_dir.display()),
                e,
            )
        })?;
    } else {
        log::warn!(
            "{} was already missing; updating the manifest only",
            version_dir.display()
        );
    }

    let current = store.remove_version(candidate, &version)?;
    println!("{candidate} {version} removed.");

    if entry.current == version {
        if current.is_empty() {
            println!("No {candidate} versions remaining. Current version has been cleared.");
        } else {
            println!("Current {candidate} version changed to {current}.");
        }
    }

    Ok(())
}
