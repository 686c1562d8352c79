//! Default action for the deto CLI.
//!
//! Selects which installed version of a candidate is current.
//!
//! ## Usage
//!
//! ```bash
//! deto man -a default -c java -v 21.0.2    # make 21.0.2 current
//! deto man -a default -c java              # choose from installed versions
//! ```

use anyhow::Result;

use super::choose_installed;
use crate::config::Settings;
use crate::errors::DetoError;
use crate::manager::VersionStore;
use crate::ui::Ui;

/// Executes the default action.
///
/// # Errors
///
/// Returns an error if:
/// - The version is not installed (`VersionNotInstalled`)
/// - No version is given and none can be chosen
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
                &format!("Select the {candidate} version to use"),
                candidate,
                versions,
            )?
        }
    };

    let Some(entry) = entry.filter(|e| e.has_version(&version)) else {
        return Err(DetoError::version_not_installed(candidate, version).into());
    };
    if entry.current == version {
        println!("{candidate} {version} is already the current version.");
        return Ok(());
    }

    store.set_default(candidate, &version)?;
    println!("Current {candidate} version set to {version}.");

    Ok(())
}
