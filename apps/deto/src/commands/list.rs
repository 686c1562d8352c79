//! List action for the deto CLI.
//!
//! Displays the installed versions of a candidate and marks the current one.
//!
//! ## Usage
//!
//! ```bash
//! deto man -a list -c java
//! ```
//!
//! ## Output Format
//!
//! ```text
//! Version  Current
//! 17.0.1
//! 21.0.2   *
//! ```

use anyhow::Result;

use crate::config::Settings;
use crate::manager::{CandidateManifestEntry, VersionStore};
use crate::ui::Ui;

/// Column headers of the version table.
pub const HEADERS: [&str; 2] = ["Version", "Current"];

/// Marker shown in the `Current` column.
pub const CURRENT_MARKER: &str = "*";

/// Executes the list action.
///
/// Reads the manifest only; the registry is not contacted.
///
/// # Errors
///
/// Returns an error if the manifest cannot be read or is corrupt.
pub fn execute(candidate: &str, settings: &Settings, ui: &dyn Ui) -> Result<()> {
    let store = VersionStore::new(settings.paths.manifest_file());

    match store.find(candidate)? {
        Some(entry) if !entry.versions.is_empty() => {
            ui.table(&HEADERS, &rows(&entry));
            if entry.current.is_empty() {
                println!();
                println!(
                    "No current version set. Run 'deto man -a default -c {candidate}' to set one."
                );
            }
        }
        _ => {
            println!("No versions of {candidate} installed.");
            println!();
            println!("Run 'deto man -a install -c {candidate}' to install one.");
        }
    }

    Ok(())
}

/// One `[version, marker]` row per installed version, in install order.
#[must_use]
pub fn rows(entry: &CandidateManifestEntry) -> Vec<Vec<String>> {
    entry
        .versions
        .iter()
        .map(|version| {
            let marker = if *version == entry.current {
                CURRENT_MARKER
            } else {
                ""
            };
            vec![version.clone(), marker.to_string()]
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rows_mark_only_current() {
        let entry = CandidateManifestEntry {
            candidate: "java".into(),
            versions: vec!["17.0.1".into(), "21.0.2".into()],
            current: "21.0.2".into(),
        };

        assert_eq!(
            rows(&entry),
            vec![
                vec!["17.0.1".to_string(), String::new()],
                vec!["21.0.2".to_string(), "*".to_string()],
            ]
        );
    }
}
