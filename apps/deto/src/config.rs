//! Runtime settings resolved once at startup.
//!
//! Every component that needs the root directory, the registry location or the
//! host platform receives them through [`Settings`]; nothing reads the
//! environment after this point.
//!
//! ## Environment Variables
//!
//! - `DETO_HOME` - root directory (default `~/.deto`)
//! - `DETO_REGISTRY_URL` - registry base URL
//! - `DETO_NO_TUI` - disable interactive prompts (any value)

use std::io::IsTerminal;

use anyhow::Result;

use crate::manager::registry::{DEFAULT_REGISTRY_URL, REGISTRY_URL_ENV};
use crate::manager::{DetoPaths, Platform};

/// Environment variable that disables interactive prompts.
pub const NO_TUI_ENV: &str = "DETO_NO_TUI";

/// Configuration shared by every command.
#[derive(Debug, Clone)]
pub struct Settings {
    /// Directory layout under the root.
    pub paths: DetoPaths,
    /// Registry base URL without the per-candidate document name.
    pub registry_url: String,
    /// Host platform used to select registry builds.
    pub platform: Platform,
    /// Whether the user can be prompted.
    pub interactive: bool,
}

impl Settings {
    /// Resolves settings from the process environment.
    ///
    /// # Errors
    ///
    /// Returns an error if the home directory cannot be determined and
    /// `DETO_HOME` is not set.
    pub fn from_env() -> Result<Self> {
        let registry_url = std::env::var(REGISTRY_URL_ENV)
            .ok()
            .filter(|url| !url.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_REGISTRY_URL.to_string());

        Ok(Self {
            paths: DetoPaths::new()?,
            registry_url,
            platform: Platform::detect(),
            interactive: should_prompt(),
        })
    }
}

/// Determines whether interactive prompts can be shown.
///
/// Returns `false` in headless environments:
/// - `DETO_NO_TUI` environment variable (any value)
/// - Non-TTY stdout (piped or redirected)
#[must_use]
pub fn should_prompt() -> bool {
    if std::env::var(NO_TUI_ENV).is_ok() {
        return false;
    }
    std::io::stdout().is_terminal()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::path::PathBuf;

    #[test]
    #[serial]
    fn from_env_honours_overrides() {
        // SAFETY: serialized with every other test touching these variables.
        unsafe {
            std::env::set_var("DETO_HOME", "/tmp/deto-settings-test");
            std::env::set_var(REGISTRY_URL_ENV, "http://localhost:8080/registry");
            std::env::set_var(NO_TUI_ENV, "1");
        }

        let settings = Settings::from_env().expect("Should resolve settings");

        // SAFETY: as above.
        unsafe {
            std::env::remove_var("DETO_HOME");
            std::env::remove_var(REGISTRY_URL_ENV);
            std::env::remove_var(NO_TUI_ENV);
        }

        assert_eq!(settings.paths.root, PathBuf::from("/tmp/deto-settings-test"));
        assert_eq!(settings.registry_url, "http://localhost:8080/registry");
        assert!(!settings.interactive);
        assert_eq!(settings.platform, Platform::detect());
    }

    #[test]
    #[serial]
    fn blank_registry_override_falls_back_to_default() {
        // SAFETY: serialized with every other test touching these variables.
        unsafe {
            std::env::set_var("DETO_HOME", "/tmp/deto-settings-default");
            std::env::set_var(REGISTRY_URL_ENV, "  ");
        }

        let settings = Settings::from_env().expect("Should resolve settings");

        // SAFETY: as above.
        unsafe {
            std::env::remove_var("DETO_HOME");
            std::env::remove_var(REGISTRY_URL_ENV);
        }

        assert_eq!(settings.registry_url, DEFAULT_REGISTRY_URL);
    }
}
