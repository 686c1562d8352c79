//! Command modules for the deto CLI.
//!
//! `deto man` takes an action and a candidate. Both can be given as flags or
//! answered interactively; this module resolves them and hands off to the
//! matching action.
//!
//! ## Actions
//!
//! - [`install`] - Fetch, verify and unpack a version from the registry
//! - [`remove`] - Delete an installed version
//! - [`list`] - Show installed versions of a candidate
//! - [`default`] - Select the current version of a candidate

pub mod default;
pub mod install;
pub mod list;
pub mod remove;

use std::fmt;
use std::str::FromStr;

use anyhow::Result;
use clap::Args;

use crate::config::Settings;
use crate::errors::DetoError;
use crate::ui::Ui;

/// Arguments for the `man` command.
#[derive(Args, Debug, Default, Clone)]
pub struct ManArgs {
    /// Action to perform: install, remove, list or default.
    ///
    /// Prompted for when omitted.
    #[clap(short = 'a', long = "action")]
    pub action: Option<String>,

    /// Candidate to operate on (e.g. "java", "go").
    ///
    /// Prompted for when omitted.
    #[clap(short = 'c', long = "candidate")]
    pub candidate: Option<String>,

    /// Version to install, remove or make current.
    ///
    /// Skips the version prompt when given.
    #[clap(short = 'v', long = "version")]
    pub version: Option<String>,

    /// Offer builds for every architecture, not only the host's.
    #[clap(long = "all-architectures", action = clap::ArgAction::SetTrue)]
    pub all_architectures: bool,
}

/// The operations `deto man` can perform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Download and unpack a new version.
    Install,
    /// Delete an installed version.
    Remove,
    /// Show installed versions.
    List,
    /// Change the current version.
    Default,
}

impl Action {
    /// Every action, in the order they are offered.
    pub const ALL: [Action; 4] = [Self::Install, Self::Remove, Self::List, Self::Default];

    /// The name accepted on the command line.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Install => "install",
            Self::Remove => "remove",
            Self::List => "list",
            Self::Default => "default",
        }
    }
}

impl FromStr for Action {
    type Err = DetoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|action| action.as_str() == s.trim())
            .ok_or_else(|| DetoError::unsupported_action(s))
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Executes the `man` command.
///
/// # Errors
///
/// Returns an error if:
/// - The action is unknown (`UnsupportedAction`)
/// - A missing action or candidate cannot be prompted for (`InvalidArguments`)
/// - The selected action fails
pub async fn execute(args: &ManArgs, settings: &Settings, ui: &dyn Ui) -> Result<()> {
    let action = match &args.action {
        Some(action) => action.parse()?,
        None => {
            let items: Vec<String> = Action::ALL.iter().map(ToString::to_string).collect();
            Action::ALL[select(ui, "Select an action", &items)?]
        }
    };

    let candidate = match &args.candidate {
        Some(candidate) => candidate.trim().to_string(),
        None => ui.input("Candidate name")?,
    };
    validate_candidate(&candidate)?;

    log::info!("{action} {candidate}");

    match action {
        Action::Install => {
            let request = install::InstallRequest {
                candidate,
                version: args.version.clone(),
                all_architectures: args.all_architectures,
            };
            install::execute(&request, settings, ui).await
        }
        Action::Remove => remove::execute(&candidate, args.version.as_deref(), settings, ui),
        Action::List => list::execute(&candidate, settings, ui),
        Action::Default => default::execute(&candidate, args.version.as_deref(), settings, ui),
    }
}

/// Asks the user to pick one of `items` and returns its 0-based index.
///
/// # Errors
///
/// Returns `InvalidSelection` if the prompt was dismissed or the answer does
/// not address an item.
pub fn select(ui: &dyn Ui, prompt: &str, items: &[String]) -> Result<usize> {
    let choice = ui.choose(prompt, items)?;
    if choice == 0 {
        return Err(DetoError::invalid_selection("nothing was selected").into());
    }
    if choice > items.len() {
        return Err(DetoError::invalid_selection(format!(
            "{choice} is not between 1 and {}",
            items.len()
        ))
        .into());
    }
    Ok(choice - 1)
}

/// Checks that a name can be used as one directory level under the root.
pub(crate) fn is_plain_component(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\'])
        && !name.chars().any(char::is_control)
}

fn validate_candidate(candidate: &str) -> Result<()> {
    if is_plain_component(candidate) {
        Ok(())
    } else {
        Err(DetoError::invalid_arguments(format!("invalid candidate name {candidate:?}")).into())
    }
}

/// Prompts for one of the installed versions of a candidate.
///
/// # Errors
///
/// Returns an error if nothing is installed or the selection is invalid.
pub(crate) fn choose_installed(
    ui: &dyn Ui,
    prompt: &str,
    candidate: &str,
    versions: &[String],
) -> Result<String> {
    if versions.is_empty() {
        anyhow::bail!("No versions of {candidate} are installed.");
    }
    let index = select(ui, prompt, versions)?;
    Ok(versions[index].clone())
}
