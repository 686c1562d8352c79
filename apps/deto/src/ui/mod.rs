//! User interaction capability for the deto CLI.
//!
//! Commands never talk to the terminal directly. Everything they need from
//! the user, and everything they show beyond plain status lines, goes through
//! the [`Ui`] trait so the install pipeline can run against a real terminal or
//! against a scripted double in tests.
//!
//! ## Implementations
//!
//! - [`terminal::TerminalUi`] - dialoguer prompts, indicatif progress bar,
//!   console-styled tables
//! - [`scripted::ScriptedUi`] - queued answers, records what was rendered

pub mod scripted;
pub mod terminal;

use anyhow::Result;

use crate::manager::ProgressCallback;

pub use scripted::ScriptedUi;
pub use terminal::TerminalUi;

/// What the commands need from the user interface.
pub trait Ui {
    /// Presents `items` and returns the chosen one as a 1-based index.
    ///
    /// `0` means the user dismissed the prompt without choosing. Other values
    /// are returned as given; range checking is the caller's job.
    ///
    /// # Errors
    ///
    /// Returns an error if no answer can be obtained.
    fn choose(&self, prompt: &str, items: &[String]) -> Result<usize>;

    /// Asks for a line of free text.
    ///
    /// # Errors
    ///
    /// Returns an error if no answer can be obtained.
    fn input(&self, prompt: &str) -> Result<String>;

    /// Returns a callback that renders download progress.
    fn progress(&self) -> ProgressCallback;

    /// Renders rows under the given column headers.
    fn table(&self, headers: &[&str], rows: &[Vec<String>]);
}
