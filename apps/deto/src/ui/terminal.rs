//! Terminal implementation of [`Ui`].

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use console::style;
use dialoguer::theme::ColorfulTheme;
use dialoguer::{Input, Select};
use indicatif::{ProgressBar, ProgressStyle};

use super::Ui;
use crate::errors::DetoError;
use crate::manager::{ProgressCallback, ProgressEvent};

const BAR_TEMPLATE: &str =
    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {bytes}/{total_bytes} {msg}";

/// Prompts on the controlling terminal.
///
/// When constructed non-interactive, prompts fail with `InvalidArguments`
/// instead of blocking, and the progress bar is hidden.
#[derive(Debug, Clone, Copy)]
pub struct TerminalUi {
    interactive: bool,
}

impl TerminalUi {
    /// Creates a terminal UI.
    #[must_use]
    pub const fn new(interactive: bool) -> Self {
        Self { interactive }
    }

    fn require_interactive(self, prompt: &str) -> Result<()> {
        if self.interactive {
            Ok(())
        } else {
            Err(DetoError::invalid_arguments(format!(
                "{prompt}: no answer given and prompts are disabled"
            ))
            .into())
        }
    }
}

impl Ui for TerminalUi {
    fn choose(&self, prompt: &str, items: &[String]) -> Result<usize> {
        self.require_interactive(prompt)?;

        let selection = Select::with_theme(&ColorfulTheme::default())
            .with_prompt(prompt)
            .items(items)
            .default(0)
            .interact_opt()
            .context("Failed to show selection prompt")?;

        Ok(selection.map_or(0, |index| index + 1))
    }

    fn input(&self, prompt: &str) -> Result<String> {
        self.require_interactive(prompt)?;

        let answer: String = Input::with_theme(&ColorfulTheme::default())
            .with_prompt(prompt)
            .interact_text()
            .context("Failed to read input")?;
        Ok(answer.trim().to_string())
    }

    fn progress(&self) -> ProgressCallback {
        let bar = if self.interactive {
            ProgressBar::new(0)
        } else {
            ProgressBar::hidden()
        };
        bar.set_style(
            ProgressStyle::default_bar()
                .template(BAR_TEMPLATE)
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
        );

        Arc::new(move |event: ProgressEvent| match event {
            ProgressEvent::Started { url, total } => {
                bar.set_length(total);
                bar.set_position(0);
                bar.set_message(url.rsplit('/').next().unwrap_or_default().to_string());
                bar.enable_steady_tick(Duration::from_millis(100));
            }
            ProgressEvent::Progress { downloaded, .. } => bar.set_position(downloaded),
            ProgressEvent::Completed => bar.finish_and_clear(),
            ProgressEvent::Failed { .. } => bar.abandon(),
        })
    }

    fn table(&self, headers: &[&str], rows: &[Vec<String>]) {
        let widths = column_widths(headers, rows);

        let header = headers
            .iter()
            .zip(&widths)
            .map(|(h, w)| format!("{h:<w$}"))
            .collect::<Vec<_>>()
            .join("  ");
        println!("{}", style(header.trim_end()).bold());

        for row in rows {
            let line = row
                .iter()
                .zip(&widths)
                .map(|(cell, w)| format!("{cell:<w$}"))
                .collect::<Vec<_>>()
                .join("  ");
            println!("{}", line.trim_end());
        }
    }
}

fn column_widths(headers: &[&str], rows: &[Vec<String>]) -> Vec<usize> {
    headers
        .iter()
        .enumerate()
        .map(|(i, h)| {
            rows.iter()
                .filter_map(|row| row.get(i))
                .map(String::len)
                .chain(std::iter::once(h.len()))
                .max()
                .unwrap_or(0)
        })
        .collect()
}
