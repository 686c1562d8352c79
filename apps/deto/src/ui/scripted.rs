//! Scripted implementation of [`Ui`] for tests and automation.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex, PoisonError};

use anyhow::Result;

use super::Ui;
use crate::errors::DetoError;
use crate::manager::{ProgressCallback, ProgressEvent};

/// A queued reply to one prompt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Answer {
    /// Reply to [`Ui::choose`] (1-based, `0` cancels).
    Choice(usize),
    /// Reply to [`Ui::input`].
    Text(String),
}

/// Answers prompts from a queue and records everything rendered.
///
/// Prompts are answered in the order the answers were queued. A prompt that
/// finds the queue empty, or finds an answer of the wrong kind, fails with
/// `InvalidArguments`.
#[derive(Debug, Default)]
pub struct ScriptedUi {
    answers: Mutex<VecDeque<Answer>>,
    prompts: Mutex<Vec<(String, Vec<String>)>>,
    tables: Mutex<Vec<Vec<Vec<String>>>>,
    fractions: Arc<Mutex<Vec<f64>>>,
}

impl ScriptedUi {
    /// Creates a UI with no queued answers.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a reply to the next choice prompt.
    #[must_use]
    pub fn with_choice(self, index: usize) -> Self {
        self.push(Answer::Choice(index));
        self
    }

    /// Queues a reply to the next text prompt.
    #[must_use]
    pub fn with_input(self, text: impl Into<String>) -> Self {
        self.push(Answer::Text(text.into()));
        self
    }

    fn push(&self, answer: Answer) {
        self.answers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(answer);
    }

    fn next_answer(&self, prompt: &str) -> Result<Answer> {
        self.answers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
            .ok_or_else(|| {
                DetoError::invalid_arguments(format!("{prompt}: no scripted answer left")).into()
            })
    }

    /// Prompts shown so far, each with the items that were offered.
    #[must_use]
    pub fn prompts(&self) -> Vec<(String, Vec<String>)> {
        self.prompts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Tables rendered so far, rows only.
    #[must_use]
    pub fn tables(&self) -> Vec<Vec<Vec<String>>> {
        self.tables
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Progress fractions reported so far, in order.
    #[must_use]
    pub fn fractions(&self) -> Vec<f64> {
        self.fractions
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of queued answers not yet consumed.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.answers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl Ui for ScriptedUi {
    fn choose(&self, prompt: &str, items: &[String]) -> Result<usize> {
        self.prompts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((prompt.to_string(), items.to_vec()));

        match self.next_answer(prompt)? {
            Answer::Choice(index) => Ok(index),
            Answer::Text(text) => Err(DetoError::invalid_arguments(format!(
                "{prompt}: expected a choice, got text {text:?}"
            ))
            .into()),
        }
    }

    fn input(&self, prompt: &str) -> Result<String> {
        self.prompts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((prompt.to_string(), Vec::new()));

        match self.next_answer(prompt)? {
            Answer::Text(text) => Ok(text),
            Answer::Choice(index) => Err(DetoError::invalid_arguments(format!(
                "{prompt}: expected text, got choice {index}"
            ))
            .into()),
        }
    }

    fn progress(&self) -> ProgressCallback {
        let sink = Arc::clone(&self.fractions);
        Arc::new(move |event: ProgressEvent| {
            if let Some(fraction) = event.fraction() {
                sink.lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .push(fraction);
            }
        })
    }

    fn table(&self, _headers: &[&str], rows: &[Vec<String>]) {
        self.tables
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(rows.to_vec());
    }
}
