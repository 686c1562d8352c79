#![warn(clippy::pedantic)]

//! # deto
//!
//! Version manager for developer toolchains. A *candidate* (a language
//! runtime such as `java` or `go`) can have several versions installed side
//! by side under `~/.deto/<candidate>/<version>/`; one of them is marked
//! current in the manifest at `~/.deto/config.json`.
//!
//! The library holds everything behind the `deto` binary so the install
//! pipeline can be driven from tests with a scripted [`ui::Ui`].
//!
//! ## Modules
//!
//! - [`manager`] - registry, download, verification, extraction, manifest
//! - [`commands`] - the install state machine and the other actions
//! - [`ui`] - user interaction capability
//! - [`config`] - settings resolved at startup
//! - [`errors`] - error taxonomy

pub mod commands;
pub mod config;
pub mod errors;
pub mod manager;
pub mod ui;
