//! Candidate management core for the deto CLI.
//!
//! This module provides everything the commands need to fetch, verify, unpack
//! and record candidate versions.
//!
//! ## Module Structure
//!
//! - [`platform`] - OS and architecture detection
//! - [`paths`] - Root directory layout
//! - [`registry`] - Per-candidate registry documents
//! - [`download`] - HTTP download with progress tracking
//! - [`verify`] - SHA-256/SHA-512 checksum verification
//! - [`archive`] - Safe tar.gz extraction
//! - [`store`] - Installed-version manifest

pub mod archive;
pub mod download;
pub mod paths;
pub mod platform;
pub mod registry;
pub mod store;
pub mod verify;

pub use archive::ArchiveExtractor;
pub use download::{Downloader, ProgressCallback, ProgressEvent};
pub use paths::DetoPaths;
pub use platform::Platform;
pub use registry::{RegistryClient, RegistryEntry};
pub use store::{CandidateManifestEntry, VersionStore};
pub use verify::verify;
