//! Error types for the deto version manager.
//!
//! This module defines the `DetoError` enum which names every failure the
//! install pipeline and the version store can report. Operations return
//! `anyhow::Result`; the variants below are raised where a caller needs to
//! distinguish the failure, and recovered with `downcast_ref::<DetoError>()`.

use std::path::PathBuf;
use thiserror::Error;

/// Consolidated error type for deto operations.
///
/// Every variant is terminal for the current command invocation. None of them
/// are retried automatically.
#[derive(Debug, Error)]
pub enum DetoError {
    /// The registry has no document for the candidate (HTTP 404).
    #[error("candidate not found in registry: {candidate}")]
    CandidateNotFound {
        /// The candidate that was looked up.
        candidate: String,
    },

    /// The registry answered with an unexpected status, an unreadable body,
    /// or could not be reached at all.
    #[error("registry unavailable: {message}")]
    RegistryUnavailable {
        /// Description of what went wrong.
        message: String,
    },

    /// The artifact server did not declare a `Content-Length`.
    #[error("server did not report a content length for {url}")]
    MissingContentLength {
        /// The URL being downloaded.
        url: String,
    },

    /// Connection or stream failure while transferring an artifact.
    #[error("transport error: {message}")]
    TransportError {
        /// Description of the transport failure.
        message: String,
    },

    /// Digest algorithm other than `sha256` or `sha512`.
    #[error("unsupported hash algorithm: {algorithm}")]
    UnsupportedAlgorithm {
        /// The rejected algorithm name.
        algorithm: String,
    },

    /// The downloaded artifact does not hash to the advertised checksum.
    #[error("checksum mismatch for {artifact}: expected {expected}")]
    ChecksumMismatch {
        /// Artifact file name.
        artifact: String,
        /// The expected checksum.
        expected: String,
    },

    /// Archive name does not end in `.tar.gz`.
    #[error("unsupported archive format: {name}")]
    UnsupportedFormat {
        /// The archive name that was rejected.
        name: String,
    },

    /// An archive entry would be written outside the destination directory.
    #[error("refusing to extract unsafe archive entry: {entry}")]
    UnsafeArchiveEntry {
        /// The entry name as stored in the archive.
        entry: String,
    },

    /// The manifest file exists but is not a JSON array of candidate entries.
    #[error("corrupt manifest at {path}: {message}")]
    CorruptManifest {
        /// Manifest location.
        path: PathBuf,
        /// Parser message.
        message: String,
    },

    /// The version is not recorded as installed for the candidate.
    #[error("{candidate} {version} is not installed")]
    VersionNotInstalled {
        /// Candidate name.
        candidate: String,
        /// Requested version.
        version: String,
    },

    /// The selection does not address an offered entry.
    #[error("invalid selection: {message}")]
    InvalidSelection {
        /// Description of the rejected selection.
        message: String,
    },

    /// Required input is missing or malformed.
    #[error("invalid arguments: {message}")]
    InvalidArguments {
        /// Description of what was invalid.
        message: String,
    },

    /// The requested action is not one of install, remove, list, default.
    #[error("unsupported action: {action}")]
    UnsupportedAction {
        /// The rejected action name.
        action: String,
    },

    /// Error reading or writing files.
    #[error("I/O error: {message}")]
    Io {
        /// Description of the I/O operation that failed.
        message: String,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

impl DetoError {
    /// Creates a new `CandidateNotFound` error.
    #[must_use]
    pub fn candidate_not_found(candidate: impl Into<String>) -> Self {
        Self::CandidateNotFound {
            candidate: candidate.into(),
        }
    }

    /// Creates a new `RegistryUnavailable` error.
    #[must_use]
    pub fn registry_unavailable(message: impl Into<String>) -> Self {
        Self::RegistryUnavailable {
            message: message.into(),
        }
    }

    /// Creates a new `MissingContentLength` error.
    #[must_use]
    pub fn missing_content_length(url: impl Into<String>) -> Self {
        Self::MissingContentLength { url: url.into() }
    }

    /// Creates a new `TransportError`.
    #[must_use]
    pub fn transport(message: impl Into<String>) -> Self {
        Self::TransportError {
            message: message.into(),
        }
    }

    /// Creates a new `UnsupportedAlgorithm` error.
    #[must_use]
    pub fn unsupported_algorithm(algorithm: impl Into<String>) -> Self {
        Self::UnsupportedAlgorithm {
            algorithm: algorithm.into(),
        }
    }

    /// Creates a new `ChecksumMismatch` error.
    #[must_use]
    pub fn checksum_mismatch(artifact: impl Into<String>, expected: impl Into<String>) -> Self {
        Self::ChecksumMismatch {
            artifact: artifact.into(),
            expected: expected.into(),
        }
    }

    /// Creates a new `UnsupportedFormat` error.
    #[must_use]
    pub fn unsupported_format(name: impl Into<String>) -> Self {
        Self::UnsupportedFormat { name: name.into() }
    }

    /// Creates a new `UnsafeArchiveEntry` error.
    #[must_use]
    pub fn unsafe_archive_entry(entry: impl Into<String>) -> Self {
        Self::UnsafeArchiveEntry {
            entry: entry.into(),
        }
    }

    /// Creates a new `CorruptManifest` error.
    #[must_use]
    pub fn corrupt_manifest(path: PathBuf, message: impl Into<String>) -> Self {
        Self::CorruptManifest {
            path,
            message: message.into(),
        }
    }

    /// Creates a new `VersionNotInstalled` error.
    #[must_use]
    pub fn version_not_installed(candidate: impl Into<String>, version: impl Into<String>) -> Self {
        Self::VersionNotInstalled {
            candidate: candidate.into(),
            version: version.into(),
        }
    }

    /// Creates a new `InvalidSelection` error.
    #[must_use]
    pub fn invalid_selection(message: impl Into<String>) -> Self {
        Self::InvalidSelection {
            message: message.into(),
        }
    }

    /// Creates a new `InvalidArguments` error.
    #[must_use]
    pub fn invalid_arguments(message: impl Into<String>) -> Self {
        Self::InvalidArguments {
            message: message.into(),
        }
    }

    /// Creates a new `UnsupportedAction` error.
    #[must_use]
    pub fn unsupported_action(action: impl Into<String>) -> Self {
        Self::UnsupportedAction {
            action: action.into(),
        }
    }

    /// Creates a new `Io` error from an I/O error with context.
    #[must_use]
    pub fn io(message: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            message: message.into(),
            source,
        }
    }
}
