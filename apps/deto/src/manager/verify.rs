//! Checksum verification for downloaded artifacts.
//!
//! Registry entries publish a hex digest for every artifact. This module hashes
//! a local file with the requested algorithm and compares the result against
//! that digest. Files are streamed through the hasher in fixed-size chunks and
//! never loaded into memory whole.

use std::fmt;
use std::io::Read;
use std::path::Path;
use std::str::FromStr;

use anyhow::{Context, Result};
use sha2::{Digest, Sha256, Sha512};

use crate::errors::DetoError;

/// Digest algorithms accepted for artifact verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Algorithm {
    /// SHA-256, the default when no algorithm is named.
    #[default]
    Sha256,
    /// SHA-512.
    Sha512,
}

impl FromStr for Algorithm {
    type Err = DetoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "" | "sha256" => Ok(Self::Sha256),
            "sha512" => Ok(Self::Sha512),
            other => Err(DetoError::unsupported_algorithm(other)),
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Sha256 => write!(f, "sha256"),
            Self::Sha512 => write!(f, "sha512"),
        }
    }
}

/// Checks whether the file at `file_path` hashes to `expected`.
///
/// `algorithm` is one of `"sha256"` or `"sha512"`; an empty string selects
/// `sha256`. The comparison ignores ASCII case, so registry digests published
/// in upper-case hex are accepted as well.
///
/// # Errors
///
/// Returns an error if:
/// - The algorithm is not supported (`DetoError::UnsupportedAlgorithm`)
/// - The file cannot be opened or read
pub fn verify(file_path: &Path, expected: &str, algorithm: &str) -> Result<bool> {
    let algorithm: Algorithm = algorithm.parse()?;
    let computed = compute_digest(file_path, algorithm)?;
    let matches = computed.eq_ignore_ascii_case(expected);

    if !matches {
        log::debug!(
            "{algorithm} of {} is {computed}, expected {expected}",
            file_path.display()
        );
    }

    Ok(matches)
}

/// Computes the digest of a file as a lowercase hex string.
///
/// # Errors
///
/// Returns an error if the file cannot be opened or read.
pub fn compute_digest(file_path: &Path, algorithm: Algorithm) -> Result<String> {
    match algorithm {
        Algorithm::Sha256 => hash_file::<Sha256>(file_path),
        Algorithm::Sha512 => hash_file::<Sha512>(file_path),
    }
}

fn hash_file<D: Digest>(file_path: &Path) -> Result<String> {
    let mut file = std::fs::File::open(file_path)
        .with_context(|| format!("Failed to open file for checksum: {}", file_path.display()))?;

    let mut hasher = D::new();
    let mut buffer = [0u8; 8192];

    loop {
        let bytes_read = file.read(&mut buffer).with_context(|| {
            format!("Failed to read file for checksum: {}", file_path.display())
        })?;

        if bytes_read == 0 {
            break;
        }

        hasher.update(&buffer[..bytes_read]);
    }

    Ok(hex::encode(hasher.finalize()))
}
