//! Remote registry access for the deto version manager.
//!
//! Each candidate has one JSON document on the registry server, keyed by
//! operating system:
//!
//! ```json
//! {
//!   "linux": [
//!     {
//!       "version": "17.0.1",
//!       "architecture": "x64",
//!       "name": "OpenJDK17U-jdk_x64_linux_hotspot_17.0.1_12.tar.gz",
//!       "checksum": "abc123...",
//!       "provider": "Adoptium",
//!       "is_lts": true,
//!       "link": "https://github.com/adoptium/..."
//!     }
//!   ],
//!   "windows": [ ... ]
//! }
//! ```
//!
//! The document is fetched fresh on every call and never cached. The base URL
//! can be overridden via the `DETO_REGISTRY_URL` environment variable for
//! testing or when using a mirror.

use std::collections::HashMap;

use anyhow::{Context, Result};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};

use crate::errors::DetoError;

/// Environment variable to override the registry base URL.
pub const REGISTRY_URL_ENV: &str = "DETO_REGISTRY_URL";

/// Default registry base URL.
pub const DEFAULT_REGISTRY_URL: &str = "https://raw.githubusercontent.com/halng/deto/main/registry";

/// User-Agent header for registry requests.
const USER_AGENT: &str = concat!("deto/", env!("CARGO_PKG_VERSION"));

/// One installable artifact as advertised by the registry.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RegistryEntry {
    /// Version string (e.g. `"17.0.1"`).
    pub version: String,
    /// Architecture tag as published by the provider (`x64`, `amd64`, ...).
    pub architecture: String,
    /// Artifact file name.
    pub name: String,
    /// Hex digest of the artifact.
    pub checksum: String,
    /// Distribution vendor.
    pub provider: String,
    /// Whether the provider marks this release as long-term support.
    #[serde(rename = "is_lts")]
    pub is_lts: bool,
    /// Download URL.
    pub link: String,
}

impl RegistryEntry {
    /// One-line description used when offering the entry for selection.
    #[must_use]
    pub fn label(&self) -> String {
        let mut details: Vec<&str> = [self.architecture.as_str(), self.provider.as_str()]
            .into_iter()
            .filter(|s| !s.is_empty())
            .collect();
        if self.is_lts {
            details.push("LTS");
        }

        if details.is_empty() {
            self.version.clone()
        } else {
            format!("{} ({})", self.version, details.join(", "))
        }
    }
}

/// A registry document: OS name to the builds published for it.
pub type RegistryDocument = HashMap<String, Vec<RegistryEntry>>;

/// Fetches per-candidate documents from the registry server.
#[derive(Debug, Clone)]
pub struct RegistryClient {
    client: Client,
    base_url: String,
}

impl RegistryClient {
    /// Creates a client for the registry at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .context("Failed to create HTTP client")?;
        Ok(Self {
            client,
            base_url: base_url.into(),
        })
    }

    /// Returns the document URL for a candidate.
    #[must_use]
    pub fn candidate_url(&self, candidate: &str) -> String {
        format!(
            "{}/{candidate}_versions.json",
            self.base_url.trim_end_matches('/')
        )
    }

    /// Fetches the builds published for `candidate` on `os`.
    ///
    /// The OS key is matched exactly (case-sensitive). A document without the
    /// key yields an empty list; that is not an error. Architecture is not
    /// filtered here.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The registry answers 404 (`CandidateNotFound`)
    /// - Any other non-200 status, transport failure or malformed body
    ///   (`RegistryUnavailable`)
    pub async fn fetch_entries(&self, candidate: &str, os: &str) -> Result<Vec<RegistryEntry>> {
        let url = self.candidate_url(candidate);
        log::debug!("fetching registry document {url}");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| DetoError::registry_unavailable(format!("failed to fetch {url}: {e}")))?;

        match response.status() {
            StatusCode::OK => {}
            StatusCode::NOT_FOUND => return Err(DetoError::candidate_not_found(candidate).into()),
            status => {
                return Err(
                    DetoError::registry_unavailable(format!("HTTP {status} from {url}")).into(),
                );
            }
        }

        let body = response.text().await.map_err(|e| {
            DetoError::registry_unavailable(format!("failed to read body of {url}: {e}"))
        })?;

        let mut document: RegistryDocument = serde_json::from_str(&body).map_err(|e| {
            DetoError::registry_unavailable(format!("malformed registry document {url}: {e}"))
        })?;

        let entries = document.remove(os).unwrap_or_default();
        log::debug!("{} {candidate} build(s) listed for {os}", entries.len());
        Ok(entries)
    }
}
