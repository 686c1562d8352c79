//! Platform detection for the deto version manager.
//!
//! Registry documents key their builds by operating system name and tag each
//! build with an architecture string. Different providers spell architectures
//! differently (Go publishes `amd64`, Adoptium publishes `x64`), so matching is
//! done through alias groups rather than string equality.

use std::fmt;

/// Architecture spellings treated as the same machine.
const ARCH_ALIASES: [&[&str]; 6] = [
    &["x86_64", "amd64", "x64"],
    &["aarch64", "arm64"],
    &["x86", "386", "i386", "i686", "x32"],
    &["arm", "armv6l", "armv7l"],
    &["powerpc64le", "ppc64le"],
    &["s390x"],
];

/// The operating system and architecture of the host, in registry spelling.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Platform {
    os: &'static str,
    arch: &'static str,
}

impl Platform {
    /// Creates a platform from explicit registry keys.
    #[must_use]
    pub const fn new(os: &'static str, arch: &'static str) -> Self {
        Self { os, arch }
    }

    /// Detects the host platform from compile-time configuration.
    ///
    /// Rust's `macos` is reported as `darwin`, which is the key registry
    /// documents use for Apple systems.
    #[must_use]
    pub fn detect() -> Self {
        let os = match std::env::consts::OS {
            "macos" => "darwin",
            other => other,
        };
        Self::new(os, std::env::consts::ARCH)
    }

    /// Returns the registry key for the operating system.
    #[must_use = "returns the OS string without side effects"]
    pub fn os(self) -> &'static str {
        self.os
    }

    /// Returns the host architecture as reported by the compiler.
    #[must_use = "returns the architecture string without side effects"]
    pub fn arch(self) -> &'static str {
        self.arch
    }

    /// Checks whether a registry architecture tag describes this host.
    ///
    /// Empty tags are treated as architecture-neutral and always match.
    #[must_use]
    pub fn matches_architecture(self, tag: &str) -> bool {
        let tag = tag.trim();
        if tag.is_empty() || tag.eq_ignore_ascii_case(self.arch) {
            return true;
        }
        ARCH_ALIASES.iter().any(|group| {
            group.iter().any(|a| a.eq_ignore_ascii_case(self.arch))
                && group.iter().any(|a| a.eq_ignore_ascii_case(tag))
        })
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.os, self.arch)
    }
}
