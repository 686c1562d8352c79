#![warn(clippy::pedantic)]

//! Integration tests for the deto CLI.
//!
//! These tests spawn the compiled `deto` binary and validate its behavior
//! through stdout, stderr, exit codes and the files it leaves under an
//! isolated `DETO_HOME`.
//!
//! ## Test Strategy
//!
//! 1. **Help and version**: CLI metadata display
//! 2. **Argument handling**: unsupported actions, missing input without prompts
//! 3. **List action**: empty state, current version marker
//! 4. **Default action**: switching, rejecting versions that are not installed
//! 5. **Remove action**: directory and manifest cleanup
//! 6. **Install action**: full pipeline against a local registry
//!
//! ## Test Infrastructure
//!
//! - Uses `assert_cmd` for spawning and asserting on command execution
//! - Uses `assert_fs` for temporary root directories
//! - Uses `predicates` for flexible output matching
//! - Uses `httpmock` to serve registry documents and artifacts
//!
//! Every command runs with `DETO_NO_TUI` set so nothing waits for input.

use assert_cmd::prelude::*;
use assert_fs::prelude::*;
use deto::manager::Platform;
use flate2::Compression;
use flate2::write::GzEncoder;
use httpmock::prelude::*;
use predicates::prelude::*;
use sha2::{Digest, Sha256};
use std::process::Command;

/// Builds a `deto` command isolated under `home`.
fn deto(home: &std::path::Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("deto"));
    cmd.env("DETO_HOME", home)
        .env("DETO_NO_TUI", "1")
        .env("DETO_REGISTRY_URL", "http://127.0.0.1:9/registry")
        .env_remove("DETO_LOG");
    cmd
}

/// Manifest with two java versions, the second one current.
const TWO_JAVA_VERSIONS: &str = r#"[
  {"candidate": "java", "versions": ["17.0.1", "21.0.2"], "current": "21.0.2"}
]"#;

fn read_manifest(temp: &assert_fs::TempDir) -> serde_json::Value {
    let content =
        std::fs::read_to_string(temp.path().join("config.json")).expect("manifest exists");
    serde_json::from_str(&content).expect("manifest is JSON")
}

/// A small JDK-like `.tar.gz` and its SHA-256.
fn jdk_fixture() -> (Vec<u8>, String) {
    let mut builder = tar::Builder::new(GzEncoder::new(Vec::new(), Compression::default()));
    let payload = b"#!/bin/sh\necho java\n";
    let mut header = tar::Header::new_gnu();
    header.set_size(payload.len() as u64);
    header.set_mode(0o755);
    header.set_cksum();
    builder
        .append_data(&mut header, "bin/java", &payload[..])
        .expect("append");
    let bytes = builder
        .into_inner()
        .expect("tar")
        .finish()
        .expect("gzip");
    let digest = hex::encode(Sha256::digest(&bytes));
    (bytes, digest)
}

// -----------------------------------------------------------------------------
// Help and Version
// -----------------------------------------------------------------------------

/// Verifies that `deto --help` lists the `man` subcommand.
#[test]
fn help_shows_man_command() {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("deto"));
    cmd.arg("--help");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("man"))
        .stdout(predicate::str::contains("DETO_HOME"));
}

/// Verifies that `deto man --help` documents every flag.
#[test]
fn man_help_shows_options() {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("deto"));
    cmd.args(["man", "--help"]);

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("--action"))
        .stdout(predicate::str::contains("--candidate"))
        .stdout(predicate::str::contains("--version"))
        .stdout(predicate::str::contains("--all-architectures"));
}

/// Verifies that `deto --version` prints the package version.
#[test]
fn version_flag_shows_version() {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("deto"));
    cmd.arg("--version");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains(env!("CARGO_PKG_VERSION")));
}

// -----------------------------------------------------------------------------
// Argument Handling
// -----------------------------------------------------------------------------

/// **Expected behavior**: Unknown actions exit with code 1.
#[test]
fn unsupported_action_fails() {
    let temp = assert_fs::TempDir::new().unwrap();

    deto(temp.path())
        .args(["man", "-a", "upgrade", "-c", "java"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("unsupported action: upgrade"));
}

/// **Expected behavior**: Without prompts, a missing action is an argument error.
#[test]
fn missing_action_without_prompts_fails() {
    let temp = assert_fs::TempDir::new().unwrap();

    deto(temp.path())
        .args(["man", "-c", "java"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("invalid arguments"));
}

/// **Expected behavior**: Without prompts, a missing candidate is an argument error.
#[test]
fn missing_candidate_without_prompts_fails() {
    let temp = assert_fs::TempDir::new().unwrap();

    deto(temp.path())
        .args(["man", "-a", "list"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("invalid arguments"));
}

/// **Expected behavior**: Candidate names that would leave the root are rejected.
#[test]
fn traversal_candidate_is_rejected() {
    let temp = assert_fs::TempDir::new().unwrap();

    deto(temp.path())
        .args(["man", "-a", "list", "-c", "../etc"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("invalid candidate name"));
}

// -----------------------------------------------------------------------------
// List Action
// -----------------------------------------------------------------------------

/// **Expected behavior**: Listing with no manifest succeeds with a hint.
#[test]
fn list_empty_shows_message() {
    let temp = assert_fs::TempDir::new().unwrap();

    deto(temp.path())
        .args(["man", "-a", "list", "-c", "java"])
        .assert()
        .success()
        .stdout(predicate::str::contains("No versions of java installed"));
}

/// **Expected behavior**: Two rows, only the second marked current.
#[test]
fn list_marks_current_version() {
    let temp = assert_fs::TempDir::new().unwrap();
    temp.child("config.json")
        .write_str(TWO_JAVA_VERSIONS)
        .unwrap();

    let output = deto(temp.path())
        .args(["man", "-a", "list", "-c", "java"])
        .output()
        .expect("runs");
    assert!(output.status.success());

    let stdout = String::from_utf8_lossy(&output.stdout);
    let rows: Vec<&str> = stdout
        .lines()
        .filter(|line| line.starts_with("17.0.1") || line.starts_with("21.0.2"))
        .collect();

    assert_eq!(rows.len(), 2, "unexpected output:\n{stdout}");
    assert!(!rows[0].contains('*'));
    assert!(rows[1].ends_with('*'));
}

/// **Expected behavior**: A corrupt manifest is reported, not overwritten.
#[test]
fn list_reports_corrupt_manifest() {
    let temp = assert_fs::TempDir::new().unwrap();
    temp.child("config.json").write_str("{ not json").unwrap();

    deto(temp.path())
        .args(["man", "-a", "list", "-c", "java"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("corrupt manifest"));

    temp.child("config.json").assert("{ not json");
}

// -----------------------------------------------------------------------------
// Default Action
// -----------------------------------------------------------------------------

/// **Expected behavior**: The manifest's current version changes.
#[test]
fn default_switches_current_version() {
    let temp = assert_fs::TempDir::new().unwrap();
    temp.child("config.json")
        .write_str(TWO_JAVA_VERSIONS)
        .unwrap();

    deto(temp.path())
        .args(["man", "-a", "default", "-c", "java", "-v", "17.0.1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("set to 17.0.1"));

    assert_eq!(read_manifest(&temp)[0]["current"], "17.0.1");
}

/// **Expected behavior**: Unknown versions fail and leave the manifest untouched.
#[test]
fn default_rejects_version_not_installed() {
    let temp = assert_fs::TempDir::new().unwrap();
    temp.child("config.json")
        .write_str(TWO_JAVA_VERSIONS)
        .unwrap();

    deto(temp.path())
        .args(["man", "-a", "default", "-c", "java", "-v", "8"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("java 8 is not installed"));

    temp.child("config.json").assert(TWO_JAVA_VERSIONS);
}

// -----------------------------------------------------------------------------
// Remove Action
// -----------------------------------------------------------------------------

/// **Expected behavior**: The version directory is deleted, the manifest
/// drops the version and the remaining one becomes current.
#[test]
fn remove_deletes_directory_and_moves_current() {
    let temp = assert_fs::TempDir::new().unwrap();
    temp.child("config.json")
        .write_str(TWO_JAVA_VERSIONS)
        .unwrap();
    temp.child("java/17.0.1/bin/java").write_str("old").unwrap();
    temp.child("java/21.0.2/bin/java").write_str("new").unwrap();

    deto(temp.path())
        .args(["man", "-a", "remove", "-c", "java", "-v", "21.0.2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("changed to 17.0.1"));

    temp.child("java/21.0.2").assert(predicate::path::missing());
    temp.child("java/17.0.1/bin/java").assert("old");

    let manifest = read_manifest(&temp);
    assert_eq!(manifest[0]["versions"], serde_json::json!(["17.0.1"]));
    assert_eq!(manifest[0]["current"], "17.0.1");
}

/// **Expected behavior**: A hand-edited manifest entry that is not a plain
/// directory name is refused and nothing is deleted.
#[test]
fn remove_refuses_traversal_version_from_manifest() {
    let temp = assert_fs::TempDir::new().unwrap();
    let manifest = r#"[{"candidate": "java", "versions": [".."], "current": ".."}]"#;
    temp.child("config.json").write_str(manifest).unwrap();
    temp.child("java/17.0.1/bin/java").write_str("old").unwrap();

    deto(temp.path())
        .args(["man", "-a", "remove", "-c", "java", "-v", ".."])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("invalid arguments"));

    temp.child("java/17.0.1/bin/java").assert("old");
    temp.child("config.json").assert(manifest);
}

/// **Expected behavior**: Removing an unknown version fails.
#[test]
fn remove_nonexistent_shows_message() {
    let temp = assert_fs::TempDir::new().unwrap();

    deto(temp.path())
        .args(["man", "-a", "remove", "-c", "go", "-v", "1.22.0"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("not installed"));
}

// -----------------------------------------------------------------------------
// Install Action
// -----------------------------------------------------------------------------

/// **Test setup**: A local registry lists one build for the host OS; the
/// artifact is served by the same mock server.
///
/// **Expected behavior**: The archive is unpacked under `java/17.0.1`, the
/// manifest records it as current and the download is cleaned up.
#[test]
fn install_from_local_registry() {
    let temp = assert_fs::TempDir::new().unwrap();
    let (archive, checksum) = jdk_fixture();
    let server = MockServer::start();

    server.mock(|when, then| {
        when.method(GET).path("/artifacts/jdk.tar.gz");
        then.status(200).body(archive.clone());
    });
    let mut document = serde_json::Map::new();
    document.insert(
        Platform::detect().os().to_string(),
        serde_json::json!([{
            "version": "17.0.1",
            "architecture": "",
            "name": "jdk.tar.gz",
            "checksum": checksum,
            "provider": "Adoptium",
            "is_lts": true,
            "link": server.url("/artifacts/jdk.tar.gz"),
        }]),
    );
    let document = serde_json::Value::Object(document);
    server.mock(|when, then| {
        when.method(GET).path("/registry/java_versions.json");
        then.status(200).body(document.to_string());
    });

    deto(temp.path())
        .env("DETO_REGISTRY_URL", server.url("/registry"))
        .args(["man", "-a", "install", "-c", "java", "-v", "17.0.1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("installed successfully"));

    temp.child("java/17.0.1/bin/java")
        .assert(predicate::str::contains("echo java"));
    temp.child("downloads/jdk.tar.gz")
        .assert(predicate::path::missing());
    assert_eq!(
        read_manifest(&temp),
        serde_json::json!([
            {"candidate": "java", "versions": ["17.0.1"], "current": "17.0.1"}
        ])
    );
}

/// **Expected behavior**: A 404 from the registry is reported as an unknown
/// candidate and nothing is recorded.
#[test]
fn install_unknown_candidate_fails() {
    let temp = assert_fs::TempDir::new().unwrap();
    let server = MockServer::start();
    server.mock(|when, then| {
        when.method(GET).path("/registry/cobol_versions.json");
        then.status(404);
    });

    deto(temp.path())
        .env("DETO_REGISTRY_URL", server.url("/registry"))
        .args(["man", "-a", "install", "-c", "cobol"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("candidate not found in registry: cobol"));

    temp.child("config.json").assert(predicate::path::missing());
}

/// **Expected behavior**: An unreachable registry exits with code 1, no panic.
#[test]
fn install_without_network_shows_error() {
    let temp = assert_fs::TempDir::new().unwrap();

    deto(temp.path())
        .args(["man", "-a", "install", "-c", "java", "-v", "17.0.1"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("registry unavailable"));
}
