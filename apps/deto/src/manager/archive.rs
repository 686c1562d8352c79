//! Archive extraction for deto artifacts.
//!
//! Artifacts are gzip-compressed tar archives. They are unpacked in a single
//! streaming pass into `<root>/<candidate>/<version>/`.
//!
//! Every entry is checked before anything is written for it:
//! - its stored name must not contain a `..` component, and
//! - the lexically normalized target path must be a strict descendant of the
//!   normalized destination root.
//!
//! The second check is the authoritative one; the first rejects obviously
//! hostile names early with a precise message. Entries that are neither
//! directories nor regular files (symlinks, devices, ...) are skipped with a
//! warning.
//!
//! Extraction is not transactional. A failure partway through leaves the
//! entries written so far in place.

use std::fs::File;
use std::io;
use std::path::{Component, Path, PathBuf};

use anyhow::{Context, Result};
use flate2::read::GzDecoder;
use tar::{Archive, EntryType};

use super::DetoPaths;
use crate::errors::DetoError;

/// The only archive suffix deto knows how to unpack.
const TAR_GZ_SUFFIX: &str = ".tar.gz";

/// Unpacks artifacts into the versioned install tree.
#[derive(Debug, Clone)]
pub struct ArchiveExtractor {
    paths: DetoPaths,
}

impl ArchiveExtractor {
    /// Creates an extractor rooted at `paths.root`.
    #[must_use]
    pub fn new(paths: DetoPaths) -> Self {
        Self { paths }
    }

    /// Extracts `archive_path` into `<root>/<candidate>/<version>` and returns
    /// that directory.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The archive name does not end in `.tar.gz` (`UnsupportedFormat`)
    /// - An entry would escape the destination (`UnsafeArchiveEntry`)
    /// - The archive is not valid gzip/tar data
    /// - Directory or file creation fails
    pub fn extract(&self, archive_path: &Path, candidate: &str, version: &str) -> Result<PathBuf> {
        let name = archive_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        if !name.ends_with(TAR_GZ_SUFFIX) {
            return Err(DetoError::unsupported_format(name).into());
        }

        let dest_dir = self.paths.version_dir(candidate, version);
        extract_tar_gz(archive_path, &dest_dir)?;
        Ok(dest_dir)
    }
}

/// Extracts a tar.gz archive into `dest_dir`, creating it if needed.
///
/// # Errors
///
/// See [`ArchiveExtractor::extract`].
pub fn extract_tar_gz(archive_path: &Path, dest_dir: &Path) -> Result<()> {
    std::fs::create_dir_all(dest_dir)
        .with_context(|| format!("Failed to create directory: {}", dest_dir.display()))?;

    let root = normalize(
        &std::path::absolute(dest_dir)
            .with_context(|| format!("Failed to resolve {}", dest_dir.display()))?,
    );

    let file = File::open(archive_path)
        .with_context(|| format!("Failed to open archive: {}", archive_path.display()))?;
    let mut archive = Archive::new(GzDecoder::new(file));

    for entry in archive
        .entries()
        .with_context(|| format!("Failed to read tar entries: {}", archive_path.display()))?
    {
        let mut entry = entry
            .with_context(|| format!("Failed to read tar entry: {}", archive_path.display()))?;

        let stored = entry
            .path()
            .context("Failed to get entry path")?
            .into_owned();
        let entry_type = entry.header().entry_type();

        let Some(target) = resolve_target(&root, &stored, entry_type.is_dir())? else {
            continue;
        };

        match entry_type {
            EntryType::Directory => {
                log::debug!("creating {}", target.display());
                std::fs::create_dir_all(&target)
                    .with_context(|| format!("Failed to create directory: {}", target.display()))?;
            }
            EntryType::Regular | EntryType::Continuous => {
                if let Some(parent) = target.parent() {
                    std::fs::create_dir_all(parent).with_context(|| {
                        format!("Failed to create directory: {}", parent.display())
                    })?;
                }

                log::debug!("writing {}", target.display());
                let mut outfile = File::create(&target)
                    .with_context(|| format!("Failed to create file: {}", target.display()))?;
                io::copy(&mut entry, &mut outfile)
                    .with_context(|| format!("Failed to extract: {}", target.display()))?;

                apply_mode(&target, entry.header().mode().ok())?;
            }
            other => {
                log::warn!(
                    "skipping {} in {}: unsupported entry type {other:?}",
                    stored.display(),
                    archive_path.display()
                );
            }
        }
    }

    Ok(())
}

/// Maps a stored entry name onto the destination tree.
///
/// Returns `Ok(None)` for a directory entry that names the root itself
/// (typically `./`), which needs no work. Anything else that does not land
/// strictly inside `root` is rejected.
fn resolve_target(root: &Path, stored: &Path, is_dir: bool) -> Result<Option<PathBuf>> {
    let unsafe_entry = || DetoError::unsafe_archive_entry(stored.display().to_string());

    if stored
        .components()
        .any(|c| matches!(c, Component::ParentDir))
    {
        return Err(unsafe_entry().into());
    }

    let target = normalize(&root.join(stored));

    if target == root {
        return if is_dir {
            Ok(None)
        } else {
            Err(unsafe_entry().into())
        };
    }

    if !target.starts_with(root) {
        return Err(unsafe_entry().into());
    }

    Ok(Some(target))
}

/// Lexically normalizes a path: drops `.` components and folds `..` into the
/// preceding component. The filesystem is not consulted.
fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match out.components().next_back() {
                Some(Component::Normal(_)) => {
                    out.pop();
                }
                Some(Component::RootDir | Component::Prefix(_)) => {}
                _ => out.push(component),
            },
            other => out.push(other),
        }
    }
    out
}

#[cfg(unix)]
fn apply_mode(path: &Path, mode: Option<u32>) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    if let Some(mode) = mode {
        std::fs::set_permissions(path, std::fs::Permissions::from_mode(mode & 0o777))
            .with_context(|| format!("Failed to set permissions: {}", path.display()))?;
    }
    Ok(())
}

#[cfg(not(unix))]
#[allow(clippy::unnecessary_wraps)]
fn apply_mode(_path: &Path, _mode: Option<u32>) -> Result<()> {
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::Compression;
    use flate2::write::GzEncoder;
    use tar::{Builder, Header};

    /// Creates a temporary test directory with a unique name.
    fn temp_test_dir(name: &str) -> PathBuf {
        let dir =
            std::env::temp_dir().join(format!("deto_test_{}_{}", name, rand::random::<u64>()));
        std::fs::create_dir_all(&dir).expect("Should create temp dir");
        dir
    }

    fn file_header(size: usize, mode: u32) -> Header {
        let mut header = Header::new_gnu();
        header.set_size(size as u64);
        header.set_mode(mode);
        header.set_entry_type(EntryType::Regular);
        header.set_cksum();
        header
    }

    /// Writes a raw entry name into the header, bypassing the `tar` crate's
    /// own `..` guard so hostile archives can be built.
    fn raw_name_header(name: &str, size: usize, entry_type: EntryType) -> Header {
        let mut header = Header::new_old();
        {
            let bytes = &mut header.as_old_mut().name;
            bytes[..name.len()].copy_from_slice(name.as_bytes());
        }
        header.set_size(size as u64);
        header.set_mode(0o644);
        header.set_entry_type(entry_type);
        header.set_cksum();
        header
    }

    fn finish(builder: Builder<GzEncoder<File>>) {
        builder
            .into_inner()
            .expect("Should finish tar")
            .finish()
            .expect("Should finish gzip");
    }

    /// Creates a jdk-like tar.gz archive.
    fn create_jdk_archive(archive_path: &Path) {
        let file = File::create(archive_path).expect("Should create file");
        let mut builder = Builder::new(GzEncoder::new(file, Compression::default()));

        let mut header = Header::new_gnu();
        header.set_entry_type(EntryType::Directory);
        header.set_mode(0o755);
        header.set_size(0);
        header.set_cksum();
        builder
            .append_data(&mut header, "jdk-17.0.1/", io::empty())
            .expect("Should append dir");

        let mut header = file_header(14, 0o755);
        builder
            .append_data(
                &mut header,
                "jdk-17.0.1/bin/java",
                b"binary content".as_slice(),
            )
            .expect("Should append file");

        let mut header = file_header(15, 0o644);
        builder
            .append_data(
                &mut header,
                "jdk-17.0.1/lib/modules",
                b"library content".as_slice(),
            )
            .expect("Should append file");

        finish(builder);
    }

    fn create_archive_with_raw_entry(archive_path: &Path, name: &str, entry_type: EntryType) {
        let file = File::create(archive_path).expect("Should create file");
        let mut builder = Builder::new(GzEncoder::new(file, Compression::default()));

        let mut header = file_header(4, 0o644);
        builder
            .append_data(&mut header, "ok.txt", b"fine".as_slice())
            .expect("Should append file");

        let payload = b"pwned";
        let header = raw_name_header(name, payload.len(), entry_type);
        builder
            .append(&header, payload.as_slice())
            .expect("Should append raw entry");

        finish(builder);
    }

    #[test]
    fn extract_unpacks_into_candidate_version_dir() {
        let temp_dir = temp_test_dir("extract_ok");
        let archive_path = temp_dir.join("jdk.tar.gz");
        create_jdk_archive(&archive_path);

        let extractor = ArchiveExtractor::new(DetoPaths::with_root(temp_dir.join("root")));
        let dest = extractor
            .extract(&archive_path, "java", "17.0.1")
            .expect("Should extract");

        assert_eq!(dest, temp_dir.join("root").join("java").join("17.0.1"));
        assert_eq!(
            std::fs::read(dest.join("jdk-17.0.1/bin/java")).expect("read"),
            b"binary content"
        );
        assert!(dest.join("jdk-17.0.1/lib/modules").is_file());

        let _ = std::fs::remove_dir_all(&temp_dir);
    }

    #[cfg(unix)]
    #[test]
    fn extract_preserves_executable_bits() {
        use std::os::unix::fs::PermissionsExt;

        let temp_dir = temp_test_dir("extract_mode");
        let archive_path = temp_dir.join("jdk.tar.gz");
        create_jdk_archive(&archive_path);

        let extractor = ArchiveExtractor::new(DetoPaths::with_root(temp_dir.join("root")));
        let dest = extractor
            .extract(&archive_path, "java", "17.0.1")
            .expect("Should extract");

        let mode = std::fs::metadata(dest.join("jdk-17.0.1/bin/java"))
            .expect("metadata")
            .permissions()
            .mode();
        assert_eq!(mode & 0o111, 0o111);

        let _ = std::fs::remove_dir_all(&temp_dir);
    }

    #[test]
    fn extract_rejects_other_formats() {
        let temp_dir = temp_test_dir("extract_zip");
        let archive_path = temp_dir.join("jdk.zip");
        std::fs::write(&archive_path, b"PK").expect("write");

        let extractor = ArchiveExtractor::new(DetoPaths::with_root(temp_dir.join("root")));
        let err = extractor
            .extract(&archive_path, "java", "17.0.1")
            .expect_err("zip is not supported");

        assert!(matches!(
            err.downcast_ref::<DetoError>(),
            Some(DetoError::UnsupportedFormat { name }) if name == "jdk.zip"
        ));
        assert!(!temp_dir.join("root").join("java").exists());

        let _ = std::fs::remove_dir_all(&temp_dir);
    }

    #[test]
    fn extract_rejects_parent_traversal_without_writing_outside() {
        let temp_dir = temp_test_dir("extract_traversal");
        let archive_path = temp_dir.join("evil.tar.gz");
        create_archive_with_raw_entry(&archive_path, "../../escaped.txt", EntryType::Regular);

        let extractor = ArchiveExtractor::new(DetoPaths::with_root(temp_dir.join("root")));
        let err = extractor
            .extract(&archive_path, "java", "17.0.1")
            .expect_err("traversal must be rejected");

        assert!(matches!(
            err.downcast_ref::<DetoError>(),
            Some(DetoError::UnsafeArchiveEntry { .. })
        ));
        assert!(!temp_dir.join("root").join("escaped.txt").exists());
        assert!(!temp_dir.join("escaped.txt").exists());

        let _ = std::fs::remove_dir_all(&temp_dir);
    }

    #[test]
    fn extract_rejects_embedded_traversal() {
        let temp_dir = temp_test_dir("extract_embedded");
        let archive_path = temp_dir.join("evil.tar.gz");
        create_archive_with_raw_entry(&archive_path, "bin/../../x.txt", EntryType::Regular);

        let extractor = ArchiveExtractor::new(DetoPaths::with_root(temp_dir.join("root")));
        let result = extractor.extract(&archive_path, "java", "17.0.1");

        assert!(result.is_err());
        assert!(!temp_dir.join("root").join("java").join("x.txt").exists());

        let _ = std::fs::remove_dir_all(&temp_dir);
    }

    #[test]
    fn extract_rejects_absolute_entry() {
        let temp_dir = temp_test_dir("extract_absolute");
        let archive_path = temp_dir.join("evil.tar.gz");
        let outside = temp_dir.join("absolute.txt");
        create_archive_with_raw_entry(
            &archive_path,
            &outside.to_string_lossy(),
            EntryType::Regular,
        );

        let extractor = ArchiveExtractor::new(DetoPaths::with_root(temp_dir.join("root")));
        let err = extractor
            .extract(&archive_path, "java", "17.0.1")
            .expect_err("absolute names must be rejected");

        assert!(matches!(
            err.downcast_ref::<DetoError>(),
            Some(DetoError::UnsafeArchiveEntry { .. })
        ));
        assert!(!outside.exists());

        let _ = std::fs::remove_dir_all(&temp_dir);
    }

    #[test]
    fn extract_skips_symlinks() {
        let temp_dir = temp_test_dir("extract_symlink");
        let archive_path = temp_dir.join("links.tar.gz");
        {
            let file = File::create(&archive_path).expect("Should create file");
            let mut builder = Builder::new(GzEncoder::new(file, Compression::default()));

            let mut header = file_header(4, 0o644);
            builder
                .append_data(&mut header, "real.txt", b"data".as_slice())
                .expect("Should append file");

            let mut header = Header::new_gnu();
            header.set_entry_type(EntryType::Symlink);
            header.set_size(0);
            builder
                .append_link(&mut header, "link.txt", "/etc/passwd")
                .expect("Should append link");

            finish(builder);
        }

        let extractor = ArchiveExtractor::new(DetoPaths::with_root(temp_dir.join("root")));
        let dest = extractor
            .extract(&archive_path, "go", "1.22.0")
            .expect("Symlinks are skipped, not fatal");

        assert!(dest.join("real.txt").is_file());
        assert!(dest.join("link.txt").symlink_metadata().is_err());

        let _ = std::fs::remove_dir_all(&temp_dir);
    }

    #[test]
    fn resolve_target_skips_root_directory_entry() {
        let root = Path::new("/opt/deto/java/17");
        assert_eq!(
            resolve_target(root, Path::new("./"), true).expect("root dir is fine"),
            None
        );
        assert!(resolve_target(root, Path::new("."), false).is_err());
        assert_eq!(
            resolve_target(root, Path::new("./bin/java"), false).expect("inside"),
            Some(PathBuf::from("/opt/deto/java/17/bin/java"))
        );
    }

    #[test]
    fn resolve_target_rejects_sibling_prefix() {
        let root = Path::new("/opt/deto/java/17");
        assert!(resolve_target(root, Path::new("/opt/deto/java/170/x"), false).is_err());
    }

    #[test]
    fn normalize_folds_dots() {
        assert_eq!(
            normalize(Path::new("/a/b/./c/../d")),
            PathBuf::from("/a/b/d")
        );
        assert_eq!(normalize(Path::new("/a/../../b")), PathBuf::from("/b"));
    }
}
