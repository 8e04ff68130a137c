//! Backup guard and atomic store writes.
//!
//! Before the store is rewritten, the current file is copied to a single,
//! deterministically named backup beside it (`<stem><suffix>.<ext>`). The new
//! content then goes to a temp file that is renamed over the store.

use std::io::Write;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use tempfile::NamedTempFile;
use tfasync_shared::{Result, SyncError};
use tracing::{debug, info, instrument};

/// What [`guarded_write`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOutcome {
    /// The new content matched the file byte for byte: no backup, no write.
    Unchanged { digest: String },
    Written {
        /// `None` when there was no previous file to snapshot.
        backup: Option<PathBuf>,
        previous_digest: Option<String>,
        digest: String,
    },
}

/// Hex SHA-256 of `bytes`.
pub fn digest(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    format!("{:x}", hasher.finalize())
}

/// `stix/tfa-attack.json` + `-pre-sync` -> `stix/tfa-attack-pre-sync.json`.
pub fn backup_path(store_path: &Path, suffix: &str) -> PathBuf {
    let stem = store_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = match store_path.extension() {
        Some(ext) => format!("{stem}{suffix}.{}", ext.to_string_lossy()),
        None => format!("{stem}{suffix}"),
    };
    store_path.with_file_name(name)
}

/// Write `contents` to a sibling temp file, sync it, then rename it over `path`.
///
/// The temp file is removed again if any step fails.
pub fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    let parent = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };

    let mut temp = NamedTempFile::new_in(parent).map_err(|e| SyncError::io(parent, e))?;
    temp.write_all(contents)
        .map_err(|e| SyncError::io(temp.path(), e))?;
    temp.as_file()
        .sync_all()
        .map_err(|e| SyncError::io(temp.path(), e))?;
    temp.persist(path).map_err(|e| SyncError::io(path, e.error))?;

    debug!(path = %path.display(), size = contents.len(), "wrote file atomically");
    Ok(())
}

/// Snapshot the current store, then replace it with `contents`.
///
/// Skips both steps when `contents` is byte-identical to what is on disk, so
/// a no-op sync leaves the previous backup untouched.
#[instrument(skip_all, fields(path = %store_path.display()))]
pub fn guarded_write(store_path: &Path, suffix: &str, contents: &str) -> Result<WriteOutcome> {
    let new_digest = digest(contents.as_bytes());

    let previous = match std::fs::read(store_path) {
        Ok(bytes) => Some(bytes),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
        Err(e) => return Err(SyncError::io(store_path, e)),
    };
    let previous_digest = previous.as_deref().map(digest);

    if previous_digest.as_deref() == Some(new_digest.as_str()) {
        info!(digest = %new_digest, "store unchanged, skipping write");
        return Ok(WriteOutcome::Unchanged { digest: new_digest });
    }

    let backup = match previous {
        Some(_) => {
            let backup = backup_path(store_path, suffix);
            std::fs::copy(store_path, &backup).map_err(|e| SyncError::io(&backup, e))?;
            info!(backup = %backup.display(), "store snapshot taken");
            Some(backup)
        }
        None => None,
    };

    write_atomic(store_path, contents.as_bytes())?;
    info!(
        previous = previous_digest.as_deref().unwrap_or("none"),
        digest = %new_digest,
        "store written"
    );

    Ok(WriteOutcome::Written {
        backup,
        previous_digest,
        digest: new_digest,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backup_name_keeps_extension() {
        assert_eq!(
            backup_path(Path::new("stix/tfa-attack.json"), "-pre-sync"),
            PathBuf::from("stix/tfa-attack-pre-sync.json")
        );
        assert_eq!(
            backup_path(Path::new("store"), ".bak"),
            PathBuf::from("store.bak")
        );
    }

    #[test]
    fn digest_is_hex_sha256() {
        assert_eq!(
            digest(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn guarded_write_snapshots_previous_content() {
        let dir = tempfile::tempdir().unwrap();
        let store = dir.path().join("tfa-attack.json");
        std::fs::write(&store, "old").unwrap();

        let outcome = guarded_write(&store, "-pre-sync", "new").unwrap();
        let backup = dir.path().join("tfa-attack-pre-sync.json");
        assert_eq!(
            outcome,
            WriteOutcome::Written {
                backup: Some(backup.clone()),
                previous_digest: Some(digest(b"old")),
                digest: digest(b"new"),
            }
        );
        assert_eq!(std::fs::read_to_string(&store).unwrap(), "new");
        assert_eq!(std::fs::read_to_string(&backup).unwrap(), "old");
        let names: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(names.len(), 2, "stray files: {names:?}");
    }

    #[test]
    fn unchanged_content_skips_backup() {
        let dir = tempfile::tempdir().unwrap();
        let store = dir.path().join("tfa-attack.json");
        std::fs::write(&store, "same").unwrap();

        let outcome = guarded_write(&store, "-pre-sync", "same").unwrap();
        assert!(matches!(outcome, WriteOutcome::Unchanged { .. }));
        assert!(!dir.path().join("tfa-attack-pre-sync.json").exists());
    }

    #[test]
    fn backup_is_single_generation() {
        let dir = tempfile::tempdir().unwrap();
        let store = dir.path().join("s.json");
        std::fs::write(&store, "v1").unwrap();
        guarded_write(&store, "-pre-sync", "v2").unwrap();
        guarded_write(&store, "-pre-sync", "v3").unwrap();
        assert_eq!(std::fs::read_to_string(dir.path().join("s-pre-sync.json")).unwrap(), "v2");
    }

    #[test]
    fn failed_replace_leaves_no_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("store.json");
        std::fs::create_dir(&target).unwrap();
        std::fs::write(target.join("keep"), "x").unwrap();

        let err = write_atomic(&target, b"{}").unwrap_err();
        assert!(matches!(err, SyncError::Io { .. }));

        let names: Vec<_> = std::fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from("store.json")]);
    }
}
