//! The copy step shared by every collision policy.

use super::CopyPermissions;
use crate::error::ImportError;
use std::fs;
use std::io;
use std::path::Path;
use tracing::{debug, info, warn};

/// Copy `source` to `target`, or only log the copy when `dry_run` is set.
///
/// Checks run in this order, and a failing check leaves the filesystem
/// untouched:
/// 1. `target` must not be an existing directory
/// 2. an existing `target` needs `allow_overwrite`
/// 3. a dry run stops here
/// 4. a locked repository refuses the copy
pub(super) fn copy_into(
    source: &Path,
    target: &Path,
    permissions: &CopyPermissions,
    dry_run: bool,
) -> Result<(), ImportError> {
    if target.is_dir() {
        return Err(ImportError::DestinationIsDirectory {
            path: target.to_path_buf(),
        });
    }

    if target.exists() && !permissions.allow_overwrite {
        return Err(ImportError::OverwriteNotPermitted {
            path: target.to_path_buf(),
        });
    }

    if dry_run {
        info!(
            source = %source.display(),
            target = %target.display(),
            "DRY COPY"
        );
        return Ok(());
    }

    if permissions.locked {
        return Err(ImportError::RepositoryLocked);
    }

    let io_err_at = |path: &Path, source: io::Error| ImportError::Io {
        path: path.to_path_buf(),
        source,
    };
    let io_err = |source: io::Error| io_err_at(target, source);

    if let Some(parent) = target.parent() {
        create_dir_tolerant(parent).map_err(io_err)?;
    }

    let source_size = fs::metadata(source)
        .map_err(|e| io_err_at(source, e))?
        .len();
    fs::copy(source, target).map_err(io_err)?;

    let target_size = fs::metadata(target).map_err(io_err)?.len();
    if target_size != source_size {
        let _ = fs::remove_file(target);
        return Err(io_err(io::Error::new(
            io::ErrorKind::Other,
            format!(
                "copy verification failed: source {} bytes, copy {} bytes",
                source_size, target_size
            ),
        )));
    }

    preserve_mtime(source, target);
    debug!(source = %source.display(), target = %target.display(), "copied");
    Ok(())
}

/// `create_dir_all` that accepts losing a creation race.
///
/// Any error is ignored when the directory exists afterwards; otherwise
/// the original error is returned unchanged.
fn create_dir_tolerant(dir: &Path) -> io::Result<()> {
    match fs::create_dir_all(dir) {
        Ok(()) => Ok(()),
        Err(_) if dir.is_dir() => Ok(()),
        Err(e) => Err(e),
    }
}

fn preserve_mtime(source: &Path, target: &Path) {
    let modified = match fs::metadata(source).and_then(|m| m.modified()) {
        Ok(modified) => modified,
        Err(_) => return,
    };
    if let Err(e) = filetime::set_file_mtime(target, filetime::FileTime::from_system_time(modified))
    {
        warn!(target = %target.display(), error = %e, "could not preserve modification time");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, SystemTime};
    use tempfile::TempDir;

    const OPEN: CopyPermissions = CopyPermissions {
        locked: false,
        allow_overwrite: false,
    };

    fn source(dir: &TempDir) -> std::path::PathBuf {
        let path = dir.path().join("a.jpg");
        fs::write(&path, b"jpeg bytes").unwrap();
        path
    }

    #[test]
    fn copies_and_creates_missing_directories() {
        let dir = TempDir::new().unwrap();
        let src = source(&dir);
        let target = dir.path().join("repo/2020/05/a.jpg");

        copy_into(&src, &target, &OPEN, false).unwrap();

        assert_eq!(fs::read(&target).unwrap(), b"jpeg bytes");
        assert!(src.exists());
    }

    #[test]
    fn keeps_source_modification_time() {
        let dir = TempDir::new().unwrap();
        let src = source(&dir);
        let old = SystemTime::now() - Duration::from_secs(86_400 * 365);
        filetime::set_file_mtime(&src, filetime::FileTime::from_system_time(old)).unwrap();
        let target = dir.path().join("repo/a.jpg");

        copy_into(&src, &target, &OPEN, false).unwrap();

        let copied = filetime::FileTime::from_last_modification_time(&fs::metadata(&target).unwrap());
        assert_eq!(copied.unix_seconds(), filetime::FileTime::from_system_time(old).unix_seconds());
    }

    #[test]
    fn dry_run_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let src = source(&dir);
        let target = dir.path().join("repo/2020/05/a.jpg");

        copy_into(&src, &target, &OPEN, true).unwrap();

        assert!(!dir.path().join("repo").exists());
    }

    #[test]
    fn locked_repository_refuses_before_creating_directories() {
        let dir = TempDir::new().unwrap();
        let src = source(&dir);
        let target = dir.path().join("repo/2020/05/a.jpg");
        let locked = CopyPermissions {
            locked: true,
            allow_overwrite: false,
        };

        let err = copy_into(&src, &target, &locked, false).unwrap_err();

        assert!(matches!(err, ImportError::RepositoryLocked));
        assert!(!dir.path().join("repo").exists());
    }

    #[test]
    fn locked_repository_still_allows_dry_runs() {
        let dir = TempDir::new().unwrap();
        let src = source(&dir);
        let target = dir.path().join("repo/a.jpg");
        let locked = CopyPermissions {
            locked: true,
            allow_overwrite: false,
        };

        assert!(copy_into(&src, &target, &locked, true).is_ok());
    }

    #[test]
    fn directory_at_target_is_an_error() {
        let dir = TempDir::new().unwrap();
        let src = source(&dir);
        let target = dir.path().join("repo/a.jpg");
        fs::create_dir_all(&target).unwrap();

        let err = copy_into(&src, &target, &OPEN, true).unwrap_err();
        assert!(matches!(err, ImportError::DestinationIsDirectory { .. }));
    }

    #[test]
    fn existing_target_needs_overwrite_permission() {
        let dir = TempDir::new().unwrap();
        let src = source(&dir);
        let target = dir.path().join("existing.jpg");
        fs::write(&target, b"old").unwrap();

        let err = copy_into(&src, &target, &OPEN, false).unwrap_err();
        assert!(matches!(err, ImportError::OverwriteNotPermitted { .. }));
        assert_eq!(fs::read(&target).unwrap(), b"old");

        let permissive = CopyPermissions {
            locked: false,
            allow_overwrite: true,
        };
        copy_into(&src, &target, &permissive, false).unwrap();
        assert_eq!(fs::read(&target).unwrap(), b"jpeg bytes");
    }

    #[test]
    fn unreadable_source_is_named_in_the_error() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("gone.jpg");
        let target = dir.path().join("repo/gone.jpg");

        match copy_into(&missing, &target, &OPEN, false) {
            Err(ImportError::Io { path, .. }) => assert_eq!(path, missing),
            other => panic!("expected an I/O error, got {other:?}"),
        }
        assert!(!target.exists());
    }

    #[test]
    fn existing_directory_is_tolerated() {
        let dir = TempDir::new().unwrap();
        let existing = dir.path().join("2020/05");
        fs::create_dir_all(&existing).unwrap();

        assert!(create_dir_tolerant(&existing).is_ok());
    }

    #[test]
    fn file_in_the_way_of_a_directory_fails() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("2020");
        fs::write(&blocker, b"not a dir").unwrap();

        assert!(create_dir_tolerant(&blocker.join("05")).is_err());
    }
}
