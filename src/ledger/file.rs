use std::fs;
use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;

use super::Ledger;
use crate::error::ShortenError;

/// Read and parse the ledger at `path`.
///
/// # Errors
/// - [`ShortenError::LedgerNotFound`] if `path` is missing or not a regular file.
/// - [`ShortenError::ReadFailed`] on I/O failure.
/// - [`ShortenError::MalformedLine`] from parsing.
pub fn load(path: &Path) -> Result<Ledger, ShortenError> {
    if !path.is_file() {
        return Err(ShortenError::LedgerNotFound(path.to_path_buf()));
    }
    let txt = fs::read_to_string(path).map_err(|source| ShortenError::ReadFailed {
        path: path.to_path_buf(),
        source,
    })?;
    Ledger::parse(&txt)
}

/// Replace the ledger at `path` with the rendering of `ledger`.
///
/// The new content goes to a temporary file in the same directory which is
/// then renamed over `path`, so the original survives a failed write. The
/// original file's permissions are carried over. A symlinked ledger is
/// resolved first so the link stays in place and its target is replaced.
///
/// # Errors
/// [`ShortenError::WriteFailed`] if any step fails.
pub fn store(path: &Path, ledger: &Ledger) -> Result<(), ShortenError> {
    let fail = |source: std::io::Error| ShortenError::WriteFailed {
        path: path.to_path_buf(),
        source,
    };

    let resolved = fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
    let path = resolved.as_path();
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or(Path::new("."));
    let mut tmp = NamedTempFile::new_in(dir).map_err(fail)?;
    tmp.write_all(ledger.render().as_bytes()).map_err(fail)?;
    tmp.as_file().sync_all().map_err(fail)?;

    if let Ok(meta) = fs::metadata(path) {
        fs::set_permissions(tmp.path(), meta.permissions()).map_err(fail)?;
    }

    tmp.persist(path).map_err(|e| fail(e.error))?;
    tracing::debug!(path = %path.display(), entries = ledger.len(), "ledger written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::RedirectEntry;
    use tempfile::tempdir;

    #[test]
    fn load_missing_file_is_not_found() {
        let td = tempdir().unwrap();
        let err = load(&td.path().join("_redirects")).unwrap_err();
        assert!(matches!(err, ShortenError::LedgerNotFound(_)));
    }

    #[test]
    fn load_directory_is_not_found() {
        let td = tempdir().unwrap();
        let dir = td.path().join("_redirects");
        fs::create_dir(&dir).unwrap();
        assert!(matches!(load(&dir), Err(ShortenError::LedgerNotFound(_))));
    }

    #[test]
    fn store_replaces_contents_and_leaves_no_temp_files() {
        let td = tempdir().unwrap();
        let path = td.path().join("_redirects");
        fs::write(&path, "/abc https://a.com\n").unwrap();

        let mut ledger = load(&path).unwrap();
        ledger.prepend(RedirectEntry::for_short_key("go", "https://example.com"));
        store(&path, &ledger).unwrap();

        let txt = fs::read_to_string(&path).unwrap();
        assert_eq!(txt, ledger.render());
        let names: Vec<_> = fs::read_dir(td.path())
            .unwrap()
            .flatten()
            .map(|e| e.file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from("_redirects")]);
    }

    #[cfg(unix)]
    #[test]
    fn store_keeps_permissions() {
        use std::os::unix::fs::PermissionsExt;
        let td = tempdir().unwrap();
        let path = td.path().join("_redirects");
        fs::write(&path, "/a https://a.com\n").unwrap();
        fs::set_permissions(&path, fs::Permissions::from_mode(0o644)).unwrap();

        store(&path, &load(&path).unwrap()).unwrap();
        let mode = fs::metadata(&path).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o644);
    }

    #[cfg(unix)]
    #[test]
    fn store_through_symlink_updates_target_and_keeps_link() {
        let td = tempdir().unwrap();
        let real_dir = td.path().join("shared");
        fs::create_dir(&real_dir).unwrap();
        let real = real_dir.join("redirects.txt");
        fs::write(&real, "/abc https://a.com\n").unwrap();
        let link = td.path().join("_redirects");
        std::os::unix::fs::symlink(&real, &link).unwrap();

        let mut ledger = load(&link).unwrap();
        ledger.prepend(RedirectEntry::for_short_key("go", "https://example.com"));
        store(&link, &ledger).unwrap();

        assert!(fs::symlink_metadata(&link).unwrap().file_type().is_symlink());
        assert_eq!(fs::read_to_string(&real).unwrap(), ledger.render());
        assert_eq!(fs::read_dir(&real_dir).unwrap().count(), 1);
    }

    #[test]
    fn store_into_missing_directory_fails_cleanly() {
        let td = tempdir().unwrap();
        let path = td.path().join("gone").join("_redirects");
        let err = store(&path, &Ledger::default()).unwrap_err();
        assert!(matches!(err, ShortenError::WriteFailed { .. }));
    }
}
