use crate::domain::ScanConfig;
use crate::error::DupError;
use crate::ports::FileSystemPort;
use ignore::WalkBuilder;
use ignore::overrides::OverrideBuilder;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

pub struct FileSystemAdapter;

impl FileSystemAdapter {
    pub fn new() -> Self {
        Self
    }
}

impl Default for FileSystemAdapter {
    fn default() -> Self {
        Self::new()
    }
}

impl FileSystemPort for FileSystemAdapter {
    fn resolve(&self, path: &Path) -> Result<PathBuf, DupError> {
        fs::canonicalize(path).map_err(|source| DupError::PathNotFound {
            path: path.to_path_buf(),
            source,
        })
    }

    fn list_files(&self, root: &Path, config: &ScanConfig) -> Result<Vec<PathBuf>, DupError> {
        let walk_error = |message: String| DupError::Walk {
            path: root.to_path_buf(),
            message,
        };

        if !root.is_dir() {
            return Err(walk_error("not a directory".to_string()));
        }

        let mut builder = WalkBuilder::new(root);
        builder.standard_filters(false).follow_links(false);
        if let Some(max_depth) = config.max_depth {
            builder.max_depth(Some(max_depth));
        }

        if !config.exclude_patterns.is_empty() {
            let mut overrides = OverrideBuilder::new(root);
            for pattern in &config.exclude_patterns {
                overrides
                    .add(&format!("!{}", pattern))
                    .map_err(|e| walk_error(format!("invalid exclude pattern '{}': {}", pattern, e)))?;
            }
            let overrides = overrides.build().map_err(|e| walk_error(e.to_string()))?;
            builder.overrides(overrides);
        }

        let mut files = Vec::new();
        for entry in builder.build() {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    log::warn!("Skipping unreadable entry under {}: {}", root.display(), e);
                    continue;
                }
            };

            match entry.file_type() {
                Some(file_type) if file_type.is_file() => files.push(entry.into_path()),
                Some(file_type) if file_type.is_symlink() => {
                    log::trace!("Skipping symlink: {}", entry.path().display());
                }
                _ => {}
            }
        }

        log::debug!("Found {} files under {}", files.len(), root.display());
        Ok(files)
    }

    fn modified(&self, path: &Path) -> std::io::Result<SystemTime> {
        fs::metadata(path)?.modified()
    }

    fn remove_file(&self, path: &Path) -> Result<(), DupError> {
        fs::remove_file(path).map_err(|source| DupError::DeletionIo {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// True for `.json` files, which are treated as saved results rather than scan roots.
pub fn is_results_file(path: &Path) -> bool {
    path.is_file()
        && path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
}

pub fn is_not_found(err: &std::io::Error) -> bool {
    err.kind() == ErrorKind::NotFound
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn tree() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::create_dir_all(dir.path().join("sub/deeper")).unwrap();
        fs::write(dir.path().join("top.txt"), b"a").unwrap();
        fs::write(dir.path().join(".hidden"), b"b").unwrap();
        fs::write(dir.path().join("sub/mid.log"), b"c").unwrap();
        fs::write(dir.path().join("sub/deeper/low.txt"), b"d").unwrap();
        dir
    }

    fn names(files: &[PathBuf]) -> Vec<String> {
        let mut names: Vec<String> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn test_lists_every_regular_file_including_hidden() {
        let dir = tree();
        let files = FileSystemAdapter::new().list_files(dir.path(), &ScanConfig::new()).unwrap();
        assert_eq!(names(&files), vec![".hidden", "low.txt", "mid.log", "top.txt"]);
    }

    #[test]
    fn test_max_depth_limits_walk() {
        let dir = tree();
        let config = ScanConfig::new().with_max_depth(1);
        let files = FileSystemAdapter::new().list_files(dir.path(), &config).unwrap();
        assert_eq!(names(&files), vec![".hidden", "top.txt"]);
    }

    #[test]
    fn test_exclude_patterns_drop_matches() {
        let dir = tree();
        let config = ScanConfig::new().with_exclude_patterns(vec!["*.log".to_string()]);
        let files = FileSystemAdapter::new().list_files(dir.path(), &config).unwrap();
        assert!(!names(&files).contains(&"mid.log".to_string()));
        assert_eq!(files.len(), 3);
    }

    #[test]
    fn test_empty_directory_lists_nothing() {
        let dir = TempDir::new().unwrap();
        let files = FileSystemAdapter::new().list_files(dir.path(), &ScanConfig::new()).unwrap();
        assert!(files.is_empty());
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinks_are_not_listed() {
        let dir = tree();
        std::os::unix::fs::symlink(dir.path().join("top.txt"), dir.path().join("link.txt")).unwrap();
        let files = FileSystemAdapter::new().list_files(dir.path(), &ScanConfig::new()).unwrap();
        assert!(!names(&files).contains(&"link.txt".to_string()));
    }

    #[test]
    fn test_resolve_missing_path() {
        let dir = TempDir::new().unwrap();
        let err = FileSystemAdapter::new().resolve(&dir.path().join("nope")).unwrap_err();
        assert!(matches!(err, DupError::PathNotFound { .. }));
    }

    #[test]
    fn test_remove_missing_file_is_deletion_error() {
        let dir = TempDir::new().unwrap();
        let err = FileSystemAdapter::new().remove_file(&dir.path().join("nope")).unwrap_err();
        match err {
            DupError::DeletionIo { source, .. } => assert!(is_not_found(&source)),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_results_file_detection() {
        let dir = TempDir::new().unwrap();
        let json = dir.path().join("duplicates.json");
        fs::write(&json, b"{}").unwrap();
        assert!(is_results_file(&json));
        assert!(!is_results_file(dir.path()));
        assert!(!is_results_file(&dir.path().join("missing.json")));
    }
}
