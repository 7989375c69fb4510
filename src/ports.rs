use crate::domain::{DeletionPolicy, DuplicateGroup, ScanConfig};
use crate::error::DupError;
use anyhow::Result;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

pub trait FileSystemPort {
    /// Absolute form of an operator-supplied path.
    fn resolve(&self, path: &Path) -> Result<PathBuf, DupError>;
    /// Every regular file below `root`; symlinks are never returned.
    fn list_files(&self, root: &Path, config: &ScanConfig) -> Result<Vec<PathBuf>, DupError>;
    fn modified(&self, path: &Path) -> std::io::Result<SystemTime>;
    fn remove_file(&self, path: &Path) -> Result<(), DupError>;
}

pub trait HashingPort {
    fn hash_file(&self, path: &Path) -> Result<String, DupError>;
}

/// Called once per argument with that argument's groups, then `finish` once
/// after the last argument.
pub trait ReportPort {
    fn write_groups(&self, groups: &[DuplicateGroup]) -> Result<()>;

    fn finish(&self) -> Result<()> {
        Ok(())
    }
}

pub trait ProgressPort {
    fn start(&self, total: u64);
    fn update(&self, processed: u64);
    fn finish(&self);
}

/// Operator decisions, asked at the points where the run flow needs them.
pub trait DecisionPort {
    fn rescan(&self, root: &Path) -> Result<bool>;
    fn save_results(&self, destination: &Path) -> Result<bool>;
    fn start_deletion(&self) -> Result<bool>;
    fn deletion_policy(&self) -> Result<DeletionPolicy>;
    fn confirm_delete(&self, path: &Path) -> Result<bool>;
}

impl<T: FileSystemPort + ?Sized> FileSystemPort for &T {
    fn resolve(&self, path: &Path) -> Result<PathBuf, DupError> {
        (**self).resolve(path)
    }

    fn list_files(&self, root: &Path, config: &ScanConfig) -> Result<Vec<PathBuf>, DupError> {
        (**self).list_files(root, config)
    }

    fn modified(&self, path: &Path) -> std::io::Result<SystemTime> {
        (**self).modified(path)
    }

    fn remove_file(&self, path: &Path) -> Result<(), DupError> {
        (**self).remove_file(path)
    }
}

impl<T: HashingPort + ?Sized> HashingPort for &T {
    fn hash_file(&self, path: &Path) -> Result<String, DupError> {
        (**self).hash_file(path)
    }
}

impl<T: ProgressPort + ?Sized> ProgressPort for &T {
    fn start(&self, total: u64) {
        (**self).start(total)
    }

    fn update(&self, processed: u64) {
        (**self).update(processed)
    }

    fn finish(&self) {
        (**self).finish()
    }
}

impl<T: DecisionPort + ?Sized> DecisionPort for &T {
    fn rescan(&self, root: &Path) -> Result<bool> {
        (**self).rescan(root)
    }

    fn save_results(&self, destination: &Path) -> Result<bool> {
        (**self).save_results(destination)
    }

    fn start_deletion(&self) -> Result<bool> {
        (**self).start_deletion()
    }

    fn deletion_policy(&self) -> Result<DeletionPolicy> {
        (**self).deletion_policy()
    }

    fn confirm_delete(&self, path: &Path) -> Result<bool> {
        (**self).confirm_delete(path)
    }
}
