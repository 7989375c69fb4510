//! Splits duplicate groups so that only copies sharing a directory and/or an
//! extension are considered interchangeable.

use crate::domain::{DeletionPolicy, DuplicateGroup};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Dimensions a copy must share with another copy to be deletable.
///
/// A `None` component is either ignored by policy or absent from the path.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct UniquenessKey {
    pub directory: Option<PathBuf>,
    pub extension: Option<String>,
}

/// Extension with its leading dot, e.g. `.txt`.
pub fn dotted_extension(path: &Path) -> Option<String> {
    path.extension()
        .map(|ext| format!(".{}", ext.to_string_lossy()))
}

pub fn uniqueness_key(path: &Path, ignore_directory: bool, ignore_extension: bool) -> UniquenessKey {
    UniquenessKey {
        directory: if ignore_directory {
            None
        } else {
            path.parent().map(Path::to_path_buf)
        },
        extension: if ignore_extension {
            None
        } else {
            dotted_extension(path)
        },
    }
}

/// Sub-groups of `group` whose members share a key, dropping singletons.
pub fn partition(group: &DuplicateGroup, ignore_directory: bool, ignore_extension: bool) -> Vec<DuplicateGroup> {
    if ignore_directory && ignore_extension {
        return if group.len() > 1 {
            vec![group.clone()]
        } else {
            Vec::new()
        };
    }

    let mut buckets: BTreeMap<UniquenessKey, Vec<PathBuf>> = BTreeMap::new();
    for path in &group.files {
        buckets
            .entry(uniqueness_key(path, ignore_directory, ignore_extension))
            .or_default()
            .push(path.clone());
    }

    buckets
        .into_iter()
        .filter_map(|(key, files)| {
            if files.len() > 1 {
                Some(DuplicateGroup::new(group.digest.clone(), files))
            } else {
                log::trace!("Leaving {:?} alone: no interchangeable copy", key);
                None
            }
        })
        .collect()
}

pub fn partition_all(groups: &[DuplicateGroup], policy: &DeletionPolicy) -> Vec<DuplicateGroup> {
    groups
        .iter()
        .flat_map(|group| {
            partition(
                group,
                policy.ignore_directory_mismatch,
                policy.ignore_extension_mismatch,
            )
        })
        .collect()
}
