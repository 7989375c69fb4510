use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use crate::error::DupError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HashAlgorithm {
    Md5,
    Sha1,
    Sha256,
    Blake3,
    XxHash64,
    XxHash3,
}

impl HashAlgorithm {
    pub fn as_str(&self) -> &'static str {
        match self {
            HashAlgorithm::Md5 => "md5",
            HashAlgorithm::Sha1 => "sha1",
            HashAlgorithm::Sha256 => "sha256",
            HashAlgorithm::Blake3 => "blake3",
            HashAlgorithm::XxHash64 => "xxh64",
            HashAlgorithm::XxHash3 => "xxh3",
        }
    }

    /// Length of the hex digest this algorithm produces.
    pub fn digest_len(&self) -> usize {
        match self {
            HashAlgorithm::Md5 => 32,
            HashAlgorithm::Sha1 => 40,
            HashAlgorithm::Sha256 | HashAlgorithm::Blake3 => 64,
            HashAlgorithm::XxHash64 | HashAlgorithm::XxHash3 => 16,
        }
    }
}

/// Content digest to the set of files carrying it.
///
/// Every key holds at least one path. Iteration is in digest order, and
/// paths within a digest are in path order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DigestMap {
    entries: BTreeMap<String, BTreeSet<PathBuf>>,
}

impl DigestMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns false when the path was already recorded under this digest.
    pub fn insert(&mut self, digest: impl Into<String>, path: PathBuf) -> bool {
        self.entries.entry(digest.into()).or_default().insert(path)
    }

    pub fn merge(&mut self, other: DigestMap) {
        for (digest, paths) in other.entries {
            self.entries.entry(digest).or_default().extend(paths);
        }
        self.drop_empty();
    }

    pub fn remove_path(&mut self, digest: &str, path: &Path) -> bool {
        let Some(paths) = self.entries.get_mut(digest) else {
            return false;
        };
        let removed = paths.remove(path);
        if paths.is_empty() {
            self.entries.remove(digest);
        }
        removed
    }

    pub fn get(&self, digest: &str) -> Option<&BTreeSet<PathBuf>> {
        self.entries.get(digest)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &BTreeSet<PathBuf>)> {
        self.entries.iter()
    }

    pub fn digest_count(&self) -> usize {
        self.entries.len()
    }

    pub fn file_count(&self) -> usize {
        self.entries.values().map(|paths| paths.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Removes keys left without members, returning how many were dropped.
    pub fn drop_empty(&mut self) -> usize {
        let before = self.entries.len();
        self.entries.retain(|_, paths| !paths.is_empty());
        before - self.entries.len()
    }

    /// Digests shared by two or more files, in digest order.
    pub fn duplicate_groups(&self) -> Vec<DuplicateGroup> {
        self.entries
            .iter()
            .filter(|(_, paths)| paths.len() > 1)
            .map(|(digest, paths)| DuplicateGroup::new(digest.clone(), paths.iter().cloned().collect()))
            .collect()
    }
}

impl FromIterator<(String, PathBuf)> for DigestMap {
    fn from_iter<I: IntoIterator<Item = (String, PathBuf)>>(iter: I) -> Self {
        let mut map = DigestMap::new();
        for (digest, path) in iter {
            map.insert(digest, path);
        }
        map
    }
}

/// Files with byte-identical content. Also used for policy-restricted sub-groups.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DuplicateGroup {
    pub digest: String,
    pub files: Vec<PathBuf>,
}

impl DuplicateGroup {
    pub fn new(digest: String, files: Vec<PathBuf>) -> Self {
        Self { digest, files }
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum KeepPolicy {
    Newest,
    #[default]
    Oldest,
}

/// Operator answers captured once per deletion session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DeletionPolicy {
    pub keep: KeepPolicy,
    pub blanket_confirm: bool,
    pub ignore_extension_mismatch: bool,
    pub ignore_directory_mismatch: bool,
}

impl DeletionPolicy {
    pub fn new(keep: KeepPolicy) -> Self {
        Self {
            keep,
            ..Self::default()
        }
    }

    pub fn with_blanket_confirm(mut self, blanket_confirm: bool) -> Self {
        self.blanket_confirm = blanket_confirm;
        self
    }

    pub fn with_ignore_extension_mismatch(mut self, ignore: bool) -> Self {
        self.ignore_extension_mismatch = ignore;
        self
    }

    pub fn with_ignore_directory_mismatch(mut self, ignore: bool) -> Self {
        self.ignore_directory_mismatch = ignore;
        self
    }

    pub fn keep_newest(&self) -> bool {
        self.keep == KeepPolicy::Newest
    }

    /// With both dimensions ignored every duplicate group is one sub-group.
    pub fn skips_partitioning(&self) -> bool {
        self.ignore_extension_mismatch && self.ignore_directory_mismatch
    }
}

#[derive(Debug, Clone, Default)]
pub struct ScanConfig {
    pub thread_count: Option<usize>,
    pub max_depth: Option<usize>,
    pub exclude_patterns: Vec<String>,
}

impl ScanConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_thread_count(mut self, threads: Option<usize>) -> Self {
        self.thread_count = threads.filter(|&n| n > 0);
        self
    }

    pub fn with_max_depth(mut self, depth: usize) -> Self {
        self.max_depth = Some(depth);
        self
    }

    pub fn with_exclude_patterns(mut self, patterns: Vec<String>) -> Self {
        self.exclude_patterns = patterns;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedFile {
    pub path: PathBuf,
    pub reason: String,
}

#[derive(Debug)]
pub struct ScanOutcome {
    pub map: DigestMap,
    pub hashed: usize,
    pub skipped: Vec<SkippedFile>,
}

#[derive(Debug)]
pub enum FileOutcome {
    Deleted(PathBuf),
    Skipped(PathBuf),
    /// Listed in the map but already gone from disk; dropped from the map.
    Missing(PathBuf),
    Failed(DupError),
}

#[derive(Debug)]
pub enum SubgroupOutcome {
    /// Members do not share one suffix; nothing was deleted.
    Rejected { suffixes: Vec<String> },
    /// A member's modification time could not be read; nothing was deleted.
    Unavailable { path: PathBuf },
    /// `kept` is `None` only when no member was left on disk.
    Processed { kept: Option<PathBuf>, files: Vec<FileOutcome> },
}

#[derive(Debug, Default)]
pub struct DeletionSummary {
    pub deleted: Vec<PathBuf>,
    pub skipped: Vec<PathBuf>,
    pub missing: Vec<PathBuf>,
    pub failed: Vec<DupError>,
    pub rejected_groups: usize,
    pub unavailable_groups: usize,
}

impl DeletionSummary {
    pub fn record(&mut self, outcome: SubgroupOutcome) {
        match outcome {
            SubgroupOutcome::Rejected { .. } => self.rejected_groups += 1,
            SubgroupOutcome::Unavailable { .. } => self.unavailable_groups += 1,
            SubgroupOutcome::Processed { files, .. } => {
                for file in files {
                    match file {
                        FileOutcome::Deleted(path) => self.deleted.push(path),
                        FileOutcome::Skipped(path) => self.skipped.push(path),
                        FileOutcome::Missing(path) => self.missing.push(path),
                        FileOutcome::Failed(err) => self.failed.push(err),
                    }
                }
            }
        }
    }

    pub fn all_succeeded(&self) -> bool {
        self.failed.is_empty()
    }
}
