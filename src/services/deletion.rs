use crate::adapters::filesystem::is_not_found;
use crate::domain::{DeletionPolicy, DeletionSummary, DigestMap, DuplicateGroup, FileOutcome, SubgroupOutcome};
use crate::error::DupError;
use crate::ports::{DecisionPort, FileSystemPort};
use crate::services::partition::{dotted_extension, partition_all};
use anyhow::Result;
use console::style;
use std::cmp::Reverse;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Extension, or the bare file name when there is none.
pub fn suffix_key(path: &Path) -> String {
    dotted_extension(path).unwrap_or_else(|| {
        path.file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default()
    })
}

/// Keeps one copy per sub-group and removes the rest.
pub struct DeletionEngine<F, D> {
    filesystem: F,
    decisions: D,
}

impl<F, D> DeletionEngine<F, D>
where
    F: FileSystemPort,
    D: DecisionPort,
{
    pub fn new(filesystem: F, decisions: D) -> Self {
        Self { filesystem, decisions }
    }

    /// Partitions `groups` by policy and processes every resulting sub-group.
    ///
    /// Deleted paths are removed from `map`. Only a failed prompt aborts.
    pub fn run(&self, map: &mut DigestMap, groups: &[DuplicateGroup], policy: &DeletionPolicy) -> Result<DeletionSummary> {
        let subgroups = if policy.skips_partitioning() {
            groups.iter().filter(|g| g.len() > 1).cloned().collect()
        } else {
            partition_all(groups, policy)
        };
        log::debug!(
            "{} duplicate groups yield {} deletable sub-groups",
            groups.len(),
            subgroups.len()
        );

        let mut summary = DeletionSummary::default();
        for subgroup in &subgroups {
            let outcome = self.process_subgroup(map, subgroup, policy)?;
            summary.record(outcome);
        }
        Ok(summary)
    }

    pub fn process_subgroup(
        &self,
        map: &mut DigestMap,
        subgroup: &DuplicateGroup,
        policy: &DeletionPolicy,
    ) -> Result<SubgroupOutcome> {
        let suffixes: BTreeSet<String> = subgroup.files.iter().map(|p| suffix_key(p)).collect();
        if suffixes.len() > 1 {
            log::warn!(
                "Not deleting from group {}: mixed file types {:?}",
                subgroup.digest,
                suffixes
            );
            return Ok(SubgroupOutcome::Rejected {
                suffixes: suffixes.into_iter().collect(),
            });
        }

        let (present, missing) = match self.stat_members(&subgroup.files) {
            Ok(stamped) => stamped,
            Err(path) => {
                log::warn!(
                    "Not deleting from group {}: cannot read modification time of {}",
                    subgroup.digest,
                    path.display()
                );
                return Ok(SubgroupOutcome::Unavailable { path });
            }
        };

        let mut files = Vec::with_capacity(subgroup.files.len());
        for path in missing {
            log::info!("{} no longer exists; dropping it from the results", path.display());
            map.remove_path(&subgroup.digest, &path);
            files.push(FileOutcome::Missing(path));
        }

        let ordered = order_for_keeping(present, policy);
        let Some((kept, candidates)) = ordered.split_first() else {
            return Ok(SubgroupOutcome::Processed { kept: None, files });
        };
        log::info!("Keeping {}", kept.display());

        for candidate in candidates {
            if !policy.blanket_confirm && !self.decisions.confirm_delete(candidate)? {
                println!("{} {}", style("Skipped:").yellow(), candidate.display());
                files.push(FileOutcome::Skipped(candidate.clone()));
                continue;
            }
            files.push(self.delete(map, &subgroup.digest, candidate));
        }

        Ok(SubgroupOutcome::Processed {
            kept: Some(kept.clone()),
            files,
        })
    }

    /// Members still on disk with their mtimes, plus members that are gone.
    /// `Err` names a member whose mtime cannot be read for any other reason.
    fn stat_members(&self, files: &[PathBuf]) -> Result<(Vec<(SystemTime, PathBuf)>, Vec<PathBuf>), PathBuf> {
        let mut present = Vec::with_capacity(files.len());
        let mut missing = Vec::new();
        for path in files {
            match self.filesystem.modified(path) {
                Ok(modified) => present.push((modified, path.clone())),
                Err(e) if is_not_found(&e) => missing.push(path.clone()),
                Err(_) => return Err(path.clone()),
            }
        }
        Ok((present, missing))
    }

    fn delete(&self, map: &mut DigestMap, digest: &str, path: &Path) -> FileOutcome {
        match self.filesystem.remove_file(path) {
            Ok(()) => {
                println!("{} {}", style("Deleted:").green(), path.display());
                map.remove_path(digest, path);
                FileOutcome::Deleted(path.to_path_buf())
            }
            Err(err) => {
                println!("{} {}", style("Error deleting").red(), err);
                if let DupError::DeletionIo { source, .. } = &err {
                    if is_not_found(source) {
                        log::debug!("{} was already gone; dropping it from the results", path.display());
                        map.remove_path(digest, path);
                    }
                }
                FileOutcome::Failed(err)
            }
        }
    }
}

/// Kept file first. Equal mtimes fall back to path order.
fn order_for_keeping(mut stamped: Vec<(SystemTime, PathBuf)>, policy: &DeletionPolicy) -> Vec<PathBuf> {
    if policy.keep_newest() {
        stamped.sort_by(|a, b| (Reverse(a.0), &a.1).cmp(&(Reverse(b.0), &b.1)));
    } else {
        stamped.sort();
    }
    stamped.into_iter().map(|(_, path)| path).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::KeepPolicy;
    use std::cell::RefCell;
    use std::collections::{HashMap, HashSet};
    use std::io;
    use std::time::Duration;

    /// In-memory filesystem: path → mtime offset in seconds.
    struct FakeFs {
        mtimes: HashMap<PathBuf, u64>,
        locked: HashSet<PathBuf>,
        unreadable: HashSet<PathBuf>,
        vanished: HashSet<PathBuf>,
        removed: RefCell<Vec<PathBuf>>,
    }

    impl FakeFs {
        fn new(files: &[(&str, u64)]) -> Self {
            Self {
                mtimes: files.iter().map(|(p, t)| (PathBuf::from(p), *t)).collect(),
                locked: HashSet::new(),
                unreadable: HashSet::new(),
                vanished: HashSet::new(),
                removed: RefCell::new(Vec::new()),
            }
        }

        fn lock(mut self, path: &str) -> Self {
            self.locked.insert(PathBuf::from(path));
            self
        }

        /// Stat fails with something other than NotFound.
        fn unreadable(mut self, path: &str) -> Self {
            self.unreadable.insert(PathBuf::from(path));
            self
        }

        /// Stat still succeeds but the file is gone by the time it is removed.
        fn vanish(mut self, path: &str) -> Self {
            self.vanished.insert(PathBuf::from(path));
            self
        }

        fn removed(&self) -> Vec<PathBuf> {
            self.removed.borrow().clone()
        }
    }

    impl FileSystemPort for FakeFs {
        fn resolve(&self, path: &Path) -> Result<PathBuf, DupError> {
            Ok(path.to_path_buf())
        }

        fn list_files(&self, _root: &Path, _config: &crate::domain::ScanConfig) -> Result<Vec<PathBuf>, DupError> {
            Ok(self.mtimes.keys().cloned().collect())
        }

        fn modified(&self, path: &Path) -> io::Result<SystemTime> {
            if self.unreadable.contains(path) {
                return Err(io::Error::from(io::ErrorKind::PermissionDenied));
            }
            self.mtimes
                .get(path)
                .map(|secs| SystemTime::UNIX_EPOCH + Duration::from_secs(*secs))
                .ok_or_else(|| io::Error::from(io::ErrorKind::NotFound))
        }

        fn remove_file(&self, path: &Path) -> Result<(), DupError> {
            let kind = if self.locked.contains(path) {
                Some(io::ErrorKind::PermissionDenied)
            } else if self.vanished.contains(path) {
                Some(io::ErrorKind::NotFound)
            } else {
                None
            };
            if let Some(kind) = kind {
                return Err(DupError::DeletionIo {
                    path: path.to_path_buf(),
                    source: io::Error::from(kind),
                });
            }
            self.removed.borrow_mut().push(path.to_path_buf());
            Ok(())
        }
    }

    /// Answers per-file prompts from a fixed list of paths to approve.
    struct Approve(Vec<PathBuf>);

    impl DecisionPort for Approve {
        fn rescan(&self, _root: &Path) -> Result<bool> {
            Ok(false)
        }
        fn save_results(&self, _destination: &Path) -> Result<bool> {
            Ok(false)
        }
        fn start_deletion(&self) -> Result<bool> {
            Ok(true)
        }
        fn deletion_policy(&self) -> Result<DeletionPolicy> {
            Ok(DeletionPolicy::default())
        }
        fn confirm_delete(&self, path: &Path) -> Result<bool> {
            Ok(self.0.iter().any(|p| p == path))
        }
    }

    fn group(paths: &[&str]) -> DuplicateGroup {
        DuplicateGroup::new("d".into(), paths.iter().map(PathBuf::from).collect())
    }

    fn map_of(g: &DuplicateGroup) -> DigestMap {
        g.files.iter().map(|p| (g.digest.clone(), p.clone())).collect()
    }

    #[test]
    fn test_suffix_key() {
        assert_eq!(suffix_key(Path::new("/a/x.txt")), ".txt");
        assert_eq!(suffix_key(Path::new("/a/archive.tar.gz")), ".gz");
        assert_eq!(suffix_key(Path::new("/a/Makefile")), "Makefile");
        assert_eq!(suffix_key(Path::new("/a/.bashrc")), ".bashrc");
    }

    #[test]
    fn test_mismatched_extensions_never_deleted() {
        let fs = FakeFs::new(&[("/a/x.txt", 1), ("/b/x.md", 2)]);
        let engine = DeletionEngine::new(&fs, Approve(vec![PathBuf::from("/b/x.md")]));
        let g = group(&["/a/x.txt", "/b/x.md"]);
        let mut map = map_of(&g);

        for blanket in [false, true] {
            let policy = DeletionPolicy::new(KeepPolicy::Oldest).with_blanket_confirm(blanket);
            let outcome = engine.process_subgroup(&mut map, &g, &policy).unwrap();
            assert!(matches!(outcome, SubgroupOutcome::Rejected { .. }));
        }
        assert!(fs.removed().is_empty());
        assert_eq!(map.file_count(), 2);
    }

    #[test]
    fn test_keep_oldest_deletes_newer_copies() {
        let fs = FakeFs::new(&[("/a/1.txt", 30), ("/a/2.txt", 10), ("/a/3.txt", 20)]);
        let engine = DeletionEngine::new(&fs, Approve(vec![]));
        let g = group(&["/a/1.txt", "/a/2.txt", "/a/3.txt"]);
        let mut map = map_of(&g);
        let policy = DeletionPolicy::new(KeepPolicy::Oldest).with_blanket_confirm(true);

        match engine.process_subgroup(&mut map, &g, &policy).unwrap() {
            SubgroupOutcome::Processed { kept, files } => {
                assert_eq!(kept, Some(PathBuf::from("/a/2.txt")));
                assert_eq!(files.len(), 2);
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert_eq!(fs.removed(), vec![PathBuf::from("/a/3.txt"), PathBuf::from("/a/1.txt")]);
        assert_eq!(map.get("d").unwrap().len(), 1);
    }

    #[test]
    fn test_keep_newest_deletes_older_copies() {
        let fs = FakeFs::new(&[("/a/1.txt", 30), ("/a/2.txt", 10), ("/a/3.txt", 20)]);
        let engine = DeletionEngine::new(&fs, Approve(vec![]));
        let g = group(&["/a/1.txt", "/a/2.txt", "/a/3.txt"]);
        let policy = DeletionPolicy::new(KeepPolicy::Newest).with_blanket_confirm(true);

        engine.process_subgroup(&mut map_of(&g), &g, &policy).unwrap();
        assert_eq!(fs.removed(), vec![PathBuf::from("/a/3.txt"), PathBuf::from("/a/2.txt")]);
    }

    #[test]
    fn test_equal_mtimes_order_by_path() {
        let fs = FakeFs::new(&[("/a/b.txt", 5), ("/a/a.txt", 5)]);
        let engine = DeletionEngine::new(&fs, Approve(vec![]));
        let g = group(&["/a/b.txt", "/a/a.txt"]);
        let policy = DeletionPolicy::new(KeepPolicy::Newest).with_blanket_confirm(true);

        engine.process_subgroup(&mut map_of(&g), &g, &policy).unwrap();
        assert_eq!(fs.removed(), vec![PathBuf::from("/a/b.txt")]);
    }

    #[test]
    fn test_declined_prompts_skip_only_that_file() {
        let fs = FakeFs::new(&[("/a/1.txt", 1), ("/a/2.txt", 2), ("/a/3.txt", 3)]);
        let engine = DeletionEngine::new(&fs, Approve(vec![PathBuf::from("/a/3.txt")]));
        let g = group(&["/a/1.txt", "/a/2.txt", "/a/3.txt"]);
        let policy = DeletionPolicy::new(KeepPolicy::Oldest);

        let mut summary = DeletionSummary::default();
        summary.record(engine.process_subgroup(&mut map_of(&g), &g, &policy).unwrap());
        assert_eq!(summary.deleted, vec![PathBuf::from("/a/3.txt")]);
        assert_eq!(summary.skipped, vec![PathBuf::from("/a/2.txt")]);
    }

    #[test]
    fn test_failed_delete_does_not_stop_the_batch() {
        let fs = FakeFs::new(&[
            ("/a/1.txt", 1),
            ("/a/2.txt", 2),
            ("/a/3.txt", 3),
            ("/b/1.png", 1),
            ("/b/2.png", 2),
        ])
        .lock("/a/2.txt");
        let engine = DeletionEngine::new(&fs, Approve(vec![]));
        let groups = vec![
            group(&["/a/1.txt", "/a/2.txt", "/a/3.txt"]),
            DuplicateGroup::new("e".into(), vec![PathBuf::from("/b/1.png"), PathBuf::from("/b/2.png")]),
        ];
        let mut map = DigestMap::new();
        for g in &groups {
            map.merge(map_of(g));
        }
        let policy = DeletionPolicy::new(KeepPolicy::Oldest).with_blanket_confirm(true);

        let summary = engine.run(&mut map, &groups, &policy).unwrap();
        assert_eq!(summary.deleted, vec![PathBuf::from("/a/3.txt"), PathBuf::from("/b/2.png")]);
        assert_eq!(summary.failed.len(), 1);
        assert_eq!(summary.failed[0].path(), Path::new("/a/2.txt"));
        assert!(!summary.all_succeeded());
        assert_eq!(map.get("d").unwrap().len(), 2);
    }

    #[test]
    fn test_unreadable_mtime_leaves_group_untouched() {
        let fs = FakeFs::new(&[("/a/1.txt", 1), ("/a/2.txt", 2)]).unreadable("/a/2.txt");
        let engine = DeletionEngine::new(&fs, Approve(vec![]));
        let g = group(&["/a/1.txt", "/a/2.txt"]);
        let mut map = map_of(&g);
        let policy = DeletionPolicy::new(KeepPolicy::Oldest).with_blanket_confirm(true);

        let outcome = engine.process_subgroup(&mut map, &g, &policy).unwrap();
        assert!(matches!(outcome, SubgroupOutcome::Unavailable { ref path } if path == Path::new("/a/2.txt")));
        assert!(fs.removed().is_empty());
        assert_eq!(map.file_count(), 2);
    }

    #[test]
    fn test_stale_member_is_dropped_and_rest_deduplicated() {
        let fs = FakeFs::new(&[("/a/2.txt", 2), ("/a/3.txt", 3)]);
        let engine = DeletionEngine::new(&fs, Approve(vec![]));
        let g = group(&["/a/1.txt", "/a/2.txt", "/a/3.txt"]);
        let mut map = map_of(&g);
        let policy = DeletionPolicy::new(KeepPolicy::Oldest).with_blanket_confirm(true);

        let mut summary = DeletionSummary::default();
        summary.record(engine.process_subgroup(&mut map, &g, &policy).unwrap());
        assert_eq!(summary.missing, vec![PathBuf::from("/a/1.txt")]);
        assert_eq!(summary.deleted, vec![PathBuf::from("/a/3.txt")]);
        assert_eq!(summary.unavailable_groups, 0);
        assert_eq!(map.get("d").unwrap().iter().collect::<Vec<_>>(), vec![Path::new("/a/2.txt")]);
    }

    #[test]
    fn test_group_with_one_survivor_deletes_nothing() {
        let fs = FakeFs::new(&[("/a/2.txt", 2)]);
        let engine = DeletionEngine::new(&fs, Approve(vec![]));
        let g = group(&["/a/1.txt", "/a/2.txt"]);
        let mut map = map_of(&g);
        let policy = DeletionPolicy::new(KeepPolicy::Oldest).with_blanket_confirm(true);

        match engine.process_subgroup(&mut map, &g, &policy).unwrap() {
            SubgroupOutcome::Processed { kept, files } => {
                assert_eq!(kept, Some(PathBuf::from("/a/2.txt")));
                assert!(matches!(files.as_slice(), [FileOutcome::Missing(p)] if p == Path::new("/a/1.txt")));
            }
            other => panic!("unexpected outcome: {other:?}"),
        }
        assert!(fs.removed().is_empty());
        assert!(map.duplicate_groups().is_empty());
    }

    #[test]
    fn test_empty_subgroup_keeps_nothing() {
        let fs = FakeFs::new(&[]);
        let engine = DeletionEngine::new(&fs, Approve(vec![]));
        let policy = DeletionPolicy::new(KeepPolicy::Oldest).with_blanket_confirm(true);

        let outcome = engine
            .process_subgroup(&mut DigestMap::new(), &group(&[]), &policy)
            .unwrap();
        assert!(matches!(outcome, SubgroupOutcome::Processed { kept: None, ref files } if files.is_empty()));
    }

    #[test]
    fn test_file_gone_at_delete_time_leaves_the_map() {
        let fs = FakeFs::new(&[("/a/1.txt", 1), ("/a/2.txt", 2), ("/a/3.txt", 3)]).vanish("/a/3.txt");
        let engine = DeletionEngine::new(&fs, Approve(vec![]));
        let g = group(&["/a/1.txt", "/a/2.txt", "/a/3.txt"]);
        let mut map = map_of(&g);
        let policy = DeletionPolicy::new(KeepPolicy::Oldest).with_blanket_confirm(true);

        let mut summary = DeletionSummary::default();
        summary.record(engine.process_subgroup(&mut map, &g, &policy).unwrap());
        assert_eq!(summary.deleted, vec![PathBuf::from("/a/2.txt")]);
        assert_eq!(summary.failed.len(), 1);
        assert_eq!(summary.failed[0].path(), Path::new("/a/3.txt"));
        assert!(!map.get("d").unwrap().contains(Path::new("/a/3.txt")));
        assert_eq!(map.file_count(), 1);
    }

    #[test]
    fn test_run_respects_partitioning() {
        let fs = FakeFs::new(&[("/a/x.txt", 1), ("/b/x.txt", 2), ("/a/y.jpg", 3)]);
        let engine = DeletionEngine::new(&fs, Approve(vec![]));
        let groups = vec![group(&["/a/x.txt", "/a/y.jpg", "/b/x.txt"])];
        let policy = DeletionPolicy::new(KeepPolicy::Oldest).with_blanket_confirm(true);

        let strict = engine.run(&mut map_of(&groups[0]), &groups, &policy).unwrap();
        assert!(strict.deleted.is_empty());

        let loose = policy.with_ignore_directory_mismatch(true);
        let summary = engine.run(&mut map_of(&groups[0]), &groups, &loose).unwrap();
        assert_eq!(summary.deleted, vec![PathBuf::from("/b/x.txt")]);
    }

    #[test]
    fn test_ignoring_both_dimensions_still_checks_suffix() {
        let fs = FakeFs::new(&[("/a/x.txt", 1), ("/b/y.jpg", 2)]);
        let engine = DeletionEngine::new(&fs, Approve(vec![]));
        let groups = vec![group(&["/a/x.txt", "/b/y.jpg"])];
        let policy = DeletionPolicy::new(KeepPolicy::Oldest)
            .with_blanket_confirm(true)
            .with_ignore_directory_mismatch(true)
            .with_ignore_extension_mismatch(true);

        let summary = engine.run(&mut map_of(&groups[0]), &groups, &policy).unwrap();
        assert_eq!(summary.rejected_groups, 1);
        assert!(fs.removed().is_empty());
    }
}
