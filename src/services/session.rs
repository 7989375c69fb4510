use crate::adapters::JsonStoreAdapter;
use crate::adapters::filesystem::is_results_file;
use crate::domain::{DeletionSummary, DigestMap, DuplicateGroup, HashAlgorithm, ScanConfig};
use crate::error::DupError;
use crate::ports::{DecisionPort, FileSystemPort, HashingPort, ProgressPort, ReportPort};
use crate::services::deletion::DeletionEngine;
use crate::services::scanner::ScannerService;
use anyhow::Result;
use std::path::{Path, PathBuf};

/// What happened to one command-line argument.
#[derive(Debug, Default)]
pub struct ArgumentOutcome {
    pub root: PathBuf,
    pub loaded: bool,
    pub scanned: bool,
    pub skipped_files: usize,
    pub groups: Vec<DuplicateGroup>,
    pub deletion: Option<DeletionSummary>,
    pub saved: bool,
    pub map: DigestMap,
}

#[derive(Debug, Default)]
pub struct RunSummary {
    pub outcomes: Vec<ArgumentOutcome>,
    pub failures: Vec<(PathBuf, anyhow::Error)>,
    /// Set when the combined report could not be written after the last argument.
    pub report_failure: Option<anyhow::Error>,
}

impl RunSummary {
    pub fn succeeded(&self) -> bool {
        self.failures.is_empty() && self.report_failure.is_none()
    }
}

/// Drives load → scan → report → delete → save for each argument.
pub struct DedupeSession<F, H, P> {
    filesystem: F,
    hasher: H,
    progress: P,
    store: JsonStoreAdapter,
    reporter: Box<dyn ReportPort>,
    decisions: Box<dyn DecisionPort>,
    scan_config: ScanConfig,
    algorithm: Option<HashAlgorithm>,
}

impl<F, H, P> DedupeSession<F, H, P>
where
    F: FileSystemPort + Sync,
    H: HashingPort + Send + Sync,
    P: ProgressPort + Send + Sync,
{
    pub fn new(
        filesystem: F,
        hasher: H,
        progress: P,
        store: JsonStoreAdapter,
        reporter: Box<dyn ReportPort>,
        decisions: Box<dyn DecisionPort>,
    ) -> Self {
        Self {
            filesystem,
            hasher,
            progress,
            store,
            reporter,
            decisions,
            scan_config: ScanConfig::default(),
            algorithm: None,
        }
    }

    pub fn with_scan_config(mut self, config: ScanConfig) -> Self {
        self.scan_config = config;
        self
    }

    /// Enables a warning when loaded digests do not look like this algorithm's.
    pub fn with_algorithm(mut self, algorithm: HashAlgorithm) -> Self {
        self.algorithm = Some(algorithm);
        self
    }

    /// Processes every argument independently; failures are collected, not fatal.
    pub fn run(&self, args: &[PathBuf]) -> RunSummary {
        let mut summary = RunSummary::default();
        for arg in args {
            match self.process_argument(arg) {
                Ok(outcome) => summary.outcomes.push(outcome),
                Err(e) => {
                    log::error!("Invalid input '{}': {:#}", arg.display(), e);
                    summary.failures.push((arg.clone(), e));
                }
            }
        }
        if let Err(e) = self.reporter.finish() {
            log::error!("Failed to write report: {:#}", e);
            summary.report_failure = Some(e);
        }
        summary
    }

    pub fn process_argument(&self, arg: &Path) -> Result<ArgumentOutcome> {
        let resolved = self.filesystem.resolve(arg)?;
        let mut outcome = ArgumentOutcome::default();

        let mut map = DigestMap::new();
        let root = if is_results_file(&resolved) {
            println!("Opening file hashes from {}", resolved.display());
            map = self.store.load(&resolved)?;
            self.check_digest_shape(&map, &resolved);
            outcome.loaded = true;
            resolved
                .parent()
                .map(Path::to_path_buf)
                .unwrap_or_else(|| resolved.clone())
        } else if resolved.is_dir() {
            resolved
        } else {
            return Err(DupError::UnsupportedArgument(resolved).into());
        };

        if map.is_empty() || self.decisions.rescan(&root)? {
            let scanner = ScannerService::new(&self.filesystem, &self.hasher, &self.progress);
            let scan = scanner.scan(&root, &self.scan_config, map)?;
            outcome.scanned = true;
            outcome.skipped_files = scan.skipped.len();
            map = scan.map;
        }

        let groups = map.duplicate_groups();
        self.reporter.write_groups(&groups)?;

        if !groups.is_empty() && self.decisions.start_deletion()? {
            let policy = self.decisions.deletion_policy()?;
            let engine = DeletionEngine::new(&self.filesystem, &*self.decisions);
            let deletion = engine.run(&mut map, &groups, &policy)?;
            log::info!(
                "Deleted {} files, skipped {}, {} failed, {} already gone, {} groups left alone",
                deletion.deleted.len(),
                deletion.skipped.len(),
                deletion.failed.len(),
                deletion.missing.len(),
                deletion.rejected_groups + deletion.unavailable_groups
            );
            outcome.deletion = Some(deletion);
        }

        if !map.is_empty() && self.decisions.save_results(self.store.destination())? {
            self.store.save(&map)?;
            outcome.saved = true;
        }

        outcome.root = root;
        outcome.groups = groups;
        outcome.map = map;
        Ok(outcome)
    }

    fn check_digest_shape(&self, map: &DigestMap, source: &Path) {
        let Some(algorithm) = self.algorithm else {
            return;
        };
        let mismatched = map
            .iter()
            .any(|(digest, _)| digest.len() != algorithm.digest_len());
        if mismatched {
            log::warn!(
                "{} contains digests that were not produced by {}; rescanned files will not match them",
                source.display(),
                algorithm.as_str()
            );
        }
    }
}
