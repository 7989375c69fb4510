use crate::domain::{DigestMap, ScanConfig, ScanOutcome, SkippedFile};
use crate::error::DupError;
use crate::ports::{FileSystemPort, HashingPort, ProgressPort};
use anyhow::Result;
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Walks a tree and folds every file's digest into a [`DigestMap`].
///
/// Files that fail to hash are skipped with a warning and reported in
/// [`ScanOutcome::skipped`]; the scan itself only fails when the root cannot
/// be enumerated.
pub struct ScannerService<F, H, P> {
    filesystem: F,
    hasher: H,
    progress: P,
}

impl<F, H, P> ScannerService<F, H, P>
where
    F: FileSystemPort + Sync,
    H: HashingPort + Send + Sync,
    P: ProgressPort + Send + Sync,
{
    pub fn new(filesystem: F, hasher: H, progress: P) -> Self {
        Self {
            filesystem,
            hasher,
            progress,
        }
    }

    pub fn scan(&self, root: &Path, config: &ScanConfig, mut map: DigestMap) -> Result<ScanOutcome> {
        let files = self.filesystem.list_files(root, config)?;
        log::info!("Hashing {} files under {}", files.len(), root.display());

        let results = match config.thread_count {
            Some(threads) => {
                let pool = rayon::ThreadPoolBuilder::new()
                    .num_threads(threads)
                    .build()
                    .map_err(|e| anyhow::anyhow!("Failed to configure thread pool: {}", e))?;
                pool.install(|| self.hash_files_parallel(files))
            }
            None => self.hash_files_parallel(files),
        };

        let mut hashed = 0;
        let mut skipped = Vec::new();
        for (path, result) in results {
            match result {
                Ok(digest) => {
                    map.insert(digest, path);
                    hashed += 1;
                }
                Err(e) => {
                    log::warn!("Skipping {}: {}", path.display(), e);
                    skipped.push(SkippedFile {
                        path,
                        reason: e.to_string(),
                    });
                }
            }
        }

        log::debug!(
            "Scan of {} finished: {} hashed, {} skipped",
            root.display(),
            hashed,
            skipped.len()
        );
        Ok(ScanOutcome { map, hashed, skipped })
    }

    fn hash_files_parallel(&self, files: Vec<PathBuf>) -> Vec<(PathBuf, Result<String, DupError>)> {
        let counter = AtomicUsize::new(0);
        self.progress.start(files.len() as u64);

        let results = files
            .into_par_iter()
            .map(|path| {
                let result = self.hasher.hash_file(&path);
                let count = counter.fetch_add(1, Ordering::Relaxed);
                self.progress.update(count as u64 + 1);
                (path, result)
            })
            .collect();

        self.progress.finish();
        results
    }
}
