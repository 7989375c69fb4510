use crate::domain::DigestMap;
use crate::error::DupError;
use std::fs;
use std::path::{Path, PathBuf};

pub const DEFAULT_RESULTS_FILE: &str = "duplicates.json";

/// Reads and writes the digest map as a JSON object of digest to path list.
pub struct JsonStoreAdapter {
    destination: PathBuf,
}

impl JsonStoreAdapter {
    pub fn new(destination: impl Into<PathBuf>) -> Self {
        Self {
            destination: destination.into(),
        }
    }

    pub fn destination(&self) -> &Path {
        &self.destination
    }

    pub fn load(&self, source: &Path) -> Result<DigestMap, DupError> {
        let contents = fs::read_to_string(source).map_err(|e| DupError::PersistIo {
            path: source.to_path_buf(),
            message: e.to_string(),
        })?;
        let mut map: DigestMap =
            serde_json::from_str(&contents).map_err(|e| DupError::MalformedPersistedData {
                path: source.to_path_buf(),
                source: e,
            })?;

        let dropped = map.drop_empty();
        if dropped > 0 {
            log::debug!("Dropped {} empty digest entries from {}", dropped, source.display());
        }
        log::info!(
            "Loaded {} files under {} digests from {}",
            map.file_count(),
            map.digest_count(),
            source.display()
        );
        Ok(map)
    }

    pub fn save(&self, map: &DigestMap) -> Result<(), DupError> {
        let persist_error = |message: String| DupError::PersistIo {
            path: self.destination.clone(),
            message,
        };

        if let Some(parent) = self.destination.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| persist_error(e.to_string()))?;
        }

        let contents = serde_json::to_string_pretty(map).map_err(|e| persist_error(e.to_string()))?;
        fs::write(&self.destination, contents).map_err(|e| persist_error(e.to_string()))?;
        log::info!("Saved {} digests to {}", map.digest_count(), self.destination.display());
        Ok(())
    }
}

impl Default for JsonStoreAdapter {
    fn default() -> Self {
        Self::new(DEFAULT_RESULTS_FILE)
    }
}
