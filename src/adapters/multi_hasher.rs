use crate::domain::HashAlgorithm;
use crate::error::DupError;
use crate::ports::HashingPort;
use blake3::Hasher as Blake3Hasher;
use memmap2::MmapOptions;
use sha1::Sha1;
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::{ErrorKind, Read};
use std::path::Path;
use xxhash_rust::xxh3::Xxh3;
use xxhash_rust::xxh64::Xxh64;

pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;
pub const DEFAULT_MMAP_THRESHOLD: u64 = 64 * 1024 * 1024;

enum DigestState {
    Md5(md5::Context),
    Sha1(Sha1),
    Sha256(Sha256),
    Blake3(Box<Blake3Hasher>),
    XxHash64(Xxh64),
    XxHash3(Box<Xxh3>),
}

impl DigestState {
    fn new(algorithm: HashAlgorithm) -> Self {
        match algorithm {
            HashAlgorithm::Md5 => DigestState::Md5(md5::Context::new()),
            HashAlgorithm::Sha1 => DigestState::Sha1(Sha1::new()),
            HashAlgorithm::Sha256 => DigestState::Sha256(Sha256::new()),
            HashAlgorithm::Blake3 => DigestState::Blake3(Box::new(Blake3Hasher::new())),
            HashAlgorithm::XxHash64 => DigestState::XxHash64(Xxh64::new(0)),
            HashAlgorithm::XxHash3 => DigestState::XxHash3(Box::new(Xxh3::new())),
        }
    }

    fn update(&mut self, data: &[u8]) {
        match self {
            DigestState::Md5(ctx) => ctx.consume(data),
            DigestState::Sha1(hasher) => hasher.update(data),
            DigestState::Sha256(hasher) => hasher.update(data),
            DigestState::Blake3(hasher) => {
                hasher.update(data);
            }
            DigestState::XxHash64(hasher) => hasher.update(data),
            DigestState::XxHash3(hasher) => hasher.update(data),
        }
    }

    fn finalize(self) -> String {
        match self {
            DigestState::Md5(ctx) => format!("{:x}", ctx.compute()),
            DigestState::Sha1(hasher) => format!("{:x}", hasher.finalize()),
            DigestState::Sha256(hasher) => format!("{:x}", hasher.finalize()),
            DigestState::Blake3(hasher) => hasher.finalize().to_hex().to_string(),
            DigestState::XxHash64(hasher) => format!("{:016x}", hasher.digest()),
            DigestState::XxHash3(hasher) => format!("{:016x}", hasher.digest()),
        }
    }
}

/// Streams a file through the configured digest `chunk_size` bytes at a time.
pub struct MultiAlgorithmHasher {
    algorithm: HashAlgorithm,
    chunk_size: usize,
    mmap_threshold: u64,
}

impl MultiAlgorithmHasher {
    pub fn new(algorithm: HashAlgorithm) -> Self {
        Self {
            algorithm,
            chunk_size: DEFAULT_CHUNK_SIZE,
            mmap_threshold: DEFAULT_MMAP_THRESHOLD,
        }
    }

    /// Rounded up to the next power of two.
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1).next_power_of_two();
        self
    }

    /// Zero disables memory mapping.
    pub fn with_mmap_threshold(mut self, threshold: u64) -> Self {
        self.mmap_threshold = threshold;
        self
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    fn hash_with_mmap(&self, file: &File) -> std::io::Result<String> {
        // SAFETY: the map is read-only and dropped before returning; a file
        // truncated underneath us surfaces as SIGBUS, same as any mmap reader.
        let mmap = unsafe { MmapOptions::new().map(file)? };
        let mut state = DigestState::new(self.algorithm);
        for chunk in mmap.chunks(self.chunk_size) {
            state.update(chunk);
        }
        Ok(state.finalize())
    }

    fn hash_with_buffered_io(&self, mut file: File) -> std::io::Result<String> {
        let mut buffer = vec![0u8; self.chunk_size];
        let mut state = DigestState::new(self.algorithm);
        loop {
            let bytes_read = match file.read(&mut buffer) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            };
            state.update(&buffer[..bytes_read]);
        }
        Ok(state.finalize())
    }
}

impl HashingPort for MultiAlgorithmHasher {
    fn hash_file(&self, path: &Path) -> Result<String, DupError> {
        let file = File::open(path).map_err(|e| DupError::unreadable(path, e))?;
        let file_size = file.metadata().map_err(|e| DupError::unreadable(path, e))?.len();

        let digest = if self.mmap_threshold > 0 && file_size >= self.mmap_threshold {
            self.hash_with_mmap(&file)
        } else {
            self.hash_with_buffered_io(file)
        };
        digest.map_err(|e| DupError::unreadable(path, e))
    }
}
