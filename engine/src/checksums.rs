//! Content digests for duplicate detection.
//!
//! This module provides:
//! - Multiple checksum algorithms (MD5, SHA-256, BLAKE3)
//! - File-level checksum computation
//! - The `ContentHasher` seam the collision resolver compares files through

use crate::error::EngineError;
use serde::Deserialize;
use std::fmt;
use std::fs::File;
use std::io::Read;
use std::path::Path;

/// Supported checksum algorithms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChecksumAlgorithm {
    /// MD5 (fast, not collision resistant; fine for duplicate detection)
    #[default]
    Md5,
    /// SHA-256 (cryptographic, 256-bit)
    Sha256,
    /// BLAKE3 (modern, fast, 256-bit)
    Blake3,
}

impl fmt::Display for ChecksumAlgorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Md5 => write!(f, "md5"),
            Self::Sha256 => write!(f, "sha256"),
            Self::Blake3 => write!(f, "blake3"),
        }
    }
}

impl ChecksumAlgorithm {
    /// Parse algorithm from string
    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "md5" => Some(Self::Md5),
            "sha256" => Some(Self::Sha256),
            "blake3" => Some(Self::Blake3),
            _ => None,
        }
    }
}

/// A computed checksum value
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChecksumValue {
    algorithm: ChecksumAlgorithm,
    hex: String,
}

impl ChecksumValue {
    /// Create a new checksum value
    pub fn new(algorithm: ChecksumAlgorithm, hex: String) -> Self {
        ChecksumValue { algorithm, hex }
    }
}

impl fmt::Display for ChecksumValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.algorithm, self.hex)
    }
}

/// Incremental hashing state for one algorithm
trait ChecksumHasher {
    /// Update the hasher with new data
    fn update(&mut self, data: &[u8]);

    /// Finalize and return the checksum value
    fn finalize(self) -> ChecksumValue;
}

struct Md5Hasher {
    context: md5::Context,
}

impl ChecksumHasher for Md5Hasher {
    fn update(&mut self, data: &[u8]) {
        self.context.consume(data);
    }

    fn finalize(self) -> ChecksumValue {
        let digest = self.context.compute();
        ChecksumValue::new(ChecksumAlgorithm::Md5, format!("{:x}", digest))
    }
}

struct Sha256Hasher {
    hasher: sha2::Sha256,
}

impl ChecksumHasher for Sha256Hasher {
    fn update(&mut self, data: &[u8]) {
        use sha2::Digest;
        self.hasher.update(data);
    }

    fn finalize(self) -> ChecksumValue {
        use sha2::Digest;
        let digest = self.hasher.finalize();
        ChecksumValue::new(ChecksumAlgorithm::Sha256, format!("{:x}", digest))
    }
}

struct Blake3Hasher {
    hasher: blake3::Hasher,
}

impl ChecksumHasher for Blake3Hasher {
    fn update(&mut self, data: &[u8]) {
        self.hasher.update(data);
    }

    fn finalize(self) -> ChecksumValue {
        let digest = self.hasher.finalize();
        ChecksumValue::new(ChecksumAlgorithm::Blake3, digest.to_hex().to_string())
    }
}

/// Stream a file through `hasher` in 64 KB chunks.
fn hash_file<H: ChecksumHasher>(path: &Path, mut hasher: H) -> Result<ChecksumValue, EngineError> {
    let mut file = File::open(path).map_err(|e| EngineError::from_read(e, path))?;
    let mut buffer = [0u8; 65536];

    loop {
        match file.read(&mut buffer) {
            Ok(0) => break,
            Ok(n) => hasher.update(&buffer[..n]),
            Err(e) => return Err(EngineError::from_read(e, path)),
        }
    }

    Ok(hasher.finalize())
}

/// Compute checksum for a file
pub fn compute_file_checksum(
    path: &Path,
    algorithm: ChecksumAlgorithm,
) -> Result<ChecksumValue, EngineError> {
    match algorithm {
        ChecksumAlgorithm::Md5 => hash_file(
            path,
            Md5Hasher {
                context: md5::Context::new(),
            },
        ),
        ChecksumAlgorithm::Sha256 => hash_file(
            path,
            Sha256Hasher {
                hasher: sha2::Sha256::default(),
            },
        ),
        ChecksumAlgorithm::Blake3 => hash_file(
            path,
            Blake3Hasher {
                hasher: blake3::Hasher::new(),
            },
        ),
    }
}

/// Deterministic file digest used only for equality comparison.
///
/// Called from the blocking thread pool, so implementations may do
/// synchronous I/O.
pub trait ContentHasher: Send + Sync {
    fn digest(&self, path: &Path) -> Result<ChecksumValue, EngineError>;

    /// True when `source` and the file already at `destination` hash to the
    /// same digest. Read failures name the side they happened on.
    fn same_content(&self, source: &Path, destination: &Path) -> Result<bool, EngineError> {
        let source_digest = self.digest(source)?;
        let destination_digest = self.digest(destination).map_err(EngineError::on_destination)?;
        Ok(source_digest == destination_digest)
    }
}

impl ContentHasher for ChecksumAlgorithm {
    fn digest(&self, path: &Path) -> Result<ChecksumValue, EngineError> {
        compute_file_checksum(path, *self)
    }
}
