use crate::beat::Beat;
use crate::errors::CacheError;
use crypto_hashes::{double_sha256, Hash};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

pub const CACHE_FILE_NAME: &str = "metronomes.dat";

const MAGIC_LEN: usize = 4;
const CHECKSUM_LEN: usize = 32;

/// Durable map of beat hash to [`Beat`].
///
/// File layout: `magic (4) || bincode(map) || double_sha256(magic || map) (32)`.
/// Readers and writers are serialized by the inner lock; `put` never
/// overwrites an entry that is already present.
pub struct BeatCache {
    path: PathBuf,
    magic: [u8; 4],
    entries: RwLock<HashMap<Hash, Beat>>,
}

impl BeatCache {
    /// Empty cache bound to `path`; nothing is read until [`BeatCache::load`]
    pub fn new(path: impl Into<PathBuf>, magic: [u8; 4]) -> Self {
        Self { path: path.into(), magic, entries: RwLock::new(HashMap::new()) }
    }

    /// Bind to `<data_dir>/metronomes.dat` and load whatever is there.
    /// A corrupt file is logged and the cache starts empty.
    pub fn open(data_dir: &Path, magic: [u8; 4]) -> Self {
        let cache = Self::new(data_dir.join(CACHE_FILE_NAME), magic);
        match cache.load() {
            Ok(0) => debug!("No cached beats at {}", cache.path.display()),
            Ok(n) => info!("Loaded {} cached beats from {}", n, cache.path.display()),
            Err(e) => warn!("Discarding beat cache {}: {}", cache.path.display(), e),
        }
        cache
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get(&self, hash: &Hash) -> Option<Beat> {
        self.entries.read().get(hash).cloned()
    }

    /// Insert `beat` under `hash` unless an entry already exists.
    /// Returns whether the entry was inserted.
    pub fn put(&self, hash: Hash, beat: Beat) -> bool {
        let mut entries = self.entries.write();
        if entries.contains_key(&hash) {
            return false;
        }
        entries.insert(hash, beat);
        true
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Write the whole map atomically: temp file in the same directory,
    /// fsync, then rename over the old file.
    pub fn save(&self) -> Result<(), CacheError> {
        let bytes = {
            let entries = self.entries.read();
            encode(&self.magic, &entries)?
        };

        let dir = self
            .path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        let mut tmp = NamedTempFile::new_in(dir)?;
        tmp.write_all(&bytes)?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| CacheError::Io(e.error))?;

        debug!("Saved {} beats to {}", self.len(), self.path.display());
        Ok(())
    }

    /// Replace the in-memory map with the file contents.
    ///
    /// A missing file loads nothing. Any integrity failure leaves the map
    /// empty and reports [`CacheError::Corrupt`].
    pub fn load(&self) -> Result<usize, CacheError> {
        let bytes = match fs::read(&self.path) {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                self.entries.write().clear();
                return Ok(0);
            }
            Err(e) => return Err(e.into()),
        };

        let mut entries = self.entries.write();
        match decode(&self.magic, &bytes) {
            Ok(map) => {
                *entries = map;
                Ok(entries.len())
            }
            Err(e) => {
                entries.clear();
                Err(e)
            }
        }
    }

    /// Flush to disk at shutdown
    pub fn close(&self) -> Result<(), CacheError> {
        self.save()
    }
}

fn encode(magic: &[u8; 4], entries: &HashMap<Hash, Beat>) -> Result<Vec<u8>, CacheError> {
    let payload = bincode::serialize(entries)?;
    let mut bytes = Vec::with_capacity(MAGIC_LEN + payload.len() + CHECKSUM_LEN);
    bytes.extend_from_slice(magic);
    bytes.extend_from_slice(&payload);
    let checksum = double_sha256(&bytes);
    bytes.extend_from_slice(&checksum);
    Ok(bytes)
}

fn decode(magic: &[u8; 4], bytes: &[u8]) -> Result<HashMap<Hash, Beat>, CacheError> {
    if bytes.len() < MAGIC_LEN + CHECKSUM_LEN {
        return Err(CacheError::Corrupt(format!("file too short ({} bytes)", bytes.len())));
    }

    let (body, checksum) = bytes.split_at(bytes.len() - CHECKSUM_LEN);
    if double_sha256(body).as_slice() != checksum {
        return Err(CacheError::Corrupt("checksum mismatch".to_string()));
    }
    if &body[..MAGIC_LEN] != magic {
        return Err(CacheError::Corrupt("invalid network magic number".to_string()));
    }

    bincode::deserialize(&body[MAGIC_LEN..])
        .map_err(|e| CacheError::Corrupt(format!("deserialize or I/O error: {}", e)))
}
