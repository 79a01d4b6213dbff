use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Cursor, Read, Seek};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::{PlaybackError, Result};

/// A readable, seekable byte source. Ownership moves into the decoder once bound.
pub trait ByteStream: Read + Seek {}

impl<T: Read + Seek> ByteStream for T {}

/// Opens byte streams from opaque resource hashes.
pub trait ResourceManager {
    fn create_stream(&self, file_hash: u32) -> Result<Box<dyn ByteStream>>;
}

/// Resolves `<root>/<HASH>.csf`, with the hash as 8 uppercase hex digits.
#[derive(Clone, Debug)]
pub struct DirectoryResources {
    root: PathBuf,
}

impl DirectoryResources {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn path_for(&self, file_hash: u32) -> PathBuf {
        self.root.join(resource_file_name(file_hash))
    }
}

impl ResourceManager for DirectoryResources {
    fn create_stream(&self, file_hash: u32) -> Result<Box<dyn ByteStream>> {
        let path = self.path_for(file_hash);
        match File::open(&path) {
            Ok(file) => {
                log::debug!("opened resource {file_hash:08X} at {}", path.display());
                Ok(Box::new(BufReader::new(file)))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(PlaybackError::ResourceNotFound { hash: file_hash })
            }
            Err(e) => Err(e.into()),
        }
    }
}

/// File name a resource hash resolves to.
pub fn resource_file_name(file_hash: u32) -> String {
    format!("{file_hash:08X}.csf")
}

/// Parse a file stem such as `0A1B2C3D` back into its resource hash.
pub fn parse_resource_hash(stem: &str) -> Option<u32> {
    if stem.len() != 8 || !stem.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }
    u32::from_str_radix(stem, 16).ok()
}

/// In-memory resources, keyed by hash.
#[derive(Clone, Debug, Default)]
pub struct MemoryResources {
    entries: HashMap<u32, Arc<[u8]>>,
}

impl MemoryResources {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, file_hash: u32, data: impl Into<Arc<[u8]>>) {
        self.entries.insert(file_hash, data.into());
    }

    pub fn contains(&self, file_hash: u32) -> bool {
        self.entries.contains_key(&file_hash)
    }
}

/// Cursor over shared bytes, so every stream opened from the same entry is independent.
struct SharedBytes(Arc<[u8]>);

impl AsRef<[u8]> for SharedBytes {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl ResourceManager for MemoryResources {
    fn create_stream(&self, file_hash: u32) -> Result<Box<dyn ByteStream>> {
        let data = self
            .entries
            .get(&file_hash)
            .ok_or(PlaybackError::ResourceNotFound { hash: file_hash })?;
        Ok(Box::new(Cursor::new(SharedBytes(Arc::clone(data)))))
    }
}
