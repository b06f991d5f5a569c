// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use crate::utils::{clean_path, path_to_string, resolve_path};

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use parking_lot::RwLock;
use sha2::{Digest, Sha256};

#[derive(Debug, thiserror::Error)]
pub enum FileError {
    /// The file does not exist.
    #[error("file \"{0}\" not found")]
    NotFound(String),
    /// Any other failure while reading the file.
    #[error("failed to read \"{path}\": {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl FileError {
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

/// Supplies file contents to the resolver.
///
/// `path` is resolved against the directory of `relative_to` unless it is
/// absolute. Implementations shared between callers must do their own
/// locking since the methods take `&self`.
pub trait FileProvider {
    /// Contents of the file and the lowercase hex SHA-256 of the contents.
    fn get_file_and_hash(&self, relative_to: &str, path: &str)
        -> Result<(String, String), FileError>;
}

impl<P: FileProvider + ?Sized> FileProvider for &P {
    fn get_file_and_hash(
        &self,
        relative_to: &str,
        path: &str,
    ) -> Result<(String, String), FileError> {
        (**self).get_file_and_hash(relative_to, path)
    }
}

pub fn hash_content(content: &str) -> String {
    hex::encode(Sha256::digest(content.as_bytes()))
}

/// Reads schema files from disk.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsFileProvider;

impl FileProvider for FsFileProvider {
    fn get_file_and_hash(
        &self,
        relative_to: &str,
        path: &str,
    ) -> Result<(String, String), FileError> {
        let full = path_to_string(&resolve_path(relative_to, path));
        match std::fs::read_to_string(&full) {
            Ok(content) => {
                let hash = hash_content(&content);
                Ok((content, hash))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Err(FileError::NotFound(full)),
            Err(source) => Err(FileError::Io { path: full, source }),
        }
    }
}

/// In-memory files keyed by normalized path. Used by editors that hold
/// unsaved buffers, and by tests.
#[derive(Debug, Default)]
pub struct MemoryFileProvider {
    files: RwLock<BTreeMap<PathBuf, String>>,
}

impl MemoryFileProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder style insertion.
    pub fn with_file(self, path: &str, content: &str) -> Self {
        self.insert(path, content);
        self
    }

    pub fn insert(&self, path: &str, content: &str) {
        self.files
            .write()
            .insert(clean_path(Path::new(path)), content.to_string());
    }

    pub fn remove(&self, path: &str) -> Option<String> {
        self.files.write().remove(&clean_path(Path::new(path)))
    }

    pub fn len(&self) -> usize {
        self.files.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.read().is_empty()
    }
}

impl FileProvider for MemoryFileProvider {
    fn get_file_and_hash(
        &self,
        relative_to: &str,
        path: &str,
    ) -> Result<(String, String), FileError> {
        let full = resolve_path(relative_to, path);
        match self.files.read().get(&full) {
            Some(content) => Ok((content.clone(), hash_content(content))),
            None => Err(FileError::NotFound(path_to_string(&full))),
        }
    }
}
