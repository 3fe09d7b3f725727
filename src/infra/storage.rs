//! Local-disk storage for uploaded media.

use crate::error::AppError;
use std::fs;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// URL prefix uploaded files are served under.
pub const PUBLIC_PREFIX: &str = "/uploads";

#[derive(Debug, Clone)]
pub struct MediaStore {
    dir: PathBuf,
    max_bytes: usize,
}

#[derive(Debug, Clone)]
pub struct StoredFile {
    pub filename: String,
    pub public_path: String,
}

impl MediaStore {
    pub fn new(dir: impl Into<PathBuf>, max_bytes: usize) -> Result<Self, AppError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;
        Ok(Self { dir, max_bytes })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn max_bytes(&self) -> usize {
        self.max_bytes
    }

    /// Write bytes under a fresh `<uuid>.<ext>` name.
    pub fn save(&self, extension: &str, bytes: &[u8]) -> Result<StoredFile, AppError> {
        if bytes.len() > self.max_bytes {
            return Err(AppError::PayloadTooLarge);
        }
        let filename = format!("{}.{}", Uuid::new_v4(), extension);
        fs::write(self.dir.join(&filename), bytes)?;
        Ok(StoredFile {
            public_path: format!("{}/{}", PUBLIC_PREFIX, filename),
            filename,
        })
    }

    /// Missing files are not an error.
    pub fn remove(&self, filename: &str) -> Result<(), AppError> {
        let path = self.resolve(filename)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                log::warn!("media file already gone: {:?}", path);
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    /// Map a stored filename to its on-disk path, rejecting anything that could escape the dir.
    pub fn resolve(&self, filename: &str) -> Result<PathBuf, AppError> {
        validate_file_name(filename)?;
        Ok(self.dir.join(filename))
    }
}

fn validate_file_name(name: &str) -> Result<(), AppError> {
    let ok = !name.is_empty()
        && !name.starts_with('.')
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '.' || c == '_');
    if ok {
        Ok(())
    } else {
        Err(AppError::NotFound(format!("file {}", name)))
    }
}
