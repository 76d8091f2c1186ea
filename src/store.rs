use std::fs;
use std::io;

use camino::{Utf8Path, Utf8PathBuf};
use directories::BaseDirs;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::PapersError;

const APP_DIR_NAME: &str = "past-papers";
const MANIFEST_CACHE_FILE: &str = "manifest-cache.json";
const DOWNLOAD_INDEX_FILE: &str = "downloads.json";
const PDF_DIR: &str = "pdfs";

#[derive(Debug, Clone)]
pub struct Store {
    root: Utf8PathBuf,
}

impl Store {
    pub fn new() -> Result<Self, PapersError> {
        let root = BaseDirs::new()
            .and_then(|dirs| Utf8PathBuf::from_path_buf(dirs.data_dir().join(APP_DIR_NAME)).ok())
            .ok_or_else(|| PapersError::Filesystem("unable to resolve data directory".to_string()))?;
        Ok(Self { root })
    }

    pub fn new_with_root(root: Utf8PathBuf) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Utf8Path {
        &self.root
    }

    pub fn manifest_cache_path(&self) -> Utf8PathBuf {
        self.root.join(MANIFEST_CACHE_FILE)
    }

    pub fn download_index_path(&self) -> Utf8PathBuf {
        self.root.join(DOWNLOAD_INDEX_FILE)
    }

    pub fn pdf_dir(&self) -> Utf8PathBuf {
        self.root.join(PDF_DIR)
    }

    pub fn ensure_layout(&self) -> Result<(), PapersError> {
        fs::create_dir_all(self.pdf_dir().as_std_path())
            .map_err(|err| PapersError::Filesystem(format!("create {}: {err}", self.pdf_dir())))
    }

    pub fn read_json<T: DeserializeOwned>(path: &Utf8Path) -> Option<T> {
        let content = match fs::read_to_string(path.as_std_path()) {
            Ok(content) => content,
            Err(err) => {
                if err.kind() != io::ErrorKind::NotFound {
                    tracing::debug!(path = %path, error = %err, "unreadable JSON file treated as absent");
                }
                return None;
            }
        };
        match serde_json::from_str(&content) {
            Ok(value) => Some(value),
            Err(err) => {
                tracing::debug!(path = %path, error = %err, "malformed JSON file treated as absent");
                None
            }
        }
    }

    pub fn write_json<T: Serialize + ?Sized>(path: &Utf8Path, value: &T) -> Result<(), PapersError> {
        let content = serde_json::to_vec_pretty(value)
            .map_err(|err| PapersError::Filesystem(err.to_string()))?;
        Self::write_bytes_atomic(path, &content)
    }

    pub fn write_bytes_atomic(path: &Utf8Path, content: &[u8]) -> Result<(), PapersError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent.as_std_path())
                .map_err(|err| PapersError::Filesystem(err.to_string()))?;
        }
        let tmp_path = path.with_extension("tmp");
        fs::write(tmp_path.as_std_path(), content)
            .map_err(|err| PapersError::Filesystem(format!("write {tmp_path}: {err}")))?;
        fs::rename(tmp_path.as_std_path(), path.as_std_path())
            .map_err(|err| PapersError::Filesystem(format!("rename into {path}: {err}")))?;
        Ok(())
    }

    pub fn exists(path: &Utf8Path) -> bool {
        path.as_std_path().is_file()
    }

    pub fn file_size(path: &Utf8Path) -> Option<u64> {
        fs::metadata(path.as_std_path()).ok().map(|meta| meta.len())
    }

    pub fn remove_file_if_exists(path: &Utf8Path) -> Result<(), PapersError> {
        match fs::remove_file(path.as_std_path()) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(PapersError::Filesystem(format!("remove {path}: {err}"))),
        }
    }
}
