//! Local persistence for the last capture and the composer's saved name.
//!
//! Two JSON files under the storage dir, each its own scope:
//!   capture.json : `storedScreenshot` (data URL) + `screenshotTimestamp` (epoch ms)
//!   composer.json: `savedName`
//!
//! Every write replaces the whole file (temp file + rename), so readers only
//! ever see a complete value. The last writer wins.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::capture::{CaptureError, EncodedBitmap};

const CAPTURE_FILE: &str = "capture.json";
const COMPOSER_FILE: &str = "composer.json";

/// The most recent successful capture.
#[derive(Debug, Clone, PartialEq)]
pub struct StoredCapture {
    pub image: EncodedBitmap,
    pub captured_at_ms: i64,
}

#[derive(Debug, Serialize, Deserialize)]
struct CaptureRecord {
    #[serde(rename = "storedScreenshot")]
    stored_screenshot: String,
    #[serde(rename = "screenshotTimestamp")]
    screenshot_timestamp: i64,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct ComposerRecord {
    #[serde(rename = "savedName", default)]
    saved_name: String,
}

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Failed to create storage dir {}: {source}", path.display())]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Stored data in {} is corrupt: {detail}", path.display())]
    Corrupt { path: PathBuf, detail: String },

    #[error("Failed to serialize record: {0}")]
    Serialize(#[from] serde_json::Error),
}

pub struct LocalStore {
    dir: PathBuf,
    write_lock: Mutex<()>,
}

impl LocalStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            write_lock: Mutex::new(()),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Replace the stored capture.
    pub fn save_capture(&self, capture: &StoredCapture) -> Result<(), StorageError> {
        let record = CaptureRecord {
            stored_screenshot: capture.image.to_data_url(),
            screenshot_timestamp: capture.captured_at_ms,
        };
        self.write_record(CAPTURE_FILE, &record)?;
        log::info!(
            "[STORAGE] Saved capture ({} bytes, t={})",
            capture.image.len(),
            capture.captured_at_ms
        );
        Ok(())
    }

    /// The last stored capture, or `None` if there is none.
    pub fn load_capture(&self) -> Result<Option<StoredCapture>, StorageError> {
        let path = self.dir.join(CAPTURE_FILE);
        let Some(record) = read_record::<CaptureRecord>(&path)? else {
            return Ok(None);
        };
        let image = EncodedBitmap::from_data_url(&record.stored_screenshot).map_err(
            |e: CaptureError| StorageError::Corrupt {
                path: path.clone(),
                detail: e.to_string(),
            },
        )?;
        Ok(Some(StoredCapture {
            image,
            captured_at_ms: record.screenshot_timestamp,
        }))
    }

    /// Delete the stored capture. Deleting nothing is not an error.
    pub fn clear_capture(&self) -> Result<(), StorageError> {
        let _guard = self.lock();
        let path = self.dir.join(CAPTURE_FILE);
        match std::fs::remove_file(&path) {
            Ok(()) => {
                log::info!("[STORAGE] Cleared stored capture");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StorageError::Write { path, source }),
        }
    }

    pub fn save_name(&self, name: &str) -> Result<(), StorageError> {
        let record = ComposerRecord {
            saved_name: name.to_string(),
        };
        self.write_record(COMPOSER_FILE, &record)
    }

    /// The saved name, empty if never set.
    pub fn load_name(&self) -> Result<String, StorageError> {
        let path = self.dir.join(COMPOSER_FILE);
        Ok(read_record::<ComposerRecord>(&path)?
            .unwrap_or_default()
            .saved_name)
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, ()> {
        // A panicked writer cannot leave a half-written file behind, so a
        // poisoned lock is still safe to take.
        self.write_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write_record<T: Serialize>(&self, file: &str, record: &T) -> Result<(), StorageError> {
        let _guard = self.lock();

        std::fs::create_dir_all(&self.dir).map_err(|source| StorageError::CreateDir {
            path: self.dir.clone(),
            source,
        })?;

        let path = self.dir.join(file);
        let tmp = self.dir.join(format!("{}.tmp", file));
        let json = serde_json::to_string_pretty(record)?;

        std::fs::write(&tmp, json).map_err(|source| StorageError::Write {
            path: tmp.clone(),
            source,
        })?;
        std::fs::rename(&tmp, &path).map_err(|source| StorageError::Write { path, source })?;
        Ok(())
    }
}

fn read_record<T: for<'de> Deserialize<'de>>(path: &Path) -> Result<Option<T>, StorageError> {
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(StorageError::Read {
                path: path.to_path_buf(),
                source,
            })
        }
    };
    serde_json::from_str(&raw)
        .map(Some)
        .map_err(|e| StorageError::Corrupt {
            path: path.to_path_buf(),
            detail: e.to_string(),
        })
}
