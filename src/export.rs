//! Getting a capture out of the app: as a dated PNG file or on the clipboard.

use chrono::NaiveDate;
use std::borrow::Cow;
use std::path::{Path, PathBuf};

use crate::capture::{decode_png, EncodedBitmap};

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("Failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Stored image could not be decoded: {0}")]
    Decode(String),

    #[error("Clipboard unavailable: {0}")]
    Clipboard(String),
}

/// `work-status-<YYYY-MM-DD>.png`
pub fn download_file_name(date: NaiveDate) -> String {
    format!("work-status-{}.png", date.format("%Y-%m-%d"))
}

/// Write the PNG into `dir` under the dated download name.
///
/// Returns the full path written.
pub fn save_to_dir(image: &EncodedBitmap, dir: &Path, date: NaiveDate) -> Result<PathBuf, ExportError> {
    let path = dir.join(download_file_name(date));
    write_png(image, &path)?;
    Ok(path)
}

/// Write the PNG to an exact path (e.g. one picked in a save dialog).
pub fn write_png(image: &EncodedBitmap, path: &Path) -> Result<(), ExportError> {
    std::fs::write(path, image.as_bytes()).map_err(|source| ExportError::Write {
        path: path.to_path_buf(),
        source,
    })?;
    log::info!("[EXPORT] Wrote {} bytes to {}", image.len(), path.display());
    Ok(())
}

/// Put the image on the system clipboard as raw RGBA.
pub fn copy_to_clipboard(image: &EncodedBitmap) -> Result<(), ExportError> {
    let rgba = decode_png(image)
        .map_err(|e| ExportError::Decode(e.to_string()))?
        .to_rgba8();
    let (width, height) = rgba.dimensions();

    let mut clipboard = arboard::Clipboard::new().map_err(|e| ExportError::Clipboard(e.to_string()))?;
    clipboard
        .set_image(arboard::ImageData {
            width: width as usize,
            height: height as usize,
            bytes: Cow::Owned(rgba.into_raw()),
        })
        .map_err(|e| ExportError::Clipboard(e.to_string()))?;

    log::info!("[EXPORT] Copied {}x{} image to clipboard", width, height);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_name_uses_iso_date() {
        let date = NaiveDate::from_ymd_opt(2026, 3, 7).unwrap();
        assert_eq!(download_file_name(date), "work-status-2026-03-07.png");
    }

    #[test]
    fn save_writes_exact_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let image = EncodedBitmap::from_png(vec![0x89, 0x50, 0x4E, 0x47, 42]);
        let date = NaiveDate::from_ymd_opt(2026, 10, 19).unwrap();

        let path = save_to_dir(&image, dir.path(), date).unwrap();

        assert!(path.ends_with("work-status-2026-10-19.png"));
        assert_eq!(std::fs::read(&path).unwrap(), image.as_bytes());
    }

    #[test]
    fn save_into_missing_dir_fails() {
        let dir = tempfile::tempdir().unwrap();
        let image = EncodedBitmap::from_png(vec![1]);
        let date = NaiveDate::from_ymd_opt(2026, 1, 1).unwrap();
        let result = save_to_dir(&image, &dir.path().join("nope"), date);
        assert!(matches!(result, Err(ExportError::Write { .. })));
    }

    #[test]
    fn clipboard_rejects_undecodable_image() {
        let result = copy_to_clipboard(&EncodedBitmap::from_png(b"junk".to_vec()));
        assert!(matches!(result, Err(ExportError::Decode(_))));
    }
}
