//! Tauri command handlers.
//!
//! These are thin wrappers that bridge frontend invoke() calls to the core.
//! Errors cross the boundary as strings; details are logged here.

use serde::Serialize;
use tauri::Manager;
use tauri_plugin_dialog::DialogExt;

use crate::capture::{CaptureResponse, RelayMessage};
use crate::desktop::{self, DesktopState, OVERLAY_WINDOW};
use crate::export;
use crate::notice::Notice;
use crate::overlay::OverlayEvent;
use crate::status_message;

/// Stored capture as the popup preview wants it.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredCaptureView {
    pub data_url: String,
    pub captured_at_ms: i64,
}

/// Tauri command: arm the selection overlay.
#[tauri::command]
pub async fn begin_selection(app: tauri::AppHandle) -> Result<(), String> {
    desktop::begin_selection(&app)
}

/// Tauri command: pointer or key input from the overlay window.
///
/// When the gesture ends, the overlay window is already gone by the time
/// the capture runs.
#[tauri::command]
pub async fn overlay_input(
    app: tauri::AppHandle,
    state: tauri::State<'_, DesktopState>,
    event: OverlayEvent,
) -> Result<(), String> {
    let outcome = {
        let mut overlay = state.overlay.lock().map_err(|e| e.to_string())?;
        overlay.handle(event)
    };

    if let Some(outcome) = outcome {
        desktop::complete_selection(&app, outcome).await;
    }
    Ok(())
}

/// Tauri command: close the overlay from outside the gesture.
#[tauri::command]
pub fn close_overlay(
    app: tauri::AppHandle,
    state: tauri::State<'_, DesktopState>,
) -> Result<(), String> {
    let outcome = state
        .overlay
        .lock()
        .map_err(|e| e.to_string())?
        .force_teardown();

    if let Some(crate::overlay::OverlayOutcome::Cancelled(reason)) = outcome {
        desktop::show_notice(&app, &Notice::cancelled(reason));
    }
    // The window may have been opened without going through the overlay.
    if let Some(window) = app.get_webview_window(OVERLAY_WINDOW) {
        window.close().map_err(|e| e.to_string())?;
    }
    Ok(())
}

/// Tauri command: capture the whole visible area without a selection.
#[tauri::command]
pub async fn capture_visible_area(
    app: tauri::AppHandle,
    state: tauri::State<'_, DesktopState>,
) -> Result<StoredCaptureView, String> {
    match state.pipeline.capture(None).await {
        Ok(stored) => {
            desktop::show_notice(&app, &Notice::capture_saved());
            Ok(StoredCaptureView {
                data_url: stored.image.to_data_url(),
                captured_at_ms: stored.captured_at_ms,
            })
        }
        Err(e) => {
            log::error!("[CAPTURE] Full-area capture failed: {}", e);
            Err(e.user_message().to_string())
        }
    }
}

/// Tauri command: raw relay protocol message.
///
/// `takeScreenshot` arms the overlay; capture actions return the
/// uncropped frame and the rect, for callers that crop themselves.
#[tauri::command]
pub async fn relay_message(
    app: tauri::AppHandle,
    state: tauri::State<'_, DesktopState>,
    message: RelayMessage,
) -> Result<CaptureResponse, String> {
    match message.into_request() {
        None => {
            desktop::begin_selection(&app)?;
            Ok(CaptureResponse::default())
        }
        Some(request) => {
            let result = state.pipeline.relay().capture(request).await;
            Ok(CaptureResponse::from(&result))
        }
    }
}

/// Tauri command: last stored capture, for the popup preview on load.
#[tauri::command]
pub fn get_stored_capture(
    state: tauri::State<'_, DesktopState>,
) -> Result<Option<StoredCaptureView>, String> {
    let stored = state
        .pipeline
        .store()
        .load_capture()
        .map_err(|e| e.to_string())?;
    Ok(stored.map(|s| StoredCaptureView {
        data_url: s.image.to_data_url(),
        captured_at_ms: s.captured_at_ms,
    }))
}

/// Tauri command: delete the stored capture.
#[tauri::command]
pub fn clear_stored_capture(state: tauri::State<'_, DesktopState>) -> Result<(), String> {
    state
        .pipeline
        .store()
        .clear_capture()
        .map_err(|e| e.to_string())
}

/// Tauri command: copy the stored capture to the clipboard as an image.
#[tauri::command]
pub fn copy_capture_to_clipboard(state: tauri::State<'_, DesktopState>) -> Result<(), String> {
    let stored = state
        .pipeline
        .store()
        .load_capture()
        .map_err(|e| e.to_string())?
        .ok_or("No screenshot available")?;
    export::copy_to_clipboard(&stored.image).map_err(|e| e.to_string())
}

/// Tauri command: save the stored capture as `work-status-<date>.png`.
///
/// Asks for a location with the save dialog; returns `None` if the user
/// cancels, otherwise the written path.
#[tauri::command]
pub async fn save_capture_file(
    app: tauri::AppHandle,
    state: tauri::State<'_, DesktopState>,
) -> Result<Option<String>, String> {
    let stored = state
        .pipeline
        .store()
        .load_capture()
        .map_err(|e| e.to_string())?
        .ok_or("No screenshot available")?;

    let file_name = export::download_file_name(chrono::Local::now().date_naive());
    let mut dialog = app.dialog().file().set_file_name(&file_name);
    if let Some(downloads) = dirs::download_dir() {
        dialog = dialog.set_directory(downloads);
    }

    let Some(chosen) = dialog.add_filter("PNG image", &["png"]).blocking_save_file() else {
        return Ok(None);
    };
    let path = chosen.into_path().map_err(|e| e.to_string())?;

    export::write_png(&stored.image, &path).map_err(|e| e.to_string())?;
    Ok(Some(path.to_string_lossy().to_string()))
}

/// Tauri command: name remembered by the status composer.
#[tauri::command]
pub fn get_saved_name(state: tauri::State<'_, DesktopState>) -> Result<String, String> {
    state
        .pipeline
        .store()
        .load_name()
        .map_err(|e| e.to_string())
}

#[tauri::command]
pub fn set_saved_name(state: tauri::State<'_, DesktopState>, name: String) -> Result<(), String> {
    state
        .pipeline
        .store()
        .save_name(&name)
        .map_err(|e| e.to_string())
}

/// Tauri command: render today's status message.
#[tauri::command]
pub fn compose_status_message(name: String, note: String) -> String {
    status_message::compose(&name, &note, chrono::Local::now().date_naive())
}

/// Tauri command: copy text to the system clipboard.
///
/// Uses arboard for native clipboard access: works reliably
/// unlike navigator.clipboard in transparent webview windows.
#[tauri::command]
pub fn copy_text_to_clipboard(text: String) -> Result<(), String> {
    let mut clipboard = arboard::Clipboard::new().map_err(|e| e.to_string())?;
    clipboard.set_text(&text).map_err(|e| e.to_string())?;
    log::info!("[EXPORT] Copied {} chars to clipboard", text.len());
    Ok(())
}
