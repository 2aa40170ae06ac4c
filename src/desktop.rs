//! Tauri app shell: state, overlay window surface, and entry point.
//!
//! No capture logic lives here: the overlay window only forwards input to
//! `SelectionOverlay`, and finished selections go through `SnipPipeline`.

use std::sync::Mutex;

use tauri::{AppHandle, Emitter, Manager};
use tauri_plugin_global_shortcut::ShortcutState;

use crate::capture::{CompletionEvent, SelectionRect, XcapPlatform};
use crate::config::SnipConfig;
use crate::notice::Notice;
use crate::overlay::{OverlayOutcome, OverlaySurface, SelectionOverlay};
use crate::pipeline::{CompletionSink, SnipPipeline};
use crate::tray;

pub(crate) const OVERLAY_WINDOW: &str = "overlay";
pub(crate) const POPUP_WINDOW: &str = "main";

/// Everything the commands need, managed by Tauri.
pub(crate) struct DesktopState {
    pub overlay: Mutex<SelectionOverlay<WindowSurface>>,
    pub pipeline: SnipPipeline<XcapPlatform>,
    pub config: SnipConfig,
}

impl DesktopState {
    fn new(app: &AppHandle, config: SnipConfig) -> Self {
        let sink = Box::new(EventSink { app: app.clone() });
        Self {
            overlay: Mutex::new(SelectionOverlay::new(
                WindowSurface { app: app.clone() },
                config.min_selection_px,
            )),
            pipeline: SnipPipeline::new(XcapPlatform, &config, sink),
            config,
        }
    }
}

/// The overlay is a fullscreen transparent webview; its page draws the
/// selection box from `selection-changed` events.
pub(crate) struct WindowSurface {
    app: AppHandle,
}

impl OverlaySurface for WindowSurface {
    fn mount(&mut self) {
        if let Some(stale) = self.app.get_webview_window(OVERLAY_WINDOW) {
            if let Err(e) = stale.destroy() {
                log::warn!("[OVERLAY] Failed to destroy stale overlay window: {}", e);
            }
        }
        match tauri::WebviewWindowBuilder::new(
            &self.app,
            OVERLAY_WINDOW,
            tauri::WebviewUrl::App("overlay.html".into()),
        )
        .fullscreen(true)
        .transparent(true)
        .decorations(false)
        .always_on_top(true)
        .skip_taskbar(true)
        .title("Snip Overlay")
        .build()
        {
            Ok(_) => log::info!("[OVERLAY] Window opened"),
            Err(e) => log::error!("[OVERLAY] Failed to open window: {}", e),
        }
    }

    fn draw_selection(&mut self, rect: &SelectionRect) {
        if let Err(e) = self.app.emit_to(OVERLAY_WINDOW, "selection-changed", rect) {
            log::warn!("[OVERLAY] Failed to send selection box: {}", e);
        }
    }

    fn unmount(&mut self) {
        if let Some(window) = self.app.get_webview_window(OVERLAY_WINDOW) {
            if let Err(e) = window.destroy() {
                log::error!("[OVERLAY] Failed to close window: {}", e);
            }
        }
    }
}

/// Broadcasts `screenshot-completed` to every open window.
struct EventSink {
    app: AppHandle,
}

impl CompletionSink for EventSink {
    fn deliver(&self, event: &CompletionEvent) -> bool {
        self.app.emit("screenshot-completed", event).is_ok()
    }
}

pub(crate) fn show_notice(app: &AppHandle, notice: &Notice) {
    log::info!("[NOTICE] {:?}: {}", notice.kind, notice.message);
    if let Err(e) = app.emit("snip-notice", notice) {
        log::warn!("[NOTICE] Failed to emit notice: {}", e);
    }
}

/// Arm the overlay. Shared by the tray, the hotkey, and the popup button.
pub(crate) fn begin_selection(app: &AppHandle) -> Result<(), String> {
    // Keep the popup out of the way (and out of the frame).
    if let Some(popup) = app.get_webview_window(POPUP_WINDOW) {
        if let Err(e) = popup.hide() {
            log::warn!("[OVERLAY] Failed to hide popup before selection: {}", e);
        }
    }

    let state = app.state::<DesktopState>();
    state.overlay.lock().map_err(|e| e.to_string())?.activate();
    show_notice(app, &Notice::selection_armed());
    Ok(())
}

/// Hand a finished gesture to the pipeline and tell the user how it went.
pub(crate) async fn complete_selection(app: &AppHandle, outcome: OverlayOutcome) {
    let state = app.state::<DesktopState>();
    if matches!(outcome, OverlayOutcome::Selected(_)) {
        tokio::time::sleep(state.config.overlay_settle).await;
    }
    let notice = state.pipeline.finish_selection(outcome).await;
    show_notice(app, &notice);

    if let Some(popup) = app.get_webview_window(POPUP_WINDOW) {
        if let Err(e) = popup.show() {
            log::warn!("[POPUP] Failed to show popup after capture: {}", e);
        }
    }
}

/// Open (or focus) the popup with the status composer and preview.
pub(crate) fn show_popup(app: &AppHandle) {
    if let Some(window) = app.get_webview_window(POPUP_WINDOW) {
        if let Err(e) = window.show().and_then(|_| window.set_focus()) {
            log::warn!("[POPUP] Failed to focus existing window: {}", e);
        }
        return;
    }
    match tauri::WebviewWindowBuilder::new(app, POPUP_WINDOW, tauri::WebviewUrl::App("index.html".into()))
        .title("Work Status")
        .inner_size(380.0, 560.0)
        .resizable(false)
        .center()
        .build()
    {
        Ok(_) => log::info!("[POPUP] Window opened"),
        Err(e) => log::error!("[POPUP] Failed to open: {}", e),
    }
}

/// Entry point: called by Tauri runtime.
#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    // Load .env.local → .env from the working directory.
    'env_load: for env_file in [".env.local", ".env"] {
        let path = std::path::Path::new(env_file);
        if path.exists() {
            match dotenvy::from_path(path) {
                Ok(_) => eprintln!("[STARTUP] Loaded {}", path.display()),
                Err(e) => eprintln!("[STARTUP] Failed to load {}: {}", path.display(), e),
            }
            break 'env_load;
        }
    }

    env_logger::init();

    let config = SnipConfig::from_env();
    log::info!("[CONFIG] {:?}", config);

    tauri::Builder::default()
        .plugin(tauri_plugin_shell::init())
        .plugin(tauri_plugin_dialog::init())
        .invoke_handler(tauri::generate_handler![
            crate::commands::begin_selection,
            crate::commands::overlay_input,
            crate::commands::close_overlay,
            crate::commands::capture_visible_area,
            crate::commands::relay_message,
            crate::commands::get_stored_capture,
            crate::commands::clear_stored_capture,
            crate::commands::copy_capture_to_clipboard,
            crate::commands::save_capture_file,
            crate::commands::get_saved_name,
            crate::commands::set_saved_name,
            crate::commands::compose_status_message,
            crate::commands::copy_text_to_clipboard,
        ])
        .setup(move |app| {
            log::info!("snip-status starting up");

            let shortcut = config.shortcut.clone();
            app.manage(DesktopState::new(app.handle(), config));

            tray::setup_tray(app.handle())?;

            app.handle().plugin(
                tauri_plugin_global_shortcut::Builder::new()
                    .with_shortcut(shortcut.as_str())?
                    .with_handler(|app, _shortcut, event| {
                        if event.state() == ShortcutState::Pressed {
                            log::info!("Shortcut pressed: starting selection");
                            if let Err(e) = begin_selection(app) {
                                log::error!("Failed to start selection: {}", e);
                            }
                        }
                    })
                    .build(),
            )?;

            log::info!("Tray and shortcut ({}) ready for snips", shortcut);
            Ok(())
        })
        .run(tauri::generate_context!())
        .expect("Error running snip-status");
}
