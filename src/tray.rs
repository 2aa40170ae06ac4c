//! System tray setup and click handler.
//!
//! The tray icon is the primary entry point. Clicking it arms the
//! selection overlay.

use tauri::{
    image::Image as TauriImage,
    menu::{MenuBuilder, MenuItemBuilder},
    tray::TrayIconBuilder,
    AppHandle,
};

use crate::desktop;

/// Sets up the system tray icon with a click handler.
///
/// Left-click: starts a selection.
/// Right-click: menu with Take Screenshot, Open, Quit.
pub fn setup_tray(app: &AppHandle) -> Result<(), Box<dyn std::error::Error>> {
    let snip_item = MenuItemBuilder::with_id("snip", "Take Screenshot").build(app)?;
    let open_item = MenuItemBuilder::with_id("open", "Open Work Status").build(app)?;
    let quit_item = MenuItemBuilder::with_id("quit", "Quit").build(app)?;
    let menu = MenuBuilder::new(app)
        .item(&snip_item)
        .item(&open_item)
        .separator()
        .item(&quit_item)
        .build()?;

    // Decode the PNG icon to RGBA for Tauri's Image type
    let icon_bytes = include_bytes!("../icons/32x32.png");
    let icon_img = image::load_from_memory(icon_bytes)
        .map_err(|e| format!("Failed to decode tray icon: {}", e))?;
    let rgba = icon_img.to_rgba8();
    let (w, h) = (rgba.width(), rgba.height());
    let tray_icon = TauriImage::new_owned(rgba.into_raw(), w, h);

    let _tray = TrayIconBuilder::new()
        .icon(tray_icon)
        .tooltip("snip-status: Click to snip")
        .menu(&menu)
        .show_menu_on_left_click(false)
        .on_tray_icon_event(|tray_icon, event| {
            if let tauri::tray::TrayIconEvent::Click {
                button: tauri::tray::MouseButton::Left,
                button_state: tauri::tray::MouseButtonState::Up,
                ..
            } = event
            {
                log::info!("Tray icon clicked: starting selection");
                if let Err(e) = desktop::begin_selection(tray_icon.app_handle()) {
                    log::error!("Failed to start selection: {}", e);
                }
            }
        })
        .on_menu_event(|app, event| match event.id().as_ref() {
            "snip" => {
                if let Err(e) = desktop::begin_selection(app) {
                    log::error!("Failed to start selection: {}", e);
                }
            }
            "open" => desktop::show_popup(app),
            "quit" => {
                log::info!("Quit requested from tray menu");
                app.exit(0);
            }
            _ => {}
        })
        .build(app)?;

    Ok(())
}
