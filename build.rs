//! Build script for the snip-status app.
//!
//! Only the desktop shell needs a build step: Tauri generates its context
//! (config, window icon, capabilities) at compile time. The library core
//! builds without it.

fn main() {
    #[cfg(feature = "desktop")]
    tauri_build::build();
}
