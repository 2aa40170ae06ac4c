//! snip-status: snip a screen region and keep it next to a status message.
//!
//! The library core has no UI dependencies:
//! - overlay.rs          : drag gesture state machine
//! - capture/            : relay to the capture primitive, wire protocol, DPR-aware crop
//! - pipeline.rs         : capture → crop → store → notify
//! - storage.rs, export.rs, status_message.rs, notice.rs : around the result
//!
//! With the `desktop` feature this is also the Tauri app shell that wires
//! the core to a tray icon, a global shortcut, and an overlay window.

pub mod capture;
pub mod config;
pub mod export;
pub mod notice;
pub mod overlay;
pub mod pipeline;
pub mod status_message;
pub mod storage;

#[cfg(feature = "desktop")]
mod commands;
#[cfg(feature = "desktop")]
mod desktop;
#[cfg(feature = "desktop")]
mod tray;

#[cfg(feature = "desktop")]
pub use desktop::run;
