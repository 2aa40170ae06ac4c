//! Runtime configuration from environment variables.
//!
//! Every knob has a default; a bad value is logged and ignored rather than
//! failing startup. The desktop shell loads `.env.local` / `.env` before
//! reading these.

use std::path::PathBuf;
use std::time::Duration;

use crate::capture::{ResampleFilter, DEFAULT_CAPTURE_TIMEOUT};
use crate::overlay::DEFAULT_MIN_SELECTION_PX;

pub const APP_DIR_NAME: &str = "snip-status";
pub const DEFAULT_SHORTCUT: &str = "CmdOrCtrl+Shift+S";
pub const DEFAULT_OVERLAY_SETTLE: Duration = Duration::from_millis(150);

#[derive(Debug, Clone, PartialEq)]
pub struct SnipConfig {
    /// Upper bound on one platform capture call.
    pub capture_timeout: Duration,
    /// Selections must be strictly larger than this on both sides.
    pub min_selection_px: f64,
    pub resample: ResampleFilter,
    /// Where `capture.json` and `composer.json` live.
    pub storage_dir: PathBuf,
    /// Global hotkey that arms the overlay (desktop only).
    pub shortcut: String,
    /// Pause between closing the overlay window and capturing, so the
    /// compositor has dropped it from the frame.
    pub overlay_settle: Duration,
}

impl Default for SnipConfig {
    fn default() -> Self {
        Self {
            capture_timeout: DEFAULT_CAPTURE_TIMEOUT,
            min_selection_px: DEFAULT_MIN_SELECTION_PX,
            resample: ResampleFilter::Nearest,
            storage_dir: default_storage_dir(),
            shortcut: DEFAULT_SHORTCUT.to_string(),
            overlay_settle: DEFAULT_OVERLAY_SETTLE,
        }
    }
}

impl SnipConfig {
    /// Build from `SNIP_*` environment variables on top of the defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as `from_env`, reading from any key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(ms) = parse_var::<u64>(&lookup, "SNIP_CAPTURE_TIMEOUT_MS") {
            if ms > 0 {
                config.capture_timeout = Duration::from_millis(ms);
            } else {
                log::warn!("[CONFIG] SNIP_CAPTURE_TIMEOUT_MS must be positive, keeping default");
            }
        }

        if let Some(px) = parse_var::<f64>(&lookup, "SNIP_MIN_SELECTION_PX") {
            if px.is_finite() && px >= 0.0 {
                config.min_selection_px = px;
            } else {
                log::warn!("[CONFIG] SNIP_MIN_SELECTION_PX must be >= 0, keeping default");
            }
        }

        if let Some(raw) = lookup("SNIP_RESAMPLE") {
            match raw.trim().to_lowercase().as_str() {
                "nearest" => config.resample = ResampleFilter::Nearest,
                "bilinear" => config.resample = ResampleFilter::Bilinear,
                other => log::warn!("[CONFIG] Unknown SNIP_RESAMPLE '{}', keeping nearest", other),
            }
        }

        if let Some(dir) = lookup("SNIP_STORAGE_DIR").filter(|d| !d.trim().is_empty()) {
            config.storage_dir = PathBuf::from(dir);
        }

        if let Some(shortcut) = lookup("SNIP_SHORTCUT").filter(|s| !s.trim().is_empty()) {
            config.shortcut = shortcut.trim().to_string();
        }

        if let Some(ms) = parse_var::<u64>(&lookup, "SNIP_OVERLAY_SETTLE_MS") {
            config.overlay_settle = Duration::from_millis(ms);
        }

        config
    }
}

/// Platform config directory, e.g. `~/.config/snip-status` on Linux.
pub fn default_storage_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR_NAME)
}

fn parse_var<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
) -> Option<T> {
    let raw = lookup(key)?;
    match raw.trim().parse::<T>() {
        Ok(value) => Some(value),
        Err(_) => {
            log::warn!("[CONFIG] Ignoring unparseable {}='{}'", key, raw);
            None
        }
    }
}
