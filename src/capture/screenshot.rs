//! Visible-area capture primitive.
//!
//! This is the infrastructure layer: it talks to the OS. The relay is the
//! only caller; everything above it works on encoded frames.

use super::error::CaptureError;
use super::types::EncodedBitmap;

/// The privileged "capture what is visible" primitive.
///
/// Platforms only capture the whole visible area. Cropping to a selection
/// is always a later step.
pub trait CapturePlatform: Send + Sync + 'static {
    /// Grab the full visible area as PNG.
    fn capture_visible(&self) -> Result<EncodedBitmap, CaptureError>;

    /// Bitmap pixels per CSS pixel right now.
    fn device_pixel_ratio(&self) -> f64;
}

#[cfg(feature = "desktop")]
pub use primary_monitor::XcapPlatform;

#[cfg(feature = "desktop")]
mod primary_monitor {
    use super::{CaptureError, CapturePlatform, EncodedBitmap};
    use image::DynamicImage;
    use xcap::Monitor;

    /// Captures the primary monitor with the `xcap` crate.
    #[derive(Debug, Default)]
    pub struct XcapPlatform;

    impl XcapPlatform {
        fn primary_monitor() -> Result<Monitor, CaptureError> {
            let monitors = Monitor::all().map_err(|e| {
                CaptureError::from_platform_message(&format!("Failed to enumerate monitors: {}", e))
            })?;

            let mut fallback = None;
            for monitor in monitors {
                if monitor.is_primary().unwrap_or(false) {
                    return Ok(monitor);
                }
                // If no monitor reports as primary, use the first one
                if fallback.is_none() {
                    fallback = Some(monitor);
                }
            }

            fallback.ok_or_else(|| CaptureError::Unknown("No monitor found".to_string()))
        }
    }

    impl CapturePlatform for XcapPlatform {
        fn capture_visible(&self) -> Result<EncodedBitmap, CaptureError> {
            let start = std::time::Instant::now();

            let monitor = Self::primary_monitor()?;
            let frame = monitor
                .capture_image()
                .map_err(|e| CaptureError::from_platform_message(&e.to_string()))?;

            let capture_ms = start.elapsed().as_millis();
            log::info!(
                "[CAPTURE] Screen captured in {}ms ({}x{})",
                capture_ms,
                frame.width(),
                frame.height()
            );

            crate::capture::region::encode_png(&DynamicImage::ImageRgba8(frame))
                .map_err(CaptureError::from)
        }

        fn device_pixel_ratio(&self) -> f64 {
            match Self::primary_monitor().and_then(|m| {
                m.scale_factor()
                    .map_err(|e| CaptureError::Unknown(e.to_string()))
            }) {
                Ok(scale) => scale as f64,
                Err(e) => {
                    log::warn!("[CAPTURE] Scale factor unavailable, assuming 1.0: {}", e);
                    1.0
                }
            }
        }
    }
}
