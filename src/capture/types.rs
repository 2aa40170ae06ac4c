//! Value types shared by the overlay, relay, and cropper.

use base64::{engine::general_purpose::STANDARD, Engine};
use serde::{Deserialize, Serialize};

use super::error::CaptureError;

const PNG_DATA_URL_PREFIX: &str = "data:image/png;base64,";

/// A finalized selection in CSS pixels, relative to the visible area.
///
/// These are display units, never bitmap offsets. Scale by the device
/// pixel ratio before indexing into a captured frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SelectionRect {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl SelectionRect {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Normalized bounds of a drag from `start` to `end`, whatever its direction.
    pub fn from_points(start: (f64, f64), end: (f64, f64)) -> Self {
        Self {
            x: start.0.min(end.0),
            y: start.1.min(end.1),
            width: (end.0 - start.0).abs(),
            height: (end.1 - start.1).abs(),
        }
    }

    /// Both sides strictly larger than `min` CSS pixels.
    pub fn exceeds(&self, min: f64) -> bool {
        self.width > min && self.height > min
    }
}

/// A region of the captured bitmap, in physical pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelRegion {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

/// Ratio of bitmap pixels to CSS pixels at crop time.
///
/// Re-read for every crop: zoom or a monitor change can move it between
/// the moment the overlay opened and the moment the frame is cropped.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DevicePixelContext {
    device_pixel_ratio: f64,
}

impl DevicePixelContext {
    pub fn new(device_pixel_ratio: f64) -> Self {
        if !device_pixel_ratio.is_finite() || device_pixel_ratio < 1.0 {
            log::warn!(
                "[CAPTURE] Ignoring device pixel ratio {}, using 1.0",
                device_pixel_ratio
            );
            return Self {
                device_pixel_ratio: 1.0,
            };
        }
        Self { device_pixel_ratio }
    }

    pub fn ratio(&self) -> f64 {
        self.device_pixel_ratio
    }
}

impl Default for DevicePixelContext {
    fn default() -> Self {
        Self {
            device_pixel_ratio: 1.0,
        }
    }
}

/// PNG bytes of a captured or cropped frame.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedBitmap(Vec<u8>);

impl EncodedBitmap {
    pub fn from_png(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn to_data_url(&self) -> String {
        format!("{}{}", PNG_DATA_URL_PREFIX, STANDARD.encode(&self.0))
    }

    /// Parse a `data:image/png;base64,` URL back into PNG bytes.
    pub fn from_data_url(data_url: &str) -> Result<Self, CaptureError> {
        let payload = data_url
            .strip_prefix(PNG_DATA_URL_PREFIX)
            .ok_or_else(|| CaptureError::DecodeFailed("not a PNG data URL".to_string()))?;
        let bytes = STANDARD
            .decode(payload)
            .map_err(|e| CaptureError::DecodeFailed(format!("invalid base64 payload: {}", e)))?;
        Ok(Self(bytes))
    }
}

/// Ask the relay for a frame. `rect: None` means the full visible area, uncropped.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CaptureRequest {
    pub rect: Option<SelectionRect>,
}

impl CaptureRequest {
    pub fn full_frame() -> Self {
        Self { rect: None }
    }

    pub fn region(rect: SelectionRect) -> Self {
        Self { rect: Some(rect) }
    }
}

/// What the relay hands back for exactly one request.
#[derive(Debug)]
pub struct CaptureResult {
    /// The rect from the request, untouched.
    pub rect: Option<SelectionRect>,
    pub outcome: Result<EncodedBitmap, CaptureError>,
}

impl CaptureResult {
    pub fn succeeded(rect: Option<SelectionRect>, image: EncodedBitmap) -> Self {
        Self {
            rect,
            outcome: Ok(image),
        }
    }

    pub fn failed(rect: Option<SelectionRect>, error: CaptureError) -> Self {
        Self {
            rect,
            outcome: Err(error),
        }
    }
}
