//! Screen capture domain: public API.
//!
//! This module owns the capture relay, the wire protocol around it, and the
//! DPR-aware cropper. External code should only use the items exported here.

mod error;
mod protocol;
mod region;
mod relay;
mod screenshot;
mod types;

pub use error::CaptureError;
pub use protocol::{CaptureResponse, CompletionEvent, RelayMessage};
pub use region::{
    crop_decoded, crop_to_png_bytes, decode_png, encode_png, source_region, CropError,
    ResampleFilter,
};
pub use relay::{CaptureRelay, DEFAULT_CAPTURE_TIMEOUT};
pub use screenshot::CapturePlatform;
#[cfg(feature = "desktop")]
pub use screenshot::XcapPlatform;
pub use types::{
    CaptureRequest, CaptureResult, DevicePixelContext, EncodedBitmap, PixelRegion, SelectionRect,
};
