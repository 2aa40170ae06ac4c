//! Failure taxonomy for a capture attempt.
//!
//! Every variant is terminal for the attempt. The core never retries;
//! the caller decides whether to let the user try again.

use std::time::Duration;

use super::region::CropError;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CaptureError {
    #[error("Capture refused by the platform: {0}")]
    PlatformDenied(String),

    #[error("Capture rate limit reached: {0}")]
    RateLimited(String),

    #[error("Capture did not complete within {}ms", .0.as_millis())]
    Timeout(Duration),

    #[error("Captured image could not be decoded: {0}")]
    DecodeFailed(String),

    #[error("Selection does not overlap the captured frame")]
    EmptyRegion,

    #[error("Another capture is already in progress")]
    InFlight,

    #[error("Capture failed: {0}")]
    Unknown(String),
}

impl CaptureError {
    /// Classify a raw error string reported by a capture backend.
    ///
    /// Browser and OS backends only report free-form messages, so this
    /// looks for the markers they are known to use.
    pub fn from_platform_message(message: &str) -> Self {
        let lower = message.to_lowercase();

        let rate_limited = ["max_capture", "per_second", "rate limit", "too many"]
            .iter()
            .any(|marker| lower.contains(marker));
        if rate_limited {
            return Self::RateLimited(message.to_string());
        }

        let denied = [
            "permission",
            "cannot access",
            "cannot be scripted",
            "not allowed",
            "denied",
            "activetab",
            "restricted",
        ]
        .iter()
        .any(|marker| lower.contains(marker));
        if denied {
            return Self::PlatformDenied(message.to_string());
        }

        Self::Unknown(message.to_string())
    }

    /// Generic text for the user. Raw diagnostics stay in the log.
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::PlatformDenied(_) => "Screenshot failed: this screen can't be captured",
            Self::RateLimited(_) => "Screenshot failed: too many captures, try again in a moment",
            Self::Timeout(_) => "Screenshot failed: capture timed out",
            Self::DecodeFailed(_) => "Screenshot failed: the captured image was unreadable",
            Self::EmptyRegion => "Screenshot failed: the selection is outside the visible area",
            Self::InFlight => "A screenshot is already being taken",
            Self::Unknown(_) => "Screenshot failed",
        }
    }
}

impl From<CropError> for CaptureError {
    fn from(err: CropError) -> Self {
        match err {
            CropError::DecodeFailed(detail) => Self::DecodeFailed(detail),
            CropError::EmptyRegion => Self::EmptyRegion,
            CropError::EncodingFailed(detail) => Self::Unknown(format!("PNG encoding failed: {}", detail)),
        }
    }
}
