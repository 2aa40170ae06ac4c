//! User-facing toast messages.
//!
//! Failures get a generic line here; the detail goes to the log.

use serde::Serialize;

use crate::capture::CaptureError;
use crate::overlay::CancelReason;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NoticeKind {
    Success,
    Info,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Success,
            message: message.into(),
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Info,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Error,
            message: message.into(),
        }
    }

    pub fn selection_armed() -> Self {
        Self::info("Click and drag to select an area • Press Esc to cancel")
    }

    pub fn capture_saved() -> Self {
        Self::success("Screenshot ready to copy!")
    }

    pub fn cancelled(reason: CancelReason) -> Self {
        match reason {
            CancelReason::TooSmall => Self::info("Selection too small, screenshot cancelled"),
            CancelReason::UserAborted => Self::info("Screenshot cancelled"),
            CancelReason::Forced => Self::info("Screenshot closed"),
        }
    }

    pub fn capture_failed(error: &CaptureError) -> Self {
        Self::error(error.user_message())
    }
}
