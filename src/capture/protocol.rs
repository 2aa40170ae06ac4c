//! JSON messages exchanged between the page side and the relay.
//!
//! Field names and action strings match what the page scripts send, so
//! structs serialize camelCase.

use serde::{Deserialize, Serialize};

use super::error::CaptureError;
use super::types::{CaptureRequest, CaptureResult, EncodedBitmap, SelectionRect};

/// Inbound messages understood on either side of the boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action")]
pub enum RelayMessage {
    /// Presentation layer → overlay: arm the selection overlay.
    #[serde(rename = "takeScreenshot")]
    TakeScreenshot,

    #[serde(rename = "captureScreenshot")]
    CaptureScreenshot {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        rect: Option<SelectionRect>,
    },

    #[serde(rename = "captureVisibleRegion")]
    CaptureVisibleRegion {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        rect: Option<SelectionRect>,
    },
}

impl RelayMessage {
    /// The capture request carried by this message, if it is one.
    pub fn into_request(self) -> Option<CaptureRequest> {
        match self {
            Self::CaptureScreenshot { rect } | Self::CaptureVisibleRegion { rect } => {
                Some(CaptureRequest { rect })
            }
            Self::TakeScreenshot => None,
        }
    }
}

/// Reply to a capture message. Either `data_url` or `error` is set.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptureResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rect: Option<SelectionRect>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl CaptureResponse {
    pub fn error(rect: Option<SelectionRect>, message: String) -> Self {
        Self {
            data_url: None,
            rect,
            error: Some(message),
        }
    }

    /// Rebuild the typed result on the receiving side.
    ///
    /// Error strings are re-classified; a reply with neither payload nor
    /// error counts as an unknown failure.
    pub fn into_result(self) -> CaptureResult {
        let outcome = match (self.data_url, self.error) {
            (_, Some(message)) => Err(CaptureError::from_platform_message(&message)),
            (Some(data_url), None) => EncodedBitmap::from_data_url(&data_url),
            (None, None) => Err(CaptureError::Unknown("empty capture response".to_string())),
        };
        CaptureResult {
            rect: self.rect,
            outcome,
        }
    }
}

impl From<&CaptureResult> for CaptureResponse {
    fn from(result: &CaptureResult) -> Self {
        match &result.outcome {
            Ok(image) => Self {
                data_url: Some(image.to_data_url()),
                rect: result.rect,
                error: None,
            },
            Err(e) => Self::error(result.rect, e.to_string()),
        }
    }
}

/// Broadcast to presentation surfaces once a capture is ready.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "action", rename = "screenshotCompleted", rename_all = "camelCase")]
pub struct CompletionEvent {
    pub data_url: String,
}

impl CompletionEvent {
    pub fn for_image(image: &EncodedBitmap) -> Self {
        Self {
            data_url: image.to_data_url(),
        }
    }
}
