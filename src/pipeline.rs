//! Selection-to-stored-capture orchestration.
//!
//! relay capture → crop at the current DPR → persist → notify listeners.
//! One attempt per call; nothing is retried here.

use crate::capture::{
    crop_to_png_bytes, CapturePlatform, CaptureRelay, CaptureRequest, CaptureError,
    CompletionEvent, DevicePixelContext, EncodedBitmap, ResampleFilter, SelectionRect,
};
use crate::config::SnipConfig;
use crate::notice::Notice;
use crate::overlay::OverlayOutcome;
use crate::storage::{LocalStore, StoredCapture};

/// Anything that wants to hear about finished captures.
///
/// Delivery is best effort: returning `false` (nobody listening) is fine.
pub trait CompletionSink: Send + Sync {
    fn deliver(&self, event: &CompletionEvent) -> bool;
}

/// Sink for when no presentation surface is attached.
pub struct NoListener;

impl CompletionSink for NoListener {
    fn deliver(&self, _event: &CompletionEvent) -> bool {
        false
    }
}

pub struct SnipPipeline<P: CapturePlatform> {
    relay: CaptureRelay<P>,
    store: LocalStore,
    sink: Box<dyn CompletionSink>,
    resample: ResampleFilter,
}

impl<P: CapturePlatform> SnipPipeline<P> {
    pub fn new(platform: P, config: &SnipConfig, sink: Box<dyn CompletionSink>) -> Self {
        Self {
            relay: CaptureRelay::new(platform, config.capture_timeout),
            store: LocalStore::new(config.storage_dir.clone()),
            sink,
            resample: config.resample,
        }
    }

    pub fn relay(&self) -> &CaptureRelay<P> {
        &self.relay
    }

    pub fn store(&self) -> &LocalStore {
        &self.store
    }

    /// Capture, crop to `rect` (or keep the full frame for `None`), store,
    /// and broadcast the result.
    pub async fn capture(&self, rect: Option<SelectionRect>) -> Result<StoredCapture, CaptureError> {
        let pipeline_start = std::time::Instant::now();

        let result = self.relay.capture(CaptureRequest { rect }).await;
        let frame = result.outcome?;

        let image = match result.rect {
            Some(rect) => self.crop(frame, rect).await?,
            None => frame,
        };

        let stored = StoredCapture {
            image,
            captured_at_ms: chrono::Utc::now().timestamp_millis(),
        };

        // The capture itself succeeded; a storage failure only loses the
        // restore-on-reload copy.
        if let Err(e) = self.store.save_capture(&stored) {
            log::error!("[PIPELINE] Failed to persist capture: {}", e);
        }

        let event = CompletionEvent::for_image(&stored.image);
        if !self.sink.deliver(&event) {
            log::debug!("[PIPELINE] No listener for completion event");
        }

        log::info!(
            "[PIPELINE] Capture complete in {}ms ({} bytes)",
            pipeline_start.elapsed().as_millis(),
            stored.image.len()
        );
        Ok(stored)
    }

    /// Run the pipeline for whatever the overlay produced and return the
    /// notice to show the user.
    pub async fn finish_selection(&self, outcome: OverlayOutcome) -> Notice {
        match outcome {
            OverlayOutcome::Cancelled(reason) => Notice::cancelled(reason),
            OverlayOutcome::Selected(rect) => match self.capture(Some(rect)).await {
                Ok(_) => Notice::capture_saved(),
                Err(e) => {
                    log::error!("[PIPELINE] Screenshot failed: {}", e);
                    Notice::capture_failed(&e)
                }
            },
        }
    }

    async fn crop(&self, frame: EncodedBitmap, rect: SelectionRect) -> Result<EncodedBitmap, CaptureError> {
        // Read at crop time, not at selection time.
        let dpr = DevicePixelContext::new(self.relay.platform().device_pixel_ratio());
        let filter = self.resample;
        let start = std::time::Instant::now();

        let cropped = tokio::task::spawn_blocking(move || crop_to_png_bytes(&frame, &rect, &dpr, filter))
            .await
            .map_err(|e| CaptureError::Unknown(format!("crop task failed: {}", e)))??;

        log::info!(
            "[CAPTURE] Cropped region ({}x{} at {},{}, dpr {}) in {}ms",
            rect.width,
            rect.height,
            rect.x,
            rect.y,
            dpr.ratio(),
            start.elapsed().as_millis()
        );
        Ok(cropped)
    }
}
