//! Capture relay: the privileged boundary.
//!
//! Receives capture requests from the unprivileged side, calls the platform
//! primitive on a blocking worker, and hands back the full frame together
//! with the rect that was asked for. Cropping happens downstream.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use super::error::CaptureError;
use super::protocol::{CaptureResponse, RelayMessage};
use super::screenshot::CapturePlatform;
use super::types::{CaptureRequest, CaptureResult};

pub const DEFAULT_CAPTURE_TIMEOUT: Duration = Duration::from_secs(8);

pub struct CaptureRelay<P: CapturePlatform> {
    platform: Arc<P>,
    timeout: Duration,
    in_flight: Arc<AtomicBool>,
}

/// Clears the in-flight flag on every exit path, including panics.
///
/// Owned by the blocking platform call, so a call that outlives its timeout
/// still counts as in flight until the platform returns.
struct InFlightGuard(Arc<AtomicBool>);

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl<P: CapturePlatform> CaptureRelay<P> {
    pub fn new(platform: P, timeout: Duration) -> Self {
        Self {
            platform: Arc::new(platform),
            timeout,
            in_flight: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn platform(&self) -> &P {
        &self.platform
    }

    pub fn is_busy(&self) -> bool {
        self.in_flight.load(Ordering::Acquire)
    }

    /// Capture the visible area for `request`.
    ///
    /// Exactly one result per request. A second request while one is
    /// outstanding is answered with `InFlight` instead of being queued,
    /// including while a timed-out platform call is still running.
    pub async fn capture(&self, request: CaptureRequest) -> CaptureResult {
        if self
            .in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            log::warn!("[CAPTURE] Rejected request: capture already in flight");
            return CaptureResult::failed(request.rect, CaptureError::InFlight);
        }
        let guard = InFlightGuard(Arc::clone(&self.in_flight));

        let start = std::time::Instant::now();
        let platform = Arc::clone(&self.platform);
        let task = tokio::task::spawn_blocking(move || {
            let _guard = guard;
            platform.capture_visible()
        });

        let outcome = match tokio::time::timeout(self.timeout, task).await {
            Ok(Ok(result)) => result,
            Ok(Err(join_err)) => Err(CaptureError::Unknown(format!(
                "capture task failed: {}",
                join_err
            ))),
            Err(_) => Err(CaptureError::Timeout(self.timeout)),
        };

        match &outcome {
            Ok(frame) => log::info!(
                "[CAPTURE] Visible area captured in {}ms ({} bytes)",
                start.elapsed().as_millis(),
                frame.len()
            ),
            Err(e) => log::error!("[CAPTURE] Capture failed after {}ms: {}", start.elapsed().as_millis(), e),
        }

        CaptureResult {
            rect: request.rect,
            outcome,
        }
    }

    /// Handle one raw JSON message from the page side.
    ///
    /// Malformed or unsupported messages get an `error` response rather
    /// than no response, so the sender is never left waiting.
    pub async fn handle_message(&self, raw: &str) -> CaptureResponse {
        let message: RelayMessage = match serde_json::from_str(raw) {
            Ok(message) => message,
            Err(e) => {
                log::warn!("[CAPTURE] Unparseable relay message: {}", e);
                return CaptureResponse::error(None, format!("Malformed capture request: {}", e));
            }
        };

        match message.into_request() {
            Some(request) => CaptureResponse::from(&self.capture(request).await),
            None => CaptureResponse::error(None, "Unsupported relay action".to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::types::{EncodedBitmap, SelectionRect};
    use std::sync::atomic::AtomicUsize;

    struct StubPlatform {
        delay: Duration,
        result: Result<EncodedBitmap, CaptureError>,
        calls: AtomicUsize,
    }

    impl StubPlatform {
        fn ok(delay: Duration) -> Self {
            Self {
                delay,
                result: Ok(EncodedBitmap::from_png(vec![0x89, 0x50, 0x4E, 0x47])),
                calls: AtomicUsize::new(0),
            }
        }

        fn failing(error: CaptureError) -> Self {
            Self {
                delay: Duration::ZERO,
                result: Err(error),
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl CapturePlatform for StubPlatform {
        fn capture_visible(&self) -> Result<EncodedBitmap, CaptureError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            std::thread::sleep(self.delay);
            self.result.clone()
        }

        fn device_pixel_ratio(&self) -> f64 {
            1.0
        }
    }

    #[tokio::test]
    async fn success_returns_frame_and_requested_rect() {
        let relay = CaptureRelay::new(StubPlatform::ok(Duration::ZERO), DEFAULT_CAPTURE_TIMEOUT);
        let rect = SelectionRect::new(1.0, 2.0, 30.0, 40.0);

        let result = relay.capture(CaptureRequest::region(rect)).await;

        assert_eq!(result.rect, Some(rect));
        assert!(result.outcome.is_ok());
        assert!(!relay.is_busy());
    }

    #[tokio::test]
    async fn full_frame_request_carries_no_rect() {
        let relay = CaptureRelay::new(StubPlatform::ok(Duration::ZERO), DEFAULT_CAPTURE_TIMEOUT);
        let result = relay.capture(CaptureRequest::full_frame()).await;
        assert_eq!(result.rect, None);
        assert!(result.outcome.is_ok());
    }

    #[tokio::test]
    async fn platform_failure_is_not_retried() {
        let relay = CaptureRelay::new(
            StubPlatform::failing(CaptureError::PlatformDenied("restricted".into())),
            DEFAULT_CAPTURE_TIMEOUT,
        );

        let result = relay.capture(CaptureRequest::full_frame()).await;

        assert!(matches!(result.outcome, Err(CaptureError::PlatformDenied(_))));
        assert_eq!(relay.platform().calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn timed_out_call_stays_in_flight_until_platform_returns() {
        let relay = CaptureRelay::new(
            StubPlatform::ok(Duration::from_millis(300)),
            Duration::from_millis(20),
        );

        let result = relay.capture(CaptureRequest::full_frame()).await;
        assert_eq!(result.outcome, Err(CaptureError::Timeout(Duration::from_millis(20))));

        // The platform call is still running on its worker.
        assert!(relay.is_busy());
        let retry = relay.capture(CaptureRequest::full_frame()).await;
        assert_eq!(retry.outcome, Err(CaptureError::InFlight));
        assert_eq!(relay.platform().calls.load(Ordering::SeqCst), 1);

        let deadline = std::time::Instant::now() + Duration::from_secs(5);
        while relay.is_busy() {
            assert!(std::time::Instant::now() < deadline, "flag never released");
            tokio::time::sleep(Duration::from_millis(10)).await;
        }

        let after = relay.capture(CaptureRequest::full_frame()).await;
        assert_eq!(after.outcome, Err(CaptureError::Timeout(Duration::from_millis(20))));
        assert_eq!(relay.platform().calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn second_request_while_busy_is_rejected() {
        let relay = Arc::new(CaptureRelay::new(
            StubPlatform::ok(Duration::from_millis(200)),
            DEFAULT_CAPTURE_TIMEOUT,
        ));

        let first = {
            let relay = Arc::clone(&relay);
            tokio::spawn(async move { relay.capture(CaptureRequest::full_frame()).await })
        };
        while !relay.is_busy() {
            tokio::task::yield_now().await;
        }

        let second = relay.capture(CaptureRequest::full_frame()).await;
        assert_eq!(second.outcome, Err(CaptureError::InFlight));

        let first = first.await.unwrap();
        assert!(first.outcome.is_ok());
        assert_eq!(relay.platform().calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn malformed_message_gets_error_response() {
        let relay = CaptureRelay::new(StubPlatform::ok(Duration::ZERO), DEFAULT_CAPTURE_TIMEOUT);
        let response = relay.handle_message("{\"action\": 42}").await;
        assert!(response.error.is_some());
        assert!(response.data_url.is_none());
    }

    #[tokio::test]
    async fn capture_message_gets_data_url() {
        let relay = CaptureRelay::new(StubPlatform::ok(Duration::ZERO), DEFAULT_CAPTURE_TIMEOUT);
        let response = relay
            .handle_message(r#"{"action":"captureScreenshot","rect":{"x":1,"y":2,"width":30,"height":40}}"#)
            .await;
        assert!(response.data_url.unwrap().starts_with("data:image/png;base64,"));
        assert_eq!(response.rect, Some(SelectionRect::new(1.0, 2.0, 30.0, 40.0)));
        assert!(response.error.is_none());
    }
}
