//! End-to-end tests for the selection → capture → crop → store flow.
//!
//! A fake platform stands in for the OS capture primitive so the whole
//! pipeline runs headless.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use image::{DynamicImage, Rgba, RgbaImage};
use snip_status_lib::capture::{
    decode_png, encode_png, CaptureError, CapturePlatform, CompletionEvent, EncodedBitmap,
    SelectionRect,
};
use snip_status_lib::config::SnipConfig;
use snip_status_lib::notice::{Notice, NoticeKind};
use snip_status_lib::overlay::{
    CancelReason, OverlayEvent, OverlayOutcome, OverlaySurface, SelectionOverlay,
    DEFAULT_MIN_SELECTION_PX,
};
use snip_status_lib::pipeline::{CompletionSink, SnipPipeline};

// ── Fakes ───────────────────────────────────────────────────────────

/// A `width x height` frame whose pixels encode their own coordinates.
struct FakeScreen {
    width: u32,
    height: u32,
    /// Stored as bits so tests can change it between selection and crop.
    dpr_bits: Arc<AtomicU64>,
    fail_with: Option<CaptureError>,
}

impl FakeScreen {
    fn new(width: u32, height: u32, dpr: f64) -> Self {
        Self {
            width,
            height,
            dpr_bits: Arc::new(AtomicU64::new(dpr.to_bits())),
            fail_with: None,
        }
    }

    fn frame(&self) -> DynamicImage {
        DynamicImage::ImageRgba8(RgbaImage::from_fn(self.width, self.height, |x, y| {
            Rgba([(x % 256) as u8, (y % 256) as u8, 0x80, 0xFF])
        }))
    }
}

impl CapturePlatform for FakeScreen {
    fn capture_visible(&self) -> Result<EncodedBitmap, CaptureError> {
        if let Some(err) = &self.fail_with {
            return Err(err.clone());
        }
        Ok(encode_png(&self.frame()).expect("encode fake frame"))
    }

    fn device_pixel_ratio(&self) -> f64 {
        f64::from_bits(self.dpr_bits.load(Ordering::SeqCst))
    }
}

#[derive(Clone, Default)]
struct RecordingSink {
    events: Arc<Mutex<Vec<CompletionEvent>>>,
}

impl CompletionSink for RecordingSink {
    fn deliver(&self, event: &CompletionEvent) -> bool {
        self.events.lock().unwrap().push(event.clone());
        true
    }
}

#[derive(Default)]
struct HeadlessSurface {
    mounted: bool,
}

impl OverlaySurface for HeadlessSurface {
    fn mount(&mut self) {
        self.mounted = true;
    }
    fn draw_selection(&mut self, _rect: &SelectionRect) {}
    fn unmount(&mut self) {
        self.mounted = false;
    }
}

fn config_in(dir: &std::path::Path) -> SnipConfig {
    SnipConfig {
        storage_dir: dir.to_path_buf(),
        capture_timeout: Duration::from_secs(5),
        ..SnipConfig::default()
    }
}

fn drag(overlay: &mut SelectionOverlay<HeadlessSurface>, from: (f64, f64), to: (f64, f64)) -> OverlayOutcome {
    overlay.activate();
    overlay.handle(OverlayEvent::PointerDown { x: from.0, y: from.1 });
    overlay.handle(OverlayEvent::PointerMove { x: to.0, y: to.1 });
    overlay
        .handle(OverlayEvent::PointerUp { x: to.0, y: to.1 })
        .expect("pointer up ends the gesture")
}

// ── Scenarios ───────────────────────────────────────────────────────

#[tokio::test]
async fn drag_capture_crop_at_dpr_one() {
    let dir = tempfile::tempdir().unwrap();
    let sink = RecordingSink::default();
    let pipeline = SnipPipeline::new(FakeScreen::new(800, 600, 1.0), &config_in(dir.path()), Box::new(sink.clone()));
    let mut overlay = SelectionOverlay::new(HeadlessSurface::default(), DEFAULT_MIN_SELECTION_PX);

    let outcome = drag(&mut overlay, (100.0, 100.0), (300.0, 250.0));
    assert_eq!(
        outcome,
        OverlayOutcome::Selected(SelectionRect::new(100.0, 100.0, 200.0, 150.0))
    );
    assert!(!overlay.surface().mounted, "overlay must be gone before capture");

    let OverlayOutcome::Selected(rect) = outcome else { unreachable!() };
    let stored = pipeline.capture(Some(rect)).await.unwrap();

    let image = decode_png(&stored.image).unwrap().to_rgba8();
    assert_eq!(image.dimensions(), (200, 150));
    assert_eq!(image.get_pixel(0, 0), &Rgba([100, 100, 0x80, 0xFF]));

    let events = sink.events.lock().unwrap();
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].data_url, stored.image.to_data_url());
}

#[tokio::test]
async fn crop_uses_dpr_read_at_crop_time() {
    let dir = tempfile::tempdir().unwrap();
    let screen = FakeScreen::new(400, 400, 1.0);
    let dpr = Arc::clone(&screen.dpr_bits);
    let pipeline = SnipPipeline::new(screen, &config_in(dir.path()), Box::new(RecordingSink::default()));

    // Display scale changes after the selection was made.
    dpr.store(2.0f64.to_bits(), Ordering::SeqCst);

    let stored = pipeline
        .capture(Some(SelectionRect::new(10.0, 10.0, 50.0, 50.0)))
        .await
        .unwrap();

    let image = decode_png(&stored.image).unwrap().to_rgba8();
    assert_eq!(image.dimensions(), (50, 50));
    // Sampled from the 2x source region starting at (20, 20).
    let top_left = image.get_pixel(0, 0);
    assert!((20..=21).contains(&top_left[0]), "x sample was {}", top_left[0]);
    assert!((20..=21).contains(&top_left[1]), "y sample was {}", top_left[1]);
}

#[tokio::test]
async fn fractional_dpr_crop_keeps_selection_size() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = SnipPipeline::new(FakeScreen::new(400, 400, 1.5), &config_in(dir.path()), Box::new(RecordingSink::default()));

    let stored = pipeline
        .capture(Some(SelectionRect::new(10.0, 10.0, 40.0, 30.0)))
        .await
        .unwrap();

    let image = decode_png(&stored.image).unwrap().to_rgba8();
    assert_eq!(image.dimensions(), (40, 30));
    // Source region starts at (15, 15) in bitmap pixels.
    let top_left = image.get_pixel(0, 0);
    assert!((15..=16).contains(&top_left[0]), "x sample was {}", top_left[0]);
    assert!((15..=16).contains(&top_left[1]), "y sample was {}", top_left[1]);
}

#[tokio::test]
async fn full_frame_request_skips_crop() {
    let dir = tempfile::tempdir().unwrap();
    let screen = FakeScreen::new(64, 32, 2.0);
    let expected = screen.frame().to_rgba8();
    let pipeline = SnipPipeline::new(screen, &config_in(dir.path()), Box::new(RecordingSink::default()));

    let stored = pipeline.capture(None).await.unwrap();

    assert_eq!(decode_png(&stored.image).unwrap().to_rgba8(), expected);
}

#[tokio::test]
async fn selection_outside_frame_is_empty_region() {
    let dir = tempfile::tempdir().unwrap();
    let sink = RecordingSink::default();
    let pipeline = SnipPipeline::new(FakeScreen::new(100, 100, 1.0), &config_in(dir.path()), Box::new(sink.clone()));

    let result = pipeline
        .capture(Some(SelectionRect::new(500.0, 500.0, 40.0, 40.0)))
        .await;

    assert!(matches!(result, Err(CaptureError::EmptyRegion)));
    assert!(pipeline.store().load_capture().unwrap().is_none());
    assert!(sink.events.lock().unwrap().is_empty());
}

#[tokio::test]
async fn platform_denial_surfaces_generic_notice() {
    let dir = tempfile::tempdir().unwrap();
    let mut screen = FakeScreen::new(100, 100, 1.0);
    screen.fail_with = Some(CaptureError::PlatformDenied("chrome:// pages cannot be captured".into()));
    let pipeline = SnipPipeline::new(screen, &config_in(dir.path()), Box::new(RecordingSink::default()));

    let notice = pipeline
        .finish_selection(OverlayOutcome::Selected(SelectionRect::new(0.0, 0.0, 50.0, 50.0)))
        .await;

    assert_eq!(notice.kind, NoticeKind::Error);
    assert!(!notice.message.contains("chrome://"));
}

#[tokio::test]
async fn too_small_selection_never_captures() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = SnipPipeline::new(FakeScreen::new(100, 100, 1.0), &config_in(dir.path()), Box::new(RecordingSink::default()));
    let mut overlay = SelectionOverlay::new(HeadlessSurface::default(), DEFAULT_MIN_SELECTION_PX);

    let outcome = drag(&mut overlay, (20.0, 20.0), (25.0, 90.0));
    assert_eq!(outcome, OverlayOutcome::Cancelled(CancelReason::TooSmall));

    let notice = pipeline.finish_selection(outcome).await;
    assert_eq!(notice, Notice::cancelled(CancelReason::TooSmall));
    assert!(pipeline.store().load_capture().unwrap().is_none());
}

#[tokio::test]
async fn next_capture_overwrites_stored_one() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = SnipPipeline::new(FakeScreen::new(300, 300, 1.0), &config_in(dir.path()), Box::new(RecordingSink::default()));

    let first = pipeline
        .capture(Some(SelectionRect::new(0.0, 0.0, 100.0, 100.0)))
        .await
        .unwrap();
    assert_eq!(pipeline.store().load_capture().unwrap().unwrap().image, first.image);

    let second = pipeline
        .capture(Some(SelectionRect::new(50.0, 50.0, 20.0, 20.0)))
        .await
        .unwrap();
    let restored = pipeline.store().load_capture().unwrap().unwrap();
    assert_eq!(restored, second);
    assert_ne!(restored.image, first.image);
}
