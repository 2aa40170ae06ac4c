//! Selection overlay: turns a drag gesture into a `SelectionRect`.
//!
//! The state machine is pure; everything visible (the dimmed layer, the
//! crosshair, the selection box, the input listeners) goes through an
//! `OverlaySurface`. Every exit path unmounts the surface, and a finished
//! selection unmounts it *before* the rect is handed out so the overlay
//! never ends up in the captured frame.

use serde::Deserialize;

use crate::capture::SelectionRect;

/// Selections at or below this many CSS pixels on either side are treated
/// as stray clicks.
pub const DEFAULT_MIN_SELECTION_PX: f64 = 10.0;

/// Host-side visuals and listeners for the overlay.
pub trait OverlaySurface {
    /// Show the full-area layer with crosshair and instructions, and start
    /// listening for pointer and key input.
    fn mount(&mut self);

    /// Draw the live selection box.
    fn draw_selection(&mut self, rect: &SelectionRect);

    /// Remove every visual and listener added by `mount`.
    fn unmount(&mut self);
}

/// Input forwarded from the host, in CSS pixels.
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum OverlayEvent {
    PointerDown { x: f64, y: f64 },
    PointerMove { x: f64, y: f64 },
    PointerUp { x: f64, y: f64 },
    CancelKey,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CancelReason {
    /// Released with a box at or under the minimum size.
    TooSmall,
    /// Cancel key pressed.
    UserAborted,
    /// Torn down from outside (window closed, app quit, re-arm).
    Forced,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OverlayState {
    Idle,
    Armed,
    Dragging {
        start: (f64, f64),
        current: (f64, f64),
    },
    Finished(SelectionRect),
    Cancelled(CancelReason),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum OverlayOutcome {
    Selected(SelectionRect),
    Cancelled(CancelReason),
}

pub struct SelectionOverlay<S: OverlaySurface> {
    surface: S,
    state: OverlayState,
    min_selection_px: f64,
    mounted: bool,
}

impl<S: OverlaySurface> SelectionOverlay<S> {
    pub fn new(surface: S, min_selection_px: f64) -> Self {
        Self {
            surface,
            state: OverlayState::Idle,
            min_selection_px,
            mounted: false,
        }
    }

    pub fn state(&self) -> OverlayState {
        self.state
    }

    pub fn is_active(&self) -> bool {
        matches!(
            self.state,
            OverlayState::Armed | OverlayState::Dragging { .. }
        )
    }

    pub fn surface(&self) -> &S {
        &self.surface
    }

    /// Arm the overlay. An overlay that is already up is torn down first,
    /// so repeated activation never stacks two layers.
    pub fn activate(&mut self) {
        if self.mounted {
            log::info!("[OVERLAY] Re-armed while active, tearing down previous overlay");
            self.teardown();
        }
        self.surface.mount();
        self.mounted = true;
        self.state = OverlayState::Armed;
        log::info!("[OVERLAY] Armed");
    }

    /// Feed one input event. Returns an outcome when the gesture ends.
    pub fn handle(&mut self, event: OverlayEvent) -> Option<OverlayOutcome> {
        match (self.state, event) {
            (OverlayState::Armed, OverlayEvent::PointerDown { x, y })
            | (OverlayState::Dragging { .. }, OverlayEvent::PointerDown { x, y }) => {
                self.state = OverlayState::Dragging {
                    start: (x, y),
                    current: (x, y),
                };
                self.surface
                    .draw_selection(&SelectionRect::new(x, y, 0.0, 0.0));
                None
            }

            (OverlayState::Dragging { start, .. }, OverlayEvent::PointerMove { x, y }) => {
                self.state = OverlayState::Dragging {
                    start,
                    current: (x, y),
                };
                self.surface
                    .draw_selection(&SelectionRect::from_points(start, (x, y)));
                None
            }

            (OverlayState::Dragging { start, .. }, OverlayEvent::PointerUp { x, y }) => {
                let rect = SelectionRect::from_points(start, (x, y));
                self.teardown();

                if rect.exceeds(self.min_selection_px) {
                    log::info!(
                        "[OVERLAY] Selection finished: {{x: {}, y: {}, w: {}, h: {}}}",
                        rect.x,
                        rect.y,
                        rect.width,
                        rect.height
                    );
                    self.state = OverlayState::Finished(rect);
                    Some(OverlayOutcome::Selected(rect))
                } else {
                    log::info!(
                        "[OVERLAY] Selection {}x{} too small, cancelled",
                        rect.width,
                        rect.height
                    );
                    Some(self.cancel(CancelReason::TooSmall))
                }
            }

            (OverlayState::Armed, OverlayEvent::CancelKey)
            | (OverlayState::Dragging { .. }, OverlayEvent::CancelKey) => {
                self.teardown();
                log::info!("[OVERLAY] Cancelled by user");
                Some(self.cancel(CancelReason::UserAborted))
            }

            _ => None,
        }
    }

    /// Tear the overlay down from outside the gesture.
    ///
    /// Returns `None` when nothing was active.
    pub fn force_teardown(&mut self) -> Option<OverlayOutcome> {
        if !self.is_active() {
            // Still make sure nothing lingers on screen.
            self.teardown();
            return None;
        }
        self.teardown();
        log::info!("[OVERLAY] Forced teardown");
        Some(self.cancel(CancelReason::Forced))
    }

    fn cancel(&mut self, reason: CancelReason) -> OverlayOutcome {
        self.state = OverlayState::Cancelled(reason);
        OverlayOutcome::Cancelled(reason)
    }

    fn teardown(&mut self) {
        if self.mounted {
            self.surface.unmount();
            self.mounted = false;
        }
    }
}
