use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info};

use super::hover::{FocusContext, HoverFocus};
use crate::capture::{
    CaptureError, CaptureOptions, CaptureSession, Frame, FrameSink, LocatedWindow, StopSink,
};
use crate::platform::{Platform, PlatformError, RenderSurface};
use crate::strategy::{StrategyEvent, StrategySink, Ticker, WindowMove};
use crate::tracker::PositionTracker;
use crate::window::{TargetWindowRef, to_surface_rect};

#[derive(Debug, Clone, Copy)]
pub struct OverlayOptions {
    pub capture: CaptureOptions,
    pub hover_poll: Duration,
}

/// The overlay strategy. Owns the render surface, the capture session, the
/// position tracker and the hover poller.
pub struct OverlaySurface {
    platform: Platform,
    target: TargetWindowRef,
    surface: Arc<dyn RenderSurface>,
    session: CaptureSession,
    tracker: PositionTracker,
    hover_ticker: Option<Ticker>,
    hover: HoverFocus,
    hover_poll: Duration,
    sink: StrategySink,
    closed: bool,
}

impl OverlaySurface {
    /// Create the (still hidden) surface at the target's bounds.
    pub fn new(
        platform: Platform,
        target: TargetWindowRef,
        options: OverlayOptions,
        sink: StrategySink,
    ) -> Result<Self, PlatformError> {
        let rect = to_surface_rect(target.bounds, platform.workspace.primary_display_height());
        let surface = platform.surfaces.create_surface(rect)?;
        let session = CaptureSession::new(Arc::clone(&platform.capture), options.capture);

        Ok(Self {
            platform,
            target,
            surface,
            session,
            tracker: PositionTracker::idle(),
            hover_ticker: None,
            hover: HoverFocus::default(),
            hover_poll: options.hover_poll,
            sink,
            closed: false,
        })
    }

    pub fn target(&self) -> &TargetWindowRef {
        &self.target
    }

    pub fn is_capturing(&self) -> bool {
        self.session.is_running()
    }

    pub fn is_tracking_position(&self) -> bool {
        self.tracker.is_tracking()
    }

    /// Wire frames into the surface, open the stream on `located`, then show
    /// the surface and start following the window and the cursor.
    pub async fn start_capture(
        &mut self,
        located: LocatedWindow,
        still_wanted: &(dyn Fn() -> bool + Send + Sync),
    ) -> Result<(), CaptureError> {
        let surface = Arc::clone(&self.surface);
        let on_frame: FrameSink = Arc::new(move |frame: Frame| surface.present(&frame));

        let sink = self.sink.clone();
        let on_stopped: StopSink = Arc::new(move |reason: String| {
            sink.send(StrategyEvent::TargetLost { reason });
        });

        let scale = self.platform.workspace.backing_scale();
        self.session
            .start(&self.target, located, scale, on_frame, on_stopped, still_wanted)
            .await?;

        self.surface.show();
        self.tracker = PositionTracker::start(
            self.platform.geometry.as_ref(),
            &self.target,
            self.sink.clone(),
        );
        self.hover_ticker = Some(Ticker::start(
            self.hover_poll,
            self.sink.clone(),
            StrategyEvent::HoverTick,
        ));

        info!(
            event = "core.overlay.started",
            pid = self.target.pid,
            tracking = self.tracker.is_tracking()
        );
        Ok(())
    }

    /// Follow the window to its new bounds.
    pub fn handle_moved(&mut self, moved: &WindowMove) {
        self.target.bounds = moved.bounds;
        if let Some(title) = &moved.title {
            self.target.title = title.clone();
        }
        let rect = to_surface_rect(
            moved.bounds,
            self.platform.workspace.primary_display_height(),
        );
        self.surface.set_frame(rect);
    }

    pub fn handle_hover_tick(&mut self) {
        if self.closed {
            return;
        }
        let context = self.focus_context();
        let workspace = &self.platform.workspace;
        let rect = to_surface_rect(self.target.bounds, workspace.primary_display_height());
        let inside = workspace
            .cursor_location()
            .is_some_and(|cursor| rect.contains(cursor));

        if let Some(pid) = self
            .hover
            .update(inside, workspace.frontmost_pid(), context)
        {
            debug!(event = "core.overlay.hover_focus", pid = pid, inside = inside);
            workspace.activate(pid);
        }
    }

    /// Stop hover (restoring focus), tracking and capture, then close the
    /// surface. Idempotent.
    pub fn stop_capture(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;

        if let Some(ticker) = self.hover_ticker.take() {
            ticker.stop();
        }
        let context = self.focus_context();
        if let Some(pid) = self.hover.reset(context) {
            self.platform.workspace.activate(pid);
        }
        self.tracker.stop();
        self.session.stop();
        self.surface.close();

        info!(event = "core.overlay.stopped", pid = self.target.pid);
    }

    fn focus_context(&self) -> FocusContext {
        FocusContext {
            target_pid: self.target.pid,
            own_pid: self.platform.workspace.own_pid(),
        }
    }
}

impl Drop for OverlaySurface {
    fn drop(&mut self) {
        self.stop_capture();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::locate_window;
    use crate::platform::fake::{FakePlatform, OWN_PID};
    use crate::strategy::StrategyReport;
    use crate::window::{Point, SurfaceRect, WindowBounds};
    use tokio::sync::mpsc;

    fn options() -> OverlayOptions {
        OverlayOptions {
            capture: CaptureOptions {
                fps: 30,
                start_timeout: Duration::from_secs(5),
            },
            hover_poll: Duration::from_millis(50),
        }
    }

    fn overlay(
        fake: &FakePlatform,
    ) -> (
        OverlaySurface,
        mpsc::UnboundedReceiver<StrategyReport>,
    ) {
        let (target, _) = fake.add_window(
            42,
            "Notes",
            "Groceries",
            WindowBounds::new(100.0, 100.0, 200.0, 100.0),
        );
        let (tx, rx) = mpsc::unbounded_channel();
        let overlay =
            OverlaySurface::new(fake.platform(), target, options(), StrategySink::new(1, tx))
                .unwrap();
        (overlay, rx)
    }

    async fn start(fake: &FakePlatform, overlay: &mut OverlaySurface) -> Result<(), CaptureError> {
        let located = locate_window(
            fake.platform().capture.as_ref(),
            overlay.target(),
            options().capture,
        )
        .await?;
        overlay.start_capture(located, &|| true).await
    }

    #[tokio::test]
    async fn test_surface_created_hidden_at_flipped_bounds() {
        let fake = FakePlatform::new();
        let (_overlay, _rx) = overlay(&fake);

        let surface = fake.last_surface().unwrap();
        assert!(!surface.is_shown());
        assert_eq!(
            surface.rect(),
            SurfaceRect {
                x: 100.0,
                y: 800.0,
                width: 200.0,
                height: 100.0
            }
        );
    }

    #[tokio::test]
    async fn test_start_capture_shows_surface_and_presents_frames() {
        let fake = FakePlatform::new();
        fake.emit_frame_on_start(true);
        let (mut overlay, _rx) = overlay(&fake);

        start(&fake, &mut overlay).await.unwrap();

        let surface = fake.last_surface().unwrap();
        assert!(surface.is_shown());
        assert_eq!(surface.frames_presented(), 1);
        assert!(overlay.is_capturing());
        assert!(overlay.is_tracking_position());
        assert_eq!(fake.last_stream_size(), Some((400, 200)));
    }

    #[tokio::test]
    async fn test_stream_end_reports_target_lost() {
        let fake = FakePlatform::new();
        let (mut overlay, mut rx) = overlay(&fake);
        start(&fake, &mut overlay).await.unwrap();

        fake.terminate_streams("window closed");

        let report = rx.recv().await.unwrap();
        assert_eq!(
            report.event,
            StrategyEvent::TargetLost {
                reason: "window closed".to_string()
            }
        );
    }

    #[tokio::test]
    async fn test_moved_repositions_surface() {
        let fake = FakePlatform::new();
        let (mut overlay, _rx) = overlay(&fake);
        start(&fake, &mut overlay).await.unwrap();

        overlay.handle_moved(&WindowMove {
            bounds: WindowBounds::new(0.0, 0.0, 50.0, 50.0),
            title: Some("Renamed".to_string()),
        });

        assert_eq!(fake.last_surface().unwrap().rect().y, 950.0);
        assert_eq!(overlay.target().title, "Renamed");
    }

    #[tokio::test]
    async fn test_hover_enter_and_leave_switch_focus() {
        let fake = FakePlatform::new();
        let (mut overlay, _rx) = overlay(&fake);
        start(&fake, &mut overlay).await.unwrap();
        fake.set_frontmost(Some(7));

        // Surface spans x 100..300, y 800..900 in bottom-left coordinates.
        fake.set_cursor(Some(Point::new(150.0, 850.0)));
        overlay.handle_hover_tick();
        overlay.handle_hover_tick();
        fake.set_cursor(Some(Point::new(10.0, 10.0)));
        overlay.handle_hover_tick();

        assert_eq!(fake.activations(), vec![42, 7]);
    }

    #[tokio::test]
    async fn test_stop_while_hovering_restores_focus_and_releases_everything() {
        let fake = FakePlatform::new();
        let (mut overlay, _rx) = overlay(&fake);
        start(&fake, &mut overlay).await.unwrap();
        fake.set_frontmost(Some(OWN_PID + 10));
        fake.set_cursor(Some(Point::new(150.0, 850.0)));
        overlay.handle_hover_tick();

        overlay.stop_capture();
        overlay.stop_capture();

        assert_eq!(fake.activations(), vec![42, OWN_PID + 10]);
        assert_eq!(fake.active_streams(), 0);
        assert_eq!(fake.active_geometry_subscriptions(), 0);
        assert_eq!(fake.open_surfaces(), 0);
        assert!(!overlay.is_capturing());
    }

    #[tokio::test]
    async fn test_failed_start_leaves_surface_hidden() {
        let fake = FakePlatform::new();
        fake.set_fail_stream(true);
        let (mut overlay, _rx) = overlay(&fake);

        let result = start(&fake, &mut overlay).await;
        assert!(matches!(result, Err(CaptureError::StreamStartFailed { .. })));
        assert!(!fake.last_surface().unwrap().is_shown());

        drop(overlay);
        assert_eq!(fake.open_surfaces(), 0);
    }
}
