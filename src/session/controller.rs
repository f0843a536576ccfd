use std::collections::VecDeque;
use std::time::Duration;

use crate::capture::limiter::CaptureLimiter;
use crate::capture::ring::FrameRing;
use crate::capture::source::VideoSource;
use crate::config::layout::Layout;
use crate::config::settings::SessionConfig;
use crate::engine::phase::{EngineThreading, PhaseField};
use crate::field::control::ControlField;
use crate::field::template::TemplateKind;
use crate::foundation::core::Resolution;
use crate::foundation::error::PhasewarpResult;
use crate::render::composite::composite_phase_field;
use crate::render::display::{
    CAPTURE_OVERLAY_ALPHA, DisplayBase, PLAYBACK_OVERLAY_ALPHA, compose_display,
};
use crate::render::output::OutputImage;
use crate::session::state::{ModeTransition, SessionMode, TransitionReason};

const TRANSITION_HISTORY: usize = 64;

/// Read-only snapshot for status displays.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct SessionStatus {
    /// Current mode.
    pub mode: SessionMode,
    /// Frames captured so far.
    pub captured: usize,
    /// Slots the current capture fills.
    pub target: usize,
    /// Captured window length in seconds.
    pub loop_seconds: f64,
    /// Processing grid, once a source is loaded.
    pub processing: Option<Resolution>,
    /// Display surface, once a source is loaded.
    pub display: Option<Resolution>,
    /// Whether the control-field overlay is drawn.
    pub show_overlay: bool,
}

/// What one [`Session::tick`] did.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TickReport {
    /// Mode after the tick.
    pub mode: SessionMode,
    /// Ring slot filled this tick, if a capture fired.
    pub captured_slot: Option<usize>,
    /// Whether the phase engine advanced and the output was recomposited.
    pub advanced: bool,
    /// Mode change caused by this tick.
    pub transition: Option<ModeTransition>,
}

/// Per-source state, reallocated wholesale whenever the grid or ring length changes.
struct Buffers {
    layout: Layout,
    control: ControlField,
    phases: PhaseField,
    ring: FrameRing,
    output: OutputImage,
    preview: Option<Vec<u8>>,
}

impl Buffers {
    fn allocate(layout: Layout, target_len: usize, control: Option<&ControlField>) -> Self {
        let res = layout.processing;
        let control = match control {
            Some(prev) => prev.resized(res),
            None => ControlField::new(res),
        };
        Self {
            layout,
            control,
            phases: PhaseField::new(res),
            ring: FrameRing::new(res, target_len),
            output: OutputImage::new(res),
            preview: None,
        }
    }
}

/// Interactive time-remapping session.
///
/// Owns the control field, frame ring, phase field and output for one loaded source, and
/// sequences painting, capture and playback. The host calls [`Session::tick`] once per rendered
/// frame with a monotonic timestamp; every operation completes synchronously within the call.
pub struct Session {
    config: SessionConfig,
    threading: EngineThreading,
    mode: SessionMode,
    source: Option<Box<dyn VideoSource>>,
    buffers: Option<Buffers>,
    limiter: CaptureLimiter,
    history: VecDeque<ModeTransition>,
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("mode", &self.mode)
            .field("config", &self.config)
            .field("has_source", &self.source.is_some())
            .field("layout", &self.buffers.as_ref().map(|b| b.layout))
            .finish()
    }
}

impl Session {
    /// Create an empty session in [`SessionMode::Painting`].
    pub fn new(config: SessionConfig) -> PhasewarpResult<Self> {
        config.validate()?;
        let limiter = CaptureLimiter::new(config.capture_interval());
        Ok(Self {
            config,
            threading: EngineThreading::default(),
            mode: SessionMode::Painting,
            source: None,
            buffers: None,
            limiter,
            history: VecDeque::new(),
        })
    }

    /// Use `threading` for the per-pixel engine and compositor passes.
    pub fn with_threading(mut self, threading: EngineThreading) -> Self {
        self.threading = threading;
        self
    }

    /// Current mode.
    pub fn mode(&self) -> SessionMode {
        self.mode
    }

    /// Active configuration snapshot.
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Display and processing grids of the loaded source.
    pub fn layout(&self) -> Option<Layout> {
        self.buffers.as_ref().map(|b| b.layout)
    }

    /// The painted control field.
    pub fn control_field(&self) -> Option<&ControlField> {
        self.buffers.as_ref().map(|b| &b.control)
    }

    /// Per-pixel phase accumulators.
    pub fn phase_field(&self) -> Option<&PhaseField> {
        self.buffers.as_ref().map(|b| &b.phases)
    }

    /// Captured frames.
    pub fn frame_ring(&self) -> Option<&FrameRing> {
        self.buffers.as_ref().map(|b| &b.ring)
    }

    /// Last composited playback frame.
    pub fn output(&self) -> Option<&OutputImage> {
        self.buffers.as_ref().map(|b| &b.output)
    }

    /// Most recent frame sampled from the source.
    pub fn preview(&self) -> Option<&[u8]> {
        self.buffers.as_ref().and_then(|b| b.preview.as_deref())
    }

    /// The loaded source.
    pub fn source(&self) -> Option<&dyn VideoSource> {
        self.source.as_deref()
    }

    /// Recent mode changes, oldest first.
    pub fn transitions(&self) -> impl Iterator<Item = &ModeTransition> {
        self.history.iter()
    }

    /// Status snapshot for the host.
    pub fn status(&self) -> SessionStatus {
        SessionStatus {
            mode: self.mode,
            captured: self.buffers.as_ref().map_or(0, |b| b.ring.filled()),
            target: self
                .buffers
                .as_ref()
                .map_or_else(|| self.config.target_len(), |b| b.ring.capacity()),
            loop_seconds: self.config.sample_window_seconds,
            processing: self.buffers.as_ref().map(|b| b.layout.processing),
            display: self.buffers.as_ref().map(|b| b.layout.display),
            show_overlay: self.config.show_overlay,
        }
    }

    /// Replace the source, forcing painting mode and fresh buffers sized to it.
    #[tracing::instrument(skip(self, source))]
    pub fn load_video(&mut self, mut source: Box<dyn VideoSource>) {
        if let Some(old) = self.source.as_mut() {
            old.pause();
        }
        self.source = None;
        self.transition(SessionMode::Painting, TransitionReason::SourceLoaded);

        let layout = Layout::derive(source.native_size(), self.config.max_display_width);
        let mut buffers = Buffers::allocate(layout, self.config.target_len(), None);

        source.seek_to_start();
        source.pause();
        match source.sample_rgba8(layout.processing) {
            Ok(frame) => buffers.preview = frame,
            Err(e) => tracing::warn!(error = %e, "could not sample first frame of new source"),
        }

        tracing::info!(
            native = %layout.native,
            display = %layout.display,
            processing = %layout.processing,
            target = buffers.ring.capacity(),
            "loaded video source"
        );
        self.limiter.reset();
        self.buffers = Some(buffers);
        self.source = Some(source);
    }

    /// Start a capture session. No-op without a loaded source.
    ///
    /// Playing or capturing sessions are stopped first, so capture always restarts from slot 0.
    #[tracing::instrument(skip(self))]
    pub fn play(&mut self) -> bool {
        if self.source.is_none() || self.buffers.is_none() {
            tracing::debug!("play ignored: no video loaded");
            return false;
        }
        if self.mode != SessionMode::Painting {
            self.stop();
        }
        self.start_capture();
        true
    }

    /// Return to painting and pause the source.
    pub fn stop(&mut self) {
        if let Some(src) = self.source.as_mut() {
            src.pause();
        }
        self.transition(SessionMode::Painting, TransitionReason::StopRequested);
    }

    /// End a running capture early, e.g. because the host's video stopped delivering frames.
    ///
    /// Plays whatever was captured when that is at least two frames, otherwise falls back to
    /// painting.
    pub fn end_capture(&mut self) -> Option<ModeTransition> {
        if self.mode != SessionMode::Capturing {
            return None;
        }
        self.finish_capture()
    }

    /// Reset the control field to neutral gray.
    pub fn clear_map(&mut self) {
        if let Some(b) = self.buffers.as_mut() {
            b.control.reset();
        }
    }

    /// Fill the control field from a template.
    pub fn apply_template(&mut self, kind: TemplateKind) {
        if let Some(b) = self.buffers.as_mut() {
            b.control.apply_template(kind);
        }
    }

    /// Stamp a disc in processing coordinates. Only effective while painting.
    pub fn paint_stroke(&mut self, cx: f64, cy: f64, radius: f64, gray: i32) -> bool {
        if self.mode != SessionMode::Painting {
            return false;
        }
        let Some(b) = self.buffers.as_mut() else {
            return false;
        };
        b.control.paint_stroke(cx, cy, radius, gray);
        true
    }

    /// Paint with the configured brush at a display-space cursor position.
    pub fn paint_at_display(&mut self, x: f64, y: f64) -> bool {
        let Some(layout) = self.layout() else {
            return false;
        };
        let Some((px, py)) = layout.display_to_processing(x, y) else {
            return false;
        };
        let radius = layout.brush_radius(self.config.brush_size);
        let gray = i32::from(self.config.gray_value);
        self.paint_stroke(px, py, radius, gray)
    }

    /// Show or hide the control-field overlay.
    pub fn set_show_overlay(&mut self, show: bool) {
        self.config.show_overlay = show;
    }

    /// Flip the overlay flag and return the new value.
    pub fn toggle_overlay(&mut self) -> bool {
        self.config.show_overlay = !self.config.show_overlay;
        self.config.show_overlay
    }

    /// Apply a new configuration snapshot.
    ///
    /// A changed ring length, or (outside capture) a changed display width, reallocates every
    /// buffer with the control field rescaled. A running capture then restarts; playback falls
    /// back to painting. A display width changed mid-capture is applied on the first tick after
    /// the capture ends.
    #[tracing::instrument(skip(self, config))]
    pub fn update_config(&mut self, config: SessionConfig) -> PhasewarpResult<()> {
        config.validate()?;
        let interval = config.capture_interval();
        self.config = config;
        self.limiter.set_interval(interval);
        self.reconcile_buffers();
        Ok(())
    }

    /// Reallocate when the ring length, or outside capture the display width, no longer matches
    /// the configuration.
    fn reconcile_buffers(&mut self) {
        let Some(b) = self.buffers.as_ref() else {
            return;
        };
        let target_changed = b.ring.capacity() != self.config.target_len();
        let layout = Layout::derive(Some(b.layout.native), self.config.max_display_width);
        let display_changed =
            self.mode != SessionMode::Capturing && layout.display.width != b.layout.display.width;
        if !(target_changed || display_changed) {
            return;
        }

        // During capture only the ring length can trigger this, so the grid stays put.
        let layout = if display_changed { layout } else { b.layout };
        tracing::info!(
            target = self.config.target_len(),
            processing = %layout.processing,
            "reallocating session buffers"
        );
        let rebuilt = Buffers::allocate(layout, self.config.target_len(), Some(&b.control));
        self.buffers = Some(rebuilt);

        match self.mode {
            SessionMode::Capturing => self.start_capture(),
            SessionMode::Playing => {
                if let Some(src) = self.source.as_mut() {
                    src.pause();
                }
                self.transition(SessionMode::Painting, TransitionReason::Reconfigured);
            }
            SessionMode::Painting => {}
        }
    }

    /// Run one render-loop tick at monotonic time `now`.
    pub fn tick(&mut self, now: Duration) -> TickReport {
        let before = self.history.len();
        let mut report = TickReport {
            mode: self.mode,
            captured_slot: None,
            advanced: false,
            transition: None,
        };

        // A display width changed during capture takes effect here, once capture is over.
        if self.mode != SessionMode::Capturing {
            self.reconcile_buffers();
        }

        match self.mode {
            SessionMode::Painting => {}
            SessionMode::Capturing => report.captured_slot = self.capture_tick(now),
            SessionMode::Playing => report.advanced = self.playback_tick(),
        }

        report.mode = self.mode;
        if self.history.len() != before {
            report.transition = self.history.back().copied();
        }
        report
    }

    /// Frame the host should present, at processing resolution.
    ///
    /// `None` until a source is loaded; hosts show a prompt instead.
    pub fn display_frame(&self) -> PhasewarpResult<Option<OutputImage>> {
        let Some(b) = self.buffers.as_ref() else {
            return Ok(None);
        };
        let overlay = |alpha| self.config.show_overlay.then_some(alpha);
        let img = match self.mode {
            SessionMode::Painting => compose_display(&b.control, DisplayBase::ControlField, None)?,
            SessionMode::Capturing => match b.preview.as_deref() {
                Some(px) => compose_display(
                    &b.control,
                    DisplayBase::Preview(px),
                    overlay(CAPTURE_OVERLAY_ALPHA),
                )?,
                None => compose_display(
                    &b.control,
                    DisplayBase::Output(&OutputImage::new(b.layout.processing)),
                    overlay(CAPTURE_OVERLAY_ALPHA),
                )?,
            },
            SessionMode::Playing => compose_display(
                &b.control,
                DisplayBase::Output(&b.output),
                overlay(PLAYBACK_OVERLAY_ALPHA),
            )?,
        };
        Ok(Some(img))
    }

    fn start_capture(&mut self) {
        let target = self.config.target_len();
        let Some(b) = self.buffers.as_mut() else {
            return;
        };
        b.phases.reset();
        b.ring = FrameRing::new(b.layout.processing, target);
        self.limiter.reset();
        if let Some(src) = self.source.as_mut() {
            src.seek_to_start();
            src.play();
        }
        tracing::info!(target, interval = ?self.limiter.interval(), "capture started");
        if self.mode == SessionMode::Painting {
            self.transition(SessionMode::Capturing, TransitionReason::PlayRequested);
        }
    }

    fn capture_tick(&mut self, now: Duration) -> Option<usize> {
        if !self.limiter.is_due(now) {
            self.refresh_preview();
            return None;
        }
        let (Some(b), Some(src)) = (self.buffers.as_mut(), self.source.as_mut()) else {
            return None;
        };
        if b.ring.is_full() {
            self.finish_capture();
            return None;
        }

        let mut slot = None;
        let mut source_done = false;
        match src.sample_rgba8(b.ring.resolution()) {
            Ok(Some(px)) => match b.ring.push(px.clone()) {
                Ok(idx) => {
                    self.limiter.record(now);
                    b.preview = Some(px);
                    tracing::debug!(slot = idx, at = ?now, "captured frame");
                    slot = Some(idx);
                }
                Err(e) => {
                    tracing::warn!(error = %e, "dropping captured frame");
                    source_done = true;
                }
            },
            Ok(None) => {
                tracing::info!(captured = b.ring.filled(), "video source ended during capture");
                source_done = true;
            }
            Err(e) => {
                tracing::warn!(error = %e, "video source failed during capture");
                source_done = true;
            }
        }

        let full = b.ring.is_full();
        if source_done || full {
            self.finish_capture();
        }
        slot
    }

    fn refresh_preview(&mut self) {
        let (Some(b), Some(src)) = (self.buffers.as_mut(), self.source.as_mut()) else {
            return;
        };
        let res = b.layout.processing;
        match src.peek_rgba8(res) {
            Ok(Some(px)) if px.len() == res.rgba_len() => b.preview = Some(px),
            Ok(_) => {}
            Err(e) => tracing::debug!(error = %e, "live preview unavailable"),
        }
    }

    fn finish_capture(&mut self) -> Option<ModeTransition> {
        if let Some(src) = self.source.as_mut() {
            src.pause();
        }
        let captured = self.buffers.as_ref().map_or(0, |b| b.ring.filled());
        if captured >= 2 {
            self.transition(SessionMode::Playing, TransitionReason::CaptureComplete)
        } else {
            tracing::warn!(captured, "capture ended with fewer than 2 frames; back to painting");
            self.transition(SessionMode::Painting, TransitionReason::InsufficientFrames)
        }
    }

    fn playback_tick(&mut self) -> bool {
        let Some(b) = self.buffers.as_mut() else {
            return false;
        };
        let frame_count = b.ring.filled();
        if frame_count < 2 {
            self.transition(SessionMode::Painting, TransitionReason::InsufficientFrames);
            return false;
        }

        let threading = self.threading;
        let res = b
            .phases
            .advance(&b.control, self.config.speed_scale, frame_count, threading)
            .and_then(|()| composite_phase_field(&mut b.output, &b.ring, &b.phases, threading));
        if let Err(e) = res {
            tracing::warn!(error = %e, "playback tick failed; back to painting");
            self.transition(SessionMode::Painting, TransitionReason::Reconfigured);
            return false;
        }
        true
    }

    fn transition(&mut self, to: SessionMode, reason: TransitionReason) -> Option<ModeTransition> {
        let from = self.mode;
        if from == to {
            return None;
        }
        debug_assert!(
            from.can_transition(to),
            "illegal session transition {from} -> {to}"
        );
        let t = ModeTransition { from, to, reason };
        tracing::info!(%from, %to, ?reason, "session mode changed");
        self.mode = to;
        if self.history.len() == TRANSITION_HISTORY {
            self.history.pop_front();
        }
        self.history.push_back(t);
        Some(t)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/session/controller.rs"]
mod tests;
