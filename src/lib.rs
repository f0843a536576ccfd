//! Phasewarp is a per-pixel time-remapping engine for video.
//!
//! A user paints a grayscale control field over a video; the session then captures a bounded
//! ring of frames and plays them back with every pixel advancing its own phase at a speed read
//! from the field. Mid-gray stands still, brighter plays forward, darker plays backward, and
//! fractional phases are linearly interpolated between neighbouring frames.
//!
//! # Pipeline overview
//!
//! 1. **Paint**: brush strokes and templates write the [`ControlField`].
//! 2. **Capture**: [`Session::tick`] samples a [`VideoSource`] into a [`FrameRing`], rate-limited
//!    by [`CaptureLimiter`].
//! 3. **Advance**: the [`PhaseField`] adds `to_speed(sample) * speed_scale` to every pixel and
//!    wraps into `[0, captured)`.
//! 4. **Composite**: each output pixel blends its frame pair into the [`OutputImage`].
//!
//! The session is single-threaded and tick-driven. The per-pixel passes are pure functions over
//! explicit buffers and can be sharded across a rayon pool with [`EngineThreading`].
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod capture;
mod config;
mod encode;
mod engine;
mod field;
mod foundation;
mod render;
mod session;

#[cfg(feature = "media-ffmpeg")]
pub use capture::ffmpeg::{FfmpegVideoSource, VideoSourceInfo, probe_video};
pub use capture::limiter::CaptureLimiter;
pub use capture::ring::{CapturedFrame, FrameRing};
pub use capture::source::{MemoryVideoSource, VideoSource};
pub use config::layout::{FALLBACK_NATIVE, Layout};
pub use config::settings::SessionConfig;
pub use encode::ffmpeg::{FfmpegSink, FfmpegSinkOpts, ensure_parent_dir, is_ffmpeg_on_path};
pub use encode::sink::{FrameSink, InMemorySink, PngSequenceSink, SinkConfig};
pub use engine::phase::{
    EngineThreading, FrameSample, PhaseField, advance_phases, advance_phases_with, sample_phase,
    wrap_phase,
};
pub use field::control::{ControlField, NEUTRAL_GRAY, to_speed};
pub use field::template::TemplateKind;
pub use foundation::core::Resolution;
pub use foundation::error::{PhasewarpError, PhasewarpResult};
pub use render::composite::{composite_phase_field, lerp_in_place, lerp_px};
pub use render::display::{
    CAPTURE_OVERLAY_ALPHA, DisplayBase, PLAYBACK_OVERLAY_ALPHA, compose_display, over,
    overlay_control_in_place, upscale_to_display,
};
pub use render::output::OutputImage;
pub use session::controller::{Session, SessionStatus, TickReport};
pub use session::state::{ModeTransition, SessionMode, TransitionReason};
