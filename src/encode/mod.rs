//! Output sinks for rendered playback frames.

/// `ffmpeg`-based sinks (MP4 output via system `ffmpeg`).
pub(crate) mod ffmpeg;
/// Generic frame sink trait and built-in sinks.
pub(crate) mod sink;
