#[cfg(feature = "media-ffmpeg")]
pub(crate) mod ffmpeg;
pub(crate) mod limiter;
pub(crate) mod ring;
pub(crate) mod source;
