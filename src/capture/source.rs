use image::{RgbaImage, imageops::FilterType};

use crate::foundation::core::Resolution;
use crate::foundation::error::{PhasewarpError, PhasewarpResult};

/// Live decoded-video collaborator consumed by the session.
///
/// Implementations own decoding and playback timing. The session only seeks, toggles playback
/// and samples whatever frame is current, resized to the processing grid.
pub trait VideoSource: Send {
    /// Native frame size, once known.
    fn native_size(&self) -> Option<Resolution>;

    /// Start or resume playback.
    fn play(&mut self);

    /// Pause playback, keeping the current frame.
    fn pause(&mut self);

    /// Whether the source is currently playing.
    fn is_playing(&self) -> bool;

    /// Rewind to the first frame.
    fn seek_to_start(&mut self);

    /// Current frame as tightly packed RGBA8 at `res`.
    ///
    /// `Ok(None)` means no frame is available because the source ended or stalled.
    fn sample_rgba8(&mut self, res: Resolution) -> PhasewarpResult<Option<Vec<u8>>>;

    /// Frame the viewer sees right now, without consuming anything from the capture stream.
    ///
    /// Polled between captures to keep the preview live. The default reports nothing, which
    /// leaves the last captured frame on screen.
    fn peek_rgba8(&mut self, _res: Resolution) -> PhasewarpResult<Option<Vec<u8>>> {
        Ok(None)
    }
}

/// In-memory source holding pre-decoded frames.
///
/// While playing, each sample returns the current frame and steps to the next one; once the
/// frames run out the source reports `None`. While paused, samples repeat the current frame.
#[derive(Clone, Debug)]
pub struct MemoryVideoSource {
    frames: Vec<RgbaImage>,
    position: usize,
    playing: bool,
}

impl MemoryVideoSource {
    /// Build from decoded images; all frames must share one size.
    pub fn new(frames: Vec<RgbaImage>) -> PhasewarpResult<Self> {
        if let Some(first) = frames.first() {
            let dims = first.dimensions();
            if dims.0 == 0 || dims.1 == 0 {
                return Err(PhasewarpError::validation("video frames must be non-empty"));
            }
            if frames.iter().any(|f| f.dimensions() != dims) {
                return Err(PhasewarpError::validation(
                    "all video frames must share one size",
                ));
            }
        }
        Ok(Self {
            frames,
            position: 0,
            playing: false,
        })
    }

    /// Build from raw RGBA8 buffers of size `res`.
    pub fn from_rgba8(res: Resolution, frames: Vec<Vec<u8>>) -> PhasewarpResult<Self> {
        let images = frames
            .into_iter()
            .map(|data| {
                RgbaImage::from_raw(res.width, res.height, data).ok_or_else(|| {
                    PhasewarpError::validation(format!("raw frame does not match {res} rgba8"))
                })
            })
            .collect::<PhasewarpResult<Vec<_>>>()?;
        Self::new(images)
    }

    /// Number of frames held.
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Whether the source holds no frames at all.
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Index of the frame the next sample returns.
    pub fn position(&self) -> usize {
        self.position
    }
}

impl VideoSource for MemoryVideoSource {
    fn native_size(&self) -> Option<Resolution> {
        self.frames.first().map(|f| Resolution {
            width: f.width(),
            height: f.height(),
        })
    }

    fn play(&mut self) {
        self.playing = true;
    }

    fn pause(&mut self) {
        self.playing = false;
    }

    fn is_playing(&self) -> bool {
        self.playing
    }

    fn seek_to_start(&mut self) {
        self.position = 0;
    }

    fn sample_rgba8(&mut self, res: Resolution) -> PhasewarpResult<Option<Vec<u8>>> {
        let idx = if self.playing {
            self.position
        } else {
            self.position.min(self.frames.len().saturating_sub(1))
        };
        let Some(frame) = self.frames.get(idx) else {
            return Ok(None);
        };
        let out = resized_rgba8(frame, res);
        if self.playing {
            self.position += 1;
        }
        Ok(Some(out))
    }

    fn peek_rgba8(&mut self, res: Resolution) -> PhasewarpResult<Option<Vec<u8>>> {
        // While playing, `position` already points past the frame last handed out.
        let idx = if self.playing {
            self.position.saturating_sub(1)
        } else {
            self.position
        };
        let idx = idx.min(self.frames.len().saturating_sub(1));
        Ok(self.frames.get(idx).map(|f| resized_rgba8(f, res)))
    }
}

fn resized_rgba8(frame: &RgbaImage, res: Resolution) -> Vec<u8> {
    if frame.dimensions() == (res.width, res.height) {
        frame.as_raw().clone()
    } else {
        image::imageops::resize(frame, res.width, res.height, FilterType::Nearest).into_raw()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/capture/source.rs"]
mod tests;
