use std::sync::Arc;

use crate::foundation::core::{Resolution, check_rgba_len};
use crate::foundation::error::{PhasewarpError, PhasewarpResult};

/// Immutable RGBA8 snapshot of the source at one sampling instant.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CapturedFrame {
    res: Resolution,
    rgba8: Arc<[u8]>,
}

impl CapturedFrame {
    /// Wrap a tightly packed RGBA8 buffer.
    pub fn new(res: Resolution, rgba8: Vec<u8>) -> PhasewarpResult<Self> {
        check_rgba_len(&rgba8, res, "captured frame")?;
        Ok(Self {
            res,
            rgba8: rgba8.into(),
        })
    }

    /// Frame size.
    pub fn resolution(&self) -> Resolution {
        self.res
    }

    /// RGBA8 bytes, row-major.
    pub fn pixels(&self) -> &[u8] {
        &self.rgba8
    }
}

/// Bounded, ordered store of captured frames.
///
/// Slots fill front to back; the filled count only grows until [`FrameRing::clear`] (or the ring
/// is replaced), and frames are never modified after capture.
#[derive(Clone, Debug)]
pub struct FrameRing {
    res: Resolution,
    capacity: usize,
    frames: Vec<CapturedFrame>,
}

impl FrameRing {
    /// An empty ring with `capacity` slots of `res`-sized frames.
    pub fn new(res: Resolution, capacity: usize) -> Self {
        Self {
            res,
            capacity,
            frames: Vec::with_capacity(capacity),
        }
    }

    /// Frame size every slot must match.
    pub fn resolution(&self) -> Resolution {
        self.res
    }

    /// Target number of slots.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of slots actually filled.
    pub fn filled(&self) -> usize {
        self.frames.len()
    }

    /// Whether every slot is filled.
    pub fn is_full(&self) -> bool {
        self.frames.len() >= self.capacity
    }

    /// Frame in slot `idx`.
    pub fn get(&self, idx: usize) -> Option<&CapturedFrame> {
        self.frames.get(idx)
    }

    /// Filled slots in capture order.
    pub fn frames(&self) -> &[CapturedFrame] {
        &self.frames
    }

    /// Drop every captured frame, keeping size and capacity.
    pub fn clear(&mut self) {
        self.frames.clear();
    }

    /// Store `rgba8` in the next free slot and return the slot index.
    pub fn push(&mut self, rgba8: Vec<u8>) -> PhasewarpResult<usize> {
        if self.is_full() {
            return Err(PhasewarpError::capture(format!(
                "frame ring is full ({} slots)",
                self.capacity
            )));
        }
        let frame = CapturedFrame::new(self.res, rgba8)?;
        self.frames.push(frame);
        Ok(self.frames.len() - 1)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/capture/ring.rs"]
mod tests;
