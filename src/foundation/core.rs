use crate::foundation::error::{PhasewarpError, PhasewarpResult};

/// Pixel grid dimensions.
///
/// Used both for the processing grid (control field, phases, captured frames, output) and for
/// the display surface the host draws into.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct Resolution {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Resolution {
    /// Construct a non-empty resolution.
    pub fn new(width: u32, height: u32) -> PhasewarpResult<Self> {
        if width == 0 || height == 0 {
            return Err(PhasewarpError::validation(
                "resolution width/height must be > 0",
            ));
        }
        Ok(Self { width, height })
    }

    /// Number of pixels in the grid.
    pub fn pixel_count(self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Byte length of a tightly packed RGBA8 buffer of this size.
    pub fn rgba_len(self) -> usize {
        self.pixel_count() * 4
    }

    /// Width divided by height.
    pub fn aspect(self) -> f64 {
        f64::from(self.width) / f64::from(self.height)
    }
}

impl std::fmt::Display for Resolution {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Check that `buf` is a tightly packed RGBA8 buffer for `res`.
pub(crate) fn check_rgba_len(buf: &[u8], res: Resolution, what: &str) -> PhasewarpResult<()> {
    if buf.len() != res.rgba_len() {
        return Err(PhasewarpError::validation(format!(
            "{what}: expected {} bytes for {res} rgba8, got {}",
            res.rgba_len(),
            buf.len()
        )));
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
