use image::RgbaImage;

use crate::foundation::core::{Resolution, check_rgba_len};
use crate::foundation::error::{PhasewarpError, PhasewarpResult};

/// Opaque RGBA8 image at processing (or display) resolution.
///
/// The compositor overwrites every byte on each playback tick.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutputImage {
    res: Resolution,
    data: Vec<u8>,
}

impl OutputImage {
    /// Opaque black image.
    pub fn new(res: Resolution) -> Self {
        let mut data = vec![0u8; res.rgba_len()];
        for px in data.chunks_exact_mut(4) {
            px[3] = 255;
        }
        Self { res, data }
    }

    /// Wrap an RGBA8 buffer.
    pub fn from_rgba8(res: Resolution, data: Vec<u8>) -> PhasewarpResult<Self> {
        check_rgba_len(&data, res, "output image")?;
        Ok(Self { res, data })
    }

    /// Image size.
    pub fn resolution(&self) -> Resolution {
        self.res
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.res.width
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.res.height
    }

    /// RGBA8 bytes, row-major.
    pub fn pixels(&self) -> &[u8] {
        &self.data
    }

    pub(crate) fn pixels_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// RGBA of pixel `(x, y)`.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.res.width || y >= self.res.height {
            return None;
        }
        let i = (y as usize * self.res.width as usize + x as usize) * 4;
        Some([
            self.data[i],
            self.data[i + 1],
            self.data[i + 2],
            self.data[i + 3],
        ])
    }

    /// Copy into an `image` buffer for encoding.
    pub fn to_rgba_image(&self) -> PhasewarpResult<RgbaImage> {
        RgbaImage::from_raw(self.res.width, self.res.height, self.data.clone())
            .ok_or_else(|| PhasewarpError::evaluation("output buffer does not match its size"))
    }
}
