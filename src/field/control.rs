use image::{GrayImage, imageops::FilterType};
use kurbo::{Circle, Point, Shape as _};

use crate::field::template::TemplateKind;
use crate::foundation::core::Resolution;
use crate::foundation::error::{PhasewarpError, PhasewarpResult};

/// Gray value that maps to zero speed.
pub const NEUTRAL_GRAY: u8 = 128;

/// Map a control sample to a signed speed factor in `[-1, 1]`.
///
/// 128 is exactly still, 0 is full reverse and 255 is full forward.
pub fn to_speed(sample: u8) -> f32 {
    ((f32::from(sample) - 128.0) / 127.0).clamp(-1.0, 1.0)
}

/// Painted grayscale grid that drives per-pixel playback speed.
///
/// One sample per processing pixel, row-major.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ControlField {
    res: Resolution,
    samples: Vec<u8>,
}

impl ControlField {
    /// A field filled with [`NEUTRAL_GRAY`].
    pub fn new(res: Resolution) -> Self {
        Self {
            res,
            samples: vec![NEUTRAL_GRAY; res.pixel_count()],
        }
    }

    /// Wrap existing row-major samples.
    pub fn from_samples(res: Resolution, samples: Vec<u8>) -> PhasewarpResult<Self> {
        if samples.len() != res.pixel_count() {
            return Err(PhasewarpError::validation(format!(
                "control field {res} expects {} samples, got {}",
                res.pixel_count(),
                samples.len()
            )));
        }
        Ok(Self { res, samples })
    }

    /// Grid size.
    pub fn resolution(&self) -> Resolution {
        self.res
    }

    /// Row-major samples.
    pub fn samples(&self) -> &[u8] {
        &self.samples
    }

    /// Sample at `(x, y)`, or `None` outside the grid.
    pub fn get(&self, x: u32, y: u32) -> Option<u8> {
        if x >= self.res.width || y >= self.res.height {
            return None;
        }
        self.samples
            .get(y as usize * self.res.width as usize + x as usize)
            .copied()
    }

    /// Fill the whole grid with [`NEUTRAL_GRAY`].
    pub fn reset(&mut self) {
        self.samples.fill(NEUTRAL_GRAY);
    }

    /// Stamp a filled circle.
    ///
    /// A sample is covered when its centre lies inside the circle. `gray` is clamped to
    /// `[0, 255]`; non-positive or non-finite radii paint nothing.
    pub fn paint_stroke(&mut self, cx: f64, cy: f64, radius: f64, gray: i32) {
        if !(radius.is_finite() && radius > 0.0 && cx.is_finite() && cy.is_finite()) {
            return;
        }
        let value = gray.clamp(0, 255) as u8;
        let circle = Circle::new(Point::new(cx, cy), radius);
        let bbox = circle.bounding_box();

        let w = self.res.width as usize;
        let x0 = bbox.x0.floor().max(0.0) as usize;
        let y0 = bbox.y0.floor().max(0.0) as usize;
        let x1 = (bbox.x1.ceil().max(0.0) as usize).min(w);
        let y1 = (bbox.y1.ceil().max(0.0) as usize).min(self.res.height as usize);

        for y in y0..y1 {
            let row = &mut self.samples[y * w..(y + 1) * w];
            for (x, s) in row.iter_mut().enumerate().take(x1).skip(x0) {
                if circle.contains(Point::new(x as f64 + 0.5, y as f64 + 0.5)) {
                    *s = value;
                }
            }
        }
    }

    /// Replace every sample with the output of a template generator.
    pub fn apply_template(&mut self, kind: TemplateKind) {
        let w = self.res.width;
        let row: Vec<u8> = (0..w).map(|x| kind.value_at(x, w)).collect();
        for dst in self.samples.chunks_exact_mut(w as usize) {
            dst.copy_from_slice(&row);
        }
    }

    /// Nearest-neighbour rescale into a new grid, keeping the painted content.
    pub fn resized(&self, res: Resolution) -> Self {
        if res == self.res {
            return self.clone();
        }
        let Some(img) = GrayImage::from_raw(self.res.width, self.res.height, self.samples.clone())
        else {
            return Self::new(res);
        };
        let scaled = image::imageops::resize(&img, res.width, res.height, FilterType::Nearest);
        Self {
            res,
            samples: scaled.into_raw(),
        }
    }

    /// Per-sample signed speeds, see [`to_speed`].
    pub fn speed_at(&self, idx: usize) -> f32 {
        self.samples.get(idx).copied().map_or(0.0, to_speed)
    }

    /// Copy into an 8-bit grayscale image.
    pub fn to_luma_image(&self) -> GrayImage {
        GrayImage::from_raw(self.res.width, self.res.height, self.samples.clone())
            .unwrap_or_else(|| GrayImage::new(self.res.width, self.res.height))
    }

    /// Opaque RGBA8 rendering of the field (gray replicated into r, g, b).
    pub fn to_rgba8(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.samples.len() * 4);
        for &g in &self.samples {
            out.extend_from_slice(&[g, g, g, 255]);
        }
        out
    }
}

#[cfg(test)]
#[path = "../../tests/unit/field/control.rs"]
mod tests;
