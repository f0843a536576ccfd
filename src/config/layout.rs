use crate::foundation::core::Resolution;

/// Native size assumed when the source cannot report one.
pub const FALLBACK_NATIVE: Resolution = Resolution {
    width: 1280,
    height: 720,
};

const PROCESSING_DOWNSCALE: f64 = 3.5;
const PROCESSING_MIN_WIDTH: f64 = 180.0;
const PROCESSING_MAX_WIDTH: f64 = 360.0;

/// Display and processing grids derived from a source's native size.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Layout {
    /// Native decoded size of the source.
    pub native: Resolution,
    /// Size of the surface the host presents.
    pub display: Resolution,
    /// Grid shared by the control field, phases, captured frames and output.
    pub processing: Resolution,
}

impl Layout {
    /// Derive the display and processing grids, preserving the source aspect ratio.
    pub fn derive(native: Option<Resolution>, max_display_width: u32) -> Self {
        let native = native.unwrap_or(FALLBACK_NATIVE);
        let aspect = native.aspect();

        let display_w = max_display_width.min(native.width).max(1);
        let display_h = round_dim(f64::from(display_w) / aspect);

        let proc_w = round_dim(
            (f64::from(display_w) / PROCESSING_DOWNSCALE)
                .clamp(PROCESSING_MIN_WIDTH, PROCESSING_MAX_WIDTH),
        );
        let proc_h = round_dim(f64::from(proc_w) / aspect);

        Self {
            native,
            display: Resolution {
                width: display_w,
                height: display_h,
            },
            processing: Resolution {
                width: proc_w,
                height: proc_h,
            },
        }
    }

    /// Map a display-space cursor position to a processing-grid sample.
    ///
    /// Positions outside the display rectangle map to `None`.
    pub fn display_to_processing(&self, x: f64, y: f64) -> Option<(f64, f64)> {
        let dw = f64::from(self.display.width);
        let dh = f64::from(self.display.height);
        if !(0.0..=dw).contains(&x) || !(0.0..=dh).contains(&y) {
            return None;
        }
        let px = (x / dw * f64::from(self.processing.width)).floor();
        let py = (y / dh * f64::from(self.processing.height)).floor();
        Some((px, py))
    }

    /// Brush radius in processing pixels for a display-space brush diameter.
    pub fn brush_radius(&self, brush_size: f32) -> f64 {
        let scale = f64::from(self.processing.width) / f64::from(self.display.width);
        f64::from(brush_size) * scale * 0.5
    }
}

fn round_dim(v: f64) -> u32 {
    if !v.is_finite() || v < 1.0 {
        1
    } else {
        v.round() as u32
    }
}

#[cfg(test)]
#[path = "../../tests/unit/config/layout.rs"]
mod tests;
