use rayon::prelude::*;

use crate::field::control::{ControlField, to_speed};
use crate::foundation::core::Resolution;
use crate::foundation::error::{PhasewarpError, PhasewarpResult};

/// Wrap `x` into `[0, frame_count)`.
///
/// Works for negative and multi-cycle inputs. Non-finite inputs and `frame_count == 0` wrap to 0.
pub fn wrap_phase(x: f32, frame_count: usize) -> f32 {
    if frame_count == 0 || !x.is_finite() {
        return 0.0;
    }
    let f = frame_count as f32;
    let r = ((x % f) + f) % f;
    // f32 rounding can land exactly on `f`.
    if (0.0..f).contains(&r) { r } else { 0.0 }
}

/// Interpolation pair for one pixel: blend `frame_a` toward `frame_b` by `t`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameSample {
    /// Lower frame index.
    pub frame_a: usize,
    /// Next frame index, wrapping to 0 after the last frame.
    pub frame_b: usize,
    /// Fractional position between the two, in `[0, 1)`.
    pub t: f32,
}

/// Split a wrapped phase into its frame pair and fraction.
pub fn sample_phase(phase: f32, frame_count: usize) -> FrameSample {
    if frame_count == 0 {
        return FrameSample {
            frame_a: 0,
            frame_b: 0,
            t: 0.0,
        };
    }
    let base = phase.floor();
    let frame_a = (base.max(0.0) as usize) % frame_count;
    FrameSample {
        frame_a,
        frame_b: (frame_a + 1) % frame_count,
        t: (phase - base).clamp(0.0, 1.0 - f32::EPSILON),
    }
}

/// How [`advance_phases_with`] splits the pixel range.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct EngineThreading {
    /// Shard pixels across the rayon pool.
    pub parallel: bool,
    /// Pixels per shard in parallel mode.
    pub chunk_pixels: usize,
}

impl Default for EngineThreading {
    fn default() -> Self {
        Self {
            parallel: false,
            chunk_pixels: 4096,
        }
    }
}

fn speed_lut(speed_scale: f32) -> [f32; 256] {
    let mut lut = [0.0f32; 256];
    for (g, v) in lut.iter_mut().enumerate() {
        *v = to_speed(g as u8) * speed_scale;
    }
    lut
}

fn advance_slice(phases: &mut [f32], control: &[u8], lut: &[f32; 256], frame_count: usize) {
    for (p, &g) in phases.iter_mut().zip(control) {
        *p = wrap_phase(*p + lut[usize::from(g)], frame_count);
    }
}

/// Advance every phase by its control-derived speed and wrap into `[0, frame_count)`.
///
/// Pixels are independent; the sequential and parallel paths produce identical results.
pub fn advance_phases_with(
    phases: &mut [f32],
    control: &[u8],
    speed_scale: f32,
    frame_count: usize,
    threading: EngineThreading,
) -> PhasewarpResult<()> {
    if phases.len() != control.len() {
        return Err(PhasewarpError::evaluation(format!(
            "phase field has {} pixels but control field has {}",
            phases.len(),
            control.len()
        )));
    }
    if frame_count == 0 {
        return Err(PhasewarpError::evaluation(
            "cannot advance phases over an empty frame ring",
        ));
    }
    let scale = if speed_scale.is_finite() {
        speed_scale
    } else {
        0.0
    };
    let lut = speed_lut(scale);

    if threading.parallel {
        let chunk = threading.chunk_pixels.max(1);
        phases
            .par_chunks_mut(chunk)
            .zip(control.par_chunks(chunk))
            .for_each(|(p, c)| advance_slice(p, c, &lut, frame_count));
    } else {
        advance_slice(phases, control, &lut, frame_count);
    }
    Ok(())
}

/// Sequential [`advance_phases_with`].
pub fn advance_phases(
    phases: &mut [f32],
    control: &[u8],
    speed_scale: f32,
    frame_count: usize,
) -> PhasewarpResult<()> {
    advance_phases_with(
        phases,
        control,
        speed_scale,
        frame_count,
        EngineThreading::default(),
    )
}

/// One phase accumulator per processing pixel.
#[derive(Clone, Debug, PartialEq)]
pub struct PhaseField {
    res: Resolution,
    phases: Vec<f32>,
}

impl PhaseField {
    /// All-zero phases for `res`.
    pub fn new(res: Resolution) -> Self {
        Self {
            res,
            phases: vec![0.0; res.pixel_count()],
        }
    }

    /// Grid size.
    pub fn resolution(&self) -> Resolution {
        self.res
    }

    /// Row-major phases.
    pub fn phases(&self) -> &[f32] {
        &self.phases
    }

    /// Zero every accumulator.
    pub fn reset(&mut self) {
        self.phases.fill(0.0);
    }

    /// Advance by one playback tick.
    pub fn advance(
        &mut self,
        control: &ControlField,
        speed_scale: f32,
        frame_count: usize,
        threading: EngineThreading,
    ) -> PhasewarpResult<()> {
        if control.resolution() != self.res {
            return Err(PhasewarpError::evaluation(format!(
                "control field {} does not match phase field {}",
                control.resolution(),
                self.res
            )));
        }
        advance_phases_with(
            &mut self.phases,
            control.samples(),
            speed_scale,
            frame_count,
            threading,
        )
    }

    /// Interpolation pair for pixel `idx`.
    pub fn sample(&self, idx: usize, frame_count: usize) -> Option<FrameSample> {
        self.phases
            .get(idx)
            .map(|&p| sample_phase(p, frame_count))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/engine/phase.rs"]
mod tests;
