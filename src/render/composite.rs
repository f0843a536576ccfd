use rayon::prelude::*;

use crate::capture::ring::FrameRing;
use crate::engine::phase::{EngineThreading, PhaseField, sample_phase};
use crate::foundation::error::{PhasewarpError, PhasewarpResult};
use crate::foundation::math::round_clamp_u8;
use crate::render::output::OutputImage;

/// Blend `a` toward `b` by `t` per colour channel; alpha is forced opaque.
///
/// `t = 0` reproduces `a` and `t = 1` reproduces `b` exactly. Results are rounded and clamped.
pub fn lerp_px(a: [u8; 4], b: [u8; 4], t: f32) -> [u8; 4] {
    let mut out = [0u8, 0, 0, 255];
    for i in 0..3 {
        let av = f32::from(a[i]);
        let bv = f32::from(b[i]);
        out[i] = round_clamp_u8(av + (bv - av) * t);
    }
    out
}

/// Blend two whole frames with a uniform `t`, overwriting `dst`.
pub fn lerp_in_place(dst: &mut [u8], a: &[u8], b: &[u8], t: f32) -> PhasewarpResult<()> {
    if dst.len() != a.len() || dst.len() != b.len() || !dst.len().is_multiple_of(4) {
        return Err(PhasewarpError::evaluation(
            "lerp_in_place expects equal-length rgba8 buffers",
        ));
    }
    for ((d, a), b) in dst
        .chunks_exact_mut(4)
        .zip(a.chunks_exact(4))
        .zip(b.chunks_exact(4))
    {
        let out = lerp_px([a[0], a[1], a[2], a[3]], [b[0], b[1], b[2], b[3]], t);
        d.copy_from_slice(&out);
    }
    Ok(())
}

fn composite_range(dst: &mut [u8], first_px: usize, ring: &FrameRing, phases: &[f32]) {
    let frames = ring.frames();
    let n = frames.len();
    for (k, d) in dst.chunks_exact_mut(4).enumerate() {
        let idx = first_px + k;
        let s = sample_phase(phases[idx], n);
        let off = idx * 4;
        let a = &frames[s.frame_a].pixels()[off..off + 4];
        let b = &frames[s.frame_b].pixels()[off..off + 4];
        let out = lerp_px([a[0], a[1], a[2], a[3]], [b[0], b[1], b[2], b[3]], s.t);
        d.copy_from_slice(&out);
    }
}

/// Write every output pixel from its own frame pair in `ring`, chosen by its phase.
pub fn composite_phase_field(
    out: &mut OutputImage,
    ring: &FrameRing,
    phases: &PhaseField,
    threading: EngineThreading,
) -> PhasewarpResult<()> {
    let res = out.resolution();
    if ring.resolution() != res || phases.resolution() != res {
        return Err(PhasewarpError::evaluation(format!(
            "composite size mismatch: output {res}, ring {}, phases {}",
            ring.resolution(),
            phases.resolution()
        )));
    }
    if ring.filled() == 0 {
        return Err(PhasewarpError::evaluation(
            "cannot composite from an empty frame ring",
        ));
    }

    let phases = phases.phases();
    let dst = out.pixels_mut();
    if threading.parallel {
        let chunk = threading.chunk_pixels.max(1);
        dst.par_chunks_mut(chunk * 4)
            .enumerate()
            .for_each(|(ci, d)| composite_range(d, ci * chunk, ring, phases));
    } else {
        composite_range(dst, 0, ring, phases);
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/render/composite.rs"]
mod tests;
