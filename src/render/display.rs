use image::{RgbaImage, imageops::FilterType};

use crate::field::control::ControlField;
use crate::foundation::core::{Resolution, check_rgba_len};
use crate::foundation::error::{PhasewarpError, PhasewarpResult};
use crate::foundation::math::mul_div255_u8;
use crate::render::output::OutputImage;

/// Overlay opacity while frames are being captured.
pub const CAPTURE_OVERLAY_ALPHA: u8 = 120;
/// Overlay opacity during playback.
pub const PLAYBACK_OVERLAY_ALPHA: u8 = 90;

/// What the host should present underneath the optional control-field overlay.
#[derive(Clone, Copy, Debug)]
pub enum DisplayBase<'a> {
    /// The control field itself, fully opaque.
    ControlField,
    /// Most recent frame sampled from the source (RGBA8, processing size).
    Preview(&'a [u8]),
    /// Composited playback output.
    Output(&'a OutputImage),
}

/// Premultiplied source-over for one pixel.
pub fn over(dst: [u8; 4], src: [u8; 4], opacity: f32) -> [u8; 4] {
    let opacity = opacity.clamp(0.0, 1.0);
    if opacity <= 0.0 || src[3] == 0 {
        return dst;
    }

    let op = ((opacity * 255.0).round() as i32).clamp(0, 255) as u16;
    let sa = mul_div255_u8(u16::from(src[3]), op);
    if sa == 0 {
        return dst;
    }

    let inv = 255u16 - u16::from(sa);

    let mut out = [0u8; 4];
    out[3] = sa.saturating_add(mul_div255_u8(u16::from(dst[3]), inv));
    for i in 0..3 {
        let sc = mul_div255_u8(u16::from(src[i]), op);
        let dc = mul_div255_u8(u16::from(dst[i]), inv);
        out[i] = sc.saturating_add(dc);
    }
    out
}

/// Draw `control` over `dst` as translucent gray.
pub fn overlay_control_in_place(
    dst: &mut [u8],
    control: &ControlField,
    alpha: u8,
) -> PhasewarpResult<()> {
    check_rgba_len(dst, control.resolution(), "overlay target")?;
    let a = u16::from(alpha);
    for (d, &g) in dst.chunks_exact_mut(4).zip(control.samples()) {
        let pg = mul_div255_u8(u16::from(g), a);
        let out = over([d[0], d[1], d[2], d[3]], [pg, pg, pg, alpha], 1.0);
        d.copy_from_slice(&out);
    }
    Ok(())
}

/// Build the frame to present at processing resolution.
///
/// The base is made opaque; when `overlay_alpha` is set the control field is drawn on top.
pub fn compose_display(
    control: &ControlField,
    base: DisplayBase<'_>,
    overlay_alpha: Option<u8>,
) -> PhasewarpResult<OutputImage> {
    let res = control.resolution();
    let mut data = match base {
        DisplayBase::ControlField => return OutputImage::from_rgba8(res, control.to_rgba8()),
        DisplayBase::Preview(px) => {
            check_rgba_len(px, res, "preview frame")?;
            px.to_vec()
        }
        DisplayBase::Output(img) => {
            if img.resolution() != res {
                return Err(PhasewarpError::evaluation(format!(
                    "output {} does not match control field {res}",
                    img.resolution()
                )));
            }
            img.pixels().to_vec()
        }
    };
    for px in data.chunks_exact_mut(4) {
        px[3] = 255;
    }
    if let Some(alpha) = overlay_alpha {
        overlay_control_in_place(&mut data, control, alpha)?;
    }
    OutputImage::from_rgba8(res, data)
}

/// Nearest-neighbour upscale of a processing-size frame to the display size.
pub fn upscale_to_display(img: &OutputImage, display: Resolution) -> PhasewarpResult<OutputImage> {
    if img.resolution() == display {
        return Ok(img.clone());
    }
    let src: RgbaImage = img.to_rgba_image()?;
    let scaled = image::imageops::resize(&src, display.width, display.height, FilterType::Nearest);
    OutputImage::from_rgba8(display, scaled.into_raw())
}

#[cfg(test)]
#[path = "../../tests/unit/render/display.rs"]
mod tests;
