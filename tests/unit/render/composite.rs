use super::*;
use crate::field::control::ControlField;
use crate::foundation::core::Resolution;

fn res() -> Resolution {
    Resolution {
        width: 3,
        height: 2,
    }
}

fn solid(v: [u8; 4]) -> Vec<u8> {
    v.repeat(res().pixel_count())
}

#[test]
fn lerp_endpoints_reproduce_inputs() {
    let a = [10, 20, 30, 40];
    let b = [200, 5, 220, 0];
    assert_eq!(lerp_px(a, b, 0.0), [10, 20, 30, 255]);
    assert_eq!(lerp_px(a, b, 1.0), [200, 5, 220, 255]);
    assert_eq!(lerp_px(a, b, 0.5), [105, 13, 125, 255]);
}

#[test]
fn lerp_clamps_out_of_range_t() {
    assert_eq!(lerp_px([0, 255, 100, 0], [255, 0, 100, 0], 1.5), [255, 0, 100, 255]);
    assert_eq!(lerp_px([0, 255, 100, 0], [255, 0, 100, 0], -0.5), [0, 255, 100, 255]);
}

#[test]
fn lerp_in_place_checks_lengths_and_forces_opacity() {
    let a = vec![0u8, 0, 0, 0, 100, 100, 100, 100];
    let b = vec![255u8, 255, 255, 0, 100, 100, 100, 0];
    let mut dst = vec![1u8; 8];
    lerp_in_place(&mut dst, &a, &b, 1.0).unwrap();
    assert_eq!(dst, vec![255, 255, 255, 255, 100, 100, 100, 255]);
    assert!(lerp_in_place(&mut dst, &a[..4], &b, 0.0).is_err());
}

#[test]
fn phase_field_selects_per_pixel_pairs() {
    let mut ring = FrameRing::new(res(), 3);
    ring.push(solid([0, 0, 0, 255])).unwrap();
    ring.push(solid([100, 100, 100, 255])).unwrap();
    ring.push(solid([200, 200, 200, 255])).unwrap();

    let mut control = ControlField::new(res());
    // Only pixel (0, 0) moves, by half a frame per tick.
    control.paint_stroke(0.5, 0.5, 0.5, 255);
    let mut phases = PhaseField::new(res());
    phases
        .advance(&control, 0.5, 3, EngineThreading::default())
        .unwrap();

    let mut out = OutputImage::new(res());
    composite_phase_field(&mut out, &ring, &phases, EngineThreading::default()).unwrap();
    assert_eq!(out.pixel(0, 0), Some([50, 50, 50, 255]));
    assert_eq!(out.pixel(1, 0), Some([0, 0, 0, 255]));
    assert_eq!(out.pixel(2, 1), Some([0, 0, 0, 255]));
}

#[test]
fn last_frame_blends_back_into_the_first() {
    let mut ring = FrameRing::new(res(), 2);
    ring.push(solid([0, 0, 0, 255])).unwrap();
    ring.push(solid([200, 200, 200, 255])).unwrap();
    let mut control = ControlField::new(res());
    control.paint_stroke(1.5, 1.5, 10.0, 255);
    let mut phases = PhaseField::new(res());
    phases
        .advance(&control, 1.5, 2, EngineThreading::default())
        .unwrap();
    let mut out = OutputImage::new(res());
    composite_phase_field(&mut out, &ring, &phases, EngineThreading::default()).unwrap();
    // Phase 1.5: halfway from frame 1 back to frame 0.
    assert_eq!(out.pixel(1, 1), Some([100, 100, 100, 255]));
}

#[test]
fn parallel_composite_matches_sequential() {
    let res = Resolution {
        width: 37,
        height: 11,
    };
    let mut ring = FrameRing::new(res, 4);
    for k in 0..4u32 {
        let data: Vec<u8> = (0..res.rgba_len())
            .map(|i| ((i as u32 * 31 + k * 57) % 256) as u8)
            .collect();
        ring.push(data).unwrap();
    }
    let mut control = ControlField::new(res);
    control.apply_template(crate::field::template::TemplateKind::Center);
    let mut phases = PhaseField::new(res);
    for _ in 0..5 {
        phases
            .advance(&control, 0.7, 4, EngineThreading::default())
            .unwrap();
    }
    let mut seq = OutputImage::new(res);
    let mut par = OutputImage::new(res);
    composite_phase_field(&mut seq, &ring, &phases, EngineThreading::default()).unwrap();
    composite_phase_field(
        &mut par,
        &ring,
        &phases,
        EngineThreading {
            parallel: true,
            chunk_pixels: 50,
        },
    )
    .unwrap();
    assert_eq!(seq, par);
}

#[test]
fn size_mismatch_and_empty_ring_are_errors() {
    let phases = PhaseField::new(res());
    let mut out = OutputImage::new(res());
    let empty = FrameRing::new(res(), 2);
    assert!(composite_phase_field(&mut out, &empty, &phases, EngineThreading::default()).is_err());

    let other = FrameRing::new(
        Resolution {
            width: 1,
            height: 1,
        },
        2,
    );
    assert!(composite_phase_field(&mut out, &other, &phases, EngineThreading::default()).is_err());
}
