use super::*;

fn res(width: u32, height: u32) -> Resolution {
    Resolution { width, height }
}

#[test]
fn hd_source_is_capped_by_display_width() {
    let l = Layout::derive(Some(res(1280, 720)), 900);
    assert_eq!(l.display, res(900, 506));
    assert_eq!(l.processing, res(257, 145));
}

#[test]
fn small_source_hits_processing_floor() {
    let l = Layout::derive(Some(res(320, 240)), 900);
    assert_eq!(l.display, res(320, 240));
    assert_eq!(l.processing, res(180, 135));
}

#[test]
fn wide_display_hits_processing_ceiling() {
    let l = Layout::derive(Some(res(3840, 2160)), 2000);
    assert_eq!(l.display.width, 2000);
    assert_eq!(l.processing.width, 360);
}

#[test]
fn unknown_native_size_falls_back_to_720p() {
    let l = Layout::derive(None, 900);
    assert_eq!(l.native, FALLBACK_NATIVE);
    assert_eq!(l.display.width, 900);
}

#[test]
fn cursor_mapping_floors_and_rejects_outside() {
    let l = Layout::derive(Some(res(1280, 720)), 900);
    assert_eq!(l.display_to_processing(0.0, 0.0), Some((0.0, 0.0)));
    let (x, y) = l.display_to_processing(450.0, 253.0).unwrap();
    assert_eq!(x, (450.0 / 900.0 * 257.0f64).floor());
    assert_eq!(y, (253.0 / 506.0 * 145.0f64).floor());
    assert_eq!(l.display_to_processing(-1.0, 10.0), None);
    assert_eq!(l.display_to_processing(10.0, 507.0), None);
}

#[test]
fn brush_radius_is_half_the_scaled_diameter() {
    let l = Layout::derive(Some(res(900, 900)), 900);
    let scale = f64::from(l.processing.width) / 900.0;
    assert!((l.brush_radius(32.0) - 16.0 * scale).abs() < 1e-9);
}
