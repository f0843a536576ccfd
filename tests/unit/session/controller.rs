use super::*;
use crate::capture::source::MemoryVideoSource;
use image::{Rgba, RgbaImage};

fn solid_frames(n: usize, w: u32, h: u32) -> Vec<RgbaImage> {
    (0..n)
        .map(|i| RgbaImage::from_pixel(w, h, Rgba([(i * 10) as u8, 0, 0, 255])))
        .collect()
}

fn source(n: usize) -> Box<dyn VideoSource> {
    Box::new(MemoryVideoSource::new(solid_frames(n, 4, 2)).unwrap())
}

fn short_config() -> SessionConfig {
    SessionConfig {
        capture_fps: 10,
        sample_window_seconds: 0.4,
        ..SessionConfig::default()
    }
}

fn ms(v: u64) -> Duration {
    Duration::from_millis(v)
}

fn run_capture(s: &mut Session) {
    let mut t = 0;
    while s.mode() == SessionMode::Capturing && t < 10_000 {
        s.tick(ms(t));
        t += 100;
    }
}

#[test]
fn new_session_is_painting_without_buffers() {
    let s = Session::new(SessionConfig::default()).unwrap();
    assert_eq!(s.mode(), SessionMode::Painting);
    assert!(s.layout().is_none());
    assert!(s.display_frame().unwrap().is_none());
    assert_eq!(s.status().captured, 0);
    assert_eq!(s.status().target, 240);
}

#[test]
fn new_session_rejects_invalid_config() {
    let cfg = SessionConfig {
        capture_fps: 0,
        ..SessionConfig::default()
    };
    assert!(Session::new(cfg).is_err());
}

#[test]
fn play_without_source_is_a_noop() {
    let mut s = Session::new(SessionConfig::default()).unwrap();
    assert!(!s.play());
    assert_eq!(s.mode(), SessionMode::Painting);
    assert_eq!(s.transitions().count(), 0);
}

#[test]
fn load_video_builds_buffers_and_preview() {
    let mut s = Session::new(SessionConfig::default()).unwrap();
    s.load_video(source(3));
    let layout = s.layout().unwrap();
    assert_eq!(layout.native, Resolution { width: 4, height: 2 });
    assert_eq!(layout.processing, Resolution { width: 180, height: 90 });
    assert_eq!(s.frame_ring().unwrap().capacity(), 240);
    assert_eq!(
        s.preview().unwrap().len(),
        layout.processing.rgba_len()
    );
    assert!(!s.source().unwrap().is_playing());
    assert!(
        s.control_field()
            .unwrap()
            .samples()
            .iter()
            .all(|&g| g == 128)
    );
}

#[test]
fn load_video_resets_field_and_forces_painting() {
    let mut s = Session::new(short_config()).unwrap();
    s.load_video(source(10));
    s.apply_template(TemplateKind::LeftToRight);
    assert!(s.play());
    run_capture(&mut s);
    assert_eq!(s.mode(), SessionMode::Playing);

    s.load_video(source(10));
    assert_eq!(s.mode(), SessionMode::Painting);
    assert_eq!(s.frame_ring().unwrap().filled(), 0);
    assert!(
        s.control_field()
            .unwrap()
            .samples()
            .iter()
            .all(|&g| g == 128)
    );
    let last = s.transitions().last().copied().unwrap();
    assert_eq!(last.reason, TransitionReason::SourceLoaded);
}

#[test]
fn painting_is_gated_to_painting_mode() {
    let mut s = Session::new(short_config()).unwrap();
    assert!(!s.paint_stroke(10.0, 10.0, 5.0, 255));

    s.load_video(source(10));
    assert!(s.paint_stroke(10.0, 10.0, 5.0, 255));
    assert_eq!(s.control_field().unwrap().get(10, 10), Some(255));

    s.play();
    assert_eq!(s.mode(), SessionMode::Capturing);
    assert!(!s.paint_stroke(50.0, 50.0, 5.0, 0));
    assert_eq!(s.control_field().unwrap().get(50, 50), Some(128));
}

#[test]
fn clear_and_template_work_in_any_mode() {
    let mut s = Session::new(short_config()).unwrap();
    s.load_video(source(10));
    s.play();
    s.apply_template(TemplateKind::RightToLeft);
    let field = s.control_field().unwrap();
    assert_eq!(field.get(0, 0), Some(0));
    assert_eq!(field.get(179, 0), Some(255));
    s.clear_map();
    assert!(
        s.control_field()
            .unwrap()
            .samples()
            .iter()
            .all(|&g| g == 128)
    );
}

#[test]
fn paint_at_display_maps_cursor_and_ignores_outside() {
    let mut s = Session::new(SessionConfig {
        gray_value: 0,
        brush_size: 8.0,
        ..SessionConfig::default()
    })
    .unwrap();
    s.load_video(Box::new(
        MemoryVideoSource::new(solid_frames(2, 360, 180)).unwrap(),
    ));
    let layout = s.layout().unwrap();
    assert_eq!(layout.display.width, 360);
    assert_eq!(layout.processing.width, 180);

    assert!(s.paint_at_display(100.0, 50.0));
    assert_eq!(s.control_field().unwrap().get(50, 25), Some(0));

    assert!(!s.paint_at_display(-1.0, 10.0));
    assert!(!s.paint_at_display(10.0, 500.0));
}

#[test]
fn capture_fills_ring_then_plays() {
    let mut s = Session::new(short_config()).unwrap();
    s.load_video(source(10));
    assert!(s.play());
    assert!(s.source().unwrap().is_playing());

    let first = s.tick(ms(0));
    assert_eq!(first.captured_slot, Some(0));
    let early = s.tick(ms(50));
    assert_eq!(early.captured_slot, None);

    let mut t = 100;
    let mut last = early;
    while s.mode() == SessionMode::Capturing {
        last = s.tick(ms(t));
        t += 100;
    }
    assert_eq!(s.mode(), SessionMode::Playing);
    assert_eq!(s.frame_ring().unwrap().filled(), 4);
    let tr = last.transition.unwrap();
    assert_eq!(tr.from, SessionMode::Capturing);
    assert_eq!(tr.to, SessionMode::Playing);
    assert_eq!(tr.reason, TransitionReason::CaptureComplete);
    assert!(!s.source().unwrap().is_playing());

    let r = s.tick(ms(t));
    assert!(r.advanced);
    assert_eq!(r.transition, None);
}

#[test]
fn end_capture_plays_partial_ring_or_falls_back() {
    let mut s = Session::new(short_config()).unwrap();
    s.load_video(source(10));
    s.play();
    s.tick(ms(0));
    s.tick(ms(100));
    let tr = s.end_capture().unwrap();
    assert_eq!(tr.to, SessionMode::Playing);
    assert_eq!(s.frame_ring().unwrap().filled(), 2);
    assert!(s.end_capture().is_none());

    s.play();
    s.tick(ms(1_000));
    let tr = s.end_capture().unwrap();
    assert_eq!(tr.to, SessionMode::Painting);
    assert_eq!(tr.reason, TransitionReason::InsufficientFrames);
}

#[test]
fn play_while_playing_restarts_capture_from_slot_zero() {
    let mut s = Session::new(short_config()).unwrap();
    s.load_video(source(10));
    s.play();
    run_capture(&mut s);
    assert_eq!(s.mode(), SessionMode::Playing);

    assert!(s.play());
    assert_eq!(s.mode(), SessionMode::Capturing);
    assert_eq!(s.frame_ring().unwrap().filled(), 0);
    assert!(s.phase_field().unwrap().phases().iter().all(|&p| p == 0.0));

    let modes: Vec<_> = s.transitions().map(|t| (t.from, t.to)).collect();
    assert_eq!(
        &modes[modes.len() - 2..],
        &[
            (SessionMode::Playing, SessionMode::Painting),
            (SessionMode::Painting, SessionMode::Capturing),
        ]
    );
}

#[test]
fn stop_returns_to_painting_and_pauses() {
    let mut s = Session::new(short_config()).unwrap();
    s.load_video(source(10));
    s.play();
    s.tick(ms(0));
    s.stop();
    assert_eq!(s.mode(), SessionMode::Painting);
    assert!(!s.source().unwrap().is_playing());
    let r = s.tick(ms(5_000));
    assert_eq!(r.captured_slot, None);
    assert!(!r.advanced);
}

#[test]
fn update_config_reallocates_on_target_change_while_painting() {
    let mut s = Session::new(short_config()).unwrap();
    s.load_video(source(10));
    s.paint_stroke(20.0, 20.0, 4.0, 200);

    s.update_config(SessionConfig {
        sample_window_seconds: 0.8,
        ..short_config()
    })
    .unwrap();
    assert_eq!(s.frame_ring().unwrap().capacity(), 8);
    assert_eq!(s.control_field().unwrap().get(20, 20), Some(200));
    assert_eq!(s.mode(), SessionMode::Painting);
}

#[test]
fn update_config_restarts_running_capture() {
    let mut s = Session::new(short_config()).unwrap();
    s.load_video(source(10));
    s.play();
    s.tick(ms(0));
    s.tick(ms(100));
    assert_eq!(s.frame_ring().unwrap().filled(), 2);

    s.update_config(SessionConfig {
        sample_window_seconds: 0.6,
        ..short_config()
    })
    .unwrap();
    assert_eq!(s.mode(), SessionMode::Capturing);
    assert_eq!(s.frame_ring().unwrap().filled(), 0);
    assert_eq!(s.frame_ring().unwrap().capacity(), 6);
    assert_eq!(s.tick(ms(200)).captured_slot, Some(0));
}

#[test]
fn update_config_during_playback_falls_back_to_painting() {
    let mut s = Session::new(short_config()).unwrap();
    s.load_video(source(10));
    s.play();
    run_capture(&mut s);
    assert_eq!(s.mode(), SessionMode::Playing);

    s.update_config(SessionConfig {
        sample_window_seconds: 1.0,
        ..short_config()
    })
    .unwrap();
    assert_eq!(s.mode(), SessionMode::Painting);
    let last = s.transitions().last().copied().unwrap();
    assert_eq!(last.reason, TransitionReason::Reconfigured);
}

#[test]
fn update_config_without_realloc_keeps_playing() {
    let mut s = Session::new(short_config()).unwrap();
    s.load_video(source(10));
    s.play();
    run_capture(&mut s);

    s.update_config(SessionConfig {
        speed_scale: 2.0,
        ..short_config()
    })
    .unwrap();
    assert_eq!(s.mode(), SessionMode::Playing);
    assert_eq!(s.config().speed_scale, 2.0);
}

#[test]
fn update_config_rejects_invalid_snapshot() {
    let mut s = Session::new(short_config()).unwrap();
    let bad = SessionConfig {
        speed_scale: f32::NAN,
        ..short_config()
    };
    assert!(s.update_config(bad).is_err());
    assert_eq!(s.config(), &short_config());
}

#[test]
fn display_frame_follows_mode() {
    let mut s = Session::new(short_config()).unwrap();
    s.load_video(source(10));
    s.paint_stroke(0.0, 0.0, 3.0, 255);

    let painting = s.display_frame().unwrap().unwrap();
    assert_eq!(painting.pixel(0, 0), Some([255, 255, 255, 255]));
    assert_eq!(painting.pixel(100, 50), Some([128, 128, 128, 255]));

    s.set_show_overlay(false);
    s.play();
    s.tick(ms(0));
    let capturing = s.display_frame().unwrap().unwrap();
    assert_eq!(capturing.pixel(100, 50), Some([0, 0, 0, 255]));

    run_capture(&mut s);
    s.tick(ms(20_000));
    let playing = s.display_frame().unwrap().unwrap();
    assert_eq!(playing.resolution(), s.layout().unwrap().processing);
    assert_eq!(playing.pixel(100, 50), s.output().unwrap().pixel(100, 50));
}

#[test]
fn overlay_toggle_flips_flag() {
    let mut s = Session::new(SessionConfig::default()).unwrap();
    assert!(s.status().show_overlay);
    assert!(!s.toggle_overlay());
    assert!(!s.status().show_overlay);
    assert!(s.toggle_overlay());
}

#[test]
fn status_serializes_mode_and_counts() {
    let mut s = Session::new(short_config()).unwrap();
    s.load_video(source(10));
    s.play();
    s.tick(ms(0));
    let v = serde_json::to_value(s.status()).unwrap();
    assert_eq!(v["mode"], "CAPTURING");
    assert_eq!(v["captured"], 1);
    assert_eq!(v["target"], 4);
    assert_eq!(v["processing"]["width"], 180);
}

#[test]
fn display_width_change_during_capture_applies_once_capture_ends() {
    let mut s = Session::new(short_config()).unwrap();
    s.load_video(Box::new(
        MemoryVideoSource::new(solid_frames(4, 800, 450)).unwrap(),
    ));
    assert_eq!(s.layout().unwrap().display.width, 800);

    s.play();
    s.tick(ms(0));
    s.update_config(SessionConfig {
        max_display_width: 400,
        ..short_config()
    })
    .unwrap();
    assert_eq!(s.mode(), SessionMode::Capturing);
    assert_eq!(s.layout().unwrap().display.width, 800);
    assert_eq!(s.frame_ring().unwrap().filled(), 1);

    run_capture(&mut s);
    assert_eq!(s.mode(), SessionMode::Playing);

    let r = s.tick(ms(20_000));
    assert_eq!(
        r.transition.map(|t| t.reason),
        Some(TransitionReason::Reconfigured)
    );
    let layout = s.layout().unwrap();
    assert_eq!(
        layout.display,
        Resolution {
            width: 400,
            height: 225
        }
    );
    assert_eq!(s.control_field().unwrap().resolution(), layout.processing);
    assert_eq!(s.frame_ring().unwrap().resolution(), layout.processing);
}

/// Source whose viewer-facing playhead keeps moving between captures.
struct LiveSource {
    captured: u8,
    live: u8,
    playing: bool,
}

impl VideoSource for LiveSource {
    fn native_size(&self) -> Option<Resolution> {
        Some(Resolution {
            width: 4,
            height: 2,
        })
    }

    fn play(&mut self) {
        self.playing = true;
    }

    fn pause(&mut self) {
        self.playing = false;
    }

    fn is_playing(&self) -> bool {
        self.playing
    }

    fn seek_to_start(&mut self) {
        self.captured = 0;
    }

    fn sample_rgba8(&mut self, res: Resolution) -> PhasewarpResult<Option<Vec<u8>>> {
        self.captured += 1;
        Ok(Some([self.captured, 0, 0, 255].repeat(res.pixel_count())))
    }

    fn peek_rgba8(&mut self, res: Resolution) -> PhasewarpResult<Option<Vec<u8>>> {
        self.live += 1;
        Ok(Some([0, self.live, 0, 255].repeat(res.pixel_count())))
    }
}

#[test]
fn preview_stays_live_between_captures() {
    let mut s = Session::new(short_config()).unwrap();
    s.set_show_overlay(false);
    s.load_video(Box::new(LiveSource {
        captured: 0,
        live: 0,
        playing: false,
    }));
    s.play();

    assert_eq!(s.tick(ms(0)).captured_slot, Some(0));
    let after_capture = s.display_frame().unwrap().unwrap().pixel(0, 0);
    assert_eq!(after_capture, Some([1, 0, 0, 255]));

    assert_eq!(s.tick(ms(30)).captured_slot, None);
    assert_eq!(s.preview().unwrap()[..4], [0, 1, 0, 255]);
    assert_eq!(s.tick(ms(60)).captured_slot, None);
    assert_eq!(
        s.display_frame().unwrap().unwrap().pixel(0, 0),
        Some([0, 2, 0, 255])
    );
    assert_eq!(s.frame_ring().unwrap().filled(), 1);
}
