use super::*;

fn ms(v: u64) -> Duration {
    Duration::from_millis(v)
}

#[test]
fn first_poll_fires_immediately_even_at_zero() {
    let mut l = CaptureLimiter::new(ms(40));
    assert!(l.poll(ms(0)));
    assert_eq!(l.last_capture(), Some(ms(0)));
}

#[test]
fn early_ticks_are_skipped() {
    let mut l = CaptureLimiter::new(ms(40));
    assert!(l.poll(ms(100)));
    assert!(!l.poll(ms(110)));
    assert!(!l.poll(ms(139)));
    assert!(l.poll(ms(140)));
}

#[test]
fn late_tick_grants_a_single_capture() {
    let mut l = CaptureLimiter::new(ms(40));
    assert!(l.poll(ms(0)));
    assert!(l.poll(ms(1000)));
    assert!(!l.poll(ms(1000)));
    assert!(!l.poll(ms(1039)));
}

#[test]
fn backwards_time_never_fires() {
    let mut l = CaptureLimiter::new(ms(40));
    assert!(l.poll(ms(500)));
    assert!(!l.poll(ms(10)));
}

#[test]
fn reset_rearms_the_gate() {
    let mut l = CaptureLimiter::new(ms(40));
    assert!(l.poll(ms(5)));
    l.reset();
    assert!(l.poll(ms(6)));
}

#[test]
fn captures_in_any_window_are_bounded_by_rate() {
    // Irregular tick stream, roughly 3 ms apart with jitter.
    let interval = Duration::from_nanos(1_000_000_000u64 / 24);
    let mut l = CaptureLimiter::new(interval);
    let mut t = 0u64;
    let mut fired = Vec::new();
    for i in 0..5000u64 {
        t += 1 + (i * 7919) % 6;
        if l.poll(ms(t)) {
            fired.push(t);
        }
    }
    assert!(fired.len() > 10);

    let window_ms = 250u64;
    let bound = ((window_ms as f64 / 1000.0) * 24.0).ceil() as usize + 1;
    for (i, &start) in fired.iter().enumerate() {
        let count = fired[i..]
            .iter()
            .take_while(|&&f| f < start + window_ms)
            .count();
        assert!(count <= bound, "{count} captures in {window_ms}ms window");
    }
}
