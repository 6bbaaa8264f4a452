use super::*;

#[test]
fn first_poll_renders() {
    let mut c = FrameClock::new(30);
    assert_eq!(c.poll(5.0), Some(0));
}

#[test]
fn ticks_inside_interval_are_skipped() {
    let mut c = FrameClock::new(10);
    c.poll(0.0);
    assert_eq!(c.poll(50.0), None);
    assert_eq!(c.poll(99.9), None);
    assert_eq!(c.poll(100.0), Some(0));
}

#[test]
fn remainder_is_carried() {
    let mut c = FrameClock::new(10);
    c.poll(0.0);
    assert_eq!(c.poll(130.0), Some(0));
    // committed at 100, so 200 is due again
    assert_eq!(c.poll(200.0), Some(0));
}

#[test]
fn late_ticks_count_dropped_slots() {
    let mut c = FrameClock::new(10);
    c.poll(0.0);
    assert_eq!(c.poll(350.0), Some(2));
}

#[test]
fn fps_window_resets_each_second() {
    let mut f = FpsCounter::default();
    for i in 0..30 {
        f.frame(f64::from(i) * (1000.0 / 30.0));
    }
    assert_eq!(f.fps(), 0);
    assert_eq!(f.frame(1000.0), 31);
    assert_eq!(f.frame(1010.0), 31);
}

#[test]
fn average_render_time_is_running_mean() {
    let mut s = RenderStats::default();
    s.record_frame(2.0, 0, 0);
    s.record_frame(4.0, 1, 2);
    assert_eq!(s.total_frames, 2);
    assert_eq!(s.dropped_frames, 1);
    assert_eq!(s.skipped_sources, 2);
    assert!((s.average_render_ms - 3.0).abs() < 1e-9);
}
