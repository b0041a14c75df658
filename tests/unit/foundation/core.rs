use super::*;

#[test]
fn frame_range_contains_boundaries() {
    let r = FrameRange::new(FrameIndex(2), FrameIndex(5)).unwrap();
    assert!(!r.contains(FrameIndex(1)));
    assert!(r.contains(FrameIndex(2)));
    assert!(r.contains(FrameIndex(4)));
    assert!(!r.contains(FrameIndex(5)));
}

#[test]
fn frame_range_rejects_inverted_bounds() {
    assert!(FrameRange::new(FrameIndex(5), FrameIndex(2)).is_err());
    let r = FrameRange::with_len(60, 330);
    assert_eq!(r.end, FrameIndex(390));
    assert_eq!(r.len_frames(), 330);
}

#[test]
fn fps_millis_to_frames_matches_integral_rates() {
    let fps = Fps::integral(30).unwrap();
    assert_eq!(fps.millis_to_frames_floor(2000), 60);
    assert_eq!(fps.millis_to_frames_floor(500), 15);
    assert_eq!(fps.millis_to_frames_floor(10_000), 300);

    let fps = Fps::integral(25).unwrap();
    assert_eq!(fps.millis_to_frames_floor(500), 12);
}

#[test]
fn fps_millis_to_frames_handles_ntsc() {
    let fps = Fps::new(30000, 1001).unwrap();
    assert_eq!(fps.millis_to_frames_floor(10_000), 299);
}

#[test]
fn fps_secs_to_frames_rounds_up() {
    let fps = Fps::integral(30).unwrap();
    assert_eq!(fps.secs_to_frames_ceil(5.0), 150);
    assert_eq!(fps.secs_to_frames_ceil(5.01), 151);
    assert_eq!(fps.secs_to_frames_ceil(-1.0), 0);
}

#[test]
fn fps_rejects_zero() {
    assert!(Fps::new(0, 1).is_err());
    assert!(Fps::new(30, 0).is_err());
    assert_eq!(Fps::new(30000, 1001).unwrap().to_string(), "30000/1001");
    assert_eq!(Fps::integral(30).unwrap().to_string(), "30");
}

#[test]
fn canvas_reference_scale() {
    assert!(Canvas::new(0, 10).is_err());
    let c = Canvas::new(1280, 720).unwrap();
    assert!((c.reference_scale() - (720.0 / 1080.0)).abs() < 1e-9);
}
