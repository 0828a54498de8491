use super::*;

#[test]
fn fps_rejects_zero_parts() {
    assert!(Fps::new(0, 1).is_err());
    assert!(Fps::new(30, 0).is_err());
    assert!(Fps::new(30, 1).is_ok());
}

#[test]
fn fps_ceil_covers_partial_frames() {
    let fps = Fps::new(30, 1).unwrap();
    assert_eq!(fps.secs_to_frames_ceil(1.0), 30);
    assert_eq!(fps.secs_to_frames_ceil(1.01), 31);
    assert_eq!(fps.secs_to_frames_ceil(0.0), 0);
}

#[test]
fn fps_ntsc_frame_duration() {
    let fps = Fps::new(30000, 1001).unwrap();
    assert!((fps.frame_duration_secs() - 1001.0 / 30000.0).abs() < 1e-12);
    assert!((fps.frames_to_secs(30000) - 1001.0).abs() < 1e-9);
}

#[test]
fn canvas_validation_and_len() {
    assert!(Canvas::new(0, 4).is_err());
    assert!(Canvas::new(4, 0).is_err());
    let c = Canvas::new(4, 3).unwrap();
    assert_eq!(c.rgba_len(), 48);
}
