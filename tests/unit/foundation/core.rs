use super::*;

#[test]
fn fps_validation() {
    assert!(Fps::new(30, 1).is_ok());
    assert!(Fps::new(0, 1).is_err());
    assert!(Fps::new(30, 0).is_err());
}

#[test]
fn ceil_rounding_lands_on_frame_boundaries() {
    let fps = Fps::new(30, 1).unwrap();
    assert_eq!(fps.secs_to_frames_ceil(3.0), 90);
    assert_eq!(fps.secs_to_frames_ceil(0.5 + 2.5), 90);
    assert_eq!(fps.secs_to_frames_ceil(2.01), 61);
    assert_eq!(fps.secs_to_frames_ceil(0.0), 1);
    assert_eq!(fps.secs_to_frames_ceil(f64::NAN), 1);

    let ntsc = Fps::new(30_000, 1001).unwrap();
    let frames = ntsc.secs_to_frames_ceil(1.0);
    assert_eq!(frames, 30);
    assert!(ntsc.frames_to_secs(frames) >= 1.0);
}

#[test]
fn resolution_parses_and_round_trips_as_string() {
    let r: Resolution = "1920x1080".parse().unwrap();
    assert_eq!(r, Resolution::new(1920, 1080));
    assert_eq!(r.to_string(), "1920x1080");
    assert!("1920".parse::<Resolution>().is_err());
    assert!("axb".parse::<Resolution>().is_err());

    let r: Resolution = serde_json::from_str("\"1280X720\"").unwrap();
    assert_eq!(r, Resolution::new(1280, 720));
}

#[test]
fn canvas_subtracts_symmetric_margin() {
    let c = Resolution::new(1920, 1080).canvas(100);
    assert_eq!(c.x, 100.0);
    assert_eq!(c.y, 100.0);
    assert_eq!(c.width, 1720.0);
    assert_eq!(c.height, 880.0);
    assert!(!c.is_empty());
    assert!(Resolution::new(100, 100).canvas(50).is_empty());
}

#[test]
fn colors_parse_names_and_hex() {
    assert_eq!("black".parse::<Rgba8>().unwrap(), Rgba8::BLACK);
    assert_eq!("White".parse::<Rgba8>().unwrap(), Rgba8::WHITE);
    assert_eq!(
        "#ff000080".parse::<Rgba8>().unwrap(),
        Rgba8 {
            r: 255,
            g: 0,
            b: 0,
            a: 128
        }
    );
    assert_eq!("00ff00".parse::<Rgba8>().unwrap(), Rgba8::opaque(0, 255, 0));
    assert!("#12".parse::<Rgba8>().is_err());
    assert!("chartreuse-ish".parse::<Rgba8>().is_err());
}

#[test]
fn audio_descriptor_reports_first_mismatch() {
    let a = AudioDescriptor::canonical_default();
    let mut b = a.clone();
    assert_eq!(a.first_mismatch(&b), None);
    b.sample_rate = 44_100;
    assert_eq!(a.first_mismatch(&b), Some("sample_rate"));
    b.sample_rate = 48_000;
    b.codec = "mp3".to_owned();
    assert_eq!(a.first_mismatch(&b), Some("codec"));
    assert_eq!(a.channel_layout(), "stereo");
    b.channels = 6;
    assert_eq!(b.known_channel_layout(), Some("5.1"));
    b.channels = 12;
    assert_eq!(b.known_channel_layout(), None);
}
