use super::*;

#[test]
fn fps_frame_duration_in_micros() {
    let fps = Fps::new(30, 1).unwrap();
    assert!((fps.frame_duration_micros() - 33_333.333_333).abs() < 1e-3);

    let ntsc = Fps::new(30000, 1001).unwrap();
    assert!((ntsc.frame_duration_micros() - 33_366.666_666).abs() < 1e-3);
}

#[test]
fn fps_rejects_zero() {
    assert!(Fps::new(0, 1).is_err());
    assert!(Fps::new(30, 0).is_err());
}

#[test]
fn canvas_rejects_empty_and_oversized() {
    assert!(Canvas::new(0, 10).is_err());
    assert!(Canvas::new(70_000, 10).is_err());
    assert!(Canvas::new(1280, 720).is_ok());
}

#[test]
fn colour_hex_parses_and_prints() {
    let c = Rgba8::parse_hex("#fb8072").unwrap();
    assert_eq!(c, Rgba8::rgb(0xfb, 0x80, 0x72));
    assert_eq!(c.to_hex(), "#fb8072");

    let c = Rgba8::parse_hex("#ff000080").unwrap();
    assert_eq!(c.a, 0x80);
    assert_eq!(c.to_hex(), "#ff000080");

    assert!(Rgba8::parse_hex("fb8072").is_err());
    assert!(Rgba8::parse_hex("#fb80").is_err());
    assert!(Rgba8::parse_hex("#zzzzzz").is_err());
}

#[test]
fn colour_serde_uses_hex_strings() {
    let json = serde_json::to_string(&Rgba8::rgb(1, 2, 3)).unwrap();
    assert_eq!(json, "\"#010203\"");
    let back: Rgba8 = serde_json::from_str(&json).unwrap();
    assert_eq!(back, Rgba8::rgb(1, 2, 3));
}

#[test]
fn premul_scales_channels_by_alpha() {
    assert_eq!(Rgba8::rgb(10, 20, 30).premul(), [10, 20, 30, 255]);
    assert_eq!(Rgba8::rgba(255, 0, 0, 128).premul(), [128, 0, 0, 128]);
    assert_eq!(Rgba8::WHITE.with_alpha_f(0.5).a, 128);
}
