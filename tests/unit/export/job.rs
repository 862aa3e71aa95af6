use super::*;
use crate::telemetry::memory::FlightLog;

/// Log spanning 1_000_000..2_003_000 µs.
fn log() -> FlightLog {
    let mut b = FlightLog::builder(vec!["a".to_string()]);
    b.push_frame(0, 1_000_000, vec![0.0]).unwrap();
    b.push_frame(1, 1_500_000, vec![1.0]).unwrap();
    b.push_frame(2, 2_003_000, vec![2.0]).unwrap();
    b.build().unwrap()
}

#[test]
fn frame_count_rounds_partial_frames() {
    let dur = Fps::new(30, 1).unwrap().frame_duration_micros();
    assert_eq!(frame_count_for(0, 1_003_000, dur), 30);
    assert_eq!(frame_count_for(0, 1_020_000, dur), 31);
    assert_eq!(frame_count_for(0, 0, dur), 0);
    assert_eq!(frame_count_for(10, 0, dur), 0);
}

#[test]
fn frame_count_is_stable_over_its_own_span() {
    let ranges: [(Micros, Micros); 5] = [
        (0, 1_003_000),
        (1_000_000, 2_003_000),
        (250_000, 260_001),
        (-5_000_000, 17_123_457),
        (42, 3_600_000_042),
    ];
    for fps in [1, 24, 25, 30, 50, 60, 120, 240] {
        let dur = Fps::new(fps, 1).unwrap().frame_duration_micros();
        for (in_time, out_time) in ranges {
            let count = frame_count_for(in_time, out_time, dur);
            let span_end = in_time + (count as f64 * dur).round() as Micros;
            assert_eq!(
                frame_count_for(in_time, span_end, dur),
                count,
                "fps {fps}, range {in_time}..{out_time}"
            );
        }
    }
}

#[test]
fn omitted_in_and_out_use_log_bounds() {
    let log = log();
    let req = ExportRequest::new(GraphConfig::default(), "out.webm");
    let plan = req.plan(&log, false).unwrap();
    assert_eq!(plan.in_time, 1_000_000);
    assert_eq!(plan.out_time, 2_003_000);
    assert_eq!(plan.log_start, 1_000_000);
    assert_eq!(plan.frame_count, 30);
}

#[test]
fn explicit_range_is_respected() {
    let log = log();
    let mut req = ExportRequest::new(GraphConfig::default(), "out.webm");
    req.in_time = Some(1_200_000);
    req.out_time = Some(1_700_000);
    req.settings.frame_rate = 10;
    let plan = req.plan(&log, false).unwrap();
    assert_eq!(plan.frame_count, 5);
    assert_eq!(plan.frame_duration, 100_000.0);
}

#[test]
fn full_dim_drops_the_video() {
    let log = log();
    let mut req = ExportRequest::new(GraphConfig::default(), "out.webm");
    req.settings.video_dim = 1.0;
    let plan = req.plan(&log, true).unwrap();
    assert!(!plan.has_video);
    assert_eq!(plan.background, Background::Fill);

    req.settings.video_dim = 0.5;
    let plan = req.plan(&log, true).unwrap();
    assert!(plan.has_video);
    assert_eq!(plan.background, Background::None);
}

#[test]
fn background_follows_format() {
    assert_eq!(ExportFormat::Webm.background(false), Background::Fill);
    assert_eq!(ExportFormat::Mp4.background(false), Background::Fill);
    assert_eq!(ExportFormat::Png.background(false), Background::Clear);
    assert_eq!(ExportFormat::Png.background(true), Background::None);
}

#[test]
fn container_codec_comes_from_the_format_not_the_path() {
    assert_eq!(ExportFormat::Webm.container_codec(), Some(ContainerCodec::Vp9Webm));
    assert_eq!(ExportFormat::Mp4.container_codec(), Some(ContainerCodec::H264));
    assert_eq!(ExportFormat::Png.container_codec(), None);

    // Guessing from "flight" alone would give H.264.
    assert_eq!(FfmpegSinkOpts::new("flight").codec, ContainerCodec::H264);
    let webm = container_opts(ExportFormat::Webm, Path::new("flight")).unwrap();
    assert_eq!(webm.codec, ContainerCodec::Vp9Webm);
    let mp4 = container_opts(ExportFormat::Mp4, Path::new("out/clip.webm")).unwrap();
    assert_eq!(FfmpegSink::new(mp4).codec(), ContainerCodec::H264);
    assert!(container_opts(ExportFormat::Png, Path::new("frames")).is_none());
}

#[test]
fn invalid_settings_are_rejected() {
    let log = log();
    let mut req = ExportRequest::new(GraphConfig::default(), "out.webm");
    req.settings.frame_rate = 0;
    assert!(req.plan(&log, false).is_err());

    let mut req = ExportRequest::new(GraphConfig::default(), "out.webm");
    req.settings.video_dim = 1.5;
    assert!(req.plan(&log, false).is_err());

    let mut req = ExportRequest::new(GraphConfig::default(), "out.webm");
    req.settings.width = 0;
    assert!(req.plan(&log, false).is_err());
}

#[test]
fn video_time_is_relative_to_log_start_plus_offset() {
    let log = log();
    let mut req = ExportRequest::new(GraphConfig::default(), "out.webm");
    req.video_offset = 2.5;
    let plan = req.plan(&log, true).unwrap();
    assert!((plan.video_time(1_500_000.0) - 3.0).abs() < 1e-9);
}

#[test]
fn settings_json_uses_camel_case_and_defaults() {
    let s = ExportSettings::from_json_str(r#"{"frameRate": 60, "format": "png"}"#).unwrap();
    assert_eq!(s.frame_rate, 60);
    assert_eq!(s.format, ExportFormat::Png);
    assert_eq!(s.width, 1280);

    let json = s.to_json_string().unwrap();
    assert!(json.contains("\"videoDim\""));
    assert_eq!(ExportSettings::from_json_str(&json).unwrap(), s);
}
