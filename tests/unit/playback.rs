use super::*;
use std::sync::{
    Arc, Mutex,
    atomic::{AtomicUsize, Ordering},
};
use std::time::Duration;

use crate::graph::config::GraphConfig;
use crate::render::grapher::GrapherOptions;
use crate::telemetry::memory::FlightLog;

#[derive(Clone, Default)]
struct Requests(Arc<AtomicUsize>);

impl FrameRequester for Requests {
    fn request_frame(&mut self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

#[derive(Default)]
struct VideoState {
    time: f64,
    playing: bool,
}

#[derive(Clone, Default)]
struct FakeVideo(Arc<Mutex<VideoState>>);

impl VideoPlayhead for FakeVideo {
    fn current_time(&self) -> f64 {
        self.0.lock().unwrap().time
    }
    fn set_current_time(&mut self, secs: f64) {
        self.0.lock().unwrap().time = secs.max(0.0);
    }
    fn duration(&self) -> Option<f64> {
        Some(30.0)
    }
    fn play(&mut self) {
        self.0.lock().unwrap().playing = true;
    }
    fn pause(&mut self) {
        self.0.lock().unwrap().playing = false;
    }
}

/// Log spanning 1s..3s.
fn session() -> (PlaybackSession, Requests) {
    let mut b = FlightLog::builder(vec!["a".to_string()]);
    for i in 0..=20 {
        b.push_frame(i, 1_000_000 + i as Micros * 100_000, vec![0.0])
            .unwrap();
    }
    let grapher = Grapher::new(
        Arc::new(b.build().unwrap()),
        &GraphConfig::default(),
        Canvas::new(1000, 100).unwrap(),
        GrapherOptions::default(),
    );
    let requests = Requests::default();
    (PlaybackSession::new(grapher, Box::new(requests.clone())), requests)
}

#[test]
fn invalidate_queues_at_most_one_frame() {
    let (mut s, requests) = session();
    assert_eq!(s.current_time(), 1_000_000);
    assert_eq!(requests.0.load(Ordering::SeqCst), 1);
    s.invalidate();
    s.seek(1_500_000);
    assert_eq!(requests.0.load(Ordering::SeqCst), 1);

    s.tick(Instant::now());
    assert!(!s.frame_queued());
    assert_eq!(s.current_time(), 1_500_000);
    s.invalidate();
    assert_eq!(requests.0.load(Ordering::SeqCst), 2);
}

#[test]
fn wall_clock_advances_while_playing_and_stops_at_the_end() {
    let (mut s, requests) = session();
    let t0 = Instant::now();
    s.tick(t0);
    s.play();
    s.tick(t0);
    assert!(s.frame_queued());
    let before = requests.0.load(Ordering::SeqCst);

    s.tick(t0 + Duration::from_millis(250));
    assert_eq!(s.current_time(), 1_250_000);
    assert_eq!(requests.0.load(Ordering::SeqCst), before + 1);

    s.tick(t0 + Duration::from_secs(5));
    assert_eq!(s.current_time(), 3_000_000);
    assert_eq!(s.state(), PlaybackState::Paused);
}

#[test]
fn paused_ticks_do_not_move_time_or_rearm() {
    let (mut s, requests) = session();
    let t0 = Instant::now();
    s.tick(t0);
    let n = requests.0.load(Ordering::SeqCst);
    s.tick(t0 + Duration::from_secs(1));
    assert_eq!(s.current_time(), 1_000_000);
    assert_eq!(requests.0.load(Ordering::SeqCst), n);
}

#[test]
fn jumps_pause_and_move_by_a_small_step() {
    let (mut s, _) = session();
    s.play();
    s.jump_forward();
    assert_eq!(s.current_time(), 1_100_000);
    assert_eq!(s.state(), PlaybackState::Paused);
    s.jump_back();
    s.jump_back();
    assert_eq!(s.current_time(), 900_000);

    s.jump_to_log_end();
    assert_eq!(s.current_time(), 3_000_000);
    s.jump_to_log_start();
    assert_eq!(s.current_time(), 1_000_000);
}

#[test]
fn bound_video_drives_the_log_clock() {
    let (mut s, _) = session();
    let video = FakeVideo::default();
    video.0.lock().unwrap().time = 2.0;
    s.bind_video(Box::new(video.clone()));
    s.set_video_offset(0.5);
    s.tick(Instant::now());
    // (2.0 - 0.5) s after the log start.
    assert_eq!(s.current_time(), 2_500_000);

    s.seek(1_200_000);
    assert!((video.current_time() - 0.7).abs() < 1e-9);
    assert_eq!(s.current_time(), 1_200_000);

    s.play();
    assert!(video.0.lock().unwrap().playing);
    s.jump_forward();
    assert!(!video.0.lock().unwrap().playing);
    assert!((video.current_time() - 0.8).abs() < 1e-9);

    s.jump_to_video_end();
    assert_eq!(video.current_time(), 30.0);
}

#[test]
fn offset_controls() {
    let (mut s, _) = session();
    s.nudge_offset_forward();
    s.nudge_offset_forward();
    s.nudge_offset_back();
    assert!((s.video_offset() - OFFSET_NUDGE_SECS).abs() < 1e-12);
    s.set_video_offset(f64::NAN);
    assert!((s.video_offset() - OFFSET_NUDGE_SECS).abs() < 1e-12);

    // Without a video there is nothing to sync to.
    s.sync_here();
    assert!((s.video_offset() - OFFSET_NUDGE_SECS).abs() < 1e-12);

    let video = FakeVideo::default();
    video.0.lock().unwrap().time = 4.25;
    s.bind_video(Box::new(video));
    s.sync_here();
    assert_eq!(s.video_offset(), 4.25);
}

#[test]
fn dragging_right_moves_back_in_time() {
    let (mut s, _) = session();
    s.seek(2_000_000);
    s.drag(100.0);
    assert_eq!(s.current_time(), 1_900_000);
    s.set_graph_zoom(2.0);
    s.drag(-100.0);
    assert_eq!(s.current_time(), 1_950_000);
}
