use super::*;
use std::sync::Mutex;

use crate::export::job::ExportFormat;
use crate::export::sink::InMemorySink;
use crate::graph::config::GraphConfig;
use crate::render::backend::FrameRGBA;
use crate::render::grapher::Background;
use crate::render::scene::{DrawOp, RasterImage, Scene};
use crate::telemetry::memory::FlightLog;

/// Log spanning 0..1_003_000 µs, one frame every 10 ms.
fn source() -> Arc<dyn TelemetrySource> {
    let mut b = FlightLog::builder(vec!["a".to_string()]);
    let mut t = 0;
    let mut i = 0;
    while t < 1_003_000 {
        b.push_frame(i, t, vec![i as f64]).unwrap();
        t += 10_000;
        i += 1;
    }
    b.push_frame(i, 1_003_000, vec![0.0]).unwrap();
    Arc::new(b.build().unwrap())
}

fn request() -> ExportRequest {
    let mut req = ExportRequest::new(GraphConfig::default(), "unused.webm");
    req.settings.width = 8;
    req.settings.height = 8;
    req.settings.frame_rate = 30;
    req
}

#[derive(Clone, Default)]
struct SharedSink(Arc<Mutex<InMemorySink>>);

impl FrameSink for SharedSink {
    fn begin(&mut self, cfg: SinkConfig) -> BlackboxResult<()> {
        self.0.lock().unwrap().begin(cfg)
    }
    fn push_frame(&mut self, idx: FrameIndex, frame: &FrameRGBA) -> BlackboxResult<()> {
        self.0.lock().unwrap().push_frame(idx, frame)
    }
    fn end(&mut self) -> BlackboxResult<()> {
        self.0.lock().unwrap().end()
    }
    fn written_bytes(&self) -> u64 {
        self.0.lock().unwrap().written_bytes()
    }
}

struct FailingSink {
    fail_begin: bool,
    fail_at: u64,
    ends: Arc<Mutex<usize>>,
}

impl FrameSink for FailingSink {
    fn begin(&mut self, _cfg: SinkConfig) -> BlackboxResult<()> {
        if self.fail_begin {
            return Err(BlackboxError::export("cannot open"));
        }
        Ok(())
    }
    fn push_frame(&mut self, idx: FrameIndex, _frame: &FrameRGBA) -> BlackboxResult<()> {
        if idx.0 == self.fail_at {
            return Err(BlackboxError::export("disk full"));
        }
        Ok(())
    }
    fn end(&mut self) -> BlackboxResult<()> {
        *self.ends.lock().unwrap() += 1;
        Ok(())
    }
    fn written_bytes(&self) -> u64 {
        0
    }
}

/// Records every scene it is asked to paint.
#[derive(Clone, Default)]
struct RecordingBackend(Arc<Mutex<Vec<Scene>>>);

impl RasterBackend for RecordingBackend {
    fn render_scene(&mut self, scene: &Scene) -> BlackboxResult<FrameRGBA> {
        self.0.lock().unwrap().push(scene.clone());
        Ok(FrameRGBA {
            width: scene.width,
            height: scene.height,
            data: vec![0; scene.width as usize * scene.height as usize * 4],
            premultiplied: true,
        })
    }
}

/// Completes each seek on the second poll.
#[derive(Clone, Default)]
struct SlowVideo(Arc<Mutex<Vec<f64>>>, Arc<Mutex<u32>>);

impl BackgroundVideo for SlowVideo {
    fn begin_seek(&mut self, secs: f64) -> BlackboxResult<()> {
        self.0.lock().unwrap().push(secs);
        *self.1.lock().unwrap() = 0;
        Ok(())
    }
    fn poll_seeked(&mut self) -> BlackboxResult<Option<Arc<RasterImage>>> {
        let mut polls = self.1.lock().unwrap();
        *polls += 1;
        if *polls < 2 {
            return Ok(None);
        }
        Ok(Some(Arc::new(RasterImage {
            width: 1,
            height: 1,
            data: vec![255; 4],
        })))
    }
}

fn events_of(job: &mut ExportJob) -> Arc<Mutex<Vec<ExportEvent>>> {
    let events = Arc::new(Mutex::new(Vec::new()));
    let sink = events.clone();
    job.subscribe(move |e| sink.lock().unwrap().push(*e));
    events
}

#[test]
fn full_export_pushes_every_frame_in_order() {
    let sink = SharedSink::default();
    let mut job = ExportJob::new(
        source(),
        &request(),
        Box::new(sink.clone()),
        Box::new(RecordingBackend::default()),
        None,
    )
    .unwrap();
    let events = events_of(&mut job);

    let outcome = job.run();
    assert_eq!(outcome, ExportOutcome { success: true, frames: 30 });
    assert_eq!(job.state(), ExportState::Complete);

    let inner = sink.0.lock().unwrap();
    assert_eq!(inner.begin_count(), 1);
    assert_eq!(inner.end_count(), 1);
    assert_eq!(inner.frames().len(), 30);
    assert!(inner.frames().iter().enumerate().all(|(i, (idx, _))| idx.0 == i as u64));

    let events = events.lock().unwrap();
    let progress: Vec<u64> = events
        .iter()
        .filter_map(|e| match e {
            ExportEvent::Progress { frame_index, .. } => Some(*frame_index),
            _ => None,
        })
        .collect();
    assert!(progress.windows(2).all(|w| w[0] <= w[1]));
    assert_eq!(progress.last(), Some(&29));
    assert_eq!(
        events.last(),
        Some(&ExportEvent::Complete { success: true, frames: 30 })
    );
}

#[test]
fn steps_render_in_bounded_batches() {
    let mut job = ExportJob::new(
        source(),
        &request(),
        Box::new(SharedSink::default()),
        Box::new(RecordingBackend::default()),
        None,
    )
    .unwrap();

    assert_eq!(job.step(), StepStatus::Yield);
    assert_eq!(job.state(), ExportState::Rendering);
    assert_eq!(job.frames_produced(), 0);

    assert_eq!(job.step(), StepStatus::Yield);
    assert_eq!(job.frames_produced(), FOCUSED_BATCH as u64);

    job.set_focused(false);
    assert_eq!(job.step(), StepStatus::Finished { success: true });
    assert_eq!(job.frames_produced(), 30);
}

#[test]
fn cancel_stops_at_the_next_batch_and_closes_once() {
    let sink = SharedSink::default();
    let mut job = ExportJob::new(
        source(),
        &request(),
        Box::new(sink.clone()),
        Box::new(RecordingBackend::default()),
        None,
    )
    .unwrap();
    let events = events_of(&mut job);
    let token = job.cancel_token();

    job.step();
    job.step();
    token.cancel();
    assert_eq!(job.step(), StepStatus::Finished { success: false });
    assert_eq!(job.step(), StepStatus::Finished { success: false });

    let inner = sink.0.lock().unwrap();
    assert_eq!(inner.frames().len(), FOCUSED_BATCH);
    assert_eq!(inner.end_count(), 1);

    let events = events.lock().unwrap();
    let completes = events
        .iter()
        .filter(|e| matches!(e, ExportEvent::Complete { .. }))
        .count();
    assert_eq!(completes, 1);
    assert_eq!(
        events.last(),
        Some(&ExportEvent::Complete {
            success: false,
            frames: FOCUSED_BATCH as u64
        })
    );
}

#[test]
fn sink_open_failure_completes_unsuccessfully() {
    let ends = Arc::new(Mutex::new(0));
    let mut job = ExportJob::new(
        source(),
        &request(),
        Box::new(FailingSink {
            fail_begin: true,
            fail_at: u64::MAX,
            ends: ends.clone(),
        }),
        Box::new(RecordingBackend::default()),
        None,
    )
    .unwrap();
    let events = events_of(&mut job);

    assert_eq!(job.run(), ExportOutcome { success: false, frames: 0 });
    assert_eq!(job.state(), ExportState::Failed);
    assert!(job.error().is_some());
    assert_eq!(*ends.lock().unwrap(), 0);
    assert_eq!(
        *events.lock().unwrap(),
        vec![ExportEvent::Complete { success: false, frames: 0 }]
    );
}

#[test]
fn write_failure_closes_the_sink_once() {
    let ends = Arc::new(Mutex::new(0));
    let mut job = ExportJob::new(
        source(),
        &request(),
        Box::new(FailingSink {
            fail_begin: false,
            fail_at: 3,
            ends: ends.clone(),
        }),
        Box::new(RecordingBackend::default()),
        None,
    )
    .unwrap();

    assert_eq!(job.run(), ExportOutcome { success: false, frames: 3 });
    assert_eq!(job.state(), ExportState::Failed);
    assert_eq!(*ends.lock().unwrap(), 1);
}

#[test]
fn video_frames_sit_under_a_dim_overlay() {
    let backend = RecordingBackend::default();
    let video = SlowVideo::default();
    let mut req = request();
    req.video_offset = 1.0;
    req.settings.video_dim = 0.5;
    let mut job = ExportJob::new(
        source(),
        &req,
        Box::new(SharedSink::default()),
        Box::new(backend.clone()),
        Some(Box::new(video.clone())),
    )
    .unwrap();
    assert_eq!(job.plan().background, Background::None);

    job.step();
    assert_eq!(job.step(), StepStatus::WaitingForVideo);
    assert_eq!(job.frames_produced(), 0);

    assert_eq!(job.run(), ExportOutcome { success: true, frames: 30 });

    let seeks = video.0.lock().unwrap();
    assert_eq!(seeks.len(), 30);
    assert!((seeks[0] - 1.0).abs() < 1e-9);
    assert!((seeks[3] - 1.1).abs() < 1e-9);

    let scenes = backend.0.lock().unwrap();
    assert!(matches!(scenes[0].ops[0], DrawOp::Image { .. }));
    match &scenes[0].ops[1] {
        DrawOp::FillRect { color, .. } => assert_eq!(*color, Rgba8::BLACK.with_alpha_f(0.5)),
        other => panic!("expected dim overlay, got {other:?}"),
    }
}

#[test]
fn fully_dimmed_video_is_never_seeked() {
    let video = SlowVideo::default();
    let mut req = request();
    req.settings.video_dim = 1.0;
    req.settings.format = ExportFormat::Png;
    let mut job = ExportJob::new(
        source(),
        &req,
        Box::new(SharedSink::default()),
        Box::new(RecordingBackend::default()),
        Some(Box::new(video.clone())),
    )
    .unwrap();
    assert_eq!(job.plan().background, Background::Clear);
    assert!(job.run().success);
    assert!(video.0.lock().unwrap().is_empty());
}

#[test]
fn empty_range_still_opens_and_closes() {
    let sink = SharedSink::default();
    let mut req = request();
    req.in_time = Some(500_000);
    req.out_time = Some(500_000);
    let mut job = ExportJob::new(
        source(),
        &req,
        Box::new(sink.clone()),
        Box::new(RecordingBackend::default()),
        None,
    )
    .unwrap();
    assert_eq!(job.run(), ExportOutcome { success: true, frames: 0 });
    let inner = sink.0.lock().unwrap();
    assert_eq!((inner.begin_count(), inner.end_count()), (1, 1));
}
