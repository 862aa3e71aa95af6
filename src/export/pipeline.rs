//! The export state machine: renders a telemetry range frame by frame into a [`FrameSink`].
//!
//! The job never blocks on its own. A host drives it with [`ExportJob::step`], which renders at
//! most one batch and hands control back; [`ExportJob::run`] does that in a loop for headless use.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::export::job::{ExportPlan, ExportRequest};
use crate::export::sink::{FrameSink, SinkConfig};
use crate::export::video::BackgroundVideo;
use crate::foundation::core::{FrameIndex, Micros, Rect, Rgba8};
use crate::foundation::error::{BlackboxError, BlackboxResult};
use crate::render::backend::RasterBackend;
use crate::render::grapher::{Grapher, GrapherOptions};
use crate::telemetry::source::TelemetrySource;

/// Frames per step while the host is in the foreground.
pub const FOCUSED_BATCH: usize = 8;
/// Frames per step while the host is backgrounded.
pub const BACKGROUND_BATCH: usize = 32;

/// Cooperative cancellation flag, shareable with UI callbacks.
#[derive(Clone, Debug, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExportState {
    Idle,
    Preparing,
    Rendering,
    Cancelling,
    Finalizing,
    /// Finished, possibly cancelled.
    Complete,
    /// Stopped by an error.
    Failed,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ExportEvent {
    /// Emitted after each frame reaches the sink. `frame_index` is 0-based.
    Progress {
        frame_index: u64,
        frame_count: u64,
        bytes_written: u64,
    },
    /// Emitted exactly once, after the sink has been closed.
    Complete { success: bool, frames: u64 },
}

/// What the host should do after a [`ExportJob::step`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StepStatus {
    /// A batch was rendered; call `step` again when convenient.
    Yield,
    /// A background video seek is outstanding; call `step` again once it may have completed.
    WaitingForVideo,
    Finished { success: bool },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ExportOutcome {
    pub success: bool,
    pub frames: u64,
}

enum FrameStep {
    Pushed,
    WaitingForVideo,
}

type Subscriber = Box<dyn FnMut(&ExportEvent) + Send>;

pub struct ExportJob {
    state: ExportState,
    plan: ExportPlan,
    grapher: Grapher,
    backend: Box<dyn RasterBackend>,
    sink: Box<dyn FrameSink>,
    video: Option<Box<dyn BackgroundVideo>>,
    cancel: CancelToken,
    focused: bool,
    subscribers: Vec<Subscriber>,
    frame_index: u64,
    frame_time: f64,
    seek_pending: bool,
    sink_open: bool,
    success: Option<bool>,
    error: Option<BlackboxError>,
}

impl std::fmt::Debug for ExportJob {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExportJob")
            .field("state", &self.state)
            .field("plan", &self.plan)
            .field("frame_index", &self.frame_index)
            .field("has_video", &self.video.is_some())
            .field("focused", &self.focused)
            .finish()
    }
}

impl ExportJob {
    /// Set up an export. Nothing is opened or rendered until the first `step`.
    ///
    /// The job owns its own grapher; `video` is dropped when the dim setting hides it.
    #[tracing::instrument(skip_all, fields(output = %request.output_path.display()))]
    pub fn new(
        source: Arc<dyn TelemetrySource>,
        request: &ExportRequest,
        sink: Box<dyn FrameSink>,
        backend: Box<dyn RasterBackend>,
        video: Option<Box<dyn BackgroundVideo>>,
    ) -> BlackboxResult<Self> {
        let plan = request.plan(source.as_ref(), video.is_some())?;
        let video = if plan.has_video { video } else { None };
        let grapher = Grapher::new(
            source,
            &request.graph_config,
            plan.canvas,
            GrapherOptions {
                gapless: false,
                background: plan.background,
                layout: request.layout.clone(),
            },
        );
        tracing::debug!(
            in_time = plan.in_time,
            out_time = plan.out_time,
            frames = plan.frame_count,
            background = ?plan.background,
            "export planned"
        );
        Ok(Self {
            state: ExportState::Idle,
            frame_time: plan.in_time as f64,
            plan,
            grapher,
            backend,
            sink,
            video,
            cancel: CancelToken::new(),
            focused: true,
            subscribers: Vec::new(),
            frame_index: 0,
            seek_pending: false,
            sink_open: false,
            success: None,
            error: None,
        })
    }

    /// Subscribers run synchronously, in subscription order.
    pub fn subscribe(&mut self, subscriber: impl FnMut(&ExportEvent) + Send + 'static) {
        self.subscribers.push(Box::new(subscriber));
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Backgrounded hosts get larger batches per step.
    pub fn set_focused(&mut self, focused: bool) {
        self.focused = focused;
    }

    pub fn batch_size(&self) -> usize {
        if self.focused {
            FOCUSED_BATCH
        } else {
            BACKGROUND_BATCH
        }
    }

    pub fn state(&self) -> ExportState {
        self.state
    }

    pub fn plan(&self) -> &ExportPlan {
        &self.plan
    }

    pub fn frame_count(&self) -> u64 {
        self.plan.frame_count
    }

    /// Frames pushed to the sink so far.
    pub fn frames_produced(&self) -> u64 {
        self.frame_index
    }

    /// The error that failed the job, if any.
    pub fn error(&self) -> Option<&BlackboxError> {
        self.error.as_ref()
    }

    /// Advance the export by at most one batch.
    pub fn step(&mut self) -> StepStatus {
        match self.state {
            ExportState::Idle => {
                self.prepare();
                self.status()
            }
            ExportState::Rendering => self.render_batch(),
            ExportState::Preparing | ExportState::Cancelling | ExportState::Finalizing => {
                self.finish(false);
                self.status()
            }
            ExportState::Complete | ExportState::Failed => self.status(),
        }
    }

    /// Drive the job to completion on the current thread.
    pub fn run(&mut self) -> ExportOutcome {
        loop {
            match self.step() {
                StepStatus::Yield => {}
                StepStatus::WaitingForVideo => std::thread::yield_now(),
                StepStatus::Finished { success } => {
                    return ExportOutcome {
                        success,
                        frames: self.frame_index,
                    };
                }
            }
        }
    }

    fn status(&self) -> StepStatus {
        match self.success {
            Some(success) => StepStatus::Finished { success },
            None => StepStatus::Yield,
        }
    }

    fn prepare(&mut self) {
        self.state = ExportState::Preparing;
        self.frame_index = 0;
        self.frame_time = self.plan.in_time as f64;
        self.seek_pending = false;

        tracing::info!(
            frames = self.plan.frame_count,
            width = self.plan.canvas.width,
            height = self.plan.canvas.height,
            fps = self.plan.fps.as_f64(),
            video = self.video.is_some(),
            "export started"
        );

        let cfg = SinkConfig {
            width: self.plan.canvas.width,
            height: self.plan.canvas.height,
            fps: self.plan.fps,
        };
        match self.sink.begin(cfg) {
            Ok(()) => {
                self.sink_open = true;
                self.state = ExportState::Rendering;
            }
            Err(e) => self.fail(e),
        }
    }

    fn render_batch(&mut self) -> StepStatus {
        if self.cancel.is_cancelled() {
            self.state = ExportState::Cancelling;
            tracing::info!(frames = self.frame_index, "export cancelled");
            self.finish(false);
            return self.status();
        }

        let batch = self.batch_size();
        for _ in 0..batch {
            if self.frame_index >= self.plan.frame_count {
                self.finish(true);
                return self.status();
            }
            match self.render_frame() {
                Ok(FrameStep::Pushed) => {}
                Ok(FrameStep::WaitingForVideo) => return StepStatus::WaitingForVideo,
                Err(e) => {
                    self.fail(e);
                    return self.status();
                }
            }
        }
        tracing::debug!(batch, next = self.frame_index, "export batch rendered");

        if self.frame_index >= self.plan.frame_count {
            self.finish(true);
            return self.status();
        }
        StepStatus::Yield
    }

    fn render_frame(&mut self) -> BlackboxResult<FrameStep> {
        let underlay = match self.video.as_mut() {
            Some(video) => {
                if !self.seek_pending {
                    video.begin_seek(self.plan.video_time(self.frame_time))?;
                    self.seek_pending = true;
                }
                match video.poll_seeked()? {
                    Some(image) => {
                        self.seek_pending = false;
                        Some(image)
                    }
                    None => return Ok(FrameStep::WaitingForVideo),
                }
            }
            None => None,
        };

        let center = self.frame_time.round() as Micros;
        let full = Rect::new(
            0.0,
            0.0,
            self.plan.canvas.width_f64(),
            self.plan.canvas.height_f64(),
        );
        let dim = self.plan.video_dim;
        let scene = self.grapher.render_with(center, |p| {
            if let Some(image) = underlay {
                p.image(image, full);
                if dim > 0.0 {
                    p.fill_rect(full, Rgba8::BLACK.with_alpha_f(dim));
                }
            }
        });
        let frame = self.backend.render_scene(scene)?;
        self.sink.push_frame(FrameIndex(self.frame_index), &frame)?;

        self.emit(ExportEvent::Progress {
            frame_index: self.frame_index,
            frame_count: self.plan.frame_count,
            bytes_written: self.sink.written_bytes(),
        });
        self.frame_index += 1;
        self.frame_time += self.plan.frame_duration;
        Ok(FrameStep::Pushed)
    }

    fn fail(&mut self, err: BlackboxError) {
        tracing::error!(error = %err, frame = self.frame_index, "export failed");
        self.error = Some(err);
        self.finish(false);
    }

    fn finish(&mut self, mut success: bool) {
        self.state = ExportState::Finalizing;
        if self.sink_open {
            self.sink_open = false;
            if let Err(e) = self.sink.end() {
                tracing::error!(error = %e, "closing export output failed");
                if self.error.is_none() {
                    self.error = Some(e);
                }
                success = false;
            }
        }

        self.state = if self.error.is_some() {
            ExportState::Failed
        } else {
            ExportState::Complete
        };
        if success {
            tracing::info!(frames = self.frame_index, "export complete");
        }
        self.success = Some(success);
        self.emit(ExportEvent::Complete {
            success,
            frames: self.frame_index,
        });
    }

    fn emit(&mut self, event: ExportEvent) {
        for sub in &mut self.subscribers {
            sub(&event);
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/export/pipeline.rs"]
mod tests;
