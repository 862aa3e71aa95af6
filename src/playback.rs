//! Interactive playback: the render-on-demand loop around a [`Grapher`].

use std::time::Instant;

use crate::{
    foundation::core::{Canvas, MICROS_PER_SEC, Micros},
    render::{grapher::Grapher, scene::Scene},
};

/// Step used by the jump-back/jump-forward controls.
pub const SMALL_JUMP: Micros = 100_000;

/// Video offset nudge, one frame at 15 fps.
pub const OFFSET_NUDGE_SECS: f64 = 1.0 / 15.0;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PlaybackState {
    #[default]
    Paused,
    Playing,
}

/// The host's video element. Times are seconds of video.
pub trait VideoPlayhead: Send {
    fn current_time(&self) -> f64;

    fn set_current_time(&mut self, secs: f64);

    fn duration(&self) -> Option<f64>;

    fn play(&mut self);

    fn pause(&mut self);
}

/// Schedules one future call to [`PlaybackSession::tick`], like an animation-frame request.
pub trait FrameRequester: Send {
    fn request_frame(&mut self);
}

/// Playback state for one loaded log: current time, play state and the optional bound video.
///
/// With a video bound, the video's clock drives the log time; otherwise wall-clock deltas
/// between ticks do.
pub struct PlaybackSession {
    grapher: Grapher,
    scheduler: Box<dyn FrameRequester>,
    video: Option<Box<dyn VideoPlayhead>>,
    video_offset: f64,
    min_time: Micros,
    max_time: Micros,
    current_time: Micros,
    state: PlaybackState,
    last_render: Option<Instant>,
    frame_queued: bool,
}

impl std::fmt::Debug for PlaybackSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PlaybackSession")
            .field("current_time", &self.current_time)
            .field("state", &self.state)
            .field("has_video", &self.video.is_some())
            .field("video_offset", &self.video_offset)
            .finish()
    }
}

impl PlaybackSession {
    pub fn new(grapher: Grapher, scheduler: Box<dyn FrameRequester>) -> Self {
        let min_time = grapher.source().min_time();
        let max_time = grapher.source().max_time();
        let mut session = Self {
            grapher,
            scheduler,
            video: None,
            video_offset: 0.0,
            min_time,
            max_time,
            current_time: min_time,
            state: PlaybackState::Paused,
            last_render: None,
            frame_queued: false,
        };
        session.invalidate();
        session
    }

    pub fn grapher(&self) -> &Grapher {
        &self.grapher
    }

    pub fn grapher_mut(&mut self) -> &mut Grapher {
        &mut self.grapher
    }

    pub fn current_time(&self) -> Micros {
        self.current_time
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn has_video(&self) -> bool {
        self.video.is_some()
    }

    pub fn video_offset(&self) -> f64 {
        self.video_offset
    }

    pub fn frame_queued(&self) -> bool {
        self.frame_queued
    }

    /// Bind a loaded video; playback pauses and the log follows the video clock.
    pub fn bind_video(&mut self, video: Box<dyn VideoPlayhead>) {
        self.video = Some(video);
        self.sync_to_video();
        tracing::debug!(offset = self.video_offset, time = self.current_time, "video bound");
        self.set_state(PlaybackState::Paused);
    }

    pub fn unbind_video(&mut self) -> Option<Box<dyn VideoPlayhead>> {
        let video = self.video.take();
        self.invalidate();
        video
    }

    fn log_time_for_video(&self, video_secs: f64) -> Micros {
        ((video_secs - self.video_offset) * MICROS_PER_SEC).round() as Micros + self.min_time
    }

    fn sync_to_video(&mut self) {
        if let Some(video) = &self.video {
            self.current_time = self.log_time_for_video(video.current_time());
        }
    }

    /// Render the frame for the current time.
    ///
    /// While playing, another frame is requested before returning.
    pub fn tick(&mut self, now: Instant) -> &Scene {
        self.frame_queued = false;

        if self.video.is_some() {
            self.sync_to_video();
        } else {
            let delta = self
                .last_render
                .map(|last| now.saturating_duration_since(last).as_micros() as Micros)
                .unwrap_or(0);
            self.current_time += delta;
            if self.state == PlaybackState::Playing && self.current_time > self.max_time {
                self.current_time = self.max_time;
                self.set_state(PlaybackState::Paused);
            }
        }

        if self.state == PlaybackState::Playing {
            self.last_render = Some(now);
            self.frame_queued = true;
            self.scheduler.request_frame();
        }
        self.grapher.render(self.current_time)
    }

    /// Queue one redraw unless one is already pending.
    pub fn invalidate(&mut self) {
        if !self.frame_queued {
            self.frame_queued = true;
            self.scheduler.request_frame();
        }
    }

    pub fn set_state(&mut self, state: PlaybackState) {
        self.state = state;
        self.last_render = None;
        if let Some(video) = self.video.as_mut() {
            match state {
                PlaybackState::Playing => video.play(),
                PlaybackState::Paused => video.pause(),
            }
        }
        self.invalidate();
    }

    pub fn play(&mut self) {
        self.set_state(PlaybackState::Playing);
    }

    pub fn pause(&mut self) {
        self.set_state(PlaybackState::Paused);
    }

    pub fn toggle_play(&mut self) {
        match self.state {
            PlaybackState::Paused => self.play(),
            PlaybackState::Playing => self.pause(),
        }
    }

    /// Move to a log time; a bound video is seeked to match.
    pub fn seek(&mut self, time: Micros) {
        let video_secs = (time - self.min_time) as f64 / MICROS_PER_SEC + self.video_offset;
        match self.video.as_mut() {
            Some(video) => {
                video.set_current_time(video_secs);
                self.sync_to_video();
            }
            None => self.current_time = time,
        }
        self.invalidate();
    }

    fn set_video_time(&mut self, secs: f64) {
        if let Some(video) = self.video.as_mut() {
            video.set_current_time(secs);
        }
        self.sync_to_video();
    }

    fn jump(&mut self, delta: Micros) {
        match self.video.as_ref().map(|v| v.current_time()) {
            Some(secs) => self.set_video_time(secs + delta as f64 / MICROS_PER_SEC),
            None => self.seek(self.current_time + delta),
        }
        self.pause();
    }

    pub fn jump_back(&mut self) {
        self.jump(-SMALL_JUMP);
    }

    pub fn jump_forward(&mut self) {
        self.jump(SMALL_JUMP);
    }

    pub fn jump_to_log_start(&mut self) {
        self.seek(self.min_time);
        self.pause();
    }

    pub fn jump_to_log_end(&mut self) {
        self.seek(self.max_time);
        self.pause();
    }

    pub fn jump_to_video_start(&mut self) {
        if self.video.is_some() {
            self.set_video_time(0.0);
            self.pause();
        }
    }

    pub fn jump_to_video_end(&mut self) {
        if let Some(duration) = self.video.as_ref().and_then(|v| v.duration()) {
            self.set_video_time(duration);
            self.pause();
        }
    }

    /// Seconds of video before the log's first frame. Non-finite offsets are ignored.
    pub fn set_video_offset(&mut self, offset: f64) {
        if !offset.is_finite() {
            return;
        }
        self.video_offset = offset;
        self.invalidate();
    }

    pub fn nudge_offset_back(&mut self) {
        self.set_video_offset(self.video_offset - OFFSET_NUDGE_SECS);
    }

    pub fn nudge_offset_forward(&mut self) {
        self.set_video_offset(self.video_offset + OFFSET_NUDGE_SECS);
    }

    /// Align the log start with the video's current position.
    pub fn sync_here(&mut self) {
        if let Some(secs) = self.video.as_ref().map(|v| v.current_time()) {
            self.set_video_offset(secs);
        }
    }

    /// Seek for a horizontal drag of `dx` pixels across the graph.
    pub fn drag(&mut self, dx: f64) {
        let delta = self.grapher.drag_seek_delta(dx);
        self.seek(self.current_time + delta);
    }

    pub fn set_graph_zoom(&mut self, zoom: f64) {
        self.grapher.set_graph_zoom(zoom);
        self.invalidate();
    }

    pub fn resize(&mut self, canvas: Canvas) {
        self.grapher.resize(canvas);
        self.invalidate();
    }
}

#[cfg(test)]
#[path = "../tests/unit/playback.rs"]
mod tests;
