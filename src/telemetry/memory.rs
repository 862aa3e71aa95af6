use std::sync::{Arc, RwLock};

use crate::{
    foundation::core::Micros,
    foundation::error::{BlackboxError, BlackboxResult},
    telemetry::source::{Chunk, Frame, LogEvent, SmoothingMap, SysConfig, TelemetrySource},
};

/// Frames per chunk handed out by [`FlightLog`].
pub const DEFAULT_CHUNK_SIZE: usize = 256;

/// In-memory decoded flight log.
///
/// Frames are kept in full and handed out in fixed-size chunks. Smoothing is a centred moving
/// average over each configured interval, computed eagerly when the map changes and never
/// averaged across a gap.
pub struct FlightLog {
    field_names: Vec<String>,
    frames: Vec<Frame>,
    gap_flags: Vec<bool>,
    events: Vec<LogEvent>,
    chunk_size: usize,
    sys_config: SysConfig,
    smoothed: RwLock<SmoothedView>,
}

struct SmoothedView {
    map: SmoothingMap,
    frames: Vec<Frame>,
    chunks: Vec<Arc<Chunk>>,
    chunk_starts: Vec<Micros>,
}

impl std::fmt::Debug for FlightLog {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FlightLog")
            .field("fields", &self.field_names.len())
            .field("frames", &self.frames.len())
            .field("events", &self.events.len())
            .field("chunk_size", &self.chunk_size)
            .finish()
    }
}

impl FlightLog {
    pub fn builder(field_names: Vec<String>) -> FlightLogBuilder {
        FlightLogBuilder::new(field_names)
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    pub fn events(&self) -> &[LogEvent] {
        &self.events
    }

    /// Raw (unsmoothed) frames.
    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    fn read_view(&self) -> std::sync::RwLockReadGuard<'_, SmoothedView> {
        self.smoothed.read().unwrap_or_else(|e| e.into_inner())
    }

    fn build_view(&self, map: SmoothingMap) -> SmoothedView {
        let frames = smooth_frames(&self.frames, &self.gap_flags, &map, self.field_names.len());
        let (chunks, chunk_starts) =
            build_chunks(&frames, &self.gap_flags, &self.events, self.chunk_size);
        SmoothedView {
            map,
            frames,
            chunks,
            chunk_starts,
        }
    }
}

impl TelemetrySource for FlightLog {
    fn field_names(&self) -> &[String] {
        &self.field_names
    }

    fn min_time(&self) -> Micros {
        self.frames.first().map(|f| f.time).unwrap_or(0)
    }

    fn max_time(&self) -> Micros {
        self.frames.last().map(|f| f.time).unwrap_or(0)
    }

    fn chunks_in_time_range(&self, start: Micros, end: Micros) -> Vec<Arc<Chunk>> {
        if self.frames.is_empty() || end < start || end < self.min_time() || start > self.max_time()
        {
            return Vec::new();
        }
        let view = self.read_view();
        let first = view
            .chunk_starts
            .partition_point(|&t| t <= start)
            .saturating_sub(1);
        let last = view
            .chunk_starts
            .partition_point(|&t| t <= end)
            .saturating_sub(1);
        view.chunks[first..=last.max(first)].to_vec()
    }

    fn frame_at_time(&self, time: Micros) -> Option<Frame> {
        if self.frames.is_empty() || time < self.min_time() || time > self.max_time() {
            return None;
        }
        let view = self.read_view();
        let idx = view.frames.partition_point(|f| f.time < time);
        let after = view.frames.get(idx);
        let before = idx.checked_sub(1).and_then(|i| view.frames.get(i));
        match (before, after) {
            (Some(b), Some(a)) => {
                if (time - b.time) <= (a.time - time) {
                    Some(b.clone())
                } else {
                    Some(a.clone())
                }
            }
            (Some(f), None) | (None, Some(f)) => Some(f.clone()),
            (None, None) => None,
        }
    }

    fn set_field_smoothing(&self, smoothing: SmoothingMap) {
        if self.read_view().map == smoothing {
            return;
        }
        let view = self.build_view(smoothing);
        let mut guard = self.smoothed.write().unwrap_or_else(|e| e.into_inner());
        *guard = view;
    }

    fn sys_config(&self) -> SysConfig {
        self.sys_config.clone()
    }
}

/// Incremental builder for [`FlightLog`].
#[derive(Debug)]
pub struct FlightLogBuilder {
    field_names: Vec<String>,
    frames: Vec<Frame>,
    gap_flags: Vec<bool>,
    events: Vec<LogEvent>,
    chunk_size: usize,
    sys_config: SysConfig,
    pending_gap: bool,
}

impl FlightLogBuilder {
    pub fn new(field_names: Vec<String>) -> Self {
        Self {
            field_names,
            frames: Vec::new(),
            gap_flags: Vec::new(),
            events: Vec::new(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            sys_config: SysConfig::default(),
            pending_gap: false,
        }
    }

    pub fn chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    pub fn sys_config(mut self, sys_config: SysConfig) -> Self {
        self.sys_config = sys_config;
        self
    }

    /// Flag the next pushed frame as following a gap.
    pub fn mark_gap(&mut self) {
        if !self.frames.is_empty() {
            self.pending_gap = true;
        }
    }

    pub fn push_frame(&mut self, iteration: u64, time: Micros, values: Vec<f64>) -> BlackboxResult<()> {
        if values.len() != self.field_names.len() {
            return Err(BlackboxError::telemetry(format!(
                "frame has {} values, expected {}",
                values.len(),
                self.field_names.len()
            )));
        }
        if let Some(last) = self.frames.last()
            && time < last.time
        {
            return Err(BlackboxError::telemetry(format!(
                "frame time {time} goes backwards (previous {})",
                last.time
            )));
        }
        self.frames.push(Frame {
            iteration,
            time,
            values,
        });
        self.gap_flags.push(std::mem::take(&mut self.pending_gap));
        Ok(())
    }

    pub fn push_event(&mut self, event: LogEvent) {
        self.events.push(event);
    }

    pub fn build(mut self) -> BlackboxResult<FlightLog> {
        if self.frames.is_empty() {
            return Err(BlackboxError::telemetry("log contains no frames"));
        }
        self.events.sort_by_key(|e| e.time);

        let mut log = FlightLog {
            field_names: self.field_names,
            frames: self.frames,
            gap_flags: self.gap_flags,
            events: self.events,
            chunk_size: self.chunk_size,
            sys_config: self.sys_config,
            smoothed: RwLock::new(SmoothedView {
                map: SmoothingMap::new(),
                frames: Vec::new(),
                chunks: Vec::new(),
                chunk_starts: Vec::new(),
            }),
        };
        let view = log.build_view(SmoothingMap::new());
        *log.smoothed.get_mut().unwrap_or_else(|e| e.into_inner()) = view;
        Ok(log)
    }
}

fn smooth_frames(
    frames: &[Frame],
    gap_flags: &[bool],
    smoothing: &SmoothingMap,
    width: usize,
) -> Vec<Frame> {
    let mut out = frames.to_vec();
    if smoothing.is_empty() {
        return out;
    }

    let mut seg_start = 0;
    for end in 1..=frames.len() {
        let boundary = end == frames.len() || gap_flags.get(end).copied().unwrap_or(false);
        if boundary {
            for (&field, &interval) in smoothing {
                if field >= width || interval <= 0 {
                    continue;
                }
                smooth_segment(&frames[seg_start..end], &mut out[seg_start..end], field, interval);
            }
            seg_start = end;
        }
    }
    out
}

fn smooth_segment(src: &[Frame], dst: &mut [Frame], field: usize, interval: Micros) {
    let radius = interval / 2;
    let value = |f: &Frame| f.values[field];
    let (mut lo, mut hi) = (0usize, 0usize);
    let mut sum = 0.0;

    for (i, frame) in src.iter().enumerate() {
        while hi < src.len() && src[hi].time <= frame.time + radius {
            sum += value(&src[hi]);
            hi += 1;
        }
        while src[lo].time < frame.time - radius {
            sum -= value(&src[lo]);
            lo += 1;
        }
        dst[i].values[field] = sum / (hi - lo) as f64;
    }
}

fn build_chunks(
    frames: &[Frame],
    gap_flags: &[bool],
    events: &[LogEvent],
    chunk_size: usize,
) -> (Vec<Arc<Chunk>>, Vec<Micros>) {
    let starts: Vec<Micros> = frames.chunks(chunk_size).map(|c| c[0].time).collect();
    let mut chunks = Vec::with_capacity(starts.len());

    for (i, (frame_chunk, gap_chunk)) in frames
        .chunks(chunk_size)
        .zip(gap_flags.chunks(chunk_size))
        .enumerate()
    {
        let span_start = if i == 0 { Micros::MIN } else { starts[i] };
        let span_end = starts.get(i + 1).copied().unwrap_or(Micros::MAX);
        let chunk_events = events
            .iter()
            .filter(|e| e.time >= span_start && e.time < span_end)
            .cloned()
            .collect();
        chunks.push(Arc::new(Chunk {
            frames: frame_chunk.to_vec(),
            gap_starts_here: gap_chunk.to_vec(),
            events: chunk_events,
        }));
    }
    (chunks, starts)
}

#[cfg(test)]
#[path = "../../tests/unit/telemetry/memory.rs"]
mod tests;
