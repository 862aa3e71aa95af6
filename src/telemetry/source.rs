use std::{collections::BTreeMap, sync::Arc};

use crate::foundation::core::Micros;

/// Per-field smoothing intervals keyed by buffer index.
pub type SmoothingMap = BTreeMap<usize, Micros>;

/// One timestamped row of field values.
#[derive(Clone, Debug, PartialEq)]
pub struct Frame {
    /// Flight controller loop iteration counter.
    pub iteration: u64,
    /// Timestamp in microseconds.
    pub time: Micros,
    /// Field values, indexed by the source's field catalog.
    pub values: Vec<f64>,
}

impl Frame {
    pub fn value(&self, index: usize) -> Option<f64> {
        self.values.get(index).copied()
    }
}

/// Logged discrete event.
#[derive(Clone, Debug, PartialEq)]
pub struct LogEvent {
    pub time: Micros,
    pub kind: EventKind,
}

#[derive(Clone, Debug, PartialEq)]
pub enum EventKind {
    SyncBeep,
    AutotuneTargets,
    GtuneCycleResult { axis: u8, gyro_avg: i32, new_p: i32 },
    InflightAdjustment { name: String, value: f64 },
    LoggingResume,
    /// Any event code the renderer has no dedicated style for.
    Other { code: u8 },
}

/// Contiguous batch of frames with aligned gap flags and the events logged in its span.
///
/// `gap_starts_here[i]` is set when frame `i` follows a discontinuity: data between frame
/// `i - 1` (possibly the last frame of the previous chunk) and frame `i` was lost.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Chunk {
    pub frames: Vec<Frame>,
    pub gap_starts_here: Vec<bool>,
    pub events: Vec<LogEvent>,
}

impl Chunk {
    pub fn gap_before(&self, index: usize) -> bool {
        self.gap_starts_here.get(index).copied().unwrap_or(false)
    }
}

/// Craft configuration recorded in the log header.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct SysConfig {
    pub min_throttle: f64,
    pub max_throttle: f64,
    pub min_servo: f64,
    pub max_servo: f64,
    pub rc_rate: f64,
    /// Gyro scale in radians per microsecond per raw unit.
    pub gyro_scale: f64,
}

impl Default for SysConfig {
    fn default() -> Self {
        Self {
            min_throttle: 1150.0,
            max_throttle: 1850.0,
            min_servo: 1000.0,
            max_servo: 2000.0,
            rc_rate: 100.0,
            // MPU6050 at 2000 deg/s full scale.
            gyro_scale: (4.0 / 65.536) * (std::f64::consts::PI / 180.0) * 1e-6,
        }
    }
}

/// Time-ordered telemetry store consumed by the renderer and the export pipeline.
///
/// Sources are shared between renderers through `Arc`, so smoothing is set through `&self`.
pub trait TelemetrySource: Send + Sync {
    /// Main field names in buffer order.
    fn field_names(&self) -> &[String];

    fn field_index_by_name(&self, name: &str) -> Option<usize> {
        self.field_names().iter().position(|n| n == name)
    }

    fn min_time(&self) -> Micros;

    fn max_time(&self) -> Micros;

    /// Chunks overlapping `[start, end]`, in time order, with smoothing applied.
    fn chunks_in_time_range(&self, start: Micros, end: Micros) -> Vec<Arc<Chunk>>;

    /// Smoothed frame nearest to `time`, or `None` outside the logged range.
    fn frame_at_time(&self, time: Micros) -> Option<Frame>;

    /// Replace the smoothing intervals applied to future chunk reads.
    fn set_field_smoothing(&self, smoothing: SmoothingMap);

    fn sys_config(&self) -> SysConfig {
        SysConfig::default()
    }
}
