use std::time::Duration;

/// Export progress as shown to the user: completion, time remaining and expected output size.
#[derive(Clone, Debug, PartialEq)]
pub struct ProgressEstimate {
    /// Frames done, counting the current one.
    pub frames_done: u64,
    pub frame_count: u64,
    pub percent: f64,
    /// Unknown until the second frame.
    pub remaining: Option<Duration>,
    /// Unknown until the second frame.
    pub estimated_bytes: Option<u64>,
}

impl ProgressEstimate {
    /// Extrapolate from the progress of `frame_index` (0-based) after `elapsed`.
    pub fn new(frame_index: u64, frame_count: u64, bytes_written: u64, elapsed: Duration) -> Self {
        let frames_done = frame_index + 1;
        let percent = if frame_count == 0 {
            100.0
        } else {
            frames_done as f64 / frame_count as f64 * 100.0
        };

        let (remaining, estimated_bytes) = if frame_index > 0 {
            let ratio = frame_count as f64 / frame_index as f64;
            let estimated = elapsed.as_secs_f64() * ratio;
            let remaining = (estimated - elapsed.as_secs_f64()).max(0.0);
            (
                Some(Duration::from_secs_f64(remaining)),
                Some((ratio * bytes_written as f64).round() as u64),
            )
        } else {
            (None, None)
        };

        Self {
            frames_done,
            frame_count,
            percent,
            remaining,
            estimated_bytes,
        }
    }
}

/// Size estimates are only worth showing past this many written bytes.
pub const SIZE_ESTIMATE_MIN_BYTES: u64 = 1_000_000;

/// Tracks which size estimate was last shown so an unchanged value is not repeated.
#[derive(Clone, Debug, Default)]
pub struct SizeEstimateFilter {
    last: Option<u64>,
}

impl SizeEstimateFilter {
    /// The estimate to display, if it is large enough and differs from the last one shown.
    pub fn update(&mut self, estimate: &ProgressEstimate, bytes_written: u64) -> Option<u64> {
        let bytes = estimate.estimated_bytes?;
        if bytes_written <= SIZE_ESTIMATE_MIN_BYTES || self.last == Some(bytes) {
            return None;
        }
        self.last = Some(bytes);
        Some(bytes)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/export/progress.rs"]
mod tests;
