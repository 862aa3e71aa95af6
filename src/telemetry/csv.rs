//! Loader for decoded blackbox CSV exports.
//!
//! The decoder writes one header row of field names followed by one row per main frame. The
//! `loopIteration` and `time (us)` columns become frame metadata; every other column becomes a
//! field. Cells that do not parse as numbers load as `NaN` and are skipped by the renderer.

use std::{io::Read, path::Path};

use anyhow::Context as _;

use crate::{
    foundation::core::Micros,
    foundation::error::{BlackboxError, BlackboxResult},
    telemetry::memory::{DEFAULT_CHUNK_SIZE, FlightLog},
    telemetry::source::{SysConfig, TelemetrySource},
};

const ITERATION_COLUMN: &str = "loopIteration";
const TIME_COLUMN: &str = "time (us)";

#[derive(Clone, Debug)]
pub struct CsvOptions {
    pub chunk_size: usize,
    pub sys_config: SysConfig,
    /// A time step larger than this marks a gap.
    pub max_time_step: Micros,
    /// An iteration step larger than this multiple of the smallest step seen marks a gap.
    pub max_iteration_jump: u64,
}

impl Default for CsvOptions {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            sys_config: SysConfig::default(),
            max_time_step: 100_000,
            max_iteration_jump: 4,
        }
    }
}

/// Load a decoded CSV file from disk.
#[tracing::instrument(skip(opts), fields(path = %path.display()))]
pub fn load_csv(path: &Path, opts: &CsvOptions) -> BlackboxResult<FlightLog> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("failed to open log '{}'", path.display()))?;
    read_csv(file, opts)
}

/// Read a decoded CSV from any reader.
pub fn read_csv<R: Read>(reader: R, opts: &CsvOptions) -> BlackboxResult<FlightLog> {
    let mut rdr = csv::ReaderBuilder::new()
        .trim(csv::Trim::All)
        .flexible(false)
        .from_reader(reader);

    let headers = rdr
        .headers()
        .map_err(|e| BlackboxError::telemetry(format!("failed to read CSV header: {e}")))?
        .clone();

    let iter_col = headers.iter().position(|h| h == ITERATION_COLUMN);
    let time_col = headers
        .iter()
        .position(|h| h == TIME_COLUMN)
        .ok_or_else(|| BlackboxError::telemetry(format!("CSV has no '{TIME_COLUMN}' column")))?;

    let field_cols: Vec<usize> = (0..headers.len())
        .filter(|&i| Some(i) != iter_col && i != time_col)
        .collect();
    let field_names = field_cols.iter().map(|&i| headers[i].to_string()).collect();

    let mut builder = FlightLog::builder(field_names)
        .chunk_size(opts.chunk_size)
        .sys_config(opts.sys_config.clone());

    let mut prev: Option<(u64, Micros)> = None;
    let mut min_iter_step: Option<u64> = None;
    let mut skipped = 0usize;

    for (row, record) in rdr.records().enumerate() {
        let record = record
            .map_err(|e| BlackboxError::telemetry(format!("CSV row {}: {e}", row + 2)))?;

        let Some(time) = record.get(time_col).and_then(|s| s.parse::<Micros>().ok()) else {
            skipped += 1;
            continue;
        };
        let iteration = match iter_col {
            Some(c) => record.get(c).and_then(|s| s.parse::<u64>().ok()).unwrap_or(row as u64),
            None => row as u64,
        };

        if let Some((prev_iter, prev_time)) = prev {
            if time < prev_time {
                // Time cannot go backwards inside one log; drop the row and break the trace.
                skipped += 1;
                builder.mark_gap();
                continue;
            }
            let iter_step = iteration.checked_sub(prev_iter);
            let jumped = match (iter_step, min_iter_step) {
                (None, _) => true,
                (Some(step), Some(min)) => step > min.saturating_mul(opts.max_iteration_jump),
                (Some(_), None) => false,
            };
            if jumped || time - prev_time > opts.max_time_step {
                builder.mark_gap();
            }
            if let Some(step) = iter_step.filter(|&s| s > 0) {
                min_iter_step = Some(min_iter_step.map_or(step, |m| m.min(step)));
            }
        }

        let values = field_cols
            .iter()
            .map(|&c| {
                record
                    .get(c)
                    .and_then(|s| s.parse::<f64>().ok())
                    .unwrap_or(f64::NAN)
            })
            .collect();
        builder.push_frame(iteration, time, values)?;
        prev = Some((iteration, time));
    }

    if skipped > 0 {
        tracing::warn!(skipped, "skipped CSV rows with missing or backwards timestamps");
    }
    let log = builder.build()?;
    tracing::info!(
        fields = log.field_names().len(),
        frames = log.frame_count(),
        "loaded blackbox CSV"
    );
    Ok(log)
}

#[cfg(test)]
#[path = "../../tests/unit/telemetry/csv.rs"]
mod tests;
