//! Telemetry sources: the chunked, time-ordered store the renderer reads from.

pub mod catalog;
pub mod csv;
pub mod memory;
pub mod source;

pub use catalog::{FieldCatalog, friendly_field_name};
pub use csv::{CsvOptions, load_csv, read_csv};
pub use memory::{FlightLog, FlightLogBuilder};
pub use source::{Chunk, EventKind, Frame, LogEvent, SmoothingMap, SysConfig, TelemetrySource};
