//! Blackbox-render draws flight-controller blackbox telemetry as scrolling graphs with overlays
//! and exports it frame-accurately to video.
//!
//! - Load a log into a [`TelemetrySource`](telemetry::TelemetrySource) (e.g. [`telemetry::load_csv`])
//! - Describe tracks with a [`GraphConfig`](graph::GraphConfig)
//! - Render single frames with a [`Grapher`](render::Grapher) and a [`RasterBackend`](render::RasterBackend)
//! - Drive live viewing with a [`PlaybackSession`](playback::PlaybackSession) or export a range
//!   with an [`ExportJob`](export::ExportJob)
#![forbid(unsafe_code)]

mod foundation;

pub mod config;
pub mod export;
pub mod graph;
pub mod playback;
pub mod render;
pub mod telemetry;

pub use crate::foundation::core::{
    Affine, BezPath, Canvas, Fps, FrameIndex, MICROS_PER_SEC, Micros, Point, Rect, Rgba8, Vec2,
};
pub use crate::foundation::error::{BlackboxError, BlackboxResult};
pub use crate::foundation::format::{format_filesize, format_time, left_pad, set_file_extension};
