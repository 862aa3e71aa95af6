use std::path::{Path, PathBuf};

use crate::config::layout::LayoutConfig;
use crate::export::ffmpeg::{ContainerCodec, FfmpegSink, FfmpegSinkOpts};
use crate::export::images::{FrameFilenames, ImageSequenceSink};
use crate::export::sink::FrameSink;
use crate::foundation::core::{Canvas, Fps, Micros};
use crate::foundation::error::{BlackboxError, BlackboxResult};
use crate::graph::config::GraphConfig;
use crate::render::grapher::Background;
use crate::telemetry::source::TelemetrySource;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Webm,
    Mp4,
    /// One PNG per frame.
    Png,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            Self::Webm => "webm",
            Self::Mp4 => "mp4",
            Self::Png => "png",
        }
    }

    pub fn is_container(self) -> bool {
        self.container_codec().is_some()
    }

    /// Codec and muxer for video formats; `None` for image sequences.
    pub fn container_codec(self) -> Option<ContainerCodec> {
        match self {
            Self::Webm => Some(ContainerCodec::Vp9Webm),
            Self::Mp4 => Some(ContainerCodec::H264),
            Self::Png => None,
        }
    }

    /// Background for frames of this format: video underneath when one is bound, otherwise an
    /// opaque fill for containers and transparency for images.
    pub fn background(self, has_video: bool) -> Background {
        if has_video {
            Background::None
        } else if self.is_container() {
            Background::Fill
        } else {
            Background::Clear
        }
    }
}

/// Persisted export preferences.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ExportSettings {
    pub frame_rate: u32,
    pub width: u32,
    pub height: u32,
    /// Darkening over the background video, `0.0..=1.0`. `1.0` hides the video entirely.
    pub video_dim: f64,
    pub format: ExportFormat,
    /// Layout preset to render with; `None` uses the current layout.
    pub layout_preset_name: Option<String>,
}

impl Default for ExportSettings {
    fn default() -> Self {
        Self {
            frame_rate: 30,
            width: 1280,
            height: 720,
            video_dim: 0.4,
            format: ExportFormat::Webm,
            layout_preset_name: None,
        }
    }
}

impl ExportSettings {
    pub fn fps(&self) -> BlackboxResult<Fps> {
        Fps::new(self.frame_rate, 1)
    }

    pub fn canvas(&self) -> BlackboxResult<Canvas> {
        Canvas::new(self.width, self.height)
    }

    pub fn from_json_str(s: &str) -> BlackboxResult<Self> {
        Ok(serde_json::from_str(s)?)
    }

    pub fn to_json_string(&self) -> BlackboxResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// Everything an export needs apart from the telemetry, the sink and the background video.
#[derive(Clone, Debug, PartialEq)]
pub struct ExportRequest {
    /// Defaults to the log's first timestamp.
    pub in_time: Option<Micros>,
    /// Defaults to the log's last timestamp.
    pub out_time: Option<Micros>,
    pub graph_config: GraphConfig,
    pub layout: LayoutConfig,
    /// Seconds added to log-relative time when seeking the background video.
    pub video_offset: f64,
    pub settings: ExportSettings,
    pub output_path: PathBuf,
}

impl ExportRequest {
    pub fn new(graph_config: GraphConfig, output_path: impl Into<PathBuf>) -> Self {
        Self {
            in_time: None,
            out_time: None,
            graph_config,
            layout: LayoutConfig::default(),
            video_offset: 0.0,
            settings: ExportSettings::default(),
            output_path: output_path.into(),
        }
    }

    /// Resolve times, frame count and background against a telemetry source.
    pub fn plan(&self, source: &dyn TelemetrySource, has_video: bool) -> BlackboxResult<ExportPlan> {
        let fps = self.settings.fps()?;
        let canvas = self.settings.canvas()?;
        let dim = self.settings.video_dim;
        if !dim.is_finite() || !(0.0..=1.0).contains(&dim) {
            return Err(BlackboxError::validation(format!(
                "video dim must be within 0..=1, got {dim}"
            )));
        }

        let in_time = self.in_time.unwrap_or_else(|| source.min_time());
        let out_time = self.out_time.unwrap_or_else(|| source.max_time());
        let frame_duration = fps.frame_duration_micros();
        let frame_count = frame_count_for(in_time, out_time, frame_duration);

        let has_video = has_video && dim < 1.0;
        Ok(ExportPlan {
            in_time,
            out_time,
            log_start: source.min_time(),
            frame_duration,
            frame_count,
            fps,
            canvas,
            background: self.settings.format.background(has_video),
            has_video,
            video_dim: dim,
            video_offset: self.video_offset,
        })
    }

    /// Open the sink matching the requested format. Nothing is written until `begin`.
    pub fn open_sink(&self) -> Box<dyn FrameSink> {
        open_sink(self.settings.format, &self.output_path)
    }
}

/// Sink for `format`. Containers are muxed as `format` whatever the path's extension says.
pub fn open_sink(format: ExportFormat, output_path: &Path) -> Box<dyn FrameSink> {
    match container_opts(format, output_path) {
        Some(opts) => Box::new(FfmpegSink::new(opts)),
        None => {
            let default_ext = format!(".{}", format.extension());
            Box::new(ImageSequenceSink::new(FrameFilenames::from_output_path(
                output_path,
                &default_ext,
            )))
        }
    }
}

pub(crate) fn container_opts(format: ExportFormat, output_path: &Path) -> Option<FfmpegSinkOpts> {
    format
        .container_codec()
        .map(|codec| FfmpegSinkOpts::new(output_path).with_codec(codec))
}

/// Number of output frames covering `[in_time, out_time]`, rounding a partial last frame.
pub fn frame_count_for(in_time: Micros, out_time: Micros, frame_duration: f64) -> u64 {
    if frame_duration <= 0.0 || out_time <= in_time {
        return 0;
    }
    ((out_time - in_time) as f64 / frame_duration).round() as u64
}

/// Resolved export parameters.
#[derive(Clone, Debug, PartialEq)]
pub struct ExportPlan {
    pub in_time: Micros,
    pub out_time: Micros,
    /// Log start, the origin of video time.
    pub log_start: Micros,
    pub frame_duration: f64,
    pub frame_count: u64,
    pub fps: Fps,
    pub canvas: Canvas,
    pub background: Background,
    /// False when no video was bound or the dim hides it completely.
    pub has_video: bool,
    pub video_dim: f64,
    pub video_offset: f64,
}

impl ExportPlan {
    /// Video time, in seconds, matching a telemetry time.
    pub fn video_time(&self, frame_time: f64) -> f64 {
        (frame_time - self.log_start as f64) / 1_000_000.0 + self.video_offset
    }
}

#[cfg(test)]
#[path = "../../tests/unit/export/job.rs"]
mod tests;
