//! Offline export of a telemetry range to a video container or an image sequence.

pub mod ffmpeg;
pub mod images;
pub mod job;
pub mod pipeline;
pub mod progress;
pub mod sink;
pub mod video;

pub use ffmpeg::{ContainerCodec, FfmpegSink, FfmpegSinkOpts, is_ffmpeg_on_path};
pub use images::{FrameFilenames, ImageSequenceSink};
pub use job::{ExportFormat, ExportPlan, ExportRequest, ExportSettings, frame_count_for, open_sink};
pub use pipeline::{
    BACKGROUND_BATCH, CancelToken, ExportEvent, ExportJob, ExportOutcome, ExportState,
    FOCUSED_BATCH, StepStatus,
};
pub use progress::{ProgressEstimate, SizeEstimateFilter};
pub use sink::{FrameSink, InMemorySink, SinkConfig};
pub use video::{BackgroundVideo, FfmpegVideo, VideoInfo, probe_video};
