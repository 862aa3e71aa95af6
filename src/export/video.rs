use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::export::ffmpeg::binary_on_path;
use crate::foundation::error::{BlackboxError, BlackboxResult};
use crate::render::cpu::premultiply_rgba8_in_place;
use crate::render::scene::RasterImage;

/// A seekable flight video drawn behind exported graphs.
///
/// Seeking is split in two so hosts with asynchronous decoders can report completion later; the
/// export pipeline suspends until `poll_seeked` yields a frame.
pub trait BackgroundVideo: Send {
    /// Start seeking to `secs` of video time. Negative times clamp to the start.
    fn begin_seek(&mut self, secs: f64) -> BlackboxResult<()>;

    /// The frame at the last requested time once the seek completed.
    fn poll_seeked(&mut self) -> BlackboxResult<Option<Arc<RasterImage>>>;
}

#[derive(Clone, Debug, PartialEq)]
pub struct VideoInfo {
    pub path: PathBuf,
    pub width: u32,
    pub height: u32,
    pub duration_secs: Option<f64>,
}

/// Probe a video file through `ffprobe`.
pub fn probe_video(path: &Path) -> BlackboxResult<VideoInfo> {
    #[derive(serde::Deserialize)]
    struct ProbeStream {
        codec_type: Option<String>,
        width: Option<u32>,
        height: Option<u32>,
    }
    #[derive(serde::Deserialize)]
    struct ProbeFormat {
        duration: Option<String>,
    }
    #[derive(serde::Deserialize)]
    struct ProbeOut {
        streams: Vec<ProbeStream>,
        format: Option<ProbeFormat>,
    }

    let out = std::process::Command::new("ffprobe")
        .args([
            "-v",
            "error",
            "-print_format",
            "json",
            "-show_streams",
            "-show_format",
        ])
        .arg(path)
        .output()
        .map_err(|e| BlackboxError::export(format!("failed to run ffprobe: {e}")))?;
    if !out.status.success() {
        return Err(BlackboxError::export(format!(
            "ffprobe failed for '{}': {}",
            path.display(),
            String::from_utf8_lossy(&out.stderr).trim()
        )));
    }

    let parsed: ProbeOut = serde_json::from_slice(&out.stdout)
        .map_err(|e| BlackboxError::export(format!("ffprobe json parse failed: {e}")))?;
    let stream = parsed
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("video"))
        .ok_or_else(|| BlackboxError::export("no video stream found"))?;
    let width = stream
        .width
        .ok_or_else(|| BlackboxError::export("missing video width from ffprobe"))?;
    let height = stream
        .height
        .ok_or_else(|| BlackboxError::export("missing video height from ffprobe"))?;
    let duration_secs = parsed
        .format
        .and_then(|f| f.duration)
        .and_then(|d| d.parse::<f64>().ok());

    Ok(VideoInfo {
        path: path.to_path_buf(),
        width,
        height,
        duration_secs,
    })
}

/// Background video decoded one frame per seek by the system `ffmpeg`, scaled to the export
/// canvas.
#[derive(Debug)]
pub struct FfmpegVideo {
    info: VideoInfo,
    out_width: u32,
    out_height: u32,
    pending: Option<f64>,
}

impl FfmpegVideo {
    pub fn open(path: &Path, out_width: u32, out_height: u32) -> BlackboxResult<Self> {
        if out_width == 0 || out_height == 0 {
            return Err(BlackboxError::validation(
                "video output width/height must be non-zero",
            ));
        }
        if !binary_on_path("ffprobe") {
            return Err(BlackboxError::export(
                "ffprobe is required for background video, but was not found on PATH",
            ));
        }
        let info = probe_video(path)?;
        tracing::debug!(
            path = %path.display(),
            width = info.width,
            height = info.height,
            duration = ?info.duration_secs,
            "background video probed"
        );
        Ok(Self {
            info,
            out_width,
            out_height,
            pending: None,
        })
    }

    pub fn info(&self) -> &VideoInfo {
        &self.info
    }

    fn decode_at(&self, secs: f64) -> BlackboxResult<Vec<u8>> {
        let out = std::process::Command::new("ffmpeg")
            .args(["-v", "error", "-ss", &format!("{secs:.9}")])
            .arg("-i")
            .arg(&self.info.path)
            .args([
                "-frames:v",
                "1",
                "-vf",
                &format!("scale={}:{}", self.out_width, self.out_height),
                "-f",
                "rawvideo",
                "-pix_fmt",
                "rgba",
                "pipe:1",
            ])
            .output()
            .map_err(|e| {
                BlackboxError::export(format!("failed to run ffmpeg for video decode: {e}"))
            })?;
        if !out.status.success() {
            return Err(BlackboxError::export(format!(
                "ffmpeg video decode failed for '{}': {}",
                self.info.path.display(),
                String::from_utf8_lossy(&out.stderr).trim()
            )));
        }
        Ok(out.stdout)
    }
}

impl BackgroundVideo for FfmpegVideo {
    fn begin_seek(&mut self, secs: f64) -> BlackboxResult<()> {
        let secs = if secs.is_finite() { secs.max(0.0) } else { 0.0 };
        self.pending = Some(secs);
        Ok(())
    }

    fn poll_seeked(&mut self) -> BlackboxResult<Option<Arc<RasterImage>>> {
        let Some(secs) = self.pending.take() else {
            return Ok(None);
        };
        let expected = self.out_width as usize * self.out_height as usize * 4;
        let mut data = self.decode_at(secs)?;
        if data.is_empty() {
            // Past the end of the video: nothing underneath.
            data = vec![0; expected];
        } else if data.len() < expected {
            return Err(BlackboxError::export(format!(
                "decoded video frame has invalid size: got {} bytes, expected {expected}",
                data.len()
            )));
        }
        data.truncate(expected);
        premultiply_rgba8_in_place(&mut data);
        Ok(Some(Arc::new(RasterImage {
            width: self.out_width,
            height: self.out_height,
            data,
        })))
    }
}
