use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, Command, ExitStatus, Stdio};
use std::thread::JoinHandle;

use crate::export::sink::{FrameSink, SinkConfig};
use crate::foundation::core::FrameIndex;
use crate::foundation::error::{BlackboxError, BlackboxResult};
use crate::foundation::math::mul_div255_u16;
use crate::render::backend::FrameRGBA;

/// Frames between output-size polls.
const SIZE_POLL_FRAMES: u64 = 15;

/// Video codec and muxer written by [`FfmpegSink`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ContainerCodec {
    /// VP9 in WebM.
    Vp9Webm,
    /// H.264 in MP4.
    H264,
}

impl ContainerCodec {
    /// Guess from the output extension: `.webm` is VP9, anything else H.264.
    pub fn for_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("webm") => Self::Vp9Webm,
            _ => Self::H264,
        }
    }

    /// ffmpeg muxer name, passed as `-f` so the extension never decides the container.
    pub fn muxer(self) -> &'static str {
        match self {
            Self::Vp9Webm => "webm",
            Self::H264 => "mp4",
        }
    }

    fn encoder_args(self) -> &'static [&'static str] {
        match self {
            Self::Vp9Webm => &["-c:v", "libvpx-vp9", "-b:v", "0", "-crf", "32"],
            Self::H264 => &["-c:v", "libx264", "-movflags", "+faststart"],
        }
    }
}

/// Options for [`FfmpegSink`].
#[derive(Clone, Debug)]
pub struct FfmpegSinkOpts {
    pub out_path: PathBuf,
    pub codec: ContainerCodec,
    /// Replace an existing output file.
    pub overwrite: bool,
    /// Opaque colour that transparent pixels are flattened onto.
    pub bg_rgba: [u8; 4],
}

impl FfmpegSinkOpts {
    /// Codec guessed from the extension; see [`FfmpegSinkOpts::with_codec`].
    pub fn new(out_path: impl Into<PathBuf>) -> Self {
        let out_path = out_path.into();
        Self {
            codec: ContainerCodec::for_path(&out_path),
            out_path,
            overwrite: true,
            bg_rgba: [0, 0, 0, 255],
        }
    }

    pub fn with_codec(mut self, codec: ContainerCodec) -> Self {
        self.codec = codec;
        self
    }

    /// The full ffmpeg invocation for a raw RGBA stream of `cfg`.
    pub(crate) fn command(&self, cfg: &SinkConfig) -> Command {
        let mut cmd = Command::new("ffmpeg");
        cmd.arg(if self.overwrite { "-y" } else { "-n" });
        cmd.args(["-loglevel", "error", "-f", "rawvideo", "-pix_fmt", "rgba"]);
        cmd.arg("-s").arg(format!("{}x{}", cfg.width, cfg.height));
        // `-r` ahead of `-i` is the input rate of the raw stream.
        cmd.arg("-r").arg(format!("{}/{}", cfg.fps.num, cfg.fps.den));
        cmd.args(["-i", "pipe:0", "-an", "-pix_fmt", "yuv420p"]);
        cmd.args(self.codec.encoder_args());
        cmd.args(["-f", self.codec.muxer()]);
        cmd.arg(&self.out_path);
        cmd
    }
}

/// A running ffmpeg child fed through its stdin.
///
/// Dropping an encoder that was never finished kills and reaps the child.
pub(crate) struct Encoder {
    child: Child,
    stdin: Option<ChildStdin>,
    stderr: Option<JoinHandle<std::io::Result<Vec<u8>>>>,
    reaped: bool,
}

impl Encoder {
    pub(crate) fn spawn(mut cmd: Command) -> BlackboxResult<Self> {
        let child = cmd
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| BlackboxError::export(format!("failed to spawn ffmpeg: {e}")))?;
        let mut enc = Self {
            child,
            stdin: None,
            stderr: None,
            reaped: false,
        };

        enc.stdin = enc.child.stdin.take();
        let mut stderr = enc
            .child
            .stderr
            .take()
            .ok_or_else(|| BlackboxError::export("ffmpeg stderr is not piped"))?;
        if enc.stdin.is_none() {
            return Err(BlackboxError::export("ffmpeg stdin is not piped"));
        }
        // ffmpeg blocks once its stderr pipe fills, so drain it alongside the writes.
        enc.stderr = Some(std::thread::spawn(move || {
            let mut buf = Vec::new();
            stderr.read_to_end(&mut buf).map(|_| buf)
        }));
        Ok(enc)
    }

    pub(crate) fn write(&mut self, bytes: &[u8]) -> BlackboxResult<()> {
        let stdin = self
            .stdin
            .as_mut()
            .ok_or_else(|| BlackboxError::export("ffmpeg input already closed"))?;
        stdin
            .write_all(bytes)
            .map_err(|e| BlackboxError::export(format!("ffmpeg stopped accepting frames: {e}")))
    }

    /// Close the input, wait for the encoder and report a failed exit with its stderr.
    pub(crate) fn finish(mut self) -> BlackboxResult<()> {
        drop(self.stdin.take());
        let status = self.child.wait();
        self.reaped = true;
        let status =
            status.map_err(|e| BlackboxError::export(format!("failed to wait for ffmpeg: {e}")))?;

        let stderr = match self.stderr.take().map(JoinHandle::join) {
            Some(Ok(Ok(bytes))) => String::from_utf8_lossy(&bytes).trim().to_string(),
            _ => String::new(),
        };
        if !status.success() {
            return Err(BlackboxError::export(format!(
                "ffmpeg exited with {status}: {stderr}"
            )));
        }
        Ok(())
    }

    /// Kill the child and reap it. Returns its exit status when one could be collected.
    pub(crate) fn abort(mut self) -> Option<ExitStatus> {
        self.kill_and_reap()
    }

    fn kill_and_reap(&mut self) -> Option<ExitStatus> {
        if self.reaped {
            return None;
        }
        self.reaped = true;
        if let Err(e) = self.child.kill() {
            tracing::debug!(error = %e, "ffmpeg already exited");
        }
        drop(self.stdin.take());
        let status = self.child.wait().ok();
        if let Some(handle) = self.stderr.take() {
            let _ = handle.join();
        }
        status
    }
}

impl Drop for Encoder {
    fn drop(&mut self) {
        if !self.reaped {
            tracing::warn!("ffmpeg encoder dropped before finishing; killing it");
            self.kill_and_reap();
        }
    }
}

/// Streams flattened RGBA frames into a system `ffmpeg` that writes WebM or MP4.
pub struct FfmpegSink {
    opts: FfmpegSinkOpts,
    encoder: Option<Encoder>,
    cfg: Option<SinkConfig>,
    scratch: Vec<u8>,
    next_idx: u64,
    bytes: u64,
}

impl std::fmt::Debug for FfmpegSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FfmpegSink")
            .field("opts", &self.opts)
            .field("running", &self.encoder.is_some())
            .field("next_idx", &self.next_idx)
            .finish()
    }
}

impl FfmpegSink {
    pub fn new(opts: FfmpegSinkOpts) -> Self {
        Self {
            opts,
            encoder: None,
            cfg: None,
            scratch: Vec::new(),
            next_idx: 0,
            bytes: 0,
        }
    }

    pub fn codec(&self) -> ContainerCodec {
        self.opts.codec
    }

    fn poll_size(&mut self) {
        if let Ok(meta) = std::fs::metadata(&self.opts.out_path) {
            self.bytes = meta.len();
        }
    }
}

impl FrameSink for FfmpegSink {
    fn begin(&mut self, cfg: SinkConfig) -> BlackboxResult<()> {
        if cfg.width == 0 || cfg.height == 0 {
            return Err(BlackboxError::validation("video size must be non-zero"));
        }
        // yuv420p subsamples chroma 2x2.
        if !cfg.width.is_multiple_of(2) || !cfg.height.is_multiple_of(2) {
            return Err(BlackboxError::validation(format!(
                "video size {}x{} must be even",
                cfg.width, cfg.height
            )));
        }
        ensure_parent_dir(&self.opts.out_path)?;
        if !self.opts.overwrite && self.opts.out_path.exists() {
            return Err(BlackboxError::validation(format!(
                "'{}' already exists",
                self.opts.out_path.display()
            )));
        }
        if !is_ffmpeg_on_path() {
            return Err(BlackboxError::export("ffmpeg was not found on PATH"));
        }

        let encoder = Encoder::spawn(self.opts.command(&cfg))?;
        tracing::debug!(
            out = %self.opts.out_path.display(),
            codec = ?self.opts.codec,
            "ffmpeg started"
        );
        self.scratch = vec![0; cfg.width as usize * cfg.height as usize * 4];
        self.encoder = Some(encoder);
        self.cfg = Some(cfg);
        self.next_idx = 0;
        self.bytes = 0;
        Ok(())
    }

    fn push_frame(&mut self, idx: FrameIndex, frame: &FrameRGBA) -> BlackboxResult<()> {
        let (Some(cfg), Some(encoder)) = (self.cfg.as_ref(), self.encoder.as_mut()) else {
            return Err(BlackboxError::export("ffmpeg sink is not open"));
        };
        if idx.0 < self.next_idx {
            return Err(BlackboxError::export(format!(
                "frame {} arrived after frame {}",
                idx.0,
                self.next_idx.saturating_sub(1)
            )));
        }
        if (frame.width, frame.height) != (cfg.width, cfg.height) {
            return Err(BlackboxError::validation(format!(
                "frame is {}x{}, video is {}x{}",
                frame.width, frame.height, cfg.width, cfg.height
            )));
        }

        flatten_over_bg_to_opaque_rgba8(
            &mut self.scratch,
            &frame.data,
            frame.premultiplied,
            self.opts.bg_rgba,
        )?;
        encoder.write(&self.scratch)?;
        self.next_idx = idx.0 + 1;
        if self.next_idx.is_multiple_of(SIZE_POLL_FRAMES) {
            self.poll_size();
        }
        Ok(())
    }

    fn end(&mut self) -> BlackboxResult<()> {
        let encoder = self
            .encoder
            .take()
            .ok_or_else(|| BlackboxError::export("ffmpeg sink is not open"))?;
        self.cfg = None;
        let result = encoder.finish();
        self.poll_size();
        result
    }

    fn written_bytes(&self) -> u64 {
        self.bytes
    }
}

/// Composite RGBA8 pixels over an opaque background colour.
pub(crate) fn flatten_over_bg_to_opaque_rgba8(
    dst: &mut [u8],
    src: &[u8],
    src_is_premul: bool,
    bg_rgba: [u8; 4],
) -> BlackboxResult<()> {
    if dst.len() != src.len() || !dst.len().is_multiple_of(4) {
        return Err(BlackboxError::validation(format!(
            "frame holds {} bytes, expected {}",
            src.len(),
            dst.len()
        )));
    }

    for (out, px) in dst.chunks_exact_mut(4).zip(src.chunks_exact(4)) {
        let alpha = u16::from(px[3]);
        let uncovered = 255 - alpha;
        for c in 0..3 {
            let fg = if src_is_premul {
                u16::from(px[c])
            } else {
                mul_div255_u16(u16::from(px[c]), alpha)
            };
            out[c] = (fg + mul_div255_u16(u16::from(bg_rgba[c]), uncovered)).min(255) as u8;
        }
        out[3] = 255;
    }
    Ok(())
}

/// Ensure the parent directory of `path` exists.
pub fn ensure_parent_dir(path: &Path) -> BlackboxResult<()> {
    if let Some(parent) = path.parent() {
        use anyhow::Context as _;
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create output directory '{}'", parent.display()))?;
    }
    Ok(())
}

/// Return `true` when `ffmpeg` can be invoked from `PATH`.
pub fn is_ffmpeg_on_path() -> bool {
    binary_on_path("ffmpeg")
}

pub(crate) fn binary_on_path(name: &str) -> bool {
    Command::new(name)
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .is_ok_and(|s| s.success())
}
