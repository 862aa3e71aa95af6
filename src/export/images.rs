use std::path::{Path, PathBuf};

use anyhow::Context as _;

use crate::export::ffmpeg::ensure_parent_dir;
use crate::export::sink::{FrameSink, SinkConfig};
use crate::foundation::core::FrameIndex;
use crate::foundation::error::{BlackboxError, BlackboxResult};
use crate::foundation::format::left_pad;
use crate::render::backend::FrameRGBA;

/// Per-frame file naming: `{dir}/{base}-{index:07}{ext}`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameFilenames {
    pub dir: PathBuf,
    pub base: String,
    /// Extension including the leading dot.
    pub ext: String,
}

impl FrameFilenames {
    /// Split an output path into the naming parts.
    ///
    /// A file name without a dot names nothing: the base becomes `video` and the extension
    /// `default_ext` (with leading dot).
    pub fn from_output_path(path: &Path, default_ext: &str) -> Self {
        let dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let (base, ext) = match name.rfind('.') {
            Some(dot) => (name[..dot].to_string(), name[dot..].to_string()),
            None => ("video".to_string(), default_ext.to_string()),
        };
        Self { dir, base, ext }
    }

    pub fn path_for(&self, index: u64) -> PathBuf {
        self.dir
            .join(format!("{}-{}{}", self.base, left_pad(index, '0', 7), self.ext))
    }
}

/// Writes each frame as its own PNG. Files are opened lazily, one per frame.
#[derive(Debug)]
pub struct ImageSequenceSink {
    names: FrameFilenames,
    cfg: Option<SinkConfig>,
    written: u64,
    files: Vec<PathBuf>,
}

impl ImageSequenceSink {
    pub fn new(names: FrameFilenames) -> Self {
        Self {
            names,
            cfg: None,
            written: 0,
            files: Vec::new(),
        }
    }

    pub fn names(&self) -> &FrameFilenames {
        &self.names
    }

    /// Files written so far, in frame order.
    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }
}

impl FrameSink for ImageSequenceSink {
    fn begin(&mut self, cfg: SinkConfig) -> BlackboxResult<()> {
        ensure_parent_dir(&self.names.path_for(0))?;
        self.cfg = Some(cfg);
        self.written = 0;
        self.files.clear();
        Ok(())
    }

    fn push_frame(&mut self, idx: FrameIndex, frame: &FrameRGBA) -> BlackboxResult<()> {
        let cfg = self
            .cfg
            .as_ref()
            .ok_or_else(|| BlackboxError::export("image sequence sink not started"))?;
        if frame.width != cfg.width || frame.height != cfg.height {
            return Err(BlackboxError::validation(format!(
                "frame size mismatch: got {}x{}, expected {}x{}",
                frame.width, frame.height, cfg.width, cfg.height
            )));
        }

        let path = self.names.path_for(idx.0);
        let rgba = frame.to_straight_rgba8();
        image::save_buffer_with_format(
            &path,
            &rgba,
            frame.width,
            frame.height,
            image::ColorType::Rgba8,
            image::ImageFormat::Png,
        )
        .with_context(|| format!("write png '{}'", path.display()))?;

        let len = std::fs::metadata(&path)
            .with_context(|| format!("stat png '{}'", path.display()))?
            .len();
        self.written += len;
        self.files.push(path);
        Ok(())
    }

    fn end(&mut self) -> BlackboxResult<()> {
        self.cfg = None;
        Ok(())
    }

    fn written_bytes(&self) -> u64 {
        self.written
    }
}

#[cfg(test)]
#[path = "../../tests/unit/export/images.rs"]
mod tests;
