use crate::foundation::core::{Fps, FrameIndex};
use crate::foundation::error::BlackboxResult;
use crate::render::backend::FrameRGBA;

/// Configuration provided to a [`FrameSink`] before the first frame.
#[derive(Debug, Clone, PartialEq)]
pub struct SinkConfig {
    pub width: u32,
    pub height: u32,
    pub fps: Fps,
}

/// Consumer of rendered export frames.
///
/// Ordering contract: `push_frame` is called in strictly increasing `FrameIndex` order, and
/// `end` is called exactly once after a successful `begin`, whether or not the export succeeded.
pub trait FrameSink: Send {
    /// Open the output. Called once before any frames are pushed.
    fn begin(&mut self, cfg: SinkConfig) -> BlackboxResult<()>;

    fn push_frame(&mut self, idx: FrameIndex, frame: &FrameRGBA) -> BlackboxResult<()>;

    /// Flush and close the output.
    fn end(&mut self) -> BlackboxResult<()>;

    /// Bytes written to the output so far.
    fn written_bytes(&self) -> u64;
}

/// In-memory sink for tests and debugging.
#[derive(Debug, Default)]
pub struct InMemorySink {
    cfg: Option<SinkConfig>,
    frames: Vec<(FrameIndex, FrameRGBA)>,
    begins: usize,
    ends: usize,
}

impl InMemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the sink configuration captured in `begin`, if any.
    pub fn config(&self) -> Option<SinkConfig> {
        self.cfg.clone()
    }

    /// Borrow the captured frames.
    pub fn frames(&self) -> &[(FrameIndex, FrameRGBA)] {
        &self.frames
    }

    pub fn begin_count(&self) -> usize {
        self.begins
    }

    pub fn end_count(&self) -> usize {
        self.ends
    }
}

impl FrameSink for InMemorySink {
    fn begin(&mut self, cfg: SinkConfig) -> BlackboxResult<()> {
        self.cfg = Some(cfg);
        self.frames.clear();
        self.begins += 1;
        Ok(())
    }

    fn push_frame(&mut self, idx: FrameIndex, frame: &FrameRGBA) -> BlackboxResult<()> {
        self.frames.push((idx, frame.clone()));
        Ok(())
    }

    fn end(&mut self) -> BlackboxResult<()> {
        self.ends += 1;
        Ok(())
    }

    fn written_bytes(&self) -> u64 {
        self.frames.iter().map(|(_, f)| f.data.len() as u64).sum()
    }
}

impl<S: FrameSink + ?Sized> FrameSink for Box<S> {
    fn begin(&mut self, cfg: SinkConfig) -> BlackboxResult<()> {
        (**self).begin(cfg)
    }

    fn push_frame(&mut self, idx: FrameIndex, frame: &FrameRGBA) -> BlackboxResult<()> {
        (**self).push_frame(idx, frame)
    }

    fn end(&mut self) -> BlackboxResult<()> {
        (**self).end()
    }

    fn written_bytes(&self) -> u64 {
        (**self).written_bytes()
    }
}
