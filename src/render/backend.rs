use crate::{foundation::error::BlackboxResult, render::scene::Scene};

/// A rendered frame as RGBA8 pixels.
///
/// Frames from [`crate::render::CpuBackend`] are premultiplied alpha; the flag makes that explicit
/// at sink boundaries.
#[derive(Clone, Debug, PartialEq)]
pub struct FrameRGBA {
    pub width: u32,
    pub height: u32,
    /// RGBA8 bytes, tightly packed, row-major.
    pub data: Vec<u8>,
    pub premultiplied: bool,
}

impl FrameRGBA {
    /// Straight-alpha copy of the pixel data.
    pub fn to_straight_rgba8(&self) -> Vec<u8> {
        let mut out = self.data.clone();
        if !self.premultiplied {
            return out;
        }
        for px in out.chunks_exact_mut(4) {
            let a = u32::from(px[3]);
            if a == 0 || a == 255 {
                continue;
            }
            for c in &mut px[..3] {
                *c = ((u32::from(*c) * 255 + a / 2) / a).min(255) as u8;
            }
        }
        out
    }
}

/// Rasterizes a [`Scene`] into pixels.
pub trait RasterBackend: Send {
    fn render_scene(&mut self, scene: &Scene) -> BlackboxResult<FrameRGBA>;
}

#[cfg(test)]
#[path = "../../tests/unit/render/backend.rs"]
mod tests;
