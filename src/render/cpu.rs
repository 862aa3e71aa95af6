use std::sync::Arc;

use crate::foundation::core::{Affine, BezPath, Point, Rect, Rgba8};
use crate::foundation::error::{BlackboxError, BlackboxResult};
use crate::render::backend::{FrameRGBA, RasterBackend};
use crate::render::scene::{DrawOp, RasterImage, Scene, TextAlign};
use crate::render::text::TextLayoutEngine;

struct FontFace {
    engine: TextLayoutEngine,
    data: vello_cpu::peniko::FontData,
}

/// CPU backend powered by `vello_cpu`.
///
/// Text ops are skipped unless a font was supplied with [`CpuBackend::with_font`].
pub struct CpuBackend {
    ctx: Option<vello_cpu::RenderContext>,
    font: Option<FontFace>,
    labels_dropped: bool,
}

impl Default for CpuBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for CpuBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CpuBackend")
            .field("font", &self.font.as_ref().map(|f| f.engine.family_name()))
            .finish()
    }
}

impl CpuBackend {
    pub fn new() -> Self {
        Self {
            ctx: None,
            font: None,
            labels_dropped: false,
        }
    }

    /// Backend that shapes labels with the given TTF/OTF bytes.
    pub fn with_font(font_bytes: Vec<u8>) -> BlackboxResult<Self> {
        let engine = TextLayoutEngine::new(&font_bytes)?;
        let data = vello_cpu::peniko::FontData::new(vello_cpu::peniko::Blob::from(font_bytes), 0);
        Ok(Self {
            ctx: None,
            font: Some(FontFace { engine, data }),
            labels_dropped: false,
        })
    }

    pub fn has_font(&self) -> bool {
        self.font.is_some()
    }

    fn take_ctx(&mut self, width: u16, height: u16) -> vello_cpu::RenderContext {
        let mut ctx = match self.ctx.take() {
            Some(ctx) if ctx.width() == width && ctx.height() == height => ctx,
            _ => vello_cpu::RenderContext::new(width, height),
        };
        ctx.reset();
        ctx
    }

    fn draw_op(&mut self, ctx: &mut vello_cpu::RenderContext, op: &DrawOp) -> BlackboxResult<()> {
        ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
        ctx.set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);
        match op {
            DrawOp::FillRect { rect, color } => {
                ctx.set_paint(color_to_cpu(*color));
                ctx.fill_rect(&rect_to_cpu(*rect));
            }
            DrawOp::FillPath { path, color } => {
                ctx.set_paint(color_to_cpu(*color));
                ctx.fill_path(&bezpath_to_cpu(path));
            }
            DrawOp::StrokePath { path, color, width } => {
                if !width.is_finite() || *width <= 0.0 {
                    return Ok(());
                }
                ctx.set_paint(color_to_cpu(*color));
                ctx.set_stroke(vello_cpu::kurbo::Stroke::new(*width));
                ctx.stroke_path(&bezpath_to_cpu(path));
            }
            DrawOp::Image { image, dest } => {
                draw_image(ctx, image, *dest)?;
            }
            DrawOp::Text {
                text,
                origin,
                size_px,
                align,
                color,
            } => {
                let Some(font) = self.font.as_mut() else {
                    if !self.labels_dropped {
                        self.labels_dropped = true;
                        tracing::warn!("no font configured; labels are skipped");
                    }
                    return Ok(());
                };
                draw_text(ctx, font, text, *origin, *size_px, *align, *color)?;
            }
        }
        Ok(())
    }
}

impl RasterBackend for CpuBackend {
    #[tracing::instrument(level = "trace", skip_all, fields(ops = scene.ops.len()))]
    fn render_scene(&mut self, scene: &Scene) -> BlackboxResult<FrameRGBA> {
        let w: u16 = scene
            .width
            .try_into()
            .map_err(|_| BlackboxError::render("canvas width exceeds u16"))?;
        let h: u16 = scene
            .height
            .try_into()
            .map_err(|_| BlackboxError::render("canvas height exceeds u16"))?;
        if w == 0 || h == 0 {
            return Err(BlackboxError::render("canvas width/height must be non-zero"));
        }

        let mut ctx = self.take_ctx(w, h);
        for op in &scene.ops {
            self.draw_op(&mut ctx, op)?;
        }

        let mut pixmap = vello_cpu::Pixmap::new(w, h);
        ctx.flush();
        ctx.render_to_pixmap(&mut pixmap);
        self.ctx = Some(ctx);

        Ok(FrameRGBA {
            width: scene.width,
            height: scene.height,
            data: pixmap.data_as_u8_slice().to_vec(),
            premultiplied: true,
        })
    }
}

fn draw_image(
    ctx: &mut vello_cpu::RenderContext,
    image: &Arc<RasterImage>,
    dest: Rect,
) -> BlackboxResult<()> {
    if image.width == 0 || image.height == 0 || dest.width() <= 0.0 || dest.height() <= 0.0 {
        return Ok(());
    }
    let paint = rgba_premul_to_image(&image.data, image.width, image.height)?;
    let (iw, ih) = (f64::from(image.width), f64::from(image.height));
    let tr = Affine::translate((dest.x0, dest.y0))
        * Affine::scale_non_uniform(dest.width() / iw, dest.height() / ih);
    ctx.set_transform(affine_to_cpu(tr));
    ctx.set_paint(paint);
    ctx.fill_rect(&vello_cpu::kurbo::Rect::new(0.0, 0.0, iw, ih));
    Ok(())
}

fn draw_text(
    ctx: &mut vello_cpu::RenderContext,
    font: &mut FontFace,
    text: &str,
    origin: Point,
    size_px: f32,
    align: TextAlign,
    color: Rgba8,
) -> BlackboxResult<()> {
    if text.is_empty() {
        return Ok(());
    }
    let shaped = font.engine.shape(text, size_px, color)?;
    let dx = match align {
        TextAlign::Left => 0.0,
        TextAlign::Center => f64::from(shaped.width) / 2.0,
        TextAlign::Right => f64::from(shaped.width),
    };
    let tr = Affine::translate((origin.x - dx, origin.y - f64::from(shaped.baseline)));
    ctx.set_transform(affine_to_cpu(tr));

    for line in shaped.layout.lines() {
        for item in line.items() {
            let parley::layout::PositionedLayoutItem::GlyphRun(run) = item else {
                continue;
            };
            let brush = run.style().brush;
            ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(
                brush.r, brush.g, brush.b, brush.a,
            ));
            let glyphs = run.positioned_glyphs().map(|g| vello_cpu::Glyph {
                id: g.id,
                x: g.x,
                y: g.y,
            });
            ctx.glyph_run(&font.data)
                .font_size(run.run().font_size())
                .fill_glyphs(glyphs);
        }
    }
    Ok(())
}

fn color_to_cpu(c: Rgba8) -> vello_cpu::peniko::Color {
    vello_cpu::peniko::Color::from_rgba8(c.r, c.g, c.b, c.a)
}

fn rect_to_cpu(r: Rect) -> vello_cpu::kurbo::Rect {
    vello_cpu::kurbo::Rect::new(r.x0, r.y0, r.x1, r.y1)
}

fn affine_to_cpu(a: Affine) -> vello_cpu::kurbo::Affine {
    vello_cpu::kurbo::Affine::new(a.as_coeffs())
}

fn bezpath_to_cpu(path: &BezPath) -> vello_cpu::kurbo::BezPath {
    use kurbo::PathEl;

    let pt = |p: Point| vello_cpu::kurbo::Point::new(p.x, p.y);
    let mut out = vello_cpu::kurbo::BezPath::new();
    for &el in path.elements() {
        match el {
            PathEl::MoveTo(p) => out.move_to(pt(p)),
            PathEl::LineTo(p) => out.line_to(pt(p)),
            PathEl::QuadTo(p1, p2) => out.quad_to(pt(p1), pt(p2)),
            PathEl::CurveTo(p1, p2, p3) => out.curve_to(pt(p1), pt(p2), pt(p3)),
            PathEl::ClosePath => out.close_path(),
        }
    }
    out
}

fn pixmap_from_premul_bytes(
    bytes: &[u8],
    width: u32,
    height: u32,
) -> BlackboxResult<vello_cpu::Pixmap> {
    let w: u16 = width
        .try_into()
        .map_err(|_| BlackboxError::render("pixmap width exceeds u16"))?;
    let h: u16 = height
        .try_into()
        .map_err(|_| BlackboxError::render("pixmap height exceeds u16"))?;
    if bytes.len()
        != (width as usize)
            .saturating_mul(height as usize)
            .saturating_mul(4)
    {
        return Err(BlackboxError::render("pixmap byte len mismatch"));
    }
    let pixels = bytes
        .chunks_exact(4)
        .map(|px| vello_cpu::peniko::color::PremulRgba8::from_u8_array([px[0], px[1], px[2], px[3]]))
        .collect::<Vec<_>>();
    Ok(vello_cpu::Pixmap::from_parts_with_opacity(
        pixels, w, h, true,
    ))
}

fn rgba_premul_to_image(
    bytes_premul: &[u8],
    width: u32,
    height: u32,
) -> BlackboxResult<vello_cpu::Image> {
    let pixmap = pixmap_from_premul_bytes(bytes_premul, width, height)?;
    Ok(vello_cpu::Image {
        image: vello_cpu::ImageSource::Pixmap(Arc::new(pixmap)),
        sampler: vello_cpu::peniko::ImageSampler::default(),
    })
}

/// Premultiply straight RGBA8 in place.
pub(crate) fn premultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = u16::from(px[3]);
        if a == 255 {
            continue;
        }
        for c in &mut px[..3] {
            *c = crate::foundation::math::mul_div255_u8(u16::from(*c), a);
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/cpu.rs"]
mod tests;
