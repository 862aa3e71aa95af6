use std::sync::Arc;

use kurbo::Shape as _;

use crate::foundation::core::{Affine, BezPath, Point, Rect, Rgba8, Vec2};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
}

/// Premultiplied RGBA8 pixels, e.g. a decoded background video frame.
#[derive(Clone, Debug, PartialEq)]
pub struct RasterImage {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
}

/// One drawing operation in canvas pixel coordinates.
#[derive(Clone, Debug, PartialEq)]
pub enum DrawOp {
    FillRect {
        rect: Rect,
        color: Rgba8,
    },
    FillPath {
        path: BezPath,
        color: Rgba8,
    },
    /// Stroked centred on the path with the default kurbo stroke style.
    StrokePath {
        path: BezPath,
        color: Rgba8,
        width: f64,
    },
    /// `origin` is the baseline anchor; `align` picks which end of the run sits on it.
    Text {
        text: String,
        origin: Point,
        size_px: f32,
        align: TextAlign,
        color: Rgba8,
    },
    /// Image scaled to fill `dest`.
    Image {
        image: Arc<RasterImage>,
        dest: Rect,
    },
}

/// Backend-agnostic frame description built by the grapher and painted by a raster backend.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Scene {
    pub width: u32,
    pub height: u32,
    pub ops: Vec<DrawOp>,
}

impl Scene {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            ops: Vec::new(),
        }
    }

    pub fn clear(&mut self) {
        self.ops.clear();
    }

    pub fn bounds(&self) -> Rect {
        Rect::new(0.0, 0.0, f64::from(self.width), f64::from(self.height))
    }
}

/// Canvas-style painter over a [`Scene`] with a save/restore transform stack.
///
/// Only translations and uniform scales are pushed by the grapher, so rectangles stay axis
/// aligned after transformation.
pub struct Painter<'a> {
    scene: &'a mut Scene,
    transform: Affine,
    stack: Vec<Affine>,
}

impl<'a> Painter<'a> {
    pub fn new(scene: &'a mut Scene) -> Self {
        Self {
            scene,
            transform: Affine::IDENTITY,
            stack: Vec::new(),
        }
    }

    pub fn width(&self) -> f64 {
        f64::from(self.scene.width)
    }

    pub fn height(&self) -> f64 {
        f64::from(self.scene.height)
    }

    pub fn save(&mut self) {
        self.stack.push(self.transform);
    }

    pub fn restore(&mut self) {
        if let Some(t) = self.stack.pop() {
            self.transform = t;
        }
    }

    pub fn translate(&mut self, x: f64, y: f64) {
        self.transform *= Affine::translate(Vec2::new(x, y));
    }

    pub fn fill_rect(&mut self, rect: Rect, color: Rgba8) {
        let rect = self.transform.transform_rect_bbox(rect);
        self.scene.ops.push(DrawOp::FillRect { rect, color });
    }

    pub fn stroke_rect(&mut self, rect: Rect, color: Rgba8, width: f64) {
        self.stroke_path(rect.to_path(0.1), color, width);
    }

    pub fn fill_path(&mut self, path: BezPath, color: Rgba8) {
        let path = self.transform * path;
        self.scene.ops.push(DrawOp::FillPath { path, color });
    }

    pub fn fill_circle(&mut self, center: Point, radius: f64, color: Rgba8) {
        let path = kurbo::Circle::new(center, radius).to_path(0.1);
        self.fill_path(path, color);
    }

    pub fn stroke_path(&mut self, path: BezPath, color: Rgba8, width: f64) {
        if path.elements().is_empty() {
            return;
        }
        let path = self.transform * path;
        self.scene.ops.push(DrawOp::StrokePath { path, color, width });
    }

    pub fn line(&mut self, from: Point, to: Point, color: Rgba8, width: f64) {
        let mut path = BezPath::new();
        path.move_to(from);
        path.line_to(to);
        self.stroke_path(path, color, width);
    }

    pub fn text(
        &mut self,
        text: impl Into<String>,
        origin: Point,
        size_px: f32,
        align: TextAlign,
        color: Rgba8,
    ) {
        let origin = self.transform * origin;
        self.scene.ops.push(DrawOp::Text {
            text: text.into(),
            origin,
            size_px,
            align,
            color,
        });
    }

    pub fn image(&mut self, image: Arc<RasterImage>, dest: Rect) {
        let dest = self.transform.transform_rect_bbox(dest);
        self.scene.ops.push(DrawOp::Image { image, dest });
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/scene.rs"]
mod tests;
