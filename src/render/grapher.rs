//! The frame renderer: turns one telemetry time into a [`Scene`].

use std::sync::Arc;

use crate::{
    config::layout::{CraftMode, DisplaySettings, HAnchor, LayoutConfig, VAnchor},
    foundation::core::{BezPath, Canvas, Micros, Point, Rect},
    foundation::format::{format_time, left_pad},
    graph::{config::GraphConfig, curve::ExpoCurve, layout::Resolution, layout::resolve},
    render::craft::{Craft2D, CraftKind, CraftParameters, CraftRenderer},
    render::events::draw_events,
    render::scene::{Painter, Scene, TextAlign},
    render::sticks::{draw_sticks, pitch_stick_curve},
    render::style,
    render::window::{DEFAULT_WINDOW_WIDTH, RenderWindow, window_width_for_zoom},
    telemetry::{catalog::FieldCatalog, source::Chunk, source::TelemetrySource},
};

/// How the canvas is prepared before graphs are drawn.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Background {
    /// Opaque fill, for outputs without transparency.
    #[default]
    Fill,
    /// Transparent.
    Clear,
    /// Keep whatever the underlay painted (a background video frame).
    None,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct GrapherOptions {
    /// Draw traces straight through gaps without markers.
    pub gapless: bool,
    pub background: Background,
    pub layout: LayoutConfig,
}

/// Geometry of one field trace inside a track, in track-local coordinates.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Trace {
    pub path: BezPath,
    /// Gap boundary markers.
    pub markers: Vec<Rect>,
}

/// Renders graphs, overlays and the craft for a telemetry time.
///
/// One grapher per consumer: live playback and an export job each own their own instance.
pub struct Grapher {
    source: Arc<dyn TelemetrySource>,
    catalog: FieldCatalog,
    config: GraphConfig,
    resolution: Resolution,
    options: GrapherOptions,
    craft: Option<Box<dyn CraftRenderer>>,
    pitch_curve: ExpoCurve,
    window_width: Micros,
    window: RenderWindow,
    scene: Scene,
}

impl std::fmt::Debug for Grapher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Grapher")
            .field("width", &self.scene.width)
            .field("height", &self.scene.height)
            .field("graphs", &self.resolution.graphs.len())
            .field("window", &self.window)
            .field("craft", &self.craft.as_ref().map(|c| c.kind()))
            .finish()
    }
}

impl Grapher {
    /// Build a grapher with the built-in 2D craft when the layout asks for one.
    ///
    /// A 3D layout without a supplied renderer draws no craft.
    pub fn new(
        source: Arc<dyn TelemetrySource>,
        config: &GraphConfig,
        canvas: Canvas,
        options: GrapherOptions,
    ) -> Self {
        let catalog = FieldCatalog::build(source.field_names());
        let craft: Option<Box<dyn CraftRenderer>> = match options.layout.craft_mode() {
            CraftMode::TwoD => Some(Box::new(Craft2D::new(
                CraftParameters::for_catalog(&catalog),
                &source.sys_config(),
            ))),
            CraftMode::ThreeD => {
                tracing::debug!("3D craft requested without a renderer; craft hidden");
                None
            }
        };
        Self::build(source, catalog, config, canvas, options, craft)
    }

    /// Build a grapher with an externally supplied craft renderer (e.g. a 3D one).
    pub fn with_craft_renderer(
        source: Arc<dyn TelemetrySource>,
        config: &GraphConfig,
        canvas: Canvas,
        options: GrapherOptions,
        craft: Box<dyn CraftRenderer>,
    ) -> Self {
        let catalog = FieldCatalog::build(source.field_names());
        Self::build(source, catalog, config, canvas, options, Some(craft))
    }

    fn build(
        source: Arc<dyn TelemetrySource>,
        catalog: FieldCatalog,
        config: &GraphConfig,
        canvas: Canvas,
        options: GrapherOptions,
        craft: Option<Box<dyn CraftRenderer>>,
    ) -> Self {
        let pitch_curve = pitch_stick_curve(source.sys_config().rc_rate);
        let resolution = resolve(config, source.as_ref());
        let mut grapher = Self {
            source,
            catalog,
            config: config.clone(),
            resolution,
            options,
            craft,
            pitch_curve,
            window_width: DEFAULT_WINDOW_WIDTH,
            window: RenderWindow::new(0, DEFAULT_WINDOW_WIDTH),
            scene: Scene::new(canvas.width, canvas.height),
        };
        grapher.resize_craft();
        grapher
    }

    /// Re-resolve after a configuration change. The previous resolution is discarded.
    pub fn set_graph_config(&mut self, config: &GraphConfig) {
        self.config = config.clone();
        self.resolution = resolve(config, self.source.as_ref());
    }

    pub fn graph_config(&self) -> &GraphConfig {
        &self.config
    }

    pub fn resolution(&self) -> &Resolution {
        &self.resolution
    }

    pub fn catalog(&self) -> &FieldCatalog {
        &self.catalog
    }

    pub fn source(&self) -> &Arc<dyn TelemetrySource> {
        &self.source
    }

    pub fn craft_kind(&self) -> Option<CraftKind> {
        self.craft.as_ref().map(|c| c.kind())
    }

    pub fn set_graph_zoom(&mut self, zoom: f64) {
        self.window_width = window_width_for_zoom(zoom);
    }

    pub fn window_width(&self) -> Micros {
        self.window_width
    }

    /// Window of the most recent render.
    pub fn window(&self) -> RenderWindow {
        self.window
    }

    pub fn resize(&mut self, canvas: Canvas) {
        self.scene = Scene::new(canvas.width, canvas.height);
        self.resize_craft();
    }

    fn resize_craft(&mut self) {
        let size = f64::from(self.scene.height) / 3.0;
        if let Some(craft) = self.craft.as_mut() {
            craft.resize(size);
        }
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    /// Telemetry time delta for a horizontal drag of `dx` pixels; dragging right seeks back.
    pub fn drag_seek_delta(&self, dx: f64) -> Micros {
        let width = f64::from(self.scene.width.max(1));
        (-dx / width * self.window_width as f64).round() as Micros
    }

    pub fn render(&mut self, center: Micros) -> &Scene {
        self.render_with(center, |_| {})
    }

    /// Render with `underlay` painted after the background and before any graph.
    pub fn render_with(&mut self, center: Micros, underlay: impl FnOnce(&mut Painter<'_>)) -> &Scene {
        self.window = RenderWindow::new(center, self.window_width);
        let window = self.window;

        let mut scene = std::mem::take(&mut self.scene);
        scene.clear();
        {
            let mut p = Painter::new(&mut scene);
            if self.options.background == Background::Fill {
                let bounds = Rect::new(0.0, 0.0, p.width(), p.height());
                p.fill_rect(bounds, style::BACKGROUND_FILL);
            }
            underlay(&mut p);
            self.paint(&mut p, &window);
        }
        self.scene = scene;
        &self.scene
    }

    fn paint(&mut self, p: &mut Painter<'_>, window: &RenderWindow) {
        let chunks = self.source.chunks_in_time_range(window.start, window.end);
        if chunks.is_empty() {
            return;
        }

        let start_frame = chunks[0]
            .frames
            .iter()
            .position(|f| f.time >= window.start)
            .unwrap_or(chunks[0].frames.len())
            .saturating_sub(1);

        let (w, h) = (p.width(), p.height());
        for graph in &self.resolution.graphs {
            p.save();
            p.translate(0.0, h * graph.y);
            p.line(Point::new(0.0, 0.0), Point::new(w, 0.0), style::AXIS_LINE, 1.0);

            for field in &graph.fields {
                let Some(index) = field.index else {
                    continue;
                };
                let trace = trace_field(
                    &chunks,
                    start_frame,
                    index,
                    &field.curve,
                    h * graph.height / 2.0,
                    window,
                    w,
                    self.options.gapless,
                );
                p.stroke_path(trace.path, field.color, style::PLOT_LINE_WIDTH);
                for marker in trace.markers {
                    p.stroke_rect(marker, field.color, style::PLOT_LINE_WIDTH);
                }
            }

            if !graph.label.is_empty() {
                p.text(
                    graph.label.clone(),
                    Point::new(w - 8.0, -8.0),
                    style::FONT_AXIS_LABEL,
                    TextAlign::Right,
                    style::AXIS_LABEL,
                );
            }
            p.restore();
        }

        if !self.resolution.graphs.is_empty() {
            p.line(
                Point::new(w / 2.0, 0.0),
                Point::new(w / 2.0, h),
                style::CURRENT_TIME_BAR,
                style::CURRENT_TIME_BAR_WIDTH,
            );
        }

        draw_events(p, &chunks, window);

        let Some(frame) = self.source.frame_at_time(window.center) else {
            return;
        };
        let displays = &self.options.layout.displays;

        if displays.sticks.show && self.catalog.has_sticks() {
            let anchor = displays.sticks.anchor_point(w, h);
            p.save();
            p.translate(anchor.x, anchor.y);
            draw_sticks(p, &frame, &self.catalog, &self.pitch_curve);
            p.restore();
        }

        if displays.frame_number.show {
            let elapsed_ms = ((window.center - self.source.min_time()) as f64 / 1000.0).round();
            draw_frame_label(p, &displays.frame_number, frame.iteration, elapsed_ms);
        }

        if displays.craft.show
            && let Some(craft) = self.craft.as_mut()
        {
            let anchor = displays.craft.anchor_point(w, h);
            p.save();
            p.translate(anchor.x, anchor.y);
            craft.render(p, &frame, &self.catalog);
            p.restore();
        }
    }
}

/// Build one field's polyline across the window.
///
/// `gap_starts_here[i]` breaks the line between frame `i - 1` and frame `i`; both ends of the
/// break get a marker. Non-finite samples lift the pen without a marker. The walk stops after
/// the first frame at or beyond the window end.
#[allow(clippy::too_many_arguments)]
pub fn trace_field(
    chunks: &[Arc<Chunk>],
    start_frame: usize,
    field: usize,
    curve: &ExpoCurve,
    plot_height: f64,
    window: &RenderWindow,
    canvas_width: f64,
    gapless: bool,
) -> Trace {
    let r = style::GAP_MARKER_RADIUS;
    let marker = |pt: Point| Rect::new(pt.x - r, pt.y - r, pt.x + r, pt.y + r);
    let y_scale = -plot_height;

    let mut trace = Trace::default();
    let mut last: Option<Point> = None;
    let mut pending_gap = false;

    let mut first = start_frame;
    'chunks: for chunk in chunks {
        for (i, frame) in chunk.frames.iter().enumerate().skip(first) {
            let gap = !gapless && (chunk.gap_before(i) || pending_gap);
            let y = frame
                .value(field)
                .map(|v| curve.lookup(v) * y_scale)
                .unwrap_or(f64::NAN);

            if !y.is_finite() {
                pending_gap = gap;
                last = None;
            } else {
                let pt = Point::new(window.x_for(frame.time, canvas_width), y);
                match last {
                    Some(prev) if gap => {
                        trace.markers.push(marker(prev));
                        trace.path.move_to(pt);
                    }
                    Some(_) => trace.path.line_to(pt),
                    None => trace.path.move_to(pt),
                }
                if gap {
                    trace.markers.push(marker(pt));
                }
                pending_gap = false;
                last = Some(pt);
            }

            if frame.time >= window.end {
                break 'chunks;
            }
        }
        first = 0;
    }
    trace
}

fn draw_frame_label(p: &mut Painter<'_>, display: &DisplaySettings, iteration: u64, elapsed_ms: f64) {
    let (w, h) = (p.width(), p.height());
    let margin = 8.0;
    let line = style::FRAME_LABEL_POINTS + margin;

    // `baseline` is the lower (frame number) line.
    let (x, baseline, align) = match display.position.anchors() {
        None => (
            f64::from(display.x) / 100.0 * w,
            f64::from(display.y) / 100.0 * h + line,
            TextAlign::Left,
        ),
        Some((h_anchor, v_anchor)) => {
            let (x, align) = match h_anchor {
                HAnchor::Left => (margin, TextAlign::Left),
                HAnchor::Center => (w / 2.0, TextAlign::Center),
                HAnchor::Right => (w - margin, TextAlign::Right),
            };
            let baseline = match v_anchor {
                VAnchor::Top => margin + 2.0 * line,
                VAnchor::Center => h / 2.0 + line / 2.0,
                VAnchor::Bottom => h - margin,
            };
            (x, baseline, align)
        }
    };

    p.text(
        format_time(elapsed_ms, true, false),
        Point::new(x, baseline - line),
        style::FONT_FRAME_LABEL,
        align,
        style::FRAME_LABEL,
    );
    p.text(
        format!("#{}", left_pad(iteration, '0', 7)),
        Point::new(x, baseline),
        style::FONT_FRAME_LABEL,
        align,
        style::FRAME_LABEL,
    );
}

#[cfg(test)]
#[path = "../../tests/unit/render/grapher.rs"]
mod tests;
