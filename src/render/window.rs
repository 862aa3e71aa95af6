use crate::foundation::core::Micros;

/// Default visible time span: one second.
pub const DEFAULT_WINDOW_WIDTH: Micros = 1_000_000;

/// Visible time span centred on a telemetry time.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RenderWindow {
    pub center: Micros,
    pub start: Micros,
    pub end: Micros,
    pub width: Micros,
}

impl RenderWindow {
    pub fn new(center: Micros, width: Micros) -> Self {
        let width = width.max(1);
        let start = center - width / 2;
        Self {
            center,
            start,
            end: start + width,
            width,
        }
    }

    /// Horizontal pixel of `time` on a canvas `canvas_width` pixels wide.
    pub fn x_for(&self, time: Micros, canvas_width: f64) -> f64 {
        (time - self.start) as f64 * canvas_width / self.width as f64
    }

    pub fn contains(&self, time: Micros) -> bool {
        time >= self.start && time <= self.end
    }
}

/// Window width for a zoom factor, where 1.0 shows [`DEFAULT_WINDOW_WIDTH`].
pub fn window_width_for_zoom(zoom: f64) -> Micros {
    if !zoom.is_finite() || zoom <= 0.0 {
        return DEFAULT_WINDOW_WIDTH;
    }
    ((DEFAULT_WINDOW_WIDTH as f64 / zoom).round() as Micros).max(1)
}

#[cfg(test)]
#[path = "../../tests/unit/render/window.rs"]
mod tests;
