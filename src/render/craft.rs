use std::f64::consts::{FRAC_PI_2, TAU};

use kurbo::Shape as _;

use crate::{
    foundation::core::{Point, Rgba8},
    render::scene::{Painter, TextAlign},
    render::style,
    telemetry::{catalog::FieldCatalog, source::Frame, source::SysConfig},
};

/// Which craft renderer a grapher was built with. Fixed for the grapher's lifetime.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CraftKind {
    TwoD,
    ThreeD,
}

/// One motor's placement on a unit-radius craft, `y` pointing forward.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MotorPlacement {
    pub x: f64,
    pub y: f64,
    /// `1` for clockwise, `-1` for counter-clockwise.
    pub direction: f64,
    pub color: Rgba8,
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct CraftParameters {
    pub motors: Vec<MotorPlacement>,
}

impl CraftParameters {
    /// Tricopter and quad layouts are fixed; any other motor count is spread around a circle.
    pub fn for_catalog(catalog: &FieldCatalog) -> Self {
        let colors = &catalog.motor_colors;
        let color = |i: usize| colors.get(i).copied().unwrap_or(Rgba8::WHITE);
        let place = |i: usize, x: f64, y: f64, direction: f64| MotorPlacement {
            x,
            y,
            direction,
            color: color(i),
        };

        let n = catalog.motors.len();
        let motors = match n {
            3 => vec![
                place(0, 0.0, 1.0, -1.0),
                place(1, 0.71, -0.71, -1.0),
                place(2, -0.71, -0.71, -1.0),
            ],
            4 => vec![
                place(0, 0.71, 0.71, 1.0),
                place(1, 0.71, -0.71, -1.0),
                place(2, -0.71, 0.71, -1.0),
                place(3, -0.71, -0.71, 1.0),
            ],
            _ => (0..n)
                .map(|i| {
                    let a = i as f64 / n as f64 * TAU;
                    let direction = if i % 2 == 0 { 1.0 } else { -1.0 };
                    place(i, a.cos(), a.sin(), direction)
                })
                .collect(),
        };
        Self { motors }
    }
}

/// Draws the craft pose for the centre frame.
///
/// The painter's origin is already at the craft's display anchor. 3D renderers live outside this
/// crate and typically paint a pre-rendered image op.
pub trait CraftRenderer: Send {
    fn kind(&self) -> CraftKind;

    fn render(&mut self, painter: &mut Painter<'_>, frame: &Frame, catalog: &FieldCatalog);

    /// `size` is the craft's diameter in pixels.
    fn resize(&mut self, _size: f64) {}
}

/// Top-down craft: arms to each motor, motors filled clockwise by their output.
#[derive(Clone, Debug)]
pub struct Craft2D {
    params: CraftParameters,
    min_throttle: f64,
    max_throttle: f64,
    size: f64,
}

impl Craft2D {
    pub fn new(params: CraftParameters, sys: &SysConfig) -> Self {
        Self {
            params,
            min_throttle: sys.min_throttle,
            max_throttle: sys.max_throttle,
            size: 100.0,
        }
    }

    pub fn params(&self) -> &CraftParameters {
        &self.params
    }

    fn motor_fraction(&self, value: f64) -> f64 {
        let range = self.max_throttle - self.min_throttle;
        if !value.is_finite() || range <= 0.0 {
            return 0.0;
        }
        ((value - self.min_throttle) / range).clamp(0.0, 1.0)
    }
}

impl CraftRenderer for Craft2D {
    fn kind(&self) -> CraftKind {
        CraftKind::TwoD
    }

    fn render(&mut self, p: &mut Painter<'_>, frame: &Frame, catalog: &FieldCatalog) {
        let arm = self.size * 0.35;
        let motor_radius = self.size * 0.13;

        for (placement, &field) in self.params.motors.iter().zip(&catalog.motors) {
            let centre = Point::new(placement.x * arm, -placement.y * arm);
            p.line(Point::ORIGIN, centre, style::CRAFT_ARM, 2.0);

            let value = frame.value(field).unwrap_or(f64::NAN);
            let fraction = self.motor_fraction(value);
            if fraction > 0.0 {
                let sweep = fraction * TAU * placement.direction;
                let wedge = kurbo::CircleSegment::new(centre, motor_radius, 0.0, -FRAC_PI_2, sweep);
                p.fill_path(wedge.to_path(0.1), placement.color.with_alpha_f(0.8));
            }
            p.stroke_path(
                kurbo::Circle::new(centre, motor_radius).to_path(0.1),
                style::CRAFT_MOTOR_OUTLINE,
                1.0,
            );
            if value.is_finite() {
                p.text(
                    value.to_string(),
                    Point::new(centre.x, centre.y + motor_radius + style::CURRENT_VALUE_POINTS + 4.0),
                    style::FONT_CURRENT_VALUE,
                    TextAlign::Center,
                    Rgba8::WHITE,
                );
            }
        }

        // Nose marker.
        let nose = arm * 0.4;
        let mut path = kurbo::BezPath::new();
        path.move_to(Point::new(0.0, -nose));
        path.line_to(Point::new(nose * 0.5, -nose * 0.2));
        path.line_to(Point::new(-nose * 0.5, -nose * 0.2));
        path.close_path();
        p.fill_path(path, style::CRAFT_ARM);
    }

    fn resize(&mut self, size: f64) {
        if size.is_finite() && size > 0.0 {
            self.size = size;
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/craft.rs"]
mod tests;
