use crate::{
    foundation::core::{Point, Rect, Rgba8},
    graph::curve::ExpoCurve,
    render::scene::{Painter, TextAlign},
    render::style,
    telemetry::{catalog::FieldCatalog, source::Frame},
};

const YAW_STICK_MAX: f64 = 500.0;
const THROTTLE_MID: f64 = 1500.0;
const THROTTLE_HALF_RANGE: f64 = 500.0;

/// Expo curve used to place roll and pitch stick positions for a given RC rate.
pub fn pitch_stick_curve(rc_rate: f64) -> ExpoCurve {
    let rate = if rc_rate.is_finite() && rc_rate > 0.0 {
        rc_rate
    } else {
        100.0
    };
    ExpoCurve::new(0.0, 0.7, 500.0 * rate / 100.0, 1.0, 10)
}

/// Stick positions in `[-1, 1]`: left x (yaw), left y (throttle), right x (roll), right y
/// (pitch). Screen y grows downwards, so full throttle is `-1`.
///
/// `None` when any of the four command channels is missing.
pub fn stick_positions(frame: &Frame, catalog: &FieldCatalog, pitch_curve: &ExpoCurve) -> Option<[f64; 4]> {
    let mut rc = [0.0; 4];
    for (slot, index) in rc.iter_mut().zip(catalog.rc_command) {
        *slot = frame.value(index?)?;
    }
    let raw = [
        -rc[2] / YAW_STICK_MAX,
        (THROTTLE_MID - rc[3]) / THROTTLE_HALF_RANGE,
        pitch_curve.lookup(rc[0]),
        pitch_curve.lookup(-rc[1]),
    ];
    Some(raw.map(|p| if p.is_nan() { 0.0 } else { p.clamp(-1.0, 1.0) }))
}

/// Draw both stick boxes centred on the painter's current origin.
pub(crate) fn draw_sticks(
    p: &mut Painter<'_>,
    frame: &Frame,
    catalog: &FieldCatalog,
    pitch_curve: &ExpoCurve,
) {
    let Some(positions) = stick_positions(frame, catalog, pitch_curve) else {
        return;
    };
    let radius = p.height() / 11.0;
    let spacing = radius * 3.0;
    let label_gap = 8.0;

    p.save();
    p.translate(-spacing / 2.0, 0.0);
    for stick in 0..2 {
        p.fill_rect(
            Rect::new(-radius, -radius, radius, radius),
            style::STICK_AREA,
        );
        p.line(
            Point::new(-radius, 0.0),
            Point::new(radius, 0.0),
            style::STICK_CROSSHAIR,
            1.0,
        );
        p.line(
            Point::new(0.0, -radius),
            Point::new(0.0, radius),
            style::STICK_CROSSHAIR,
            1.0,
        );
        p.fill_circle(
            Point::new(positions[stick * 2] * radius, positions[stick * 2 + 1] * radius),
            radius / 5.0,
            style::STICK_DOT,
        );

        // Left stick is labelled with yaw/throttle, right stick with roll/pitch.
        let channels = if stick == 0 { (2, 3) } else { (0, 1) };
        let value = |ch: usize| {
            catalog.rc_command[ch]
                .and_then(|i| frame.value(i))
                .map(|v| v.to_string())
                .unwrap_or_default()
        };
        p.text(
            value(channels.0),
            Point::new(0.0, radius + style::CURRENT_VALUE_POINTS + label_gap),
            style::FONT_CURRENT_VALUE,
            TextAlign::Center,
            Rgba8::WHITE,
        );
        p.text(
            value(channels.1),
            Point::new(-radius - label_gap, style::CURRENT_VALUE_POINTS / 2.0),
            style::FONT_CURRENT_VALUE,
            TextAlign::Right,
            Rgba8::WHITE,
        );
        p.translate(spacing, 0.0);
    }
    p.restore();
}

#[cfg(test)]
#[path = "../../tests/unit/render/sticks.rs"]
mod tests;
