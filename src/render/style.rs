//! Colours, line widths and font sizes used by the graph renderer.

use crate::foundation::core::Rgba8;

const fn rgba(r: u8, g: u8, b: u8, a: f64) -> Rgba8 {
    Rgba8::rgba(r, g, b, (a * 255.0 + 0.5) as u8)
}

/// Point sizes converted to pixels at 96 dpi.
const fn pt(points: f32) -> f32 {
    points * 4.0 / 3.0
}

pub const FONT_CURRENT_VALUE: f32 = pt(10.0);
pub const FONT_AXIS_LABEL: f32 = pt(9.0);
pub const FONT_FRAME_LABEL: f32 = pt(9.0);
pub const FONT_EVENT_LABEL: f32 = pt(8.0);
/// Point size of the event label font, which also spaces stacked event labels.
pub const EVENT_LABEL_POINTS: f64 = 8.0;
pub const FRAME_LABEL_POINTS: f64 = 9.0;
pub const CURRENT_VALUE_POINTS: f64 = 10.0;

pub const PLOT_LINE_WIDTH: f64 = 1.25;
pub const GAP_MARKER_RADIUS: f64 = 3.0;

/// Opaque fill used when the output cannot carry transparency.
pub const BACKGROUND_FILL: Rgba8 = Rgba8::BLACK;

pub const AXIS_LINE: Rgba8 = rgba(255, 255, 255, 0.5);
pub const AXIS_LABEL: Rgba8 = rgba(255, 255, 255, 0.9);
pub const CURRENT_TIME_BAR: Rgba8 = rgba(255, 64, 64, 0.2);
pub const CURRENT_TIME_BAR_WIDTH: f64 = 10.0;
pub const FRAME_LABEL: Rgba8 = rgba(255, 255, 255, 0.65);

pub const EVENT_LABEL: Rgba8 = rgba(255, 255, 255, 0.8);
pub const EVENT_LINE: Rgba8 = rgba(255, 255, 255, 0.5);
pub const SYNC_BEEP_LINE: Rgba8 = rgba(0, 0, 255, 0.75);
pub const SYNC_BEEP_WIDTH: f64 = 3.0;
pub const INFLIGHT_ADJUSTMENT_LINE: Rgba8 = rgba(0, 255, 255, 0.5);

pub const STICK_DOT: Rgba8 = rgba(255, 102, 102, 1.0);
pub const STICK_AREA: Rgba8 = rgba(76, 76, 76, 0.8);
pub const STICK_CROSSHAIR: Rgba8 = rgba(191, 191, 191, 0.5);

pub const CRAFT_ARM: Rgba8 = rgba(160, 160, 160, 1.0);
pub const CRAFT_MOTOR_OUTLINE: Rgba8 = rgba(255, 255, 255, 0.5);
