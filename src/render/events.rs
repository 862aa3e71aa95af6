use std::sync::Arc;

use crate::{
    foundation::core::{Micros, Point, Rgba8},
    render::scene::{Painter, TextAlign},
    render::style,
    render::window::RenderWindow,
    telemetry::source::{Chunk, EventKind, LogEvent},
};

/// Events this far left of the window are still drawn so their labels scroll out smoothly.
pub const EVENT_LEAD_IN: Micros = 100_000;

/// Draw event markers for every event in `chunks` within the window plus lead-in.
///
/// Events are stacked vertically by the order they are drawn in.
pub(crate) fn draw_events(p: &mut Painter<'_>, chunks: &[Arc<Chunk>], window: &RenderWindow) {
    let mut sequence = 0usize;
    for chunk in chunks {
        for event in &chunk.events {
            if event.time > window.end {
                return;
            }
            if event.time >= window.start - EVENT_LEAD_IN {
                draw_event(p, event, sequence, window);
                sequence += 1;
            }
        }
    }
}

fn draw_event(p: &mut Painter<'_>, event: &LogEvent, sequence: usize, window: &RenderWindow) {
    let x = window.x_for(event.time, p.width());
    let label_y = (sequence as f64 + 1.0) * (style::EVENT_LABEL_POINTS + 8.0);

    match &event.kind {
        EventKind::AutotuneTargets => {
            let mid = p.height() / 2.0;
            p.line(
                Point::new(x, mid - 25.0),
                Point::new(x, mid + 25.0),
                style::EVENT_LINE,
                1.0,
            );
        }
        EventKind::SyncBeep => event_line(
            p,
            x,
            label_y,
            Some("Arming beep begins".to_string()),
            style::SYNC_BEEP_LINE,
            style::SYNC_BEEP_WIDTH,
        ),
        EventKind::GtuneCycleResult {
            axis,
            gyro_avg,
            new_p,
        } => event_line(
            p,
            x,
            label_y,
            Some(format!(
                "GTune result - axis:{axis} gyroAVG:{gyro_avg} newP:{new_p}"
            )),
            style::EVENT_LINE,
            1.0,
        ),
        EventKind::InflightAdjustment { name, value } => event_line(
            p,
            x,
            label_y,
            Some(format!("{name} = {value}")),
            style::INFLIGHT_ADJUSTMENT_LINE,
            1.0,
        ),
        EventKind::LoggingResume | EventKind::Other { .. } => {
            event_line(p, x, label_y, None, style::EVENT_LINE, 1.0)
        }
    }
}

fn event_line(
    p: &mut Painter<'_>,
    x: f64,
    label_y: f64,
    label: Option<String>,
    color: Rgba8,
    width: f64,
) {
    let h = p.height();
    p.line(Point::new(x, 0.0), Point::new(x, h), color, width);
    if let Some(label) = label {
        p.text(
            label,
            Point::new(x + width + 2.0, label_y),
            style::FONT_EVENT_LABEL,
            TextAlign::Left,
            style::EVENT_LABEL,
        );
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/events.rs"]
mod tests;
