//! Frame rendering: the grapher builds a [`Scene`], a [`RasterBackend`] turns it into pixels.

pub mod backend;
pub mod cpu;
pub mod craft;
pub(crate) mod events;
pub mod grapher;
pub mod scene;
pub mod sticks;
pub mod style;
pub(crate) mod text;
pub mod window;

pub use backend::{FrameRGBA, RasterBackend};
pub use cpu::CpuBackend;
pub use craft::{Craft2D, CraftKind, CraftParameters, CraftRenderer, MotorPlacement};
pub use grapher::{Background, Grapher, GrapherOptions, Trace, trace_field};
pub use scene::{DrawOp, Painter, RasterImage, Scene, TextAlign};
pub use window::{DEFAULT_WINDOW_WIDTH, RenderWindow, window_width_for_zoom};
