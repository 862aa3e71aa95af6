//! Display layout and named preset storage.

pub mod layout;
pub mod presets;

pub use layout::{CraftMode, DisplaySettings, Displays, HAnchor, LayoutConfig, Position, VAnchor};
pub use presets::{Preset, PresetEvent, Presets, SavedPresets};
