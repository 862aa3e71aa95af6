use std::path::Path;

use anyhow::Context as _;

use crate::foundation::{
    core::Point,
    error::{BlackboxError, BlackboxResult},
};

/// Where an overlay display sits on the canvas.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Position {
    #[default]
    TopLeft,
    TopCenter,
    TopRight,
    CenterLeft,
    CenterCenter,
    CenterRight,
    BottomLeft,
    BottomCenter,
    BottomRight,
    /// Uses the display's `x`/`y` percentages.
    Custom,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HAnchor {
    Left,
    Center,
    Right,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VAnchor {
    Top,
    Center,
    Bottom,
}

impl Position {
    const NAMES: [(Self, &'static str); 10] = [
        (Self::TopLeft, "top left"),
        (Self::TopCenter, "top center"),
        (Self::TopRight, "top right"),
        (Self::CenterLeft, "center left"),
        (Self::CenterCenter, "center center"),
        (Self::CenterRight, "center right"),
        (Self::BottomLeft, "bottom left"),
        (Self::BottomCenter, "bottom center"),
        (Self::BottomRight, "bottom right"),
        (Self::Custom, "custom"),
    ];

    pub fn as_str(self) -> &'static str {
        Self::NAMES
            .iter()
            .find(|(p, _)| *p == self)
            .map(|(_, n)| *n)
            .unwrap_or("custom")
    }

    pub fn parse(s: &str) -> BlackboxResult<Self> {
        Self::NAMES
            .iter()
            .find(|(_, n)| *n == s)
            .map(|(p, _)| *p)
            .ok_or_else(|| BlackboxError::validation(format!("unknown display position '{s}'")))
    }

    /// Anchors of a preset position; `None` for [`Position::Custom`].
    pub fn anchors(self) -> Option<(HAnchor, VAnchor)> {
        use HAnchor as H;
        use VAnchor as V;
        Some(match self {
            Self::TopLeft => (H::Left, V::Top),
            Self::TopCenter => (H::Center, V::Top),
            Self::TopRight => (H::Right, V::Top),
            Self::CenterLeft => (H::Left, V::Center),
            Self::CenterCenter => (H::Center, V::Center),
            Self::CenterRight => (H::Right, V::Center),
            Self::BottomLeft => (H::Left, V::Bottom),
            Self::BottomCenter => (H::Center, V::Bottom),
            Self::BottomRight => (H::Right, V::Bottom),
            Self::Custom => return None,
        })
    }
}

impl TryFrom<String> for Position {
    type Error = BlackboxError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<Position> for String {
    fn from(p: Position) -> Self {
        p.as_str().to_string()
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum CraftMode {
    #[default]
    #[serde(rename = "2D")]
    TwoD,
    #[serde(rename = "3D")]
    ThreeD,
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct DisplaySettings {
    pub show: bool,
    pub position: Position,
    /// Percent of canvas width, used with [`Position::Custom`].
    pub x: i32,
    /// Percent of canvas height, used with [`Position::Custom`].
    pub y: i32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mode: Option<CraftMode>,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self::at(Position::TopLeft)
    }
}

impl DisplaySettings {
    pub fn at(position: Position) -> Self {
        Self {
            show: true,
            position,
            x: 0,
            y: 0,
            mode: None,
        }
    }

    /// Centre point of a display widget on a `width` x `height` canvas.
    pub fn anchor_point(&self, width: f64, height: f64) -> Point {
        match self.position.anchors() {
            None => Point::new(
                f64::from(self.x) / 100.0 * width,
                f64::from(self.y) / 100.0 * height,
            ),
            Some((h, v)) => {
                let fx = match h {
                    HAnchor::Left => 0.25,
                    HAnchor::Center => 0.5,
                    HAnchor::Right => 0.75,
                };
                let fy = match v {
                    VAnchor::Top => 0.2,
                    VAnchor::Center => 0.5,
                    VAnchor::Bottom => 0.8,
                };
                Point::new(fx * width, fy * height)
            }
        }
    }
}

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Displays {
    pub craft: DisplaySettings,
    pub frame_number: DisplaySettings,
    pub sticks: DisplaySettings,
}

impl Default for Displays {
    fn default() -> Self {
        Self {
            craft: DisplaySettings {
                mode: Some(CraftMode::TwoD),
                ..DisplaySettings::at(Position::TopLeft)
            },
            frame_number: DisplaySettings::at(Position::BottomRight),
            sticks: DisplaySettings::at(Position::TopRight),
        }
    }
}

/// Which overlays the renderer draws and where.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    pub displays: Displays,
}

impl LayoutConfig {
    pub fn craft_mode(&self) -> CraftMode {
        self.displays.craft.mode.unwrap_or_default()
    }

    pub fn from_json_str(s: &str) -> BlackboxResult<Self> {
        Ok(serde_json::from_str(s)?)
    }

    pub fn load(path: &Path) -> BlackboxResult<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read layout config '{}'", path.display()))?;
        Self::from_json_str(&text)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/config/layout.rs"]
mod tests;
