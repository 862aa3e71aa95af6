use crate::foundation::error::{BlackboxError, BlackboxResult};

pub use kurbo::{Affine, BezPath, Point, Rect, Vec2};

/// Telemetry time in microseconds. All log timestamps share this unit.
pub type Micros = i64;

/// Microseconds per second.
pub const MICROS_PER_SEC: f64 = 1_000_000.0;

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct FrameIndex(pub u64);

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Fps {
    pub num: u32,
    pub den: u32, // must be > 0
}

impl Fps {
    pub fn new(num: u32, den: u32) -> BlackboxResult<Self> {
        if den == 0 {
            return Err(BlackboxError::validation("Fps den must be > 0"));
        }
        if num == 0 {
            return Err(BlackboxError::validation("Fps num must be > 0"));
        }
        Ok(Self { num, den })
    }

    pub fn as_f64(self) -> f64 {
        f64::from(self.num) / f64::from(self.den)
    }

    /// Duration of one output frame in telemetry time units.
    pub fn frame_duration_micros(self) -> f64 {
        MICROS_PER_SEC * f64::from(self.den) / f64::from(self.num)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Canvas {
    pub width: u32,
    pub height: u32,
}

impl Canvas {
    pub fn new(width: u32, height: u32) -> BlackboxResult<Self> {
        if width == 0 || height == 0 {
            return Err(BlackboxError::validation("canvas width/height must be non-zero"));
        }
        if width > u32::from(u16::MAX) || height > u32::from(u16::MAX) {
            return Err(BlackboxError::validation(
                "canvas width/height must fit in 16 bits",
            ));
        }
        Ok(Self { width, height })
    }

    pub fn width_f64(self) -> f64 {
        f64::from(self.width)
    }

    pub fn height_f64(self) -> f64 {
        f64::from(self.height)
    }
}

/// Straight-alpha RGBA8 colour.
///
/// Serialized as a CSS-style hex string: `#rrggbb` or `#rrggbbaa`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Rgba8 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba8 {
    pub const WHITE: Self = Self::rgb(255, 255, 255);
    pub const BLACK: Self = Self::rgb(0, 0, 0);
    pub const TRANSPARENT: Self = Self::rgba(0, 0, 0, 0);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Colour with a fractional alpha, the way CSS `rgba(r,g,b,a)` is written.
    pub fn with_alpha_f(self, alpha: f64) -> Self {
        let a = (alpha.clamp(0.0, 1.0) * 255.0).round() as u8;
        Self { a, ..self }
    }

    pub fn parse_hex(s: &str) -> BlackboxResult<Self> {
        let hex = s
            .strip_prefix('#')
            .ok_or_else(|| BlackboxError::validation(format!("colour '{s}' must start with '#'")))?;
        let byte = |i: usize| -> BlackboxResult<u8> {
            hex.get(i..i + 2)
                .and_then(|h| u8::from_str_radix(h, 16).ok())
                .ok_or_else(|| BlackboxError::validation(format!("invalid colour '{s}'")))
        };
        match hex.len() {
            6 => Ok(Self::rgb(byte(0)?, byte(2)?, byte(4)?)),
            8 => Ok(Self::rgba(byte(0)?, byte(2)?, byte(4)?, byte(6)?)),
            _ => Err(BlackboxError::validation(format!(
                "colour '{s}' must be #rrggbb or #rrggbbaa"
            ))),
        }
    }

    pub fn to_hex(self) -> String {
        if self.a == 255 {
            format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            format!("#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
        }
    }

    /// Premultiplied RGBA8 bytes.
    pub fn premul(self) -> [u8; 4] {
        let a = u16::from(self.a);
        let p = |c: u8| crate::foundation::math::mul_div255_u8(u16::from(c), a);
        [p(self.r), p(self.g), p(self.b), self.a]
    }
}

impl TryFrom<String> for Rgba8 {
    type Error = BlackboxError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse_hex(&value)
    }
}

impl From<Rgba8> for String {
    fn from(c: Rgba8) -> Self {
        c.to_hex()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
