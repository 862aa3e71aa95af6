/// Serializable expo curve settings attached to a field.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct CurveParams {
    /// Added to the raw value before the curve is applied.
    pub offset: f64,
    pub power: f64,
    pub input_range: f64,
    pub output_range: f64,
    /// Sample points in the discretized expo table.
    pub steps: u32,
}

impl Default for CurveParams {
    fn default() -> Self {
        Self {
            offset: 0.0,
            power: 1.0,
            input_range: 500.0,
            output_range: 1.0,
            steps: ExpoCurve::DEFAULT_STEPS,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
enum Shape {
    Linear { scale: f64 },
    Table { input_scale: f64, points: Vec<f64> },
}

/// Maps a raw field value to a signed position, where `output_range` is a full half-height.
///
/// The curve is odd-symmetric around `-offset`. With `power != 1` the response is sampled into
/// `steps` points of `x^power` and linearly interpolated between them; values beyond
/// `input_range` extrapolate along the last segment.
#[derive(Clone, Debug, PartialEq)]
pub struct ExpoCurve {
    offset: f64,
    shape: Shape,
}

impl ExpoCurve {
    pub const DEFAULT_STEPS: u32 = 12;

    pub fn new(offset: f64, power: f64, input_range: f64, output_range: f64, steps: u32) -> Self {
        let offset = if offset.is_finite() { offset } else { 0.0 };
        let power = if power.is_finite() && power > 0.0 { power } else { 1.0 };
        let input_range = if input_range.is_finite() && input_range > 0.0 {
            input_range
        } else {
            1.0
        };
        let output_range = if output_range.is_finite() { output_range } else { 1.0 };

        let shape = if steps <= 2 || power == 1.0 {
            Shape::Linear {
                scale: output_range / input_range,
            }
        } else {
            let last = f64::from(steps - 1);
            let points = (0..steps)
                .map(|i| (f64::from(i) / last).powf(power) * output_range)
                .collect();
            Shape::Table {
                input_scale: last / input_range,
                points,
            }
        };

        Self { offset, shape }
    }

    pub fn from_params(p: &CurveParams) -> Self {
        Self::new(p.offset, p.power, p.input_range, p.output_range, p.steps)
    }

    pub fn lookup(&self, value: f64) -> f64 {
        let v = value + self.offset;
        match &self.shape {
            Shape::Linear { scale } => v * scale,
            Shape::Table {
                input_scale,
                points,
            } => {
                let scaled = v.abs() * input_scale;
                if !scaled.is_finite() {
                    return f64::NAN;
                }
                let step = (scaled.floor() as usize).min(points.len() - 2);
                let (a, b) = (points[step], points[step + 1]);
                let out = a + (b - a) * (scaled - step as f64);
                if v < 0.0 { -out } else { out }
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/graph/curve.rs"]
mod tests;
