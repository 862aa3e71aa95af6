use std::path::Path;

use anyhow::Context as _;

use crate::{
    foundation::core::{Micros, Rgba8},
    foundation::error::BlackboxResult,
    graph::curve::CurveParams,
    telemetry::{catalog::FieldCatalog, source::SysConfig},
};

/// Line colours, assigned in order to fields without a fixed colour and to motors.
pub const PALETTE: [Rgba8; 12] = [
    Rgba8::rgb(0xfb, 0x80, 0x72),
    Rgba8::rgb(0x8d, 0xd3, 0xc7),
    Rgba8::rgb(0xff, 0xff, 0xb3),
    Rgba8::rgb(0xbe, 0xba, 0xda),
    Rgba8::rgb(0x80, 0xb1, 0xd3),
    Rgba8::rgb(0xfd, 0xb4, 0x62),
    Rgba8::rgb(0xb3, 0xde, 0x69),
    Rgba8::rgb(0xfc, 0xcd, 0xe5),
    Rgba8::rgb(0xd9, 0xd9, 0xd9),
    Rgba8::rgb(0xbc, 0x80, 0xbd),
    Rgba8::rgb(0xcc, 0xeb, 0xc5),
    Rgba8::rgb(0xff, 0xed, 0x6f),
];

/// Ordered list of graph tracks, top to bottom.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    pub graphs: Vec<GraphSpec>,
}

#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct GraphSpec {
    pub label: String,
    /// Relative height weight; `None` counts as 1.0.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<f64>,
    pub fields: Vec<FieldSpec>,
}

#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct FieldSpec {
    pub name: String,
    pub curve: CurveParams,
    /// Smoothing interval in microseconds; only positive values apply.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub smoothing: Option<Micros>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<Rgba8>,
}

impl FieldSpec {
    pub fn new(name: impl Into<String>, curve: CurveParams) -> Self {
        Self {
            name: name.into(),
            curve,
            smoothing: None,
            color: None,
        }
    }

    pub fn with_smoothing(mut self, micros: Micros) -> Self {
        self.smoothing = Some(micros);
        self
    }

    pub fn with_color(mut self, color: Rgba8) -> Self {
        self.color = Some(color);
        self
    }
}

impl GraphConfig {
    pub fn from_json_str(s: &str) -> BlackboxResult<Self> {
        Ok(serde_json::from_str(s)?)
    }

    pub fn to_json_string(&self) -> BlackboxResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn load(path: &Path) -> BlackboxResult<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read graph config '{}'", path.display()))?;
        Self::from_json_str(&text)
    }

    pub fn save(&self, path: &Path) -> BlackboxResult<()> {
        std::fs::write(path, self.to_json_string()?)
            .with_context(|| format!("failed to write graph config '{}'", path.display()))?;
        Ok(())
    }

    /// Starter layout: motors, tail servo and gyros, whichever the log carries.
    pub fn default_for(catalog: &FieldCatalog, sys: &SysConfig) -> Self {
        let motor_curve = CurveParams {
            offset: -(sys.max_throttle + sys.min_throttle) / 2.0,
            power: 1.0,
            input_range: (sys.max_throttle - sys.min_throttle) / 2.0,
            output_range: 1.0,
            steps: 0,
        };
        let servo_curve = CurveParams {
            offset: -(sys.max_servo + sys.min_servo) / 2.0,
            power: 1.0,
            input_range: (sys.max_servo - sys.min_servo) / 2.0,
            output_range: 1.0,
            steps: 0,
        };
        let gyro_curve = CurveParams {
            offset: 0.0,
            power: 0.25,
            input_range: 9.0e-6 / sys.gyro_scale,
            output_range: 1.0,
            steps: 10,
        };

        let names = catalog.names();
        let mut graphs = Vec::new();

        let motors: Vec<FieldSpec> = catalog
            .motors
            .iter()
            .take(4)
            .map(|&i| FieldSpec::new(names[i].clone(), motor_curve).with_smoothing(5000))
            .collect();
        if !motors.is_empty() {
            graphs.push(GraphSpec {
                label: "Motors".to_string(),
                height: None,
                fields: motors,
            });
        }

        if let Some(&tail) = catalog.servos.get(&5) {
            graphs.push(GraphSpec {
                label: "Servos".to_string(),
                height: None,
                fields: vec![FieldSpec::new(names[tail].clone(), servo_curve)],
            });
        }

        let gyros: Vec<FieldSpec> = catalog
            .gyro
            .iter()
            .flatten()
            .map(|&i| FieldSpec::new(names[i].clone(), gyro_curve).with_smoothing(3000))
            .collect();
        if !gyros.is_empty() {
            graphs.push(GraphSpec {
                label: "Gyros".to_string(),
                height: None,
                fields: gyros,
            });
        }

        Self { graphs }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/graph/config.rs"]
mod tests;
