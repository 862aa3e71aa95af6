use std::collections::BTreeMap;

use crate::{foundation::core::Rgba8, graph::config::PALETTE};

/// Typed view of a source's field names, built once per source bind.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FieldCatalog {
    names: Vec<String>,
    /// Buffer index per motor, in motor-number order.
    pub motors: Vec<usize>,
    /// Palette colour per motor, parallel to `motors`.
    pub motor_colors: Vec<Rgba8>,
    /// Buffer index per servo number.
    pub servos: BTreeMap<usize, usize>,
    /// roll, pitch, yaw, throttle.
    pub rc_command: [Option<usize>; 4],
    /// `[P, I, D][axis]`.
    pub axis_pid: [[Option<usize>; 3]; 3],
    pub axis_pid_sum: [Option<usize>; 3],
    pub gyro: [Option<usize>; 3],
    pub acc: [Option<usize>; 3],
    /// Synthetic attitude: roll, pitch, heading.
    pub attitude: [Option<usize>; 3],
    pub vbat: Option<usize>,
    pub baro: Option<usize>,
    pub misc: Vec<usize>,
}

impl FieldCatalog {
    pub fn build(field_names: &[String]) -> Self {
        let mut cat = Self {
            names: field_names.to_vec(),
            ..Self::default()
        };
        let mut motors = BTreeMap::<usize, usize>::new();

        for (index, name) in field_names.iter().enumerate() {
            if let Some((base, n)) = split_indexed(name) {
                match base {
                    "motor" => {
                        motors.insert(n, index);
                    }
                    "servo" => {
                        cat.servos.insert(n, index);
                    }
                    "rcCommand" if n < 4 => cat.rc_command[n] = Some(index),
                    "axisPID" if n < 3 => cat.axis_pid_sum[n] = Some(index),
                    "axisP" if n < 3 => cat.axis_pid[0][n] = Some(index),
                    "axisI" if n < 3 => cat.axis_pid[1][n] = Some(index),
                    "axisD" if n < 3 => cat.axis_pid[2][n] = Some(index),
                    "gyroADC" | "gyroData" if n < 3 => cat.gyro[n] = Some(index),
                    "accSmooth" if n < 3 => cat.acc[n] = Some(index),
                    "heading" if n < 3 => cat.attitude[n] = Some(index),
                    _ => cat.misc.push(index),
                }
                continue;
            }
            match name.as_str() {
                "vbatLatest" => cat.vbat = Some(index),
                "BaroAlt" => cat.baro = Some(index),
                "roll" => cat.attitude[0] = Some(index),
                "pitch" => cat.attitude[1] = Some(index),
                "heading" => cat.attitude[2] = Some(index),
                _ => cat.misc.push(index),
            }
        }

        for (i, (_, index)) in motors.into_iter().enumerate() {
            cat.motors.push(index);
            cat.motor_colors.push(PALETTE[i % PALETTE.len()]);
        }
        cat
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// True when all four stick channels are present.
    pub fn has_sticks(&self) -> bool {
        self.rc_command.iter().all(Option::is_some)
    }
}

/// Split `name[3]` into `("name", 3)`.
pub(crate) fn split_indexed(name: &str) -> Option<(&str, usize)> {
    let open = name.find('[')?;
    let inner = name[open + 1..].strip_suffix(']')?;
    let n = inner.parse::<usize>().ok()?;
    Some((&name[..open], n))
}

/// Display name for a raw field name.
pub fn friendly_field_name(name: &str) -> String {
    const AXES: [&str; 3] = ["roll", "pitch", "yaw"];
    const XYZ: [&str; 3] = ["X", "Y", "Z"];

    match name {
        "vbatLatest" => return "vbat".to_string(),
        "BaroAlt" => return "baro".to_string(),
        "servo[5]" => return "tail servo".to_string(),
        _ => {}
    }

    let Some((base, n)) = split_indexed(name) else {
        return name.to_string();
    };
    match (base, n) {
        ("axisP", 0..=2) => format!("PID_P[{}]", AXES[n]),
        ("axisI", 0..=2) => format!("PID_I[{}]", AXES[n]),
        ("axisD", 0..=2) => format!("PID_D[{}]", AXES[n]),
        ("rcCommand", 0..=2) => format!("rcCommand[{}]", AXES[n]),
        ("rcCommand", 3) => "rcCommand[throttle]".to_string(),
        ("gyroData" | "gyroADC", 0..=2) => format!("gyro[{}]", AXES[n]),
        ("accSmooth", 0..=2) => format!("acc[{}]", XYZ[n]),
        ("magADC", 0..=2) => format!("mag[{}]", XYZ[n]),
        ("heading", 0..=2) => format!("heading[{}]", AXES[n]),
        // Motors are numbered from one for people.
        ("motor", _) => format!("motor[{}]", n + 1),
        _ => name.to_string(),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/telemetry/catalog.rs"]
mod tests;
