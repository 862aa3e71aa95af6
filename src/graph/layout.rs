use crate::{
    foundation::core::Rgba8,
    graph::config::{GraphConfig, PALETTE},
    graph::curve::ExpoCurve,
    telemetry::source::{SmoothingMap, TelemetrySource},
};

/// Fraction of each track slot that the track actually draws into.
pub const TRACK_FILL: f64 = 0.95;

#[derive(Clone, Debug, PartialEq)]
pub struct ResolvedField {
    pub name: String,
    /// Buffer index, `None` when the log has no such field.
    pub index: Option<usize>,
    pub curve: ExpoCurve,
    pub color: Rgba8,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ResolvedGraph {
    pub label: String,
    pub fields: Vec<ResolvedField>,
    /// Normalized vertical centre.
    pub y: f64,
    /// Normalized slot height before the track fill shrink.
    pub slot: f64,
    /// Normalized drawn height, `slot * TRACK_FILL`.
    pub height: f64,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LayoutIssue {
    UnknownField { graph: usize, field: String },
}

impl std::fmt::Display for LayoutIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownField { graph, field } => {
                write!(f, "graph {graph}: field '{field}' is not in this log")
            }
        }
    }
}

/// Output of [`resolve`]. Replaces any earlier resolution wholesale.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Resolution {
    pub graphs: Vec<ResolvedGraph>,
    pub issues: Vec<LayoutIssue>,
    pub smoothing: SmoothingMap,
}

/// Resolve field names against `source`, pack tracks vertically and push the smoothing map.
#[tracing::instrument(skip_all, fields(graphs = config.graphs.len()))]
pub fn resolve(config: &GraphConfig, source: &dyn TelemetrySource) -> Resolution {
    let mut out = Resolution::default();

    let weights: Vec<f64> = config.graphs.iter().map(|g| track_weight(g.height)).collect();
    let packing = pack_tracks(&weights);

    for (gi, (spec, (y, slot))) in config.graphs.iter().zip(packing).enumerate() {
        let mut fields = Vec::with_capacity(spec.fields.len());
        for (fi, field) in spec.fields.iter().enumerate() {
            let index = source.field_index_by_name(&field.name);
            match index {
                Some(index) => {
                    if let Some(interval) = field.smoothing.filter(|&s| s > 0) {
                        out.smoothing.insert(index, interval);
                    }
                }
                None => out.issues.push(LayoutIssue::UnknownField {
                    graph: gi,
                    field: field.name.clone(),
                }),
            }
            fields.push(ResolvedField {
                name: field.name.clone(),
                index,
                curve: ExpoCurve::from_params(&field.curve),
                color: field.color.unwrap_or(PALETTE[fi % PALETTE.len()]),
            });
        }
        out.graphs.push(ResolvedGraph {
            label: spec.label.clone(),
            fields,
            y,
            slot,
            height: slot * TRACK_FILL,
        });
    }

    for issue in &out.issues {
        tracing::warn!(%issue, "graph layout issue");
    }
    source.set_field_smoothing(out.smoothing.clone());
    out
}

fn track_weight(height: Option<f64>) -> f64 {
    match height {
        None => 1.0,
        Some(h) if !h.is_finite() => 1.0,
        Some(h) => h.max(0.0),
    }
}

/// `(centre, slot)` per track, stacked top to bottom in order.
pub fn pack_tracks(weights: &[f64]) -> Vec<(f64, f64)> {
    let sum: f64 = weights.iter().sum();
    let equal = sum <= 0.0;
    let mut allocated = 0.0;
    weights
        .iter()
        .map(|&w| {
            let slot = if equal {
                1.0 / weights.len() as f64
            } else {
                w / sum
            };
            let centre = allocated + slot / 2.0;
            allocated += slot;
            (centre, slot)
        })
        .collect()
}

#[cfg(test)]
#[path = "../../tests/unit/graph/layout.rs"]
mod tests;
