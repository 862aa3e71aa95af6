use super::*;
use crate::graph::config::{FieldSpec, GraphSpec};
use crate::graph::curve::CurveParams;
use crate::telemetry::memory::FlightLog;

fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-12
}

fn log() -> FlightLog {
    let mut b = FlightLog::builder(vec!["gyroADC[0]".to_string(), "motor[0]".to_string()]);
    for i in 0..5u64 {
        b.push_frame(i, i as i64 * 1000, vec![i as f64, 1000.0]).unwrap();
    }
    b.build().unwrap()
}

fn graph(label: &str, height: Option<f64>, fields: &[&str]) -> GraphSpec {
    GraphSpec {
        label: label.to_string(),
        height,
        fields: fields
            .iter()
            .map(|n| FieldSpec::new(*n, CurveParams::default()))
            .collect(),
    }
}

#[test]
fn packs_weights_top_to_bottom() {
    let packed = pack_tracks(&[1.0, 1.0, 2.0]);
    let slots: Vec<f64> = packed.iter().map(|p| p.1).collect();
    let centres: Vec<f64> = packed.iter().map(|p| p.0).collect();
    assert_eq!(slots, vec![0.25, 0.25, 0.5]);
    assert_eq!(centres, vec![0.125, 0.375, 0.75]);
}

#[test]
fn zero_weights_share_equally() {
    let packed = pack_tracks(&[0.0, 0.0]);
    assert_eq!(packed, vec![(0.25, 0.5), (0.75, 0.5)]);
}

#[test]
fn resolve_applies_track_fill_and_defaults() {
    let cfg = GraphConfig {
        graphs: vec![
            graph("a", None, &["gyroADC[0]"]),
            graph("b", Some(1.0), &["motor[0]"]),
            graph("c", Some(2.0), &[]),
        ],
    };
    let res = resolve(&cfg, &log());
    assert!(res.issues.is_empty());
    assert!(approx(res.graphs[0].height, 0.25 * 0.95));
    assert!(approx(res.graphs[2].height, 0.5 * 0.95));
    assert!(approx(res.graphs[2].y, 0.75));
    assert_eq!(res.graphs[1].fields[0].index, Some(1));
    assert_eq!(res.graphs[0].fields[0].color, PALETTE[0]);
}

#[test]
fn malformed_weights_are_clamped() {
    let cfg = GraphConfig {
        graphs: vec![graph("a", Some(-3.0), &[]), graph("b", Some(f64::NAN), &[])],
    };
    let res = resolve(&cfg, &log());
    assert_eq!(res.graphs[0].slot, 0.0);
    assert_eq!(res.graphs[1].slot, 1.0);
}

#[test]
fn unknown_fields_are_reported_and_kept_unresolved() {
    let cfg = GraphConfig {
        graphs: vec![graph("a", None, &["nope", "gyroADC[0]"])],
    };
    let res = resolve(&cfg, &log());
    assert_eq!(
        res.issues,
        vec![LayoutIssue::UnknownField {
            graph: 0,
            field: "nope".to_string()
        }]
    );
    assert_eq!(res.graphs[0].fields[0].index, None);
    assert_eq!(res.graphs[0].fields[1].index, Some(0));
    // Second field still gets the second palette colour.
    assert_eq!(res.graphs[0].fields[1].color, PALETTE[1]);
}

#[test]
fn only_positive_smoothing_is_pushed_to_the_source() {
    let mut g = graph("a", None, &[]);
    g.fields.push(FieldSpec::new("gyroADC[0]", CurveParams::default()).with_smoothing(2000));
    g.fields.push(FieldSpec::new("motor[0]", CurveParams::default()).with_smoothing(0));
    g.fields.push(FieldSpec::new("nope", CurveParams::default()).with_smoothing(5000));
    let cfg = GraphConfig { graphs: vec![g] };

    let log = log();
    let res = resolve(&cfg, &log);
    assert_eq!(res.smoothing.len(), 1);
    assert_eq!(res.smoothing.get(&0), Some(&2000));

    // Frame 0 averages itself with frame 1.
    let f = log.frame_at_time(0).unwrap();
    assert!(approx(f.values[0], 0.5));
}
