use super::*;
use crate::graph::config::PALETTE;
use crate::render::scene::{DrawOp, Scene};

fn motors(n: usize) -> FieldCatalog {
    let names: Vec<String> = (0..n).map(|i| format!("motor[{i}]")).collect();
    FieldCatalog::build(&names)
}

#[test]
fn quad_and_tri_layouts_are_fixed() {
    let quad = CraftParameters::for_catalog(&motors(4));
    let dirs: Vec<f64> = quad.motors.iter().map(|m| m.direction).collect();
    assert_eq!(dirs, vec![1.0, -1.0, -1.0, 1.0]);
    assert_eq!((quad.motors[2].x, quad.motors[2].y), (-0.71, 0.71));
    assert_eq!(quad.motors[3].color, PALETTE[3]);

    let tri = CraftParameters::for_catalog(&motors(3));
    assert_eq!((tri.motors[0].x, tri.motors[0].y), (0.0, 1.0));
    assert!(tri.motors.iter().all(|m| m.direction == -1.0));
}

#[test]
fn other_counts_fall_back_to_a_circle() {
    let hex = CraftParameters::for_catalog(&motors(6));
    assert_eq!(hex.motors.len(), 6);
    for (i, m) in hex.motors.iter().enumerate() {
        assert!(((m.x * m.x + m.y * m.y) - 1.0).abs() < 1e-12);
        assert_eq!(m.direction, if i % 2 == 0 { 1.0 } else { -1.0 });
    }
    assert!((hex.motors[0].x - 1.0).abs() < 1e-12);

    assert!(CraftParameters::for_catalog(&motors(0)).motors.is_empty());
}

#[test]
fn idle_motors_draw_no_wedge() {
    let cat = motors(4);
    let mut craft = Craft2D::new(CraftParameters::for_catalog(&cat), &SysConfig::default());
    assert_eq!(craft.kind(), CraftKind::TwoD);
    craft.resize(120.0);

    let frame = Frame {
        iteration: 0,
        time: 0,
        values: vec![1000.0, 1850.0, 1500.0, f64::NAN],
    };
    let mut scene = Scene::new(400, 400);
    craft.render(&mut Painter::new(&mut scene), &frame, &cat);

    // Two running motors get a wedge, plus the nose marker.
    let fills = scene
        .ops
        .iter()
        .filter(|op| matches!(op, DrawOp::FillPath { .. }))
        .count();
    assert_eq!(fills, 3);
    let labels = scene
        .ops
        .iter()
        .filter(|op| matches!(op, DrawOp::Text { .. }))
        .count();
    assert_eq!(labels, 3);
}
