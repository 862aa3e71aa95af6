use super::*;

#[test]
fn painter_translates_and_restores() {
    let mut scene = Scene::new(100, 50);
    {
        let mut p = Painter::new(&mut scene);
        p.save();
        p.translate(10.0, 20.0);
        p.fill_rect(Rect::new(0.0, 0.0, 5.0, 5.0), Rgba8::WHITE);
        p.restore();
        p.fill_rect(Rect::new(0.0, 0.0, 5.0, 5.0), Rgba8::WHITE);
    }
    let rects: Vec<Rect> = scene
        .ops
        .iter()
        .filter_map(|op| match op {
            DrawOp::FillRect { rect, .. } => Some(*rect),
            _ => None,
        })
        .collect();
    assert_eq!(rects[0], Rect::new(10.0, 20.0, 15.0, 25.0));
    assert_eq!(rects[1], Rect::new(0.0, 0.0, 5.0, 5.0));
}

#[test]
fn text_origin_is_transformed() {
    let mut scene = Scene::new(100, 50);
    {
        let mut p = Painter::new(&mut scene);
        p.translate(0.0, 25.0);
        p.text("x", Point::new(92.0, -8.0), 12.0, TextAlign::Right, Rgba8::WHITE);
    }
    let DrawOp::Text { origin, align, .. } = &scene.ops[0] else {
        panic!("expected text op");
    };
    assert_eq!(*origin, Point::new(92.0, 17.0));
    assert_eq!(*align, TextAlign::Right);
}

#[test]
fn empty_strokes_are_dropped() {
    let mut scene = Scene::new(10, 10);
    Painter::new(&mut scene).stroke_path(BezPath::new(), Rgba8::WHITE, 1.0);
    assert!(scene.ops.is_empty());
}

#[test]
fn unbalanced_restore_is_harmless() {
    let mut scene = Scene::new(10, 10);
    let mut p = Painter::new(&mut scene);
    p.restore();
    p.line(Point::new(0.0, 0.0), Point::new(1.0, 0.0), Rgba8::WHITE, 1.0);
    assert_eq!(scene.ops.len(), 1);
}
