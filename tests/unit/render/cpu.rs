use super::*;

fn px(frame: &FrameRGBA, x: u32, y: u32) -> [u8; 4] {
    let i = ((y * frame.width + x) * 4) as usize;
    [frame.data[i], frame.data[i + 1], frame.data[i + 2], frame.data[i + 3]]
}

fn close(a: [u8; 4], b: [u8; 4]) -> bool {
    a.iter().zip(b).all(|(&x, y)| x.abs_diff(y) <= 2)
}

#[test]
fn rects_composite_source_over() {
    let mut scene = Scene::new(8, 8);
    scene.ops.push(DrawOp::FillRect {
        rect: Rect::new(0.0, 0.0, 8.0, 8.0),
        color: Rgba8::rgb(255, 0, 0),
    });
    scene.ops.push(DrawOp::FillRect {
        rect: Rect::new(4.0, 0.0, 8.0, 8.0),
        color: Rgba8::rgba(0, 0, 255, 128),
    });

    let frame = CpuBackend::new().render_scene(&scene).unwrap();
    assert!(frame.premultiplied);
    assert_eq!(frame.data.len(), 8 * 8 * 4);
    assert!(close(px(&frame, 1, 1), [255, 0, 0, 255]));
    assert!(close(px(&frame, 6, 6), [127, 0, 128, 255]));
}

#[test]
fn images_are_scaled_into_dest() {
    let mut scene = Scene::new(8, 8);
    scene.ops.push(DrawOp::Image {
        image: Arc::new(RasterImage {
            width: 1,
            height: 1,
            data: vec![0, 255, 0, 255],
        }),
        dest: Rect::new(2.0, 2.0, 6.0, 6.0),
    });

    let frame = CpuBackend::new().render_scene(&scene).unwrap();
    assert!(close(px(&frame, 4, 4), [0, 255, 0, 255]));
    assert_eq!(px(&frame, 0, 0), [0, 0, 0, 0]);
    assert_eq!(px(&frame, 7, 7), [0, 0, 0, 0]);
}

#[test]
fn strokes_cover_the_line_and_text_needs_a_font() {
    let mut scene = Scene::new(10, 10);
    let mut path = BezPath::new();
    path.move_to((0.0, 5.0));
    path.line_to((10.0, 5.0));
    scene.ops.push(DrawOp::StrokePath {
        path,
        color: Rgba8::WHITE,
        width: 2.0,
    });
    scene.ops.push(DrawOp::Text {
        text: "ignored".to_string(),
        origin: Point::new(0.0, 9.0),
        size_px: 8.0,
        align: TextAlign::Left,
        color: Rgba8::WHITE,
    });

    let mut backend = CpuBackend::new();
    assert!(!backend.has_font());
    let frame = backend.render_scene(&scene).unwrap();
    assert!(close(px(&frame, 5, 4), [255, 255, 255, 255]));
    assert_eq!(px(&frame, 5, 0), [0, 0, 0, 0]);
    assert_eq!(px(&frame, 5, 9), [0, 0, 0, 0]);
}

#[test]
fn backend_is_reusable_across_sizes() {
    let mut backend = CpuBackend::new();
    let a = backend.render_scene(&Scene::new(4, 2)).unwrap();
    let b = backend.render_scene(&Scene::new(2, 4)).unwrap();
    assert_eq!((a.width, a.height), (4, 2));
    assert_eq!((b.width, b.height), (2, 4));
    assert!(b.data.iter().all(|&v| v == 0));

    assert!(backend.render_scene(&Scene::new(0, 4)).is_err());
    assert!(backend.render_scene(&Scene::new(70_000, 4)).is_err());
}

#[test]
fn premultiply_scales_colour_channels() {
    let mut px = [200, 100, 50, 128, 9, 9, 9, 255];
    premultiply_rgba8_in_place(&mut px);
    assert_eq!(px, [100, 50, 25, 128, 9, 9, 9, 255]);
}
