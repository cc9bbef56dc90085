use boardshapes::serialize::{
    binary_serialize, deserialize, json_serialize, DeserializationOptions, SerializationOptions,
};
use boardshapes::{create_shapes, Epsilon, ShapeOptions, Vertex, VERSION};
use image::{Rgba, RgbaImage};

const RED: Rgba<u8> = Rgba([255, 0, 0, 255]);
const BLACK: Rgba<u8> = Rgba([0, 0, 0, 255]);
const WHITE: Rgba<u8> = Rgba([255, 255, 255, 255]);

fn vertex(x: u16, y: u16) -> Vertex {
    Vertex { x, y }
}

#[test]
fn all_white_image_yields_no_shapes() {
    let img = RgbaImage::from_pixel(10, 10, WHITE);
    let data = create_shapes(&img, &ShapeOptions::default()).unwrap();
    assert_eq!(data.version, VERSION);
    assert!(data.shapes.is_empty());
}

#[test]
fn solid_red_square_yields_one_shape() {
    let img = RgbaImage::from_pixel(20, 20, RED);
    let data = create_shapes(&img, &ShapeOptions::default()).unwrap();

    assert_eq!(data.shapes.len(), 1);
    let shape = &data.shapes[0];
    assert_eq!(shape.number, 0);
    assert_eq!(shape.color, RED);
    assert_eq!(shape.color_name, "Red");
    assert_eq!((shape.corner_x, shape.corner_y), (0, 0));

    let image = shape.image.as_ref().unwrap();
    assert_eq!(image.dimensions(), (20, 20));
    assert!(image.pixels().all(|p| *p == RED));

    // with the default epsilon the boundary reduces to four vertices,
    // each within a couple of pixels of a true corner
    assert_eq!(shape.path.len(), 4);
    for corner in [vertex(0, 0), vertex(19, 0), vertex(19, 19), vertex(0, 19)] {
        assert!(
            shape.path.iter().any(|v| corner.distance_to(*v) <= 3.0),
            "no path vertex near corner {corner:?}"
        );
    }
}

#[test]
fn disabled_rdp_keeps_the_collinear_reduced_boundary() {
    let img = RgbaImage::from_pixel(20, 20, RED);
    let options = ShapeOptions {
        epsilon: Epsilon::Disabled,
        ..ShapeOptions::default()
    };
    let data = create_shapes(&img, &options).unwrap();

    // the trace walks the boundary skipping the four corner pixels, so
    // collinear removal leaves an octagon plus the split pair at the
    // walk's starting edge
    assert_eq!(
        data.shapes[0].path,
        vec![
            vertex(2, 0),
            vertex(1, 0),
            vertex(0, 1),
            vertex(0, 18),
            vertex(1, 19),
            vertex(18, 19),
            vertex(19, 18),
            vertex(19, 1),
            vertex(18, 0),
            vertex(3, 0),
        ]
    );
}

#[test]
fn failed_regions_do_not_reuse_their_ordinal() {
    // a 60px one-pixel-thin line survives the size filter but cannot be
    // traced; the square after it keeps ordinal 1
    let img = RgbaImage::from_fn(100, 100, |x, y| {
        if y == 5 && (2..62).contains(&x) {
            BLACK
        } else if (20..40).contains(&x) && (20..40).contains(&y) {
            BLACK
        } else {
            WHITE
        }
    });
    let data = create_shapes(&img, &ShapeOptions::default()).unwrap();
    assert_eq!(data.shapes.len(), 1);
    assert_eq!(data.shapes[0].number, 1);
    assert_eq!((data.shapes[0].corner_x, data.shapes[0].corner_y), (20, 20));
}

#[test]
fn disk_simplifies_to_far_fewer_vertices() {
    let img = RgbaImage::from_fn(100, 100, |x, y| {
        let dx = i32::try_from(x).unwrap() - 50;
        let dy = i32::try_from(y).unwrap() - 50;
        if dx * dx + dy * dy <= 30 * 30 {
            BLACK
        } else {
            WHITE
        }
    });

    let unreduced = create_shapes(
        &img,
        &ShapeOptions {
            epsilon: Epsilon::Disabled,
            ..ShapeOptions::default()
        },
    )
    .unwrap();
    let reduced = create_shapes(&img, &ShapeOptions::default()).unwrap();

    assert_eq!(unreduced.shapes.len(), 1);
    assert_eq!(reduced.shapes.len(), 1);
    assert_eq!(
        (reduced.shapes[0].corner_x, reduced.shapes[0].corner_y),
        (20, 20)
    );

    let before = unreduced.shapes[0].path.len();
    let after = reduced.shapes[0].path.len();
    assert!(after >= 3);
    assert!(after < before / 2, "expected real reduction, {before} -> {after}");

    // simplification never invents vertices
    for v in &reduced.shapes[0].path {
        assert!(unreduced.shapes[0].path.contains(v));
    }
}

#[test]
fn pipeline_output_round_trips_through_binary_masks() {
    let img = RgbaImage::from_fn(120, 80, |x, y| {
        if (10..40).contains(&x) && (10..40).contains(&y) {
            RED
        } else if (60..110).contains(&x) && (20..70).contains(&y) {
            BLACK
        } else {
            WHITE
        }
    });
    let data = create_shapes(&img, &ShapeOptions::default()).unwrap();
    assert_eq!(data.shapes.len(), 2);

    let mut with_masks = Vec::new();
    binary_serialize(&mut with_masks, &data, SerializationOptions { use_masks: true }).unwrap();
    let decoded = deserialize(&with_masks, &DeserializationOptions::default()).unwrap();
    assert_eq!(decoded, data);

    // the mask representation beats PNG embedding on the wire
    let mut with_pngs = Vec::new();
    binary_serialize(&mut with_pngs, &data, SerializationOptions { use_masks: false }).unwrap();
    assert!(with_masks.len() < with_pngs.len());
}

#[test]
fn pipeline_output_round_trips_through_json() {
    let img = RgbaImage::from_fn(60, 60, |x, y| {
        if (8..34).contains(&x) && (12..38).contains(&y) {
            RED
        } else {
            WHITE
        }
    });
    let data = create_shapes(&img, &ShapeOptions::default()).unwrap();
    assert_eq!(data.shapes.len(), 1);

    let mut bytes = Vec::new();
    json_serialize(&mut bytes, &data).unwrap();
    assert_eq!(bytes[0], b'{');
    let decoded = deserialize(&bytes, &DeserializationOptions::default()).unwrap();
    assert_eq!(decoded, data);
}

#[test]
fn reserializing_between_formats_preserves_the_data() {
    let img = RgbaImage::from_fn(60, 60, |x, y| {
        if (5..35).contains(&x) && (5..35).contains(&y) {
            BLACK
        } else {
            WHITE
        }
    });
    let data = create_shapes(&img, &ShapeOptions::default()).unwrap();

    let mut binary = Vec::new();
    binary_serialize(&mut binary, &data, SerializationOptions::default()).unwrap();
    let from_binary = deserialize(&binary, &DeserializationOptions::default()).unwrap();

    let mut json = Vec::new();
    json_serialize(&mut json, &from_binary).unwrap();
    let from_json = deserialize(&json, &DeserializationOptions::default()).unwrap();

    assert_eq!(from_json, data);
}

#[test]
fn preserve_color_paints_source_pixels() {
    let shade = Rgba([180, 20, 30, 255]);
    let img = RgbaImage::from_fn(40, 40, |x, y| {
        if (4..24).contains(&x) && (4..24).contains(&y) {
            shade
        } else {
            WHITE
        }
    });
    let options = ShapeOptions {
        preserve_color: true,
        ..ShapeOptions::default()
    };
    let data = create_shapes(&img, &options).unwrap();
    assert_eq!(data.shapes.len(), 1);
    let shape = &data.shapes[0];
    // classified as red, but the footprint keeps the source shade
    assert_eq!(shape.color, RED);
    assert_eq!(shape.image.as_ref().unwrap().get_pixel(2, 2), &shade);
}

#[test]
fn two_runs_produce_identical_bytes() {
    let img = RgbaImage::from_fn(64, 64, |x, y| {
        if (x / 8 + y / 8) % 3 == 0 {
            BLACK
        } else {
            WHITE
        }
    });
    let options = ShapeOptions::default();
    let serialize = |data: &boardshapes::BoardshapesData| {
        let mut bytes = Vec::new();
        binary_serialize(&mut bytes, data, SerializationOptions::default()).unwrap();
        bytes
    };
    let first = serialize(&create_shapes(&img, &options).unwrap());
    let second = serialize(&create_shapes(&img, &options).unwrap());
    assert_eq!(first, second);
}
