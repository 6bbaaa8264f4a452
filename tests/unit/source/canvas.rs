use super::*;

#[test]
fn size_is_rounded_up_and_bounded() {
    let c = SourceCanvas::new(10.2, 9.0).unwrap();
    assert_eq!((c.width(), c.height()), (11, 9));
    assert!(SourceCanvas::new(100_000.0, 10.0).is_err());
    assert!(SourceCanvas::new(f64::NAN, 10.0).is_err());
}

#[test]
fn solid_fill_stays_symbolic() {
    let mut c = SourceCanvas::new(4.0, 4.0).unwrap();
    assert!(c.is_empty());
    c.fill(Color::rgb(1, 2, 3));
    assert!(matches!(c.into_layer(), Layer::Solid(col) if col == Color::rgb(1, 2, 3)));
}

#[test]
fn pixels_materialize_solid_fill() {
    let mut c = SourceCanvas::new(2.0, 2.0).unwrap();
    c.fill(Color::rgb(9, 8, 7));
    assert_eq!(c.pixels_mut().pixel(1, 1), [9, 8, 7, 255]);
}

#[test]
fn translucent_fill_composites_over_existing_layer() {
    let mut c = SourceCanvas::new(1.0, 1.0).unwrap();
    c.fill(Color::rgb(0, 0, 0));
    c.fill(Color::rgba(255, 255, 255, 128));
    let px = c.pixels_mut().pixel(0, 0);
    assert!((i32::from(px[0]) - 128).abs() <= 1);
    assert_eq!(px[3], 255);
}

#[test]
fn same_size_image_is_taken_verbatim() {
    let img = PixelBuffer::from_premul(2, 1, vec![1, 2, 3, 255, 4, 5, 6, 255]).unwrap();
    let mut c = SourceCanvas::new(2.0, 1.0).unwrap();
    c.draw_image(&img);
    match c.into_layer() {
        Layer::Pixels(buf) => assert_eq!(buf, img),
        other => panic!("unexpected layer {other:?}"),
    }
}

#[test]
fn text_rasters_are_cached() {
    let style = TextStyle {
        text: "",
        font_size: 12.0,
        font_family: None,
        color: Color::WHITE,
        align: TextAlign::Left,
        background: Color::rgb(1, 1, 1),
    };
    let mut cache = RasterCache::new();
    let a = cache.text(&style, 8, 8).unwrap();
    let b = cache.text(&style, 8, 8).unwrap();
    assert!(Arc::ptr_eq(&a, &b));
    assert_eq!(cache.len(), 1);
    cache.text(&style, 9, 8).unwrap();
    assert_eq!(cache.len(), 2);
}
