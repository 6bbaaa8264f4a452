use super::*;
use crate::source::canvas::Layer;
use crate::source::capture::feed;

fn canvas(w: f64, h: f64) -> SourceCanvas {
    SourceCanvas::new(w, h).unwrap()
}

#[test]
fn kinds_round_trip_through_strings() {
    for k in [
        SourceKind::Camera,
        SourceKind::Screen,
        SourceKind::Window,
        SourceKind::Image,
        SourceKind::Text,
        SourceKind::Color,
        SourceKind::Browser,
    ] {
        assert_eq!(k.as_str().parse::<SourceKind>().unwrap(), k);
        assert_eq!(SourceContent::defaults(k).kind(), k);
    }
    assert!("hologram".parse::<SourceKind>().is_err());
}

#[test]
fn capture_draws_nothing_until_ready() {
    let (stream, writer) = feed(false);
    let content = SourceContent::Camera(CaptureContent {
        device_id: None,
        stream: Some(Box::new(stream)),
    });
    let mut rasters = RasterCache::new();

    let mut c = canvas(2.0, 2.0);
    content.draw(&mut c, &mut rasters).unwrap();
    assert!(c.is_empty());
    assert!(!content.is_ready());

    writer.push_frame(PixelBuffer::from_premul(1, 1, vec![0, 0, 255, 255]).unwrap());
    let mut c = canvas(2.0, 2.0);
    content.draw(&mut c, &mut rasters).unwrap();
    assert_eq!(c.pixels_mut().pixel(1, 1), [0, 0, 255, 255]);
}

#[test]
fn capture_fault_is_a_draw_error() {
    let (stream, writer) = feed(false);
    writer.push_frame(PixelBuffer::new(1, 1));
    writer.fail("gone");
    let content = SourceContent::Screen(CaptureContent {
        device_id: None,
        stream: Some(Box::new(stream)),
    });
    let mut c = canvas(2.0, 2.0);
    assert!(content.draw(&mut c, &mut RasterCache::new()).is_err());
}

#[test]
fn image_without_raster_is_pending() {
    let content = SourceContent::Image(ImageContent::from_url("logo.png"));
    assert!(content.needs_acquisition());
    let mut c = canvas(4.0, 4.0);
    content.draw(&mut c, &mut RasterCache::new()).unwrap();
    assert!(c.is_empty());
}

#[test]
fn color_fills_bounds() {
    let content = SourceContent::defaults(SourceKind::Color);
    let mut c = canvas(3.0, 3.0);
    content.draw(&mut c, &mut RasterCache::new()).unwrap();
    assert!(matches!(c.into_layer(), Layer::Solid(col) if col == Color::rgb(255, 0, 0)));
}

#[test]
fn text_without_family_renders() {
    let content = SourceContent::Text(TextContent {
        text: "Hello".to_owned(),
        font_size: 48.0,
        font_family: None,
        ..TextContent::default()
    });
    let mut c = canvas(320.0, 80.0);
    content.draw(&mut c, &mut RasterCache::new()).unwrap();
    assert!(!c.is_empty());
}

#[test]
fn browser_draws_placeholder() {
    let content = SourceContent::defaults(SourceKind::Browser);
    let mut c = canvas(200.0, 100.0);
    content.draw(&mut c, &mut RasterCache::new()).unwrap();
    assert_eq!(c.pixels_mut().pixel(0, 0), [0x33, 0x33, 0x33, 255]);
}

#[test]
fn detached_copy_drops_streams_and_shares_rasters() {
    let (stream, writer) = feed(false);
    let content = SourceContent::Camera(CaptureContent {
        device_id: Some("cam0".to_owned()),
        stream: Some(Box::new(stream)),
    });
    let copy = content.detached_copy();
    assert!(copy.needs_acquisition());
    assert!(writer.is_live());
    match copy {
        SourceContent::Camera(c) => assert_eq!(c.device_id.as_deref(), Some("cam0")),
        other => panic!("unexpected {other:?}"),
    }

    let img = SourceContent::Image(ImageContent::from_raster(PixelBuffer::new(2, 2)));
    let SourceContent::Image(a) = &img else {
        unreachable!()
    };
    let SourceContent::Image(b) = img.detached_copy() else {
        unreachable!()
    };
    assert!(Arc::ptr_eq(
        a.raster.as_ref().unwrap(),
        b.raster.as_ref().unwrap()
    ));
}

#[test]
fn release_stops_tracks() {
    let (stream, writer) = feed(true);
    let mut content = SourceContent::Window(CaptureContent {
        device_id: None,
        stream: Some(Box::new(stream)),
    });
    assert!(content.has_audio());
    content.release();
    assert!(!writer.is_live());
    assert!(!content.has_audio());
}

#[test]
fn serde_uses_type_tag() {
    let json = serde_json::to_value(SourceContent::defaults(SourceKind::Text)).unwrap();
    assert_eq!(json["type"], "text");
    assert_eq!(json["fontSize"], 48.0);

    let back: SourceContent =
        serde_json::from_str(r##"{"type":"color","color":"#0000FF"}"##).unwrap();
    assert!(matches!(back, SourceContent::Color(c) if c.color == Color::rgb(0, 0, 255)));

    let cam: SourceContent = serde_json::from_str(r#"{"type":"camera"}"#).unwrap();
    assert!(cam.needs_acquisition());
}
