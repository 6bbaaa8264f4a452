use std::io::Cursor;

use super::*;

fn png_bytes(rgba: Vec<u8>, w: u32, h: u32) -> Vec<u8> {
    let img = image::RgbaImage::from_raw(w, h, rgba).unwrap();
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    buf
}

#[test]
fn decode_image_premultiplies() {
    let bytes = png_bytes(vec![100, 50, 200, 128], 1, 1);
    let buf = decode_image(&bytes).unwrap();
    assert_eq!((buf.width(), buf.height()), (1, 1));
    assert_eq!(
        buf.pixel(0, 0),
        [
            ((100u16 * 128 + 127) / 255) as u8,
            ((50u16 * 128 + 127) / 255) as u8,
            ((200u16 * 128 + 127) / 255) as u8,
            128
        ]
    );
}

#[test]
fn decode_garbage_is_an_acquisition_error() {
    let err = decode_image(b"definitely not an image").unwrap_err();
    assert!(matches!(err, OnAirError::Acquisition(_)));
}

#[test]
fn load_missing_file_fails() {
    let dir = tempfile::tempdir().unwrap();
    assert!(load_image(&dir.path().join("missing.png")).is_err());
}

#[test]
fn png_round_trip_keeps_opaque_pixels() {
    let frame = FrameRGBA {
        width: 2,
        height: 1,
        data: vec![255, 0, 0, 255, 0, 0, 255, 255],
        premultiplied: true,
    };
    let png = encode_png(&frame).unwrap();
    let back = decode_image(&png).unwrap();
    assert_eq!(back.pixel(0, 0), [255, 0, 0, 255]);
    assert_eq!(back.pixel(1, 0), [0, 0, 255, 255]);
}

#[test]
fn encode_rejects_mismatched_frame() {
    let frame = FrameRGBA {
        width: 4,
        height: 4,
        data: vec![0; 3],
        premultiplied: true,
    };
    assert!(encode_png(&frame).is_err());
}

#[test]
fn screenshot_names_use_timestamp() {
    assert_eq!(screenshot_file_name(42), "screenshot-42.png");
}
