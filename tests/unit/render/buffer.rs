use super::*;

#[test]
fn from_premul_checks_length() {
    assert!(PixelBuffer::from_premul(2, 2, vec![0; 16]).is_ok());
    assert!(PixelBuffer::from_premul(2, 2, vec![0; 15]).is_err());
}

#[test]
fn fill_rect_is_clipped_to_bounds() {
    let mut b = PixelBuffer::new(4, 4);
    b.fill_rect(-10, -10, 2, 2, Rgba8Premul::black());
    assert_eq!(b.pixel(0, 0), [0, 0, 0, 255]);
    assert_eq!(b.pixel(1, 1), [0, 0, 0, 255]);
    assert_eq!(b.pixel(2, 2), [0, 0, 0, 0]);
}

#[test]
fn draw_scaled_upsamples_nearest() {
    let src = PixelBuffer::from_premul(
        2,
        1,
        vec![255, 0, 0, 255, 0, 0, 255, 255],
    )
    .unwrap();
    let mut dst = PixelBuffer::new(4, 2);
    dst.draw_scaled(&src);
    assert_eq!(dst.pixel(0, 0), [255, 0, 0, 255]);
    assert_eq!(dst.pixel(1, 1), [255, 0, 0, 255]);
    assert_eq!(dst.pixel(2, 0), [0, 0, 255, 255]);
    assert_eq!(dst.pixel(3, 1), [0, 0, 255, 255]);
}

#[test]
fn draw_at_offsets_and_clips() {
    let mut src = PixelBuffer::new(2, 2);
    src.fill(Rgba8Premul::black());
    let mut dst = PixelBuffer::new(3, 3);
    dst.draw_at(&src, 2, 2);
    assert_eq!(dst.pixel(2, 2), [0, 0, 0, 255]);
    assert_eq!(dst.pixel(1, 1), [0, 0, 0, 0]);
}

#[test]
fn out_of_bounds_pixel_is_transparent() {
    let b = PixelBuffer::new(1, 1);
    assert_eq!(b.pixel(5, 5), [0; 4]);
}
