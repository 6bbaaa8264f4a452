use super::*;

#[test]
fn opaque_src_replaces_dst() {
    assert_eq!(over([0, 0, 255, 255], [255, 0, 0, 255], 1.0), [255, 0, 0, 255]);
}

#[test]
fn zero_opacity_keeps_dst() {
    assert_eq!(over([1, 2, 3, 4], [255, 0, 0, 255], 0.0), [1, 2, 3, 4]);
}

#[test]
fn half_opacity_blends_evenly() {
    let out = over([0, 0, 0, 255], [255, 255, 255, 255], 0.5);
    assert!((i32::from(out[0]) - 128).abs() <= 1);
    assert_eq!(out[3], 255);
}

#[test]
fn over_in_place_rejects_mismatched_lengths() {
    let mut dst = vec![0u8; 8];
    assert!(over_in_place(&mut dst, &[0u8; 4], 1.0).is_err());
}
