pub(crate) fn mul_div255_u16(x: u16, y: u16) -> u16 {
    (((u32::from(x) * u32::from(y)) + 127) / 255) as u16
}

pub(crate) fn mul_div255_u8(x: u16, y: u16) -> u8 {
    mul_div255_u16(x, y) as u8
}

pub(crate) fn clamp_u8(v: f32) -> u8 {
    if v.is_nan() {
        return 0;
    }
    v.round().clamp(0.0, 255.0) as u8
}

pub(crate) fn premultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = px[3] as u16;
        if a == 0 {
            px[0] = 0;
            px[1] = 0;
            px[2] = 0;
            continue;
        }
        px[0] = ((px[0] as u16 * a + 127) / 255) as u8;
        px[1] = ((px[1] as u16 * a + 127) / 255) as u8;
        px[2] = ((px[2] as u16 * a + 127) / 255) as u8;
    }
}

pub(crate) fn unpremultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let [r, g, b] = unpremultiply_px([px[0], px[1], px[2], px[3]]);
        px[0] = r;
        px[1] = g;
        px[2] = b;
    }
}

/// Straight `[r, g, b]` of a premultiplied pixel. Fully transparent pixels map to black.
pub(crate) fn unpremultiply_px(px: [u8; 4]) -> [u8; 3] {
    let a = u32::from(px[3]);
    if a == 0 {
        return [0, 0, 0];
    }
    if a == 255 {
        return [px[0], px[1], px[2]];
    }
    let un = |c: u8| -> u8 { ((u32::from(c) * 255 + a / 2) / a).min(255) as u8 };
    [un(px[0]), un(px[1]), un(px[2])]
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/math.rs"]
mod tests;
