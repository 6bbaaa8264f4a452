use crate::effects::filter::{Filter, FilterKind};
use crate::foundation::math::{
    clamp_u8, premultiply_rgba8_in_place, unpremultiply_rgba8_in_place,
};
use crate::render::buffer::PixelBuffer;
use rayon::prelude::*;

/// Draw-time state left behind by the filter chain.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FilterOutcome {
    /// Multiplier applied to the source's opacity when it is composited.
    pub alpha: f32,
    /// Gaussian blur radius for the final draw, if a blur filter ran.
    pub blur_radius: Option<f32>,
}

impl Default for FilterOutcome {
    fn default() -> Self {
        Self {
            alpha: 1.0,
            blur_radius: None,
        }
    }
}

/// Run the enabled filters of `filters`, in order, over `buf`.
///
/// Pixel filters see straight-alpha channels; the buffer is premultiplied again before returning.
pub fn apply_filters(buf: &mut PixelBuffer, filters: &[Filter]) -> FilterOutcome {
    let mut outcome = FilterOutcome::default();
    let needs_pixels = filters.iter().any(|f| f.enabled && f.kind.needs_pixels());
    let (w, h) = (buf.width(), buf.height());
    if needs_pixels {
        unpremultiply_rgba8_in_place(buf.data_mut());
    }

    for f in filters.iter().filter(|f| f.enabled) {
        match f.kind {
            FilterKind::ChromaKey {
                key_color,
                similarity,
                smoothness,
            } => chroma_key(
                buf.data_mut(),
                [key_color.r, key_color.g, key_color.b],
                similarity,
                smoothness,
            ),
            FilterKind::ColorCorrection {
                brightness,
                contrast,
                saturation,
                hue: _,
            } => color_correct(buf.data_mut(), brightness, contrast, saturation),
            FilterKind::Blur { radius } => {
                outcome.blur_radius = (radius > 0.0).then_some(radius);
            }
            FilterKind::Sharpen { amount } => sharpen(buf.data_mut(), w, h, amount),
            FilterKind::Opacity { opacity } => {
                outcome.alpha *= opacity.clamp(0.0, 1.0);
            }
        }
    }

    if needs_pixels {
        premultiply_rgba8_in_place(buf.data_mut());
    }
    outcome
}

/// Draw-time outcome of `filters` without touching any pixels.
///
/// Equivalent to [`apply_filters`] for chains with no pixel filter enabled.
pub fn draw_outcome(filters: &[Filter]) -> FilterOutcome {
    filters
        .iter()
        .filter(|f| f.enabled)
        .fold(FilterOutcome::default(), |mut outcome, f| {
            match f.kind {
                FilterKind::Blur { radius } => outcome.blur_radius = (radius > 0.0).then_some(radius),
                FilterKind::Opacity { opacity } => outcome.alpha *= opacity.clamp(0.0, 1.0),
                FilterKind::ChromaKey { .. }
                | FilterKind::ColorCorrection { .. }
                | FilterKind::Sharpen { .. } => {}
            }
            outcome
        })
}

/// Alpha factor for a pixel at normalized RGB distance `distance` from the key color.
pub fn chroma_key_alpha(distance: f32, similarity: f32, smoothness: f32) -> f32 {
    if distance >= similarity {
        return 1.0;
    }
    if smoothness <= 0.0 {
        return 0.0;
    }
    ((distance - similarity + smoothness) / smoothness).clamp(0.0, 1.0)
}

fn chroma_key(straight: &mut [u8], key: [u8; 3], similarity: f32, smoothness: f32) {
    let key = key.map(|c| f32::from(c) / 255.0);
    straight.par_chunks_mut(4).for_each(|px| {
        let dr = f32::from(px[0]) / 255.0 - key[0];
        let dg = f32::from(px[1]) / 255.0 - key[1];
        let db = f32::from(px[2]) / 255.0 - key[2];
        let d = (dr * dr + dg * dg + db * db).sqrt();
        let a = chroma_key_alpha(d, similarity, smoothness);
        if a < 1.0 {
            px[3] = (f32::from(px[3]) * a) as u8;
        }
    });
}

fn color_correct(straight: &mut [u8], brightness: f32, contrast: f32, saturation: f32) {
    let contrast_factor = (259.0 * (contrast + 255.0)) / (255.0 * (259.0 - contrast));
    let saturation_factor = (saturation + 100.0) / 100.0;
    let offset = brightness * 2.55;
    straight.par_chunks_mut(4).for_each(|px| {
        let mut c = [f32::from(px[0]), f32::from(px[1]), f32::from(px[2])];
        for v in &mut c {
            *v += offset;
            *v = contrast_factor * (*v - 128.0) + 128.0;
        }
        let gray = 0.299 * c[0] + 0.587 * c[1] + 0.114 * c[2];
        for (i, v) in c.iter().enumerate() {
            px[i] = clamp_u8(gray + saturation_factor * (v - gray));
        }
    });
}

fn sharpen(straight: &mut [u8], width: u32, height: u32, amount: f32) {
    if width < 3 || height < 3 {
        return;
    }
    let src = straight.to_vec();
    let stride = (width as usize) * 4;
    let last_row = height as usize - 1;
    straight
        .par_chunks_mut(stride)
        .enumerate()
        .filter(|(y, _)| *y > 0 && *y < last_row)
        .for_each(|(y, row)| {
            for x in 1..(width as usize - 1) {
                let idx = y * stride + x * 4;
                for c in 0..3 {
                    let center = f32::from(src[idx + c]);
                    let neighbors = (f32::from(src[idx - 4 + c])
                        + f32::from(src[idx + 4 + c])
                        + f32::from(src[idx - stride + c])
                        + f32::from(src[idx + stride + c]))
                        / 4.0;
                    row[x * 4 + c] = clamp_u8(center + amount * (center - neighbors));
                }
            }
        });
}

#[cfg(test)]
#[path = "../../tests/unit/effects/pipeline.rs"]
mod tests;
