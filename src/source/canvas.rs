use std::collections::HashMap;
use std::sync::Arc;

use crate::assets::color::Color;
use crate::assets::text::{TextAlign, TextStyle, render_text};
use crate::foundation::core::Canvas;
use crate::foundation::error::{OnAirError, OnAirResult};
use crate::render::buffer::PixelBuffer;

/// What a source drew for the current frame.
#[derive(Debug)]
pub enum Layer {
    /// Content not ready; nothing is composited.
    Empty,
    /// Uniform fill of the whole source box, drawn directly on the composite surface.
    Solid(Color),
    /// Offscreen pixels in the source's local space.
    Pixels(PixelBuffer),
}

/// Drawing target handed to a source, sized to the source's local box.
///
/// Solid fills stay symbolic until something needs pixels, so plain color sources never allocate
/// an offscreen buffer.
#[derive(Debug)]
pub struct SourceCanvas {
    width: u32,
    height: u32,
    layer: Layer,
}

impl SourceCanvas {
    /// Canvas covering a `width x height` local box, rounded up to whole pixels.
    pub fn new(width: f64, height: f64) -> OnAirResult<Self> {
        if !width.is_finite() || !height.is_finite() {
            return Err(OnAirError::render("source size is not finite"));
        }
        let w = width.ceil().max(1.0);
        let h = height.ceil().max(1.0);
        if w > f64::from(Canvas::MAX_EDGE) || h > f64::from(Canvas::MAX_EDGE) {
            return Err(OnAirError::render(format!(
                "source {w}x{h} is too large to rasterize"
            )));
        }
        Ok(Self {
            width: w as u32,
            height: h as u32,
            layer: Layer::Empty,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn is_empty(&self) -> bool {
        matches!(self.layer, Layer::Empty)
    }

    /// Fill the whole canvas with `c`.
    pub fn fill(&mut self, c: Color) {
        match self.layer {
            Layer::Empty => self.layer = Layer::Solid(c),
            Layer::Solid(_) if c.a == 255 => self.layer = Layer::Solid(c),
            _ => {
                let (w, h) = (i64::from(self.width), i64::from(self.height));
                self.pixels_mut().fill_rect(0, 0, w, h, c.to_premul());
            }
        }
    }

    /// Draw `img` stretched over the whole canvas.
    pub fn draw_image(&mut self, img: &PixelBuffer) {
        if img.width() == self.width && img.height() == self.height && self.is_empty() {
            self.layer = Layer::Pixels(img.clone());
            return;
        }
        self.pixels_mut().draw_scaled(img);
    }

    /// Draw `img` at its natural size with its top-left corner at `(dx, dy)`.
    pub fn draw_at(&mut self, img: &PixelBuffer, dx: i64, dy: i64) {
        self.pixels_mut().draw_at(img, dx, dy);
    }

    /// Offscreen pixels, materializing a solid fill if needed.
    pub fn pixels_mut(&mut self) -> &mut PixelBuffer {
        if !matches!(self.layer, Layer::Pixels(_)) {
            let mut buf = PixelBuffer::new(self.width, self.height);
            if let Layer::Solid(c) = self.layer {
                buf.fill(c.to_premul());
            }
            self.layer = Layer::Pixels(buf);
        }
        match &mut self.layer {
            Layer::Pixels(buf) => buf,
            Layer::Empty | Layer::Solid(_) => unreachable!("layer was materialized above"),
        }
    }

    pub fn into_layer(self) -> Layer {
        self.layer
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
struct TextKey {
    text: String,
    font_size_bits: u32,
    family: Option<String>,
    color: Color,
    align: TextAlign,
    background: Color,
    width: u32,
    height: u32,
}

/// Rasterized text reused across frames while the text and box size are unchanged.
#[derive(Debug, Default)]
pub struct RasterCache {
    text: HashMap<TextKey, Arc<PixelBuffer>>,
}

impl RasterCache {
    const MAX_ENTRIES: usize = 64;

    pub fn new() -> Self {
        Self::default()
    }

    /// Rasterize `style` at `width x height`, reusing a previous raster when possible.
    pub fn text(
        &mut self,
        style: &TextStyle<'_>,
        width: u32,
        height: u32,
    ) -> OnAirResult<Arc<PixelBuffer>> {
        let key = TextKey {
            text: style.text.to_owned(),
            font_size_bits: style.font_size.to_bits(),
            family: style.font_family.map(str::to_owned),
            color: style.color,
            align: style.align,
            background: style.background,
            width,
            height,
        };
        if let Some(buf) = self.text.get(&key) {
            return Ok(buf.clone());
        }
        let buf = Arc::new(render_text(style, width, height)?);
        if self.text.len() >= Self::MAX_ENTRIES {
            self.text.clear();
        }
        self.text.insert(key, buf.clone());
        Ok(buf)
    }

    pub fn len(&self) -> usize {
        self.text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/source/canvas.rs"]
mod tests;
