use crate::effects::composite::over;
use crate::foundation::core::Rgba8Premul;
use crate::foundation::error::{OnAirError, OnAirResult};
use crate::foundation::math::premultiply_rgba8_in_place;

/// Offscreen premultiplied RGBA8 buffer.
///
/// Sources draw into one of these when they need pixel access (filters) or when their content is
/// a raster. Buffers are scoped to a single draw and never retained by the compositor.
#[derive(Clone, PartialEq, Eq)]
pub struct PixelBuffer {
    width: u32,
    height: u32,
    data: Vec<u8>,
}

impl std::fmt::Debug for PixelBuffer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PixelBuffer")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bytes", &self.data.len())
            .finish()
    }
}

impl PixelBuffer {
    /// Fully transparent buffer.
    pub fn new(width: u32, height: u32) -> Self {
        let len = (width as usize) * (height as usize) * 4;
        Self {
            width,
            height,
            data: vec![0; len],
        }
    }

    /// Wrap premultiplied bytes.
    pub fn from_premul(width: u32, height: u32, data: Vec<u8>) -> OnAirResult<Self> {
        let expected = (width as usize)
            .checked_mul(height as usize)
            .and_then(|v| v.checked_mul(4))
            .ok_or_else(|| OnAirError::render("pixel buffer size overflow"))?;
        if data.len() != expected {
            return Err(OnAirError::validation(format!(
                "pixel buffer expects {expected} bytes for {width}x{height}, got {}",
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            data,
        })
    }

    /// Wrap straight-alpha bytes, premultiplying them.
    pub fn from_straight(width: u32, height: u32, mut data: Vec<u8>) -> OnAirResult<Self> {
        premultiply_rgba8_in_place(&mut data);
        Self::from_premul(width, height, data)
    }

    /// Width in pixels.
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Height in pixels.
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Premultiplied bytes, row-major.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Mutable premultiplied bytes, row-major.
    pub fn data_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Consume into raw bytes.
    pub fn into_data(self) -> Vec<u8> {
        self.data
    }

    /// Read one pixel. Out-of-bounds reads are transparent.
    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        if x >= self.width || y >= self.height {
            return [0; 4];
        }
        let i = ((y as usize) * (self.width as usize) + (x as usize)) * 4;
        [
            self.data[i],
            self.data[i + 1],
            self.data[i + 2],
            self.data[i + 3],
        ]
    }

    /// Fill the whole buffer with `c`.
    pub fn fill(&mut self, c: Rgba8Premul) {
        let px = c.to_array();
        for d in self.data.chunks_exact_mut(4) {
            d.copy_from_slice(&px);
        }
    }

    /// Composite `c` over the pixel rectangle `[x0, x1) x [y0, y1)`, clipped to bounds.
    pub fn fill_rect(&mut self, x0: i64, y0: i64, x1: i64, y1: i64, c: Rgba8Premul) {
        let w = i64::from(self.width);
        let h = i64::from(self.height);
        let (x0, x1) = (x0.clamp(0, w), x1.clamp(0, w));
        let (y0, y1) = (y0.clamp(0, h), y1.clamp(0, h));
        let src = c.to_array();
        for y in y0..y1 {
            for x in x0..x1 {
                let i = ((y * w + x) as usize) * 4;
                let dst = [
                    self.data[i],
                    self.data[i + 1],
                    self.data[i + 2],
                    self.data[i + 3],
                ];
                self.data[i..i + 4].copy_from_slice(&over(dst, src, 1.0));
            }
        }
    }

    /// Composite `src`, scaled to fill this buffer, over the current contents.
    ///
    /// Uses nearest-neighbour sampling at pixel centres.
    pub fn draw_scaled(&mut self, src: &PixelBuffer) {
        if src.width == 0 || src.height == 0 || self.width == 0 || self.height == 0 {
            return;
        }
        let sx = f64::from(src.width) / f64::from(self.width);
        let sy = f64::from(src.height) / f64::from(self.height);
        let w = self.width as usize;
        for y in 0..self.height {
            let src_y = (((f64::from(y) + 0.5) * sy) as u32).min(src.height - 1);
            for x in 0..self.width {
                let src_x = (((f64::from(x) + 0.5) * sx) as u32).min(src.width - 1);
                let s = src.pixel(src_x, src_y);
                let i = ((y as usize) * w + (x as usize)) * 4;
                let d = [
                    self.data[i],
                    self.data[i + 1],
                    self.data[i + 2],
                    self.data[i + 3],
                ];
                self.data[i..i + 4].copy_from_slice(&over(d, s, 1.0));
            }
        }
    }

    /// Composite `src` at its natural size with its top-left at `(dx, dy)`.
    pub fn draw_at(&mut self, src: &PixelBuffer, dx: i64, dy: i64) {
        let w = i64::from(self.width);
        let h = i64::from(self.height);
        for sy in 0..i64::from(src.height) {
            let y = sy + dy;
            if y < 0 || y >= h {
                continue;
            }
            for sx in 0..i64::from(src.width) {
                let x = sx + dx;
                if x < 0 || x >= w {
                    continue;
                }
                let s = src.pixel(sx as u32, sy as u32);
                let i = ((y * w + x) as usize) * 4;
                let d = [
                    self.data[i],
                    self.data[i + 1],
                    self.data[i + 2],
                    self.data[i + 3],
                ];
                self.data[i..i + 4].copy_from_slice(&over(d, s, 1.0));
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/buffer.rs"]
mod tests;
