use std::sync::Arc;

use vello_cpu::kurbo::Shape as _;

use crate::assets::color::Color;
use crate::foundation::core::{Affine, Canvas, Point, Rect};
use crate::foundation::error::{OnAirError, OnAirResult};
use crate::render::buffer::PixelBuffer;

/// A rendered frame as RGBA8 pixels.
///
/// Frames leaving the compositor are premultiplied; the flag makes that explicit at API
/// boundaries (recorder, screenshots).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FrameRGBA {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// RGBA8 bytes, tightly packed, row-major.
    pub data: Vec<u8>,
    /// Whether `data` is premultiplied alpha.
    pub premultiplied: bool,
}

impl FrameRGBA {
    /// Read one premultiplied pixel. Out-of-bounds reads are transparent.
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
}

/// CPU composite surface backed by a `vello_cpu` pixmap.
pub struct CompositeSurface {
    width: u16,
    height: u16,
    pixmap: vello_cpu::Pixmap,
}

impl std::fmt::Debug for CompositeSurface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompositeSurface")
            .field("width", &self.width)
            .field("height", &self.height)
            .finish()
    }
}

impl CompositeSurface {
    /// Allocate a surface for `canvas`. Fails for sizes the rasterizer cannot address.
    pub fn new(canvas: Canvas) -> OnAirResult<Self> {
        let canvas = Canvas::new(canvas.width, canvas.height)?;
        let width: u16 = canvas
            .width
            .try_into()
            .map_err(|_| OnAirError::render("surface width exceeds u16"))?;
        let height: u16 = canvas
            .height
            .try_into()
            .map_err(|_| OnAirError::render("surface height exceeds u16"))?;
        Ok(Self {
            width,
            height,
            pixmap: vello_cpu::Pixmap::new(width, height),
        })
    }

    pub fn canvas(&self) -> Canvas {
        Canvas {
            width: u32::from(self.width),
            height: u32::from(self.height),
        }
    }

    pub fn data(&self) -> &[u8] {
        self.pixmap.data_as_u8_slice()
    }

    pub fn data_mut(&mut self) -> &mut [u8] {
        self.pixmap.data_as_u8_slice_mut()
    }

    /// Start recording draw commands for one frame.
    pub fn painter(&self) -> FramePainter {
        FramePainter {
            ctx: vello_cpu::RenderContext::new(self.width, self.height),
            width: f64::from(self.width),
            height: f64::from(self.height),
        }
    }

    /// Copy the pixels out as a frame.
    pub fn to_frame(&self) -> FrameRGBA {
        FrameRGBA {
            width: u32::from(self.width),
            height: u32::from(self.height),
            data: self.data().to_vec(),
            premultiplied: true,
        }
    }
}

/// Paint for one source layer.
#[derive(Clone, Copy, Debug)]
pub enum LayerPaint<'a> {
    Solid(Color),
    Pixels(&'a PixelBuffer),
}

/// One source layer placed on the canvas.
#[derive(Clone, Copy, Debug)]
pub struct LayerDraw<'a> {
    /// Local-to-canvas transform of the source box.
    pub transform: Affine,
    /// Local box size.
    pub width: f64,
    pub height: f64,
    /// Visible part of the box in local space (crop).
    pub clip: Option<Rect>,
    /// Overall opacity in `[0, 1]`.
    pub opacity: f32,
    pub paint: LayerPaint<'a>,
}

/// Draw-command recorder for one frame, flushed into a [`CompositeSurface`].
pub struct FramePainter {
    ctx: vello_cpu::RenderContext,
    width: f64,
    height: f64,
}

impl FramePainter {
    /// Fill the whole canvas (ignores any transform).
    pub fn fill_canvas(&mut self, color: Color) {
        if color.is_transparent() {
            return;
        }
        self.ctx.set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);
        self.ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
        self.ctx.set_paint(to_cpu_color(color));
        self.ctx
            .fill_rect(&vello_cpu::kurbo::Rect::new(0.0, 0.0, self.width, self.height));
    }

    /// Fill the canvas-space rectangle `rect` under `transform`.
    pub fn fill_rect(&mut self, transform: Affine, rect: Rect, color: Color) {
        self.ctx.set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);
        self.ctx.set_transform(affine_to_cpu(transform));
        self.ctx.set_paint(to_cpu_color(color));
        self.ctx.fill_rect(&rect_to_cpu(rect));
    }

    /// Composite a source layer.
    pub fn draw_layer(&mut self, layer: &LayerDraw<'_>) -> OnAirResult<()> {
        let opacity = layer.opacity.clamp(0.0, 1.0);
        if opacity <= 0.0 {
            return Ok(());
        }
        let xf = affine_to_cpu(layer.transform);
        self.ctx.set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);

        let clipped = layer.clip.is_some();
        if let Some(clip) = layer.clip {
            self.ctx.set_transform(xf);
            self.ctx.push_clip_layer(&rect_to_cpu(clip).to_path(0.1));
        }
        if opacity < 1.0 {
            self.ctx.push_opacity_layer(opacity);
        }

        match layer.paint {
            LayerPaint::Solid(color) => {
                self.ctx.set_transform(xf);
                self.ctx.set_paint(to_cpu_color(color));
                self.ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
                    0.0,
                    0.0,
                    layer.width,
                    layer.height,
                ));
            }
            LayerPaint::Pixels(buf) => {
                let (bw, bh) = (f64::from(buf.width()), f64::from(buf.height()));
                let fit = vello_cpu::kurbo::Affine::scale_non_uniform(
                    layer.width / bw.max(1.0),
                    layer.height / bh.max(1.0),
                );
                self.ctx.set_transform(xf * fit);
                self.ctx.set_paint(pixels_to_image(buf)?);
                self.ctx
                    .fill_rect(&vello_cpu::kurbo::Rect::new(0.0, 0.0, bw, bh));
            }
        }

        if opacity < 1.0 {
            self.ctx.pop_layer();
        }
        if clipped {
            self.ctx.pop_layer();
        }
        Ok(())
    }

    /// Draw a whole frame at the canvas origin (overlay base layer).
    pub fn draw_frame(&mut self, frame: &FrameRGBA) -> OnAirResult<()> {
        let buf = PixelBuffer::from_premul(frame.width, frame.height, frame.data.clone())?;
        self.draw_layer(&LayerDraw {
            transform: Affine::IDENTITY,
            width: f64::from(frame.width),
            height: f64::from(frame.height),
            clip: None,
            opacity: 1.0,
            paint: LayerPaint::Pixels(&buf),
        })
    }

    /// Stroke a canvas-space rectangle outline.
    pub fn stroke_rect(&mut self, rect: Rect, color: Color, width: f64) {
        self.ctx.set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);
        self.ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
        self.ctx.set_stroke(vello_cpu::kurbo::Stroke::new(width));
        self.ctx.set_paint(to_cpu_color(color));
        self.ctx.stroke_rect(&rect_to_cpu(rect));
    }

    /// Stroke a canvas-space line segment.
    pub fn stroke_line(&mut self, a: Point, b: Point, color: Color, width: f64) {
        let mut path = vello_cpu::kurbo::BezPath::new();
        path.move_to(vello_cpu::kurbo::Point::new(a.x, a.y));
        path.line_to(vello_cpu::kurbo::Point::new(b.x, b.y));
        self.ctx.set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);
        self.ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
        self.ctx.set_stroke(vello_cpu::kurbo::Stroke::new(width));
        self.ctx.set_paint(to_cpu_color(color));
        self.ctx.stroke_path(&path);
    }

    /// Rasterize everything recorded so far into `surface`.
    pub fn finish(mut self, surface: &mut CompositeSurface) {
        self.ctx.flush();
        self.ctx.render_to_pixmap(&mut surface.pixmap);
    }
}

fn to_cpu_color(c: Color) -> vello_cpu::peniko::Color {
    vello_cpu::peniko::Color::from_rgba8(c.r, c.g, c.b, c.a)
}

fn affine_to_cpu(a: Affine) -> vello_cpu::kurbo::Affine {
    vello_cpu::kurbo::Affine::new(a.as_coeffs())
}

fn rect_to_cpu(r: Rect) -> vello_cpu::kurbo::Rect {
    vello_cpu::kurbo::Rect::new(r.x0, r.y0, r.x1, r.y1)
}

fn pixels_to_image(buf: &PixelBuffer) -> OnAirResult<vello_cpu::Image> {
    let pixmap = premul_bytes_to_pixmap(buf.data(), buf.width(), buf.height())?;
    Ok(vello_cpu::Image {
        image: vello_cpu::ImageSource::Pixmap(Arc::new(pixmap)),
        sampler: vello_cpu::peniko::ImageSampler::default(),
    })
}

fn premul_bytes_to_pixmap(
    rgba8_premul: &[u8],
    width: u32,
    height: u32,
) -> OnAirResult<vello_cpu::Pixmap> {
    let w: u16 = width
        .try_into()
        .map_err(|_| OnAirError::render("layer width exceeds u16"))?;
    let h: u16 = height
        .try_into()
        .map_err(|_| OnAirError::render("layer height exceeds u16"))?;
    if rgba8_premul.len() != width as usize * height as usize * 4 {
        return Err(OnAirError::render("layer byte length mismatch"));
    }

    let mut may_have_opacities = false;
    let mut pixels = Vec::with_capacity(width as usize * height as usize);
    for px in rgba8_premul.chunks_exact(4) {
        let a = px[3];
        may_have_opacities |= a != 255;
        pixels.push(vello_cpu::peniko::color::PremulRgba8 {
            r: px[0],
            g: px[1],
            b: px[2],
            a,
        });
    }

    Ok(vello_cpu::Pixmap::from_parts_with_opacity(
        pixels,
        w,
        h,
        may_have_opacities,
    ))
}

#[cfg(test)]
#[path = "../../tests/unit/render/surface.rs"]
mod tests;
