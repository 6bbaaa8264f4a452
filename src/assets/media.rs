use std::io::Cursor;
use std::path::Path;

use anyhow::Context;

use crate::foundation::error::{OnAirError, OnAirResult};
use crate::foundation::math::unpremultiply_rgba8_in_place;
use crate::render::buffer::PixelBuffer;
use crate::render::surface::FrameRGBA;

/// Decode an encoded raster (PNG, JPEG, GIF, WebP, ...) into a premultiplied buffer.
pub fn decode_image(bytes: &[u8]) -> OnAirResult<PixelBuffer> {
    let dyn_img = image::load_from_memory(bytes)
        .context("decode image from memory")
        .map_err(|e| OnAirError::acquisition(format!("{e:#}")))?;
    let rgba = dyn_img.to_rgba8();
    let (width, height) = rgba.dimensions();
    PixelBuffer::from_straight(width, height, rgba.into_raw())
}

/// Read and decode an image file.
pub fn load_image(path: &Path) -> OnAirResult<PixelBuffer> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("read image '{}'", path.display()))
        .map_err(|e| OnAirError::acquisition(format!("{e:#}")))?;
    decode_image(&bytes)
}

/// Encode a rendered frame as PNG (straight alpha).
pub fn encode_png(frame: &FrameRGBA) -> OnAirResult<Vec<u8>> {
    let mut rgba = frame.data.clone();
    if frame.premultiplied {
        unpremultiply_rgba8_in_place(&mut rgba);
    }
    let img = image::RgbaImage::from_raw(frame.width, frame.height, rgba)
        .ok_or_else(|| OnAirError::render("frame byte length does not match its size"))?;

    let mut out = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut out), image::ImageFormat::Png)
        .context("encode png")?;
    Ok(out)
}

/// Screenshot file name for a capture taken at `unix_ms`.
pub fn screenshot_file_name(unix_ms: u64) -> String {
    format!("screenshot-{unix_ms}.png")
}

#[cfg(test)]
#[path = "../../tests/unit/assets/media.rs"]
mod tests;
