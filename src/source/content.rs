use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::assets::color::Color;
use crate::assets::text::{LINE_HEIGHT_FACTOR, TextAlign, TextStyle};
use crate::foundation::error::{OnAirError, OnAirResult};
use crate::render::buffer::PixelBuffer;
use crate::source::canvas::{RasterCache, SourceCanvas};
use crate::source::capture::CaptureStream;

/// Source type tag.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SourceKind {
    Camera,
    Screen,
    Window,
    Image,
    Text,
    Color,
    Browser,
}

impl SourceKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Camera => "camera",
            Self::Screen => "screen",
            Self::Window => "window",
            Self::Image => "image",
            Self::Text => "text",
            Self::Color => "color",
            Self::Browser => "browser",
        }
    }

    /// Capture-backed kinds draw frames from a live stream.
    pub fn is_capture(self) -> bool {
        matches!(self, Self::Camera | Self::Screen | Self::Window)
    }

    /// Name given to new sources of this kind.
    pub fn default_name(self) -> &'static str {
        match self {
            Self::Camera => "Camera",
            Self::Screen => "Screen Capture",
            Self::Window => "Window Capture",
            Self::Image => "Image",
            Self::Text => "Text",
            Self::Color => "Color",
            Self::Browser => "Browser",
        }
    }
}

impl std::str::FromStr for SourceKind {
    type Err = OnAirError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        [
            Self::Camera,
            Self::Screen,
            Self::Window,
            Self::Image,
            Self::Text,
            Self::Color,
            Self::Browser,
        ]
        .into_iter()
        .find(|k| k.as_str() == s)
        .ok_or_else(|| OnAirError::validation(format!("unknown source type \"{s}\"")))
    }
}

/// Camera, screen or window capture.
#[derive(Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CaptureContent {
    /// Device or display the capture was opened on, when the host reports one.
    pub device_id: Option<String>,
    #[serde(skip)]
    pub(crate) stream: Option<Box<dyn CaptureStream>>,
}

impl std::fmt::Debug for CaptureContent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CaptureContent")
            .field("device_id", &self.device_id)
            .field("attached", &self.stream.is_some())
            .finish()
    }
}

impl CaptureContent {
    pub fn with_device(device_id: impl Into<String>) -> Self {
        Self {
            device_id: Some(device_id.into()),
            stream: None,
        }
    }

    pub fn is_attached(&self) -> bool {
        self.stream.is_some()
    }

    /// Stop and drop the stream. Returns `true` when a stream was attached.
    pub fn release(&mut self) -> bool {
        match self.stream.take() {
            Some(mut s) => {
                s.stop();
                true
            }
            None => false,
        }
    }
}

/// Still image. The decoded raster is shared between duplicates.
#[derive(Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ImageContent {
    /// Where the image was loaded from (file path or URL), persisted with profiles.
    pub url: Option<String>,
    #[serde(skip)]
    pub(crate) raster: Option<Arc<PixelBuffer>>,
}

impl std::fmt::Debug for ImageContent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageContent")
            .field("url", &self.url)
            .field("raster", &self.raster.as_deref())
            .finish()
    }
}

impl ImageContent {
    pub fn from_url(url: impl Into<String>) -> Self {
        Self {
            url: Some(url.into()),
            raster: None,
        }
    }

    /// Image with an already decoded raster (no acquisition needed).
    pub fn from_raster(raster: PixelBuffer) -> Self {
        Self {
            url: None,
            raster: Some(Arc::new(raster)),
        }
    }

    pub fn raster(&self) -> Option<&PixelBuffer> {
        self.raster.as_deref()
    }
}

/// Generated multi-line text.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TextContent {
    pub text: String,
    pub font_size: f32,
    /// `None` falls back to the default family.
    pub font_family: Option<String>,
    pub color: Color,
    pub align: TextAlign,
    pub background_color: Color,
}

impl Default for TextContent {
    fn default() -> Self {
        Self {
            text: "Text Source".to_owned(),
            font_size: 48.0,
            font_family: Some(crate::assets::text::DEFAULT_FONT_FAMILY.to_owned()),
            color: Color::WHITE,
            align: TextAlign::Left,
            background_color: Color::TRANSPARENT,
        }
    }
}

impl TextContent {
    fn style(&self) -> TextStyle<'_> {
        TextStyle {
            text: &self.text,
            font_size: self.font_size,
            font_family: self.font_family.as_deref(),
            color: self.color,
            align: self.align,
            background: self.background_color,
        }
    }
}

/// Solid fill.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColorContent {
    pub color: Color,
}

impl Default for ColorContent {
    fn default() -> Self {
        Self {
            color: Color::rgb(255, 0, 0),
        }
    }
}

/// Embedded web content. Only a placeholder is composited.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BrowserContent {
    pub url: String,
}

impl Default for BrowserContent {
    fn default() -> Self {
        Self {
            url: "https://example.com".to_owned(),
        }
    }
}

const BROWSER_PLACEHOLDER_FILL: Color = Color::rgb(0x33, 0x33, 0x33);
const BROWSER_PLACEHOLDER_LABEL: &str = "Browser Source";
const BROWSER_LABEL_SIZE: f32 = 24.0;

/// Type-specific content of a source, exclusively owned by it.
///
/// Serialized inline with the source, tagged by `"type"`.
#[derive(Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum SourceContent {
    Camera(CaptureContent),
    Screen(CaptureContent),
    Window(CaptureContent),
    Image(ImageContent),
    Text(TextContent),
    Color(ColorContent),
    Browser(BrowserContent),
}

impl SourceContent {
    /// Default content for `kind`.
    pub fn defaults(kind: SourceKind) -> Self {
        match kind {
            SourceKind::Camera => Self::Camera(CaptureContent::default()),
            SourceKind::Screen => Self::Screen(CaptureContent::default()),
            SourceKind::Window => Self::Window(CaptureContent::default()),
            SourceKind::Image => Self::Image(ImageContent::default()),
            SourceKind::Text => Self::Text(TextContent::default()),
            SourceKind::Color => Self::Color(ColorContent::default()),
            SourceKind::Browser => Self::Browser(BrowserContent::default()),
        }
    }

    pub fn kind(&self) -> SourceKind {
        match self {
            Self::Camera(_) => SourceKind::Camera,
            Self::Screen(_) => SourceKind::Screen,
            Self::Window(_) => SourceKind::Window,
            Self::Image(_) => SourceKind::Image,
            Self::Text(_) => SourceKind::Text,
            Self::Color(_) => SourceKind::Color,
            Self::Browser(_) => SourceKind::Browser,
        }
    }

    fn capture(&self) -> Option<&CaptureContent> {
        match self {
            Self::Camera(c) | Self::Screen(c) | Self::Window(c) => Some(c),
            _ => None,
        }
    }

    pub(crate) fn capture_mut(&mut self) -> Option<&mut CaptureContent> {
        match self {
            Self::Camera(c) | Self::Screen(c) | Self::Window(c) => Some(c),
            _ => None,
        }
    }

    /// `true` when drawing would produce something this frame.
    pub fn is_ready(&self) -> bool {
        match self {
            Self::Camera(c) | Self::Screen(c) | Self::Window(c) => c
                .stream
                .as_ref()
                .is_some_and(|s| s.ready_state().can_draw()),
            Self::Image(i) => i.raster.is_some(),
            Self::Text(_) | Self::Color(_) | Self::Browser(_) => true,
        }
    }

    /// `true` when content has to be acquired asynchronously before it can draw.
    pub fn needs_acquisition(&self) -> bool {
        match self {
            Self::Camera(c) | Self::Screen(c) | Self::Window(c) => c.stream.is_none(),
            Self::Image(i) => i.raster.is_none() && i.url.is_some(),
            Self::Text(_) | Self::Color(_) | Self::Browser(_) => false,
        }
    }

    /// Whether an attached capture stream carries audio.
    pub fn has_audio(&self) -> bool {
        self.capture()
            .and_then(|c| c.stream.as_ref())
            .is_some_and(|s| s.has_audio())
    }

    /// Copy for a duplicated source: capture streams are not shared, decoded rasters are.
    pub fn detached_copy(&self) -> Self {
        let capture = |c: &CaptureContent| CaptureContent {
            device_id: c.device_id.clone(),
            stream: None,
        };
        match self {
            Self::Camera(c) => Self::Camera(capture(c)),
            Self::Screen(c) => Self::Screen(capture(c)),
            Self::Window(c) => Self::Window(capture(c)),
            Self::Image(i) => Self::Image(i.clone()),
            Self::Text(t) => Self::Text(t.clone()),
            Self::Color(c) => Self::Color(c.clone()),
            Self::Browser(b) => Self::Browser(b.clone()),
        }
    }

    /// Release owned media: stop capture tracks and drop decoded rasters.
    pub fn release(&mut self) {
        match self {
            Self::Camera(c) | Self::Screen(c) | Self::Window(c) => {
                c.release();
            }
            Self::Image(i) => i.raster = None,
            Self::Text(_) | Self::Color(_) | Self::Browser(_) => {}
        }
    }

    /// Draw into `canvas`, which covers the source's local box.
    ///
    /// Content that is not ready yet draws nothing.
    pub fn draw(&self, canvas: &mut SourceCanvas, rasters: &mut RasterCache) -> OnAirResult<()> {
        match self {
            Self::Camera(c) | Self::Screen(c) | Self::Window(c) => {
                let Some(stream) = c.stream.as_ref() else {
                    return Ok(());
                };
                if !stream.ready_state().can_draw() {
                    return Ok(());
                }
                if let Some(frame) = stream.current_frame()? {
                    canvas.draw_image(&frame);
                }
                Ok(())
            }
            Self::Image(i) => {
                if let Some(raster) = i.raster.as_deref() {
                    canvas.draw_image(raster);
                }
                Ok(())
            }
            Self::Text(t) => {
                let buf = rasters.text(&t.style(), canvas.width(), canvas.height())?;
                canvas.draw_image(&buf);
                Ok(())
            }
            Self::Color(c) => {
                canvas.fill(c.color);
                Ok(())
            }
            Self::Browser(_) => {
                canvas.fill(BROWSER_PLACEHOLDER_FILL);
                let label_h = (BROWSER_LABEL_SIZE * LINE_HEIGHT_FACTOR).ceil() as u32;
                let label = TextStyle {
                    text: BROWSER_PLACEHOLDER_LABEL,
                    font_size: BROWSER_LABEL_SIZE,
                    font_family: None,
                    color: Color::rgb(0x99, 0x99, 0x99),
                    align: TextAlign::Center,
                    background: Color::TRANSPARENT,
                };
                let buf = rasters.text(&label, canvas.width(), label_h.min(canvas.height()))?;
                let dy = (i64::from(canvas.height()) - i64::from(buf.height())) / 2;
                canvas.draw_at(&buf, 0, dy);
                Ok(())
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/source/content.rs"]
mod tests;
