use std::fmt::Write as _;
use std::sync::{Arc, OnceLock};

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::assets::color::Color;
use crate::foundation::error::{OnAirError, OnAirResult};
use crate::render::buffer::PixelBuffer;

/// Family used when a text source does not name one.
pub const DEFAULT_FONT_FAMILY: &str = "Arial";
/// Line advance as a multiple of the font size.
pub const LINE_HEIGHT_FACTOR: f32 = 1.2;

/// Horizontal alignment of text lines within the source box.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
}

/// Everything needed to rasterize a block of text.
#[derive(Clone, Copy, Debug)]
pub struct TextStyle<'a> {
    pub text: &'a str,
    pub font_size: f32,
    pub font_family: Option<&'a str>,
    pub color: Color,
    pub align: TextAlign,
    pub background: Color,
}

/// Rasterize `style` into a premultiplied `width x height` buffer.
///
/// Lines are split on `'\n'` and advance by `font_size * 1.2`. A missing or unknown font
/// family falls back to the system sans-serif face; it never fails the render.
pub fn render_text(style: &TextStyle<'_>, width: u32, height: u32) -> OnAirResult<PixelBuffer> {
    if width == 0 || height == 0 {
        return Err(OnAirError::validation("text raster size must be > 0"));
    }
    let svg = text_svg(style, width, height);

    let opts = usvg::Options {
        fontdb: font_database(),
        font_resolver: make_font_resolver(),
        ..Default::default()
    };
    let tree = usvg::Tree::from_str(&svg, &opts).context("parse text svg")?;

    let mut pixmap = resvg::tiny_skia::Pixmap::new(width, height)
        .ok_or_else(|| OnAirError::render("failed to allocate text pixmap"))?;
    resvg::render(
        &tree,
        resvg::tiny_skia::Transform::identity(),
        &mut pixmap.as_mut(),
    );
    PixelBuffer::from_premul(width, height, pixmap.data().to_vec())
}

/// SVG document describing `style` in a `width x height` viewport.
pub fn text_svg(style: &TextStyle<'_>, width: u32, height: u32) -> String {
    let font_size = if style.font_size.is_finite() && style.font_size > 0.0 {
        style.font_size
    } else {
        1.0
    };
    let line_height = font_size * LINE_HEIGHT_FACTOR;
    let family = style
        .font_family
        .map(str::trim)
        .filter(|f| !f.is_empty())
        .unwrap_or(DEFAULT_FONT_FAMILY);
    let (anchor, x) = match style.align {
        TextAlign::Left => ("start", 0.0),
        TextAlign::Center => ("middle", width as f32 / 2.0),
        TextAlign::Right => ("end", width as f32),
    };

    let mut svg = format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{width}" height="{height}" viewBox="0 0 {width} {height}">"#
    );
    if !style.background.is_transparent() {
        let (fill, opacity) = svg_paint(style.background);
        let _ = write!(
            svg,
            r#"<rect width="{width}" height="{height}" fill="{fill}" fill-opacity="{opacity}"/>"#
        );
    }

    let (fill, opacity) = svg_paint(style.color);
    for (i, line) in style.text.split('\n').enumerate() {
        if line.is_empty() {
            continue;
        }
        let y = i as f32 * line_height;
        let _ = write!(
            svg,
            r#"<text x="{x}" y="{y}" font-family="'{family}', sans-serif" font-size="{font_size}" fill="{fill}" fill-opacity="{opacity}" text-anchor="{anchor}" dominant-baseline="hanging" xml:space="preserve">{line}</text>"#,
            family = escape_xml(family),
            line = escape_xml(line),
        );
    }
    svg.push_str("</svg>");
    svg
}

fn svg_paint(c: Color) -> (String, f32) {
    (
        format!("rgb({},{},{})", c.r, c.g, c.b),
        f32::from(c.a) / 255.0,
    )
}

fn escape_xml(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for ch in s.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            c => out.push(c),
        }
    }
    out
}

fn font_database() -> Arc<usvg::fontdb::Database> {
    static DB: OnceLock<Arc<usvg::fontdb::Database>> = OnceLock::new();
    DB.get_or_init(|| {
        let mut db = usvg::fontdb::Database::new();
        db.load_system_fonts();
        tracing::debug!(faces = db.len(), "loaded system fonts");
        Arc::new(db)
    })
    .clone()
}

fn make_font_resolver() -> usvg::FontResolver<'static> {
    use usvg::FontResolver;

    FontResolver {
        select_font: Box::new(|font, fontdb| {
            let mut families = Vec::<usvg::fontdb::Family<'_>>::new();
            for family in font.families() {
                families.push(match family {
                    usvg::FontFamily::Serif => usvg::fontdb::Family::Serif,
                    usvg::FontFamily::SansSerif => usvg::fontdb::Family::SansSerif,
                    usvg::FontFamily::Cursive => usvg::fontdb::Family::Cursive,
                    usvg::FontFamily::Fantasy => usvg::fontdb::Family::Fantasy,
                    usvg::FontFamily::Monospace => usvg::fontdb::Family::Monospace,
                    usvg::FontFamily::Named(s) => usvg::fontdb::Family::Name(s),
                });
            }
            families.push(usvg::fontdb::Family::SansSerif);
            families.push(usvg::fontdb::Family::Serif);

            let style = match font.style() {
                usvg::FontStyle::Normal => usvg::fontdb::Style::Normal,
                usvg::FontStyle::Italic => usvg::fontdb::Style::Italic,
                usvg::FontStyle::Oblique => usvg::fontdb::Style::Oblique,
            };
            let query = usvg::fontdb::Query {
                families: &families,
                weight: usvg::fontdb::Weight(font.weight()),
                stretch: usvg::fontdb::Stretch::Normal,
                style,
            };

            if let Some(id) = fontdb.query(&query) {
                return Some(id);
            }
            fontdb.faces().next().map(|f| f.id)
        }),
        select_fallback: FontResolver::default_fallback_selector(),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/text.rs"]
mod tests;
