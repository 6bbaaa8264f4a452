//! Editing overlays drawn on the display copy of the program frame.
//!
//! Overlays never reach the recorder or the stream: the compositor hands those the clean frame
//! before any of this runs.

use crate::assets::color::Color;
use crate::foundation::core::{Affine, Point, Rect};
use crate::foundation::error::OnAirResult;
use crate::render::surface::{CompositeSurface, FrameRGBA};
use crate::transform::geometry::Geometry;

const GRID_COLOR: Color = Color::rgba(255, 255, 255, 26);
const SELECTION_COLOR: Color = Color::rgb(0, 255, 0);
const HANDLE_SIZE: f64 = 10.0;
const ROTATION_KNOB: f64 = 5.0;

#[derive(Clone, Debug, Default)]
pub struct OverlayOptions {
    /// Grid spacing, `None` hides the grid.
    pub grid: Option<f64>,
    /// Geometry of every selected source.
    pub selection: Vec<Geometry>,
}

impl OverlayOptions {
    pub fn is_empty(&self) -> bool {
        self.grid.is_none() && self.selection.is_empty()
    }
}

/// Draw `options` over a copy of `frame`.
pub fn draw_overlays(
    surface: &mut CompositeSurface,
    frame: &FrameRGBA,
    options: &OverlayOptions,
) -> OnAirResult<FrameRGBA> {
    let canvas = surface.canvas();
    let (w, h) = (f64::from(canvas.width), f64::from(canvas.height));
    let mut painter = surface.painter();
    painter.draw_frame(frame)?;

    if let Some(step) = options.grid.filter(|s| s.is_finite() && *s >= 1.0) {
        let mut x = 0.0;
        while x < w {
            painter.stroke_line(Point::new(x, 0.0), Point::new(x, h), GRID_COLOR, 1.0);
            x += step;
        }
        let mut y = 0.0;
        while y < h {
            painter.stroke_line(Point::new(0.0, y), Point::new(w, y), GRID_COLOR, 1.0);
            y += step;
        }
    }

    for g in &options.selection {
        painter.stroke_rect(g.bounds(), SELECTION_COLOR, 2.0);
        for (_, p) in g.handles() {
            let half = HANDLE_SIZE / 2.0;
            painter.fill_rect(
                Affine::IDENTITY,
                Rect::new(p.x - half, p.y - half, p.x + half, p.y + half),
                SELECTION_COLOR,
            );
        }
        let top = Point::new(g.x + g.width / 2.0, g.y);
        let knob = g.rotation_handle();
        painter.stroke_line(top, knob, SELECTION_COLOR, 2.0);
        painter.fill_rect(
            Affine::IDENTITY,
            Rect::new(
                knob.x - ROTATION_KNOB,
                knob.y - ROTATION_KNOB,
                knob.x + ROTATION_KNOB,
                knob.y + ROTATION_KNOB,
            ),
            SELECTION_COLOR,
        );
    }

    painter.finish(surface);
    Ok(surface.to_frame())
}

#[cfg(test)]
#[path = "../../tests/unit/render/overlay.rs"]
mod tests;
