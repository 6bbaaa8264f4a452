use crate::foundation::core::{Affine, Point, Rect, Vec2};
use crate::foundation::error::{OnAirError, OnAirResult};
use serde::{Deserialize, Serialize};

/// Smallest width/height a source can be resized to.
pub const MIN_SIZE: f64 = 10.0;
/// Pick radius around a resize handle anchor (Chebyshev distance).
pub const HANDLE_RADIUS: f64 = 10.0;
/// Distance of the rotation handle above the top edge.
pub const ROTATION_HANDLE_OFFSET: f64 = 30.0;

/// Placement of a source on the output canvas.
///
/// `x`/`y`/`width`/`height` describe the unrotated, unscaled box. Rotation (degrees) and scale
/// are applied around the box centre when drawing.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Geometry {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    pub rotation: f64,
    pub scale_x: f64,
    pub scale_y: f64,
}

impl Default for Geometry {
    fn default() -> Self {
        Self {
            x: 100.0,
            y: 100.0,
            width: 640.0,
            height: 480.0,
            rotation: 0.0,
            scale_x: 1.0,
            scale_y: 1.0,
        }
    }
}

/// Pixel insets trimmed from each edge of a source before it is composited.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Crop {
    pub top: f64,
    pub left: f64,
    pub right: f64,
    pub bottom: f64,
}

impl Crop {
    /// `true` when no edge is trimmed.
    pub fn is_empty(&self) -> bool {
        self.top <= 0.0 && self.left <= 0.0 && self.right <= 0.0 && self.bottom <= 0.0
    }

    /// Insets clamped to be non-negative and to leave a cropped size of at least zero.
    pub fn clamped(self, width: f64, height: f64) -> Self {
        let pos = |v: f64| if v.is_finite() { v.max(0.0) } else { 0.0 };
        let left = pos(self.left).min(width);
        let right = pos(self.right).min(width - left);
        let top = pos(self.top).min(height);
        let bottom = pos(self.bottom).min(height - top);
        Self {
            top,
            left,
            right,
            bottom,
        }
    }

    /// Visible rectangle in the source's local space.
    pub fn visible_rect(self, width: f64, height: f64) -> Rect {
        let c = self.clamped(width, height);
        Rect::new(c.left, c.top, width - c.right, height - c.bottom)
    }
}

/// One of the eight resize handles around a source's bounding box.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Handle {
    Nw,
    N,
    Ne,
    E,
    Se,
    S,
    Sw,
    W,
}

impl Handle {
    /// Every handle, in the order they are hit-tested.
    pub const ALL: [Handle; 8] = [
        Handle::Nw,
        Handle::N,
        Handle::Ne,
        Handle::E,
        Handle::Se,
        Handle::S,
        Handle::Sw,
        Handle::W,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Nw => "nw",
            Self::N => "n",
            Self::Ne => "ne",
            Self::E => "e",
            Self::Se => "se",
            Self::S => "s",
            Self::Sw => "sw",
            Self::W => "w",
        }
    }

    /// Per-axis multipliers `(x, y, width, height)` applied to `(dx, dy)` when dragging.
    fn deltas(self) -> [f64; 4] {
        match self {
            Self::Nw => [1.0, 1.0, -1.0, -1.0],
            Self::N => [0.0, 1.0, 0.0, -1.0],
            Self::Ne => [0.0, 1.0, 1.0, -1.0],
            Self::E => [0.0, 0.0, 1.0, 0.0],
            Self::Se => [0.0, 0.0, 1.0, 1.0],
            Self::S => [0.0, 0.0, 0.0, 1.0],
            Self::Sw => [1.0, 0.0, -1.0, 1.0],
            Self::W => [1.0, 0.0, -1.0, 0.0],
        }
    }
}

impl std::str::FromStr for Handle {
    type Err = OnAirError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Handle::ALL
            .into_iter()
            .find(|h| h.as_str() == s)
            .ok_or_else(|| OnAirError::validation(format!("unknown resize handle \"{s}\"")))
    }
}

impl Geometry {
    /// Unrotated bounding box.
    pub fn bounds(&self) -> Rect {
        Rect::new(self.x, self.y, self.x + self.width, self.y + self.height)
    }

    pub fn center(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Axis-aligned bounding-box containment. Rotation and scale are not considered.
    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.x && p.x <= self.x + self.width && p.y >= self.y && p.y <= self.y + self.height
    }

    /// Anchor point of `handle` on the bounding box.
    pub fn handle_position(&self, handle: Handle) -> Point {
        let Rect { x0, y0, x1, y1 } = self.bounds();
        let (cx, cy) = ((x0 + x1) / 2.0, (y0 + y1) / 2.0);
        match handle {
            Handle::Nw => Point::new(x0, y0),
            Handle::N => Point::new(cx, y0),
            Handle::Ne => Point::new(x1, y0),
            Handle::E => Point::new(x1, cy),
            Handle::Se => Point::new(x1, y1),
            Handle::S => Point::new(cx, y1),
            Handle::Sw => Point::new(x0, y1),
            Handle::W => Point::new(x0, cy),
        }
    }

    /// All eight handle anchors: corners and edge midpoints.
    pub fn handles(&self) -> [(Handle, Point); 8] {
        Handle::ALL.map(|h| (h, self.handle_position(h)))
    }

    /// Handle whose anchor lies within [`HANDLE_RADIUS`] of `p`, if any.
    pub fn handle_at(&self, p: Point) -> Option<Handle> {
        self.handles()
            .into_iter()
            .find(|(_, a)| (p.x - a.x).abs() <= HANDLE_RADIUS && (p.y - a.y).abs() <= HANDLE_RADIUS)
            .map(|(h, _)| h)
    }

    /// Position of the rotation handle, above the top-centre of the box.
    pub fn rotation_handle(&self) -> Point {
        Point::new(self.x + self.width / 2.0, self.y - ROTATION_HANDLE_OFFSET)
    }

    pub fn is_over_rotation_handle(&self, p: Point) -> bool {
        let r = self.rotation_handle();
        (p.x - r.x).abs() <= HANDLE_RADIUS && (p.y - r.y).abs() <= HANDLE_RADIUS
    }

    /// Drag `handle` by `(dx, dy)`, then clamp the size to [`MIN_SIZE`].
    pub fn resize(&mut self, handle: Handle, dx: f64, dy: f64) {
        let [mx, my, mw, mh] = handle.deltas();
        self.x += mx * dx;
        self.y += my * dy;
        self.width = (self.width + mw * dx).max(MIN_SIZE);
        self.height = (self.height + mh * dy).max(MIN_SIZE);
    }

    /// Rotate so the rotation handle points at `pointer`.
    pub fn rotate_toward(&mut self, pointer: Point) {
        self.rotation = rotation_toward(self.center(), pointer);
    }

    pub fn translate(&mut self, delta: Vec2) {
        self.x += delta.x;
        self.y += delta.y;
    }

    /// Round the top-left corner to the nearest multiple of `grid`.
    pub fn snap_to_grid(&mut self, grid: f64) {
        if grid > 0.0 && grid.is_finite() {
            self.x = (self.x / grid).round() * grid;
            self.y = (self.y / grid).round() * grid;
        }
    }

    /// Clear rotation and scale, keeping position and size.
    pub fn reset_transform(&mut self) {
        self.rotation = 0.0;
        self.scale_x = 1.0;
        self.scale_y = 1.0;
    }

    /// Map the source's local content space `[0, width] x [0, height]` onto the canvas.
    pub fn local_to_world(&self) -> Affine {
        let c = self.center();
        Affine::translate(Vec2::new(c.x, c.y))
            * Affine::rotate(self.rotation.to_radians())
            * Affine::scale_non_uniform(self.scale_x, self.scale_y)
            * Affine::translate(Vec2::new(-self.width / 2.0, -self.height / 2.0))
    }

    /// Reject non-finite values and sizes below [`MIN_SIZE`].
    pub fn validate(&self) -> OnAirResult<()> {
        let all = [
            self.x,
            self.y,
            self.width,
            self.height,
            self.rotation,
            self.scale_x,
            self.scale_y,
        ];
        if all.iter().any(|v| !v.is_finite()) {
            return Err(OnAirError::validation("geometry values must be finite"));
        }
        if self.width < MIN_SIZE || self.height < MIN_SIZE {
            return Err(OnAirError::validation(format!(
                "source size {}x{} is below the {MIN_SIZE} minimum",
                self.width, self.height
            )));
        }
        Ok(())
    }
}

/// Hit test used for pointer picking: invisible sources never hit.
pub fn hit_test(geometry: &Geometry, visible: bool, p: Point) -> bool {
    visible && geometry.contains(p)
}

/// Wrap an angle in degrees into `[0, 360)`.
pub fn normalize_degrees(deg: f64) -> f64 {
    if !deg.is_finite() {
        return 0.0;
    }
    let r = deg.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360 for tiny negative inputs.
    if r >= 360.0 { 0.0 } else { r }
}

/// Angle from `center` to `pointer`, offset so a pointer straight above yields 0.
pub fn rotation_toward(center: Point, pointer: Point) -> f64 {
    let angle = (pointer.y - center.y).atan2(pointer.x - center.x).to_degrees();
    normalize_degrees(angle + 90.0)
}

#[cfg(test)]
#[path = "../../tests/unit/transform/geometry.rs"]
mod tests;
