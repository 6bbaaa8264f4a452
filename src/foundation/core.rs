use crate::foundation::error::{OnAirError, OnAirResult};
use std::time::{SystemTime, UNIX_EPOCH};

pub use kurbo::{Affine, BezPath, Point, Rect, Vec2};

/// Output canvas dimensions in pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Canvas {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl Canvas {
    /// Largest edge the CPU surface can allocate.
    pub const MAX_EDGE: u32 = u16::MAX as u32;

    /// Create a validated canvas size.
    pub fn new(width: u32, height: u32) -> OnAirResult<Self> {
        if width == 0 || height == 0 {
            return Err(OnAirError::validation("canvas width/height must be > 0"));
        }
        if width > Self::MAX_EDGE || height > Self::MAX_EDGE {
            return Err(OnAirError::validation(format!(
                "canvas {width}x{height} exceeds {max}x{max}",
                max = Self::MAX_EDGE
            )));
        }
        Ok(Self { width, height })
    }

    /// Parse a `"<width>x<height>"` resolution string.
    pub fn parse_resolution(s: &str) -> OnAirResult<Self> {
        let (w, h) = s
            .trim()
            .split_once(['x', 'X'])
            .ok_or_else(|| OnAirError::validation(format!("invalid resolution '{s}'")))?;
        let w = w
            .trim()
            .parse::<u32>()
            .map_err(|_| OnAirError::validation(format!("invalid resolution width in '{s}'")))?;
        let h = h
            .trim()
            .parse::<u32>()
            .map_err(|_| OnAirError::validation(format!("invalid resolution height in '{s}'")))?;
        Self::new(w, h)
    }

    /// Number of bytes in a tightly packed RGBA8 frame of this size.
    pub fn rgba_len(self) -> usize {
        (self.width as usize)
            .saturating_mul(self.height as usize)
            .saturating_mul(4)
    }
}

impl Default for Canvas {
    fn default() -> Self {
        Self {
            width: 1920,
            height: 1080,
        }
    }
}

impl std::fmt::Display for Canvas {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Premultiplied RGBA8 (r,g,b already multiplied by a).
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Rgba8Premul {
    /// Red channel premultiplied by alpha.
    pub r: u8,
    /// Green channel premultiplied by alpha.
    pub g: u8,
    /// Blue channel premultiplied by alpha.
    pub b: u8,
    /// Alpha channel.
    pub a: u8,
}

impl Rgba8Premul {
    /// Fully transparent black.
    pub fn transparent() -> Self {
        Self {
            r: 0,
            g: 0,
            b: 0,
            a: 0,
        }
    }

    /// Opaque black.
    pub fn black() -> Self {
        Self {
            r: 0,
            g: 0,
            b: 0,
            a: 255,
        }
    }

    /// Convert straight-alpha RGBA8 into premultiplied RGBA8.
    pub fn from_straight_rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        fn premul(c: u8, a: u8) -> u8 {
            let c = u16::from(c);
            let a = u16::from(a);
            (((c * a) + 127) / 255) as u8
        }

        Self {
            r: premul(r, a),
            g: premul(g, a),
            b: premul(b, a),
            a,
        }
    }

    /// Byte array in `[r, g, b, a]` order.
    pub fn to_array(self) -> [u8; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

macro_rules! string_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(
            Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
        )]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            /// Borrow the raw id string.
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $name {
            fn from(s: &str) -> Self {
                Self(s.to_owned())
            }
        }
    };
}

string_id!(
    /// Identifier of a [`crate::Scene`].
    SceneId
);
string_id!(
    /// Identifier of a [`crate::Source`], unique across all scenes.
    SourceId
);
string_id!(
    /// Identifier of a [`crate::Filter`] within its source.
    FilterId
);

/// Generator of unique ids of the form `<millis-hex>-<counter>`.
///
/// The millisecond prefix is taken once at construction so ids stay unique across sessions that
/// reload a persisted profile.
#[derive(Debug, Clone)]
pub struct IdGen {
    epoch_ms: u64,
    counter: u64,
}

impl IdGen {
    /// Create a generator seeded from the wall clock.
    pub fn new() -> Self {
        let epoch_ms = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0);
        Self::with_epoch(epoch_ms)
    }

    /// Create a generator with an explicit prefix (deterministic tests).
    pub fn with_epoch(epoch_ms: u64) -> Self {
        Self {
            epoch_ms,
            counter: 0,
        }
    }

    fn next_raw(&mut self) -> String {
        self.counter = self.counter.saturating_add(1);
        format!("{:x}-{}", self.epoch_ms, self.counter)
    }

    /// Move the counter past `raw` when it carries this generator's prefix, so ids restored from
    /// a profile saved in the same millisecond are never handed out again.
    pub fn observe(&mut self, raw: &str) {
        let Some((prefix, n)) = raw.rsplit_once('-') else {
            return;
        };
        if u64::from_str_radix(prefix, 16).ok() != Some(self.epoch_ms) {
            return;
        }
        if let Ok(n) = n.parse::<u64>() {
            self.counter = self.counter.max(n);
        }
    }

    /// Next scene id.
    pub fn scene(&mut self) -> SceneId {
        SceneId(self.next_raw())
    }

    /// Next source id.
    pub fn source(&mut self) -> SourceId {
        SourceId(self.next_raw())
    }

    /// Next filter id.
    pub fn filter(&mut self) -> FilterId {
        FilterId(self.next_raw())
    }
}

impl Default for IdGen {
    fn default() -> Self {
        Self::new()
    }
}

/// Direction for reordering items in an ordered list.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    /// Toward the start of the list (index - 1).
    Up,
    /// Toward the end of the list (index + 1).
    Down,
}

/// Swap the item at `idx` with its neighbour in `dir`. Returns `false` at the list boundary.
pub fn swap_adjacent<T>(items: &mut [T], idx: usize, dir: Direction) -> bool {
    let other = match dir {
        Direction::Up => idx.checked_sub(1),
        Direction::Down => idx.checked_add(1).filter(|&j| j < items.len()),
    };
    match other {
        Some(j) if idx < items.len() => {
            items.swap(idx, j);
            true
        }
        _ => false,
    }
}

/// Milliseconds since the unix epoch, used for output file names.
pub fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
