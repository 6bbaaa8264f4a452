use crate::assets::color::Color;
use crate::foundation::core::FilterId;
use crate::foundation::error::{OnAirError, OnAirResult};
use serde::{Deserialize, Serialize};

/// One entry of a source's filter chain.
///
/// Serialized flat, the way profiles store it:
/// `{"id": "...", "type": "chromaKey", "enabled": true, "keyColor": "#00FF00", ...}`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Filter {
    pub id: FilterId,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(flatten)]
    pub kind: FilterKind,
}

fn default_true() -> bool {
    true
}

impl Filter {
    /// New enabled filter of `ty` with its default parameters.
    pub fn new(id: FilterId, ty: FilterType) -> Self {
        Self {
            id,
            enabled: true,
            kind: FilterKind::defaults(ty),
        }
    }

    pub fn filter_type(&self) -> FilterType {
        self.kind.filter_type()
    }
}

/// Filter parameters, one variant per filter type.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum FilterKind {
    ChromaKey {
        #[serde(default = "default_key_color")]
        key_color: Color,
        #[serde(default = "default_similarity")]
        similarity: f32,
        #[serde(default = "default_smoothness")]
        smoothness: f32,
    },
    ColorCorrection {
        #[serde(default)]
        brightness: f32,
        #[serde(default)]
        contrast: f32,
        #[serde(default)]
        saturation: f32,
        /// Accepted and persisted, not applied.
        #[serde(default)]
        hue: f32,
    },
    Blur {
        #[serde(default = "default_blur_radius")]
        radius: f32,
    },
    Sharpen {
        #[serde(default = "default_sharpen_amount")]
        amount: f32,
    },
    Opacity {
        #[serde(default = "default_opacity")]
        opacity: f32,
    },
}

fn default_key_color() -> Color {
    Color::rgb(0, 255, 0)
}
fn default_similarity() -> f32 {
    0.4
}
fn default_smoothness() -> f32 {
    0.1
}
fn default_blur_radius() -> f32 {
    5.0
}
fn default_sharpen_amount() -> f32 {
    1.0
}
fn default_opacity() -> f32 {
    1.0
}

impl FilterKind {
    /// Parameters a freshly added filter of `ty` starts with.
    pub fn defaults(ty: FilterType) -> Self {
        match ty {
            FilterType::ChromaKey => Self::ChromaKey {
                key_color: default_key_color(),
                similarity: default_similarity(),
                smoothness: default_smoothness(),
            },
            FilterType::ColorCorrection => Self::ColorCorrection {
                brightness: 0.0,
                contrast: 0.0,
                saturation: 0.0,
                hue: 0.0,
            },
            FilterType::Blur => Self::Blur {
                radius: default_blur_radius(),
            },
            FilterType::Sharpen => Self::Sharpen {
                amount: default_sharpen_amount(),
            },
            FilterType::Opacity => Self::Opacity {
                opacity: default_opacity(),
            },
        }
    }

    pub fn filter_type(&self) -> FilterType {
        match self {
            Self::ChromaKey { .. } => FilterType::ChromaKey,
            Self::ColorCorrection { .. } => FilterType::ColorCorrection,
            Self::Blur { .. } => FilterType::Blur,
            Self::Sharpen { .. } => FilterType::Sharpen,
            Self::Opacity { .. } => FilterType::Opacity,
        }
    }

    /// `true` when the filter reads or writes pixels of the offscreen buffer.
    pub fn needs_pixels(&self) -> bool {
        matches!(
            self,
            Self::ChromaKey { .. } | Self::ColorCorrection { .. } | Self::Sharpen { .. }
        )
    }

    /// Check parameter ranges, returning a copy with finite values clamped into range.
    pub fn validated(&self) -> OnAirResult<Self> {
        fn finite(name: &str, v: f32) -> OnAirResult<f32> {
            if v.is_finite() {
                Ok(v)
            } else {
                Err(OnAirError::validation(format!(
                    "filter parameter {name} must be finite"
                )))
            }
        }

        Ok(match *self {
            Self::ChromaKey {
                key_color,
                similarity,
                smoothness,
            } => {
                // An exact key match must always end fully transparent: similarity has to be
                // positive and the soft band may not reach past d = 0.
                let similarity = match finite("similarity", similarity)?.clamp(0.0, 1.0) {
                    s if s > 0.0 => s,
                    _ => default_similarity(),
                };
                let smoothness = finite("smoothness", smoothness)?.clamp(0.0, similarity);
                Self::ChromaKey {
                    key_color,
                    similarity,
                    smoothness,
                }
            }
            Self::ColorCorrection {
                brightness,
                contrast,
                saturation,
                hue,
            } => Self::ColorCorrection {
                brightness: finite("brightness", brightness)?.clamp(-100.0, 100.0),
                contrast: finite("contrast", contrast)?.clamp(-100.0, 100.0),
                saturation: finite("saturation", saturation)?.clamp(-100.0, 100.0),
                hue: finite("hue", hue)?.clamp(-180.0, 180.0),
            },
            Self::Blur { radius } => Self::Blur {
                radius: finite("radius", radius)?.clamp(0.0, 100.0),
            },
            Self::Sharpen { amount } => Self::Sharpen {
                amount: finite("amount", amount)?.clamp(0.0, 10.0),
            },
            Self::Opacity { opacity } => Self::Opacity {
                opacity: finite("opacity", opacity)?.clamp(0.0, 1.0),
            },
        })
    }
}

/// Filter type tag, used when adding a filter with default parameters.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FilterType {
    ChromaKey,
    ColorCorrection,
    Blur,
    Sharpen,
    Opacity,
}

impl FilterType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::ChromaKey => "chromaKey",
            Self::ColorCorrection => "colorCorrection",
            Self::Blur => "blur",
            Self::Sharpen => "sharpen",
            Self::Opacity => "opacity",
        }
    }
}

impl std::str::FromStr for FilterType {
    type Err = OnAirError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "chromaKey" | "chroma_key" | "chroma-key" => Ok(Self::ChromaKey),
            "colorCorrection" | "color_correction" | "color-correction" => {
                Ok(Self::ColorCorrection)
            }
            "blur" => Ok(Self::Blur),
            "sharpen" => Ok(Self::Sharpen),
            "opacity" => Ok(Self::Opacity),
            other => Err(OnAirError::validation(format!(
                "unknown filter type \"{other}\""
            ))),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/effects/filter.rs"]
mod tests;
