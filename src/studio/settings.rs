use serde::{Deserialize, Serialize};

use crate::foundation::core::Canvas;
use crate::foundation::error::{OnAirError, OnAirResult};

pub const MAX_FRAME_RATE: u32 = 120;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VideoEncoder {
    #[default]
    Vp9,
    Vp8,
}

impl VideoEncoder {
    /// Container mime type handed to the media encoder.
    pub fn mime_type(self) -> &'static str {
        match self {
            Self::Vp9 => "video/webm;codecs=vp9",
            Self::Vp8 => "video/webm;codecs=vp8",
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Webm,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Quality {
    Low,
    Medium,
    #[default]
    High,
}

/// Output and editing settings persisted with the profile.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct StudioSettings {
    #[serde(with = "resolution_str")]
    pub resolution: Canvas,
    pub frame_rate: u32,
    /// Video bitrate in kbps.
    pub video_bitrate: u32,
    pub audio_sample_rate: u32,
    pub encoder: VideoEncoder,
    pub output_format: OutputFormat,
    pub quality: Quality,
    pub show_grid: bool,
    pub grid_size: u32,
    pub snap_to_grid: bool,
    /// Keyboard nudge step in canvas units.
    pub nudge_step: f64,
}

impl Default for StudioSettings {
    fn default() -> Self {
        Self {
            resolution: Canvas::default(),
            frame_rate: 30,
            video_bitrate: 2500,
            audio_sample_rate: 48_000,
            encoder: VideoEncoder::default(),
            output_format: OutputFormat::default(),
            quality: Quality::default(),
            show_grid: false,
            grid_size: 20,
            snap_to_grid: false,
            nudge_step: 1.0,
        }
    }
}

impl StudioSettings {
    pub fn validate(&self) -> OnAirResult<()> {
        Canvas::new(self.resolution.width, self.resolution.height)?;
        if self.frame_rate == 0 || self.frame_rate > MAX_FRAME_RATE {
            return Err(OnAirError::validation(format!(
                "frame rate must be in 1..={MAX_FRAME_RATE}"
            )));
        }
        if self.video_bitrate == 0 {
            return Err(OnAirError::validation("video bitrate must be > 0"));
        }
        if self.audio_sample_rate == 0 {
            return Err(OnAirError::validation("audio sample rate must be > 0"));
        }
        if self.grid_size == 0 {
            return Err(OnAirError::validation("grid size must be > 0"));
        }
        if !self.nudge_step.is_finite() || self.nudge_step <= 0.0 {
            return Err(OnAirError::validation("nudge step must be > 0"));
        }
        Ok(())
    }

    /// Grid spacing used for snapping, when enabled.
    pub fn snap_grid(&self) -> Option<f64> {
        self.snap_to_grid.then_some(f64::from(self.grid_size))
    }
}

mod resolution_str {
    use serde::{Deserialize, Deserializer, Serializer};

    use crate::foundation::core::Canvas;

    pub fn serialize<S: Serializer>(c: &Canvas, s: S) -> Result<S::Ok, S::Error> {
        s.collect_str(c)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Canvas, D::Error> {
        let s = String::deserialize(d)?;
        Canvas::parse_resolution(&s).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/studio/settings.rs"]
mod tests;
