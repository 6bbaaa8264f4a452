use serde::{Deserialize, Serialize};

use crate::effects::filter::{Filter, FilterKind, FilterType};
use crate::foundation::core::{Direction, FilterId, IdGen, SourceId, swap_adjacent};
use crate::foundation::error::{OnAirError, OnAirResult};
use crate::source::canvas::{RasterCache, SourceCanvas};
use crate::source::content::{SourceContent, SourceKind};
use crate::transform::geometry::{Crop, Geometry};

/// Per-source audio settings.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AudioSettings {
    /// Linear gain in `[0, 1]`.
    pub volume: f32,
    pub muted: bool,
}

impl Default for AudioSettings {
    fn default() -> Self {
        Self {
            volume: 1.0,
            muted: false,
        }
    }
}

/// A visual/audio content provider placed in a scene.
///
/// The source owns its content handle; dropping or removing it must go through
/// [`Source::release`] so capture tracks stop synchronously.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Source {
    pub id: SourceId,
    #[serde(default)]
    pub name: String,
    #[serde(flatten)]
    pub geometry: Geometry,
    #[serde(default = "default_opacity")]
    pub opacity: f64,
    #[serde(default = "default_true")]
    pub visible: bool,
    #[serde(default)]
    pub locked: bool,
    #[serde(default)]
    pub crop: Crop,
    #[serde(default)]
    pub filters: Vec<Filter>,
    #[serde(default)]
    pub audio: AudioSettings,
    #[serde(flatten)]
    pub content: SourceContent,
}

fn default_opacity() -> f64 {
    1.0
}

fn default_true() -> bool {
    true
}

impl Source {
    /// New visible, unlocked source with default geometry.
    pub fn new(id: SourceId, name: impl Into<String>, content: SourceContent) -> Self {
        let mut name = name.into();
        if name.trim().is_empty() {
            name = content.kind().default_name().to_owned();
        }
        Self {
            id,
            name,
            geometry: Geometry::default(),
            opacity: 1.0,
            visible: true,
            locked: false,
            crop: Crop::default(),
            filters: Vec::new(),
            audio: AudioSettings::default(),
            content,
        }
    }

    pub fn kind(&self) -> SourceKind {
        self.content.kind()
    }

    /// Deep copy with fresh source and filter ids. Capture streams are not carried over.
    pub fn duplicate(&self, ids: &mut IdGen) -> Self {
        Self {
            id: ids.source(),
            name: self.name.clone(),
            geometry: self.geometry,
            opacity: self.opacity,
            visible: self.visible,
            locked: self.locked,
            crop: self.crop,
            filters: self
                .filters
                .iter()
                .map(|f| Filter {
                    id: ids.filter(),
                    ..f.clone()
                })
                .collect(),
            audio: self.audio,
            content: self.content.detached_copy(),
        }
    }

    /// Stop capture tracks and drop decoded media.
    pub fn release(&mut self) {
        self.content.release();
    }

    /// Draw the content into `canvas` (local space, transform applied by the caller).
    pub fn draw(&self, canvas: &mut SourceCanvas, rasters: &mut RasterCache) -> OnAirResult<()> {
        self.content.draw(canvas, rasters)
    }

    /// Reject geometry edits on locked sources.
    pub fn ensure_unlocked(&self) -> OnAirResult<()> {
        if self.locked {
            return Err(OnAirError::validation(format!(
                "source \"{}\" is locked",
                self.name
            )));
        }
        Ok(())
    }

    pub fn set_opacity(&mut self, opacity: f64) -> OnAirResult<()> {
        if !opacity.is_finite() {
            return Err(OnAirError::validation("opacity must be finite"));
        }
        self.opacity = opacity.clamp(0.0, 1.0);
        Ok(())
    }

    /// Set crop insets, clamped to the current size.
    pub fn set_crop(&mut self, crop: Crop) {
        self.crop = crop.clamped(self.geometry.width, self.geometry.height);
    }

    pub fn filter(&self, id: &FilterId) -> Option<&Filter> {
        self.filters.iter().find(|f| &f.id == id)
    }

    fn filter_index(&self, id: &FilterId) -> OnAirResult<usize> {
        self.filters
            .iter()
            .position(|f| &f.id == id)
            .ok_or_else(|| OnAirError::validation(format!("unknown filter \"{id}\"")))
    }

    /// Append a filter of `ty` with default parameters.
    pub fn add_filter(&mut self, id: FilterId, ty: FilterType) -> &Filter {
        self.filters.push(Filter::new(id, ty));
        &self.filters[self.filters.len() - 1]
    }

    pub fn remove_filter(&mut self, id: &FilterId) -> OnAirResult<Filter> {
        let idx = self.filter_index(id)?;
        Ok(self.filters.remove(idx))
    }

    /// Flip `enabled`, returning the new state.
    pub fn toggle_filter(&mut self, id: &FilterId) -> OnAirResult<bool> {
        let idx = self.filter_index(id)?;
        let f = &mut self.filters[idx];
        f.enabled = !f.enabled;
        Ok(f.enabled)
    }

    /// Replace a filter's parameters. The filter type cannot change.
    pub fn update_filter(&mut self, id: &FilterId, kind: FilterKind) -> OnAirResult<()> {
        let idx = self.filter_index(id)?;
        let f = &mut self.filters[idx];
        if f.filter_type() != kind.filter_type() {
            return Err(OnAirError::validation(format!(
                "filter \"{id}\" is {}, not {}",
                f.filter_type().as_str(),
                kind.filter_type().as_str()
            )));
        }
        f.kind = kind.validated()?;
        Ok(())
    }

    pub fn move_filter(&mut self, id: &FilterId, dir: Direction) -> OnAirResult<()> {
        let idx = self.filter_index(id)?;
        swap_adjacent(&mut self.filters, idx, dir);
        Ok(())
    }

    /// Check persisted values before a loaded source is accepted.
    pub fn validate(&self) -> OnAirResult<()> {
        self.geometry.validate()?;
        if !self.opacity.is_finite() || !(0.0..=1.0).contains(&self.opacity) {
            return Err(OnAirError::validation(format!(
                "source \"{}\" opacity {} is outside [0, 1]",
                self.name, self.opacity
            )));
        }
        if !(0.0..=1.0).contains(&self.audio.volume) {
            return Err(OnAirError::validation(format!(
                "source \"{}\" volume {} is outside [0, 1]",
                self.name, self.audio.volume
            )));
        }
        for f in &self.filters {
            f.kind.validated()?;
        }
        Ok(())
    }

    /// [`Source::validate`], then clamp every filter's parameters into range.
    pub fn normalize(&mut self) -> OnAirResult<()> {
        self.validate()?;
        for f in &mut self.filters {
            f.kind = f.kind.validated()?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/source/model.rs"]
mod tests;
