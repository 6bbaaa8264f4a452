use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::foundation::core::SceneId;
use crate::foundation::error::{OnAirError, OnAirResult};
use crate::render::transition::TransitionConfig;
use crate::scene::graph::Scene;
use crate::source::acquire::AcquisitionRequest;
use crate::studio::settings::StudioSettings;
use crate::studio::state::Studio;

/// Current profile format version.
pub const PROFILE_VERSION: u32 = 1;

/// Store key used when the host does not pick one.
pub const DEFAULT_PROFILE_KEY: &str = "onair-profile";

fn default_version() -> u32 {
    PROFILE_VERSION
}

/// Persisted studio state: scenes with their sources, settings and the program scene.
///
/// Media streams and decoded rasters are never persisted; media-backed sources are restored
/// content-less and re-acquired.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    #[serde(default = "default_version")]
    pub version: u32,
    pub scenes: Vec<Scene>,
    #[serde(default)]
    pub settings: StudioSettings,
    #[serde(default)]
    pub current_scene_id: Option<SceneId>,
    #[serde(default)]
    pub transition: TransitionConfig,
}

impl Profile {
    /// Parse a profile document. Unknown versions are rejected.
    pub fn from_json(json: &str) -> OnAirResult<Self> {
        let profile: Self = serde_json::from_str(json)
            .map_err(|e| OnAirError::serde(format!("corrupt profile: {e}")))?;
        if profile.version > PROFILE_VERSION {
            return Err(OnAirError::serde(format!(
                "unsupported profile version {} (newest known is {PROFILE_VERSION})",
                profile.version
            )));
        }
        Ok(profile)
    }
}

/// Borrowed view of a studio, serialized in the same shape [`Profile`] reads.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileRef<'a> {
    version: u32,
    scenes: &'a [Scene],
    settings: &'a StudioSettings,
    current_scene_id: &'a SceneId,
    transition: &'a TransitionConfig,
}

impl<'a> ProfileRef<'a> {
    pub(crate) fn new(
        scenes: &'a [Scene],
        settings: &'a StudioSettings,
        current_scene_id: &'a SceneId,
        transition: &'a TransitionConfig,
    ) -> Self {
        Self {
            version: PROFILE_VERSION,
            scenes,
            settings,
            current_scene_id,
            transition,
        }
    }

    pub fn to_json(&self) -> OnAirResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| OnAirError::serde(e.to_string()))
    }
}

/// Key-value persistence for profile documents.
pub trait ProfileStore {
    fn get(&self, key: &str) -> OnAirResult<Option<String>>;
    fn put(&mut self, key: &str, value: &str) -> OnAirResult<()>;
    fn remove(&mut self, key: &str) -> OnAirResult<()>;
}

/// Volatile store, mainly for tests and embedding.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl ProfileStore for MemoryStore {
    fn get(&self, key: &str) -> OnAirResult<Option<String>> {
        Ok(self.entries.get(key).cloned())
    }

    fn put(&mut self, key: &str, value: &str) -> OnAirResult<()> {
        self.entries.insert(key.to_owned(), value.to_owned());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> OnAirResult<()> {
        self.entries.remove(key);
        Ok(())
    }
}

/// Store keeping each key in `<dir>/<key>.json`.
#[derive(Debug, Clone)]
pub struct DirStore {
    dir: PathBuf,
}

impl DirStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path_for(&self, key: &str) -> OnAirResult<PathBuf> {
        let valid = !key.is_empty()
            && key
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'))
            && !key.starts_with('.');
        if !valid {
            return Err(OnAirError::validation(format!("invalid profile key \"{key}\"")));
        }
        Ok(self.dir.join(format!("{key}.json")))
    }
}

impl ProfileStore for DirStore {
    fn get(&self, key: &str) -> OnAirResult<Option<String>> {
        let path = self.path_for(key)?;
        if !path.exists() {
            return Ok(None);
        }
        let text = std::fs::read_to_string(&path)
            .with_context(|| format!("read profile '{}'", path.display()))?;
        Ok(Some(text))
    }

    fn put(&mut self, key: &str, value: &str) -> OnAirResult<()> {
        let path = self.path_for(key)?;
        std::fs::create_dir_all(&self.dir)
            .with_context(|| format!("create profile dir '{}'", self.dir.display()))?;
        std::fs::write(&path, value)
            .with_context(|| format!("write profile '{}'", path.display()))?;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> OnAirResult<()> {
        let path = self.path_for(key)?;
        if path.exists() {
            std::fs::remove_file(&path)
                .with_context(|| format!("remove profile '{}'", path.display()))?;
        }
        Ok(())
    }
}

/// Serialize `studio` into `store` under `key`.
pub fn save_profile(studio: &Studio, store: &mut dyn ProfileStore, key: &str) -> OnAirResult<()> {
    let json = studio.profile().to_json()?;
    store.put(key, &json)?;
    tracing::info!(key, bytes = json.len(), "profile saved");
    Ok(())
}

/// Load `key` from `store` into `studio`.
///
/// A missing key leaves the studio untouched and yields no requests. A corrupt or invalid
/// profile resets the studio to its default single-scene state and returns the error.
#[tracing::instrument(skip(studio, store))]
pub fn load_profile_into(
    studio: &mut Studio,
    store: &dyn ProfileStore,
    key: &str,
) -> OnAirResult<Vec<AcquisitionRequest>> {
    let Some(json) = store.get(key)? else {
        tracing::debug!("no saved profile");
        return Ok(Vec::new());
    };
    match Profile::from_json(&json).and_then(|p| studio.load_profile(p)) {
        Ok(requests) => Ok(requests),
        Err(e) => {
            tracing::error!(error = %e, "profile rejected; studio reset to defaults");
            studio.reset();
            Err(e)
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/profile/store.rs"]
mod tests;
