use serde::{Deserialize, Serialize};

use crate::assets::color::Color;
use crate::foundation::core::{Direction, IdGen, Point, SceneId, SourceId, swap_adjacent};
use crate::foundation::error::{OnAirError, OnAirResult};
use crate::source::model::Source;
use crate::transform::geometry::hit_test;

/// Named, ordered collection of sources drawn over a background.
///
/// List order is z-order: later sources are drawn on top.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scene {
    pub id: SceneId,
    pub name: String,
    #[serde(default = "default_background", rename = "backgroundColor")]
    pub background: Color,
    #[serde(default)]
    pub sources: Vec<Source>,
}

fn default_background() -> Color {
    Color::BLACK
}

impl Scene {
    pub fn new(id: SceneId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            background: default_background(),
            sources: Vec::new(),
        }
    }

    pub fn source(&self, id: &SourceId) -> Option<&Source> {
        self.sources.iter().find(|s| &s.id == id)
    }

    pub fn source_mut(&mut self, id: &SourceId) -> Option<&mut Source> {
        self.sources.iter_mut().find(|s| &s.id == id)
    }

    pub fn contains_source(&self, id: &SourceId) -> bool {
        self.sources.iter().any(|s| &s.id == id)
    }

    /// Append `source` on top of the existing ones.
    pub fn add_source(&mut self, source: Source) -> &mut Source {
        self.sources.push(source);
        let last = self.sources.len() - 1;
        &mut self.sources[last]
    }

    /// Detach `id` from the scene, releasing its media before handing it back.
    pub fn remove_source(&mut self, id: &SourceId) -> Option<Source> {
        let idx = self.sources.iter().position(|s| &s.id == id)?;
        let mut source = self.sources.remove(idx);
        source.release();
        Some(source)
    }

    /// Swap `id` with its neighbour. `Direction::Down` moves it toward the top of the stack.
    pub fn move_source(&mut self, id: &SourceId, dir: Direction) -> OnAirResult<bool> {
        let idx = self
            .sources
            .iter()
            .position(|s| &s.id == id)
            .ok_or_else(|| OnAirError::validation(format!("unknown source \"{id}\"")))?;
        Ok(swap_adjacent(&mut self.sources, idx, dir))
    }

    /// Topmost visible source under `p`.
    pub fn source_at(&self, p: Point) -> Option<&Source> {
        self.sources
            .iter()
            .rev()
            .find(|s| hit_test(&s.geometry, s.visible, p))
    }

    /// Release the media of every source, returning their ids.
    pub fn release_all(&mut self) -> Vec<SourceId> {
        self.sources
            .iter_mut()
            .map(|s| {
                s.release();
                s.id.clone()
            })
            .collect()
    }

    /// Deep copy under a new id; see [`Source::duplicate`].
    pub fn duplicate(&self, ids: &mut IdGen) -> Self {
        Self {
            id: ids.scene(),
            name: format!("{} (Copy)", self.name),
            background: self.background,
            sources: self.sources.iter().map(|s| s.duplicate(ids)).collect(),
        }
    }
}

/// The studio's scene list. Never empty once constructed through [`SceneGraph::with_default`].
#[derive(Debug, Default)]
pub struct SceneGraph {
    scenes: Vec<Scene>,
}

impl SceneGraph {
    /// Graph holding a single empty scene named "Scene 1".
    pub fn with_default(ids: &mut IdGen) -> Self {
        let mut g = Self::default();
        g.create(ids, None);
        g
    }

    /// Graph holding `scenes` as-is. Fails on an empty list.
    pub fn from_scenes(scenes: Vec<Scene>) -> OnAirResult<Self> {
        if scenes.is_empty() {
            return Err(OnAirError::validation("at least one scene is required"));
        }
        Ok(Self { scenes })
    }

    pub fn scenes(&self) -> &[Scene] {
        &self.scenes
    }

    pub fn len(&self) -> usize {
        self.scenes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.scenes.is_empty()
    }

    pub fn get(&self, id: &SceneId) -> Option<&Scene> {
        self.scenes.iter().find(|s| &s.id == id)
    }

    pub fn get_mut(&mut self, id: &SceneId) -> Option<&mut Scene> {
        self.scenes.iter_mut().find(|s| &s.id == id)
    }

    pub fn index_of(&self, id: &SceneId) -> Option<usize> {
        self.scenes.iter().position(|s| &s.id == id)
    }

    pub fn first_id(&self) -> Option<&SceneId> {
        self.scenes.first().map(|s| &s.id)
    }

    pub fn by_name(&self, name: &str) -> Option<&Scene> {
        self.scenes.iter().find(|s| s.name == name)
    }

    fn require(&self, id: &SceneId) -> OnAirResult<usize> {
        self.index_of(id)
            .ok_or_else(|| OnAirError::validation(format!("unknown scene \"{id}\"")))
    }

    /// Append a new empty scene. Without a name it is called "Scene N".
    pub fn create(&mut self, ids: &mut IdGen, name: Option<&str>) -> SceneId {
        let name = match name.map(str::trim).filter(|n| !n.is_empty()) {
            Some(n) => n.to_owned(),
            None => self.next_default_name(),
        };
        let id = loop {
            let id = ids.scene();
            if self.get(&id).is_none() {
                break id;
            }
        };
        self.scenes.push(Scene::new(id.clone(), name));
        id
    }

    fn next_default_name(&self) -> String {
        let mut n = self.scenes.len() + 1;
        loop {
            let candidate = format!("Scene {n}");
            if self.by_name(&candidate).is_none() {
                return candidate;
            }
            n += 1;
        }
    }

    /// Remove a scene and release every source it owns. The last scene cannot be removed.
    pub fn remove(&mut self, id: &SceneId) -> OnAirResult<Scene> {
        let idx = self.require(id)?;
        if self.scenes.len() <= 1 {
            return Err(OnAirError::validation("cannot remove the last scene"));
        }
        let mut scene = self.scenes.remove(idx);
        scene.release_all();
        Ok(scene)
    }

    /// Append a deep copy of `id` and return the copy's id.
    pub fn duplicate(&mut self, ids: &mut IdGen, id: &SceneId) -> OnAirResult<SceneId> {
        let idx = self.require(id)?;
        let copy = self.scenes[idx].duplicate(ids);
        let new_id = copy.id.clone();
        self.scenes.push(copy);
        Ok(new_id)
    }

    /// Swap with the neighbouring scene. No-op (returns `false`) at either end.
    pub fn reorder(&mut self, id: &SceneId, dir: Direction) -> OnAirResult<bool> {
        let idx = self.require(id)?;
        Ok(swap_adjacent(&mut self.scenes, idx, dir))
    }

    pub fn rename(&mut self, id: &SceneId, name: &str) -> OnAirResult<()> {
        let name = name.trim();
        if name.is_empty() {
            return Err(OnAirError::validation("scene name must not be empty"));
        }
        let idx = self.require(id)?;
        self.scenes[idx].name = name.to_owned();
        Ok(())
    }

    /// Scene holding source `id`.
    pub fn scene_of(&self, id: &SourceId) -> Option<&Scene> {
        self.scenes.iter().find(|s| s.contains_source(id))
    }

    pub fn find_source(&self, id: &SourceId) -> Option<&Source> {
        self.scenes.iter().find_map(|s| s.source(id))
    }

    pub fn find_source_mut(&mut self, id: &SourceId) -> Option<&mut Source> {
        self.scenes.iter_mut().find_map(|s| s.source_mut(id))
    }

    pub(crate) fn sources_mut(&mut self) -> impl Iterator<Item = &mut Source> {
        self.scenes.iter_mut().flat_map(|s| s.sources.iter_mut())
    }

    /// Remove source `id` from whichever scene holds it.
    pub fn remove_source(&mut self, id: &SourceId) -> Option<Source> {
        self.scenes.iter_mut().find_map(|s| s.remove_source(id))
    }

    /// Release everything and hand the scenes back (profile replacement).
    pub fn release_all(&mut self) -> Vec<SourceId> {
        self.scenes
            .iter_mut()
            .flat_map(|s| s.release_all())
            .collect()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/scene/graph.rs"]
mod tests;
