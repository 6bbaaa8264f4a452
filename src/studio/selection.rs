use crate::foundation::core::SourceId;

/// Selected sources: a primary source plus the ordered multi-selection set.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Selection {
    primary: Option<SourceId>,
    ids: Vec<SourceId>,
}

impl Selection {
    /// Replace the selection with `id` alone.
    pub fn select(&mut self, id: SourceId) {
        self.ids = vec![id.clone()];
        self.primary = Some(id);
    }

    /// Add or remove `id` (multi-select). Returns whether it is selected afterwards.
    pub fn toggle(&mut self, id: SourceId) -> bool {
        if self.contains(&id) {
            self.remove(&id);
            false
        } else {
            self.ids.push(id.clone());
            self.primary = Some(id);
            true
        }
    }

    /// Drop `id` from the selection; the most recent remaining entry becomes primary.
    pub fn remove(&mut self, id: &SourceId) {
        self.ids.retain(|s| s != id);
        if self.primary.as_ref() == Some(id) {
            self.primary = self.ids.last().cloned();
        }
    }

    pub fn clear(&mut self) {
        self.primary = None;
        self.ids.clear();
    }

    pub fn contains(&self, id: &SourceId) -> bool {
        self.ids.contains(id)
    }

    pub fn primary(&self) -> Option<&SourceId> {
        self.primary.as_ref()
    }

    pub fn ids(&self) -> &[SourceId] {
        &self.ids
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Keep only ids accepted by `keep`.
    pub fn retain(&mut self, mut keep: impl FnMut(&SourceId) -> bool) {
        self.ids.retain(|id| keep(id));
        if self.primary.as_ref().is_some_and(|p| !self.ids.contains(p)) {
            self.primary = self.ids.last().cloned();
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/studio/selection.rs"]
mod tests;
