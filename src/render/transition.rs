use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::foundation::core::SceneId;
use crate::foundation::error::{OnAirError, OnAirResult};

/// Upper bound accepted for a transition duration.
pub const MAX_DURATION_MS: u32 = 20_000;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransitionKind {
    Cut,
    #[default]
    Fade,
    Slide,
}

impl TransitionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Cut => "cut",
            Self::Fade => "fade",
            Self::Slide => "slide",
        }
    }
}

impl FromStr for TransitionKind {
    type Err = OnAirError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cut" => Ok(Self::Cut),
            "fade" => Ok(Self::Fade),
            "slide" => Ok(Self::Slide),
            other => Err(OnAirError::validation(format!(
                "unknown transition kind '{other}'"
            ))),
        }
    }
}

/// Transition used by scene switches.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TransitionConfig {
    #[serde(rename = "type")]
    pub kind: TransitionKind,
    pub duration_ms: u32,
}

impl Default for TransitionConfig {
    fn default() -> Self {
        Self {
            kind: TransitionKind::Fade,
            duration_ms: 300,
        }
    }
}

impl TransitionConfig {
    pub fn validate(&self) -> OnAirResult<()> {
        if self.duration_ms > MAX_DURATION_MS {
            return Err(OnAirError::validation(format!(
                "transition duration must be <= {MAX_DURATION_MS} ms"
            )));
        }
        Ok(())
    }
}

/// A transition in flight.
#[derive(Clone, Debug, PartialEq)]
pub struct ActiveTransition {
    pub kind: TransitionKind,
    pub from: SceneId,
    pub to: SceneId,
    pub duration_ms: f64,
    pub started_ms: f64,
    pub progress: f64,
}

/// What the compositor should draw for this tick.
#[derive(Clone, Debug, PartialEq)]
pub struct TransitionFrame {
    pub kind: TransitionKind,
    pub from: SceneId,
    pub to: SceneId,
    pub progress: f64,
}

impl TransitionFrame {
    pub fn is_finished(&self) -> bool {
        self.progress >= 1.0
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub enum TransitionState {
    #[default]
    Idle,
    Transitioning(ActiveTransition),
}

/// Idle → Transitioning → Idle.
///
/// Progress is `clamp(elapsed / duration, 0, 1)` and never decreases, even if the clock
/// handed to [`TransitionMachine::advance`] goes backwards.
#[derive(Debug, Default)]
pub struct TransitionMachine {
    state: TransitionState,
}

impl TransitionMachine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &TransitionState {
        &self.state
    }

    pub fn is_active(&self) -> bool {
        matches!(self.state, TransitionState::Transitioning(_))
    }

    pub fn active(&self) -> Option<&ActiveTransition> {
        match &self.state {
            TransitionState::Transitioning(t) => Some(t),
            TransitionState::Idle => None,
        }
    }

    pub fn progress(&self) -> Option<f64> {
        self.active().map(|t| t.progress)
    }

    /// Enter `Transitioning`, replacing anything already in flight.
    pub fn begin(
        &mut self,
        from: SceneId,
        to: SceneId,
        config: TransitionConfig,
        now_ms: f64,
    ) {
        tracing::debug!(
            kind = config.kind.as_str(),
            from = %from,
            to = %to,
            duration_ms = config.duration_ms,
            "transition started"
        );
        self.state = TransitionState::Transitioning(ActiveTransition {
            kind: config.kind,
            from,
            to,
            duration_ms: f64::from(config.duration_ms),
            started_ms: now_ms,
            progress: 0.0,
        });
    }

    /// Recompute progress for `now_ms` and report what to draw. `None` while idle.
    pub fn advance(&mut self, now_ms: f64) -> Option<TransitionFrame> {
        let TransitionState::Transitioning(t) = &mut self.state else {
            return None;
        };
        let next = match t.kind {
            TransitionKind::Cut => 1.0,
            _ if t.duration_ms <= 0.0 => 1.0,
            _ => ((now_ms - t.started_ms) / t.duration_ms).clamp(0.0, 1.0),
        };
        if next.is_finite() && next > t.progress {
            t.progress = next;
        }
        Some(TransitionFrame {
            kind: t.kind,
            from: t.from.clone(),
            to: t.to.clone(),
            progress: t.progress,
        })
    }

    /// Return to idle once progress has reached 1, yielding the target scene.
    pub fn finish(&mut self) -> Option<SceneId> {
        match &self.state {
            TransitionState::Transitioning(t) if t.progress >= 1.0 => {}
            _ => return None,
        }
        match std::mem::take(&mut self.state) {
            TransitionState::Transitioning(t) => {
                tracing::debug!(to = %t.to, "transition finished");
                Some(t.to)
            }
            TransitionState::Idle => None,
        }
    }

    /// Abort without committing.
    pub fn cancel(&mut self) -> Option<ActiveTransition> {
        match std::mem::take(&mut self.state) {
            TransitionState::Transitioning(t) => Some(t),
            TransitionState::Idle => None,
        }
    }

    /// Whether the running transition reads from or writes to `scene`.
    pub fn involves(&self, scene: &SceneId) -> bool {
        self.active()
            .is_some_and(|t| &t.from == scene || &t.to == scene)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/transition.rs"]
mod tests;
