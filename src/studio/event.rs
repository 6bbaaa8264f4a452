//! State-change notifications collected by the studio for the control protocol and UI glue.

use serde_json::{Value, json};

use crate::encode::stream::OutputStatus;
use crate::foundation::core::SceneId;

/// Studio state changes, drained with [`crate::studio::state::Studio::take_events`].
#[derive(Clone, Debug, PartialEq)]
pub enum StudioEvent {
    /// The program scene changed (a transition finished or a cut was taken).
    CurrentProgramSceneChanged { scene_id: SceneId, scene_name: String },

    /// The preview scene changed in studio mode.
    CurrentPreviewSceneChanged { scene_id: SceneId, scene_name: String },

    /// Studio mode was toggled.
    StudioModeStateChanged { enabled: bool },

    RecordStateChanged(OutputStatus),

    StreamStateChanged(OutputStatus),
}

impl StudioEvent {
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::CurrentProgramSceneChanged { .. } => "CurrentProgramSceneChanged",
            Self::CurrentPreviewSceneChanged { .. } => "CurrentPreviewSceneChanged",
            Self::StudioModeStateChanged { .. } => "StudioModeStateChanged",
            Self::RecordStateChanged(_) => "RecordStateChanged",
            Self::StreamStateChanged(_) => "StreamStateChanged",
        }
    }

    /// Payload in obs-websocket field naming.
    pub fn event_data(&self) -> Value {
        match self {
            Self::CurrentProgramSceneChanged {
                scene_id,
                scene_name,
            }
            | Self::CurrentPreviewSceneChanged {
                scene_id,
                scene_name,
            } => json!({ "sceneName": scene_name, "sceneUuid": scene_id.as_str() }),
            Self::StudioModeStateChanged { enabled } => json!({ "studioModeEnabled": enabled }),
            Self::RecordStateChanged(s) | Self::StreamStateChanged(s) => {
                serde_json::to_value(s).unwrap_or(Value::Null)
            }
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/studio/event.rs"]
mod tests;
