//! Commands from UI glue and acquisition workers, drained once per render tick.

use crossbeam_channel::{Receiver, Sender, TryRecvError, unbounded};

use crate::effects::filter::{FilterKind, FilterType};
use crate::foundation::core::{Direction, FilterId, Point, SceneId, SourceId, Vec2};
use crate::foundation::error::{OnAirError, OnAirResult};
use crate::render::transition::TransitionConfig;
use crate::source::acquire::AcquisitionOutcome;
use crate::source::content::{SourceContent, SourceKind};
use crate::studio::settings::StudioSettings;
use crate::transform::geometry::{Crop, Handle};

/// Options for a new source.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct NewSource {
    pub name: Option<String>,
    pub device_id: Option<String>,
    pub url: Option<String>,
}

/// One studio mutation.
#[derive(Debug)]
pub enum StudioCommand {
    // scenes
    CreateScene { name: Option<String> },
    RemoveScene(SceneId),
    DuplicateScene(SceneId),
    RenameScene { scene: SceneId, name: String },
    ReorderScene { scene: SceneId, direction: Direction },
    SwitchScene { scene: SceneId, use_transition: bool },
    SwitchSceneByIndex(usize),
    SetTransition(TransitionConfig),
    ToggleStudioMode,
    SetPreviewScene(SceneId),
    TransitionToProgram,

    // sources
    AddSource { kind: SourceKind, options: NewSource },
    RemoveSource(SourceId),
    RenameSource { source: SourceId, name: String },
    SetSourceContent { source: SourceId, content: SourceContent },
    MoveSource { source: SourceId, direction: Direction },
    Select(Option<SourceId>),
    ToggleSelect(SourceId),
    MoveSelection(Vec2),
    Nudge { dx: f64, dy: f64 },
    Resize { source: SourceId, handle: Handle, dx: f64, dy: f64 },
    RotateToward { source: SourceId, pointer: Point },
    FitToScreen(SourceId),
    ResetTransform(SourceId),
    SetOpacity { source: SourceId, opacity: f64 },
    SetVisible { source: SourceId, visible: bool },
    SetLocked { source: SourceId, locked: bool },
    SetCrop { source: SourceId, crop: Crop },
    SetVolume { source: SourceId, volume: f32 },
    SetMuted { source: SourceId, muted: bool },

    // filters
    AddFilter { source: SourceId, filter_type: FilterType },
    RemoveFilter { source: SourceId, filter: FilterId },
    ToggleFilter { source: SourceId, filter: FilterId },
    UpdateFilter { source: SourceId, filter: FilterId, kind: FilterKind },
    MoveFilter { source: SourceId, filter: FilterId, direction: Direction },

    // outputs
    StartRecording,
    PauseRecording,
    ResumeRecording,
    StopRecording,
    StartStreaming,
    StopStreaming,

    UpdateSettings(Box<StudioSettings>),
    AcquisitionResolved(AcquisitionOutcome),
}

/// Cloneable producer side of the command queue. Usable from any thread.
#[derive(Clone, Debug)]
pub struct CommandSender {
    tx: Sender<StudioCommand>,
}

impl CommandSender {
    pub fn send(&self, cmd: StudioCommand) -> OnAirResult<()> {
        self.tx
            .send(cmd)
            .map_err(|_| OnAirError::validation("studio command queue is closed"))
    }
}

/// Unbounded MPSC queue owned by the studio.
#[derive(Debug)]
pub struct CommandQueue {
    tx: Sender<StudioCommand>,
    rx: Receiver<StudioCommand>,
}

impl Default for CommandQueue {
    fn default() -> Self {
        let (tx, rx) = unbounded();
        Self { tx, rx }
    }
}

impl CommandQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sender(&self) -> CommandSender {
        CommandSender {
            tx: self.tx.clone(),
        }
    }

    pub fn push(&self, cmd: StudioCommand) {
        // The queue holds its own receiver, so the channel cannot be disconnected here.
        let _ = self.tx.send(cmd);
    }

    /// Take everything queued so far, in arrival order.
    pub fn drain(&self) -> Vec<StudioCommand> {
        let mut out = Vec::with_capacity(self.rx.len());
        loop {
            match self.rx.try_recv() {
                Ok(cmd) => out.push(cmd),
                Err(TryRecvError::Empty | TryRecvError::Disconnected) => break,
            }
        }
        out
    }

    pub fn len(&self) -> usize {
        self.rx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/studio/command.rs"]
mod tests;
