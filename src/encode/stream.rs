use serde::{Deserialize, Serialize};

use crate::foundation::error::{OnAirError, OnAirResult};
use crate::render::surface::FrameRGBA;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutputState {
    #[serde(rename = "OBS_WEBSOCKET_OUTPUT_STARTED")]
    Started,
    #[serde(rename = "OBS_WEBSOCKET_OUTPUT_STOPPED")]
    Stopped,
}

/// Output state as reported in `RecordStateChanged` / `StreamStateChanged` events.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OutputStatus {
    pub output_active: bool,
    pub output_state: OutputState,
}

impl OutputStatus {
    pub fn started() -> Self {
        Self {
            output_active: true,
            output_state: OutputState::Started,
        }
    }

    pub fn stopped() -> Self {
        Self {
            output_active: false,
            output_state: OutputState::Stopped,
        }
    }
}

/// Simulated live stream: tracks state and counts frames, transmits nothing.
#[derive(Clone, Debug, Default)]
pub struct StreamOutput {
    started_ms: Option<f64>,
    frames: u64,
}

impl StreamOutput {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_active(&self) -> bool {
        self.started_ms.is_some()
    }

    pub fn status(&self) -> OutputStatus {
        if self.is_active() {
            OutputStatus::started()
        } else {
            OutputStatus::stopped()
        }
    }

    pub fn started_ms(&self) -> Option<f64> {
        self.started_ms
    }

    pub fn duration_ms(&self, now_ms: f64) -> f64 {
        self.started_ms.map_or(0.0, |s| (now_ms - s).max(0.0))
    }

    pub fn frames_sent(&self) -> u64 {
        self.frames
    }

    pub fn start(&mut self, now_ms: f64) -> OnAirResult<OutputStatus> {
        if self.is_active() {
            return Err(OnAirError::validation("stream is already active"));
        }
        self.started_ms = Some(now_ms);
        self.frames = 0;
        tracing::info!("stream started (simulated)");
        Ok(self.status())
    }

    pub fn stop(&mut self) -> OnAirResult<OutputStatus> {
        if !self.is_active() {
            return Err(OnAirError::validation("stream is not active"));
        }
        self.started_ms = None;
        tracing::info!(frames = self.frames, "stream stopped");
        Ok(self.status())
    }

    pub fn push_frame(&mut self, _frame: &FrameRGBA) {
        if self.is_active() {
            self.frames += 1;
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/encode/stream.rs"]
mod tests;
