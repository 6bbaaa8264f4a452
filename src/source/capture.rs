use std::sync::{Arc, Mutex};

use crate::foundation::error::{OnAirError, OnAirResult};
use crate::render::buffer::PixelBuffer;

/// Samples a feed holds before the oldest are dropped (two seconds at 48 kHz).
pub const MAX_PENDING_SAMPLES: usize = 96_000;

/// Readiness of a live media stream, numbered like `HTMLMediaElement.readyState`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[repr(u8)]
pub enum ReadyState {
    HaveNothing = 0,
    HaveMetadata = 1,
    HaveCurrentData = 2,
    HaveFutureData = 3,
    HaveEnoughData = 4,
}

impl ReadyState {
    /// `true` once a decoded frame can be drawn.
    pub fn can_draw(self) -> bool {
        self >= ReadyState::HaveCurrentData
    }
}

/// A live capture (camera, screen or window) owned by one source.
///
/// Implementations are provided by the host: the crate only reads frames and stops tracks.
pub trait CaptureStream: Send {
    fn ready_state(&self) -> ReadyState;

    /// Latest decoded frame, `None` before the first one arrives.
    fn current_frame(&self) -> OnAirResult<Option<Arc<PixelBuffer>>>;

    /// Whether the stream carries an audio track that should join the audio bus.
    fn has_audio(&self) -> bool {
        false
    }

    /// Drain the mono samples captured since the last call, at the studio's audio sample rate.
    fn take_audio(&mut self) -> Vec<f32> {
        Vec::new()
    }

    fn is_active(&self) -> bool;

    /// Stop every track. Must be idempotent.
    fn stop(&mut self);
}

#[derive(Debug)]
struct FeedState {
    live: bool,
    ready: ReadyState,
    frame: Option<Arc<PixelBuffer>>,
    audio: Vec<f32>,
    fault: Option<String>,
}

/// Capture stream whose frames are pushed by a producer (device thread, decoder, test).
///
/// Created in pairs with a [`FeedWriter`]; the stream side is attached to a source, the writer
/// stays with the producer. Latest frame wins.
#[derive(Debug)]
pub struct FeedStream {
    state: Arc<Mutex<FeedState>>,
    has_audio: bool,
}

/// Producer side of a [`FeedStream`].
#[derive(Clone, Debug)]
pub struct FeedWriter {
    state: Arc<Mutex<FeedState>>,
}

/// Create a connected stream/writer pair. The stream starts live with metadata only.
pub fn feed(has_audio: bool) -> (FeedStream, FeedWriter) {
    let state = Arc::new(Mutex::new(FeedState {
        live: true,
        ready: ReadyState::HaveMetadata,
        frame: None,
        audio: Vec::new(),
        fault: None,
    }));
    (
        FeedStream {
            state: state.clone(),
            has_audio,
        },
        FeedWriter { state },
    )
}

impl FeedWriter {
    /// Publish a new frame. Ignored once the stream has been stopped.
    pub fn push_frame(&self, frame: PixelBuffer) {
        if let Ok(mut s) = self.state.lock()
            && s.live
        {
            s.frame = Some(Arc::new(frame));
            s.fault = None;
            s.ready = ReadyState::HaveEnoughData;
        }
    }

    /// Queue audio samples for the next drain. Ignored once the stream has been stopped.
    pub fn push_audio(&self, samples: &[f32]) {
        if let Ok(mut s) = self.state.lock()
            && s.live
        {
            s.audio.extend_from_slice(samples);
            let excess = s.audio.len().saturating_sub(MAX_PENDING_SAMPLES);
            if excess > 0 {
                s.audio.drain(..excess);
            }
        }
    }

    /// Report a device fault; subsequent frame reads fail until a new frame is pushed.
    pub fn fail(&self, msg: impl Into<String>) {
        if let Ok(mut s) = self.state.lock() {
            s.fault = Some(msg.into());
        }
    }

    /// `false` once the consumer stopped the stream.
    pub fn is_live(&self) -> bool {
        self.state.lock().map(|s| s.live).unwrap_or(false)
    }
}

impl CaptureStream for FeedStream {
    fn ready_state(&self) -> ReadyState {
        self.state
            .lock()
            .map(|s| s.ready)
            .unwrap_or(ReadyState::HaveNothing)
    }

    fn current_frame(&self) -> OnAirResult<Option<Arc<PixelBuffer>>> {
        let s = self
            .state
            .lock()
            .map_err(|_| OnAirError::acquisition("capture feed poisoned"))?;
        if let Some(msg) = &s.fault {
            return Err(OnAirError::acquisition(format!("capture device fault: {msg}")));
        }
        Ok(s.frame.clone())
    }

    fn has_audio(&self) -> bool {
        self.has_audio
    }

    fn take_audio(&mut self) -> Vec<f32> {
        let Ok(mut s) = self.state.lock() else {
            return Vec::new();
        };
        let samples = std::mem::take(&mut s.audio);
        if self.has_audio { samples } else { Vec::new() }
    }

    fn is_active(&self) -> bool {
        self.state.lock().map(|s| s.live).unwrap_or(false)
    }

    fn stop(&mut self) {
        if let Ok(mut s) = self.state.lock() {
            s.live = false;
            s.frame = None;
            s.audio.clear();
            s.ready = ReadyState::HaveNothing;
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/source/capture.rs"]
mod tests;
