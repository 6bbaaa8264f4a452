use crate::foundation::error::OnAirResult;
use crate::render::surface::FrameRGBA;

/// Configuration provided to a [`FrameSink`] when it is attached to the program output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SinkConfig {
    /// Output width in pixels.
    pub width: u32,
    /// Output height in pixels.
    pub height: u32,
    /// Target frames-per-second of the render loop.
    pub fps: u32,
    /// Audio sample rate of the mixed track, when one exists.
    pub audio_sample_rate: Option<u32>,
}

/// Sink contract for consuming program frames.
///
/// Ordering contract: `push_frame` is called with strictly increasing frame indices between
/// `begin` and `end`.
pub trait FrameSink: Send {
    /// Called once before any frames are pushed.
    fn begin(&mut self, cfg: SinkConfig) -> OnAirResult<()>;
    /// Push one program frame.
    fn push_frame(&mut self, idx: u64, frame: &FrameRGBA) -> OnAirResult<()>;
    /// Called once after the last frame is pushed.
    fn end(&mut self) -> OnAirResult<()>;
}

/// In-memory sink for tests and debugging.
#[derive(Debug, Default)]
pub struct InMemorySink {
    cfg: Option<SinkConfig>,
    frames: Vec<(u64, FrameRGBA)>,
    ended: bool,
}

impl InMemorySink {
    /// Create a new in-memory sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the sink configuration captured in `begin`, if any.
    pub fn config(&self) -> Option<&SinkConfig> {
        self.cfg.as_ref()
    }

    /// Borrow the captured frames.
    pub fn frames(&self) -> &[(u64, FrameRGBA)] {
        &self.frames
    }

    pub fn is_ended(&self) -> bool {
        self.ended
    }
}

impl FrameSink for InMemorySink {
    fn begin(&mut self, cfg: SinkConfig) -> OnAirResult<()> {
        self.cfg = Some(cfg);
        self.frames.clear();
        self.ended = false;
        Ok(())
    }

    fn push_frame(&mut self, idx: u64, frame: &FrameRGBA) -> OnAirResult<()> {
        self.frames.push((idx, frame.clone()));
        Ok(())
    }

    fn end(&mut self) -> OnAirResult<()> {
        self.ended = true;
        Ok(())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/encode/sink.rs"]
mod tests;
