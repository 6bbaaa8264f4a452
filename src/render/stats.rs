use serde::Serialize;

/// Counters exposed through `GetStats` and the CLI.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderStats {
    /// Frames rendered during the last complete one-second window.
    pub fps: u32,
    pub total_frames: u64,
    /// Frame slots that elapsed without a render (late ticks).
    pub dropped_frames: u64,
    /// Source draws skipped because of per-source faults.
    pub skipped_sources: u64,
    pub average_render_ms: f64,
}

impl RenderStats {
    pub(crate) fn record_frame(&mut self, render_ms: f64, dropped: u64, skipped_sources: u64) {
        self.total_frames += 1;
        self.dropped_frames += dropped;
        self.skipped_sources += skipped_sources;
        let n = self.total_frames as f64;
        self.average_render_ms += (render_ms - self.average_render_ms) / n;
    }
}

/// Fixed-interval frame limiter. Ticks are polled, never slept on.
#[derive(Clone, Debug)]
pub struct FrameClock {
    interval_ms: f64,
    last_ms: Option<f64>,
}

impl FrameClock {
    pub fn new(fps: u32) -> Self {
        Self {
            interval_ms: interval_for(fps),
            last_ms: None,
        }
    }

    pub fn interval_ms(&self) -> f64 {
        self.interval_ms
    }

    pub fn set_fps(&mut self, fps: u32) {
        self.interval_ms = interval_for(fps);
    }

    /// `None` when the next frame is not due yet, otherwise the number of whole frame slots
    /// missed since the previous render.
    ///
    /// The committed timestamp keeps the remainder (`now - delta % interval`) so the cadence
    /// does not drift with polling jitter.
    pub fn poll(&mut self, now_ms: f64) -> Option<u64> {
        let Some(last) = self.last_ms else {
            self.last_ms = Some(now_ms);
            return Some(0);
        };
        let delta = now_ms - last;
        if delta < self.interval_ms {
            return None;
        }
        self.last_ms = Some(now_ms - delta % self.interval_ms);
        let slots = (delta / self.interval_ms).floor() as u64;
        Some(slots.saturating_sub(1))
    }

    pub fn reset(&mut self) {
        self.last_ms = None;
    }
}

fn interval_for(fps: u32) -> f64 {
    1000.0 / f64::from(fps.max(1))
}

/// Frames-per-second over consecutive one-second windows.
#[derive(Clone, Debug, Default)]
pub struct FpsCounter {
    window_start_ms: Option<f64>,
    frames: u32,
    fps: u32,
}

impl FpsCounter {
    /// Count one frame at `now_ms` and return the current reading.
    pub fn frame(&mut self, now_ms: f64) -> u32 {
        let start = *self.window_start_ms.get_or_insert(now_ms);
        self.frames += 1;
        if now_ms - start >= 1000.0 {
            self.fps = self.frames;
            self.frames = 0;
            self.window_start_ms = Some(now_ms);
        }
        self.fps
    }

    pub fn fps(&self) -> u32 {
        self.fps
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/stats.rs"]
mod tests;
