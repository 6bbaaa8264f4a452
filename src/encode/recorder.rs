use crate::foundation::error::{OnAirError, OnAirResult};
use crate::render::surface::FrameRGBA;

/// Container mime type of finished recordings.
pub const RECORDING_MIME: &str = "video/webm";

/// Parameters handed to the encoder when a recording starts.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncoderConfig {
    pub width: u32,
    pub height: u32,
    pub fps: u32,
    /// Video bitrate in kbps.
    pub video_bitrate: u32,
    /// Sample rate of the mixed audio track; `None` records video only.
    pub audio_sample_rate: Option<u32>,
    /// Codec-qualified mime type, e.g. `video/webm;codecs=vp9`.
    pub mime_type: String,
}

/// External media-encoding collaborator.
///
/// Implementations own bitrate control and container muxing; the recorder only buffers the
/// chunks they hand back.
pub trait MediaEncoder: Send {
    fn start(&mut self, cfg: &EncoderConfig) -> OnAirResult<()>;
    /// Encode one frame. May return a finished chunk.
    fn encode(&mut self, frame: &FrameRGBA, timestamp_ms: f64) -> OnAirResult<Option<Vec<u8>>>;
    /// Encode a block of mixed mono samples starting at `timestamp_ms`.
    fn encode_audio(&mut self, _samples: &[f32], _timestamp_ms: f64) -> OnAirResult<()> {
        Ok(())
    }
    /// Flush whatever is still buffered.
    fn finish(&mut self) -> OnAirResult<Vec<u8>>;
}

/// Encoder that emits one chunk per `chunk_ms` of recorded time.
///
/// Each frame contributes a 16-byte record (timestamp and pixel checksum), each audio block its
/// samples as little-endian f32. Used by tests and the CLI when no real encoder is wired in.
#[derive(Debug)]
pub struct InMemoryEncoder {
    chunk_ms: f64,
    chunk_start_ms: Option<f64>,
    pending: Vec<u8>,
    frames: u64,
    audio_samples: u64,
}

impl InMemoryEncoder {
    pub fn new(chunk_ms: f64) -> Self {
        Self {
            chunk_ms: chunk_ms.max(1.0),
            chunk_start_ms: None,
            pending: Vec::new(),
            frames: 0,
            audio_samples: 0,
        }
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn audio_samples(&self) -> u64 {
        self.audio_samples
    }
}

impl Default for InMemoryEncoder {
    fn default() -> Self {
        Self::new(1000.0)
    }
}

impl MediaEncoder for InMemoryEncoder {
    fn start(&mut self, _cfg: &EncoderConfig) -> OnAirResult<()> {
        self.chunk_start_ms = None;
        self.pending.clear();
        self.frames = 0;
        self.audio_samples = 0;
        Ok(())
    }

    fn encode(&mut self, frame: &FrameRGBA, timestamp_ms: f64) -> OnAirResult<Option<Vec<u8>>> {
        let start = *self.chunk_start_ms.get_or_insert(timestamp_ms);
        let checksum = frame
            .data
            .iter()
            .fold(0u64, |acc, &b| acc.wrapping_mul(31).wrapping_add(u64::from(b)));
        self.pending.extend_from_slice(&timestamp_ms.to_le_bytes());
        self.pending.extend_from_slice(&checksum.to_le_bytes());
        self.frames += 1;

        if timestamp_ms - start >= self.chunk_ms {
            self.chunk_start_ms = Some(timestamp_ms);
            return Ok(Some(std::mem::take(&mut self.pending)));
        }
        Ok(None)
    }

    fn encode_audio(&mut self, samples: &[f32], _timestamp_ms: f64) -> OnAirResult<()> {
        for &s in samples {
            self.pending.extend_from_slice(&s.to_le_bytes());
        }
        self.audio_samples += samples.len() as u64;
        Ok(())
    }

    fn finish(&mut self) -> OnAirResult<Vec<u8>> {
        self.chunk_start_ms = None;
        Ok(std::mem::take(&mut self.pending))
    }
}

/// A finished recording, ready to be saved.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RecordingFile {
    pub file_name: String,
    pub mime: &'static str,
    pub bytes: Vec<u8>,
}

pub fn recording_file_name(unix_ms: u64) -> String {
    format!("recording-{unix_ms}.webm")
}

#[derive(Clone, Copy, Debug, PartialEq)]
enum Session {
    Idle,
    Recording { started_ms: f64, paused_total_ms: f64 },
    Paused { started_ms: f64, paused_total_ms: f64, paused_at_ms: f64 },
}

/// Recording session around a [`MediaEncoder`].
pub struct Recorder {
    encoder: Box<dyn MediaEncoder>,
    session: Session,
    /// Whether the running session carries an audio track.
    audio: bool,
    chunks: Vec<Vec<u8>>,
}

impl std::fmt::Debug for Recorder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Recorder")
            .field("session", &self.session)
            .field("chunks", &self.chunks.len())
            .finish_non_exhaustive()
    }
}

impl Default for Recorder {
    fn default() -> Self {
        Self::new(Box::new(InMemoryEncoder::default()))
    }
}

impl Recorder {
    pub fn new(encoder: Box<dyn MediaEncoder>) -> Self {
        Self {
            encoder,
            session: Session::Idle,
            audio: false,
            chunks: Vec::new(),
        }
    }

    /// Swap the encoder. Only allowed while idle.
    pub fn set_encoder(&mut self, encoder: Box<dyn MediaEncoder>) -> OnAirResult<()> {
        if self.is_active() {
            return Err(OnAirError::validation("cannot change encoder while recording"));
        }
        self.encoder = encoder;
        Ok(())
    }

    /// Recording or paused.
    pub fn is_active(&self) -> bool {
        !matches!(self.session, Session::Idle)
    }

    pub fn is_paused(&self) -> bool {
        matches!(self.session, Session::Paused { .. })
    }

    pub fn started_ms(&self) -> Option<f64> {
        match self.session {
            Session::Idle => None,
            Session::Recording { started_ms, .. } | Session::Paused { started_ms, .. } => {
                Some(started_ms)
            }
        }
    }

    /// Recorded time, excluding pauses.
    pub fn duration_ms(&self, now_ms: f64) -> f64 {
        match self.session {
            Session::Idle => 0.0,
            Session::Recording {
                started_ms,
                paused_total_ms,
            } => (now_ms - started_ms - paused_total_ms).max(0.0),
            Session::Paused {
                started_ms,
                paused_total_ms,
                paused_at_ms,
            } => (paused_at_ms - started_ms - paused_total_ms).max(0.0),
        }
    }

    pub fn buffered_chunks(&self) -> usize {
        self.chunks.len()
    }

    pub fn start(&mut self, cfg: &EncoderConfig, now_ms: f64) -> OnAirResult<()> {
        if self.is_active() {
            return Err(OnAirError::validation("recording is already active"));
        }
        self.encoder.start(cfg)?;
        self.chunks.clear();
        self.audio = cfg.audio_sample_rate.is_some();
        self.session = Session::Recording {
            started_ms: now_ms,
            paused_total_ms: 0.0,
        };
        tracing::info!(
            width = cfg.width,
            height = cfg.height,
            fps = cfg.fps,
            mime = %cfg.mime_type,
            audio = self.audio,
            "recording started"
        );
        Ok(())
    }

    pub fn pause(&mut self, now_ms: f64) -> OnAirResult<()> {
        match self.session {
            Session::Recording {
                started_ms,
                paused_total_ms,
            } => {
                self.session = Session::Paused {
                    started_ms,
                    paused_total_ms,
                    paused_at_ms: now_ms,
                };
                tracing::info!("recording paused");
                Ok(())
            }
            Session::Paused { .. } => Ok(()),
            Session::Idle => Err(OnAirError::validation("recording is not active")),
        }
    }

    pub fn resume(&mut self, now_ms: f64) -> OnAirResult<()> {
        match self.session {
            Session::Paused {
                started_ms,
                paused_total_ms,
                paused_at_ms,
            } => {
                self.session = Session::Recording {
                    started_ms,
                    paused_total_ms: paused_total_ms + (now_ms - paused_at_ms).max(0.0),
                };
                tracing::info!("recording resumed");
                Ok(())
            }
            Session::Recording { .. } => Ok(()),
            Session::Idle => Err(OnAirError::validation("recording is not active")),
        }
    }

    /// Feed one program frame. Ignored unless recording and not paused.
    pub fn push_frame(&mut self, frame: &FrameRGBA, now_ms: f64) -> OnAirResult<()> {
        let Session::Recording { .. } = self.session else {
            return Ok(());
        };
        let ts = self.duration_ms(now_ms);
        if let Some(chunk) = self.encoder.encode(frame, ts)?
            && !chunk.is_empty()
        {
            self.chunks.push(chunk);
        }
        Ok(())
    }

    /// Feed one block of mixed audio. Ignored unless recording with an audio track and not paused.
    pub fn push_audio(&mut self, samples: &[f32], now_ms: f64) -> OnAirResult<()> {
        if !self.audio || samples.is_empty() {
            return Ok(());
        }
        let Session::Recording { .. } = self.session else {
            return Ok(());
        };
        let ts = self.duration_ms(now_ms);
        self.encoder.encode_audio(samples, ts)
    }

    /// End the session and assemble the buffered chunks into one file.
    pub fn stop(&mut self, unix_ms: u64) -> OnAirResult<RecordingFile> {
        if !self.is_active() {
            return Err(OnAirError::validation("recording is not active"));
        }
        self.session = Session::Idle;
        let tail = self.encoder.finish()?;
        if !tail.is_empty() {
            self.chunks.push(tail);
        }
        let bytes = std::mem::take(&mut self.chunks).concat();
        tracing::info!(bytes = bytes.len(), "recording stopped");
        Ok(RecordingFile {
            file_name: recording_file_name(unix_ms),
            mime: RECORDING_MIME,
            bytes,
        })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/encode/recorder.rs"]
mod tests;
