use crate::foundation::core::SourceId;
use crate::foundation::error::{OnAirError, OnAirResult};
use crate::source::model::AudioSettings;

/// One source's node on the bus.
#[derive(Clone, Debug, PartialEq)]
pub struct AudioChannel {
    pub source: SourceId,
    pub volume: f32,
    pub muted: bool,
    /// Last measured RMS level, `[0, 1]`.
    pub level: f32,
}

/// Per-source gain stage feeding the recorder's audio track.
///
/// Channels exist only for sources whose content produces audio; removing the source detaches
/// its channel.
#[derive(Clone, Debug)]
pub struct AudioBus {
    channels: Vec<AudioChannel>,
    master_volume: f32,
}

impl Default for AudioBus {
    fn default() -> Self {
        Self {
            channels: Vec::new(),
            master_volume: 1.0,
        }
    }
}

impl AudioBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a channel for `source`. Re-attaching only refreshes its settings.
    pub fn attach(&mut self, source: SourceId, settings: &AudioSettings) {
        let volume = settings.volume.clamp(0.0, 1.0);
        match self.channel_mut(&source) {
            Some(ch) => {
                ch.volume = volume;
                ch.muted = settings.muted;
            }
            None => {
                tracing::debug!(source = %source, "audio channel attached");
                self.channels.push(AudioChannel {
                    source,
                    volume,
                    muted: settings.muted,
                    level: 0.0,
                });
            }
        }
    }

    /// Detach `source`'s channel. Returns whether one existed.
    pub fn detach(&mut self, source: &SourceId) -> bool {
        let before = self.channels.len();
        self.channels.retain(|c| &c.source != source);
        let removed = self.channels.len() != before;
        if removed {
            tracing::debug!(source = %source, "audio channel detached");
        }
        removed
    }

    pub fn clear(&mut self) {
        self.channels.clear();
    }

    pub fn is_attached(&self, source: &SourceId) -> bool {
        self.channel(source).is_some()
    }

    pub fn channel(&self, source: &SourceId) -> Option<&AudioChannel> {
        self.channels.iter().find(|c| &c.source == source)
    }

    fn channel_mut(&mut self, source: &SourceId) -> Option<&mut AudioChannel> {
        self.channels.iter_mut().find(|c| &c.source == source)
    }

    pub fn channels(&self) -> &[AudioChannel] {
        &self.channels
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    /// Whether any channel would contribute to a mix.
    pub fn has_active(&self) -> bool {
        self.channels.iter().any(|c| !c.muted && c.volume > 0.0) && self.master_volume > 0.0
    }

    pub fn master_volume(&self) -> f32 {
        self.master_volume
    }

    pub fn set_master_volume(&mut self, volume: f32) -> OnAirResult<()> {
        self.master_volume = unit_volume(volume)?;
        Ok(())
    }

    pub fn set_volume(&mut self, source: &SourceId, volume: f32) -> OnAirResult<()> {
        let volume = unit_volume(volume)?;
        self.require(source)?.volume = volume;
        Ok(())
    }

    pub fn set_muted(&mut self, source: &SourceId, muted: bool) -> OnAirResult<()> {
        self.require(source)?.muted = muted;
        Ok(())
    }

    /// Effective gain of `source`: zero when muted or detached.
    pub fn gain(&self, source: &SourceId) -> f32 {
        match self.channel(source) {
            Some(c) if !c.muted => c.volume * self.master_volume,
            _ => 0.0,
        }
    }

    /// Record a meter reading for `source` from its latest samples.
    ///
    /// The level is taken after the channel's own volume and mute, before the master volume.
    pub fn meter(&mut self, source: &SourceId, samples: &[f32]) {
        if samples.is_empty() {
            return;
        }
        let sum: f32 = samples.iter().map(|s| s * s).sum();
        let rms = (sum / samples.len() as f32).sqrt();
        if let Some(c) = self.channel_mut(source) {
            let gain = if c.muted { 0.0 } else { c.volume };
            c.level = (rms * gain).min(1.0);
        }
    }

    /// Mix equally sized sample blocks into one, applying each channel's gain.
    pub fn mix(&self, inputs: &[(&SourceId, &[f32])], out: &mut [f32]) {
        out.fill(0.0);
        for (source, samples) in inputs {
            let gain = self.gain(source);
            if gain <= 0.0 {
                continue;
            }
            for (o, s) in out.iter_mut().zip(samples.iter()) {
                *o += s * gain;
            }
        }
        for s in out.iter_mut() {
            *s = s.clamp(-1.0, 1.0);
        }
    }

    fn require(&mut self, source: &SourceId) -> OnAirResult<&mut AudioChannel> {
        self.channel_mut(source)
            .ok_or_else(|| OnAirError::validation(format!("no audio channel for \"{source}\"")))
    }
}

fn unit_volume(v: f32) -> OnAirResult<f32> {
    if !v.is_finite() || !(0.0..=1.0).contains(&v) {
        return Err(OnAirError::validation("volume must be in [0, 1]"));
    }
    Ok(v)
}

#[cfg(test)]
#[path = "../../tests/unit/audio/bus.rs"]
mod tests;
