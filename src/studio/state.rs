//! The studio context: every piece of live state the compositor reads and UI glue mutates.

use std::collections::HashSet;
use std::sync::Arc;

use crate::audio::bus::AudioBus;
use crate::effects::filter::{FilterKind, FilterType};
use crate::encode::recorder::{EncoderConfig, MediaEncoder, Recorder, RecordingFile};
use crate::encode::sink::{FrameSink, SinkConfig};
use crate::encode::stream::{OutputStatus, StreamOutput};
use crate::foundation::core::{
    Direction, FilterId, IdGen, Point, SceneId, SourceId, Vec2, unix_millis,
};
use crate::foundation::error::{OnAirError, OnAirResult};
use crate::profile::store::{Profile, ProfileRef};
use crate::render::overlay::OverlayOptions;
use crate::render::stats::RenderStats;
use crate::render::surface::FrameRGBA;
use crate::render::transition::{
    TransitionConfig, TransitionFrame, TransitionKind, TransitionMachine,
};
use crate::scene::graph::{Scene, SceneGraph};
use crate::source::acquire::{
    AcquiredContent, AcquisitionOutcome, AcquisitionRegistry, AcquisitionRequest, AttachOutcome,
};
use crate::source::content::{CaptureContent, ImageContent, SourceContent, SourceKind};
use crate::source::model::Source;
use crate::studio::command::{CommandQueue, CommandSender, NewSource, StudioCommand};
use crate::studio::event::StudioEvent;
use crate::studio::selection::Selection;
use crate::studio::settings::StudioSettings;
use crate::transform::geometry::{Crop, Handle, MIN_SIZE};

/// Single owner of scenes, outputs and editing state.
///
/// There is no global instance: hosts create one and pass it to the compositor each tick.
pub struct Studio {
    ids: IdGen,
    scenes: SceneGraph,
    current: SceneId,
    preview: Option<SceneId>,
    studio_mode: bool,
    transition_config: TransitionConfig,
    transition: TransitionMachine,
    selection: Selection,
    settings: StudioSettings,
    audio: AudioBus,
    acquisitions: AcquisitionRegistry,
    requests: Vec<AcquisitionRequest>,
    recorder: Recorder,
    recordings: Vec<RecordingFile>,
    stream: StreamOutput,
    sinks: Vec<Box<dyn FrameSink>>,
    events: Vec<StudioEvent>,
    stats: RenderStats,
    frame_index: u64,
    queue: CommandQueue,
}

impl std::fmt::Debug for Studio {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Studio")
            .field("scenes", &self.scenes.len())
            .field("current", &self.current)
            .field("preview", &self.preview)
            .field("studio_mode", &self.studio_mode)
            .field("transition", self.transition.state())
            .field("recording", &self.recorder.is_active())
            .field("streaming", &self.stream.is_active())
            .finish_non_exhaustive()
    }
}

impl Default for Studio {
    fn default() -> Self {
        Self::with_ids(IdGen::new())
    }
}

impl Studio {
    pub fn new() -> Self {
        Self::default()
    }

    /// Studio with a caller-provided id generator (deterministic ids in tests).
    pub fn with_ids(mut ids: IdGen) -> Self {
        let scenes = SceneGraph::with_default(&mut ids);
        let current = scenes
            .first_id()
            .cloned()
            .unwrap_or_else(|| SceneId::from("scene"));
        Self {
            ids,
            scenes,
            current,
            preview: None,
            studio_mode: false,
            transition_config: TransitionConfig::default(),
            transition: TransitionMachine::new(),
            selection: Selection::default(),
            settings: StudioSettings::default(),
            audio: AudioBus::new(),
            acquisitions: AcquisitionRegistry::new(),
            requests: Vec::new(),
            recorder: Recorder::default(),
            recordings: Vec::new(),
            stream: StreamOutput::new(),
            sinks: Vec::new(),
            events: Vec::new(),
            stats: RenderStats::default(),
            frame_index: 0,
            queue: CommandQueue::new(),
        }
    }

    // ---- read access ----

    pub fn scenes(&self) -> &SceneGraph {
        &self.scenes
    }

    pub fn scene(&self, id: &SceneId) -> Option<&Scene> {
        self.scenes.get(id)
    }

    pub fn current_scene_id(&self) -> &SceneId {
        &self.current
    }

    pub fn current_scene(&self) -> Option<&Scene> {
        self.scenes.get(&self.current)
    }

    pub fn preview_scene_id(&self) -> Option<&SceneId> {
        self.preview.as_ref()
    }

    pub fn studio_mode(&self) -> bool {
        self.studio_mode
    }

    pub fn transition_config(&self) -> TransitionConfig {
        self.transition_config
    }

    pub fn transition(&self) -> &TransitionMachine {
        &self.transition
    }

    pub fn is_transitioning(&self) -> bool {
        self.transition.is_active()
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    pub fn settings(&self) -> &StudioSettings {
        &self.settings
    }

    pub fn audio(&self) -> &AudioBus {
        &self.audio
    }

    pub fn acquisitions(&self) -> &AcquisitionRegistry {
        &self.acquisitions
    }

    pub fn recorder(&self) -> &Recorder {
        &self.recorder
    }

    pub fn stream(&self) -> &StreamOutput {
        &self.stream
    }

    pub fn stats(&self) -> &RenderStats {
        &self.stats
    }

    pub fn source(&self, id: &SourceId) -> Option<&Source> {
        self.scenes.find_source(id)
    }

    /// Producer handle for the command queue.
    pub fn commands(&self) -> CommandSender {
        self.queue.sender()
    }

    pub fn enqueue(&self, cmd: StudioCommand) {
        self.queue.push(cmd);
    }

    /// Drain pending state-change events.
    pub fn take_events(&mut self) -> Vec<StudioEvent> {
        std::mem::take(&mut self.events)
    }

    /// Drain acquisition requests the host still has to fulfil.
    pub fn take_acquisition_requests(&mut self) -> Vec<AcquisitionRequest> {
        std::mem::take(&mut self.requests)
    }

    /// Drain recordings finished through the command queue.
    pub fn take_recordings(&mut self) -> Vec<RecordingFile> {
        std::mem::take(&mut self.recordings)
    }

    fn emit(&mut self, event: StudioEvent) {
        self.events.push(event);
    }

    fn emit_program_changed(&mut self) {
        let scene_name = self
            .scenes
            .get(&self.current)
            .map(|s| s.name.clone())
            .unwrap_or_default();
        self.emit(StudioEvent::CurrentProgramSceneChanged {
            scene_id: self.current.clone(),
            scene_name,
        });
    }

    fn emit_preview_changed(&mut self) {
        if let Some(id) = self.preview.clone() {
            let scene_name = self
                .scenes
                .get(&id)
                .map(|s| s.name.clone())
                .unwrap_or_default();
            self.emit(StudioEvent::CurrentPreviewSceneChanged {
                scene_id: id,
                scene_name,
            });
        }
    }

    fn require_scene(&self, id: &SceneId) -> OnAirResult<()> {
        if self.scenes.get(id).is_none() {
            return Err(OnAirError::validation(format!("unknown scene \"{id}\"")));
        }
        Ok(())
    }

    fn source_mut(&mut self, id: &SourceId) -> OnAirResult<&mut Source> {
        self.scenes
            .find_source_mut(id)
            .ok_or_else(|| OnAirError::validation(format!("unknown source \"{id}\"")))
    }

    // ---- scenes ----

    /// Append an empty scene.
    pub fn create_scene(&mut self, name: Option<&str>) -> SceneId {
        self.scenes.create(&mut self.ids, name)
    }

    /// Remove a scene, releasing its sources. The last scene cannot be removed.
    pub fn remove_scene(&mut self, id: &SceneId) -> OnAirResult<()> {
        let scene = self.scenes.remove(id)?;
        for source in &scene.sources {
            self.forget_source(&source.id);
        }
        if self.transition.involves(id) {
            tracing::debug!(scene = %id, "transition cancelled: scene removed");
            self.transition.cancel();
        }
        let first = self.scenes.first_id().cloned();
        if &self.current == id
            && let Some(first) = first.clone()
        {
            self.current = first;
            self.emit_program_changed();
        }
        if self.preview.as_ref() == Some(id) {
            self.preview = first;
            self.emit_preview_changed();
        }
        Ok(())
    }

    pub fn duplicate_scene(&mut self, id: &SceneId) -> OnAirResult<SceneId> {
        self.scenes.duplicate(&mut self.ids, id)
    }

    pub fn rename_scene(&mut self, id: &SceneId, name: &str) -> OnAirResult<()> {
        self.scenes.rename(id, name)
    }

    pub fn reorder_scene(&mut self, id: &SceneId, direction: Direction) -> OnAirResult<bool> {
        self.scenes.reorder(id, direction)
    }

    pub fn set_transition(&mut self, config: TransitionConfig) -> OnAirResult<()> {
        config.validate()?;
        self.transition_config = config;
        Ok(())
    }

    /// Make `id` the program scene, animated unless `use_transition` is off or the
    /// configured kind is a cut.
    ///
    /// A transition still in flight is committed first.
    pub fn switch_scene(
        &mut self,
        id: &SceneId,
        use_transition: bool,
        now_ms: f64,
    ) -> OnAirResult<()> {
        self.require_scene(id)?;
        if let Some(active) = self.transition.active() {
            if &active.to == id {
                return Ok(());
            }
            if let Some(interrupted) = self.transition.cancel() {
                tracing::debug!(to = %interrupted.to, "transition interrupted; committing target");
                self.current = interrupted.to;
                self.emit_program_changed();
            }
        }
        if &self.current == id {
            return Ok(());
        }
        if use_transition && self.transition_config.kind != TransitionKind::Cut {
            self.transition
                .begin(self.current.clone(), id.clone(), self.transition_config, now_ms);
        } else {
            self.current = id.clone();
            tracing::debug!(scene = %id, "program scene cut");
            self.emit_program_changed();
        }
        Ok(())
    }

    pub fn switch_scene_by_index(&mut self, index: usize, now_ms: f64) -> OnAirResult<()> {
        let id = self
            .scenes
            .scenes()
            .get(index)
            .map(|s| s.id.clone())
            .ok_or_else(|| OnAirError::validation(format!("no scene at index {index}")))?;
        self.switch_scene(&id, true, now_ms)
    }

    pub fn toggle_studio_mode(&mut self) -> bool {
        self.studio_mode = !self.studio_mode;
        if self.studio_mode && self.preview.is_none() {
            self.preview = Some(self.current.clone());
        }
        self.emit(StudioEvent::StudioModeStateChanged {
            enabled: self.studio_mode,
        });
        self.studio_mode
    }

    pub fn set_preview_scene(&mut self, id: &SceneId) -> OnAirResult<()> {
        self.require_scene(id)?;
        if self.preview.as_ref() != Some(id) {
            self.preview = Some(id.clone());
            self.emit_preview_changed();
        }
        Ok(())
    }

    /// Studio mode: send the preview scene to program through the configured transition.
    pub fn transition_to_program(&mut self, now_ms: f64) -> OnAirResult<()> {
        if !self.studio_mode {
            return Err(OnAirError::validation("studio mode is not enabled"));
        }
        let preview = self
            .preview
            .clone()
            .ok_or_else(|| OnAirError::validation("no preview scene"))?;
        self.switch_scene(&preview, true, now_ms)
    }

    // ---- sources ----

    /// Add a source of `kind` with default content to the program scene.
    ///
    /// Media-backed kinds are added content-less; an [`AcquisitionRequest`] is queued for the
    /// host (see [`Studio::take_acquisition_requests`]).
    pub fn add_source(&mut self, kind: SourceKind, options: NewSource) -> OnAirResult<SourceId> {
        let mut content = SourceContent::defaults(kind);
        match &mut content {
            SourceContent::Camera(c) | SourceContent::Screen(c) | SourceContent::Window(c) => {
                c.device_id = options.device_id.clone();
            }
            SourceContent::Image(i) => i.url = options.url.clone(),
            SourceContent::Browser(b) => {
                if let Some(url) = &options.url {
                    b.url = url.clone();
                }
            }
            SourceContent::Text(_) | SourceContent::Color(_) => {}
        }
        let source = Source::new(
            self.ids.source(),
            options.name.unwrap_or_default(),
            content,
        );
        let scene = self.current.clone();
        self.insert_source(&scene, source)
    }

    /// Insert a prepared source into `scene`.
    pub fn insert_source(&mut self, scene: &SceneId, mut source: Source) -> OnAirResult<SourceId> {
        source.normalize()?;
        if self.scenes.find_source(&source.id).is_some() {
            return Err(OnAirError::validation(format!(
                "source id \"{}\" already exists",
                source.id
            )));
        }
        let target = self
            .scenes
            .get_mut(scene)
            .ok_or_else(|| OnAirError::validation(format!("unknown scene \"{scene}\"")))?;
        let source = target.add_source(source);
        let id = source.id.clone();
        let request = source.content.needs_acquisition().then(|| {
            let (device_id, url) = acquisition_target(&source.content);
            (source.kind(), device_id, url)
        });
        if source.content.has_audio() {
            let settings = source.audio;
            self.audio.attach(id.clone(), &settings);
        }
        if let Some((kind, device_id, url)) = request {
            let ticket = self.acquisitions.begin(id.clone());
            self.requests.push(AcquisitionRequest {
                ticket,
                kind,
                device_id,
                url,
            });
        }
        Ok(id)
    }

    /// Remove a source, synchronously stopping its capture and detaching its audio.
    pub fn remove_source(&mut self, id: &SourceId) -> OnAirResult<()> {
        self.scenes
            .remove_source(id)
            .ok_or_else(|| OnAirError::validation(format!("unknown source \"{id}\"")))?;
        self.forget_source(id);
        Ok(())
    }

    fn forget_source(&mut self, id: &SourceId) {
        self.acquisitions.tombstone(id);
        self.audio.detach(id);
        self.selection.remove(id);
    }

    pub fn rename_source(&mut self, id: &SourceId, name: &str) -> OnAirResult<()> {
        let name = name.trim();
        if name.is_empty() {
            return Err(OnAirError::validation("source name must not be empty"));
        }
        self.source_mut(id)?.name = name.to_owned();
        Ok(())
    }

    /// Replace the type-specific properties of a source (text, colors, url, device).
    ///
    /// The kind cannot change. A new image url or capture device releases the current media and
    /// queues a fresh acquisition.
    pub fn set_source_content(&mut self, id: &SourceId, content: SourceContent) -> OnAirResult<()> {
        let source = self.source_mut(id)?;
        if source.kind() != content.kind() {
            return Err(OnAirError::validation(format!(
                "cannot turn {} source \"{}\" into {}",
                source.kind().as_str(),
                source.name,
                content.kind().as_str()
            )));
        }
        if let SourceContent::Text(t) = &content
            && !(t.font_size.is_finite() && t.font_size > 0.0)
        {
            return Err(OnAirError::validation("font size must be > 0"));
        }

        let reacquire = match (&mut source.content, content) {
            (SourceContent::Text(cur), SourceContent::Text(new)) => {
                *cur = new;
                false
            }
            (SourceContent::Color(cur), SourceContent::Color(new)) => {
                *cur = new;
                false
            }
            (SourceContent::Browser(cur), SourceContent::Browser(new)) => {
                *cur = new;
                false
            }
            (SourceContent::Image(cur), SourceContent::Image(new)) => {
                let changed = cur.url != new.url;
                if changed {
                    cur.url = new.url;
                    cur.raster = None;
                }
                changed && cur.url.is_some()
            }
            (
                SourceContent::Camera(cur) | SourceContent::Screen(cur) | SourceContent::Window(cur),
                SourceContent::Camera(new) | SourceContent::Screen(new) | SourceContent::Window(new),
            ) => {
                let changed = cur.device_id != new.device_id;
                if changed {
                    cur.release();
                    cur.device_id = new.device_id;
                }
                changed
            }
            _ => false,
        };
        if reacquire {
            let kind = source.kind();
            let (device_id, url) = acquisition_target(&source.content);
            self.audio.detach(id);
            let ticket = self.acquisitions.begin(id.clone());
            self.requests.push(AcquisitionRequest {
                ticket,
                kind,
                device_id,
                url,
            });
        }
        Ok(())
    }

    pub fn move_source(&mut self, id: &SourceId, direction: Direction) -> OnAirResult<bool> {
        let scene_id = self
            .scenes
            .scene_of(id)
            .map(|s| s.id.clone())
            .ok_or_else(|| OnAirError::validation(format!("unknown source \"{id}\"")))?;
        match self.scenes.get_mut(&scene_id) {
            Some(scene) => scene.move_source(id, direction),
            None => Ok(false),
        }
    }

    pub fn select(&mut self, id: Option<&SourceId>) -> OnAirResult<()> {
        match id {
            Some(id) => {
                if self.source(id).is_none() {
                    return Err(OnAirError::validation(format!("unknown source \"{id}\"")));
                }
                self.selection.select(id.clone());
            }
            None => self.selection.clear(),
        }
        Ok(())
    }

    pub fn toggle_select(&mut self, id: &SourceId) -> OnAirResult<bool> {
        if self.source(id).is_none() {
            return Err(OnAirError::validation(format!("unknown source \"{id}\"")));
        }
        Ok(self.selection.toggle(id.clone()))
    }

    /// Topmost visible source of the program scene under `p`.
    pub fn source_at(&self, p: Point) -> Option<&Source> {
        self.current_scene().and_then(|s| s.source_at(p))
    }

    /// Drag every selected, unlocked source by `delta`, snapping when enabled.
    /// Locked sources ignore the move.
    pub fn move_selection(&mut self, delta: Vec2) {
        let snap = self.settings.snap_grid();
        let ids = self.selection.ids().to_vec();
        for id in &ids {
            let Some(source) = self.scenes.find_source_mut(id) else {
                continue;
            };
            if source.locked {
                continue;
            }
            source.geometry.translate(delta);
            if let Some(grid) = snap {
                source.geometry.snap_to_grid(grid);
            }
        }
    }

    /// Keyboard nudge: `dx`/`dy` in steps of `settings.nudge_step`.
    pub fn nudge(&mut self, dx: f64, dy: f64) {
        let step = self.settings.nudge_step;
        let snap = self.settings.snap_to_grid;
        self.settings.snap_to_grid = false;
        self.move_selection(Vec2::new(dx * step, dy * step));
        self.settings.snap_to_grid = snap;
    }

    fn edit_unlocked(
        &mut self,
        id: &SourceId,
        edit: impl FnOnce(&mut Source),
    ) -> OnAirResult<()> {
        let source = self.source_mut(id)?;
        source.ensure_unlocked()?;
        edit(source);
        Ok(())
    }

    pub fn resize_source(
        &mut self,
        id: &SourceId,
        handle: Handle,
        dx: f64,
        dy: f64,
    ) -> OnAirResult<()> {
        self.edit_unlocked(id, |s| {
            s.geometry.resize(handle, dx, dy);
            s.crop = s.crop.clamped(s.geometry.width, s.geometry.height);
        })
    }

    pub fn rotate_source_toward(&mut self, id: &SourceId, pointer: Point) -> OnAirResult<()> {
        self.edit_unlocked(id, |s| s.geometry.rotate_toward(pointer))
    }

    /// Cover the whole canvas.
    pub fn fit_to_screen(&mut self, id: &SourceId) -> OnAirResult<()> {
        let canvas = self.settings.resolution;
        self.edit_unlocked(id, |s| {
            s.geometry.x = 0.0;
            s.geometry.y = 0.0;
            s.geometry.width = f64::from(canvas.width).max(MIN_SIZE);
            s.geometry.height = f64::from(canvas.height).max(MIN_SIZE);
            s.crop = s.crop.clamped(s.geometry.width, s.geometry.height);
        })
    }

    /// Rotation 0, scale 1, no crop.
    pub fn reset_transform(&mut self, id: &SourceId) -> OnAirResult<()> {
        self.edit_unlocked(id, |s| {
            s.geometry.reset_transform();
            s.crop = Crop::default();
        })
    }

    pub fn set_opacity(&mut self, id: &SourceId, opacity: f64) -> OnAirResult<()> {
        self.source_mut(id)?.set_opacity(opacity)
    }

    pub fn set_visible(&mut self, id: &SourceId, visible: bool) -> OnAirResult<()> {
        self.source_mut(id)?.visible = visible;
        Ok(())
    }

    pub fn set_locked(&mut self, id: &SourceId, locked: bool) -> OnAirResult<()> {
        self.source_mut(id)?.locked = locked;
        Ok(())
    }

    pub fn set_crop(&mut self, id: &SourceId, crop: Crop) -> OnAirResult<()> {
        self.source_mut(id)?.set_crop(crop);
        Ok(())
    }

    pub fn set_volume(&mut self, id: &SourceId, volume: f32) -> OnAirResult<()> {
        if !volume.is_finite() || !(0.0..=1.0).contains(&volume) {
            return Err(OnAirError::validation("volume must be in [0, 1]"));
        }
        self.source_mut(id)?.audio.volume = volume;
        if self.audio.is_attached(id) {
            self.audio.set_volume(id, volume)?;
        }
        Ok(())
    }

    pub fn set_muted(&mut self, id: &SourceId, muted: bool) -> OnAirResult<()> {
        self.source_mut(id)?.audio.muted = muted;
        if self.audio.is_attached(id) {
            self.audio.set_muted(id, muted)?;
        }
        Ok(())
    }

    pub fn set_master_volume(&mut self, volume: f32) -> OnAirResult<()> {
        self.audio.set_master_volume(volume)
    }

    // ---- filters ----

    pub fn add_filter(&mut self, source: &SourceId, filter_type: FilterType) -> OnAirResult<FilterId> {
        let id = self.ids.filter();
        self.source_mut(source)?.add_filter(id.clone(), filter_type);
        Ok(id)
    }

    pub fn remove_filter(&mut self, source: &SourceId, filter: &FilterId) -> OnAirResult<()> {
        self.source_mut(source)?.remove_filter(filter).map(|_| ())
    }

    pub fn toggle_filter(&mut self, source: &SourceId, filter: &FilterId) -> OnAirResult<bool> {
        self.source_mut(source)?.toggle_filter(filter)
    }

    pub fn update_filter(
        &mut self,
        source: &SourceId,
        filter: &FilterId,
        kind: FilterKind,
    ) -> OnAirResult<()> {
        self.source_mut(source)?.update_filter(filter, kind)
    }

    pub fn move_filter(
        &mut self,
        source: &SourceId,
        filter: &FilterId,
        direction: Direction,
    ) -> OnAirResult<()> {
        self.source_mut(source)?.move_filter(filter, direction)
    }

    // ---- acquisition ----

    /// Deliver a finished acquisition.
    ///
    /// Content for a source that was removed (or whose request was superseded) is torn down
    /// immediately and nothing is attached. Acquisition errors are logged and returned; the
    /// source stays content-less.
    pub fn resolve_acquisition(
        &mut self,
        outcome: AcquisitionOutcome,
    ) -> OnAirResult<AttachOutcome> {
        let AcquisitionOutcome { ticket, result } = outcome;
        let live = self.acquisitions.complete(&ticket) && self.source(&ticket.source).is_some();
        let content = match result {
            Ok(content) => content,
            Err(e) => {
                tracing::warn!(source = %ticket.source, error = %e, "acquisition failed");
                return if live { Err(e) } else { Ok(AttachOutcome::Discarded) };
            }
        };
        if !live {
            tracing::warn!(
                source = %ticket.source,
                "late acquisition for a removed source; content discarded"
            );
            content.discard();
            return Ok(AttachOutcome::Discarded);
        }

        let Some(source) = self.scenes.find_source_mut(&ticket.source) else {
            content.discard();
            return Ok(AttachOutcome::Discarded);
        };
        match (content, &mut source.content) {
            (
                AcquiredContent::Capture(stream),
                SourceContent::Camera(c) | SourceContent::Screen(c) | SourceContent::Window(c),
            ) => {
                c.release();
                let has_audio = stream.has_audio();
                c.stream = Some(stream);
                let settings = source.audio;
                if has_audio {
                    self.audio.attach(ticket.source.clone(), &settings);
                }
            }
            (AcquiredContent::Image(buf), SourceContent::Image(i)) => {
                source.geometry.width = f64::from(buf.width()).max(MIN_SIZE);
                source.geometry.height = f64::from(buf.height()).max(MIN_SIZE);
                source.crop = source
                    .crop
                    .clamped(source.geometry.width, source.geometry.height);
                i.raster = Some(Arc::new(buf));
            }
            (content, other) => {
                let kind = other.kind();
                content.discard();
                return Err(OnAirError::acquisition(format!(
                    "acquired content does not match {} source \"{}\"",
                    kind.as_str(),
                    ticket.source
                )));
            }
        }
        tracing::debug!(source = %ticket.source, "content attached");
        Ok(AttachOutcome::Attached)
    }

    // ---- outputs ----

    fn encoder_config(&self) -> EncoderConfig {
        EncoderConfig {
            width: self.settings.resolution.width,
            height: self.settings.resolution.height,
            fps: self.settings.frame_rate,
            video_bitrate: self.settings.video_bitrate,
            audio_sample_rate: self
                .audio
                .has_active()
                .then_some(self.settings.audio_sample_rate),
            mime_type: self.settings.encoder.mime_type().to_owned(),
        }
    }

    pub fn set_media_encoder(&mut self, encoder: Box<dyn MediaEncoder>) -> OnAirResult<()> {
        self.recorder.set_encoder(encoder)
    }

    pub fn start_recording(&mut self, now_ms: f64) -> OnAirResult<()> {
        let cfg = self.encoder_config();
        self.recorder.start(&cfg, now_ms)?;
        self.emit(StudioEvent::RecordStateChanged(OutputStatus::started()));
        Ok(())
    }

    pub fn pause_recording(&mut self, now_ms: f64) -> OnAirResult<()> {
        self.recorder.pause(now_ms)
    }

    pub fn resume_recording(&mut self, now_ms: f64) -> OnAirResult<()> {
        self.recorder.resume(now_ms)
    }

    pub fn stop_recording(&mut self) -> OnAirResult<RecordingFile> {
        let file = self.recorder.stop(unix_millis())?;
        self.emit(StudioEvent::RecordStateChanged(OutputStatus::stopped()));
        Ok(file)
    }

    /// Stop recording and keep the file in the outbox (see [`Studio::take_recordings`]).
    /// Returns the file name.
    pub fn finish_recording(&mut self) -> OnAirResult<String> {
        let file = self.stop_recording()?;
        let name = file.file_name.clone();
        self.recordings.push(file);
        Ok(name)
    }

    pub fn start_streaming(&mut self, now_ms: f64) -> OnAirResult<()> {
        let status = self.stream.start(now_ms)?;
        self.emit(StudioEvent::StreamStateChanged(status));
        Ok(())
    }

    pub fn stop_streaming(&mut self) -> OnAirResult<()> {
        let status = self.stream.stop()?;
        self.emit(StudioEvent::StreamStateChanged(status));
        Ok(())
    }

    /// Attach a sink that receives every program frame from now on.
    pub fn attach_sink(&mut self, mut sink: Box<dyn FrameSink>) -> OnAirResult<()> {
        sink.begin(SinkConfig {
            width: self.settings.resolution.width,
            height: self.settings.resolution.height,
            fps: self.settings.frame_rate,
            audio_sample_rate: self
                .audio
                .has_active()
                .then_some(self.settings.audio_sample_rate),
        })?;
        self.sinks.push(sink);
        Ok(())
    }

    /// End and drop every attached sink.
    pub fn detach_sinks(&mut self) -> OnAirResult<()> {
        for mut sink in self.sinks.drain(..) {
            sink.end()?;
        }
        Ok(())
    }

    pub fn update_settings(&mut self, settings: StudioSettings) -> OnAirResult<()> {
        settings.validate()?;
        self.settings = settings;
        Ok(())
    }

    // ---- command queue ----

    /// Apply every queued command in arrival order. Rejected commands are logged and returned.
    pub fn drain_commands(&mut self, now_ms: f64) -> Vec<OnAirError> {
        let mut rejected = Vec::new();
        for cmd in self.queue.drain() {
            if let Err(e) = self.apply(cmd, now_ms) {
                tracing::warn!(error = %e, "studio command rejected");
                rejected.push(e);
            }
        }
        rejected
    }

    /// Apply one command immediately.
    pub fn apply(&mut self, cmd: StudioCommand, now_ms: f64) -> OnAirResult<()> {
        match cmd {
            StudioCommand::CreateScene { name } => {
                self.create_scene(name.as_deref());
            }
            StudioCommand::RemoveScene(id) => self.remove_scene(&id)?,
            StudioCommand::DuplicateScene(id) => {
                self.duplicate_scene(&id)?;
            }
            StudioCommand::RenameScene { scene, name } => self.rename_scene(&scene, &name)?,
            StudioCommand::ReorderScene { scene, direction } => {
                self.reorder_scene(&scene, direction)?;
            }
            StudioCommand::SwitchScene {
                scene,
                use_transition,
            } => self.switch_scene(&scene, use_transition, now_ms)?,
            StudioCommand::SwitchSceneByIndex(i) => self.switch_scene_by_index(i, now_ms)?,
            StudioCommand::SetTransition(cfg) => self.set_transition(cfg)?,
            StudioCommand::ToggleStudioMode => {
                self.toggle_studio_mode();
            }
            StudioCommand::SetPreviewScene(id) => self.set_preview_scene(&id)?,
            StudioCommand::TransitionToProgram => self.transition_to_program(now_ms)?,
            StudioCommand::AddSource { kind, options } => {
                self.add_source(kind, options)?;
            }
            StudioCommand::RemoveSource(id) => self.remove_source(&id)?,
            StudioCommand::RenameSource { source, name } => self.rename_source(&source, &name)?,
            StudioCommand::SetSourceContent { source, content } => {
                self.set_source_content(&source, content)?
            }
            StudioCommand::MoveSource { source, direction } => {
                self.move_source(&source, direction)?;
            }
            StudioCommand::Select(id) => self.select(id.as_ref())?,
            StudioCommand::ToggleSelect(id) => {
                self.toggle_select(&id)?;
            }
            StudioCommand::MoveSelection(delta) => self.move_selection(delta),
            StudioCommand::Nudge { dx, dy } => self.nudge(dx, dy),
            StudioCommand::Resize {
                source,
                handle,
                dx,
                dy,
            } => self.resize_source(&source, handle, dx, dy)?,
            StudioCommand::RotateToward { source, pointer } => {
                self.rotate_source_toward(&source, pointer)?
            }
            StudioCommand::FitToScreen(id) => self.fit_to_screen(&id)?,
            StudioCommand::ResetTransform(id) => self.reset_transform(&id)?,
            StudioCommand::SetOpacity { source, opacity } => self.set_opacity(&source, opacity)?,
            StudioCommand::SetVisible { source, visible } => self.set_visible(&source, visible)?,
            StudioCommand::SetLocked { source, locked } => self.set_locked(&source, locked)?,
            StudioCommand::SetCrop { source, crop } => self.set_crop(&source, crop)?,
            StudioCommand::SetVolume { source, volume } => self.set_volume(&source, volume)?,
            StudioCommand::SetMuted { source, muted } => self.set_muted(&source, muted)?,
            StudioCommand::AddFilter {
                source,
                filter_type,
            } => {
                self.add_filter(&source, filter_type)?;
            }
            StudioCommand::RemoveFilter { source, filter } => {
                self.remove_filter(&source, &filter)?
            }
            StudioCommand::ToggleFilter { source, filter } => {
                self.toggle_filter(&source, &filter)?;
            }
            StudioCommand::UpdateFilter {
                source,
                filter,
                kind,
            } => self.update_filter(&source, &filter, kind)?,
            StudioCommand::MoveFilter {
                source,
                filter,
                direction,
            } => self.move_filter(&source, &filter, direction)?,
            StudioCommand::StartRecording => self.start_recording(now_ms)?,
            StudioCommand::PauseRecording => self.pause_recording(now_ms)?,
            StudioCommand::ResumeRecording => self.resume_recording(now_ms)?,
            StudioCommand::StopRecording => {
                self.finish_recording()?;
            }
            StudioCommand::StartStreaming => self.start_streaming(now_ms)?,
            StudioCommand::StopStreaming => self.stop_streaming()?,
            StudioCommand::UpdateSettings(settings) => self.update_settings(*settings)?,
            StudioCommand::AcquisitionResolved(outcome) => {
                self.resolve_acquisition(outcome)?;
            }
        }
        Ok(())
    }

    // ---- render loop hooks ----

    /// Advance the running transition to `now_ms`.
    pub(crate) fn advance_transition(&mut self, now_ms: f64) -> Option<TransitionFrame> {
        self.transition.advance(now_ms)
    }

    /// Commit a finished transition: the target becomes the program scene.
    pub(crate) fn commit_transition(&mut self) {
        if let Some(to) = self.transition.finish() {
            if self.scenes.get(&to).is_some() {
                self.current = to;
            }
            self.emit_program_changed();
        }
    }

    /// Hand the clean program frame to the recorder, the stream and attached sinks.
    pub(crate) fn deliver_frame(&mut self, frame: &FrameRGBA, now_ms: f64) {
        let idx = self.frame_index;
        self.frame_index += 1;
        if let Err(e) = self.recorder.push_frame(frame, now_ms) {
            tracing::warn!(error = %e, "recorder rejected frame");
        }
        self.stream.push_frame(frame);
        for sink in &mut self.sinks {
            if let Err(e) = sink.push_frame(idx, frame) {
                tracing::warn!(error = %e, "frame sink rejected frame");
            }
        }
    }

    /// Drain every capture's pending audio, meter each channel and hand the mix to the recorder.
    pub(crate) fn pump_audio(&mut self, now_ms: f64) {
        let mut blocks: Vec<(SourceId, Vec<f32>)> = Vec::new();
        for source in self.scenes.sources_mut() {
            let Some(stream) = source
                .content
                .capture_mut()
                .and_then(|c| c.stream.as_mut())
            else {
                continue;
            };
            let samples = stream.take_audio();
            if !samples.is_empty() {
                blocks.push((source.id.clone(), samples));
            }
        }
        for (id, samples) in &blocks {
            self.audio.meter(id, samples);
        }

        // shorter blocks are zero-padded by the mix
        let len = blocks.iter().map(|(_, s)| s.len()).max().unwrap_or(0);
        if len == 0 || !self.recorder.is_active() {
            return;
        }
        let inputs: Vec<(&SourceId, &[f32])> = blocks
            .iter()
            .map(|(id, samples)| (id, samples.as_slice()))
            .collect();
        let mut mixed = vec![0.0; len];
        self.audio.mix(&inputs, &mut mixed);
        if let Err(e) = self.recorder.push_audio(&mixed, now_ms) {
            tracing::warn!(error = %e, "recorder rejected audio");
        }
    }

    pub(crate) fn stats_mut(&mut self) -> &mut RenderStats {
        &mut self.stats
    }

    /// Grid and selection overlays for the program display.
    pub fn overlay_options(&self) -> OverlayOptions {
        let selection = self
            .selection
            .ids()
            .iter()
            .filter_map(|id| self.current_scene().and_then(|s| s.source(id)))
            .map(|s| s.geometry)
            .collect();
        OverlayOptions {
            grid: self.settings.show_grid.then_some(f64::from(self.settings.grid_size)),
            selection,
        }
    }

    // ---- profiles ----

    /// Borrowed, serializable view of the persistent state.
    pub fn profile(&self) -> ProfileRef<'_> {
        ProfileRef::new(
            self.scenes.scenes(),
            &self.settings,
            &self.current,
            &self.transition_config,
        )
    }

    /// Replace scenes and settings with `profile`.
    ///
    /// The profile is validated first; on error nothing changes. Media-backed sources come back
    /// content-less and the returned requests (also queued) must be fulfilled by the host.
    pub fn load_profile(&mut self, profile: Profile) -> OnAirResult<Vec<AcquisitionRequest>> {
        validate_profile(&profile)?;
        let Profile {
            scenes,
            settings,
            current_scene_id,
            transition,
            ..
        } = profile;
        let mut scenes = scenes;
        for source in scenes.iter_mut().flat_map(|scene| scene.sources.iter_mut()) {
            source.normalize()?;
        }
        for scene in &scenes {
            self.ids.observe(scene.id.as_str());
            for source in &scene.sources {
                self.ids.observe(source.id.as_str());
                for filter in &source.filters {
                    self.ids.observe(filter.id.as_str());
                }
            }
        }

        self.release_everything();
        let graph = SceneGraph::from_scenes(scenes)?;
        self.current = current_scene_id
            .filter(|id| graph.get(id).is_some())
            .or_else(|| graph.first_id().cloned())
            .unwrap_or_else(|| SceneId::from("scene"));
        self.scenes = graph;
        self.settings = settings;
        self.transition_config = transition;

        let mut requests = Vec::new();
        let mut audio = Vec::new();
        for scene in self.scenes.scenes() {
            for source in &scene.sources {
                if source.content.needs_acquisition() {
                    let (device_id, url) = acquisition_target(&source.content);
                    requests.push((source.id.clone(), source.kind(), device_id, url));
                }
                if source.content.has_audio() {
                    audio.push((source.id.clone(), source.audio));
                }
            }
        }
        for (id, settings) in audio {
            self.audio.attach(id, &settings);
        }
        let requests: Vec<AcquisitionRequest> = requests
            .into_iter()
            .map(|(source, kind, device_id, url)| AcquisitionRequest {
                ticket: self.acquisitions.begin(source),
                kind,
                device_id,
                url,
            })
            .collect();
        self.requests.extend(requests.iter().cloned());
        tracing::info!(
            scenes = self.scenes.len(),
            pending = requests.len(),
            "profile loaded"
        );
        self.emit_program_changed();
        Ok(requests)
    }

    /// Back to a single empty scene with default settings. Outputs keep running.
    pub fn reset(&mut self) {
        self.release_everything();
        self.scenes = SceneGraph::with_default(&mut self.ids);
        if let Some(first) = self.scenes.first_id().cloned() {
            self.current = first;
        }
        self.settings = StudioSettings::default();
        self.transition_config = TransitionConfig::default();
        self.emit_program_changed();
    }

    fn release_everything(&mut self) {
        for id in self.scenes.release_all() {
            self.acquisitions.tombstone(&id);
        }
        self.requests.clear();
        self.audio.clear();
        self.selection.clear();
        self.transition.cancel();
        self.preview = None;
        self.studio_mode = false;
    }
}

fn acquisition_target(content: &SourceContent) -> (Option<String>, Option<String>) {
    match content {
        SourceContent::Camera(CaptureContent { device_id, .. })
        | SourceContent::Screen(CaptureContent { device_id, .. })
        | SourceContent::Window(CaptureContent { device_id, .. }) => (device_id.clone(), None),
        SourceContent::Image(ImageContent { url, .. }) => (None, url.clone()),
        SourceContent::Text(_) | SourceContent::Color(_) | SourceContent::Browser(_) => {
            (None, None)
        }
    }
}

fn validate_profile(profile: &Profile) -> OnAirResult<()> {
    if profile.scenes.is_empty() {
        return Err(OnAirError::validation("profile has no scenes"));
    }
    profile.settings.validate()?;
    profile.transition.validate()?;
    let mut scene_ids = HashSet::new();
    let mut source_ids = HashSet::new();
    for scene in &profile.scenes {
        if !scene_ids.insert(&scene.id) {
            return Err(OnAirError::validation(format!(
                "duplicate scene id \"{}\"",
                scene.id
            )));
        }
        for source in &scene.sources {
            if !source_ids.insert(&source.id) {
                return Err(OnAirError::validation(format!(
                    "duplicate source id \"{}\"",
                    source.id
                )));
            }
            source.validate()?;
        }
    }
    Ok(())
}

#[cfg(test)]
#[path = "../../tests/unit/studio/state.rs"]
mod tests;
