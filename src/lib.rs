//! onair is the core of a live-production studio: scenes of sources composited into a program
//! frame, per-source filters, scene transitions, and recording/streaming outputs.
//!
//! # Architecture
//!
//! 1. **Studio**: [`Studio`] owns the scene list, selection, settings, audio bus, acquisition
//!    bookkeeping and outputs. Every mutation is a method or a [`StudioCommand`] sent through
//!    the studio's command queue.
//! 2. **Compositor**: [`Compositor::tick`] drains commands, advances the transition and paints
//!    the program scene into a premultiplied RGBA8 frame, which is then handed to the recorder,
//!    the stream and any attached [`FrameSink`].
//! 3. **Control**: [`ProtocolSession`] answers a subset of obs-websocket 5 requests and turns
//!    studio events into protocol messages.
//! 4. **Persistence**: [`save_profile`] / [`load_profile_into`] move scenes and settings through
//!    a [`ProfileStore`].
//!
//! Device capture, permission prompts and media encoding belong to the host. They enter through
//! [`AcquisitionRequest`]/[`AcquisitionOutcome`], [`CaptureStream`] and [`MediaEncoder`].
#![forbid(unsafe_code)]

pub mod assets;
pub mod audio;
pub mod effects;
pub mod encode;
pub mod foundation;
pub mod profile;
pub mod protocol;
pub mod render;
pub mod scene;
pub mod source;
pub mod studio;
pub mod transform;

pub use assets::color::Color;
pub use audio::bus::AudioBus;
pub use effects::filter::{Filter, FilterKind, FilterType};
pub use encode::recorder::{EncoderConfig, InMemoryEncoder, MediaEncoder, RecordingFile};
pub use encode::sink::{FrameSink, InMemorySink, SinkConfig};
pub use encode::stream::{OutputState, OutputStatus};
pub use foundation::config::{AppConfig, LoggingConfig};
pub use foundation::core::{Canvas, FilterId, IdGen, Point, SceneId, SourceId, Vec2};
pub use foundation::error::{OnAirError, OnAirResult};
pub use foundation::logging::{init_default_logging, init_logging};
pub use profile::store::{
    DEFAULT_PROFILE_KEY, DirStore, MemoryStore, Profile, ProfileStore, load_profile_into,
    save_profile,
};
pub use protocol::rpc::{Envelope, OpCode, ProtocolSession, RequestType, drain_events};
pub use render::compositor::{Compositor, FrameReport, LoopState, TickOutcome};
pub use render::stats::RenderStats;
pub use render::surface::FrameRGBA;
pub use render::transition::{TransitionConfig, TransitionKind};
pub use scene::graph::Scene;
pub use source::acquire::{
    AcquiredContent, AcquisitionOutcome, AcquisitionRequest, AttachOutcome, acquire_local_image,
};
pub use source::capture::{CaptureStream, FeedStream, FeedWriter, feed};
pub use source::content::{SourceContent, SourceKind};
pub use source::model::Source;
pub use studio::command::{CommandSender, NewSource, StudioCommand};
pub use studio::event::StudioEvent;
pub use studio::settings::StudioSettings;
pub use studio::state::Studio;
