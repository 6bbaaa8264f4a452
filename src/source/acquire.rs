//! Bookkeeping for asynchronous content acquisition.
//!
//! Device permission prompts and image decodes complete outside the render loop. Every request
//! is keyed by an [`AcquisitionTicket`]; removing a source tombstones its id so that a late
//! completion tears its content down instead of attaching it.

use std::collections::{HashMap, HashSet};

use std::path::Path;

use crate::assets::media::load_image;
use crate::foundation::core::SourceId;
use crate::foundation::error::{OnAirError, OnAirResult};
use crate::render::buffer::PixelBuffer;
use crate::source::capture::CaptureStream;
use crate::source::content::SourceKind;

/// Handle for one in-flight acquisition.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct AcquisitionTicket {
    pub id: u64,
    pub source: SourceId,
}

/// What the host must acquire for a source, handed out when the source is created or loaded.
#[derive(Clone, Debug, PartialEq)]
pub struct AcquisitionRequest {
    pub ticket: AcquisitionTicket,
    pub kind: SourceKind,
    /// Requested capture device, if any.
    pub device_id: Option<String>,
    /// Image location, for image sources.
    pub url: Option<String>,
}

/// Content produced by a finished acquisition.
pub enum AcquiredContent {
    Capture(Box<dyn CaptureStream>),
    Image(PixelBuffer),
}

impl std::fmt::Debug for AcquiredContent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Capture(s) => f
                .debug_struct("Capture")
                .field("active", &s.is_active())
                .finish(),
            Self::Image(buf) => f.debug_tuple("Image").field(buf).finish(),
        }
    }
}

impl AcquiredContent {
    /// Tear the content down without attaching it anywhere.
    pub fn discard(self) {
        match self {
            Self::Capture(mut s) => s.stop(),
            Self::Image(_) => {}
        }
    }
}

/// Completion of an acquisition, delivered back to the studio.
#[derive(Debug)]
pub struct AcquisitionOutcome {
    pub ticket: AcquisitionTicket,
    pub result: OnAirResult<AcquiredContent>,
}

/// Result of delivering an [`AcquisitionOutcome`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AttachOutcome {
    /// Content is now owned by the source.
    Attached,
    /// The source was removed or the request superseded; the content was torn down.
    Discarded,
}

/// Resolve an image request from the local filesystem (`file://` prefixes are accepted).
///
/// Blocking; hosts call it off the render thread and send the outcome back through the
/// command queue.
pub fn acquire_local_image(request: &AcquisitionRequest) -> AcquisitionOutcome {
    let result = match request.url.as_deref() {
        Some(url) if request.kind == SourceKind::Image => {
            let path = url.strip_prefix("file://").unwrap_or(url);
            load_image(Path::new(path)).map(AcquiredContent::Image)
        }
        _ => Err(OnAirError::acquisition(format!(
            "{} source \"{}\" has no local image to load",
            request.kind.as_str(),
            request.ticket.source
        ))),
    };
    AcquisitionOutcome {
        ticket: request.ticket.clone(),
        result,
    }
}

/// Pending tickets and tombstoned sources.
#[derive(Debug, Default)]
pub struct AcquisitionRegistry {
    next_id: u64,
    pending: HashMap<u64, SourceId>,
    tombstones: HashSet<SourceId>,
}

impl AcquisitionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a ticket for `source`, superseding any earlier ticket for the same source.
    ///
    /// A tombstoned id is revived: a profile reload may bring back a source under its old id,
    /// and stale tickets stay dead because ticket ids are never reused.
    pub fn begin(&mut self, source: SourceId) -> AcquisitionTicket {
        self.pending.retain(|_, s| s != &source);
        self.tombstones.remove(&source);
        self.next_id += 1;
        self.pending.insert(self.next_id, source.clone());
        AcquisitionTicket {
            id: self.next_id,
            source,
        }
    }

    /// Mark `source` as gone: its pending and future completions will be discarded.
    pub fn tombstone(&mut self, source: &SourceId) {
        self.pending.retain(|_, s| s != source);
        self.tombstones.insert(source.clone());
    }

    pub fn is_tombstoned(&self, source: &SourceId) -> bool {
        self.tombstones.contains(source)
    }

    /// Retire `ticket`. Returns `true` when its content may still be attached.
    pub fn complete(&mut self, ticket: &AcquisitionTicket) -> bool {
        if self.tombstones.contains(&ticket.source) {
            return false;
        }
        match self.pending.get(&ticket.id) {
            Some(s) if s == &ticket.source => {
                self.pending.remove(&ticket.id);
                true
            }
            _ => false,
        }
    }

    pub fn pending_for(&self, source: &SourceId) -> bool {
        self.pending.values().any(|s| s == source)
    }

    pub fn pending_count(&self) -> usize {
        self.pending.len()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/source/acquire.rs"]
mod tests;
