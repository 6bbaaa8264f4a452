/// Owned premultiplied RGBA8 buffers.
pub mod buffer;
/// The render loop.
pub mod compositor;
/// Grid and selection overlays.
pub mod overlay;
/// Frame pacing and render statistics.
pub mod stats;
/// The composite surface and its painter.
pub mod surface;
/// Scene transition state machine.
pub mod transition;
