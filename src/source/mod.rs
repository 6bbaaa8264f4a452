/// Asynchronous acquisition tickets and tombstones.
pub mod acquire;
/// Per-source drawing target and raster cache.
pub mod canvas;
/// Live capture stream contract.
pub mod capture;
/// Type-specific source content.
pub mod content;
/// The source record itself.
pub mod model;
