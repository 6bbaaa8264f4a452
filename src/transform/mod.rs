/// Per-source geometry, hit testing and handle math.
pub mod geometry;
