/// Hex color values used throughout profiles.
pub mod color;
/// Image decode and PNG encode.
pub mod media;
/// Text rasterization through `usvg`/`resvg`.
pub mod text;
