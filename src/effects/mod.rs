/// Separable gaussian blur on premultiplied RGBA8.
pub mod blur;
/// Premultiplied source-over compositing.
pub mod composite;
/// Filter records and their parameters.
pub mod filter;
/// Applying a source's filter chain.
pub mod pipeline;
