/// Application configuration.
pub mod config;
/// Identifiers, canvas dimensions and geometry primitives.
pub mod core;
/// The crate error type.
pub mod error;
/// `tracing` subscriber setup.
pub mod logging;
/// Small numeric helpers.
pub mod math;
