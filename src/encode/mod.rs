//! Output collaborators fed with the clean program frame.
//!
//! Recording goes through an external [`recorder::MediaEncoder`]; streaming only models the
//! output state machine.

/// Recording session and encoder contract.
pub mod recorder;
/// Generic frame sink trait and built-in sinks.
pub mod sink;
/// Simulated streaming output.
pub mod stream;
