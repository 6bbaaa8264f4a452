/// Per-source gain, mute and metering.
pub mod bus;
